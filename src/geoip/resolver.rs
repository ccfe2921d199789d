//! 位置解析器
//!
//! 统一的 IP → 位置解析入口，按配置自动选择实现：
//! 1. 检查 maxminddb_path 是否配置且文件可读
//! 2. 可读 → MaxMindProvider
//! 3. 不可读 → IpApiProvider
//!
//! 解析路径是 cache-aside：先查位置缓存，未命中才调 provider，
//! 成功后回填缓存。provider 失败返回 None（"位置未知"），不缓存。

use std::sync::Arc;

use tracing::{debug, info, trace, warn};

use super::ipapi::IpApiProvider;
use super::maxmind::MaxMindProvider;
use super::provider::{GeoLookup, ResolvedLocation};
use crate::cache::{CacheResult, LocationCache};
use crate::config::GeolocationConfig;
use crate::utils::geo::Coordinate;

/// 回环/测试 IP 的固定测试位置
pub fn fallback_location() -> ResolvedLocation {
    ResolvedLocation {
        coordinate: Coordinate::new(37.751, -97.822),
        city: Some("Test City".to_string()),
        region: None,
        country: Some("Test Country".to_string()),
    }
}

/// 判断是否为回环/测试 IP
pub fn is_loopback_or_test(ip: &str) -> bool {
    matches!(ip, "127.0.0.1" | "::1" | "localhost" | "test")
}

/// 位置解析器
///
/// 无状态、每请求最多一次缓存查询 + 一次外部调用。
/// 同一 IP 的并发未命中会产生重复外部调用，最后写入者胜出，可容忍。
pub struct LocationResolver {
    cache: Arc<dyn LocationCache>,
    provider: Arc<dyn GeoLookup>,
    dev_fallback: bool,
}

impl LocationResolver {
    /// 直接注入 provider（测试和自定义装配用）
    pub fn new(
        cache: Arc<dyn LocationCache>,
        provider: Arc<dyn GeoLookup>,
        dev_fallback: bool,
    ) -> Self {
        Self {
            cache,
            provider,
            dev_fallback,
        }
    }

    /// 根据 GeolocationConfig 初始化
    pub fn from_config(config: &GeolocationConfig, cache: Arc<dyn LocationCache>) -> Self {
        let provider: Arc<dyn GeoLookup> = if let Some(ref path) = config.maxminddb_path {
            match MaxMindProvider::new(path) {
                Ok(provider) => {
                    info!("Geolocation: Using MaxMind database at {}", path);
                    Arc::new(provider)
                }
                Err(e) => {
                    warn!(
                        "Geolocation: Failed to load MaxMind database at {}: {}, falling back to external API",
                        path, e
                    );
                    Arc::new(IpApiProvider::new(&config.api_url, config.timeout_secs))
                }
            }
        } else {
            debug!("Geolocation: No MaxMind database configured, using external API");
            Arc::new(IpApiProvider::new(&config.api_url, config.timeout_secs))
        };

        info!("Geolocation: Initialized with {} provider", provider.name());

        Self::new(cache, provider, config.dev_fallback)
    }

    /// 获取当前使用的 provider 名称
    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// 解析 IP 地址的地理位置
    ///
    /// 返回 None 表示"位置未知"，调用方应优雅降级（跳过邻近过滤）。
    pub async fn resolve(&self, ip: &str) -> Option<ResolvedLocation> {
        // 回环/测试 IP 走固定测试位置，不碰缓存（由 dev_fallback 开关控制）
        if self.dev_fallback && is_loopback_or_test(ip) {
            trace!("Loopback/test IP {}, returning fixed test location", ip);
            return Some(fallback_location());
        }

        match self.cache.get(ip).await {
            CacheResult::Found(location) => {
                trace!("Location cache hit for {}", ip);
                return Some(location);
            }
            CacheResult::NotFound => {
                trace!("Location cache miss for {}", ip);
            }
            CacheResult::Unavailable => {
                // 缓存故障时降级为直查外部服务
                warn!("Location cache unavailable, falling through to provider");
            }
        }

        let location = self.provider.lookup(ip).await?;
        self.cache.insert(ip, location.clone()).await;

        Some(location)
    }
}

impl Clone for LocationResolver {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
            provider: Arc::clone(&self.provider),
            dev_fallback: self.dev_fallback,
        }
    }
}
