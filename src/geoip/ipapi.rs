//! 外部地理位置 API 实现
//!
//! 使用外部 HTTP API 进行 IP 地理位置查询（如 ipapi.co）。
//! 缓存由上层 LocationResolver 负责，本模块只做一次性查询。

use std::time::Duration;

use async_trait::async_trait;
use tracing::{trace, warn};
use ureq::Agent;

use super::provider::{GeoLookup, ResolvedLocation};
use crate::utils::geo::Coordinate;

/// 外部 API 地理位置 Provider
///
/// `api_url_template` 使用 `{ip}` 作为占位符，
/// 例如: `https://ipapi.co/{ip}/json/`
pub struct IpApiProvider {
    api_url_template: String,
    /// ureq 的 Agent 是 Send + Sync，可跨请求复用连接
    agent: Agent,
}

impl IpApiProvider {
    /// 创建外部 API Provider
    ///
    /// `timeout_secs` 限制单次外部查询总耗时，避免拖慢请求链路。
    pub fn new(api_url_template: &str, timeout_secs: u64) -> Self {
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(timeout_secs)))
            .build()
            .into();

        Self {
            api_url_template: api_url_template.to_string(),
            agent,
        }
    }

    /// 解析外部 API 的 JSON 响应
    ///
    /// ipapi.co 成功格式: {"latitude": .., "longitude": .., "city": .., "region": .., "country_name": ..}
    /// 失败时返回: {"error": true, "reason": ...}
    /// 也兼容 ip-api.com 风格的 {"status": "fail"} 错误标记。
    fn parse_response(json: &serde_json::Value) -> Option<ResolvedLocation> {
        if json["error"].as_bool() == Some(true) || json["status"].as_str() == Some("fail") {
            trace!("External geolocation API returned error status");
            return None;
        }

        // 没有坐标的响应等同于失败
        let latitude = json["latitude"].as_f64()?;
        let longitude = json["longitude"].as_f64()?;

        let city = json["city"].as_str().map(String::from);
        let region = json["region"].as_str().map(String::from);
        let country = json["country_name"]
            .as_str()
            .or_else(|| json["country"].as_str())
            .map(String::from);

        Some(ResolvedLocation {
            coordinate: Coordinate::new(latitude, longitude),
            city,
            region,
            country,
        })
    }

    /// 从外部 API 获取位置信息（同步，在 spawn_blocking 中调用）
    fn fetch_from_api_sync(agent: Agent, url: String) -> Option<ResolvedLocation> {
        let resp = match agent.get(&url).call() {
            Ok(r) => r,
            Err(e) => {
                warn!("Geolocation API request to \"{}\" failed: {}", url, e);
                return None;
            }
        };

        let json: serde_json::Value = match resp.into_body().read_json() {
            Ok(j) => j,
            Err(e) => {
                warn!("Geolocation API response from \"{}\" parse failed: {}", url, e);
                return None;
            }
        };

        let location = Self::parse_response(&json);

        trace!("External API lookup result: {:?}", location);

        location
    }
}

#[async_trait]
impl GeoLookup for IpApiProvider {
    /// 查询 IP 地理位置
    ///
    /// 使用 spawn_blocking 在线程池中执行同步 HTTP 请求。
    async fn lookup(&self, ip: &str) -> Option<ResolvedLocation> {
        let url = self.api_url_template.replace("{ip}", ip);
        let agent = self.agent.clone();

        tokio::task::spawn_blocking(move || Self::fetch_from_api_sync(agent, url))
            .await
            .unwrap_or_else(|e| {
                warn!("Geolocation spawn_blocking failed: {}", e);
                None
            })
    }

    fn name(&self) -> &'static str {
        "ExternalAPI"
    }
}
