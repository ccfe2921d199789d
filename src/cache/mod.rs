//! 位置缓存模块
//!
//! IP → ResolvedLocation 的缓存层，支持三种后端：
//! - `memory`: moka 进程内缓存（默认）
//! - `redis`: Redis 共享缓存，多实例部署用
//! - `none`: 禁用缓存
//!
//! 通过 `cache.type` 配置项选择。

mod memory;
mod none;
mod redis;
mod traits;

use std::sync::Arc;

use tracing::info;

use crate::config::CacheConfig;
use crate::errors::{GeodiscountError, Result};

pub use memory::MokaLocationCache;
pub use none::NullLocationCache;
pub use self::redis::RedisLocationCache;
pub use traits::{CacheResult, LocationCache};

/// 缓存工厂
pub struct CacheFactory;

impl CacheFactory {
    /// 根据配置创建缓存后端
    pub fn create(config: &CacheConfig) -> Result<Arc<dyn LocationCache>> {
        let cache: Arc<dyn LocationCache> = match config.cache_type.as_str() {
            "memory" => Arc::new(MokaLocationCache::new(config)),
            "redis" => Arc::new(RedisLocationCache::new(config)?),
            "none" => Arc::new(NullLocationCache),
            other => {
                return Err(GeodiscountError::cache_plugin_not_found(format!(
                    "Unknown cache type: {other}"
                )));
            }
        };

        info!("Cache backend initialized: {}", config.cache_type);

        Ok(cache)
    }
}
