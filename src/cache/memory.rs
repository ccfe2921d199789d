use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use tracing::debug;

use crate::cache::{CacheResult, LocationCache};
use crate::config::CacheConfig;
use crate::geoip::ResolvedLocation;

/// 基于 moka 的进程内位置缓存
///
/// 单实例部署的默认后端，TTL 到期后自动淘汰。
pub struct MokaLocationCache {
    inner: Cache<String, ResolvedLocation>,
}

impl MokaLocationCache {
    pub fn new(config: &CacheConfig) -> Self {
        let inner = Cache::builder()
            .max_capacity(config.memory.max_capacity)
            .time_to_live(Duration::from_secs(config.default_ttl))
            .build();

        debug!(
            "MokaLocationCache initialized with max capacity: {}, TTL: {}s",
            config.memory.max_capacity, config.default_ttl
        );

        Self { inner }
    }
}

#[async_trait]
impl LocationCache for MokaLocationCache {
    async fn get(&self, ip: &str) -> CacheResult {
        match self.inner.get(ip).await {
            Some(location) => CacheResult::Found(location),
            None => CacheResult::NotFound,
        }
    }

    async fn insert(&self, ip: &str, location: ResolvedLocation) {
        self.inner.insert(ip.to_string(), location).await;
    }

    async fn remove(&self, ip: &str) {
        self.inner.invalidate(ip).await;
    }

    async fn invalidate_all(&self) {
        self.inner.invalidate_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geoip::fallback_location;

    fn test_config(ttl: u64) -> CacheConfig {
        CacheConfig {
            default_ttl: ttl,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let cache = MokaLocationCache::new(&test_config(3600));

        cache.insert("8.8.8.8", fallback_location()).await;

        match cache.get("8.8.8.8").await {
            CacheResult::Found(location) => {
                assert_eq!(location, fallback_location());
            }
            other => panic!("Expected Found, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_miss_returns_not_found() {
        let cache = MokaLocationCache::new(&test_config(3600));
        assert!(matches!(cache.get("1.2.3.4").await, CacheResult::NotFound));
    }

    #[tokio::test]
    async fn test_entry_expires_after_ttl() {
        let cache = MokaLocationCache::new(&test_config(1));

        cache.insert("8.8.8.8", fallback_location()).await;
        assert!(matches!(cache.get("8.8.8.8").await, CacheResult::Found(_)));

        tokio::time::sleep(Duration::from_millis(1200)).await;

        // TTL 过期后条目被淘汰
        assert!(matches!(cache.get("8.8.8.8").await, CacheResult::NotFound));
    }

    #[tokio::test]
    async fn test_remove() {
        let cache = MokaLocationCache::new(&test_config(3600));

        cache.insert("8.8.8.8", fallback_location()).await;
        cache.remove("8.8.8.8").await;

        assert!(matches!(cache.get("8.8.8.8").await, CacheResult::NotFound));
    }
}
