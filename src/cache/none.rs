use async_trait::async_trait;

use crate::cache::{CacheResult, LocationCache};
use crate::geoip::ResolvedLocation;

/// 空实现，禁用缓存时使用
///
/// 每次解析都会穿透到 provider。
#[derive(Default)]
pub struct NullLocationCache;

#[async_trait]
impl LocationCache for NullLocationCache {
    async fn get(&self, _ip: &str) -> CacheResult {
        CacheResult::NotFound
    }

    async fn insert(&self, _ip: &str, _location: ResolvedLocation) {}

    async fn remove(&self, _ip: &str) {}

    async fn invalidate_all(&self) {}
}
