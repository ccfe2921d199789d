use async_trait::async_trait;

use crate::geoip::ResolvedLocation;

/// 缓存查询结果
#[derive(Debug, Clone)]
pub enum CacheResult {
    /// 成功获取到缓存值
    Found(ResolvedLocation),
    /// 确定不存在
    NotFound,
    /// 缓存暂不可用（连接失败、反序列化失败等）
    Unavailable,
}

/// 位置缓存 trait
///
/// 所有方法不返回错误：缓存是性能优化而非正确性依赖，
/// 故障以 `CacheResult::Unavailable` 或静默丢弃的方式降级。
#[async_trait]
pub trait LocationCache: Send + Sync {
    async fn get(&self, ip: &str) -> CacheResult;
    async fn insert(&self, ip: &str, location: ResolvedLocation);
    async fn remove(&self, ip: &str);
    async fn invalidate_all(&self);
}
