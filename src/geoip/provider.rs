//! 地理位置查询抽象层

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::utils::geo::Coordinate;

/// IP 解析出的位置信息
///
/// 序列化后直接存入位置缓存（Redis 后端存 JSON）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedLocation {
    /// WGS-84 坐标
    pub coordinate: Coordinate,
    /// 城市名称
    pub city: Option<String>,
    /// 地区/省份名称
    pub region: Option<String>,
    /// 国家名称
    pub country: Option<String>,
}

/// 地理位置查询 trait
///
/// 失败一律返回 None（网络错误、响应格式错误、响应带 error 标记），
/// 由调用方决定如何降级。
#[async_trait]
pub trait GeoLookup: Send + Sync {
    /// 查询 IP 地址的地理位置
    async fn lookup(&self, ip: &str) -> Option<ResolvedLocation>;

    /// 获取 provider 名称（用于日志）
    fn name(&self) -> &'static str;
}
