//! MaxMind GeoLite2 数据库实现
//!
//! 使用本地 MaxMind GeoLite2-City.mmdb 文件进行 IP 地理位置查询

use std::net::IpAddr;
use std::sync::Arc;

use async_trait::async_trait;
use maxminddb::Reader;
use tracing::trace;

use super::provider::{GeoLookup, ResolvedLocation};
use crate::utils::geo::Coordinate;

/// MaxMind 地理位置 Provider
pub struct MaxMindProvider {
    reader: Arc<Reader<Vec<u8>>>,
}

impl MaxMindProvider {
    /// 从文件路径创建 MaxMind Provider
    pub fn new(path: &str) -> Result<Self, maxminddb::MaxMindDbError> {
        let reader = Reader::open_readfile(path)?;
        Ok(Self {
            reader: Arc::new(reader),
        })
    }
}

#[async_trait]
impl GeoLookup for MaxMindProvider {
    async fn lookup(&self, ip: &str) -> Option<ResolvedLocation> {
        let ip_addr: IpAddr = ip.parse().ok()?;

        let result = self.reader.lookup(ip_addr).ok()?;
        let city: maxminddb::geoip2::City = result.decode().ok()??;

        // 没有坐标的记录等同于未命中
        let latitude = city.location.latitude?;
        let longitude = city.location.longitude?;

        let country = city
            .country
            .names
            .english
            .map(String::from)
            .or_else(|| city.country.iso_code.map(String::from));
        let city_name = city.city.names.english.map(|s| s.to_string());

        trace!(
            "MaxMind lookup for {}: country={:?}, city={:?}",
            ip, country, city_name
        );

        Some(ResolvedLocation {
            coordinate: Coordinate::new(latitude, longitude),
            city: city_name,
            // GeoLite2 的 subdivision 命名跨数据库版本不稳定，不提供 region
            region: None,
            country,
        })
    }

    fn name(&self) -> &'static str {
        "MaxMind"
    }
}
