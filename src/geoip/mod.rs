//! IP 地理位置解析模块
//!
//! 提供 IP 地址到坐标的解析功能，支持：
//! - MaxMind GeoLite2 本地数据库
//! - 外部 API fallback (ipapi.co)
//! - Cache-aside：命中缓存则不发外部请求，未命中则查询后回填（TTL 1 小时）

mod ipapi;
mod maxmind;
mod provider;
mod resolver;

pub use provider::{GeoLookup, ResolvedLocation};
pub use resolver::{LocationResolver, fallback_location, is_loopback_or_test};
