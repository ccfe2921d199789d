//! 地理坐标与测地线距离工具
//!
//! 所有距离计算基于 WGS-84 椭球模型（Karney 算法），
//! 国家/大洲尺度下平面近似误差过大，不可用。

use geo::{GeodesicDistance, point};
use serde::{Deserialize, Serialize};

use crate::errors::{GeodiscountError, Result};

/// WGS-84 坐标（纬度/经度，十进制度）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// 校验并构造坐标
///
/// 纬度范围 [-90, 90]，经度范围 [-180, 180]，必须是有限浮点数。
pub fn validate_coordinate(latitude: f64, longitude: f64) -> Result<Coordinate> {
    if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
        return Err(GeodiscountError::validation(format!(
            "latitude must be within [-90, 90], got {}",
            latitude
        )));
    }
    if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
        return Err(GeodiscountError::validation(format!(
            "longitude must be within [-180, 180], got {}",
            longitude
        )));
    }
    Ok(Coordinate::new(latitude, longitude))
}

/// 计算两个坐标间的测地线距离（公里）
pub fn calculate_distance(a: &Coordinate, b: &Coordinate) -> f64 {
    let p1 = point!(x: a.longitude, y: a.latitude);
    let p2 = point!(x: b.longitude, y: b.latitude);
    p1.geodesic_distance(&p2) / 1000.0
}

/// 校验 max_distance 查询参数
///
/// 必须能解析为有限且严格为正的浮点数（公里），否则返回校验错误。
pub fn validate_max_distance(raw: &str) -> Result<f64> {
    let value: f64 = raw.trim().parse().map_err(|_| {
        GeodiscountError::validation("max_distance must be a valid number.")
    })?;

    if !value.is_finite() || value <= 0.0 {
        return Err(GeodiscountError::validation(
            "max_distance must be a positive number.",
        ));
    }

    Ok(value)
}

/// 以中心点和半径（公里）计算经纬度包围盒
///
/// 返回 (min_lat, max_lat, min_lon, max_lon)。包围盒只做候选集预筛选，
/// 精确的测地线裁剪在邻近查询引擎里完成，所以这里宁可偏大。
/// 经度在 ±180° 处截断而不回绕（跨日界线的记录会被漏筛，可接受）。
pub fn bounding_box(center: &Coordinate, radius_km: f64) -> (f64, f64, f64, f64) {
    // 每纬度约 110.574 km，每经度在赤道约 111.320 km
    const KM_PER_DEG_LAT: f64 = 110.574;
    const KM_PER_DEG_LON_EQUATOR: f64 = 111.320;

    let dlat = radius_km / KM_PER_DEG_LAT;
    // 高纬度时经度收缩，cos 下限防止极点除零
    let cos_lat = center.latitude.to_radians().cos().abs().max(0.01);
    let dlon = radius_km / (KM_PER_DEG_LON_EQUATOR * cos_lat);

    (
        (center.latitude - dlat).max(-90.0),
        (center.latitude + dlat).min(90.0),
        (center.longitude - dlon).max(-180.0),
        (center.longitude + dlon).min(180.0),
    )
}
