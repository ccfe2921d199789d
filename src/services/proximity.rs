//! 邻近查询引擎
//!
//! 对一批带坐标的记录做精确的测地距离排序与半径裁剪。
//! 存储层的包围盒预过滤只是粗筛，半径语义以这里的计算为准。

use crate::repository::{Discount, Retailer};
use crate::utils::geo::{Coordinate, calculate_distance};

/// HTTP 层使用的默认返回条数
pub const DEFAULT_RESULT_LIMIT: usize = 10;

/// 可参与邻近排序的记录
pub trait GeoRecord {
    fn coordinate(&self) -> &Coordinate;
    /// 距离相同时按 id 升序，保证结果确定
    fn record_id(&self) -> i64;
}

impl GeoRecord for Discount {
    fn coordinate(&self) -> &Coordinate {
        &self.coordinate
    }

    fn record_id(&self) -> i64 {
        self.id
    }
}

impl GeoRecord for Retailer {
    fn coordinate(&self) -> &Coordinate {
        &self.coordinate
    }

    fn record_id(&self) -> i64 {
        self.id
    }
}

/// 带距离标注的记录
#[derive(Debug, Clone)]
pub struct Ranked<T> {
    pub record: T,
    /// 距查询原点的测地距离，单位 km
    pub distance_km: f64,
}

pub struct ProximityEngine;

impl ProximityEngine {
    /// 标注距离、按半径裁剪、升序排序、截断
    ///
    /// `max_distance_km` 为 None 时不做半径裁剪，只排序。
    pub fn rank<T: GeoRecord>(
        origin: &Coordinate,
        records: Vec<T>,
        max_distance_km: Option<f64>,
        limit: usize,
    ) -> Vec<Ranked<T>> {
        let mut ranked: Vec<Ranked<T>> = records
            .into_iter()
            .map(|record| {
                let distance_km = calculate_distance(origin, record.coordinate());
                Ranked {
                    record,
                    distance_km,
                }
            })
            .collect();

        if let Some(max_km) = max_distance_km {
            ranked.retain(|r| r.distance_km <= max_km);
        }

        // calculate_distance 只产生有限值；partial_cmp 失败时退化为 id 排序
        ranked.sort_by(|a, b| {
            a.distance_km
                .partial_cmp(&b.distance_km)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.record.record_id().cmp(&b.record.record_id()))
        });

        ranked.truncate(limit);
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use crate::repository::Discount;

    /// 以原点为基准，向北偏移 km 公里构造一个折扣
    /// 1 度纬度 ≈ 110.574 km
    fn discount_at(id: i64, origin: &Coordinate, km_north: f64) -> Discount {
        let now = Utc::now();
        Discount {
            id,
            retailer_id: 1,
            description: format!("Discount {id}"),
            discount_code: format!("CODE{id}"),
            discount_value: 5.0,
            is_active: true,
            expiration_date: now + Duration::days(30),
            coordinate: Coordinate::new(origin.latitude + km_north / 110.574, origin.longitude),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_radius_filter_and_order() {
        let origin = Coordinate::new(37.751, -97.822);
        let records = vec![
            discount_at(1, &origin, 10.0),
            discount_at(2, &origin, 1.0),
            discount_at(3, &origin, 5.0),
        ];

        let ranked = ProximityEngine::rank(&origin, records, Some(6.0), DEFAULT_RESULT_LIMIT);

        // 10 km 的记录被裁掉，剩下按距离升序
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].record.id, 2);
        assert_eq!(ranked[1].record.id, 3);
        assert!((ranked[0].distance_km - 1.0).abs() < 0.05);
        assert!((ranked[1].distance_km - 5.0).abs() < 0.05);
    }

    #[test]
    fn test_no_radius_sorts_everything() {
        let origin = Coordinate::new(37.751, -97.822);
        let records = vec![
            discount_at(1, &origin, 10.0),
            discount_at(2, &origin, 1.0),
        ];

        let ranked = ProximityEngine::rank(&origin, records, None, DEFAULT_RESULT_LIMIT);

        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].record.id, 2);
    }

    #[test]
    fn test_ties_broken_by_id() {
        let origin = Coordinate::new(37.751, -97.822);
        // 同一个位置的两条记录，距离完全相同
        let records = vec![
            discount_at(7, &origin, 2.0),
            discount_at(3, &origin, 2.0),
        ];

        let ranked = ProximityEngine::rank(&origin, records, None, DEFAULT_RESULT_LIMIT);

        assert_eq!(ranked[0].record.id, 3);
        assert_eq!(ranked[1].record.id, 7);
    }

    #[test]
    fn test_limit_truncates() {
        let origin = Coordinate::new(37.751, -97.822);
        let records: Vec<Discount> = (1..=15)
            .map(|id| discount_at(id, &origin, id as f64))
            .collect();

        let ranked = ProximityEngine::rank(&origin, records, None, DEFAULT_RESULT_LIMIT);

        assert_eq!(ranked.len(), DEFAULT_RESULT_LIMIT);
        assert_eq!(ranked[0].record.id, 1);
        assert_eq!(ranked[9].record.id, 10);
    }

    #[test]
    fn test_exactly_at_radius_is_included() {
        let origin = Coordinate::new(0.0, 0.0);
        let records = vec![discount_at(1, &origin, 0.0)];

        // 距离 0，半径 0 也应命中（<= 语义）
        let ranked = ProximityEngine::rank(&origin, records, Some(0.0), DEFAULT_RESULT_LIMIT);
        assert_eq!(ranked.len(), 1);
    }
}
