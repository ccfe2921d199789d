//! 邻近查询端到端测试
//!
//! 存储层包围盒预过滤 + 引擎精确测地裁剪的组合行为。

use chrono::{Duration, Utc};

use geodiscounts::repository::backends::memory::MemoryRepository;
use geodiscounts::repository::{DiscountRepository, NewDiscount, NewRetailer};
use geodiscounts::services::{DEFAULT_RESULT_LIMIT, ProximityEngine};
use geodiscounts::utils::{Coordinate, calculate_distance};

/// 1 度纬度 ≈ 110.574 km，向北偏移构造指定距离的坐标
fn km_north_of(origin: &Coordinate, km: f64) -> Coordinate {
    Coordinate::new(origin.latitude + km / 110.574, origin.longitude)
}

async fn seed_repo(origin: &Coordinate, offsets_km: &[f64]) -> MemoryRepository {
    let repo = MemoryRepository::new();

    let retailer = repo
        .insert_retailer(NewRetailer {
            name: "Test Retailer".to_string(),
            contact_info: None,
            coordinate: *origin,
        })
        .await
        .unwrap();

    for (i, km) in offsets_km.iter().enumerate() {
        repo.insert_discount(NewDiscount {
            retailer_id: retailer.id,
            description: format!("Discount at {km} km"),
            discount_code: format!("KM{i}"),
            discount_value: 10.0,
            is_active: true,
            expiration_date: Utc::now() + Duration::days(7),
            coordinate: km_north_of(origin, *km),
        })
        .await
        .unwrap();
    }

    repo
}

#[tokio::test]
async fn radius_six_keeps_one_and_five_km_records() {
    let origin = Coordinate::new(37.751, -97.822);
    let repo = seed_repo(&origin, &[1.0, 5.0, 10.0]).await;

    let candidates = repo.discounts_within(&origin, 6.0).await.unwrap();
    let ranked = ProximityEngine::rank(&origin, candidates, Some(6.0), DEFAULT_RESULT_LIMIT);

    assert_eq!(ranked.len(), 2);
    assert!((ranked[0].distance_km - 1.0).abs() < 0.05);
    assert!((ranked[1].distance_km - 5.0).abs() < 0.05);
    assert!(ranked[0].distance_km < ranked[1].distance_km);
}

#[tokio::test]
async fn results_are_sorted_ascending() {
    let origin = Coordinate::new(37.751, -97.822);
    let repo = seed_repo(&origin, &[8.0, 2.0, 6.0, 4.0]).await;

    let candidates = repo.discounts_within(&origin, 100.0).await.unwrap();
    let ranked = ProximityEngine::rank(&origin, candidates, None, DEFAULT_RESULT_LIMIT);

    assert_eq!(ranked.len(), 4);
    for window in ranked.windows(2) {
        assert!(window[0].distance_km <= window[1].distance_km);
    }
}

#[tokio::test]
async fn limit_caps_result_size() {
    let origin = Coordinate::new(37.751, -97.822);
    let offsets: Vec<f64> = (1..=20).map(|km| km as f64).collect();
    let repo = seed_repo(&origin, &offsets).await;

    let candidates = repo.discounts_within(&origin, 1000.0).await.unwrap();
    let ranked = ProximityEngine::rank(&origin, candidates, None, DEFAULT_RESULT_LIMIT);

    assert_eq!(ranked.len(), DEFAULT_RESULT_LIMIT);
    // 最近的 10 条
    assert!(ranked.last().unwrap().distance_km < 10.5);
}

#[test]
fn geodesic_distance_is_symmetric_and_accurate() {
    let rome = Coordinate::new(41.8902, 12.4922);
    let paris = Coordinate::new(48.8566, 2.3522);

    let d1 = calculate_distance(&rome, &paris);
    let d2 = calculate_distance(&paris, &rome);

    assert!((d1 - d2).abs() < 1e-9);
    // 罗马—巴黎约 1105 km
    assert!((d1 - 1105.2).abs() < 1.5, "got {d1}");
}
