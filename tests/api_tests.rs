//! HTTP API 集成测试
//!
//! 使用 memory 存储 + 回环 IP 的固定测试位置驱动完整的请求链路。

use std::net::SocketAddr;
use std::sync::{Arc, Once};

use actix_web::http::StatusCode;
use actix_web::test::{self, TestRequest};
use actix_web::{App, web};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde_json::{Value, json};

use geodiscounts::api::{AppStartTime, discount_routes, health_routes, retailer_routes};
use geodiscounts::cache::NullLocationCache;
use geodiscounts::config::init_config;
use geodiscounts::geoip::{GeoLookup, LocationResolver, ResolvedLocation};
use geodiscounts::repository::backends::memory::MemoryRepository;
use geodiscounts::repository::{DiscountRepository, NewDiscount, NewRetailer};
use geodiscounts::utils::Coordinate;

static INIT: Once = Once::new();

fn init_test_config() {
    INIT.call_once(|| {
        init_config();
    });
}

/// 测试中不应有任何真实外部查询
struct NoLookupProvider;

#[async_trait]
impl GeoLookup for NoLookupProvider {
    async fn lookup(&self, _ip: &str) -> Option<ResolvedLocation> {
        None
    }

    fn name(&self) -> &'static str {
        "NoLookup"
    }
}

fn test_resolver() -> LocationResolver {
    // dev_fallback 开启，回环 peer 解析为固定测试位置
    LocationResolver::new(Arc::new(NullLocationCache), Arc::new(NoLookupProvider), true)
}

/// 固定测试位置 (37.751, -97.822) 北侧 km 公里处的坐标
fn km_north_of_fallback(km: f64) -> Coordinate {
    Coordinate::new(37.751 + km / 110.574, -97.822)
}

async fn seed_discounts(repo: &MemoryRepository, offsets_km: &[f64]) {
    let retailer = repo
        .insert_retailer(NewRetailer {
            name: "Corner Store".to_string(),
            contact_info: None,
            coordinate: Coordinate::new(37.751, -97.822),
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
            coordinate: km_north_of_fallback(*km),
        })
        .await
        .unwrap();
    }
}

macro_rules! test_app {
    ($repo:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new(
                    $repo.clone() as Arc<dyn DiscountRepository>
                ))
                .app_data(web::Data::new(test_resolver()))
                .app_data(web::Data::new(AppStartTime {
                    start_datetime: Utc::now(),
                }))
                .service(
                    web::scope("/api/v1")
                        .service(discount_routes())
                        .service(retailer_routes()),
                )
                .service(health_routes()),
        )
        .await
    };
}

fn loopback_peer() -> SocketAddr {
    "127.0.0.1:34567".parse().unwrap()
}

#[actix_rt::test]
async fn nearby_returns_ranked_discounts() {
    init_test_config();
    let repo = Arc::new(MemoryRepository::new());
    seed_discounts(&repo, &[1.0, 5.0, 10.0]).await;
    let app = test_app!(repo);

    let req = TestRequest::get()
        .uri("/api/v1/discounts/nearby?max_distance=6")
        .peer_addr(loopback_peer())
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], 0);

    let data = body["data"].as_array().unwrap();
    // 10 km 的折扣被半径裁掉
    assert_eq!(data.len(), 2);
    assert_eq!(data[0]["discount_code"], "KM0");
    assert_eq!(data[1]["discount_code"], "KM1");
    assert!(data[0]["distance_km"].as_f64().unwrap() < data[1]["distance_km"].as_f64().unwrap());
    assert_eq!(data[0]["retailer"]["name"], "Corner Store");
}

#[actix_rt::test]
async fn nearby_without_max_distance_sorts_everything() {
    init_test_config();
    let repo = Arc::new(MemoryRepository::new());
    seed_discounts(&repo, &[10.0, 2.0]).await;
    let app = test_app!(repo);

    let req = TestRequest::get()
        .uri("/api/v1/discounts/nearby")
        .peer_addr(loopback_peer())
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 2);
    assert_eq!(data[0]["discount_code"], "KM1");
}

#[actix_rt::test]
async fn nearby_rejects_invalid_max_distance() {
    init_test_config();
    let repo = Arc::new(MemoryRepository::new());
    seed_discounts(&repo, &[1.0]).await;
    let app = test_app!(repo);

    for bad in ["abc", "-5", "0", "NaN"] {
        let req = TestRequest::get()
            .uri(&format!("/api/v1/discounts/nearby?max_distance={bad}"))
            .peer_addr(loopback_peer())
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "input: {bad}");
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["code"], 3001);
    }
}

#[actix_rt::test]
async fn nearby_with_no_matches_is_404() {
    init_test_config();
    let repo = Arc::new(MemoryRepository::new());
    seed_discounts(&repo, &[5.0]).await;
    let app = test_app!(repo);

    let req = TestRequest::get()
        .uri("/api/v1/discounts/nearby?max_distance=0.5")
        .peer_addr(loopback_peer())
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], 3002);
    assert_eq!(body["message"], "No discounts found near your location.");
}

#[actix_rt::test]
async fn empty_discount_list_is_404() {
    init_test_config();
    let repo = Arc::new(MemoryRepository::new());
    let app = test_app!(repo);

    let req = TestRequest::get().uri("/api/v1/discounts").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn create_and_get_roundtrip() {
    init_test_config();
    let repo = Arc::new(MemoryRepository::new());
    let app = test_app!(repo);

    let req = TestRequest::post()
        .uri("/api/v1/retailers")
        .set_json(json!({
            "name": "New Store",
            "contact_info": "hello@example.com",
            "coordinate": { "latitude": 37.751, "longitude": -97.822 }
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    let retailer_id = body["data"]["id"].as_i64().unwrap();

    let expiration = (Utc::now() + Duration::days(7)).to_rfc3339();
    let req = TestRequest::post()
        .uri("/api/v1/discounts")
        .set_json(json!({
            "retailer_id": retailer_id,
            "description": "Grand opening",
            "discount_code": "OPEN20",
            "discount_value": 20.0,
            "expiration_date": expiration,
            "coordinate": { "latitude": 37.751, "longitude": -97.822 }
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    let discount_id = body["data"]["id"].as_i64().unwrap();

    let req = TestRequest::get()
        .uri(&format!("/api/v1/discounts/{discount_id}"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["discount_code"], "OPEN20");
    assert_eq!(body["data"]["retailer"]["name"], "New Store");
}

#[actix_rt::test]
async fn create_discount_for_missing_retailer_is_rejected() {
    init_test_config();
    let repo = Arc::new(MemoryRepository::new());
    let app = test_app!(repo);

    let expiration = (Utc::now() + Duration::days(7)).to_rfc3339();
    let req = TestRequest::post()
        .uri("/api/v1/discounts")
        .set_json(json!({
            "retailer_id": 999,
            "description": "Orphan",
            "discount_code": "ORPHAN",
            "discount_value": 5.0,
            "expiration_date": expiration,
            "coordinate": { "latitude": 37.751, "longitude": -97.822 }
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], 3003);
}

#[actix_rt::test]
async fn delete_discount_then_404() {
    init_test_config();
    let repo = Arc::new(MemoryRepository::new());
    seed_discounts(&repo, &[1.0]).await;
    let app = test_app!(repo);

    let req = TestRequest::delete()
        .uri("/api/v1/discounts/1")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = TestRequest::get().uri("/api/v1/discounts/1").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn nearby_retailers_ranked() {
    init_test_config();
    let repo = Arc::new(MemoryRepository::new());

    for (name, km) in [("Near Store", 1.0), ("Far Store", 8.0)] {
        repo.insert_retailer(NewRetailer {
            name: name.to_string(),
            contact_info: None,
            coordinate: km_north_of_fallback(km),
        })
        .await
        .unwrap();
    }
    let app = test_app!(repo);

    let req = TestRequest::get()
        .uri("/api/v1/retailers/nearby?max_distance=10")
        .peer_addr(loopback_peer())
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 2);
    assert_eq!(data[0]["name"], "Near Store");
    assert_eq!(data[1]["name"], "Far Store");
}

#[actix_rt::test]
async fn health_endpoints() {
    init_test_config();
    let repo = Arc::new(MemoryRepository::new());
    seed_discounts(&repo, &[1.0]).await;
    let app = test_app!(repo);

    let req = TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["checks"]["repository"]["discounts_count"], 1);

    let req = TestRequest::get().uri("/health/ready").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = TestRequest::get().uri("/health/live").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
}
