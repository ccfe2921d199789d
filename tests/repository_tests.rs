//! 存储层集成测试
//!
//! 覆盖工厂选择、memory 后端的 CRUD 与包围盒查询。

use chrono::{Duration, Utc};

use geodiscounts::config::DatabaseConfig;
use geodiscounts::repository::{NewDiscount, NewRetailer, RepositoryFactory};
use geodiscounts::utils::Coordinate;

fn memory_config() -> DatabaseConfig {
    DatabaseConfig {
        backend: "memory".to_string(),
        ..Default::default()
    }
}

fn retailer_at(name: &str, lat: f64, lon: f64) -> NewRetailer {
    NewRetailer {
        name: name.to_string(),
        contact_info: Some("info@example.com".to_string()),
        coordinate: Coordinate::new(lat, lon),
    }
}

fn discount_at(retailer_id: i64, code: &str, lat: f64, lon: f64) -> NewDiscount {
    NewDiscount {
        retailer_id,
        description: format!("Discount {code}"),
        discount_code: code.to_string(),
        discount_value: 15.0,
        is_active: true,
        expiration_date: Utc::now() + Duration::days(30),
        coordinate: Coordinate::new(lat, lon),
    }
}

#[tokio::test]
async fn factory_rejects_unknown_backend() {
    let config = DatabaseConfig {
        backend: "cassandra".to_string(),
        ..Default::default()
    };

    assert!(RepositoryFactory::create(&config).await.is_err());
}

#[tokio::test]
async fn factory_creates_memory_backend() {
    let repo = RepositoryFactory::create(&memory_config()).await.unwrap();

    let backend = repo.get_backend_config().await;
    assert_eq!(backend.storage_type, "memory");
}

#[tokio::test]
async fn discount_crud_roundtrip() {
    let repo = RepositoryFactory::create(&memory_config()).await.unwrap();

    let retailer = repo
        .insert_retailer(retailer_at("Corner Store", 37.751, -97.822))
        .await
        .unwrap();

    let created = repo
        .insert_discount(discount_at(retailer.id, "SAVE15", 37.751, -97.822))
        .await
        .unwrap();

    let fetched = repo.get_discount(created.id).await.unwrap();
    assert_eq!(fetched.discount_code, "SAVE15");
    assert_eq!(fetched.retailer_id, retailer.id);

    assert_eq!(repo.count_discounts().await.unwrap(), 1);

    repo.remove_discount(created.id).await.unwrap();
    assert!(repo.get_discount(created.id).await.is_none());
    assert_eq!(repo.count_discounts().await.unwrap(), 0);
}

#[tokio::test]
async fn remove_missing_records_errors() {
    let repo = RepositoryFactory::create(&memory_config()).await.unwrap();

    assert!(repo.remove_discount(999).await.is_err());
    assert!(repo.remove_retailer(999).await.is_err());
}

#[tokio::test]
async fn within_prefilters_candidates() {
    let repo = RepositoryFactory::create(&memory_config()).await.unwrap();
    let center = Coordinate::new(37.751, -97.822);

    let retailer = repo
        .insert_retailer(retailer_at("Corner Store", 37.751, -97.822))
        .await
        .unwrap();

    // 约 2 km 北侧
    repo.insert_discount(discount_at(retailer.id, "NEAR", 37.769, -97.822))
        .await
        .unwrap();
    // 巴黎，远在包围盒之外
    repo.insert_discount(discount_at(retailer.id, "FAR", 48.8566, 2.3522))
        .await
        .unwrap();

    let candidates = repo.discounts_within(&center, 10.0).await.unwrap();
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].discount_code, "NEAR");

    let retailers = repo.retailers_within(&center, 10.0).await.unwrap();
    assert_eq!(retailers.len(), 1);
}

#[tokio::test]
async fn sqlite_backend_roundtrip() {
    let temp_dir = tempfile::TempDir::new().expect("创建临时目录失败");
    let db_path = temp_dir.path().join("repository_test.db");
    let config = DatabaseConfig {
        backend: "sqlite".to_string(),
        database_url: format!("sqlite://{}?mode=rwc", db_path.display()),
        ..Default::default()
    };

    let repo = RepositoryFactory::create(&config).await.unwrap();
    assert_eq!(repo.get_backend_config().await.storage_type, "sqlite");

    let retailer = repo
        .insert_retailer(retailer_at("SQLite Store", 37.751, -97.822))
        .await
        .unwrap();
    let discount = repo
        .insert_discount(discount_at(retailer.id, "SQL10", 37.751, -97.822))
        .await
        .unwrap();

    let fetched = repo.get_discount(discount.id).await.unwrap();
    assert_eq!(fetched.discount_code, "SQL10");

    let center = Coordinate::new(37.751, -97.822);
    let nearby = repo.discounts_within(&center, 5.0).await.unwrap();
    assert_eq!(nearby.len(), 1);

    // 级联删除：删除商家后其折扣一并消失
    repo.remove_retailer(retailer.id).await.unwrap();
    assert!(repo.get_discount(discount.id).await.is_none());
}

#[tokio::test]
async fn load_all_returns_everything() {
    let repo = RepositoryFactory::create(&memory_config()).await.unwrap();

    let retailer = repo
        .insert_retailer(retailer_at("Store A", 10.0, 10.0))
        .await
        .unwrap();

    let mut inactive = discount_at(retailer.id, "INACTIVE", 10.0, 10.0);
    inactive.is_active = false;
    repo.insert_discount(inactive).await.unwrap();
    repo.insert_discount(discount_at(retailer.id, "LIVE", 10.0, 10.0))
        .await
        .unwrap();

    // load_discounts 不做有效性过滤，管理端需要看到全部
    assert_eq!(repo.load_discounts().await.len(), 2);

    // 空间查询只返回有效折扣
    let center = Coordinate::new(10.0, 10.0);
    assert_eq!(repo.discounts_within(&center, 5.0).await.unwrap().len(), 1);
}
