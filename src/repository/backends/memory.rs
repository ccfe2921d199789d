use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::errors::{GeodiscountError, Result};
use crate::repository::models::StorageConfig;
use crate::repository::{Discount, DiscountRepository, NewDiscount, NewRetailer, Retailer};
use crate::utils::geo::{Coordinate, bounding_box};

/// 进程内存储后端
///
/// 测试和演示部署使用，进程退出即丢失。
/// BTreeMap 保证遍历按 id 升序，与 SQL 后端的主键顺序一致。
#[derive(Default)]
pub struct MemoryRepository {
    discounts: RwLock<BTreeMap<i64, Discount>>,
    retailers: RwLock<BTreeMap<i64, Retailer>>,
    next_discount_id: AtomicI64,
    next_retailer_id: AtomicI64,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self {
            discounts: RwLock::new(BTreeMap::new()),
            retailers: RwLock::new(BTreeMap::new()),
            next_discount_id: AtomicI64::new(1),
            next_retailer_id: AtomicI64::new(1),
        }
    }

    fn in_box(
        coordinate: &Coordinate,
        bbox: (f64, f64, f64, f64),
    ) -> bool {
        let (min_lat, max_lat, min_lon, max_lon) = bbox;
        coordinate.latitude >= min_lat
            && coordinate.latitude <= max_lat
            && coordinate.longitude >= min_lon
            && coordinate.longitude <= max_lon
    }
}

#[async_trait]
impl DiscountRepository for MemoryRepository {
    async fn get_discount(&self, id: i64) -> Option<Discount> {
        self.discounts.read().await.get(&id).cloned()
    }

    async fn load_discounts(&self) -> Vec<Discount> {
        self.discounts.read().await.values().cloned().collect()
    }

    async fn discounts_within(&self, center: &Coordinate, radius_km: f64) -> Result<Vec<Discount>> {
        let bbox = bounding_box(center, radius_km);
        let now = Utc::now();

        Ok(self
            .discounts
            .read()
            .await
            .values()
            .filter(|d| d.is_active && d.expiration_date > now)
            .filter(|d| Self::in_box(&d.coordinate, bbox))
            .cloned()
            .collect())
    }

    async fn insert_discount(&self, new: NewDiscount) -> Result<Discount> {
        let mut discounts = self.discounts.write().await;

        // 折扣码唯一，模拟 SQL 后端的唯一约束
        if discounts
            .values()
            .any(|d| d.discount_code == new.discount_code)
        {
            return Err(GeodiscountError::database_operation(format!(
                "Duplicate discount code: {}",
                new.discount_code
            )));
        }

        let id = self.next_discount_id.fetch_add(1, Ordering::SeqCst);
        let now = Utc::now();

        let discount = Discount {
            id,
            retailer_id: new.retailer_id,
            description: new.description,
            discount_code: new.discount_code,
            discount_value: new.discount_value,
            is_active: new.is_active,
            expiration_date: new.expiration_date,
            coordinate: new.coordinate,
            created_at: now,
            updated_at: now,
        };

        discounts.insert(id, discount.clone());
        Ok(discount)
    }

    async fn remove_discount(&self, id: i64) -> Result<()> {
        match self.discounts.write().await.remove(&id) {
            Some(_) => Ok(()),
            None => Err(GeodiscountError::not_found(format!(
                "Discount not found: {id}"
            ))),
        }
    }

    async fn count_discounts(&self) -> Result<u64> {
        Ok(self.discounts.read().await.len() as u64)
    }

    async fn get_retailer(&self, id: i64) -> Option<Retailer> {
        self.retailers.read().await.get(&id).cloned()
    }

    async fn load_retailers(&self) -> Vec<Retailer> {
        self.retailers.read().await.values().cloned().collect()
    }

    async fn retailers_within(&self, center: &Coordinate, radius_km: f64) -> Result<Vec<Retailer>> {
        let bbox = bounding_box(center, radius_km);

        Ok(self
            .retailers
            .read()
            .await
            .values()
            .filter(|r| Self::in_box(&r.coordinate, bbox))
            .cloned()
            .collect())
    }

    async fn insert_retailer(&self, new: NewRetailer) -> Result<Retailer> {
        let id = self.next_retailer_id.fetch_add(1, Ordering::SeqCst);
        let now = Utc::now();

        let retailer = Retailer {
            id,
            name: new.name,
            contact_info: new.contact_info,
            coordinate: new.coordinate,
            created_at: now,
            updated_at: now,
        };

        self.retailers.write().await.insert(id, retailer.clone());
        Ok(retailer)
    }

    async fn remove_retailer(&self, id: i64) -> Result<()> {
        match self.retailers.write().await.remove(&id) {
            Some(_) => Ok(()),
            None => Err(GeodiscountError::not_found(format!(
                "Retailer not found: {id}"
            ))),
        }
    }

    async fn get_backend_config(&self) -> StorageConfig {
        StorageConfig {
            storage_type: "memory".to_string(),
            supports_spatial_query: false,
        }
    }
}
