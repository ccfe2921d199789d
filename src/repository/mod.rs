//! 地理标记记录存储
//!
//! Retailer / Discount 的持久化层。`*_within` 只做粗粒度的
//! 包围盒预过滤，精确的测地距离裁剪由 proximity 引擎完成。

use std::sync::Arc;

use tracing::error;

use crate::config::DatabaseConfig;
use crate::errors::{GeodiscountError, Result};
use crate::utils::geo::Coordinate;

pub mod backends;
pub mod models;

pub use models::{Discount, NewDiscount, NewRetailer, Retailer, StorageConfig};

#[async_trait::async_trait]
pub trait DiscountRepository: Send + Sync {
    async fn get_discount(&self, id: i64) -> Option<Discount>;
    async fn load_discounts(&self) -> Vec<Discount>;
    /// 包围盒内的有效折扣（is_active 且未过期），未按距离排序
    async fn discounts_within(&self, center: &Coordinate, radius_km: f64) -> Result<Vec<Discount>>;
    async fn insert_discount(&self, new: NewDiscount) -> Result<Discount>;
    async fn remove_discount(&self, id: i64) -> Result<()>;
    /// 健康检查用的轻量探针
    async fn count_discounts(&self) -> Result<u64>;

    async fn get_retailer(&self, id: i64) -> Option<Retailer>;
    async fn load_retailers(&self) -> Vec<Retailer>;
    async fn retailers_within(&self, center: &Coordinate, radius_km: f64) -> Result<Vec<Retailer>>;
    async fn insert_retailer(&self, new: NewRetailer) -> Result<Retailer>;
    async fn remove_retailer(&self, id: i64) -> Result<()>;

    async fn get_backend_config(&self) -> StorageConfig;
}

pub struct RepositoryFactory;

impl RepositoryFactory {
    pub async fn create(config: &DatabaseConfig) -> Result<Arc<dyn DiscountRepository>> {
        let backend = &config.backend;

        match backend.as_str() {
            "sqlite" | "mysql" | "postgres" | "mariadb" => {
                let repository = backends::sea_orm::SeaOrmRepository::new(config).await?;
                Ok(Arc::new(repository) as Arc<dyn DiscountRepository>)
            }
            "memory" => {
                let repository = backends::memory::MemoryRepository::new();
                Ok(Arc::new(repository) as Arc<dyn DiscountRepository>)
            }
            _ => {
                error!("Unknown repository backend: {}", backend);
                Err(GeodiscountError::storage_plugin_not_found(format!(
                    "Unknown repository backend: {backend}. Supported: sqlite, mysql, postgres, mariadb, memory",
                )))
            }
        }
    }
}
