use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ActiveValue::Set, ColumnTrait, ConnectOptions,
    Database, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
};
use tracing::{error, info, warn};

use crate::config::DatabaseConfig;
use crate::errors::{GeodiscountError, Result};
use crate::repository::models::StorageConfig;
use crate::repository::{Discount, DiscountRepository, NewDiscount, NewRetailer, Retailer};
use crate::utils::geo::{Coordinate, bounding_box};

use migration::{Migrator, MigratorTrait, entities::discount, entities::retailer};

#[derive(Clone)]
pub struct SeaOrmRepository {
    db: DatabaseConnection,
    backend_name: String,
}

impl SeaOrmRepository {
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        if config.database_url.is_empty() {
            return Err(GeodiscountError::database_config(
                "database_url is not set".to_string(),
            ));
        }

        // 根据不同数据库类型配置连接选项
        let db = if config.backend == "sqlite" {
            Self::connect_sqlite(&config.database_url).await?
        } else {
            Self::connect_generic(config).await?
        };

        let repository = SeaOrmRepository {
            db,
            backend_name: config.backend.clone(),
        };

        // 运行迁移
        repository.run_migrations().await?;

        warn!(
            "{} Repository initialized.",
            repository.backend_name.to_uppercase()
        );
        Ok(repository)
    }

    /// 连接 SQLite 数据库（带自动创建和性能优化）
    async fn connect_sqlite(database_url: &str) -> Result<DatabaseConnection> {
        use sea_orm::SqlxSqliteConnector;
        use sea_orm::sqlx::SqlitePool;
        use sea_orm::sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqliteSynchronous};
        use std::str::FromStr;

        let opt = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| {
                GeodiscountError::database_config(format!("SQLite URL parse failed: {e}"))
            })?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(std::time::Duration::from_secs(5))
            .pragma("cache_size", "-64000")
            .pragma("temp_store", "memory")
            .pragma("mmap_size", "536870912")
            .pragma("wal_autocheckpoint", "1000");

        // 使用 sqlx 的连接池
        let pool = SqlitePool::connect_with(opt).await.map_err(|e| {
            GeodiscountError::database_connection(format!(
                "Failed to connect to SQLite database: {e}"
            ))
        })?;

        // 转换为 Sea-ORM 的 DatabaseConnection
        Ok(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool))
    }

    /// 连接池参数取自 database 配置段
    fn connect_options(config: &DatabaseConfig) -> ConnectOptions {
        let timeout = std::time::Duration::from_secs(config.timeout);

        let mut opt = ConnectOptions::new(config.database_url.to_owned());
        opt.max_connections(config.pool_size)
            .min_connections(config.pool_size.min(5))
            .connect_timeout(timeout)
            .acquire_timeout(timeout)
            .idle_timeout(timeout)
            .max_lifetime(timeout)
            .sqlx_logging(false);

        opt
    }

    /// 连接通用数据库（MySQL/PostgreSQL）
    async fn connect_generic(config: &DatabaseConfig) -> Result<DatabaseConnection> {
        Database::connect(Self::connect_options(config))
            .await
            .map_err(|e| {
                GeodiscountError::database_connection(format!(
                    "Failed to connect to {} database: {}",
                    config.backend.to_uppercase(),
                    e
                ))
            })
    }

    async fn run_migrations(&self) -> Result<()> {
        Migrator::up(&self.db, None)
            .await
            .map_err(|e| GeodiscountError::database_operation(format!("Migration failed: {e}")))?;

        info!("Database migrations completed");
        Ok(())
    }

    fn model_to_discount(model: discount::Model) -> Discount {
        Discount {
            id: model.id,
            retailer_id: model.retailer_id,
            description: model.description,
            discount_code: model.discount_code,
            discount_value: model.discount_value,
            is_active: model.is_active,
            expiration_date: model.expiration_date,
            coordinate: Coordinate::new(model.latitude, model.longitude),
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }

    fn model_to_retailer(model: retailer::Model) -> Retailer {
        Retailer {
            id: model.id,
            name: model.name,
            contact_info: model.contact_info,
            coordinate: Coordinate::new(model.latitude, model.longitude),
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[async_trait]
impl DiscountRepository for SeaOrmRepository {
    async fn get_discount(&self, id: i64) -> Option<Discount> {
        match discount::Entity::find_by_id(id).one(&self.db).await {
            Ok(Some(model)) => Some(Self::model_to_discount(model)),
            Ok(None) => None,
            Err(e) => {
                error!("Failed to query discount {}: {}", id, e);
                None
            }
        }
    }

    async fn load_discounts(&self) -> Vec<Discount> {
        match discount::Entity::find().all(&self.db).await {
            Ok(models) => models.into_iter().map(Self::model_to_discount).collect(),
            Err(e) => {
                error!("Failed to load discounts: {}", e);
                Vec::new()
            }
        }
    }

    async fn discounts_within(&self, center: &Coordinate, radius_km: f64) -> Result<Vec<Discount>> {
        let (min_lat, max_lat, min_lon, max_lon) = bounding_box(center, radius_km);

        let models = discount::Entity::find()
            .filter(discount::Column::Latitude.between(min_lat, max_lat))
            .filter(discount::Column::Longitude.between(min_lon, max_lon))
            .filter(discount::Column::IsActive.eq(true))
            .filter(discount::Column::ExpirationDate.gt(Utc::now()))
            .all(&self.db)
            .await
            .map_err(|e| {
                GeodiscountError::database_operation(format!("Spatial discount query failed: {e}"))
            })?;

        Ok(models.into_iter().map(Self::model_to_discount).collect())
    }

    async fn insert_discount(&self, new: NewDiscount) -> Result<Discount> {
        let now = Utc::now();

        let active_model = discount::ActiveModel {
            id: NotSet,
            retailer_id: Set(new.retailer_id),
            description: Set(new.description),
            discount_code: Set(new.discount_code),
            discount_value: Set(new.discount_value),
            is_active: Set(new.is_active),
            expiration_date: Set(new.expiration_date),
            latitude: Set(new.coordinate.latitude),
            longitude: Set(new.coordinate.longitude),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = active_model.insert(&self.db).await.map_err(|e| {
            GeodiscountError::database_operation(format!("Failed to insert discount: {e}"))
        })?;

        info!("Discount created: {}", model.discount_code);
        Ok(Self::model_to_discount(model))
    }

    async fn remove_discount(&self, id: i64) -> Result<()> {
        let result = discount::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(|e| {
                GeodiscountError::database_operation(format!("Failed to delete discount: {e}"))
            })?;

        if result.rows_affected == 0 {
            return Err(GeodiscountError::not_found(format!(
                "Discount not found: {id}"
            )));
        }

        info!("Discount deleted: {}", id);
        Ok(())
    }

    async fn count_discounts(&self) -> Result<u64> {
        discount::Entity::find()
            .count(&self.db)
            .await
            .map_err(|e| {
                GeodiscountError::database_operation(format!("Failed to count discounts: {e}"))
            })
    }

    async fn get_retailer(&self, id: i64) -> Option<Retailer> {
        match retailer::Entity::find_by_id(id).one(&self.db).await {
            Ok(Some(model)) => Some(Self::model_to_retailer(model)),
            Ok(None) => None,
            Err(e) => {
                error!("Failed to query retailer {}: {}", id, e);
                None
            }
        }
    }

    async fn load_retailers(&self) -> Vec<Retailer> {
        match retailer::Entity::find().all(&self.db).await {
            Ok(models) => models.into_iter().map(Self::model_to_retailer).collect(),
            Err(e) => {
                error!("Failed to load retailers: {}", e);
                Vec::new()
            }
        }
    }

    async fn retailers_within(&self, center: &Coordinate, radius_km: f64) -> Result<Vec<Retailer>> {
        let (min_lat, max_lat, min_lon, max_lon) = bounding_box(center, radius_km);

        let models = retailer::Entity::find()
            .filter(retailer::Column::Latitude.between(min_lat, max_lat))
            .filter(retailer::Column::Longitude.between(min_lon, max_lon))
            .all(&self.db)
            .await
            .map_err(|e| {
                GeodiscountError::database_operation(format!("Spatial retailer query failed: {e}"))
            })?;

        Ok(models.into_iter().map(Self::model_to_retailer).collect())
    }

    async fn insert_retailer(&self, new: NewRetailer) -> Result<Retailer> {
        let now = Utc::now();

        let active_model = retailer::ActiveModel {
            id: NotSet,
            name: Set(new.name),
            contact_info: Set(new.contact_info),
            latitude: Set(new.coordinate.latitude),
            longitude: Set(new.coordinate.longitude),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = active_model.insert(&self.db).await.map_err(|e| {
            GeodiscountError::database_operation(format!("Failed to insert retailer: {e}"))
        })?;

        info!("Retailer created: {}", model.name);
        Ok(Self::model_to_retailer(model))
    }

    async fn remove_retailer(&self, id: i64) -> Result<()> {
        let result = retailer::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(|e| {
                GeodiscountError::database_operation(format!("Failed to delete retailer: {e}"))
            })?;

        if result.rows_affected == 0 {
            return Err(GeodiscountError::not_found(format!(
                "Retailer not found: {id}"
            )));
        }

        info!("Retailer deleted: {}", id);
        Ok(())
    }

    async fn get_backend_config(&self) -> StorageConfig {
        StorageConfig {
            storage_type: self.backend_name.clone(),
            supports_spatial_query: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_options_follow_database_config() {
        let config = DatabaseConfig {
            backend: "postgres".to_string(),
            database_url: "postgres://localhost/geodiscounts".to_string(),
            pool_size: 25,
            timeout: 12,
        };

        let opt = SeaOrmRepository::connect_options(&config);
        let timeout = std::time::Duration::from_secs(12);

        assert_eq!(opt.get_max_connections(), Some(25));
        assert_eq!(opt.get_connect_timeout(), Some(timeout));
        assert_eq!(opt.get_acquire_timeout(), Some(timeout));
        assert_eq!(opt.get_idle_timeout(), Some(Some(timeout)));
    }
}
