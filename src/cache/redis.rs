use std::sync::Arc;

use async_trait::async_trait;
use redis::{AsyncCommands, aio::MultiplexedConnection};
use tokio::sync::RwLock;
use tracing::{debug, error, trace, warn};

use crate::cache::{CacheResult, LocationCache};
use crate::config::CacheConfig;
use crate::errors::{GeodiscountError, Result};
use crate::geoip::ResolvedLocation;

/// Redis 位置缓存
///
/// 多实例部署时共享解析结果。值以 JSON 存储，带 TTL。
pub struct RedisLocationCache {
    client: redis::Client,
    /// 持久化连接，使用 RwLock 保护
    connection: Arc<RwLock<Option<MultiplexedConnection>>>,
    key_prefix: String,
    ttl: u64,
}

impl RedisLocationCache {
    pub fn new(config: &CacheConfig) -> Result<Self> {
        let redis_config = &config.redis;

        debug!(
            "RedisLocationCache created with prefix: '{}', TTL: {}s",
            redis_config.key_prefix, config.default_ttl
        );

        let client = redis::Client::open(redis_config.url.clone()).map_err(|e| {
            GeodiscountError::cache_connection(format!("Invalid Redis URL: {e}"))
        })?;

        // 启动时同步 PING 一次，尽早暴露配置错误
        match client.get_connection() {
            Ok(mut conn) => match redis::cmd("PING").query::<String>(&mut conn) {
                Ok(response) => {
                    debug!("Redis connection test successful: {}", response);
                }
                Err(e) => {
                    error!(
                        "Failed to ping Redis server: {}. Check Redis server status and URL: {}",
                        e, redis_config.url
                    );
                    return Err(GeodiscountError::cache_connection(format!(
                        "Redis ping failed: {e}"
                    )));
                }
            },
            Err(e) => {
                error!(
                    "Failed to connect to Redis server: {}. Check Redis server status and URL: {}",
                    e, redis_config.url
                );
                return Err(GeodiscountError::cache_connection(format!(
                    "Redis connection failed: {e}"
                )));
            }
        }

        Ok(Self {
            client,
            connection: Arc::new(RwLock::new(None)),
            key_prefix: redis_config.key_prefix.clone(),
            ttl: config.default_ttl,
        })
    }

    /// 获取或建立持久连接
    async fn get_connection(&self) -> std::result::Result<MultiplexedConnection, redis::RedisError> {
        // 首先尝试读取现有连接
        {
            let conn_guard = self.connection.read().await;
            if let Some(ref conn) = *conn_guard {
                return Ok(conn.clone());
            }
        }

        // 需要建立新连接
        let mut conn_guard = self.connection.write().await;

        // 双重检查，避免竞态条件
        if let Some(ref conn) = *conn_guard {
            return Ok(conn.clone());
        }

        let new_conn = self.client.get_multiplexed_async_connection().await?;
        *conn_guard = Some(new_conn.clone());
        debug!("Redis connection established and cached");

        Ok(new_conn)
    }

    /// 重置连接（在连接错误时调用）
    async fn reset_connection(&self) {
        let mut conn_guard = self.connection.write().await;
        *conn_guard = None;
        debug!("Redis connection reset due to error");
    }

    fn make_key(&self, ip: &str) -> String {
        format!("{}{}", self.key_prefix, ip)
    }
}

#[async_trait]
impl LocationCache for RedisLocationCache {
    async fn get(&self, ip: &str) -> CacheResult {
        let redis_key = self.make_key(ip);

        let mut conn = match self.get_connection().await {
            Ok(c) => c,
            Err(e) => {
                error!("Failed to get Redis connection: {}", e);
                self.reset_connection().await;
                return CacheResult::Unavailable;
            }
        };

        let result: redis::RedisResult<Option<String>> = conn.get(&redis_key).await;

        match result {
            Ok(Some(data)) => match serde_json::from_str::<ResolvedLocation>(&data) {
                Ok(location) => {
                    trace!("Successfully retrieved cached location for: {}", ip);
                    CacheResult::Found(location)
                }
                Err(e) => {
                    error!("Failed to deserialize cached location for '{}': {}", ip, e);
                    CacheResult::Unavailable
                }
            },
            Ok(None) => {
                trace!("Location not found in cache: {}", ip);
                CacheResult::NotFound
            }
            Err(e) => {
                error!("Failed to get key '{}': {}", redis_key, e);
                // 连接可能已断开，重置连接
                self.reset_connection().await;
                CacheResult::Unavailable
            }
        }
    }

    async fn insert(&self, ip: &str, location: ResolvedLocation) {
        let redis_key = self.make_key(ip);

        let mut conn = match self.get_connection().await {
            Ok(c) => c,
            Err(e) => {
                error!("Failed to get Redis connection: {}", e);
                self.reset_connection().await;
                return;
            }
        };

        match serde_json::to_string(&location) {
            Ok(serialized) => {
                match conn
                    .set_ex::<String, String, ()>(redis_key, serialized, self.ttl)
                    .await
                {
                    Ok(_) => {
                        trace!("Successfully cached location for: {}", ip);
                    }
                    Err(e) => {
                        error!("Failed to cache location for '{}': {}", ip, e);
                        self.reset_connection().await;
                    }
                }
            }
            Err(e) => {
                error!("Failed to serialize location for '{}': {}", ip, e);
            }
        }
    }

    async fn remove(&self, ip: &str) {
        let redis_key = self.make_key(ip);

        let mut conn = match self.get_connection().await {
            Ok(c) => c,
            Err(e) => {
                error!("Failed to get Redis connection: {}", e);
                self.reset_connection().await;
                return;
            }
        };

        match conn.del::<String, i32>(redis_key).await {
            Ok(deleted_count) => {
                if deleted_count > 0 {
                    trace!("Successfully removed cached location for: {}", ip);
                } else {
                    trace!("No cached location to remove for: {}", ip);
                }
            }
            Err(e) => {
                error!("Failed to remove key for '{}': {}", ip, e);
                self.reset_connection().await;
            }
        }
    }

    async fn invalidate_all(&self) {
        warn!("RedisLocationCache does not implement invalidate_all");
    }
}
