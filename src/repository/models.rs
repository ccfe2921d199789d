use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::geo::Coordinate;

/// 商家记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Retailer {
    pub id: i64,
    pub name: String,
    pub contact_info: Option<String>,
    pub coordinate: Coordinate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 折扣记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discount {
    pub id: i64,
    pub retailer_id: i64,
    pub description: String,
    /// 全局唯一的折扣码
    pub discount_code: String,
    pub discount_value: f64,
    pub is_active: bool,
    pub expiration_date: DateTime<Utc>,
    pub coordinate: Coordinate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 新建商家（id 和时间戳由后端生成）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRetailer {
    pub name: String,
    pub contact_info: Option<String>,
    pub coordinate: Coordinate,
}

/// 新建折扣（id 和时间戳由后端生成）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDiscount {
    pub retailer_id: i64,
    pub description: String,
    pub discount_code: String,
    pub discount_value: f64,
    #[serde(default = "default_is_active")]
    pub is_active: bool,
    pub expiration_date: DateTime<Utc>,
    pub coordinate: Coordinate,
}

fn default_is_active() -> bool {
    true
}

/// 后端能力描述
#[derive(Debug, Clone, Serialize)]
pub struct StorageConfig {
    pub storage_type: String,
    /// 是否支持 SQL 层的包围盒预过滤
    pub supports_spatial_query: bool,
}
