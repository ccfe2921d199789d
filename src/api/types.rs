//! API 类型定义与响应帮助函数

use actix_web::HttpResponse;
use actix_web::http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::repository::{Discount, Retailer};
use crate::services::Ranked;

/// API 错误码枚举
///
/// 使用 serde_repr 序列化为数字。按千位分域：
/// - 0: 成功
/// - 1000-1099: 通用错误
/// - 3000-3099: 折扣/位置错误
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize_repr, Deserialize_repr)]
#[repr(i32)]
pub enum ErrorCode {
    // 成功
    Success = 0,

    // 通用错误 1000-1099
    BadRequest = 1000,
    InternalServerError = 1005,

    // 折扣/位置错误 3000-3099
    LocationUnavailable = 3000,
    InvalidMaxDistance = 3001,
    DiscountNotFound = 3002,
    RetailerNotFound = 3003,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub message: String,
    pub data: Option<T>,
}

/// 构建 JSON 响应
pub fn json_response<T: Serialize>(
    status: StatusCode,
    code: ErrorCode,
    message: impl Into<String>,
    data: Option<T>,
) -> HttpResponse {
    HttpResponse::build(status)
        .append_header(("Content-Type", "application/json; charset=utf-8"))
        .json(ApiResponse {
            code: code as i32,
            message: message.into(),
            data,
        })
}

/// 构建成功响应
pub fn success_response<T: Serialize>(data: T) -> HttpResponse {
    json_response(StatusCode::OK, ErrorCode::Success, "OK", Some(data))
}

/// 构建错误响应
pub fn error_response(status: StatusCode, error_code: ErrorCode, message: &str) -> HttpResponse {
    json_response::<()>(status, error_code, message, None)
}

/// nearby 查询参数
#[derive(Debug, Deserialize)]
pub struct NearbyQuery {
    /// 最大距离，单位 km，正浮点数字符串
    pub max_distance: Option<String>,
}

/// 折扣响应中内嵌的商家摘要
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct RetailerRef {
    pub id: i64,
    pub name: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct DiscountResponse {
    pub id: i64,
    pub retailer: RetailerRef,
    pub description: String,
    pub discount_code: String,
    pub discount_value: f64,
    pub is_active: bool,
    pub expiration_date: String,
    pub latitude: f64,
    pub longitude: f64,
    pub created_at: String,
}

impl DiscountResponse {
    pub fn from_discount(discount: Discount, retailer_name: Option<String>) -> Self {
        Self {
            id: discount.id,
            retailer: RetailerRef {
                id: discount.retailer_id,
                name: retailer_name,
            },
            description: discount.description,
            discount_code: discount.discount_code,
            discount_value: discount.discount_value,
            is_active: discount.is_active,
            expiration_date: discount.expiration_date.to_rfc3339(),
            latitude: discount.coordinate.latitude,
            longitude: discount.coordinate.longitude,
            created_at: discount.created_at.to_rfc3339(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct NearbyDiscountResponse {
    #[serde(flatten)]
    pub discount: DiscountResponse,
    /// 距客户端位置的测地距离，保留 3 位小数
    pub distance_km: f64,
}

impl NearbyDiscountResponse {
    pub fn from_ranked(ranked: Ranked<Discount>, retailer_name: Option<String>) -> Self {
        Self {
            discount: DiscountResponse::from_discount(ranked.record, retailer_name),
            distance_km: round_km(ranked.distance_km),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct RetailerResponse {
    pub id: i64,
    pub name: String,
    pub contact_info: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub created_at: String,
}

impl From<Retailer> for RetailerResponse {
    fn from(retailer: Retailer) -> Self {
        Self {
            id: retailer.id,
            name: retailer.name,
            contact_info: retailer.contact_info,
            latitude: retailer.coordinate.latitude,
            longitude: retailer.coordinate.longitude,
            created_at: retailer.created_at.to_rfc3339(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct NearbyRetailerResponse {
    #[serde(flatten)]
    pub retailer: RetailerResponse,
    pub distance_km: f64,
}

impl From<Ranked<Retailer>> for NearbyRetailerResponse {
    fn from(ranked: Ranked<Retailer>) -> Self {
        Self {
            distance_km: round_km(ranked.distance_km),
            retailer: RetailerResponse::from(ranked.record),
        }
    }
}

fn round_km(km: f64) -> f64 {
    (km * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_serializes_as_number() {
        let json = serde_json::to_string(&ErrorCode::InvalidMaxDistance).unwrap();
        assert_eq!(json, "3001");
    }

    #[test]
    fn test_round_km() {
        assert_eq!(round_km(1.23456), 1.235);
        assert_eq!(round_km(0.0004), 0.0);
    }
}
