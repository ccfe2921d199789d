//! HTTP API 模块
//!
//! `/api/v1` 下的折扣与商家路由，顶层的 `/health` 探针。
//! 统一的 `ApiResponse { code, message, data }` 信封。

pub mod services;
pub mod types;

pub use services::{
    AppStartTime, DiscountService, HealthService, RetailerService, discount_routes,
    health_routes, retailer_routes,
};
pub use types::{ApiResponse, ErrorCode};
