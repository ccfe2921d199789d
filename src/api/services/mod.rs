pub mod discounts;
pub mod health;
pub mod retailers;

/// max_distance 缺省时的全量搜索半径（半个地球周长，km）
pub const MAX_SEARCH_RADIUS_KM: f64 = 20_037.5;

pub use discounts::{DiscountService, discount_routes};
pub use health::{AppStartTime, HealthService, health_routes};
pub use retailers::{RetailerService, retailer_routes};
