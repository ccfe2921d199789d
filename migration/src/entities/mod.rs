pub mod discount;
pub mod retailer;
