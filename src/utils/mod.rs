pub mod geo;
pub mod ip;

pub use geo::{Coordinate, bounding_box, calculate_distance, validate_coordinate, validate_max_distance};
pub use ip::extract_client_ip;
