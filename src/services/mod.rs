//! 业务服务层

pub mod proximity;

pub use proximity::{DEFAULT_RESULT_LIMIT, GeoRecord, ProximityEngine, Ranked};
