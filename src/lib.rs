//! Geodiscounts - a geo-proximity discount discovery service
//!
//! This library provides the core functionality for the Geodiscounts service:
//! resolving a client's approximate location from their IP address (with a
//! cache-aside layer over an external geolocation API), and ranking geo-tagged
//! discount records by geodesic distance.
//!
//! # Architecture
//! - `geoip`: IP-to-location resolution (cache-aside, MaxMind / external API)
//! - `cache`: location cache backends (memory, redis, none)
//! - `services`: proximity query engine (geodesic ranking and radius filter)
//! - `repository`: geo-tagged record store (sea-orm, in-memory)
//! - `api`: HTTP services and response types
//! - `config`: configuration management
//! - `system`: logging and platform utilities
//! - `utils`: coordinate math and client IP extraction

pub mod api;
pub mod cache;
pub mod config;
pub mod errors;
pub mod geoip;
pub mod repository;
pub mod services;
pub mod system;
pub mod utils;
