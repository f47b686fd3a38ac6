pub mod config;
pub mod distance;
pub mod error;
pub mod geo_point;
pub mod milestone;
pub mod providers;
pub mod status;
pub mod tracking_session;

#[cfg(feature = "file-store")]
pub mod file_store;
