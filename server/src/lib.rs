pub mod asset_cache;
pub mod asset_endpoint;
pub mod configuration;
pub mod server_state;
pub mod upstream;
