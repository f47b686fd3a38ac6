use std::net::IpAddr;

use crate::asset_cache::AssetCache;

pub struct ServerState {
    pub cache: AssetCache,
    pub ip_address: Option<IpAddr>,
}
