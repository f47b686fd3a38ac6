use distance_tracker_lib::{error::StoreError, providers::DistanceStore};
use gloo_utils::window;
use web_sys::Storage;

/// Same key the page has always used, so totals from older versions load.
pub const TOTAL_DISTANCE_KEY: &str = "totalDistance";

pub struct LocalDistanceStore {
    storage: Option<Storage>,
}

impl LocalDistanceStore {
    pub fn new() -> Self {
        // localStorage can be missing or blocked, e.g. in some private modes
        let storage = window().local_storage().ok().flatten();
        Self { storage }
    }
}

impl DistanceStore for LocalDistanceStore {
    fn load_total_distance_km(&self) -> Result<Option<f64>, StoreError> {
        let storage = self.storage.as_ref().ok_or(StoreError::Unavailable)?;

        let value = storage
            .get_item(TOTAL_DISTANCE_KEY)
            .map_err(|_| StoreError::Io(format!("Failed to read {TOTAL_DISTANCE_KEY}")))?;

        match value {
            None => Ok(None),
            Some(text) => text
                .trim()
                .parse::<f64>()
                .map(Some)
                .map_err(|_| StoreError::Corrupt(format!("{TOTAL_DISTANCE_KEY} = {text:?}"))),
        }
    }

    fn save_total_distance_km(&mut self, total_km: f64) -> Result<(), StoreError> {
        let storage = self.storage.as_ref().ok_or(StoreError::Unavailable)?;

        storage
            .set_item(TOTAL_DISTANCE_KEY, &total_km.to_string())
            .map_err(|_| StoreError::Io(format!("Failed to write {TOTAL_DISTANCE_KEY}")))
    }
}
