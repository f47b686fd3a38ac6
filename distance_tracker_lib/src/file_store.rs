use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{error::StoreError, providers::DistanceStore};

#[derive(Serialize, Deserialize)]
struct SavedTotal {
    total_distance_km: f64,
}

/// Keeps the running total in a small JSON file, for hosts without browser storage.
#[derive(Debug, Clone)]
pub struct FileDistanceStore {
    path: PathBuf,
}

impl FileDistanceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DistanceStore for FileDistanceStore {
    fn load_total_distance_km(&self) -> Result<Option<f64>, StoreError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(StoreError::Io(format!("Failed to read {:?}: {err}", self.path))),
        };

        serde_json::from_slice::<SavedTotal>(&bytes)
            .map(|saved| Some(saved.total_distance_km))
            .map_err(|err| StoreError::Corrupt(format!("{:?}: {err}", self.path)))
    }

    fn save_total_distance_km(&mut self, total_km: f64) -> Result<(), StoreError> {
        let json = serde_json::to_vec(&SavedTotal { total_distance_km: total_km })
            .map_err(|err| StoreError::Corrupt(err.to_string()))?;

        if let Some(dir) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|err| StoreError::Io(format!("Failed to create {:?}: {err}", dir)))?;
        }

        // Write next to the target and rename, so a crash never leaves half a file
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json).map_err(|err| StoreError::Io(format!("Failed to write {:?}: {err}", tmp)))?;
        fs::rename(&tmp, &self.path).map_err(|err| StoreError::Io(format!("Failed to replace {:?}: {err}", self.path)))
    }
}
