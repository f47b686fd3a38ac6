//! The seams between the tracking session and the platform it runs on.
//! The browser frontend implements these on top of web APIs, the CLI with files and scripted data.

use crate::{
    error::{KeepAwakeError, LocationError, StoreError},
    geo_point::Sample,
    status::StatusMessage,
    tracking_session::SessionSnapshot,
};

/// Identifies one location subscription. Events are tagged with the handle
/// of the subscription that produced them, so late events from a closed
/// subscription can be recognised and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeepAwakeHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchOptions {
    pub high_accuracy: bool,
    pub timeout_ms: u32,
    /// 0 means a cached fix is never accepted.
    pub max_cache_age_ms: u32,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout_ms: 10_000,
            max_cache_age_ms: 0,
        }
    }
}

/// What a location subscription delivers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LocationEvent {
    Sample(Sample),
    Error(LocationError),
}

pub trait LocationProvider {
    /// Starts watching. Events for this subscription must be delivered to the
    /// session together with the returned handle.
    fn subscribe(&mut self, options: &WatchOptions) -> Result<SubscriptionHandle, LocationError>;

    /// Stops watching. Must tolerate unknown or already closed handles.
    fn unsubscribe(&mut self, handle: SubscriptionHandle);
}

/// Durable home of the running total.
pub trait DistanceStore {
    /// `Ok(None)` if nothing was ever saved.
    fn load_total_distance_km(&self) -> Result<Option<f64>, StoreError>;

    fn save_total_distance_km(&mut self, total_km: f64) -> Result<(), StoreError>;
}

pub trait KeepAwake {
    fn acquire(&mut self) -> Result<KeepAwakeHandle, KeepAwakeError>;

    fn release(&mut self, handle: KeepAwakeHandle);
}

pub trait Haptics {
    /// No-op where the device can't vibrate.
    fn pulse(&mut self, duration_ms: u32);
}

pub trait Renderer {
    fn render_state(&mut self, snapshot: SessionSnapshot);

    fn render_status_message(&mut self, message: StatusMessage);
}

/// For hosts without a screen to keep on.
#[derive(Debug, Default)]
pub struct NoKeepAwake;

impl KeepAwake for NoKeepAwake {
    fn acquire(&mut self) -> Result<KeepAwakeHandle, KeepAwakeError> {
        Err(KeepAwakeError::Unsupported)
    }

    fn release(&mut self, _handle: KeepAwakeHandle) {}
}
