use std::collections::HashMap;

use distance_tracker_lib::{
    error::LocationError,
    geo_point::{GeoPoint, Sample},
    providers::{LocationEvent, LocationProvider, SubscriptionHandle, WatchOptions},
};
use gloo_console::{debug, error};
use gloo_utils::window;
use wasm_bindgen::{closure::Closure, JsCast};
// Stable bindings; the Geolocation* names are gated behind web_sys_unstable_apis
use web_sys::{Geolocation, Position as GeolocationPosition, PositionError as GeolocationPositionError, PositionOptions};
use yew::Callback;

struct Watch {
    watch_id: i32,
    // Kept alive for as long as the browser may call them
    _on_position: Closure<dyn FnMut(GeolocationPosition)>,
    _on_error: Closure<dyn FnMut(GeolocationPositionError)>,
}

/// `navigator.geolocation.watchPosition` behind the `LocationProvider` trait.
/// Every event is forwarded together with the handle of the watch that produced it.
pub struct WebLocationProvider {
    geolocation: Geolocation,
    on_event: Callback<(SubscriptionHandle, LocationEvent)>,
    next_handle: u64,
    watches: HashMap<SubscriptionHandle, Watch>,
}

impl WebLocationProvider {
    /// None if the browser has no Geolocation API.
    pub fn new(on_event: Callback<(SubscriptionHandle, LocationEvent)>) -> Option<Self> {
        let navigator = window().navigator();
        if !js_has(&navigator, "geolocation") {
            return None;
        }

        let geolocation = navigator.geolocation().ok()?;

        Some(Self {
            geolocation,
            on_event,
            next_handle: 0,
            watches: HashMap::new(),
        })
    }
}

impl LocationProvider for WebLocationProvider {
    fn subscribe(&mut self, options: &WatchOptions) -> Result<SubscriptionHandle, LocationError> {
        self.next_handle += 1;
        let handle = SubscriptionHandle(self.next_handle);

        let on_event = self.on_event.clone();
        let on_position = Closure::<dyn FnMut(GeolocationPosition)>::new(move |position: GeolocationPosition| {
            let coords = position.coords();
            let sample = Sample::new(GeoPoint::new(coords.latitude(), coords.longitude()), coords.speed());
            on_event.emit((handle, LocationEvent::Sample(sample)));
        });

        let on_event = self.on_event.clone();
        let on_error = Closure::<dyn FnMut(GeolocationPositionError)>::new(move |err: GeolocationPositionError| {
            error!(format!("Geolocation error {}: {}", err.code(), err.message()));
            on_event.emit((handle, LocationEvent::Error(LocationError::from_code(err.code()))));
        });

        let position_options = PositionOptions::new();
        position_options.set_enable_high_accuracy(options.high_accuracy);
        position_options.set_timeout(options.timeout_ms);
        position_options.set_maximum_age(options.max_cache_age_ms);

        let watch_id = self
            .geolocation
            .watch_position_with_error_callback_and_options(
                on_position.as_ref().unchecked_ref(),
                Some(on_error.as_ref().unchecked_ref()),
                &position_options,
            )
            .map_err(|err| {
                error!("watchPosition failed", err);
                LocationError::Unknown
            })?;

        debug!(format!("Watching position, id {} as {:?}", watch_id, handle));

        self.watches.insert(handle, Watch {
            watch_id,
            _on_position: on_position,
            _on_error: on_error,
        });

        Ok(handle)
    }

    fn unsubscribe(&mut self, handle: SubscriptionHandle) {
        if let Some(watch) = self.watches.remove(&handle) {
            self.geolocation.clear_watch(watch.watch_id);
        }
    }
}

impl Drop for WebLocationProvider {
    fn drop(&mut self) {
        for (_, watch) in self.watches.drain() {
            self.geolocation.clear_watch(watch.watch_id);
        }
    }
}

/// `name in object`, for feature detection.
pub fn js_has(object: &wasm_bindgen::JsValue, name: &str) -> bool {
    web_sys::js_sys::Reflect::has(object, &name.into()).unwrap_or(false)
}
