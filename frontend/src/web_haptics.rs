use distance_tracker_lib::providers::Haptics;
use gloo_console::info;
use gloo_utils::window;

use crate::web_location::js_has;

pub struct WebVibration;

impl Haptics for WebVibration {
    fn pulse(&mut self, duration_ms: u32) {
        let navigator = window().navigator();
        if !js_has(&navigator, "vibrate") {
            return;
        }

        if navigator.vibrate_with_duration(duration_ms) {
            info!(format!("Vibrating for {} ms", duration_ms));
        }
    }
}
