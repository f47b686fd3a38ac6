use crate::{providers::WatchOptions, status::Locale};

/// Vibration length when a kilometer mark is passed.
pub const MILESTONE_PULSE_MS: u32 = 500;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackerConfig {
    pub watch: WatchOptions,
    pub milestone_pulse_ms: u32,
    pub locale: Locale,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            watch: WatchOptions::default(),
            milestone_pulse_ms: MILESTONE_PULSE_MS,
            locale: Locale::default(),
        }
    }
}

impl TrackerConfig {
    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }
}
