use distance_tracker_lib::{
    config::TrackerConfig,
    error::LocationError,
    file_store::FileDistanceStore,
    geo_point::Sample,
    providers::{
        Haptics, LocationEvent, LocationProvider, NoKeepAwake, Renderer, SubscriptionHandle, WatchOptions,
    },
    status::{Locale, StatusMessage},
    tracking_session::{Collaborators, SessionSnapshot, TrackingSession},
};

/// Hands out handles; the samples themselves are pushed by [`replay`].
#[derive(Default)]
pub struct ScriptedProvider {
    next_handle: u64,
}

impl LocationProvider for ScriptedProvider {
    fn subscribe(&mut self, _options: &WatchOptions) -> Result<SubscriptionHandle, LocationError> {
        self.next_handle += 1;
        Ok(SubscriptionHandle(self.next_handle))
    }

    fn unsubscribe(&mut self, _handle: SubscriptionHandle) {}
}

/// Prints status lines, skipping repeats of the previous one.
pub struct ConsoleRenderer {
    pub locale: Locale,
    last: Option<StatusMessage>,
}

impl ConsoleRenderer {
    pub fn new(locale: Locale) -> Self {
        Self { locale, last: None }
    }
}

impl Renderer for ConsoleRenderer {
    fn render_state(&mut self, snapshot: SessionSnapshot) {
        tracing::trace!("{} km, {} km/h, {:?}", snapshot.distance_label(), snapshot.speed_kmh, snapshot.status);
    }

    fn render_status_message(&mut self, message: StatusMessage) {
        if self.last.replace(message) != Some(message) {
            println!("{}", message.text(self.locale));
        }
    }
}

/// Terminal bell in place of a vibration.
pub struct Bell;

impl Haptics for Bell {
    fn pulse(&mut self, _duration_ms: u32) {
        print!("\x07");
    }
}

pub fn open_session(store: FileDistanceStore, locale: Locale) -> TrackingSession {
    TrackingSession::new(
        TrackerConfig::default().with_locale(locale),
        Collaborators {
            location: Box::new(ScriptedProvider::default()),
            store: Box::new(store),
            keep_awake: Box::new(NoKeepAwake),
            haptics: Box::new(Bell),
            renderer: Box::new(ConsoleRenderer::new(locale)),
        },
    )
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReplaySummary {
    pub milestones: Vec<u32>,
    pub added_km: f64,
    pub total_km: f64,
}

/// Runs each segment as its own start/stop, adding to whatever total the
/// session already holds. The gap between two segments is never counted.
pub fn replay(session: &mut TrackingSession, segments: &[Vec<Sample>]) -> anyhow::Result<ReplaySummary> {
    let before = session.state().total_distance_km;
    let mut milestones = Vec::new();

    for samples in segments {
        session.start();
        let Some(handle) = session.subscription() else {
            anyhow::bail!("Tracking session did not start");
        };

        for sample in samples {
            if let Some(km) = session.handle_event(handle, LocationEvent::Sample(*sample)) {
                println!("Milestone: {km} km");
                milestones.push(km);
            }
        }

        session.stop();
    }

    let total_km = session.state().total_distance_km;
    Ok(ReplaySummary {
        milestones,
        added_km: total_km - before,
        total_km,
    })
}
