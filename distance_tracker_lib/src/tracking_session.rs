use serde::{Deserialize, Serialize};

use crate::{
    config::TrackerConfig,
    distance::distance_km,
    error::{KeepAwakeError, LocationError},
    geo_point::{GeoPoint, Sample},
    milestone::check_milestone,
    providers::{
        DistanceStore, Haptics, KeepAwake, KeepAwakeHandle, LocationEvent, LocationProvider, Renderer,
        SubscriptionHandle,
    },
    status::StatusMessage,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    #[default]
    Idle,
    Active,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub status: SessionStatus,
    /// Last accepted fix of the running session. Always `None` while idle.
    pub last_point: Option<GeoPoint>,
    pub total_distance_km: f64,
    /// Highest whole kilometer already signalled. Never above `floor(total_distance_km)`.
    pub last_milestone_km: u32,
}

impl SessionState {
    /// The state right after loading a saved total. The milestone mark is
    /// derived from the total so a reload never fires an old milestone again.
    pub fn hydrated(total_distance_km: f64) -> Self {
        Self {
            status: SessionStatus::Idle,
            last_point: None,
            total_distance_km,
            last_milestone_km: total_distance_km.floor() as u32,
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::hydrated(0.)
    }
}

/// What the renderer gets to see of the session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub distance_km: f64,
    pub speed_kmh: u32,
    pub status: SessionStatus,
}

impl SessionSnapshot {
    /// Distance as shown on screen, in km with meter precision.
    pub fn distance_label(&self) -> String {
        format!("{:.3}", self.distance_km)
    }

    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }
}

/// The platform services a session talks to.
pub struct Collaborators {
    pub location: Box<dyn LocationProvider>,
    pub store: Box<dyn DistanceStore>,
    pub keep_awake: Box<dyn KeepAwake>,
    pub haptics: Box<dyn Haptics>,
    pub renderer: Box<dyn Renderer>,
}

/// Owns the session state and is the only thing that mutates it.
///
/// All methods run to completion and never fail: collaborator errors end up
/// as a state transition, a status message or a log line.
pub struct TrackingSession {
    state: SessionState,
    config: TrackerConfig,
    subscription: Option<SubscriptionHandle>,
    keep_awake: Option<KeepAwakeHandle>,
    speed_kmh: u32,
    collaborators: Collaborators,
}

impl TrackingSession {
    /// Loads the saved total and renders the initial idle state.
    pub fn new(config: TrackerConfig, collaborators: Collaborators) -> Self {
        let total = match collaborators.store.load_total_distance_km() {
            Ok(Some(total)) if total.is_finite() && total >= 0. => total,
            Ok(Some(total)) => {
                tracing::warn!("Ignoring invalid saved distance {}", total);
                0.
            }
            Ok(None) => 0.,
            Err(err) => {
                tracing::warn!("Failed to load saved distance: {err}");
                0.
            }
        };

        let state = SessionState::hydrated(total);
        tracing::info!("Loaded total distance {:.3} km, last milestone {} km", state.total_distance_km, state.last_milestone_km);

        let mut session = Self {
            state,
            config,
            subscription: None,
            keep_awake: None,
            speed_kmh: 0,
            collaborators,
        };
        session.render_state();
        session
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn is_active(&self) -> bool {
        self.state.status == SessionStatus::Active
    }

    pub fn subscription(&self) -> Option<SubscriptionHandle> {
        self.subscription
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            distance_km: self.state.total_distance_km,
            speed_kmh: if self.is_active() { self.speed_kmh } else { 0 },
            status: self.state.status,
        }
    }

    /// Idle -> Active. Does nothing if a session is already running.
    pub fn start(&mut self) {
        if self.is_active() {
            tracing::debug!("Start requested while already active");
            return;
        }

        match self.collaborators.keep_awake.acquire() {
            Ok(handle) => {
                self.keep_awake = Some(handle);
                self.show(StatusMessage::KeepAwakeEnabled);
            }
            Err(KeepAwakeError::Unsupported) => {
                tracing::debug!("Screen wake lock unsupported, tracking without it");
            }
            Err(err) => {
                tracing::warn!("{err}");
                self.show(StatusMessage::KeepAwakeUnavailable);
            }
        }

        self.show(StatusMessage::AcquiringSignal);
        self.state.last_point = None;
        self.speed_kmh = 0;

        match self.collaborators.location.subscribe(&self.config.watch) {
            Ok(handle) => {
                tracing::info!("Tracking started with subscription {:?}", handle);
                self.subscription = Some(handle);
                self.state.status = SessionStatus::Active;
            }
            Err(err) => {
                tracing::error!("Location provider refused to start: {err}");
                self.release_resources();
                self.show(StatusMessage::Location(err));
            }
        }

        self.render_state();
    }

    /// Active -> Idle. Calling it while idle changes nothing.
    pub fn stop(&mut self) {
        if !self.is_active() {
            return;
        }

        self.release_resources();
        tracing::info!("Tracking stopped at {:.3} km", self.state.total_distance_km);
        self.show(StatusMessage::Stopped);
        self.render_state();
    }

    pub fn toggle(&mut self) {
        if self.is_active() {
            self.stop();
        } else {
            self.start();
        }
    }

    /// Zeroes the total and the milestone mark, stopping first if needed.
    /// Asking the user for confirmation is up to the caller.
    pub fn reset(&mut self) {
        self.stop();

        self.state.total_distance_km = 0.;
        self.state.last_milestone_km = 0;
        self.persist();

        tracing::info!("Distance reset");
        self.show(StatusMessage::Reset);
        self.render_state();
    }

    pub fn handle_event(&mut self, handle: SubscriptionHandle, event: LocationEvent) -> Option<u32> {
        match event {
            LocationEvent::Sample(sample) => self.on_sample(handle, sample),
            LocationEvent::Error(error) => {
                self.on_provider_error(handle, error);
                None
            }
        }
    }

    /// Folds one fix into the total. Returns the kilometer mark if this
    /// sample passed a new one.
    ///
    /// Samples are taken in delivery order. A stale fix delivered after a
    /// newer one is not detected and counts towards the total.
    pub fn on_sample(&mut self, handle: SubscriptionHandle, sample: Sample) -> Option<u32> {
        if !self.accepts(handle) {
            return None;
        }

        self.show(StatusMessage::Recording);
        self.speed_kmh = sample.display_speed_kmh();

        // The first fix after start only seeds the last point
        if let Some(last_point) = self.state.last_point {
            self.state.total_distance_km += distance_km(last_point, sample.point);
        }
        self.state.last_point = Some(sample.point);

        let milestone = check_milestone(self.state.total_distance_km, self.state.last_milestone_km);
        if let Some(mark) = milestone {
            self.state.last_milestone_km = mark;
            tracing::info!("Reached {} km", mark);
            self.collaborators.haptics.pulse(self.config.milestone_pulse_ms);
        }

        tracing::debug!("Sample {:?}, total {:.3} km", sample.point, self.state.total_distance_km);

        self.persist();
        self.render_state();

        milestone
    }

    /// Any provider error ends the session. There is no retry, the user has to start again.
    pub fn on_provider_error(&mut self, handle: SubscriptionHandle, error: LocationError) {
        if !self.accepts(handle) {
            return;
        }

        tracing::warn!("Location provider failed: {error}");
        self.release_resources();
        self.show(StatusMessage::Location(error));
        self.render_state();
    }

    fn accepts(&self, handle: SubscriptionHandle) -> bool {
        let accepted = self.is_active() && self.subscription == Some(handle);
        if !accepted {
            tracing::debug!("Discarding event from inactive subscription {:?}", handle);
        }
        accepted
    }

    fn release_resources(&mut self) {
        if let Some(handle) = self.subscription.take() {
            self.collaborators.location.unsubscribe(handle);
        }
        if let Some(handle) = self.keep_awake.take() {
            self.collaborators.keep_awake.release(handle);
        }

        self.state.status = SessionStatus::Idle;
        self.state.last_point = None;
        self.speed_kmh = 0;
    }

    fn persist(&mut self) {
        if let Err(err) = self.collaborators.store.save_total_distance_km(self.state.total_distance_km) {
            tracing::warn!("Failed to save total distance: {err}");
        }
    }

    fn show(&mut self, message: StatusMessage) {
        self.collaborators.renderer.render_status_message(message);
    }

    fn render_state(&mut self) {
        let snapshot = self.snapshot();
        self.collaborators.renderer.render_state(snapshot);
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::{distance::EARTH_RADIUS_KM, error::StoreError, providers::WatchOptions};

    #[derive(Default)]
    struct World {
        next_handle: u64,
        subscribed: Vec<(SubscriptionHandle, WatchOptions)>,
        unsubscribed: Vec<SubscriptionHandle>,
        refuse_subscribe: Option<LocationError>,

        stored: Option<f64>,
        load_error: bool,
        fail_saves: bool,
        saves: Vec<f64>,

        keep_awake: Option<KeepAwakeError>,
        acquired: Vec<KeepAwakeHandle>,
        released: Vec<KeepAwakeHandle>,

        pulses: Vec<u32>,
        snapshots: Vec<SessionSnapshot>,
        messages: Vec<StatusMessage>,
    }

    type Shared = Rc<RefCell<World>>;

    struct FakeLocation(Shared);
    struct FakeStore(Shared);
    struct FakeKeepAwake(Shared);
    struct FakeHaptics(Shared);
    struct FakeRenderer(Shared);

    impl LocationProvider for FakeLocation {
        fn subscribe(&mut self, options: &WatchOptions) -> Result<SubscriptionHandle, LocationError> {
            let mut world = self.0.borrow_mut();
            if let Some(err) = world.refuse_subscribe {
                return Err(err);
            }
            world.next_handle += 1;
            let handle = SubscriptionHandle(world.next_handle);
            world.subscribed.push((handle, *options));
            Ok(handle)
        }

        fn unsubscribe(&mut self, handle: SubscriptionHandle) {
            self.0.borrow_mut().unsubscribed.push(handle);
        }
    }

    impl DistanceStore for FakeStore {
        fn load_total_distance_km(&self) -> Result<Option<f64>, StoreError> {
            let world = self.0.borrow();
            if world.load_error {
                return Err(StoreError::Unavailable);
            }
            Ok(world.stored)
        }

        fn save_total_distance_km(&mut self, total_km: f64) -> Result<(), StoreError> {
            let mut world = self.0.borrow_mut();
            world.saves.push(total_km);
            if world.fail_saves {
                return Err(StoreError::Io("disk full".into()));
            }
            world.stored = Some(total_km);
            Ok(())
        }
    }

    impl KeepAwake for FakeKeepAwake {
        fn acquire(&mut self) -> Result<KeepAwakeHandle, KeepAwakeError> {
            let mut world = self.0.borrow_mut();
            if let Some(err) = world.keep_awake.clone() {
                return Err(err);
            }
            let handle = KeepAwakeHandle(world.acquired.len() as u64 + 1);
            world.acquired.push(handle);
            Ok(handle)
        }

        fn release(&mut self, handle: KeepAwakeHandle) {
            self.0.borrow_mut().released.push(handle);
        }
    }

    impl Haptics for FakeHaptics {
        fn pulse(&mut self, duration_ms: u32) {
            self.0.borrow_mut().pulses.push(duration_ms);
        }
    }

    impl Renderer for FakeRenderer {
        fn render_state(&mut self, snapshot: SessionSnapshot) {
            self.0.borrow_mut().snapshots.push(snapshot);
        }

        fn render_status_message(&mut self, message: StatusMessage) {
            self.0.borrow_mut().messages.push(message);
        }
    }

    fn session(world: &Shared) -> TrackingSession {
        TrackingSession::new(
            TrackerConfig::default(),
            Collaborators {
                location: Box::new(FakeLocation(world.clone())),
                store: Box::new(FakeStore(world.clone())),
                keep_awake: Box::new(FakeKeepAwake(world.clone())),
                haptics: Box::new(FakeHaptics(world.clone())),
                renderer: Box::new(FakeRenderer(world.clone())),
            },
        )
    }

    /// A point on the equator `km` east of (0, 0).
    fn east(km: f64) -> Sample {
        Sample::at(0., (km / EARTH_RADIUS_KM).to_degrees())
    }

    fn last_message(world: &Shared) -> Option<StatusMessage> {
        world.borrow().messages.last().copied()
    }

    #[test]
    fn starts_idle_with_nothing_saved() {
        let world = Shared::default();
        let session = session(&world);

        assert_eq!(session.state(), &SessionState::default());
        assert_eq!(world.borrow().snapshots.len(), 1);
        assert_eq!(world.borrow().snapshots[0].distance_label(), "0.000");
    }

    #[test]
    fn start_subscribes_with_fresh_high_accuracy_fixes() {
        let world = Shared::default();
        let mut session = session(&world);

        session.start();

        assert!(session.is_active());
        let world = world.borrow();
        assert_eq!(world.subscribed.len(), 1);
        let (_, options) = world.subscribed[0];
        assert!(options.high_accuracy);
        assert_eq!(options.timeout_ms, 10_000);
        assert_eq!(options.max_cache_age_ms, 0);
        assert_eq!(world.acquired.len(), 1);
        assert_eq!(world.messages, vec![StatusMessage::KeepAwakeEnabled, StatusMessage::AcquiringSignal]);
    }

    #[test]
    fn first_sample_seeds_then_second_adds_distance() {
        let world = Shared::default();
        let mut session = session(&world);
        session.start();
        let handle = session.subscription().unwrap();

        let a = Sample::at(25.0330, 121.5654);
        let b = Sample::at(25.0340, 121.5664);

        session.on_sample(handle, a);
        assert_eq!(session.state().total_distance_km, 0.);
        assert_eq!(session.state().last_point, Some(a.point));

        session.on_sample(handle, b);
        assert_abs_diff_eq!(session.state().total_distance_km, distance_km(a.point, b.point), epsilon = 1e-12);
        assert_eq!(session.state().last_point, Some(b.point));

        // Written through on every accepted sample
        assert_eq!(world.borrow().saves.len(), 2);
        assert_eq!(world.borrow().stored, Some(session.state().total_distance_km));
        assert_eq!(last_message(&world), Some(StatusMessage::Recording));
    }

    #[test]
    fn crossing_a_kilometer_fires_one_milestone() {
        let world = Shared::default();
        let mut session = session(&world);
        session.start();
        let handle = session.subscription().unwrap();

        assert_eq!(session.on_sample(handle, east(0.)), None);
        assert_eq!(session.on_sample(handle, east(0.95)), None);
        assert_abs_diff_eq!(session.state().total_distance_km, 0.95, epsilon = 1e-9);

        assert_eq!(session.on_sample(handle, east(1.05)), Some(1));
        assert_abs_diff_eq!(session.state().total_distance_km, 1.05, epsilon = 1e-9);
        assert_eq!(session.state().last_milestone_km, 1);
        assert_eq!(world.borrow().pulses, vec![500]);

        assert_eq!(session.on_sample(handle, east(1.5)), None);
        assert_eq!(world.borrow().pulses.len(), 1);
    }

    #[test]
    fn jumping_several_kilometers_is_a_single_milestone() {
        let world = Shared::default();
        let mut session = session(&world);
        session.start();
        let handle = session.subscription().unwrap();

        session.on_sample(handle, east(0.));
        assert_eq!(session.on_sample(handle, east(2.2)), Some(2));
        assert_eq!(world.borrow().pulses.len(), 1);
        assert_eq!(session.state().last_milestone_km, 2);
    }

    #[test]
    fn restart_does_not_bridge_the_gap() {
        let world = Shared::default();
        let mut session = session(&world);
        session.start();
        let first = session.subscription().unwrap();
        session.on_sample(first, east(0.));
        session.on_sample(first, east(0.2));

        session.stop();
        assert_eq!(session.state().last_point, None);

        session.start();
        let second = session.subscription().unwrap();
        assert_ne!(first, second);
        session.on_sample(second, east(50.));

        assert_abs_diff_eq!(session.state().total_distance_km, 0.2, epsilon = 1e-9);
        assert_eq!(session.state().last_point, Some(east(50.).point));
    }

    #[test]
    fn stop_releases_everything_and_is_idempotent() {
        let world = Shared::default();
        let mut session = session(&world);
        session.start();
        let handle = session.subscription().unwrap();

        session.stop();
        session.stop();

        assert!(!session.is_active());
        let world = world.borrow();
        assert_eq!(world.unsubscribed, vec![handle]);
        assert_eq!(world.released, world.acquired);
        assert_eq!(world.messages.iter().filter(|m| **m == StatusMessage::Stopped).count(), 1);
    }

    #[test]
    fn late_events_after_stop_are_discarded() {
        let world = Shared::default();
        let mut session = session(&world);
        session.start();
        let handle = session.subscription().unwrap();
        session.on_sample(handle, east(0.));
        session.on_sample(handle, east(0.3));
        session.stop();
        let saves = world.borrow().saves.len();

        assert_eq!(session.on_sample(handle, east(5.)), None);
        session.on_provider_error(handle, LocationError::Timeout);

        assert_abs_diff_eq!(session.state().total_distance_km, 0.3, epsilon = 1e-9);
        assert_eq!(world.borrow().saves.len(), saves);
        assert_eq!(last_message(&world), Some(StatusMessage::Stopped));
    }

    #[test]
    fn events_from_an_old_subscription_do_not_reach_a_new_one() {
        let world = Shared::default();
        let mut session = session(&world);
        session.start();
        let old = session.subscription().unwrap();
        session.stop();
        session.start();
        let new = session.subscription().unwrap();

        session.on_sample(new, east(0.));
        session.on_sample(old, east(3.));
        session.on_sample(new, east(0.1));

        assert_abs_diff_eq!(session.state().total_distance_km, 0.1, epsilon = 1e-9);
        assert!(session.is_active());
    }

    #[test]
    fn provider_error_ends_the_session_and_keeps_the_total() {
        let world = Shared::default();
        let mut session = session(&world);
        session.start();
        let handle = session.subscription().unwrap();
        session.on_sample(handle, east(0.));
        session.on_sample(handle, east(0.4));

        session.handle_event(handle, LocationEvent::Error(LocationError::PermissionDenied));

        assert_eq!(session.state().status, SessionStatus::Idle);
        assert_eq!(session.state().last_point, None);
        assert_abs_diff_eq!(session.state().total_distance_km, 0.4, epsilon = 1e-9);
        assert_eq!(last_message(&world), Some(StatusMessage::Location(LocationError::PermissionDenied)));
        assert_eq!(world.borrow().unsubscribed, vec![handle]);
        assert_eq!(world.borrow().released.len(), 1);
    }

    #[test]
    fn refused_subscription_stays_idle() {
        let world = Shared::default();
        world.borrow_mut().refuse_subscribe = Some(LocationError::PositionUnavailable);
        let mut session = session(&world);

        session.start();

        assert!(!session.is_active());
        assert_eq!(world.borrow().released.len(), 1);
        assert_eq!(last_message(&world), Some(StatusMessage::Location(LocationError::PositionUnavailable)));
        assert_eq!(world.borrow().snapshots.last().unwrap().status, SessionStatus::Idle);
    }

    #[test]
    fn keep_awake_failures_do_not_stop_tracking() {
        let world = Shared::default();
        world.borrow_mut().keep_awake = Some(KeepAwakeError::Denied("NotAllowedError".into()));
        let mut session = session(&world);

        session.start();
        assert!(session.is_active());
        assert_eq!(world.borrow().messages[0], StatusMessage::KeepAwakeUnavailable);

        session.stop();
        assert!(world.borrow().released.is_empty());

        world.borrow_mut().keep_awake = Some(KeepAwakeError::Unsupported);
        world.borrow_mut().messages.clear();
        session.start();
        assert!(session.is_active());
        assert_eq!(world.borrow().messages, vec![StatusMessage::AcquiringSignal]);
    }

    #[test]
    fn reset_zeroes_and_persists() {
        let world = Shared::default();
        world.borrow_mut().stored = Some(3.7);
        let mut session = session(&world);
        session.start();

        session.reset();

        assert!(!session.is_active());
        assert_eq!(session.state().total_distance_km, 0.);
        assert_eq!(session.state().last_milestone_km, 0);
        assert_eq!(last_message(&world), Some(StatusMessage::Reset));
        assert_eq!(world.borrow().unsubscribed.len(), 1);

        let reloaded = self::session(&world);
        assert_eq!(reloaded.state().total_distance_km, 0.);
        assert_eq!(reloaded.state().last_milestone_km, 0);
    }

    #[test]
    fn reload_does_not_refire_the_last_milestone() {
        let world = Shared::default();
        world.borrow_mut().stored = Some(2.3);
        let mut session = session(&world);
        assert_eq!(session.state().last_milestone_km, 2);

        session.start();
        let handle = session.subscription().unwrap();
        session.on_sample(handle, east(0.));
        assert_eq!(session.on_sample(handle, east(0.1)), None);
        assert_abs_diff_eq!(session.state().total_distance_km, 2.4, epsilon = 1e-9);
        assert!(world.borrow().pulses.is_empty());
    }

    #[test]
    fn unusable_saved_totals_start_from_zero() {
        for stored in [-1., f64::NAN, f64::INFINITY] {
            let world = Shared::default();
            world.borrow_mut().stored = Some(stored);
            assert_eq!(session(&world).state(), &SessionState::default());
        }

        let world = Shared::default();
        world.borrow_mut().load_error = true;
        assert_eq!(session(&world).state(), &SessionState::default());
    }

    #[test]
    fn failed_saves_do_not_interrupt_tracking() {
        let world = Shared::default();
        world.borrow_mut().fail_saves = true;
        let mut session = session(&world);
        session.start();
        let handle = session.subscription().unwrap();

        session.on_sample(handle, east(0.));
        session.on_sample(handle, east(0.5));

        assert!(session.is_active());
        assert_abs_diff_eq!(session.state().total_distance_km, 0.5, epsilon = 1e-9);
        assert_eq!(world.borrow().saves.len(), 2);
    }

    #[test]
    fn speed_is_shown_only_while_active() {
        let world = Shared::default();
        let mut session = session(&world);
        session.start();
        let handle = session.subscription().unwrap();

        session.on_sample(handle, Sample::new(GeoPoint::new(0., 0.), Some(5.)));
        assert_eq!(world.borrow().snapshots.last().unwrap().speed_kmh, 18);

        session.on_sample(handle, Sample::at(0., 0.0001));
        assert_eq!(session.snapshot().speed_kmh, 0);

        session.on_sample(handle, Sample::new(GeoPoint::new(0., 0.0002), Some(5.)));
        session.stop();
        assert_eq!(world.borrow().snapshots.last().unwrap().speed_kmh, 0);
    }

    #[test]
    fn toggle_switches_between_states() {
        let world = Shared::default();
        let mut session = session(&world);

        session.toggle();
        assert!(session.is_active());
        session.toggle();
        assert!(!session.is_active());
        assert_eq!(world.borrow().subscribed.len(), 1);
    }

    #[test]
    fn start_while_active_keeps_the_subscription() {
        let world = Shared::default();
        let mut session = session(&world);
        session.start();
        let handle = session.subscription();

        session.start();

        assert_eq!(session.subscription(), handle);
        assert_eq!(world.borrow().subscribed.len(), 1);
        assert_eq!(world.borrow().acquired.len(), 1);
    }
}
