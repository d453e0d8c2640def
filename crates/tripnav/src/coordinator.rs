//! Navigation session coordinator.
//!
//! [`NavigationCoordinator`] owns the start / update / reroute / stop
//! lifecycle of one navigation session at a time. It turns each incoming
//! [`NavigationState`] into HUD text, decides which voice announcements to
//! play, and keeps the wake lock and map-follow side effects in step with the
//! session.
//!
//! The coordinator is a cheap, cloneable handle. Every command takes `&self`
//! and may be called from any thread; HUD frames are published on a
//! [`watch`] channel for the UI side to pick up on its own thread.

use std::sync::{Arc, Mutex, MutexGuard, Weak};

use serde::Serialize;
use tokio::runtime::Handle;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

use crate::announce::{Announcement, AnnouncementPolicy, AnnouncementTracker};
use crate::audio::AudioDispatcher;
use crate::config::{Config, SessionConfig};
use crate::error::{Error, Result};
use crate::format::{format_distance, format_eta, instruction_text, DEFAULT_INSTRUCTION};
use crate::route::{NavigationRoute, TravelProfile};
use crate::services::{
    AudioAnnouncer, Clock, NavigationHost, RoutingService, TrackingEvent, WakeLock,
};
use crate::state::{NavigationState, NavigationStatus, StatusColor};
use crate::wake_lock::WakeLockGuard;

/// Capacity of the coordinator event broadcast.
const EVENT_CAPACITY: usize = 64;

/// Status line while idle.
const READY_TEXT: &str = "Ready";

/// Status line right after a session starts.
const NAVIGATING_TEXT: &str = "Navigating";

/// Everything the HUD displays.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HudView {
    /// A session is active.
    pub is_navigating: bool,
    /// The HUD is shown in expanded mode.
    pub is_expanded: bool,
    /// Voice announcements are muted.
    pub is_muted: bool,
    /// Name of the destination.
    pub destination_name: String,
    /// Remaining distance to the destination.
    pub distance_text: String,
    /// Name of the next waypoint, or empty.
    pub next_waypoint_name: String,
    /// Distance to the next waypoint.
    pub next_waypoint_distance_text: String,
    /// Instruction for the current leg.
    pub instruction_text: String,
    /// Remaining travel time.
    pub eta_text: String,
    /// Bearing to the destination in degrees.
    pub bearing_degrees: f64,
    /// Overall progress, `[0, 100]`.
    pub progress_percent: f64,
    /// Status line.
    pub status_text: String,
    /// Status line colour.
    pub status_color: StatusColor,
    /// The off-route warning is raised.
    pub is_off_route: bool,
}

impl HudView {
    fn idle(is_expanded: bool, is_muted: bool) -> Self {
        Self {
            is_navigating: false,
            is_expanded,
            is_muted,
            destination_name: String::new(),
            distance_text: String::new(),
            next_waypoint_name: String::new(),
            next_waypoint_distance_text: String::new(),
            instruction_text: String::new(),
            eta_text: String::new(),
            bearing_degrees: 0.0,
            progress_percent: 0.0,
            status_text: READY_TEXT.to_string(),
            status_color: StatusColor::Gray,
            is_off_route: false,
        }
    }

    fn for_route(route: &NavigationRoute, is_expanded: bool, is_muted: bool) -> Self {
        Self {
            is_navigating: true,
            destination_name: route.destination_name.clone(),
            distance_text: format_distance(route.total_distance_m),
            instruction_text: DEFAULT_INSTRUCTION.to_string(),
            eta_text: format_eta(route.estimated_duration),
            status_text: NAVIGATING_TEXT.to_string(),
            status_color: StatusColor::Blue,
            ..Self::idle(is_expanded, is_muted)
        }
    }

    fn apply(&mut self, state: &NavigationState) {
        self.distance_text = format_distance(state.distance_to_destination_m);
        self.next_waypoint_name = state.next_waypoint_name_or_empty().to_string();
        self.next_waypoint_distance_text = format_distance(state.distance_to_next_waypoint_m);
        self.instruction_text = instruction_text(state.current_instruction.as_deref());
        self.eta_text = format_eta(state.estimated_time_remaining);
        self.bearing_degrees = state.bearing_to_destination;
        self.progress_percent = state.progress_percent.clamp(0.0, 100.0);
        self.status_text = state.status.label().to_string();
        self.status_color = state.status.color();
        self.is_off_route = state.status.is_off_route();
    }
}

/// Notifications published by the coordinator.
#[derive(Debug, Clone, PartialEq)]
pub enum CoordinatorEvent {
    /// A session started.
    Started {
        /// Destination name.
        destination: String,
    },
    /// An announcement was issued.
    Announced(Announcement),
    /// The active route was replaced.
    Rerouted {
        /// Destination name.
        destination: String,
    },
    /// The destination was reached.
    Arrived {
        /// Destination name.
        destination: String,
    },
    /// The session ended; the host should return to `return_to` if set.
    Stopped {
        /// Screen the session was started from.
        return_to: Option<String>,
    },
}

/// Collaborators injected into the coordinator.
#[derive(Clone)]
pub struct Collaborators {
    /// Route computation and tracking.
    pub routing: Arc<dyn RoutingService>,
    /// Voice announcements.
    pub audio: Arc<dyn AudioAnnouncer>,
    /// Screen keep-awake.
    pub wake_lock: Arc<dyn WakeLock>,
    /// Embedding screen.
    pub host: Arc<dyn NavigationHost>,
    /// Time source for announcement rate limiting.
    pub clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StopReason {
    User,
    Arrived,
}

/// Aborts the tracking subscription task when dropped.
#[derive(Debug)]
struct Subscription(JoinHandle<()>);

impl Drop for Subscription {
    fn drop(&mut self) {
        self.0.abort();
    }
}

#[derive(Debug)]
struct Session {
    route: NavigationRoute,
    wake_lock: WakeLockGuard,
    subscription: Subscription,
    source_page: Option<String>,
}

#[derive(Debug)]
struct CoordinatorState {
    session: Option<Session>,
    tracker: AnnouncementTracker,
    expanded: bool,
    muted: bool,
}

struct Inner {
    state: Mutex<CoordinatorState>,
    hud: watch::Sender<HudView>,
    events: broadcast::Sender<CoordinatorEvent>,
    audio: AudioDispatcher,
    collaborators: Collaborators,
    policy: AnnouncementPolicy,
    session_config: SessionConfig,
    announce_start: bool,
    runtime: Handle,
}

/// Drives one navigation session at a time.
#[derive(Clone)]
pub struct NavigationCoordinator {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for NavigationCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NavigationCoordinator")
            .field("is_navigating", &self.is_navigating())
            .finish_non_exhaustive()
    }
}

impl NavigationCoordinator {
    /// Create a coordinator.
    ///
    /// Must be called from within a Tokio runtime; announcement playback and
    /// tracking subscriptions run on it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoRuntime`] outside a runtime.
    pub fn new(collaborators: Collaborators, config: &Config) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|e| Error::NoRuntime(e.to_string()))?;
        let audio = AudioDispatcher::spawn(Arc::clone(&collaborators.audio), &runtime);
        let muted = !collaborators.audio.is_enabled();
        let expanded = config.session.start_expanded;
        let (hud, _) = watch::channel(HudView::idle(expanded, muted));
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Ok(Self {
            inner: Arc::new(Inner {
                state: Mutex::new(CoordinatorState {
                    session: None,
                    tracker: AnnouncementTracker::default(),
                    expanded,
                    muted,
                }),
                hud,
                events,
                audio,
                collaborators,
                policy: AnnouncementPolicy::from(&config.announcements),
                session_config: config.session.clone(),
                announce_start: config.announcements.announce_start,
                runtime,
            }),
        })
    }

    /// Whether a session is active.
    #[must_use]
    pub fn is_navigating(&self) -> bool {
        self.lock().session.is_some()
    }

    /// Current HUD frame.
    #[must_use]
    pub fn hud(&self) -> HudView {
        self.inner.hud.borrow().clone()
    }

    /// Watch HUD frames.
    #[must_use]
    pub fn watch_hud(&self) -> watch::Receiver<HudView> {
        self.inner.hud.subscribe()
    }

    /// Subscribe to coordinator events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<CoordinatorEvent> {
        self.inner.events.subscribe()
    }

    /// The route of the active session.
    #[must_use]
    pub fn active_route(&self) -> Option<NavigationRoute> {
        self.lock().session.as_ref().map(|s| s.route.clone())
    }

    /// Start navigating `route`.
    pub fn start(&self, route: NavigationRoute) {
        self.start_with_source(route, None);
    }

    /// Start navigating `route`, returning to `source_page` when it ends.
    ///
    /// An already active session is replaced without a stop notification.
    pub fn start_with_source(&self, route: NavigationRoute, source_page: Option<String>) {
        let c = &self.inner.collaborators;

        // The old session lets go of the wake lock before the new one takes it.
        let replaced = self.lock().session.take();
        if let Some(replaced) = replaced {
            debug!(
                destination = %replaced.route.destination_name,
                "Replacing active navigation session"
            );
            drop(replaced.subscription);
            replaced.wake_lock.release();
        }

        let wake_lock = WakeLockGuard::acquire(
            Arc::clone(&c.wake_lock),
            self.inner.session_config.keep_screen_on,
        );
        let subscription = self.subscribe_tracking();

        let raced = {
            let mut st = self.lock();
            st.tracker = AnnouncementTracker::default();
            st.expanded = self.inner.session_config.start_expanded;
            self.inner
                .hud
                .send_replace(HudView::for_route(&route, st.expanded, st.muted));
            st.session.replace(Session {
                route: route.clone(),
                wake_lock,
                subscription,
                source_page,
            })
        };
        if let Some(raced) = raced {
            // Same platform lock, still needed by the session just installed
            warn!("Concurrent navigation start; discarding the earlier session");
            let Session {
                wake_lock,
                subscription,
                ..
            } = raced;
            drop(subscription);
            wake_lock.forget();
        }

        info!(
            destination = %route.destination_name,
            waypoints = route.waypoints.len(),
            distance_m = route.total_distance_m,
            "Navigation started"
        );

        c.host.show_route(&route);
        c.host.zoom_to_route(&route);
        c.host.set_follow_mode(true);

        if self.inner.announce_start {
            self.announce(Announcement::NavigationStarted {
                destination: route.destination_name.clone(),
                total_distance_m: route.total_distance_m,
            });
        }
        self.emit(CoordinatorEvent::Started {
            destination: route.destination_name,
        });
    }

    /// Apply a new navigation state.
    ///
    /// Ignored while idle. Arrival ends the session before this returns.
    pub fn update_state(&self, state: NavigationState) {
        let now = self.inner.collaborators.clock.now();
        let (announcements, destination) = {
            let mut st = self.lock();
            let Some(session) = st.session.as_ref() else {
                trace!(status = %state.status, "Ignoring navigation update while idle");
                return;
            };
            let profile = session.route.profile;

            let mut hud = self.inner.hud.borrow().clone();
            hud.apply(&state);

            let decision = st.tracker.evaluate(
                &state,
                &hud.destination_name,
                &hud.next_waypoint_name,
                profile,
                &self.inner.policy,
                now,
            );
            st.tracker = decision.tracker;

            let destination = hud.destination_name.clone();
            self.inner.hud.send_replace(hud);
            (decision.announcements, destination)
        };

        trace!(
            status = %state.status,
            remaining_m = state.distance_to_destination_m,
            progress = state.progress_percent,
            "Navigation state applied"
        );
        self.inner.collaborators.host.update_progress(&state);

        for announcement in announcements {
            self.announce(announcement);
        }

        if state.status == NavigationStatus::Arrived {
            info!(destination = %destination, "Arrived at destination");
            self.emit(CoordinatorEvent::Arrived { destination });
            self.finish(StopReason::Arrived);
        }
    }

    /// Switch to a recomputed route mid-session.
    ///
    /// Announcement tracking carries over.
    pub fn on_rerouted(&self, route: NavigationRoute) {
        {
            let mut st = self.lock();
            let Some(session) = st.session.as_mut() else {
                trace!("Ignoring reroute while idle");
                return;
            };
            session.route = route.clone();

            self.inner.hud.send_modify(|hud| {
                hud.destination_name.clone_from(&route.destination_name);
                hud.distance_text = format_distance(route.total_distance_m);
                hud.eta_text = format_eta(route.estimated_duration);
            });
        }

        info!(
            destination = %route.destination_name,
            distance_m = route.total_distance_m,
            "Rerouted"
        );
        let host = &self.inner.collaborators.host;
        host.show_route(&route);
        host.zoom_to_route(&route);
        self.announce(Announcement::Rerouting);
        self.emit(CoordinatorEvent::Rerouted {
            destination: route.destination_name,
        });
    }

    /// End the active session. Does nothing while idle.
    pub fn stop(&self) {
        self.finish(StopReason::User);
    }

    /// Flip the muted flag and return the new value.
    pub fn toggle_mute(&self) -> bool {
        let muted = {
            let mut st = self.lock();
            st.muted = !st.muted;
            let muted = st.muted;
            self.inner.hud.send_modify(|hud| hud.is_muted = muted);
            muted
        };
        self.inner.audio.set_enabled(!muted);
        debug!(muted, "Voice guidance toggled");
        muted
    }

    /// Flip the expanded display mode and return the new value.
    pub fn toggle_expanded(&self) -> bool {
        let mut st = self.lock();
        st.expanded = !st.expanded;
        let expanded = st.expanded;
        self.inner.hud.send_modify(|hud| hud.is_expanded = expanded);
        expanded
    }

    /// Compute a route from the current location to the selected place and
    /// start navigating it.
    ///
    /// Failures are reported to the host as a notification and returned.
    ///
    /// # Errors
    ///
    /// Returns an error if the location or destination is unknown, or if
    /// the routing service fails.
    pub async fn navigate_to_selected_place(
        &self,
        profile: Option<TravelProfile>,
        source_page: Option<String>,
    ) -> Result<NavigationRoute> {
        let c = &self.inner.collaborators;

        let Some(from) = c.host.current_location() else {
            return Err(self.report(Error::LocationUnavailable));
        };
        let Some(place) = c.host.selected_place() else {
            return Err(self.report(Error::NoDestination));
        };
        let profile = profile.unwrap_or(self.inner.session_config.default_profile);

        debug!(from = %from, to = %place.location, %profile, "Calculating route");
        match c
            .routing
            .calculate_route_to_coordinates(from, place.location, &place.name, profile)
            .await
        {
            Ok(route) => {
                c.host.close_place_sheet();
                self.start_with_source(route.clone(), source_page);
                Ok(route)
            }
            Err(e) => {
                error!(destination = %place.name, error = %e, "Route calculation failed");
                Err(self.report(e.into()))
            }
        }
    }

    /// Wait until queued announcements have been handed to the announcer.
    pub async fn flush_announcements(&self) {
        self.inner.audio.flush().await;
    }

    fn finish(&self, reason: StopReason) {
        let session = {
            let mut st = self.lock();
            let Some(session) = st.session.take() else {
                trace!("Stop requested while idle");
                return;
            };
            st.tracker = AnnouncementTracker::default();
            self.inner
                .hud
                .send_replace(HudView::idle(st.expanded, st.muted));
            session
        };

        let Session {
            route,
            wake_lock,
            subscription,
            source_page,
        } = session;
        drop(subscription);
        wake_lock.release();

        let c = &self.inner.collaborators;
        if reason == StopReason::User {
            self.inner.audio.silence();
        }
        c.routing.clear_active_route();
        c.host.clear_route();
        match c.host.selected_place() {
            Some(place) => {
                c.host.center_on_place(&place);
                c.host.open_place_sheet(&place);
            }
            None => c.host.set_follow_mode(true),
        }

        info!(destination = %route.destination_name, ?reason, "Navigation stopped");
        self.emit(CoordinatorEvent::Stopped {
            return_to: source_page,
        });
    }

    fn subscribe_tracking(&self) -> Subscription {
        let rx = self.inner.collaborators.routing.subscribe();
        let weak = Arc::downgrade(&self.inner);
        Subscription(self.inner.runtime.spawn(pump_tracking(weak, rx)))
    }

    fn announce(&self, announcement: Announcement) {
        debug!(kind = announcement.kind(), "Announcing");
        self.inner.audio.announce(announcement.clone());
        self.emit(CoordinatorEvent::Announced(announcement));
    }

    fn emit(&self, event: CoordinatorEvent) {
        // No subscribers is fine
        let _ = self.inner.events.send(event);
    }

    fn report(&self, err: Error) -> Error {
        if err.is_user_facing() {
            self.inner.collaborators.host.notify(&err.user_message());
        }
        err
    }

    fn lock(&self) -> MutexGuard<'_, CoordinatorState> {
        // State stays consistent across a panicking holder; keep going.
        self.inner
            .state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    #[cfg(test)]
    fn tracker(&self) -> AnnouncementTracker {
        self.lock().tracker.clone()
    }
}

/// Forward tracking events to the coordinator until the session ends.
async fn pump_tracking(coordinator: Weak<Inner>, mut rx: broadcast::Receiver<TrackingEvent>) {
    loop {
        let event = match rx.recv().await {
            Ok(event) => event,
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "Navigation updates dropped; coordinator fell behind");
                continue;
            }
            Err(RecvError::Closed) => {
                debug!("Tracking service closed its event stream");
                break;
            }
        };

        let Some(inner) = coordinator.upgrade() else {
            break;
        };
        let coordinator = NavigationCoordinator { inner };
        match event {
            TrackingEvent::StateChanged(state) => coordinator.update_state(state),
            TrackingEvent::Rerouted(route) => coordinator.on_rerouted(route),
        }
    }
}
