//! Terminal collaborators.
//!
//! Stand-ins for a phone's speech engine, power manager and map screen that
//! report through tracing and stdout. The `tripnav simulate` command wires a
//! coordinator to these.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use tracing::{debug, info, warn};

use crate::format::format_distance;
use crate::route::{GeoPoint, NavigationRoute, TravelProfile};
use crate::services::{AudioAnnouncer, AudioError, NavigationHost, Place, WakeLock, WakeLockError};
use crate::state::NavigationState;

/// Phrase spoken when navigation starts.
#[must_use]
pub fn start_phrase(destination: &str, total_distance_m: f64) -> String {
    format!(
        "Starting navigation to {destination}. {} to go.",
        format_distance(total_distance_m)
    )
}

/// Phrase spoken when a waypoint is coming up.
#[must_use]
pub fn approach_phrase(name: &str, distance_m: f64, profile: Option<TravelProfile>) -> String {
    let verb = match profile {
        Some(TravelProfile::Cycling) => "Ride",
        Some(TravelProfile::Driving) => "Drive",
        Some(TravelProfile::Walking) | None => "Continue",
    };
    format!("{verb} {} to reach {name}.", format_distance(distance_m))
}

/// Speaks announcements by printing them.
#[derive(Debug)]
pub struct ConsoleAnnouncer {
    enabled: AtomicBool,
    echo: bool,
    spoken: AtomicUsize,
}

impl ConsoleAnnouncer {
    /// Create an announcer. With `echo` off phrases only go to the log.
    #[must_use]
    pub fn new(echo: bool) -> Self {
        Self {
            enabled: AtomicBool::new(true),
            echo,
            spoken: AtomicUsize::new(0),
        }
    }

    /// Number of phrases spoken so far.
    #[must_use]
    pub fn spoken(&self) -> usize {
        self.spoken.load(Ordering::SeqCst)
    }

    fn say(&self, phrase: &str) -> Result<(), AudioError> {
        if !self.is_enabled() {
            debug!(phrase, "Muted");
            return Ok(());
        }
        self.spoken.fetch_add(1, Ordering::SeqCst);
        info!(phrase, "Speaking");
        if self.echo {
            println!("  >> {phrase}");
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl AudioAnnouncer for ConsoleAnnouncer {
    async fn announce_navigation_start(
        &self,
        destination: &str,
        total_distance_m: f64,
    ) -> Result<(), AudioError> {
        self.say(&start_phrase(destination, total_distance_m))
    }

    async fn announce_off_route(&self) -> Result<(), AudioError> {
        self.say("You are off route.")
    }

    async fn announce_route_complete(&self, destination: &str) -> Result<(), AudioError> {
        self.say(&format!("You have arrived at {destination}."))
    }

    async fn announce_approaching_waypoint(
        &self,
        name: &str,
        distance_m: f64,
        profile: Option<TravelProfile>,
    ) -> Result<(), AudioError> {
        self.say(&approach_phrase(name, distance_m, profile))
    }

    async fn announce_rerouting(&self) -> Result<(), AudioError> {
        self.say("Recalculating route.")
    }

    async fn stop(&self) -> Result<(), AudioError> {
        debug!("Speech silenced");
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }
}

/// Wake lock that only records its state.
#[derive(Debug, Default)]
pub struct ConsoleWakeLock {
    held: AtomicBool,
}

impl ConsoleWakeLock {
    /// Whether the lock is held.
    #[must_use]
    pub fn is_held(&self) -> bool {
        self.held.load(Ordering::SeqCst)
    }
}

impl WakeLock for ConsoleWakeLock {
    fn acquire(&self, keep_screen_on: bool) -> Result<(), WakeLockError> {
        self.held.store(true, Ordering::SeqCst);
        info!(keep_screen_on, "Screen kept awake");
        Ok(())
    }

    fn release(&self) {
        if self.held.swap(false, Ordering::SeqCst) {
            info!("Screen may sleep again");
        }
    }
}

/// Map screen without a map.
#[derive(Debug, Default)]
pub struct ConsoleHost {
    location: Mutex<Option<GeoPoint>>,
    selected: Mutex<Option<Place>>,
    following: AtomicBool,
}

impl ConsoleHost {
    /// Create a host with no location and nothing selected.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the device position.
    pub fn set_location(&self, location: Option<GeoPoint>) {
        *self
            .location
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = location;
    }

    /// Select a place on the map.
    pub fn select_place(&self, place: Option<Place>) {
        *self
            .selected
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = place;
    }

    /// Whether the map follows the device position.
    #[must_use]
    pub fn is_following(&self) -> bool {
        self.following.load(Ordering::SeqCst)
    }
}

impl NavigationHost for ConsoleHost {
    fn current_location(&self) -> Option<GeoPoint> {
        *self
            .location
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn selected_place(&self) -> Option<Place> {
        self.selected
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    fn show_route(&self, route: &NavigationRoute) {
        debug!(
            destination = %route.destination_name,
            waypoints = route.waypoints.len(),
            "Route overlay shown"
        );
    }

    fn clear_route(&self) {
        debug!("Route overlay cleared");
    }

    fn zoom_to_route(&self, route: &NavigationRoute) {
        debug!(destination = %route.destination_name, "Zoomed to route");
    }

    fn update_progress(&self, state: &NavigationState) {
        debug!(progress = state.progress_percent, "Progress overlay updated");
    }

    fn set_follow_mode(&self, follow: bool) {
        self.following.store(follow, Ordering::SeqCst);
    }

    fn center_on_place(&self, place: &Place) {
        debug!(place = %place.name, at = %place.location, "Centered on place");
    }

    fn open_place_sheet(&self, place: &Place) {
        debug!(place = %place.name, "Place sheet opened");
    }

    fn close_place_sheet(&self) {
        debug!("Place sheet closed");
    }

    fn notify(&self, message: &str) {
        warn!("{message}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_phrase() {
        assert_eq!(
            start_phrase("Museum", 2650.0),
            "Starting navigation to Museum. 2.7 km to go."
        );
    }

    #[test]
    fn test_approach_phrase_by_profile() {
        assert_eq!(
            approach_phrase("Cafe", 140.0, Some(TravelProfile::Cycling)),
            "Ride 140 m to reach Cafe."
        );
        assert_eq!(
            approach_phrase("Cafe", 90.0, None),
            "Continue 90 m to reach Cafe."
        );
    }

    #[tokio::test]
    async fn test_muted_announcer_stays_quiet() {
        let announcer = ConsoleAnnouncer::new(false);
        announcer.announce_off_route().await.unwrap();
        announcer.set_enabled(false);
        announcer.announce_rerouting().await.unwrap();

        assert_eq!(announcer.spoken(), 1);
        assert!(!announcer.is_enabled());
    }

    #[test]
    fn test_wake_lock_state() {
        let lock = ConsoleWakeLock::default();
        lock.acquire(true).unwrap();
        assert!(lock.is_held());
        lock.release();
        lock.release();
        assert!(!lock.is_held());
    }

    #[test]
    fn test_host_selection() {
        let host = ConsoleHost::new();
        assert!(host.current_location().is_none());

        host.set_location(Some(GeoPoint::new(1.0, 2.0)));
        host.select_place(Some(Place {
            id: "p".to_string(),
            name: "Cafe".to_string(),
            location: GeoPoint::new(1.1, 2.1),
        }));
        host.set_follow_mode(true);

        assert_eq!(host.current_location(), Some(GeoPoint::new(1.0, 2.0)));
        assert_eq!(host.selected_place().map(|p| p.name).as_deref(), Some("Cafe"));
        assert!(host.is_following());
    }
}
