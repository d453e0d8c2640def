//! Collaborator contracts of the navigation core.
//!
//! The coordinator never talks to platform code directly. Routing, audio,
//! screen wake locks and the embedding screen are injected as trait objects
//! so hosts (and tests) can supply their own implementations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::broadcast;

use crate::route::{GeoPoint, NavigationRoute, TravelProfile};
use crate::state::NavigationState;

/// Errors raised by a routing service.
#[derive(Debug, Error)]
pub enum RoutingError {
    /// The routing backend could not be reached.
    #[error("network error: {0}")]
    Network(String),

    /// No route exists to the destination.
    #[error("no route to {destination}")]
    Unreachable {
        /// Destination that could not be reached.
        destination: String,
    },

    /// A coordinate was out of range.
    #[error("invalid coordinate: {0}")]
    InvalidCoordinate(GeoPoint),

    /// The backend rejected the request.
    #[error("routing service error: {0}")]
    Service(String),
}

impl RoutingError {
    /// Create a network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }
}

/// Errors raised by the audio collaborator.
#[derive(Debug, Error)]
pub enum AudioError {
    /// Speech playback failed.
    #[error("playback failed: {0}")]
    Playback(String),

    /// No speech engine is available.
    #[error("speech engine unavailable: {0}")]
    Unavailable(String),
}

/// Errors raised when acquiring a wake lock.
#[derive(Debug, Error)]
pub enum WakeLockError {
    /// The platform has no wake lock facility.
    #[error("wake lock unavailable: {0}")]
    Unavailable(String),

    /// The platform refused the request.
    #[error("wake lock denied: {0}")]
    Denied(String),
}

/// Notification published by a tracking service.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackingEvent {
    /// A new position produced a new state.
    StateChanged(NavigationState),
    /// The active route was replaced.
    Rerouted(NavigationRoute),
}

/// Route computation and per-position tracking.
#[async_trait::async_trait]
pub trait RoutingService: Send + Sync {
    /// Compute a route between two coordinates and make it the active route.
    ///
    /// # Errors
    ///
    /// Returns an error if no route can be computed.
    async fn calculate_route_to_coordinates(
        &self,
        from: GeoPoint,
        to: GeoPoint,
        destination_name: &str,
        profile: TravelProfile,
    ) -> Result<NavigationRoute, RoutingError>;

    /// Track a new position against the active route.
    ///
    /// The resulting state is also published to subscribers.
    fn update_location(&self, position: GeoPoint) -> NavigationState;

    /// The route currently being tracked.
    fn active_route(&self) -> Option<NavigationRoute>;

    /// Whether a trip is loaded.
    fn is_trip_loaded(&self) -> bool;

    /// Drop the active route.
    fn clear_active_route(&self);

    /// Subscribe to tracking events.
    fn subscribe(&self) -> broadcast::Receiver<TrackingEvent>;
}

/// Text-to-speech announcements.
///
/// Every method may take as long as playback does; the coordinator never
/// awaits them on its own call path.
#[async_trait::async_trait]
pub trait AudioAnnouncer: Send + Sync {
    /// Navigation to `destination` has started.
    async fn announce_navigation_start(
        &self,
        destination: &str,
        total_distance_m: f64,
    ) -> Result<(), AudioError>;

    /// The traveller left the route.
    async fn announce_off_route(&self) -> Result<(), AudioError>;

    /// The destination was reached.
    async fn announce_route_complete(&self, destination: &str) -> Result<(), AudioError>;

    /// A waypoint is coming up.
    async fn announce_approaching_waypoint(
        &self,
        name: &str,
        distance_m: f64,
        profile: Option<TravelProfile>,
    ) -> Result<(), AudioError>;

    /// A new route was computed.
    async fn announce_rerouting(&self) -> Result<(), AudioError>;

    /// Silence any speech in progress.
    async fn stop(&self) -> Result<(), AudioError>;

    /// Whether announcements are audible.
    fn is_enabled(&self) -> bool;

    /// Allow or suppress announcements.
    fn set_enabled(&self, enabled: bool);
}

/// Screen keep-awake facility.
pub trait WakeLock: Send + Sync {
    /// Acquire the lock.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform refuses.
    fn acquire(&self, keep_screen_on: bool) -> Result<(), WakeLockError>;

    /// Release the lock. Releasing an unheld lock is a no-op.
    fn release(&self);
}

/// A place the user can pick as a destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    /// Stable identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Position of the place.
    pub location: GeoPoint,
}

/// Operations supplied by the screen embedding the HUD.
///
/// Implementations are responsible for hopping onto their UI thread.
pub trait NavigationHost: Send + Sync {
    /// Last known device position.
    fn current_location(&self) -> Option<GeoPoint>;

    /// Place currently selected on the map.
    fn selected_place(&self) -> Option<Place>;

    /// Draw a route on the map.
    fn show_route(&self, route: &NavigationRoute);

    /// Remove the route overlay.
    fn clear_route(&self);

    /// Fit the viewport to a route.
    fn zoom_to_route(&self, route: &NavigationRoute);

    /// Update the progress overlay.
    fn update_progress(&self, state: &NavigationState);

    /// Enable or disable map position following.
    fn set_follow_mode(&self, follow: bool);

    /// Center the map on a place.
    fn center_on_place(&self, place: &Place);

    /// Open the detail sheet of a place.
    fn open_place_sheet(&self, place: &Place);

    /// Close the place detail sheet.
    fn close_place_sheet(&self);

    /// Show a non-blocking message to the user.
    fn notify(&self, message: &str);
}

/// Source of wall-clock time.
pub trait Clock: Send + Sync {
    /// Current time.
    fn now(&self) -> DateTime<Utc>;
}

/// [`Clock`] backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routing_error_display() {
        assert!(RoutingError::network("timed out")
            .to_string()
            .contains("timed out"));
        assert!(RoutingError::Unreachable {
            destination: "Cafe".to_string()
        }
        .to_string()
        .contains("Cafe"));
        assert!(RoutingError::InvalidCoordinate(GeoPoint::new(95.0, 0.0))
            .to_string()
            .contains("95.0"));
    }

    #[test]
    fn test_audio_error_display() {
        assert!(AudioError::Playback("busy".to_string())
            .to_string()
            .contains("playback"));
        assert!(AudioError::Unavailable("none".to_string())
            .to_string()
            .contains("unavailable"));
    }

    #[test]
    fn test_wake_lock_error_display() {
        assert!(WakeLockError::Denied("battery saver".to_string())
            .to_string()
            .contains("denied"));
    }

    #[test]
    fn test_system_clock_advances() {
        let clock = SystemClock;
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }

    #[test]
    fn test_place_serialization() {
        let place = Place {
            id: "p1".to_string(),
            name: "Cafe".to_string(),
            location: GeoPoint::new(1.0, 2.0),
        };
        let json = serde_json::to_string(&place).unwrap();
        let back: Place = serde_json::from_str(&json).unwrap();
        assert_eq!(place, back);
    }
}
