//! In-process routing and tracking.
//!
//! [`StraightLineRouter`] is a [`RoutingService`] that joins waypoints with
//! great-circle legs instead of asking a road network. It is enough to drive a
//! full navigation session offline: the CLI simulator and the integration
//! tests run on it.

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::broadcast;
use tracing::{debug, info, trace};

use crate::config::TrackingConfig;
use crate::format::compass_point;
use crate::route::{GeoPoint, NavigationRoute, TravelProfile, Waypoint, WaypointType};
use crate::services::{RoutingError, RoutingService, TrackingEvent};
use crate::state::{NavigationState, NavigationStatus};

#[derive(Debug, Default)]
struct Progress {
    route: Option<NavigationRoute>,
    /// Index of the waypoint being approached.
    next: usize,
}

/// Straight-line routing service with position tracking.
#[derive(Debug)]
pub struct StraightLineRouter {
    config: TrackingConfig,
    progress: Mutex<Progress>,
    events: broadcast::Sender<TrackingEvent>,
}

impl StraightLineRouter {
    /// Create a router.
    #[must_use]
    pub fn new(config: TrackingConfig) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            config,
            progress: Mutex::new(Progress::default()),
            events,
        }
    }

    /// Build a route `from` → `vias` → `to` and make it the active route.
    ///
    /// # Errors
    ///
    /// Returns [`RoutingError::InvalidCoordinate`] for a point outside the
    /// valid latitude/longitude range.
    pub fn calculate_route(
        &self,
        from: GeoPoint,
        vias: &[Waypoint],
        to: GeoPoint,
        destination_name: &str,
        profile: TravelProfile,
    ) -> Result<NavigationRoute, RoutingError> {
        for point in std::iter::once(from)
            .chain(vias.iter().map(Waypoint::point))
            .chain(std::iter::once(to))
        {
            if !point.is_valid() {
                return Err(RoutingError::InvalidCoordinate(point));
            }
        }

        let mut waypoints = Vec::with_capacity(vias.len() + 2);
        waypoints.push(Waypoint::new(from, WaypointType::Start));
        waypoints.extend(vias.iter().cloned().map(|mut w| {
            w.waypoint_type = WaypointType::Via;
            w
        }));
        waypoints
            .push(Waypoint::new(to, WaypointType::Destination).with_name(destination_name));

        let route = build_route(waypoints, destination_name, profile);
        info!(
            destination = %destination_name,
            distance_m = route.total_distance_m,
            %profile,
            "Route calculated"
        );

        let mut progress = self.lock();
        progress.route = Some(route.clone());
        progress.next = 1;
        Ok(route)
    }

    fn lock(&self) -> MutexGuard<'_, Progress> {
        self.progress
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn publish(&self, event: TrackingEvent) {
        // Nobody listening is fine
        let _ = self.events.send(event);
    }

    fn track(&self, progress: &mut Progress, position: GeoPoint) -> NavigationState {
        let Some(route) = progress.route.as_ref() else {
            return NavigationState::no_route();
        };
        let waypoints = &route.waypoints;
        if waypoints.len() < 2 {
            return NavigationState::no_route();
        }
        let last = waypoints.len() - 1;
        let destination = &waypoints[last];
        let profile = route.profile.unwrap_or_default();

        let to_destination = position.distance_to(&destination.point());
        if to_destination <= self.config.arrival_radius_m {
            return NavigationState {
                distance_to_destination_m: to_destination,
                distance_to_next_waypoint_m: to_destination,
                next_waypoint_name: destination.name.clone(),
                current_instruction: Some(format!("Arrived at {}", route.destination_name)),
                bearing_to_destination: position.bearing_to(&destination.point()),
                progress_percent: 100.0,
                estimated_time_remaining: Duration::ZERO,
                status: NavigationStatus::Arrived,
            };
        }

        while progress.next < last
            && position.distance_to(&waypoints[progress.next].point())
                <= self.config.waypoint_reached_radius_m
        {
            debug!(index = progress.next, "Waypoint reached");
            progress.next += 1;
        }
        let next = progress.next.clamp(1, last);
        let target = &waypoints[next];

        let leg_start = waypoints[next - 1].point();
        let off_leg = position.distance_to(&nearest_on_leg(&position, &leg_start, &target.point()));
        let status = if off_leg > self.config.off_route_threshold_m {
            NavigationStatus::OffRoute
        } else {
            NavigationStatus::OnRoute
        };

        let to_next = position.distance_to(&target.point());
        let remaining = to_next + legs_length(&waypoints[next..]);
        let progress_percent = if route.total_distance_m > 0.0 {
            (100.0 * (1.0 - remaining / route.total_distance_m)).clamp(0.0, 100.0)
        } else {
            0.0
        };
        let toward = target.name.as_deref().unwrap_or(&route.destination_name);

        NavigationState {
            distance_to_destination_m: remaining,
            distance_to_next_waypoint_m: to_next,
            next_waypoint_name: target.name.clone(),
            current_instruction: Some(format!(
                "Head {} toward {toward}",
                compass_point(position.bearing_to(&target.point()))
            )),
            bearing_to_destination: position.bearing_to(&destination.point()),
            progress_percent,
            estimated_time_remaining: travel_time(remaining, profile),
            status,
        }
    }

    fn reroute(&self, progress: &mut Progress, position: GeoPoint) -> Option<NavigationRoute> {
        let route = progress.route.as_ref()?;
        let mut waypoints = vec![Waypoint::new(position, WaypointType::Start)];
        waypoints.extend(route.waypoints.iter().skip(progress.next).cloned());

        let rerouted = build_route(
            waypoints,
            &route.destination_name,
            route.profile.unwrap_or_default(),
        );
        progress.route = Some(rerouted.clone());
        progress.next = 1;
        Some(rerouted)
    }
}

#[async_trait::async_trait]
impl RoutingService for StraightLineRouter {
    async fn calculate_route_to_coordinates(
        &self,
        from: GeoPoint,
        to: GeoPoint,
        destination_name: &str,
        profile: TravelProfile,
    ) -> Result<NavigationRoute, RoutingError> {
        self.calculate_route(from, &[], to, destination_name, profile)
    }

    fn update_location(&self, position: GeoPoint) -> NavigationState {
        let mut progress = self.lock();
        if progress.route.is_none() {
            return NavigationState::no_route();
        }

        let state = self.track(&mut progress, position);
        trace!(
            status = %state.status,
            remaining_m = state.distance_to_destination_m,
            "Position tracked"
        );
        self.publish(TrackingEvent::StateChanged(state.clone()));

        if state.status == NavigationStatus::OffRoute && self.config.auto_reroute {
            if let Some(route) = self.reroute(&mut progress, position) {
                info!(distance_m = route.total_distance_m, "Off route, recomputed route");
                self.publish(TrackingEvent::Rerouted(route));
            }
        }
        state
    }

    fn active_route(&self) -> Option<NavigationRoute> {
        self.lock().route.clone()
    }

    fn is_trip_loaded(&self) -> bool {
        self.lock().route.is_some()
    }

    fn clear_active_route(&self) {
        let mut progress = self.lock();
        if progress.route.take().is_some() {
            debug!("Active route cleared");
        }
        progress.next = 0;
    }

    fn subscribe(&self) -> broadcast::Receiver<TrackingEvent> {
        self.events.subscribe()
    }
}

fn build_route(
    waypoints: Vec<Waypoint>,
    destination_name: &str,
    profile: TravelProfile,
) -> NavigationRoute {
    let total = legs_length(&waypoints);
    NavigationRoute {
        destination_name: destination_name.to_string(),
        waypoints,
        total_distance_m: total,
        estimated_duration: travel_time(total, profile),
        profile: Some(profile),
    }
}

fn legs_length(waypoints: &[Waypoint]) -> f64 {
    waypoints
        .windows(2)
        .map(|w| w[0].point().distance_to(&w[1].point()))
        .sum()
}

fn travel_time(meters: f64, profile: TravelProfile) -> Duration {
    Duration::from_secs_f64((meters / profile.speed_mps()).max(0.0))
}

/// Evenly spaced positions along `route`, ending at its destination.
///
/// Used to replay a route through [`RoutingService::update_location`].
#[must_use]
pub fn sample_positions(route: &NavigationRoute, steps: usize) -> Vec<GeoPoint> {
    let steps = steps.max(1);
    let total = route.leg_length_m();
    (1..=steps)
        .filter_map(|i| point_along(&route.waypoints, total * i as f64 / steps as f64))
        .collect()
}

fn point_along(waypoints: &[Waypoint], mut distance: f64) -> Option<GeoPoint> {
    for leg in waypoints.windows(2) {
        let (a, b) = (leg[0].point(), leg[1].point());
        let length = a.distance_to(&b);
        if distance <= length && length > 0.0 {
            return Some(a.lerp(&b, distance / length));
        }
        distance -= length;
    }
    waypoints.last().map(Waypoint::point)
}

/// Closest point to `p` on the leg `a`–`b`.
///
/// Planar projection scaled by the latitude cosine; accurate for legs of a
/// few kilometers.
fn nearest_on_leg(p: &GeoPoint, a: &GeoPoint, b: &GeoPoint) -> GeoPoint {
    let cos_lat = ((a.lat + b.lat) / 2.0).to_radians().cos();

    let dx = (b.lon - a.lon) * cos_lat;
    let dy = b.lat - a.lat;
    let px = (p.lon - a.lon) * cos_lat;
    let py = p.lat - a.lat;

    let len_sq = dx * dx + dy * dy;
    if len_sq < 1e-20 {
        return *a;
    }

    let t = ((px * dx + py * dy) / len_sq).clamp(0.0, 1.0);
    a.lerp(b, t)
}
