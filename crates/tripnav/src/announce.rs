//! Voice announcement policy.
//!
//! The decision is a pure function over the incoming [`NavigationState`] and
//! an [`AnnouncementTracker`] value. Each pass returns a replacement tracker
//! instead of mutating fields in place, so resetting a session is just
//! assigning [`AnnouncementTracker::default`].

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::AnnouncementConfig;
use crate::route::TravelProfile;
use crate::state::{NavigationState, NavigationStatus};

/// A spoken announcement category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Announcement {
    /// Navigation towards a destination has started.
    NavigationStarted {
        /// Destination name.
        destination: String,
        /// Total route distance in meters.
        total_distance_m: f64,
    },
    /// The traveller has left the route.
    OffRoute,
    /// The destination has been reached.
    RouteComplete {
        /// Destination name.
        destination: String,
    },
    /// A named waypoint is coming up.
    ApproachingWaypoint {
        /// Waypoint name.
        name: String,
        /// Distance to the waypoint in meters.
        distance_m: f64,
        /// Profile of the active route, if known.
        profile: Option<TravelProfile>,
    },
    /// A new route has been computed mid-session.
    Rerouting,
}

impl Announcement {
    /// Short category name for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::NavigationStarted { .. } => "navigation_started",
            Self::OffRoute => "off_route",
            Self::RouteComplete { .. } => "route_complete",
            Self::ApproachingWaypoint { .. } => "approaching_waypoint",
            Self::Rerouting => "rerouting",
        }
    }
}

/// Thresholds for the approaching-waypoint announcement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnnouncementPolicy {
    /// Announce once the next waypoint is this close (inclusive).
    pub approach_radius_m: f64,
    /// Never announce at or below this distance.
    pub min_distance_m: f64,
    /// Repeat the same waypoint after this long.
    pub reminder_interval: Duration,
}

impl Default for AnnouncementPolicy {
    fn default() -> Self {
        Self {
            approach_radius_m: 150.0,
            min_distance_m: 20.0,
            reminder_interval: Duration::from_secs(30),
        }
    }
}

impl From<&AnnouncementConfig> for AnnouncementPolicy {
    fn from(config: &AnnouncementConfig) -> Self {
        Self {
            approach_radius_m: config.approach_radius_m,
            min_distance_m: config.approach_min_distance_m,
            reminder_interval: Duration::from_secs(config.reminder_interval_secs),
        }
    }
}

impl AnnouncementPolicy {
    /// Whether `distance_m` lies in the announcement band `(min, radius]`.
    #[must_use]
    pub fn in_band(&self, distance_m: f64) -> bool {
        distance_m <= self.approach_radius_m && distance_m > self.min_distance_m
    }
}

/// What the coordinator last announced.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AnnouncementTracker {
    /// Last status evaluated for a status-change announcement.
    pub last_status: NavigationStatus,
    /// Last waypoint announced as approaching.
    pub last_waypoint: Option<String>,
    /// When the last waypoint announcement fired; `None` means never.
    pub last_waypoint_at: Option<DateTime<Utc>>,
}

/// Outcome of one decision pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    /// Tracker to store for the next pass.
    pub tracker: AnnouncementTracker,
    /// Announcements to play, in order.
    pub announcements: Vec<Announcement>,
}

impl AnnouncementTracker {
    /// Decide which announcements `state` warrants.
    ///
    /// `destination` and `next_waypoint` are the HUD's current presentation
    /// values; `profile` is forwarded to waypoint announcements.
    #[must_use]
    pub fn evaluate(
        &self,
        state: &NavigationState,
        destination: &str,
        next_waypoint: &str,
        profile: Option<TravelProfile>,
        policy: &AnnouncementPolicy,
        now: DateTime<Utc>,
    ) -> Decision {
        let mut next = self.clone();
        let mut announcements = Vec::new();

        if state.status != self.last_status {
            match state.status {
                NavigationStatus::OffRoute => announcements.push(Announcement::OffRoute),
                NavigationStatus::Arrived => announcements.push(Announcement::RouteComplete {
                    destination: destination.to_string(),
                }),
                NavigationStatus::OnRoute | NavigationStatus::NoRoute => {}
            }
            next.last_status = state.status;
        }

        let distance = state.distance_to_next_waypoint_m;
        if state.status == NavigationStatus::OnRoute
            && !next_waypoint.is_empty()
            && policy.in_band(distance)
            && (self.last_waypoint.as_deref() != Some(next_waypoint)
                || self.reminder_due(policy, now))
        {
            announcements.push(Announcement::ApproachingWaypoint {
                name: next_waypoint.to_string(),
                distance_m: distance,
                profile,
            });
            next.last_waypoint = Some(next_waypoint.to_string());
            next.last_waypoint_at = Some(now);
        }

        Decision {
            tracker: next,
            announcements,
        }
    }

    fn reminder_due(&self, policy: &AnnouncementPolicy, now: DateTime<Utc>) -> bool {
        let Some(last) = self.last_waypoint_at else {
            return true;
        };
        // Clock going backwards counts as not elapsed.
        now.signed_duration_since(last)
            .to_std()
            .is_ok_and(|elapsed| elapsed >= policy.reminder_interval)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;

    use super::*;

    fn on_route(name: &str, distance: f64) -> NavigationState {
        NavigationState {
            distance_to_destination_m: 2_000.0,
            distance_to_next_waypoint_m: distance,
            next_waypoint_name: Some(name.to_string()),
            status: NavigationStatus::OnRoute,
            ..NavigationState::default()
        }
    }

    fn with_status(status: NavigationStatus) -> NavigationState {
        NavigationState {
            status,
            ..NavigationState::default()
        }
    }

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-10-19T08:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    /// Feed states in order and collect every announcement.
    fn run(states: &[(NavigationState, DateTime<Utc>)]) -> Vec<Announcement> {
        let policy = AnnouncementPolicy::default();
        let mut tracker = AnnouncementTracker::default();
        let mut all = Vec::new();
        for (state, now) in states {
            let decision = tracker.evaluate(
                state,
                "Museum",
                state.next_waypoint_name_or_empty(),
                None,
                &policy,
                *now,
            );
            tracker = decision.tracker;
            all.extend(decision.announcements);
        }
        all
    }

    #[test]
    fn test_off_route_announced_once_per_transition() {
        let now = t0();
        let states: Vec<_> = [
            NavigationStatus::OnRoute,
            NavigationStatus::OffRoute,
            NavigationStatus::OffRoute,
            NavigationStatus::OnRoute,
            NavigationStatus::OffRoute,
            NavigationStatus::OffRoute,
        ]
        .into_iter()
        .map(|s| (with_status(s), now))
        .collect();

        let announced = run(&states);
        assert_eq!(announced, vec![Announcement::OffRoute, Announcement::OffRoute]);
    }

    #[test]
    fn test_arrival_announces_destination() {
        let announced = run(&[(with_status(NavigationStatus::Arrived), t0())]);
        assert_eq!(
            announced,
            vec![Announcement::RouteComplete {
                destination: "Museum".to_string()
            }]
        );
    }

    #[test]
    fn test_status_recorded_even_without_announcement() {
        let policy = AnnouncementPolicy::default();
        let decision = AnnouncementTracker::default().evaluate(
            &with_status(NavigationStatus::OnRoute),
            "Museum",
            "",
            None,
            &policy,
            t0(),
        );
        assert!(decision.announcements.is_empty());
        assert_eq!(decision.tracker.last_status, NavigationStatus::OnRoute);
    }

    #[test]
    fn test_approach_fires_once_inside_band() {
        let now = t0();
        let states: Vec<_> = [200.0, 140.0, 100.0, 60.0, 25.0, 15.0]
            .into_iter()
            .enumerate()
            .map(|(i, d)| (on_route("Cafe", d), now + TimeDelta::seconds(i as i64 * 2)))
            .collect();

        let announced = run(&states);
        assert_eq!(
            announced,
            vec![Announcement::ApproachingWaypoint {
                name: "Cafe".to_string(),
                distance_m: 140.0,
                profile: None,
            }]
        );
    }

    #[test]
    fn test_band_edges() {
        let policy = AnnouncementPolicy::default();
        assert!(policy.in_band(150.0));
        assert!(!policy.in_band(150.1));
        assert!(policy.in_band(20.1));
        assert!(!policy.in_band(20.0));
    }

    #[test]
    fn test_no_announcement_at_or_below_min_distance_even_after_interval() {
        let now = t0();
        let announced = run(&[
            (on_route("Cafe", 100.0), now),
            (on_route("Cafe", 15.0), now + TimeDelta::seconds(120)),
        ]);
        assert_eq!(announced.len(), 1);
    }

    #[test]
    fn test_waypoint_change_announces_immediately() {
        let now = t0();
        let announced = run(&[
            (on_route("Cafe", 100.0), now),
            (on_route("Museum", 90.0), now + TimeDelta::seconds(5)),
        ]);
        let names: Vec<_> = announced
            .iter()
            .filter_map(|a| match a {
                Announcement::ApproachingWaypoint { name, .. } => Some(name.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(names, vec!["Cafe", "Museum"]);
    }

    #[test]
    fn test_same_waypoint_reminder_after_interval() {
        let now = t0();
        let announced = run(&[
            (on_route("Cafe", 120.0), now),
            (on_route("Cafe", 110.0), now + TimeDelta::seconds(29)),
            (on_route("Cafe", 100.0), now + TimeDelta::seconds(30)),
        ]);
        assert_eq!(announced.len(), 2);
    }

    #[test]
    fn test_clock_going_backwards_does_not_remind() {
        let now = t0();
        let announced = run(&[
            (on_route("Cafe", 120.0), now),
            (on_route("Cafe", 110.0), now - TimeDelta::seconds(600)),
        ]);
        assert_eq!(announced.len(), 1);
    }

    #[test]
    fn test_no_approach_while_off_route() {
        let mut state = on_route("Cafe", 100.0);
        state.status = NavigationStatus::OffRoute;
        let announced = run(&[(state, t0())]);
        assert_eq!(announced, vec![Announcement::OffRoute]);
    }

    #[test]
    fn test_return_to_route_announces_waypoint_only() {
        let policy = AnnouncementPolicy::default();
        let tracker = AnnouncementTracker {
            last_status: NavigationStatus::OffRoute,
            ..AnnouncementTracker::default()
        };
        let state = on_route("Cafe", 80.0);
        let decision = tracker.evaluate(
            &state,
            "Museum",
            "Cafe",
            Some(TravelProfile::Cycling),
            &policy,
            t0(),
        );
        assert_eq!(
            decision.announcements,
            vec![Announcement::ApproachingWaypoint {
                name: "Cafe".to_string(),
                distance_m: 80.0,
                profile: Some(TravelProfile::Cycling),
            }]
        );
        assert_eq!(decision.tracker.last_status, NavigationStatus::OnRoute);
        assert_eq!(decision.tracker.last_waypoint.as_deref(), Some("Cafe"));
        assert_eq!(decision.tracker.last_waypoint_at, Some(t0()));
    }

    #[test]
    fn test_policy_from_config() {
        let config = AnnouncementConfig::default();
        let policy = AnnouncementPolicy::from(&config);
        assert_eq!(policy, AnnouncementPolicy::default());
    }

    #[test]
    fn test_announcement_kind() {
        assert_eq!(Announcement::OffRoute.kind(), "off_route");
        assert_eq!(Announcement::Rerouting.kind(), "rerouting");
    }
}
