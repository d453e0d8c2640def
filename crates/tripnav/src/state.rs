//! Per-update navigation state.
//!
//! A [`NavigationState`] describes where the traveller is relative to the
//! active route. The tracking service produces a fresh one for every position
//! sample; the coordinator never mutates it.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Coarse navigation status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationStatus {
    /// No route is active.
    #[default]
    NoRoute,
    /// Following the active route.
    OnRoute,
    /// Deviated from the active route.
    OffRoute,
    /// Reached the destination.
    Arrived,
}

impl NavigationStatus {
    /// Status line shown on the HUD.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::OnRoute => "On Route",
            Self::OffRoute => "Off Route",
            Self::Arrived => "Arrived!",
            Self::NoRoute => "No Route",
        }
    }

    /// Colour of the status line.
    #[must_use]
    pub const fn color(self) -> StatusColor {
        match self {
            Self::OnRoute | Self::Arrived => StatusColor::Green,
            Self::OffRoute => StatusColor::Red,
            Self::NoRoute => StatusColor::Gray,
        }
    }

    /// Whether the off-route warning should be raised.
    #[must_use]
    pub const fn is_off_route(self) -> bool {
        matches!(self, Self::OffRoute)
    }
}

impl std::fmt::Display for NavigationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoRoute => write!(f, "no_route"),
            Self::OnRoute => write!(f, "on_route"),
            Self::OffRoute => write!(f, "off_route"),
            Self::Arrived => write!(f, "arrived"),
        }
    }
}

/// Colour hint for the HUD status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusColor {
    /// Navigation just started.
    Blue,
    /// On route or arrived.
    Green,
    /// Off route.
    Red,
    /// Idle or no route.
    #[default]
    Gray,
}

/// Position relative to the active route.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NavigationState {
    /// Remaining distance to the destination in meters.
    pub distance_to_destination_m: f64,
    /// Distance to the next waypoint in meters.
    pub distance_to_next_waypoint_m: f64,
    /// Name of the next waypoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_waypoint_name: Option<String>,
    /// Instruction for the current leg.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_instruction: Option<String>,
    /// Bearing to the destination in degrees, `[0, 360)`.
    pub bearing_to_destination: f64,
    /// Overall progress, `[0, 100]`.
    pub progress_percent: f64,
    /// Estimated time to the destination.
    pub estimated_time_remaining: Duration,
    /// Coarse status.
    pub status: NavigationStatus,
}

impl NavigationState {
    /// State reported when no route is active.
    #[must_use]
    pub fn no_route() -> Self {
        Self::default()
    }

    /// Next-waypoint name, or `""` when none was supplied.
    #[must_use]
    pub fn next_waypoint_name_or_empty(&self) -> &str {
        self.next_waypoint_name.as_deref().unwrap_or_default()
    }
}
