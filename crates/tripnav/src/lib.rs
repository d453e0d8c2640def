//! `tripnav` - Turn-by-turn navigation state and HUD coordination
//!
//! This library turns a stream of navigation states from a tracking service
//! into heads-up display text and rate-limited voice announcements, and owns
//! the start / stop lifecycle of a navigation session.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod announce;
pub mod audio;
pub mod cli;
pub mod config;
pub mod console;
pub mod coordinator;
pub mod error;
pub mod format;
pub mod logging;
pub mod route;
pub mod services;
pub mod state;
pub mod tracker;
pub mod wake_lock;

pub use announce::{Announcement, AnnouncementPolicy, AnnouncementTracker};
pub use config::Config;
pub use coordinator::{Collaborators, CoordinatorEvent, HudView, NavigationCoordinator};
pub use error::{Error, Result};
pub use logging::init_logging;
pub use route::{GeoPoint, NavigationRoute, TravelProfile, Waypoint, WaypointType};
pub use services::{
    AudioAnnouncer, Clock, NavigationHost, Place, RoutingService, SystemClock, TrackingEvent,
    WakeLock,
};
pub use state::{NavigationState, NavigationStatus, StatusColor};
pub use tracker::StraightLineRouter;
