//! Configuration management for tripnav.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::route::TravelProfile;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default config directory name.
const CONFIG_DIR_NAME: &str = "tripnav";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `TRIPNAV_`)
/// 2. TOML config file at `~/.config/tripnav/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Voice announcement thresholds.
    pub announcements: AnnouncementConfig,
    /// Navigation session behaviour.
    pub session: SessionConfig,
    /// Reference tracker tuning.
    pub tracking: TrackingConfig,
}

/// Voice announcement configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnouncementConfig {
    /// Announce an approaching waypoint within this distance (meters).
    pub approach_radius_m: f64,
    /// Do not announce a waypoint at or below this distance (meters).
    pub approach_min_distance_m: f64,
    /// Seconds before the same waypoint may be announced again.
    pub reminder_interval_secs: u64,
    /// Speak when navigation starts.
    pub announce_start: bool,
}

/// Navigation session configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Keep the screen on while navigating.
    pub keep_screen_on: bool,
    /// Open the HUD in expanded mode.
    pub start_expanded: bool,
    /// Profile used when the user does not pick one.
    pub default_profile: TravelProfile,
}

/// Reference tracker configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Distance to the destination that counts as arrival (meters).
    pub arrival_radius_m: f64,
    /// Distance at which a via waypoint counts as passed (meters).
    pub waypoint_reached_radius_m: f64,
    /// Cross-track distance that counts as off route (meters).
    pub off_route_threshold_m: f64,
    /// Recompute the route automatically when off route.
    pub auto_reroute: bool,
    /// Capacity of the tracking event broadcast.
    pub event_capacity: usize,
}

impl Default for AnnouncementConfig {
    fn default() -> Self {
        Self {
            approach_radius_m: 150.0,
            approach_min_distance_m: 20.0,
            reminder_interval_secs: 30,
            announce_start: true,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            keep_screen_on: true,
            start_expanded: true,
            default_profile: TravelProfile::Walking,
        }
    }
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            arrival_radius_m: 25.0,
            waypoint_reached_radius_m: 20.0,
            off_route_threshold_m: 60.0,
            auto_reroute: true,
            event_capacity: 64,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file).nested())
            .merge(Env::prefixed("TRIPNAV_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        let a = &self.announcements;
        if !(a.approach_min_distance_m >= 0.0 && a.approach_min_distance_m < a.approach_radius_m) {
            return Err(Error::config_validation(format!(
                "approach_min_distance_m ({}) must be non-negative and below approach_radius_m ({})",
                a.approach_min_distance_m, a.approach_radius_m
            )));
        }

        if a.reminder_interval_secs == 0 {
            return Err(Error::config_validation(
                "reminder_interval_secs must be greater than 0",
            ));
        }

        let t = &self.tracking;
        for (name, value) in [
            ("arrival_radius_m", t.arrival_radius_m),
            ("waypoint_reached_radius_m", t.waypoint_reached_radius_m),
            ("off_route_threshold_m", t.off_route_threshold_m),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(Error::config_validation(format!(
                    "{name} must be greater than 0 (got {value})"
                )));
            }
        }

        if t.event_capacity == 0 {
            return Err(Error::config_validation(
                "event_capacity must be greater than 0",
            ));
        }

        Ok(())
    }

    /// Get the reminder interval as a Duration.
    #[must_use]
    pub fn reminder_interval(&self) -> Duration {
        Duration::from_secs(self.announcements.reminder_interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert!(config.announcements.announce_start);
        assert!(config.session.keep_screen_on);
        assert!(config.session.start_expanded);
        assert!(config.tracking.auto_reroute);
        assert_eq!(config.session.default_profile, TravelProfile::Walking);
    }

    #[test]
    fn test_default_announcement_thresholds() {
        let a = AnnouncementConfig::default();
        assert!((a.approach_radius_m - 150.0).abs() < f64::EPSILON);
        assert!((a.approach_min_distance_m - 20.0).abs() < f64::EPSILON);
        assert_eq!(a.reminder_interval_secs, 30);
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_inverted_band() {
        let mut config = Config::default();
        config.announcements.approach_min_distance_m = 200.0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("approach_min_distance_m"));
    }

    #[test]
    fn test_validate_negative_min_distance() {
        let mut config = Config::default();
        config.announcements.approach_min_distance_m = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_zero_reminder_interval() {
        let mut config = Config::default();
        config.announcements.reminder_interval_secs = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("reminder_interval_secs"));
    }

    #[test]
    fn test_validate_zero_tracking_radius() {
        let mut config = Config::default();
        config.tracking.arrival_radius_m = 0.0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("arrival_radius_m"));
    }

    #[test]
    fn test_validate_zero_event_capacity() {
        let mut config = Config::default();
        config.tracking.event_capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_reminder_interval() {
        assert_eq!(Config::default().reminder_interval(), Duration::from_secs(30));
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.to_string_lossy().contains("tripnav"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_load_nonexistent_config() {
        // Loading from a nonexistent path should work (uses defaults)
        let config = Config::load_from(Some(PathBuf::from("/nonexistent/config.toml"))).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_from_toml_file() {
        let path = std::env::temp_dir().join(format!("tripnav_config_{}.toml", std::process::id()));
        std::fs::write(
            &path,
            "[announcements]\napproach_radius_m = 200.0\n\n[session]\ndefault_profile = \"cycling\"\n",
        )
        .unwrap();

        let config = Config::load_from(Some(path.clone())).unwrap();
        assert!((config.announcements.approach_radius_m - 200.0).abs() < f64::EPSILON);
        assert_eq!(config.session.default_profile, TravelProfile::Cycling);
        assert_eq!(config.tracking, TrackingConfig::default());

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let path =
            std::env::temp_dir().join(format!("tripnav_bad_config_{}.toml", std::process::id()));
        std::fs::write(&path, "[announcements]\nreminder_interval_secs = 0\n").unwrap();

        let result = Config::load_from(Some(path.clone()));
        assert!(matches!(result, Err(Error::ConfigValidation { .. })));

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_config_serialize() {
        let json = serde_json::to_string(&Config::default()).unwrap();
        assert!(json.contains("approach_radius_m"));
        assert!(json.contains("\"walking\""));
    }

    #[test]
    fn test_tracking_config_deserialize_partial() {
        let json = r#"{"arrival_radius_m": 10.0}"#;
        let tracking: TrackingConfig = serde_json::from_str(json).unwrap();
        assert!((tracking.arrival_radius_m - 10.0).abs() < f64::EPSILON);
        assert_eq!(tracking.event_capacity, 64);
    }
}
