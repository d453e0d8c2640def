//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::route::{GeoPoint, TravelProfile, Waypoint, WaypointType};

/// Simulate command arguments.
#[derive(Debug, Args)]
pub struct SimulateCommand {
    /// Starting position
    #[arg(long, value_name = "LAT,LON", allow_hyphen_values = true)]
    pub from: GeoPoint,

    /// Destination position
    #[arg(long, value_name = "LAT,LON", allow_hyphen_values = true)]
    pub to: GeoPoint,

    /// Destination name
    #[arg(short, long, default_value = "Destination")]
    pub name: String,

    /// Travel profile (defaults to the configured one)
    #[arg(short, long, value_enum)]
    pub profile: Option<ProfileArg>,

    /// Number of position samples between start and destination
    #[arg(short, long, default_value = "20")]
    pub steps: usize,

    /// Intermediate waypoint, repeatable
    #[arg(
        long = "via",
        value_name = "LAT,LON[:NAME]",
        value_parser = parse_via,
        allow_hyphen_values = true
    )]
    pub vias: Vec<Waypoint>,

    /// Pause between samples in milliseconds
    #[arg(long, default_value = "0")]
    pub interval_ms: u64,

    /// Print HUD frames as JSON lines
    #[arg(short, long)]
    pub json: bool,
}

/// Formatting helpers.
#[derive(Debug, Subcommand)]
pub enum FormatCommand {
    /// Format a distance in meters
    Distance {
        /// Distance in meters
        meters: f64,
    },

    /// Format a remaining travel time in seconds
    Eta {
        /// Remaining time in seconds
        seconds: u64,
    },
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        file: Option<PathBuf>,
    },
}

/// Travel profile argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProfileArg {
    /// On foot
    Walking,
    /// By bicycle
    Cycling,
    /// By car
    Driving,
}

impl From<ProfileArg> for TravelProfile {
    fn from(arg: ProfileArg) -> Self {
        match arg {
            ProfileArg::Walking => Self::Walking,
            ProfileArg::Cycling => Self::Cycling,
            ProfileArg::Driving => Self::Driving,
        }
    }
}

/// Parse `LAT,LON` or `LAT,LON:NAME` into a via waypoint.
fn parse_via(s: &str) -> Result<Waypoint, String> {
    let (coords, name) = match s.split_once(':') {
        Some((coords, name)) => (coords, Some(name.trim())),
        None => (s, None),
    };
    let point: GeoPoint = coords.parse()?;
    let waypoint = Waypoint::new(point, WaypointType::Via);
    Ok(match name {
        Some(name) if !name.is_empty() => waypoint.with_name(name),
        _ => waypoint,
    })
}
