//! Command-line interface for tripnav.
//!
//! This module provides the CLI structure for the `tripnav` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{ConfigCommand, FormatCommand, ProfileArg, SimulateCommand};

use crate::logging::Verbosity;

/// tripnav - Turn-by-turn navigation HUD
///
/// Runs navigation sessions against an in-process straight-line router and
/// prints what the heads-up display and voice guidance would show.
#[derive(Debug, Parser)]
#[command(name = "tripnav")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Replay a route through a full navigation session
    Simulate(SimulateCommand),

    /// Format distances and travel times the way the HUD does
    #[command(subcommand)]
    Format(FormatCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.verbose)
    }
}
