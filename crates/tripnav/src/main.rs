//! `tripnav` - CLI for the navigation HUD core
//!
//! This binary replays routes through a navigation session and exposes the
//! HUD formatting and configuration helpers.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio::sync::broadcast;

use tripnav::cli::{Cli, Command, ConfigCommand, FormatCommand, SimulateCommand};
use tripnav::console::{ConsoleAnnouncer, ConsoleHost, ConsoleWakeLock};
use tripnav::format::{format_distance, format_eta};
use tripnav::tracker::sample_positions;
use tripnav::{
    init_logging, Collaborators, Config, CoordinatorEvent, HudView, NavigationCoordinator, Place,
    RoutingService, StraightLineRouter, SystemClock, TravelProfile,
};

/// Page the simulated session returns to.
const SOURCE_PAGE: &str = "simulate";

/// How long to wait for the coordinator to pick up a position sample.
const FRAME_TIMEOUT: Duration = Duration::from_secs(2);

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    match cli.command {
        Command::Simulate(cmd) => {
            let config =
                Config::load_from(cli.config).context("failed to load configuration")?;
            simulate(&config, cmd).await
        }
        Command::Format(cmd) => {
            handle_format(&cmd);
            Ok(())
        }
        Command::Config(cmd) => handle_config(cli.config, cmd),
    }
}

async fn simulate(config: &Config, cmd: SimulateCommand) -> Result<()> {
    let profile = cmd
        .profile
        .map_or(config.session.default_profile, TravelProfile::from);

    let router = Arc::new(StraightLineRouter::new(config.tracking.clone()));
    let host = Arc::new(ConsoleHost::new());
    let coordinator = NavigationCoordinator::new(
        Collaborators {
            routing: router.clone(),
            audio: Arc::new(ConsoleAnnouncer::new(!cmd.json)),
            wake_lock: Arc::new(ConsoleWakeLock::default()),
            host: host.clone(),
            clock: Arc::new(SystemClock),
        },
        config,
    )?;

    host.set_location(Some(cmd.from));
    host.select_place(Some(Place {
        id: "simulated-destination".to_string(),
        name: cmd.name.clone(),
        location: cmd.to,
    }));

    let mut events = coordinator.subscribe();
    let mut frames = coordinator.watch_hud();

    let route = if cmd.vias.is_empty() {
        coordinator
            .navigate_to_selected_place(Some(profile), Some(SOURCE_PAGE.to_string()))
            .await?
    } else {
        let route = router.calculate_route(cmd.from, &cmd.vias, cmd.to, &cmd.name, profile)?;
        coordinator.start_with_source(route.clone(), Some(SOURCE_PAGE.to_string()));
        route
    };
    print_frame(&frames.borrow_and_update(), cmd.json)?;

    for position in sample_positions(&route, cmd.steps) {
        if !coordinator.is_navigating() {
            break;
        }
        router.update_location(position);

        match tokio::time::timeout(FRAME_TIMEOUT, frames.changed()).await {
            Ok(Ok(())) => {}
            Ok(Err(_)) => break,
            Err(_) if !coordinator.is_navigating() => break,
            Err(_) => bail!("no HUD update for position {position}"),
        }
        let frame = frames.borrow_and_update().clone();
        print_frame(&frame, cmd.json)?;

        if cmd.interval_ms > 0 {
            tokio::time::sleep(Duration::from_millis(cmd.interval_ms)).await;
        }
    }

    coordinator.flush_announcements().await;
    if coordinator.is_navigating() {
        coordinator.stop();
    }

    if !cmd.json {
        print_outcome(&mut events);
    }
    Ok(())
}

fn print_frame(hud: &HudView, json: bool) -> Result<()> {
    if !hud.is_navigating {
        return Ok(());
    }
    if json {
        println!("{}", serde_json::to_string(hud)?);
        return Ok(());
    }

    let next = if hud.next_waypoint_name.is_empty() {
        String::new()
    } else {
        format!(
            " | next: {} in {}",
            hud.next_waypoint_name, hud.next_waypoint_distance_text
        )
    };
    println!(
        "[{:>5.1}%] {:<10} {} to {}{} | {} | ETA {}",
        hud.progress_percent,
        hud.status_text,
        hud.distance_text,
        hud.destination_name,
        next,
        hud.instruction_text,
        hud.eta_text
    );
    Ok(())
}

fn print_outcome(events: &mut broadcast::Receiver<CoordinatorEvent>) {
    let mut arrived = None;
    let mut return_to = None;
    while let Ok(event) = events.try_recv() {
        match event {
            CoordinatorEvent::Arrived { destination } => arrived = Some(destination),
            CoordinatorEvent::Stopped { return_to: page } => return_to = page,
            _ => {}
        }
    }

    match arrived {
        Some(destination) => println!("Arrived at {destination}."),
        None => println!("Navigation ended before arrival."),
    }
    if let Some(page) = return_to {
        println!("Returning to {page}.");
    }
}

fn handle_format(cmd: &FormatCommand) {
    match cmd {
        FormatCommand::Distance { meters } => println!("{}", format_distance(*meters)),
        FormatCommand::Eta { seconds } => {
            println!("{}", format_eta(Duration::from_secs(*seconds)));
        }
    }
}

fn handle_config(config_path: Option<PathBuf>, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            let config = Config::load_from(config_path)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                let a = &config.announcements;
                let s = &config.session;
                let t = &config.tracking;
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Announcements]");
                println!("  Approach radius:    {}", format_distance(a.approach_radius_m));
                println!(
                    "  Minimum distance:   {}",
                    format_distance(a.approach_min_distance_m)
                );
                println!("  Reminder interval:  {}s", a.reminder_interval_secs);
                println!("  Announce start:     {}", a.announce_start);
                println!();
                println!("[Session]");
                println!("  Keep screen on:     {}", s.keep_screen_on);
                println!("  Start expanded:     {}", s.start_expanded);
                println!("  Default profile:    {}", s.default_profile);
                println!();
                println!("[Tracking]");
                println!("  Arrival radius:     {}", format_distance(t.arrival_radius_m));
                println!(
                    "  Waypoint radius:    {}",
                    format_distance(t.waypoint_reached_radius_m)
                );
                println!(
                    "  Off-route after:    {}",
                    format_distance(t.off_route_threshold_m)
                );
                println!("  Auto reroute:       {}", t.auto_reroute);
            }
        }
        ConfigCommand::Path => {
            let path = config_path.unwrap_or_else(Config::default_config_path);
            println!("{}", path.display());
        }
        ConfigCommand::Validate { file } => {
            let path = file
                .or(config_path)
                .unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => bail!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
