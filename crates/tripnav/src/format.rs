//! HUD text formatting.
//!
//! Pure helpers turning raw navigation numbers into display strings.

use std::time::Duration;

/// Instruction shown when the tracking service supplies none.
pub const DEFAULT_INSTRUCTION: &str = "Continue to destination";

/// Format a distance: kilometers with one decimal from 1000 m up, whole meters below.
#[must_use]
pub fn format_distance(meters: f64) -> String {
    let meters = meters.max(0.0);
    if meters >= 1000.0 {
        // Round in tenths of a kilometer first so halves go up (15450 -> 15.5).
        let km = (meters / 100.0).round() / 10.0;
        format!("{km:.1} km")
    } else {
        format!("{:.0} m", meters.round())
    }
}

/// Format a remaining travel time.
#[must_use]
pub fn format_eta(remaining: Duration) -> String {
    let secs = remaining.as_secs();
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;

    if hours >= 1 {
        format!("{hours}h {minutes}m")
    } else if minutes >= 1 {
        format!("{minutes} min")
    } else {
        "< 1 min".to_string()
    }
}

/// Instruction text with the default fallback.
#[must_use]
pub fn instruction_text(instruction: Option<&str>) -> String {
    match instruction {
        Some(text) if !text.trim().is_empty() => text.to_string(),
        _ => DEFAULT_INSTRUCTION.to_string(),
    }
}

/// Compass point (8-wind) for a bearing in degrees.
#[must_use]
pub fn compass_point(bearing: f64) -> &'static str {
    const POINTS: [&str; 8] = [
        "north",
        "northeast",
        "east",
        "southeast",
        "south",
        "southwest",
        "west",
        "northwest",
    ];
    let index = ((bearing.rem_euclid(360.0) + 22.5) / 45.0) as usize % POINTS.len();
    POINTS[index]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_distance_meters() {
        assert_eq!(format_distance(950.0), "950 m");
        assert_eq!(format_distance(0.0), "0 m");
        assert_eq!(format_distance(349.6), "350 m");
    }

    #[test]
    fn test_format_distance_kilometers() {
        assert_eq!(format_distance(1000.0), "1.0 km");
        assert_eq!(format_distance(1234.0), "1.2 km");
        assert_eq!(format_distance(15_450.0), "15.5 km");
    }

    #[test]
    fn test_format_distance_negative_clamps() {
        assert_eq!(format_distance(-5.0), "0 m");
    }

    #[test]
    fn test_format_eta_under_a_minute() {
        assert_eq!(format_eta(Duration::from_secs(45)), "< 1 min");
        assert_eq!(format_eta(Duration::ZERO), "< 1 min");
    }

    #[test]
    fn test_format_eta_minutes_truncate() {
        assert_eq!(format_eta(Duration::from_secs(5 * 60 + 30)), "5 min");
        assert_eq!(format_eta(Duration::from_secs(59 * 60 + 59)), "59 min");
    }

    #[test]
    fn test_format_eta_hours() {
        assert_eq!(format_eta(Duration::from_secs(3600 + 23 * 60)), "1h 23m");
        assert_eq!(format_eta(Duration::from_secs(2 * 3600)), "2h 0m");
    }

    #[test]
    fn test_instruction_fallback() {
        assert_eq!(instruction_text(None), DEFAULT_INSTRUCTION);
        assert_eq!(instruction_text(Some("  ")), DEFAULT_INSTRUCTION);
        assert_eq!(instruction_text(Some("Turn left")), "Turn left");
    }

    #[test]
    fn test_compass_point() {
        assert_eq!(compass_point(0.0), "north");
        assert_eq!(compass_point(359.0), "north");
        assert_eq!(compass_point(90.0), "east");
        assert_eq!(compass_point(200.0), "south");
        assert_eq!(compass_point(300.0), "northwest");
    }
}
