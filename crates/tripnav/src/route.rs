//! Route types consumed by the navigation core.
//!
//! A [`NavigationRoute`] is produced by a routing service and never changes
//! for the lifetime of one navigation session. All coordinates are WGS84
//! degrees.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Earth radius in meters (WGS84 mean).
const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// A geographic position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
}

impl GeoPoint {
    /// Create a new point.
    #[must_use]
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Check that the point lies within valid latitude/longitude ranges.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }

    /// Haversine distance to another point in meters.
    #[must_use]
    pub fn distance_to(&self, other: &GeoPoint) -> f64 {
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();
        let dlat = (other.lat - self.lat).to_radians();
        let dlon = (other.lon - self.lon).to_radians();

        let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);

        2.0 * EARTH_RADIUS_M * h.sqrt().asin()
    }

    /// Initial great-circle bearing to another point, in `[0, 360)` degrees.
    #[must_use]
    pub fn bearing_to(&self, other: &GeoPoint) -> f64 {
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();
        let dlon = (other.lon - self.lon).to_radians();

        let y = dlon.sin() * lat2.cos();
        let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();

        y.atan2(x).to_degrees().rem_euclid(360.0)
    }

    /// Point at fraction `t` along the straight line from `self` to `other`.
    ///
    /// Planar interpolation; good enough for the short legs a simulation walks.
    #[must_use]
    pub fn lerp(&self, other: &GeoPoint, t: f64) -> GeoPoint {
        GeoPoint {
            lat: self.lat + t * (other.lat - self.lat),
            lon: self.lon + t * (other.lon - self.lon),
        }
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.5},{:.5}", self.lat, self.lon)
    }
}

impl std::str::FromStr for GeoPoint {
    type Err = String;

    /// Parse `"LAT,LON"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lat, lon) = s
            .split_once(',')
            .ok_or_else(|| format!("expected LAT,LON but got '{s}'"))?;
        let lat: f64 = lat
            .trim()
            .parse()
            .map_err(|e| format!("invalid latitude '{lat}': {e}"))?;
        let lon: f64 = lon
            .trim()
            .parse()
            .map_err(|e| format!("invalid longitude '{lon}': {e}"))?;
        let point = GeoPoint::new(lat, lon);
        if point.is_valid() {
            Ok(point)
        } else {
            Err(format!("coordinate out of range: {s}"))
        }
    }
}

/// Travel profile passed to the routing service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TravelProfile {
    /// On foot.
    #[default]
    Walking,
    /// By bicycle.
    Cycling,
    /// By car.
    Driving,
}

impl TravelProfile {
    /// Typical travel speed in meters per second.
    #[must_use]
    pub const fn speed_mps(self) -> f64 {
        match self {
            Self::Walking => 1.4,
            Self::Cycling => 4.5,
            Self::Driving => 13.9,
        }
    }
}

impl std::fmt::Display for TravelProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Walking => write!(f, "walking"),
            Self::Cycling => write!(f, "cycling"),
            Self::Driving => write!(f, "driving"),
        }
    }
}

/// Role of a waypoint within a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaypointType {
    /// First point of the route.
    Start,
    /// Intermediate stop.
    Via,
    /// Final point of the route.
    Destination,
}

/// A point along a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
    /// Display name, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Role of this waypoint.
    pub waypoint_type: WaypointType,
    /// Identifier of the place this waypoint belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place_id: Option<String>,
}

impl Waypoint {
    /// Create an unnamed waypoint.
    #[must_use]
    pub fn new(point: GeoPoint, waypoint_type: WaypointType) -> Self {
        Self {
            lat: point.lat,
            lon: point.lon,
            name: None,
            waypoint_type,
            place_id: None,
        }
    }

    /// Attach a display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Attach a place identifier.
    #[must_use]
    pub fn with_place_id(mut self, place_id: impl Into<String>) -> Self {
        self.place_id = Some(place_id.into());
        self
    }

    /// Position of this waypoint.
    #[must_use]
    pub const fn point(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lon)
    }
}

/// A computed route, read-only for the navigation core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationRoute {
    /// Name of the destination.
    pub destination_name: String,
    /// Ordered waypoints, start first.
    pub waypoints: Vec<Waypoint>,
    /// Total distance in meters.
    pub total_distance_m: f64,
    /// Estimated travel time.
    pub estimated_duration: Duration,
    /// Profile the route was computed for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<TravelProfile>,
}

impl NavigationRoute {
    /// The destination waypoint, if the route has one.
    #[must_use]
    pub fn destination(&self) -> Option<&Waypoint> {
        self.waypoints.last()
    }

    /// Sum of great-circle leg lengths between consecutive waypoints.
    #[must_use]
    pub fn leg_length_m(&self) -> f64 {
        self.waypoints
            .windows(2)
            .map(|w| w[0].point().distance_to(&w[1].point()))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance_same_point() {
        let p = GeoPoint::new(48.2082, 16.3738);
        assert!(p.distance_to(&p).abs() < 0.01);
    }

    #[test]
    fn test_distance_known() {
        // Vienna to Bratislava is roughly 55 km
        let vienna = GeoPoint::new(48.2082, 16.3738);
        let bratislava = GeoPoint::new(48.1486, 17.1077);
        let dist = vienna.distance_to(&bratislava);
        assert!(dist > 50_000.0 && dist < 60_000.0, "got {dist:.0} m");
    }

    #[test]
    fn test_bearing_cardinal_directions() {
        let origin = GeoPoint::new(0.0, 0.0);
        assert!((origin.bearing_to(&GeoPoint::new(1.0, 0.0)) - 0.0).abs() < 0.01);
        assert!((origin.bearing_to(&GeoPoint::new(0.0, 1.0)) - 90.0).abs() < 0.01);
        assert!((origin.bearing_to(&GeoPoint::new(-1.0, 0.0)) - 180.0).abs() < 0.01);
        assert!((origin.bearing_to(&GeoPoint::new(0.0, -1.0)) - 270.0).abs() < 0.01);
    }

    #[test]
    fn test_parse_point() {
        let p: GeoPoint = "48.2, 16.37".parse().unwrap();
        assert!((p.lat - 48.2).abs() < f64::EPSILON);
        assert!((p.lon - 16.37).abs() < f64::EPSILON);

        assert!("48.2".parse::<GeoPoint>().is_err());
        assert!("abc,1".parse::<GeoPoint>().is_err());
        assert!("91,0".parse::<GeoPoint>().is_err());
    }

    #[test]
    fn test_profile_display_and_speed() {
        assert_eq!(TravelProfile::Walking.to_string(), "walking");
        assert_eq!(TravelProfile::Driving.to_string(), "driving");
        assert!(TravelProfile::Driving.speed_mps() > TravelProfile::Walking.speed_mps());
    }

    #[test]
    fn test_route_destination_and_legs() {
        let route = NavigationRoute {
            destination_name: "Museum".to_string(),
            waypoints: vec![
                Waypoint::new(GeoPoint::new(0.0, 0.0), WaypointType::Start),
                Waypoint::new(GeoPoint::new(0.0, 0.01), WaypointType::Via).with_name("Cafe"),
                Waypoint::new(GeoPoint::new(0.0, 0.02), WaypointType::Destination)
                    .with_name("Museum")
                    .with_place_id("place-7"),
            ],
            total_distance_m: 2_224.0,
            estimated_duration: Duration::from_secs(1_600),
            profile: Some(TravelProfile::Walking),
        };

        let dest = route.destination().unwrap();
        assert_eq!(dest.place_id.as_deref(), Some("place-7"));
        let legs = route.leg_length_m();
        assert!(legs > 2_200.0 && legs < 2_250.0, "got {legs:.0} m");
    }

    #[test]
    fn test_empty_route_has_no_destination() {
        let route = NavigationRoute {
            destination_name: String::new(),
            waypoints: Vec::new(),
            total_distance_m: 0.0,
            estimated_duration: Duration::ZERO,
            profile: None,
        };
        assert!(route.destination().is_none());
        assert!(route.leg_length_m().abs() < f64::EPSILON);
    }
}
