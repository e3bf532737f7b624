use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Geography
// ---------------------------------------------------------------------------

/// WGS84 coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lng)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub min_lng: f64,
    pub max_lat: f64,
    pub max_lng: f64,
}

impl BoundingBox {
    /// Inclusive on all four edges.
    pub fn contains(&self, lat: f64, lng: f64) -> bool {
        lat >= self.min_lat && lat <= self.max_lat && lng >= self.min_lng && lng <= self.max_lng
    }
}

// ---------------------------------------------------------------------------
// Orientation
// ---------------------------------------------------------------------------

/// Cardinal direction a venue's façade / outdoor seating faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[serde(alias = "nord")]
    North,
    #[serde(alias = "øst", alias = "oest")]
    East,
    #[serde(alias = "syd")]
    South,
    #[serde(alias = "vest")]
    West,
}

impl Orientation {
    /// Compass bearing of the direction faced: north=0°, east=90°, south=180°, west=270°.
    pub fn reference_bearing(self) -> f64 {
        match self {
            Orientation::North => 0.0,
            Orientation::East => 90.0,
            Orientation::South => 180.0,
            Orientation::West => 270.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown orientation '{0}' (expected north/east/south/west)")]
pub struct UnknownOrientation(pub String);

impl FromStr for Orientation {
    type Err = UnknownOrientation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "north" | "nord" | "n" => Ok(Orientation::North),
            "east" | "øst" | "oest" | "e" => Ok(Orientation::East),
            "south" | "syd" | "s" => Ok(Orientation::South),
            "west" | "vest" | "w" => Ok(Orientation::West),
            _ => Err(UnknownOrientation(s.to_string())),
        }
    }
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Orientation::North => "north",
            Orientation::East => "east",
            Orientation::South => "south",
            Orientation::West => "west",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------------------
// Venue
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Venue {
    pub id: u64,
    pub name: String,
    pub city: String,
    pub lat: f64,
    pub lng: f64,
    pub orientation: Orientation,
    /// OSM `amenity` tag: "bar" or "pub".
    pub amenity: Option<String>,
    pub address: Option<String>,
    pub opening_hours: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub email: Option<String>,
    pub description: Option<String>,
    pub cuisine: Option<String>,
    pub outdoor_seating: Option<String>,
    pub osm_id: Option<i64>,
    pub osm_type: Option<String>,
}

impl Venue {
    /// A venue with only the required fields set.
    pub fn new(
        id: u64,
        name: impl Into<String>,
        city: impl Into<String>,
        lat: f64,
        lng: f64,
        orientation: Orientation,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            city: city.into(),
            lat,
            lng,
            orientation,
            amenity: None,
            address: None,
            opening_hours: None,
            phone: None,
            website: None,
            email: None,
            description: None,
            cuisine: None,
            outdoor_seating: None,
            osm_id: None,
            osm_type: None,
        }
    }
}

/// Where the venues currently served came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VenueSourceKind {
    /// Live Overpass response.
    Osm,
    /// Built-in list used when Overpass has never answered.
    Fallback,
}

impl std::fmt::Display for VenueSourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VenueSourceKind::Osm => write!(f, "osm"),
            VenueSourceKind::Fallback => write!(f, "fallback"),
        }
    }
}

// ---------------------------------------------------------------------------
// Sun
// ---------------------------------------------------------------------------

/// Sun position as produced by the solar model.
///
/// `azimuth` is referenced to south and grows towards west, in (-180, 180].
/// Use [`SolarPosition::bearing`] for a compass bearing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolarPosition {
    /// Degrees above the horizon; negative below.
    pub altitude: f64,
    pub azimuth: f64,
}

impl SolarPosition {
    /// Compass bearing in [0, 360): `(azimuth + 180) mod 360`.
    pub fn bearing(&self) -> f64 {
        (self.azimuth + 180.0).rem_euclid(360.0)
    }

    /// Build a position from a compass bearing instead of the model azimuth.
    pub fn from_bearing(altitude: f64, bearing: f64) -> Self {
        Self { altitude, azimuth: bearing - 180.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ExposureResult {
    pub sunlit: bool,
    pub position: SolarPosition,
}

/// Sun events for one day at one location. Events the sun never reaches that day are `None`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SunTimes {
    pub solar_noon: DateTime<Utc>,
    pub nadir: DateTime<Utc>,
    pub sunrise: Option<DateTime<Utc>>,
    pub sunset: Option<DateTime<Utc>>,
    pub dawn: Option<DateTime<Utc>>,
    pub dusk: Option<DateTime<Utc>>,
    /// Morning golden hour ends.
    pub golden_hour_end: Option<DateTime<Utc>>,
    /// Evening golden hour starts.
    pub golden_hour: Option<DateTime<Utc>>,
}

/// Directional light for the 3D map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LightSettings {
    pub anchor: &'static str,
    pub color: &'static str,
    pub intensity: f64,
    pub position: [f64; 3],
}
