use std::str::FromStr;

use chrono_tz::Tz;

use crate::error::{AppError, Result};
use crate::types::{BoundingBox, Coordinate};

pub const OVERPASS_URL: &str = "https://overpass-api.de/api/interpreter";

/// Server-side timeout embedded in the Overpass QL header (seconds).
pub const OVERPASS_QUERY_TIMEOUT_SECS: u64 = 25;

/// How long a fetched venue list is served before the next request refetches (seconds).
pub const CACHE_TTL_SECS: u64 = 3600;

/// Aarhus city centre. Also the reference point for the orientation heuristic.
pub const DEFAULT_LAT: f64 = 56.1629;
pub const DEFAULT_LNG: f64 = 10.2039;
pub const DEFAULT_CITY: &str = "Aarhus";

/// Aarhus city bounds: min_lat, min_lng, max_lat, max_lng.
pub const DEFAULT_BBOX: BoundingBox = BoundingBox {
    min_lat: 56.13,
    min_lng: 10.15,
    max_lat: 56.20,
    max_lng: 10.26,
};

/// Venue name used when an OSM element carries neither `name` nor `name:da`.
pub const UNNAMED_VENUE: &str = "Unavngiven bar";

/// City label for coordinates outside every known city box.
pub const UNKNOWN_CITY: &str = "Ukendt";

/// A façade is lit while the sun is within this many degrees of the direction it faces.
pub const EXPOSURE_HALF_ARC_DEG: f64 = 60.0;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub log_level: String,
    pub overpass_url: String,
    /// Client-side timeout for the Overpass request (OVERPASS_TIMEOUT_SECS).
    pub overpass_timeout_secs: u64,
    pub cache_ttl_secs: u64,
    /// Area fetched from Overpass (BBOX, "min_lat,min_lng,max_lat,max_lng").
    pub bbox: BoundingBox,
    /// Default location for lighting and the orientation heuristic centre.
    pub center: Coordinate,
    pub city: String,
    /// Zone used for local hour-of-day and naive timestamps (TIMEZONE).
    pub timezone: Tz,
    /// Warm the venue cache before the server starts accepting requests (PREFETCH).
    pub prefetch: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            log_level: "info".to_string(),
            overpass_url: OVERPASS_URL.to_string(),
            overpass_timeout_secs: 30,
            cache_ttl_secs: CACHE_TTL_SECS,
            bbox: DEFAULT_BBOX,
            center: Coordinate { lat: DEFAULT_LAT, lng: DEFAULT_LNG },
            city: DEFAULT_CITY.to_string(),
            timezone: chrono_tz::Europe::Copenhagen,
            prefetch: true,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. Unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let port = match lookup("PORT") {
            Some(v) => v
                .trim()
                .parse::<u16>()
                .map_err(|_| AppError::Config("PORT must be a valid port number".to_string()))?,
            None => defaults.port,
        };

        let bbox = match lookup("BBOX") {
            Some(v) => parse_bbox(&v)?,
            None => defaults.bbox,
        };

        let center = Coordinate {
            lat: parse_or("DEFAULT_LAT", lookup("DEFAULT_LAT"), defaults.center.lat)?,
            lng: parse_or("DEFAULT_LNG", lookup("DEFAULT_LNG"), defaults.center.lng)?,
        };
        if !center.is_valid() {
            return Err(AppError::Config(format!(
                "default location {:.4},{:.4} is outside WGS84 bounds",
                center.lat, center.lng
            )));
        }

        let timezone = match lookup("TIMEZONE") {
            Some(v) => Tz::from_str(v.trim())
                .map_err(|_| AppError::Config(format!("unknown TIMEZONE '{v}'")))?,
            None => defaults.timezone,
        };

        Ok(Self {
            port,
            log_level: lookup("LOG_LEVEL").unwrap_or(defaults.log_level),
            overpass_url: lookup("OVERPASS_URL").unwrap_or(defaults.overpass_url),
            overpass_timeout_secs: parse_or(
                "OVERPASS_TIMEOUT_SECS",
                lookup("OVERPASS_TIMEOUT_SECS"),
                defaults.overpass_timeout_secs,
            )?,
            cache_ttl_secs: parse_or("CACHE_TTL_SECS", lookup("CACHE_TTL_SECS"), defaults.cache_ttl_secs)?,
            bbox,
            center,
            city: lookup("DEFAULT_CITY").unwrap_or(defaults.city),
            timezone,
            prefetch: lookup("PREFETCH")
                .map(|v| !matches!(v.trim().to_lowercase().as_str(), "0" | "false" | "no" | "off"))
                .unwrap_or(defaults.prefetch),
        })
    }
}

fn parse_or<T: FromStr>(key: &str, raw: Option<String>, default: T) -> Result<T> {
    match raw {
        Some(v) => v
            .trim()
            .parse::<T>()
            .map_err(|_| AppError::Config(format!("{key} has an invalid value '{v}'"))),
        None => Ok(default),
    }
}

/// Parse "min_lat,min_lng,max_lat,max_lng".
pub fn parse_bbox(s: &str) -> Result<BoundingBox> {
    let parts: Vec<f64> = s
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<std::result::Result<_, _>>()
        .map_err(|_| AppError::Config(format!("BBOX '{s}' must be four comma-separated numbers")))?;

    let &[min_lat, min_lng, max_lat, max_lng] = parts.as_slice() else {
        return Err(AppError::Config(format!("BBOX '{s}' must have exactly four values")));
    };

    let bbox = BoundingBox { min_lat, min_lng, max_lat, max_lng };
    if min_lat >= max_lat || min_lng >= max_lng {
        return Err(AppError::Config(format!("BBOX '{s}' has min >= max")));
    }
    Ok(bbox)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let env: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|k| env.get(k).cloned())
    }

    #[test]
    fn defaults_when_env_is_empty() {
        let cfg = config_from(&[]).unwrap();
        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.cache_ttl_secs, 3600);
        assert_eq!(cfg.bbox, DEFAULT_BBOX);
        assert_eq!(cfg.timezone, chrono_tz::Europe::Copenhagen);
        assert!(cfg.prefetch);
    }

    #[test]
    fn overrides_are_applied() {
        let cfg = config_from(&[
            ("PORT", "8080"),
            ("CACHE_TTL_SECS", "60"),
            ("BBOX", "55.6, 12.5, 55.75, 12.65"),
            ("TIMEZONE", "UTC"),
            ("PREFETCH", "off"),
        ])
        .unwrap();
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.cache_ttl_secs, 60);
        assert_eq!(cfg.bbox.min_lat, 55.6);
        assert_eq!(cfg.bbox.max_lng, 12.65);
        assert_eq!(cfg.timezone, chrono_tz::UTC);
        assert!(!cfg.prefetch);
    }

    #[test]
    fn invalid_values_are_config_errors() {
        assert!(matches!(config_from(&[("PORT", "http")]), Err(AppError::Config(_))));
        assert!(matches!(config_from(&[("BBOX", "1,2,3")]), Err(AppError::Config(_))));
        assert!(matches!(config_from(&[("BBOX", "5,5,1,1")]), Err(AppError::Config(_))));
        assert!(matches!(config_from(&[("TIMEZONE", "Mars/Olympus")]), Err(AppError::Config(_))));
        assert!(matches!(config_from(&[("DEFAULT_LAT", "91")]), Err(AppError::Config(_))));
    }
}
