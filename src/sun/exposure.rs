use chrono::{DateTime, Utc};
use tracing::warn;

use crate::config::EXPOSURE_HALF_ARC_DEG;
use crate::sun::position::solar_position;
use crate::types::{ExposureResult, Orientation, SolarPosition, Venue};

/// Shortest arc between two compass bearings, in [0, 180].
pub fn angular_distance(a: f64, b: f64) -> f64 {
    let diff = (a - b).abs();
    diff.min(360.0 - diff)
}

/// True when direct sunlight reaches a façade facing `orientation`.
///
/// The sun must be at or above the horizon and within ±60° (inclusive) of
/// the façade's direction.
pub fn is_sunlit(orientation: Orientation, position: &SolarPosition) -> bool {
    if position.altitude < 0.0 {
        return false;
    }
    angular_distance(position.bearing(), orientation.reference_bearing()) <= EXPOSURE_HALF_ARC_DEG
}

/// String-keyed variant for callers holding raw orientation values.
/// Unknown orientations have no reference bearing and are never sunlit.
pub fn is_sunlit_named(orientation: &str, position: &SolarPosition) -> bool {
    match orientation.parse::<Orientation>() {
        Ok(o) => is_sunlit(o, position),
        Err(e) => {
            warn!("[EXPOSURE] {e}; treating as not sunlit");
            false
        }
    }
}

/// Exposure of `venue` at `at`. Depends only on the venue's coordinate and orientation.
pub fn evaluate(venue: &Venue, at: DateTime<Utc>) -> ExposureResult {
    let position = solar_position(at, venue.lat, venue.lng);
    ExposureResult {
        sunlit: is_sunlit(venue.orientation, &position),
        position,
    }
}
