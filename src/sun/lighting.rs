//! Ambient light for the 3D map, derived from local hour and sun position.

use crate::types::{LightSettings, SolarPosition};

pub const DAWN_COLOR: &str = "#FFB366";
pub const DAY_COLOR: &str = "#FFFBEA";
pub const DUSK_COLOR: &str = "#FFB347";
pub const NIGHT_COLOR: &str = "#8B9DC3";

/// Dim blue light from straight above, used whenever the sun is not up.
pub const NIGHT_LIGHT_COLOR: &str = "#6B7B9C";
pub const NIGHT_INTENSITY: f64 = 0.15;

/// Light never comes from lower than this, so façades stay readable near sunrise/sunset.
const MIN_LIGHT_ALTITUDE_DEG: f64 = 15.0;

/// Colour band for a local hour of day (0-23).
pub fn light_color(hour: u32) -> &'static str {
    match hour {
        5..=6 => DAWN_COLOR,
        7..=16 => DAY_COLOR,
        17..=19 => DUSK_COLOR,
        _ => NIGHT_COLOR,
    }
}

/// Rises linearly with altitude from 0.4, capped at 0.9.
pub fn intensity(altitude: f64) -> f64 {
    (0.4 + (altitude / 90.0) * 0.5).min(0.9)
}

pub fn light_settings(hour: u32, position: &SolarPosition) -> LightSettings {
    if position.altitude <= 0.0 {
        return LightSettings {
            anchor: "viewport",
            color: NIGHT_LIGHT_COLOR,
            intensity: NIGHT_INTENSITY,
            position: [0.0, 0.0, 1.0],
        };
    }

    let light_altitude = position.altitude.max(MIN_LIGHT_ALTITUDE_DEG).to_radians();
    let theta = (position.bearing() - 90.0).to_radians();

    LightSettings {
        anchor: "viewport",
        color: light_color(hour),
        intensity: intensity(position.altitude),
        position: [
            light_altitude.cos() * theta.cos(),
            light_altitude.cos() * theta.sin(),
            light_altitude.sin(),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_bands() {
        assert_eq!(light_color(6), DAWN_COLOR);
        assert_eq!(light_color(12), DAY_COLOR);
        assert_eq!(light_color(18), DUSK_COLOR);
        assert_eq!(light_color(23), NIGHT_COLOR);
    }

    #[test]
    fn color_band_edges() {
        assert_eq!(light_color(4), NIGHT_COLOR);
        assert_eq!(light_color(5), DAWN_COLOR);
        assert_eq!(light_color(7), DAY_COLOR);
        assert_eq!(light_color(16), DAY_COLOR);
        assert_eq!(light_color(17), DUSK_COLOR);
        assert_eq!(light_color(20), NIGHT_COLOR);
        assert_eq!(light_color(0), NIGHT_COLOR);
    }

    #[test]
    fn intensity_is_monotonic_and_capped() {
        assert!((intensity(0.0) - 0.4).abs() < 1e-12);
        assert!((intensity(45.0) - 0.65).abs() < 1e-12);
        assert!((intensity(90.0) - 0.9).abs() < 1e-12);
        assert_eq!(intensity(120.0), 0.9);
        let mut last = 0.0;
        for alt in 0..=90 {
            let i = intensity(alt as f64);
            assert!(i >= last);
            last = i;
        }
    }

    #[test]
    fn night_light_is_fixed() {
        let light = light_settings(14, &SolarPosition::from_bearing(-3.0, 200.0));
        assert_eq!(light.color, NIGHT_LIGHT_COLOR);
        assert_eq!(light.intensity, NIGHT_INTENSITY);
        assert_eq!(light.position, [0.0, 0.0, 1.0]);

        // horizon counts as night for lighting
        let light = light_settings(6, &SolarPosition::from_bearing(0.0, 90.0));
        assert_eq!(light.color, NIGHT_LIGHT_COLOR);
    }

    #[test]
    fn day_light_points_from_the_sun() {
        // Sun due south at 45°: theta = 90°, so the vector is (0, cos45, sin45).
        let light = light_settings(12, &SolarPosition::from_bearing(45.0, 180.0));
        assert_eq!(light.color, DAY_COLOR);
        let [x, y, z] = light.position;
        assert!(x.abs() < 1e-9);
        assert!((y - 45f64.to_radians().cos()).abs() < 1e-9);
        assert!((z - 45f64.to_radians().sin()).abs() < 1e-9);
    }

    #[test]
    fn low_sun_is_clamped_to_minimum_altitude() {
        let light = light_settings(19, &SolarPosition::from_bearing(3.0, 300.0));
        assert_eq!(light.color, DUSK_COLOR);
        assert!((light.position[2] - 15f64.to_radians().sin()).abs() < 1e-9);
        assert!((light.intensity - (0.4 + 3.0 / 90.0 * 0.5)).abs() < 1e-12);
    }
}
