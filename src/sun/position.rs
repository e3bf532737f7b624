//! Low-precision solar model (J2000 epoch, no refraction), accurate to a
//! fraction of a degree for the next few centuries.
//!
//! Azimuths are returned the way this model defines them: measured from
//! south, positive towards west. [`SolarPosition::bearing`] converts to a
//! compass bearing.

use std::f64::consts::PI;

use chrono::{DateTime, Utc};

use crate::types::{SolarPosition, SunTimes};

const RAD: f64 = PI / 180.0;
const DAY_MS: f64 = 86_400_000.0;
const J1970: f64 = 2_440_588.0;
const J2000: f64 = 2_451_545.0;

/// Obliquity of the ecliptic.
const OBLIQUITY: f64 = RAD * 23.4397;

/// Julian-cycle offset used for transit estimation.
const J0: f64 = 0.0009;

/// Sun altitudes (degrees) for the rise/set style events.
const SUNRISE_ALTITUDE: f64 = -0.833;
const CIVIL_DAWN_ALTITUDE: f64 = -6.0;
const GOLDEN_HOUR_ALTITUDE: f64 = 6.0;

// ---------------------------------------------------------------------------
// Time conversions
// ---------------------------------------------------------------------------

fn to_julian(t: DateTime<Utc>) -> f64 {
    t.timestamp_millis() as f64 / DAY_MS - 0.5 + J1970
}

fn from_julian(j: f64) -> Option<DateTime<Utc>> {
    if !j.is_finite() {
        return None;
    }
    DateTime::from_timestamp_millis(((j + 0.5 - J1970) * DAY_MS).round() as i64)
}

/// Days since J2000.
fn to_days(t: DateTime<Utc>) -> f64 {
    to_julian(t) - J2000
}

// ---------------------------------------------------------------------------
// Spherical astronomy
// ---------------------------------------------------------------------------

fn right_ascension(l: f64, b: f64) -> f64 {
    (l.sin() * OBLIQUITY.cos() - b.tan() * OBLIQUITY.sin()).atan2(l.cos())
}

fn declination(l: f64, b: f64) -> f64 {
    (b.sin() * OBLIQUITY.cos() + b.cos() * OBLIQUITY.sin() * l.sin()).asin()
}

fn azimuth(h: f64, phi: f64, dec: f64) -> f64 {
    h.sin().atan2(h.cos() * phi.sin() - dec.tan() * phi.cos())
}

fn altitude(h: f64, phi: f64, dec: f64) -> f64 {
    (phi.sin() * dec.sin() + phi.cos() * dec.cos() * h.cos()).asin()
}

fn sidereal_time(d: f64, lw: f64) -> f64 {
    RAD * (280.16 + 360.985_623_5 * d) - lw
}

fn solar_mean_anomaly(d: f64) -> f64 {
    RAD * (357.5291 + 0.985_600_28 * d)
}

fn ecliptic_longitude(m: f64) -> f64 {
    // equation of centre
    let c = RAD * (1.9148 * m.sin() + 0.02 * (2.0 * m).sin() + 0.0003 * (3.0 * m).sin());
    // perihelion of the Earth
    let p = RAD * 102.9372;
    m + c + p + PI
}

/// (declination, right ascension) of the sun, radians.
fn sun_coords(d: f64) -> (f64, f64) {
    let l = ecliptic_longitude(solar_mean_anomaly(d));
    (declination(l, 0.0), right_ascension(l, 0.0))
}

/// Sun altitude and azimuth in degrees at `at` seen from (`lat`, `lng`).
///
/// Total over valid coordinates; never fails.
pub fn solar_position(at: DateTime<Utc>, lat: f64, lng: f64) -> SolarPosition {
    let lw = RAD * -lng;
    let phi = RAD * lat;
    let d = to_days(at);

    let (dec, ra) = sun_coords(d);
    let h = sidereal_time(d, lw) - ra;

    SolarPosition {
        altitude: altitude(h, phi, dec) / RAD,
        azimuth: azimuth(h, phi, dec) / RAD,
    }
}

// ---------------------------------------------------------------------------
// Sun times
// ---------------------------------------------------------------------------

fn julian_cycle(d: f64, lw: f64) -> f64 {
    (d - J0 - lw / (2.0 * PI)).round()
}

fn approx_transit(ht: f64, lw: f64, n: f64) -> f64 {
    J0 + (ht + lw) / (2.0 * PI) + n
}

fn solar_transit_j(ds: f64, m: f64, l: f64) -> f64 {
    J2000 + ds + 0.0053 * m.sin() - 0.0069 * (2.0 * l).sin()
}

/// NaN when the sun never reaches altitude `h` that day.
fn hour_angle(h: f64, phi: f64, dec: f64) -> f64 {
    ((h.sin() - phi.sin() * dec.sin()) / (phi.cos() * dec.cos())).acos()
}

struct Transit {
    lw: f64,
    phi: f64,
    dec: f64,
    n: f64,
    m: f64,
    l: f64,
    noon: f64,
}

impl Transit {
    /// Julian dates of (rise, set) for the sun crossing `altitude_deg`.
    fn crossing(&self, altitude_deg: f64) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
        let w = hour_angle(altitude_deg * RAD, self.phi, self.dec);
        let a = approx_transit(w, self.lw, self.n);
        let set = solar_transit_j(a, self.m, self.l);
        let rise = self.noon - (set - self.noon);
        (from_julian(rise), from_julian(set))
    }
}

/// Sun events for the solar day nearest `at` at (`lat`, `lng`).
pub fn sun_times(at: DateTime<Utc>, lat: f64, lng: f64) -> SunTimes {
    let lw = RAD * -lng;
    let phi = RAD * lat;

    let d = to_days(at);
    let n = julian_cycle(d, lw);
    let ds = approx_transit(0.0, lw, n);

    let m = solar_mean_anomaly(ds);
    let l = ecliptic_longitude(m);
    let dec = declination(l, 0.0);
    let noon = solar_transit_j(ds, m, l);

    let transit = Transit { lw, phi, dec, n, m, l, noon };
    let (sunrise, sunset) = transit.crossing(SUNRISE_ALTITUDE);
    let (dawn, dusk) = transit.crossing(CIVIL_DAWN_ALTITUDE);
    let (golden_hour_end, golden_hour) = transit.crossing(GOLDEN_HOUR_ALTITUDE);

    SunTimes {
        solar_noon: from_julian(noon).unwrap_or(at),
        nadir: from_julian(noon - 0.5).unwrap_or(at),
        sunrise,
        sunset,
        dawn,
        dusk,
        golden_hour_end,
        golden_hour,
    }
}
