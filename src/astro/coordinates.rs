//! Coordinate transforms used by the oracle and the mount engine.

use chrono::{DateTime, Utc};

use super::time::{hour_angle_hours, julian_date, normalize_degrees, JD_J2000};
use crate::target::EquatorialCoords;

/// Geometric altitude (no refraction) of a target, degrees.
pub fn altitude_deg(
    coords: &EquatorialCoords,
    at: DateTime<Utc>,
    latitude_deg: f64,
    longitude_deg: f64,
) -> f64 {
    let ha = hour_angle_hours(at, coords.ra.value(), longitude_deg);
    altitude_from_hour_angle(ha, coords.dec.value(), latitude_deg)
}

/// Altitude for a given hour angle (hours) and declination, degrees.
pub fn altitude_from_hour_angle(ha_hours: f64, dec_deg: f64, latitude_deg: f64) -> f64 {
    let ha = (ha_hours * 15.0).to_radians();
    let dec = dec_deg.to_radians();
    let lat = latitude_deg.to_radians();
    let sin_alt = dec.sin() * lat.sin() + dec.cos() * lat.cos() * ha.cos();
    sin_alt.clamp(-1.0, 1.0).asin().to_degrees()
}

/// Altitude at upper culmination, degrees.
pub fn transit_altitude_deg(dec_deg: f64, latitude_deg: f64) -> f64 {
    90.0 - (latitude_deg - dec_deg).abs()
}

/// Great-circle separation between two equatorial positions, degrees.
pub fn angular_separation(a: &EquatorialCoords, b: &EquatorialCoords) -> f64 {
    let (ra1, dec1) = (a.ra.value().to_radians(), a.dec.value().to_radians());
    let (ra2, dec2) = (b.ra.value().to_radians(), b.dec.value().to_radians());
    let cos_sep = dec1.sin() * dec2.sin() + dec1.cos() * dec2.cos() * (ra1 - ra2).cos();
    cos_sep.clamp(-1.0, 1.0).acos().to_degrees()
}

/// Mean obliquity of the ecliptic, degrees.
fn obliquity_deg(jd: f64) -> f64 {
    let t = (jd - JD_J2000) / 36_525.0;
    23.439_291 - 0.013_004_2 * t - 0.000_000_16 * t * t + 0.000_000_504 * t * t * t
}

/// Converts ecliptic longitude/latitude (degrees) at `at` to equatorial coordinates.
pub fn ecliptic_to_equatorial(lon_deg: f64, lat_deg: f64, at: DateTime<Utc>) -> EquatorialCoords {
    let eps = obliquity_deg(julian_date(at)).to_radians();
    let lon = lon_deg.to_radians();
    let lat = lat_deg.to_radians();

    let sin_dec = lat.sin() * eps.cos() + lat.cos() * eps.sin() * lon.sin();
    let y = lon.sin() * eps.cos() - lat.tan() * eps.sin();
    let ra = normalize_degrees(y.atan2(lon.cos()).to_degrees());

    EquatorialCoords::new(ra, sin_dec.clamp(-1.0, 1.0).asin().to_degrees())
}
