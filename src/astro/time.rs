//! Julian dates and sidereal time.

use chrono::{DateTime, Utc};

/// Julian date of the Unix epoch.
const JD_UNIX_EPOCH: f64 = 2_440_587.5;
/// Julian date of J2000.0.
pub const JD_J2000: f64 = 2_451_545.0;
/// Ratio of a sidereal day to a solar day.
pub const SIDEREAL_RATIO: f64 = 86_164.0905 / 86_400.0;

/// Wraps an angle into `[0, 360)`.
pub fn normalize_degrees(deg: f64) -> f64 {
    let wrapped = deg.rem_euclid(360.0);
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Wraps an angle into `(-180, 180]`.
pub fn signed_degrees(deg: f64) -> f64 {
    let wrapped = normalize_degrees(deg);
    if wrapped > 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

/// Julian date for a UTC instant, millisecond precision.
pub fn julian_date(at: DateTime<Utc>) -> f64 {
    at.timestamp_millis() as f64 / 86_400_000.0 + JD_UNIX_EPOCH
}

/// Greenwich mean sidereal time, degrees in `[0, 360)`.
pub fn gmst_degrees(jd: f64) -> f64 {
    let d = jd - JD_J2000;
    let t = d / 36_525.0;
    normalize_degrees(
        280.460_618_37 + 360.985_647_366_29 * d + 0.000_387_933 * t * t
            - t * t * t / 38_710_000.0,
    )
}

/// Local sidereal time, degrees in `[0, 360)`; longitude is east-positive.
pub fn lst_degrees(at: DateTime<Utc>, longitude_deg: f64) -> f64 {
    normalize_degrees(gmst_degrees(julian_date(at)) + longitude_deg)
}

/// Hour angle of `ra_deg` in hours, `(-12, 12]`; negative is east of the meridian.
pub fn hour_angle_hours(at: DateTime<Utc>, ra_deg: f64, longitude_deg: f64) -> f64 {
    signed_degrees(lst_degrees(at, longitude_deg) - ra_deg) / 15.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn j2000_julian_date() {
        let dt = Utc.with_ymd_and_hms(2000, 1, 1, 12, 0, 0).unwrap();
        assert!((julian_date(dt) - JD_J2000).abs() < 1e-9);
    }

    #[test]
    fn gmst_at_j2000() {
        assert!((gmst_degrees(JD_J2000) - 280.46).abs() < 0.01);
    }

    #[test]
    fn wrapping_helpers() {
        assert_eq!(normalize_degrees(-90.0), 270.0);
        assert_eq!(normalize_degrees(720.0), 0.0);
        assert_eq!(signed_degrees(270.0), -90.0);
        assert_eq!(signed_degrees(180.0), 180.0);
    }

    #[test]
    fn hour_angle_is_zero_at_transit() {
        let dt = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let lst = lst_degrees(dt, 10.0);
        let ha = hour_angle_hours(dt, lst, 10.0);
        assert!(ha.abs() < 1e-9);
        let later = dt + chrono::Duration::hours(2);
        let ha_later = hour_angle_hours(later, lst, 10.0);
        assert!((ha_later - 2.0 / SIDEREAL_RATIO).abs() < 0.01);
    }
}
