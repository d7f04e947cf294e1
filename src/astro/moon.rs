//! Low-precision lunar ephemeris.
//!
//! Main periodic terms only; good to a fraction of a degree, which is plenty
//! for moon-avoidance checks measured in tens of degrees.

use chrono::{DateTime, Utc};

use super::coordinates::ecliptic_to_equatorial;
use super::time::{julian_date, normalize_degrees, JD_J2000};
use crate::target::EquatorialCoords;

const SYNODIC_MONTH_DAYS: f64 = 29.530_588_853;
/// A reference new moon (2000-01-06, about 14:24 UTC).
const REFERENCE_NEW_MOON_JD: f64 = 2_451_550.1;

/// Geocentric equatorial position of the Moon.
pub fn moon_position(at: DateTime<Utc>) -> EquatorialCoords {
    let t = (julian_date(at) - JD_J2000) / 36_525.0;
    let t2 = t * t;

    let l = normalize_degrees(218.316_447_7 + 481_267.881_234_21 * t - 0.001_578_6 * t2);
    let mp =
        normalize_degrees(134.963_396_4 + 477_198.867_505_5 * t + 0.008_741_4 * t2).to_radians();
    let m = normalize_degrees(357.529_109_2 + 35_999.050_290_9 * t - 0.000_153_6 * t2).to_radians();
    let d =
        normalize_degrees(297.850_192_1 + 445_267.111_403_4 * t - 0.001_881_9 * t2).to_radians();
    let f = normalize_degrees(93.272_095_0 + 483_202.017_523_3 * t - 0.003_653_9 * t2).to_radians();

    let sigma_l = 6_288_774.0 * mp.sin()
        + 1_274_027.0 * (2.0 * d - mp).sin()
        + 658_314.0 * (2.0 * d).sin()
        + 213_618.0 * (2.0 * mp).sin()
        - 185_116.0 * m.sin()
        - 114_332.0 * (2.0 * f).sin();

    let sigma_b = 5_128_122.0 * f.sin()
        + 280_602.0 * (mp + f).sin()
        + 277_693.0 * (mp - f).sin()
        + 173_237.0 * (2.0 * d - f).sin();

    ecliptic_to_equatorial(l + sigma_l / 1e6, sigma_b / 1e6, at)
}

/// Illuminated fraction of the lunar disc, percent.
pub fn moon_illumination(at: DateTime<Utc>) -> f64 {
    let lunations = (julian_date(at) - REFERENCE_NEW_MOON_JD) / SYNODIC_MONTH_DAYS;
    let phase = lunations.rem_euclid(1.0);
    (1.0 - (2.0 * std::f64::consts::PI * phase).cos()) / 2.0 * 100.0
}
