//! Observer location and the night's twilight markers.

use chrono::{DateTime, FixedOffset, Offset, Utc};
use qtty::Degrees;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::timeline::TimeInterval;

/// Observing site. Longitude is east-positive.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Site {
    pub latitude: Degrees,
    pub longitude: Degrees,
    /// Offset of local civil time from UTC, used to resolve `HH:MM` strings.
    #[cfg_attr(feature = "serde", serde(default))]
    pub utc_offset_minutes: i32,
}

impl Site {
    pub fn new(latitude_deg: f64, longitude_deg: f64) -> Self {
        Self {
            latitude: Degrees::new(latitude_deg),
            longitude: Degrees::new(longitude_deg),
            utc_offset_minutes: 0,
        }
    }

    pub fn with_utc_offset_minutes(mut self, minutes: i32) -> Self {
        self.utc_offset_minutes = minutes;
        self
    }

    /// Local civil offset; out-of-range values fall back to UTC.
    pub fn offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes.saturating_mul(60))
            .unwrap_or_else(|| Utc.fix())
    }

    pub fn latitude_deg(&self) -> f64 {
        self.latitude.value()
    }

    pub fn longitude_deg(&self) -> f64 {
        self.longitude.value()
    }
}

impl Default for Site {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

/// Sun-altitude markers for one night. Any marker may be missing (polar
/// summer, polar night).
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Twilight {
    pub sunset: Option<DateTime<Utc>>,
    pub civil_dusk: Option<DateTime<Utc>>,
    pub nautical_dusk: Option<DateTime<Utc>>,
    pub astronomical_dusk: Option<DateTime<Utc>>,
    pub astronomical_dawn: Option<DateTime<Utc>>,
    pub nautical_dawn: Option<DateTime<Utc>>,
    pub civil_dawn: Option<DateTime<Utc>>,
    pub sunrise: Option<DateTime<Utc>>,
}

impl Twilight {
    /// Twilight with only the astronomical markers set.
    pub fn astronomical(dusk: DateTime<Utc>, dawn: DateTime<Utc>) -> Self {
        Self {
            astronomical_dusk: Some(dusk),
            astronomical_dawn: Some(dawn),
            ..Self::default()
        }
    }

    /// Astronomical darkness, dusk to dawn.
    ///
    /// A dawn at or before dusk is taken to be the following morning.
    pub fn darkness(&self) -> Option<TimeInterval> {
        let dusk = self.astronomical_dusk?;
        let mut dawn = self.astronomical_dawn?;
        if dawn <= dusk {
            dawn += chrono::Duration::days(1);
        }
        TimeInterval::from_datetimes(dusk, dawn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn darkness_rolls_dawn_forward() {
        let dusk = Utc.with_ymd_and_hms(2024, 3, 10, 20, 0, 0).unwrap();
        let dawn_same_day = Utc.with_ymd_and_hms(2024, 3, 10, 5, 0, 0).unwrap();
        let dark = Twilight::astronomical(dusk, dawn_same_day).darkness().unwrap();
        assert_eq!(dark.start_datetime(), dusk);
        assert_eq!(dark.end_datetime(), Utc.with_ymd_and_hms(2024, 3, 11, 5, 0, 0).unwrap());
    }

    #[test]
    fn missing_marker_means_no_darkness() {
        let tw = Twilight {
            astronomical_dusk: Some(Utc.with_ymd_and_hms(2024, 6, 21, 23, 0, 0).unwrap()),
            ..Twilight::default()
        };
        assert!(tw.darkness().is_none());
    }

    #[test]
    fn offset_falls_back_to_utc() {
        let site = Site::new(40.0, -3.7).with_utc_offset_minutes(60 * 48);
        assert_eq!(site.offset().local_minus_utc(), 0);
        let site = Site::new(40.0, -3.7).with_utc_offset_minutes(120);
        assert_eq!(site.offset().local_minus_utc(), 7200);
    }
}
