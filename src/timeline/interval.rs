//! Half-open interval on a quantity axis.

use std::fmt::Display;

use chrono::{DateTime, Utc};
use qtty::{Millisecond, Quantity, Unit};

use crate::units::{datetime_of, instant_of};

/// Half-open range `[start, end)` on the scheduling axis.
///
/// An interval may be empty (`start == end`) but never inverted. Empty
/// intervals are what the algebra in [`super::algebra`] filters out, so code
/// holding an `Interval` that came from those operations can rely on
/// `start < end`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval<U: Unit> {
    start: Quantity<U>,
    end: Quantity<U>,
}

/// An interval of wall-clock time in epoch milliseconds.
pub type TimeInterval = Interval<Millisecond>;

impl<U: Unit> Interval<U> {
    /// Creates interval `[start, end)`.
    ///
    /// # Panics
    ///
    /// Panics if `start > end`. Use [`Interval::try_new`] for untrusted bounds.
    pub const fn new(start: Quantity<U>, end: Quantity<U>) -> Self {
        assert!(
            start.value() <= end.value(),
            "Interval start must be <= end"
        );
        Self { start, end }
    }

    /// Creates `[start, end)` if it is non-empty.
    pub fn try_new(start: Quantity<U>, end: Quantity<U>) -> Option<Self> {
        (start.value() < end.value()).then_some(Self { start, end })
    }

    pub const fn from_f64(start: f64, end: f64) -> Self {
        Self::new(Quantity::<U>::new(start), Quantity::<U>::new(end))
    }

    pub const fn start(&self) -> Quantity<U> {
        self.start
    }

    pub const fn end(&self) -> Quantity<U> {
        self.end
    }

    pub fn duration(&self) -> Quantity<U> {
        self.end - self.start
    }

    pub fn midpoint(&self) -> Quantity<U> {
        Quantity::new((self.start.value() + self.end.value()) / 2.0)
    }

    pub fn is_empty(&self) -> bool {
        self.end.value() <= self.start.value()
    }

    /// Returns true if `position` ∈ `[start, end)`.
    pub fn contains(&self, position: Quantity<U>) -> bool {
        self.start.value() <= position.value() && position.value() < self.end.value()
    }

    /// Returns true if the two intervals share a non-empty sub-interval.
    ///
    /// Back-to-back intervals (`a.end == b.start`) do not overlap.
    pub fn overlaps(&self, other: &Interval<U>) -> bool {
        self.start.value() < other.end.value() && other.start.value() < self.end.value()
    }

    /// Returns true if a block of `size` fits starting at `position`.
    pub fn can_fit(&self, position: Quantity<U>, size: Quantity<U>) -> bool {
        self.start.value() <= position.value()
            && (position + size).value() <= self.end.value()
    }

    /// Returns the same interval shifted by `offset`.
    pub fn shifted(&self, offset: Quantity<U>) -> Self {
        Self {
            start: self.start + offset,
            end: self.end + offset,
        }
    }
}

impl TimeInterval {
    /// Builds `[start, end)` from UTC instants, `None` if empty or inverted.
    pub fn from_datetimes(start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Self> {
        Self::try_new(instant_of(start), instant_of(end))
    }

    pub fn start_datetime(&self) -> DateTime<Utc> {
        datetime_of(self.start)
    }

    pub fn end_datetime(&self) -> DateTime<Utc> {
        datetime_of(self.end)
    }

    pub fn midpoint_datetime(&self) -> DateTime<Utc> {
        datetime_of(self.midpoint())
    }
}

impl<U: Unit> Display for Interval<U> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:.3}, {:.3})", self.start.value(), self.end.value())
    }
}

// =============================================================================
// Interval Serde Support
// =============================================================================

#[cfg(feature = "serde")]
impl<U: Unit> serde::Serialize for Interval<U> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut s = serializer.serialize_struct("Interval", 2)?;
        s.serialize_field("start", &self.start.value())?;
        s.serialize_field("end", &self.end.value())?;
        s.end()
    }
}

#[cfg(feature = "serde")]
impl<'de, U: Unit> serde::Deserialize<'de> for Interval<U> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(serde::Deserialize)]
        struct Raw {
            start: f64,
            end: f64,
        }

        let raw = Raw::deserialize(deserializer)?;
        if !raw.start.is_finite() || !raw.end.is_finite() {
            return Err(serde::de::Error::custom("interval bounds must be finite"));
        }
        if raw.start > raw.end {
            return Err(serde::de::Error::custom("interval start must be <= end"));
        }
        Ok(Self::new(
            Quantity::<U>::new(raw.start),
            Quantity::<U>::new(raw.end),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use qtty::Second;

    fn iv(start: f64, end: f64) -> Interval<Second> {
        Interval::from_f64(start, end)
    }

    #[test]
    fn test_interval_creation() {
        let interval = iv(0.0, 100.0);
        assert_eq!(interval.duration().value(), 100.0);
        assert_eq!(interval.midpoint().value(), 50.0);
        assert!(!interval.is_empty());
    }

    #[test]
    fn test_try_new_rejects_empty_and_inverted() {
        let q = Quantity::<Second>::new;
        assert!(Interval::try_new(q(5.0), q(5.0)).is_none());
        assert!(Interval::try_new(q(6.0), q(5.0)).is_none());
        assert!(Interval::try_new(q(5.0), q(6.0)).is_some());
    }

    #[test]
    fn test_contains_is_half_open() {
        let interval = iv(0.0, 100.0);
        assert!(interval.contains(Quantity::new(0.0)));
        assert!(interval.contains(Quantity::new(99.9)));
        assert!(!interval.contains(Quantity::new(100.0)));
    }

    #[test]
    fn test_back_to_back_does_not_overlap() {
        assert!(!iv(0.0, 10.0).overlaps(&iv(10.0, 20.0)));
        assert!(iv(0.0, 10.0).overlaps(&iv(9.0, 20.0)));
        assert!(iv(5.0, 6.0).overlaps(&iv(0.0, 20.0)));
    }

    #[test]
    fn test_can_fit() {
        let interval = iv(0.0, 100.0);
        assert!(interval.can_fit(Quantity::new(50.0), Quantity::new(50.0)));
        assert!(!interval.can_fit(Quantity::new(60.0), Quantity::new(50.0)));
        assert!(!interval.can_fit(Quantity::new(-1.0), Quantity::new(10.0)));
    }

    #[test]
    fn test_time_interval_from_datetimes() {
        let a = Utc.with_ymd_and_hms(2024, 1, 1, 21, 0, 0).unwrap();
        let b = Utc.with_ymd_and_hms(2024, 1, 2, 1, 0, 0).unwrap();
        let window = TimeInterval::from_datetimes(a, b).unwrap();
        assert_eq!(window.start_datetime(), a);
        assert_eq!(window.end_datetime(), b);
        assert_eq!(
            window.midpoint_datetime(),
            Utc.with_ymd_and_hms(2024, 1, 1, 23, 0, 0).unwrap()
        );
        assert!(TimeInterval::from_datetimes(b, a).is_none());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_shape() {
        let json = serde_json::to_string(&iv(1.0, 2.0)).unwrap();
        assert_eq!(json, r#"{"start":1.0,"end":2.0}"#);
        let back: Interval<Second> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, iv(1.0, 2.0));
        assert!(serde_json::from_str::<Interval<Second>>(r#"{"start":3.0,"end":2.0}"#).is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_rejects_non_finite_bounds() {
        assert!(toml::from_str::<Interval<Second>>("start = nan\nend = 1.0").is_err());
        assert!(toml::from_str::<Interval<Second>>("start = 0.0\nend = nan").is_err());
        assert!(toml::from_str::<Interval<Second>>("start = -inf\nend = inf").is_err());
        let ok = toml::from_str::<Interval<Second>>("start = 0.0\nend = 1.0").unwrap();
        assert_eq!(ok, iv(0.0, 1.0));
    }
}
