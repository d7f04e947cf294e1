//! Time-axis units and conversions.
//!
//! All interval arithmetic in nightplan runs on a single axis: milliseconds since
//! the Unix epoch, carried as `Quantity<Millisecond>`. Durations that users see
//! (minutes of exposure, hours of imaging) share the same physical dimension, so
//! the [`SameDim`] bound lets them convert to and from the axis at compile time.
//! Calendar instants cross the boundary through [`instant_of`] and
//! [`datetime_of`].

use chrono::{DateTime, TimeZone, Utc};
use qtty::{Hour, Millisecond, Minute, Quantity, Unit};

/// A point on the scheduling axis (epoch milliseconds).
pub type Instant = Quantity<Millisecond>;

/// Marker trait for units that share the same physical dimension.
///
/// Automatically implemented for any pair of units where `From::Dim == To::Dim`.
pub trait SameDim<To: Unit>: Unit<Dim = To::Dim> {}

impl<From, To> SameDim<To> for From
where
    From: Unit,
    To: Unit<Dim = From::Dim>,
{
}

/// Converts a quantity to another unit of the same dimension.
#[inline]
pub fn convert<From, To>(q: Quantity<From>) -> Quantity<To>
where
    From: SameDim<To>,
    To: Unit,
{
    q.to::<To>()
}

/// Places a UTC instant on the scheduling axis.
pub fn instant_of(dt: DateTime<Utc>) -> Instant {
    Quantity::new(dt.timestamp_millis() as f64)
}

/// Maps an axis position back to a UTC instant.
///
/// Positions outside chrono's representable range collapse to the epoch.
pub fn datetime_of(instant: Instant) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(instant.value().round() as i64)
        .single()
        .unwrap_or_default()
}

/// Expresses an axis span in minutes.
pub fn span_minutes(span: Quantity<Millisecond>) -> Quantity<Minute> {
    convert(span)
}

/// Expresses an axis span in hours.
pub fn span_hours(span: Quantity<Millisecond>) -> Quantity<Hour> {
    convert(span)
}

/// Converts a duration in minutes to an axis span.
pub fn minutes_span(minutes: Quantity<Minute>) -> Quantity<Millisecond> {
    convert(minutes)
}
