//! Interval algebra over the scheduling axis.
//!
//! [`Interval`] is the half-open `[start, end)` building block; [`algebra`]
//! provides the set operations the scheduler uses to maintain its free-time
//! list.

pub mod algebra;
mod interval;

pub use algebra::{clamp, intersect, subtract_many, subtract_one, total_duration};
pub use interval::{Interval, TimeInterval};
