//! Local `HH:MM` strings and where they land on the night's timeline.
//!
//! A wall-clock time alone does not say which day it belongs to: "01:00"
//! entered for the night of the 10th means the morning of the 11th. Times are
//! resolved against the plan date by trying the previous, same and next day
//! and keeping the candidate closest to dusk among those within six hours of
//! the dark period.

use std::fmt::Display;
use std::str::FromStr;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, TimeZone, Utc};
use thiserror::Error;

/// How far outside darkness a resolved time may fall.
const RESOLUTION_SLACK_HOURS: i64 = 6;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClockError {
    #[error("Invalid time of day {0:?}: expected HH:MM")]
    Malformed(String),

    #[error("Time of day out of range: {0}")]
    OutOfRange(String),

    #[error("{0} does not fall near tonight's darkness")]
    Unresolvable(ClockTime),
}

/// Minutes after local midnight. `24:00` is accepted as the following midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockTime {
    minutes: u32,
}

impl ClockTime {
    pub fn new(hour: u32, minute: u32) -> Option<Self> {
        let valid = (hour < 24 && minute < 60) || (hour == 24 && minute == 0);
        valid.then_some(Self {
            minutes: hour * 60 + minute,
        })
    }

    pub const fn minutes_of_day(self) -> u32 {
        self.minutes
    }

    /// This clock time on `date` in the given offset, as UTC.
    pub fn on(self, date: NaiveDate, offset: FixedOffset) -> Option<DateTime<Utc>> {
        let local = date.and_hms_opt(0, 0, 0)? + Duration::minutes(i64::from(self.minutes));
        offset
            .from_local_datetime(&local)
            .single()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

impl FromStr for ClockTime {
    type Err = ClockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (h, m) = trimmed
            .split_once(':')
            .ok_or_else(|| ClockError::Malformed(s.to_string()))?;
        if h.is_empty() || h.len() > 2 || m.len() != 2 {
            return Err(ClockError::Malformed(s.to_string()));
        }
        let hour: u32 = h.parse().map_err(|_| ClockError::Malformed(s.to_string()))?;
        let minute: u32 = m.parse().map_err(|_| ClockError::Malformed(s.to_string()))?;
        Self::new(hour, minute).ok_or_else(|| ClockError::OutOfRange(s.to_string()))
    }
}

impl Display for ClockTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}", self.minutes / 60, self.minutes % 60)
    }
}

/// A clock time pinned to a calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedTime {
    pub at: DateTime<Utc>,
    /// Local date the clock time was read on.
    pub date: NaiveDate,
}

/// Pins `time` to the day that puts it nearest `dusk`.
///
/// Candidates are the plan date and its neighbours; only those within
/// `[dusk - 6h, dawn + 6h]` qualify. Equidistant candidates resolve to the
/// earlier day.
pub fn resolve_near_dusk(
    time: ClockTime,
    plan_date: NaiveDate,
    offset: FixedOffset,
    dusk: DateTime<Utc>,
    dawn: DateTime<Utc>,
) -> Result<ResolvedTime, ClockError> {
    let slack = Duration::hours(RESOLUTION_SLACK_HOURS);
    let (earliest, latest) = (dusk - slack, dawn + slack);

    let mut best: Option<(i64, ResolvedTime)> = None;
    for day_offset in [-1, 0, 1] {
        let Some(date) = plan_date.checked_add_signed(Duration::days(day_offset)) else {
            continue;
        };
        let Some(at) = time.on(date, offset) else {
            continue;
        };
        if at < earliest || at > latest {
            continue;
        }
        let distance = (at - dusk).num_milliseconds().abs();
        if best.as_ref().map_or(true, |(d, _)| distance < *d) {
            best = Some((distance, ResolvedTime { at, date }));
        }
    }

    best.map(|(_, resolved)| resolved)
        .ok_or(ClockError::Unresolvable(time))
}

/// Builds the end of a span that starts at `start`.
///
/// The end is read on the start's date and pushed to the next day when its
/// clock time is not after the start's.
pub fn end_after(
    start_clock: ClockTime,
    start: ResolvedTime,
    end_clock: ClockTime,
    offset: FixedOffset,
) -> Option<DateTime<Utc>> {
    let end = end_clock.on(start.date, offset)?;
    if end_clock.minutes_of_day() <= start_clock.minutes_of_day() {
        Some(end + Duration::days(1))
    } else {
        Some(end)
    }
}
