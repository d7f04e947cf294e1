//! The stretch of night a run may schedule into.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Utc};

use super::clock::{resolve_near_dusk, ClockError, ClockTime};
use super::conflict::{ConflictKind, SessionConflict};
use super::model::SessionWindow;
use crate::oracle::Twilight;
use crate::timeline::{intersect, TimeInterval};

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Horizon {
    /// Astronomical darkness, dusk to dawn.
    pub darkness: TimeInterval,
    /// Darkness narrowed to the user's session window, if any.
    pub window: TimeInterval,
}

impl Horizon {
    pub fn dusk(&self) -> DateTime<Utc> {
        self.darkness.start_datetime()
    }

    pub fn dawn(&self) -> DateTime<Utc> {
        self.darkness.end_datetime()
    }

    pub fn contains(&self, span: &TimeInterval) -> bool {
        self.window.start().value() <= span.start().value()
            && span.end().value() <= self.window.end().value()
    }
}

fn window_conflict(message: impl Into<String>) -> SessionConflict {
    SessionConflict::global(ConflictKind::SessionWindow, message)
}

fn resolve_bound(
    raw: &str,
    plan_date: NaiveDate,
    offset: FixedOffset,
    darkness: &TimeInterval,
) -> Result<DateTime<Utc>, ClockError> {
    let clock: ClockTime = raw.parse()?;
    let resolved = resolve_near_dusk(
        clock,
        plan_date,
        offset,
        darkness.start_datetime(),
        darkness.end_datetime(),
    )?;
    Ok(resolved.at)
}

/// Works out tonight's horizon, or the conflict explaining why there is none.
pub(crate) fn resolve_horizon(
    twilight: &Twilight,
    session_window: Option<&SessionWindow>,
    plan_date: NaiveDate,
    offset: FixedOffset,
) -> Result<Horizon, SessionConflict> {
    let darkness = twilight
        .darkness()
        .ok_or_else(|| window_conflict("No astronomical darkness tonight"))?;

    let Some(session) = session_window else {
        return Ok(Horizon {
            darkness,
            window: darkness,
        });
    };

    let start = resolve_bound(&session.start, plan_date, offset, &darkness)
        .map_err(|e| window_conflict(format!("Session start: {e}")))?;
    let mut end = resolve_bound(&session.end, plan_date, offset, &darkness)
        .map_err(|e| window_conflict(format!("Session end: {e}")))?;
    if end <= start {
        end += Duration::days(1);
    }

    let requested = TimeInterval::from_datetimes(start, end).ok_or_else(|| {
        window_conflict(format!(
            "Session window {}–{} is empty",
            session.start, session.end
        ))
    })?;
    let window = intersect(&requested, &darkness).ok_or_else(|| {
        window_conflict(format!(
            "Session window {}–{} does not overlap astronomical darkness",
            session.start, session.end
        ))
    })?;

    Ok(Horizon { darkness, window })
}
