//! Pins locked manual edits onto the timeline before anything else is placed.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use qtty::Minutes;

use super::clock::{end_after, ClockTime};
use super::conflict::{ConflictKind, ConflictLog, SessionConflict};
use super::context::RunContext;
use super::model::{DesiredDuration, DurationSource, ManualScheduleItem, ScheduledTarget};
use crate::mount::Severity;
use crate::oracle::SkyOracle;
use crate::target::Target;
use crate::timeline::{Interval, TimeInterval};
use crate::units::{minutes_span, span_hours, span_minutes};
use crate::Id;

/// Locked entries plus every target id the greedy pass must leave alone.
pub(crate) struct LockedPhase {
    pub entries: Vec<ScheduledTarget>,
    pub claimed: HashSet<Id>,
}

enum LockedSpan {
    Fixed(TimeInterval),
    /// Only a duration was given; placed after all fixed slots are known.
    Floating(Minutes),
}

/// `None` when the span cannot be represented as a chrono duration.
fn chrono_minutes(minutes: Minutes) -> Option<Duration> {
    let ms = minutes_span(minutes).value().round();
    if !ms.is_finite() || ms.abs() >= i64::MAX as f64 {
        return None;
    }
    Duration::try_milliseconds(ms as i64)
}

fn out_of_range(minutes: Minutes) -> String {
    format!("Duration of {} minutes is out of range", minutes.value())
}

fn parse_clock(raw: Option<&str>, label: &str) -> Result<Option<ClockTime>, String> {
    raw.map(str::parse::<ClockTime>)
        .transpose()
        .map_err(|e| format!("{label}: {e}"))
}

fn fixed(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<LockedSpan, String> {
    TimeInterval::from_datetimes(start, end)
        .map(LockedSpan::Fixed)
        .ok_or_else(|| {
            format!(
                "Locked span {}–{} is empty or inverted",
                start.format("%Y-%m-%d %H:%M"),
                end.format("%Y-%m-%d %H:%M")
            )
        })
}

fn resolve_span<O: SkyOracle + ?Sized>(
    ctx: &RunContext<'_, O>,
    item: &ManualScheduleItem,
    target: &Target,
) -> Result<LockedSpan, String> {
    let start_clock = parse_clock(item.start_time.as_deref(), "Start time")?;
    let end_clock = parse_clock(item.end_time.as_deref(), "End time")?;
    let duration = item
        .duration_minutes
        .map(Minutes::new)
        .or(target.desired_exposure)
        .unwrap_or(ctx.constraints().min_imaging_time);

    match (start_clock, end_clock) {
        (Some(sc), Some(ec)) => {
            let start = ctx.resolve(sc).map_err(|e| format!("Start time: {e}"))?;
            let end = end_after(sc, start, ec, ctx.offset())
                .ok_or_else(|| format!("End time {ec} cannot be placed"))?;
            fixed(start.at, end)
        }
        (Some(sc), None) => {
            let start = ctx.resolve(sc).map_err(|e| format!("Start time: {e}"))?;
            let end = chrono_minutes(duration)
                .and_then(|d| start.at.checked_add_signed(d))
                .ok_or_else(|| out_of_range(duration))?;
            fixed(start.at, end)
        }
        (None, Some(ec)) => {
            let end = ctx.resolve(ec).map_err(|e| format!("End time: {e}"))?;
            let start = chrono_minutes(duration)
                .and_then(|d| end.at.checked_sub_signed(d))
                .ok_or_else(|| out_of_range(duration))?;
            fixed(start, end.at)
        }
        (None, None) => match item.duration_minutes.map(Minutes::new) {
            Some(minutes) if minutes.value() > 0.0 => chrono_minutes(minutes)
                .map(|_| LockedSpan::Floating(minutes))
                .ok_or_else(|| out_of_range(minutes)),
            _ => Err("Locked item has neither a time nor a positive duration".to_string()),
        },
    }
}

/// Earliest slot of `duration` inside the horizon that clears `taken`.
///
/// Each pass jumps past every slot the candidate overlaps, so `taken.len() + 1`
/// passes always suffice. `None` once the slot would run past the horizon end.
fn earliest_clear_span(
    horizon: &TimeInterval,
    taken: &[TimeInterval],
    duration: Minutes,
) -> Option<TimeInterval> {
    let size = minutes_span(duration);
    let mut cursor = horizon.start();
    for _ in 0..=taken.len() {
        let candidate = Interval::try_new(cursor, cursor + size)?;
        if candidate.end().value() > horizon.end().value() {
            return None;
        }
        let blocking_end = taken
            .iter()
            .filter(|slot| slot.overlaps(&candidate))
            .map(|slot| slot.end())
            .max_by(|a, b| a.value().total_cmp(&b.value()));
        match blocking_end {
            Some(end) => cursor = end,
            None => return Some(candidate),
        }
    }
    None
}

fn locked_entry<O: SkyOracle + ?Sized>(
    ctx: &RunContext<'_, O>,
    target: &Target,
    span: TimeInterval,
    conflicts: &mut ConflictLog,
) -> ScheduledTarget {
    let mid = span.midpoint_datetime();
    let min_altitude = ctx.constraints().min_altitude;
    let visibility = ctx.oracle.visibility(target, ctx.site(), min_altitude, mid);
    let feasibility = ctx.oracle.feasibility(target, ctx.site(), min_altitude, mid);

    if !ctx.horizon.contains(&span) {
        conflicts.push(SessionConflict::for_target(
            ConflictKind::SessionWindow,
            target.id.clone(),
            format!("Locked slot for {} lies outside tonight's session window", target.name),
        ));
    }

    if let Some(check) = ctx.safety_check(target, &span) {
        for issue in check.issues.iter().filter(|i| i.severity >= Severity::Warning) {
            conflicts.push(SessionConflict::for_target(
                ConflictKind::MountSafety,
                target.id.clone(),
                issue.message.clone(),
            ));
        }
    }

    ScheduledTarget {
        target: target.clone(),
        start_time: span.start_datetime(),
        end_time: span.end_datetime(),
        duration: span_hours(span.duration()),
        transit_time: visibility.transit_time,
        max_altitude: visibility.transit_altitude,
        moon_distance: ctx.moon_distance(target, mid),
        feasibility,
        conflicts: Vec::new(),
        is_locked: true,
        is_manual: true,
        desired: Some(DesiredDuration {
            minutes: span_minutes(span.duration()),
            source: DurationSource::Manual,
        }),
        order: 0,
    }
}

/// Resolves every locked manual item into a fixed entry.
///
/// Items that cannot be resolved raise a `manual-time` conflict and their
/// target is kept out of the rest of the run.
pub(crate) fn lock_manual_items<O: SkyOracle + ?Sized>(
    ctx: &RunContext<'_, O>,
    conflicts: &mut ConflictLog,
) -> LockedPhase {
    let mut claimed = HashSet::new();
    let mut fixed_spans: Vec<(&Target, TimeInterval)> = Vec::new();
    let mut floating: Vec<(&Target, Minutes)> = Vec::new();

    for item in ctx.request.manual_edits.iter().filter(|i| i.locked) {
        if ctx.request.excluded.contains(&item.target_id) {
            continue;
        }
        if !claimed.insert(item.target_id.clone()) {
            conflicts.push(SessionConflict::for_target(
                ConflictKind::ManualTime,
                item.target_id.clone(),
                "Target is locked more than once; extra entries ignored",
            ));
            continue;
        }
        let Some(target) = ctx.request.target(&item.target_id) else {
            log::warn!("locked item references unknown target {}", item.target_id);
            conflicts.push(SessionConflict::for_target(
                ConflictKind::ManualTime,
                item.target_id.clone(),
                format!("Unknown target {}", item.target_id),
            ));
            continue;
        };

        match resolve_span(ctx, item, target) {
            Ok(LockedSpan::Fixed(span)) => fixed_spans.push((target, span)),
            Ok(LockedSpan::Floating(duration)) => floating.push((target, duration)),
            Err(message) => {
                log::warn!("dropping locked item for {}: {}", target.id, message);
                conflicts.push(SessionConflict::for_target(
                    ConflictKind::ManualTime,
                    target.id.clone(),
                    message,
                ));
            }
        }
    }

    let mut taken: Vec<TimeInterval> = fixed_spans.iter().map(|(_, span)| *span).collect();
    for (target, duration) in floating {
        match earliest_clear_span(&ctx.horizon.window, &taken, duration) {
            Some(span) => {
                taken.push(span);
                fixed_spans.push((target, span));
            }
            None => {
                log::warn!("no room for locked duration of {}", target.id);
                conflicts.push(SessionConflict::for_target(
                    ConflictKind::ManualTime,
                    target.id.clone(),
                    format!("No room for a {:.0}-minute locked slot", duration.value()),
                ));
            }
        }
    }

    let entries = fixed_spans
        .into_iter()
        .map(|(target, span)| locked_entry(ctx, target, span, conflicts))
        .collect();

    LockedPhase { entries, claimed }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hours(from: f64, to: f64) -> TimeInterval {
        TimeInterval::from_f64(from * 3_600_000.0, to * 3_600_000.0)
    }

    #[test]
    fn floating_slot_skips_taken_spans() {
        let horizon = hours(0.0, 10.0);
        let taken = vec![hours(0.0, 1.0), hours(1.5, 3.0)];
        let span = earliest_clear_span(&horizon, &taken, Minutes::new(60.0)).unwrap();
        assert_eq!(span, hours(3.0, 4.0));
    }

    #[test]
    fn floating_slot_fits_in_a_gap() {
        let horizon = hours(0.0, 10.0);
        let taken = vec![hours(0.0, 1.0), hours(2.0, 3.0)];
        let span = earliest_clear_span(&horizon, &taken, Minutes::new(60.0)).unwrap();
        assert_eq!(span, hours(1.0, 2.0));
    }

    #[test]
    fn floating_slot_with_nothing_taken_starts_at_horizon() {
        let horizon = hours(2.0, 10.0);
        let span = earliest_clear_span(&horizon, &[], Minutes::new(30.0)).unwrap();
        assert_eq!(span, hours(2.0, 2.5));
    }

    #[test]
    fn full_horizon_has_no_floating_slot() {
        let horizon = hours(0.0, 10.0);
        let taken = vec![hours(0.0, 10.0)];
        assert!(earliest_clear_span(&horizon, &taken, Minutes::new(60.0)).is_none());
    }

    #[test]
    fn slot_may_not_run_past_horizon_end() {
        let horizon = hours(0.0, 10.0);
        let taken = vec![hours(0.0, 9.5)];
        assert!(earliest_clear_span(&horizon, &taken, Minutes::new(60.0)).is_none());
        assert!(earliest_clear_span(&hours(0.0, 0.5), &[], Minutes::new(60.0)).is_none());
    }

    #[test]
    fn unrepresentable_durations_are_rejected() {
        assert!(chrono_minutes(Minutes::new(1e12)).is_none());
        assert!(chrono_minutes(Minutes::new(f64::NAN)).is_none());
        assert_eq!(chrono_minutes(Minutes::new(90.0)), Some(Duration::minutes(90)));
    }

    #[test]
    fn zero_duration_has_no_slot() {
        assert!(earliest_clear_span(&hours(0.0, 1.0), &[], Minutes::new(0.0)).is_none());
    }
}
