//! Greedy placement of the remaining targets into the free parts of the night.
//!
//! Candidates are ranked once (priority, then the strategy key) and placed one
//! at a time into the best-scoring free slot. Placement never backtracks: a
//! later target cannot reclaim time from an earlier one, so the result is a
//! good heuristic plan rather than an optimal packing.

use std::cmp::Ordering;
use std::collections::HashSet;

use chrono::{DateTime, Utc};
use qtty::{Millisecond, Minutes, Quantity};

use super::clock::ClockTime;
use super::conflict::{ConflictKind, ConflictLog, SessionConflict};
use super::context::RunContext;
use super::model::{
    DesiredDuration, DurationSource, ManualScheduleItem, ScheduledTarget, SessionRequest, Strategy,
};
use crate::oracle::{Feasibility, SkyOracle, Visibility};
use crate::target::Target;
use crate::timeline::{clamp, intersect, subtract_many, Interval, TimeInterval};
use crate::units::{instant_of, minutes_span, span_hours, span_minutes, Instant};
use crate::Id;

/// Added per priority weight so that priority dominates every strategy score.
const PRIORITY_BONUS: f64 = 10_000.0;
/// Proximity used when a target has no transit to measure against, minutes.
const NO_TRANSIT_PROXIMITY: f64 = 720.0;

/// A target that can be placed somewhere tonight.
pub(crate) struct Candidate<'a> {
    pub target: &'a Target,
    pub visibility: Visibility,
    pub feasibility: Feasibility,
    pub dark_window: TimeInterval,
    pub desired: DesiredDuration,
    pub preferred_start: Option<Instant>,
    pub is_manual: bool,
}

impl Candidate<'_> {
    fn transit(&self) -> Option<Instant> {
        self.visibility.transit_time.map(instant_of)
    }
}

/// The best placement found for one candidate so far.
struct Choice {
    score: f64,
    span: TimeInterval,
    moon_distance: f64,
    planned: Minutes,
}

fn desired_duration(
    target: &Target,
    manual: Option<&ManualScheduleItem>,
    dark_window: &TimeInterval,
    use_exposure_plan: bool,
    minimum: Minutes,
) -> DesiredDuration {
    let manual_minutes = manual.and_then(|m| m.duration_minutes);
    let (minutes, source) = match (manual_minutes, target.desired_exposure) {
        (Some(minutes), _) => (Minutes::new(minutes), DurationSource::Manual),
        (None, Some(plan)) if use_exposure_plan => (plan, DurationSource::ExposurePlan),
        _ => (span_minutes(dark_window.duration()), DurationSource::Window),
    };
    let minutes = if minutes.value() < minimum.value() { minimum } else { minutes };
    DesiredDuration { minutes, source }
}

/// Builds the candidate list for everything not locked or excluded, in
/// placement order.
pub(crate) fn collect_candidates<'a, O: SkyOracle + ?Sized>(
    ctx: &RunContext<'a, O>,
    claimed: &HashSet<Id>,
    conflicts: &mut ConflictLog,
) -> Vec<Candidate<'a>> {
    let constraints = ctx.constraints();
    let reference = ctx.horizon.window.midpoint_datetime();
    let minimum = constraints.min_imaging_time;

    let request: &'a SessionRequest = ctx.request;
    let mut candidates = Vec::new();
    for target in &request.targets {
        if claimed.contains(&target.id) || request.excluded.contains(&target.id) {
            continue;
        }

        let visibility = ctx
            .oracle
            .visibility(target, ctx.site(), constraints.min_altitude, reference);
        let Some(dark_window) = visibility
            .dark_imaging_window
            .and_then(|w| intersect(&w, &ctx.horizon.window))
        else {
            log::debug!("{}: not visible in the dark horizon", target.id);
            continue;
        };
        if span_minutes(dark_window.duration()).value() < minimum.value() {
            log::debug!("{}: dark window shorter than the minimum", target.id);
            continue;
        }

        let manual = request
            .manual_edits
            .iter()
            .find(|m| !m.locked && m.target_id == target.id);
        let preferred_start = manual
            .and_then(|m| m.start_time.as_deref())
            .and_then(|raw| {
                let resolved = raw
                    .parse::<ClockTime>()
                    .and_then(|clock| ctx.resolve(clock));
                match resolved {
                    Ok(r) => Some(instant_of(r.at)),
                    Err(e) => {
                        conflicts.push(SessionConflict::for_target(
                            ConflictKind::ManualTime,
                            target.id.clone(),
                            format!("Preferred start ignored: {e}"),
                        ));
                        None
                    }
                }
            });

        let desired = desired_duration(
            target,
            manual,
            &dark_window,
            constraints.use_exposure_plan_duration,
            minimum,
        );
        let feasibility = ctx
            .oracle
            .feasibility(target, ctx.site(), constraints.min_altitude, reference);

        candidates.push(Candidate {
            target,
            visibility,
            feasibility,
            dark_window,
            desired,
            preferred_start,
            is_manual: manual.is_some(),
        });
    }

    let strategy = ctx.config.strategy;
    candidates.sort_by(|a, b| compare_candidates(a, b, strategy));
    candidates
}

fn desc(a: f64, b: f64) -> Ordering {
    b.total_cmp(&a)
}

/// Priority weight first, then the strategy key, then id for determinism.
pub(crate) fn compare_candidates(
    a: &Candidate<'_>,
    b: &Candidate<'_>,
    strategy: Strategy,
) -> Ordering {
    let by_priority = b.target.priority.weight().cmp(&a.target.priority.weight());
    let by_strategy = match strategy {
        Strategy::Altitude => desc(
            a.visibility.transit_altitude.value(),
            b.visibility.transit_altitude.value(),
        ),
        Strategy::Transit => match (a.transit(), b.transit()) {
            (Some(x), Some(y)) => x.value().total_cmp(&y.value()),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        },
        Strategy::Duration => {
            desc(a.dark_window.duration().value(), b.dark_window.duration().value())
        }
        Strategy::Moon => desc(a.feasibility.moon_score, b.feasibility.moon_score),
        Strategy::Balanced => desc(a.feasibility.score, b.feasibility.score),
    };
    by_priority
        .then(by_strategy)
        .then_with(|| a.target.id.cmp(&b.target.id))
}

fn strategy_score(
    strategy: Strategy,
    candidate: &Candidate<'_>,
    span: &TimeInterval,
    moon_distance: f64,
    planned: Minutes,
) -> f64 {
    let feasibility = candidate.feasibility.score;
    let transit_altitude = candidate.visibility.transit_altitude.value();
    let planned = planned.value();
    let proximity = candidate
        .transit()
        .map(|t| {
            let offset = (span.midpoint().value() - t.value()).abs();
            span_minutes(Quantity::<Millisecond>::new(offset)).value()
        })
        .unwrap_or(NO_TRANSIT_PROXIMITY);

    match strategy {
        Strategy::Balanced => {
            3.0 * feasibility + 2.0 * transit_altitude + 2.0 * moon_distance + planned
        }
        Strategy::Altitude => 5.0 * transit_altitude - proximity / 2.0 + planned,
        Strategy::Transit => 1000.0 - 2.0 * proximity + planned / 2.0,
        Strategy::Duration => 4.0 * planned + feasibility,
        Strategy::Moon => 5.0 * moon_distance + feasibility + planned,
    }
}

/// Start anchors for a block of `planned` inside `room`, clamped and deduplicated.
fn anchors(
    candidate: &Candidate<'_>,
    room: &TimeInterval,
    planned: Quantity<Millisecond>,
) -> Vec<Instant> {
    let latest = room.end() - planned;
    let raw = [
        candidate.preferred_start,
        candidate.transit().map(|t| t - planned / 2.0),
        Some(room.start()),
        Some(latest),
    ];

    let mut starts: Vec<Instant> = Vec::with_capacity(raw.len());
    for anchor in raw.into_iter().flatten() {
        let start = clamp(anchor, room.start(), latest);
        if !starts.iter().any(|s| (s.value() - start.value()).abs() < 1.0) {
            starts.push(start);
        }
    }
    starts
}

fn best_choice<O: SkyOracle + ?Sized>(
    ctx: &RunContext<'_, O>,
    candidate: &Candidate<'_>,
    free: &[TimeInterval],
) -> Option<Choice> {
    let constraints = ctx.constraints();
    let minimum = constraints.min_imaging_time.value();
    let bonus = PRIORITY_BONUS * f64::from(candidate.target.priority.weight());
    let enforce_mount = constraints.enforce_mount_safety;

    let mut best: Option<Choice> = None;
    for slot in free {
        let Some(room) = intersect(slot, &candidate.dark_window) else {
            continue;
        };
        let room_minutes = span_minutes(room.duration()).value();
        if room_minutes < minimum {
            continue;
        }
        let planned = Minutes::new(candidate.desired.minutes.value().min(room_minutes));
        let planned_span = minutes_span(planned);

        for start in anchors(candidate, &room, planned_span) {
            let Some(span) = Interval::try_new(start, start + planned_span) else {
                continue;
            };
            let mid: DateTime<Utc> = span.midpoint_datetime();

            let moon_distance = ctx.moon_distance(candidate.target, mid);
            if let Some(min_moon) = constraints.min_moon_distance {
                if moon_distance < min_moon.value() {
                    continue;
                }
            }

            if enforce_mount {
                if let Some(check) = ctx.safety_check(candidate.target, &span) {
                    let in_flip_window =
                        constraints.avoid_meridian_flip_window && check.touches_flip_window;
                    if !check.is_safe || in_flip_window {
                        continue;
                    }
                }
            }

            let strategy = ctx.config.strategy;
            let score = strategy_score(strategy, candidate, &span, moon_distance, planned) + bonus;
            if best.as_ref().map_or(true, |b| score > b.score) {
                best = Some(Choice {
                    score,
                    span,
                    moon_distance,
                    planned,
                });
            }
        }
    }
    best
}

/// Places candidates in order around the `locked` spans.
pub(crate) fn place_candidates<O: SkyOracle + ?Sized>(
    ctx: &RunContext<'_, O>,
    candidates: Vec<Candidate<'_>>,
    locked: &[TimeInterval],
    conflicts: &mut ConflictLog,
) -> Vec<ScheduledTarget> {
    let horizon = ctx.horizon.window;
    let mut occupied: Vec<TimeInterval> = locked.to_vec();
    let mut free = subtract_many(&horizon, &occupied);
    let mut placed = Vec::new();

    for candidate in candidates {
        let Some(choice) = best_choice(ctx, &candidate, &free) else {
            log::debug!("{}: no admissible slot, dropped", candidate.target.id);
            continue;
        };
        log::debug!(
            "{}: placed at {} for {:.0} min (score {:.1})",
            candidate.target.id,
            choice.span,
            choice.planned.value(),
            choice.score
        );

        if choice.planned.value() + 1e-6 < candidate.desired.minutes.value() {
            conflicts.push(SessionConflict::for_target(
                ConflictKind::InsufficientDuration,
                candidate.target.id.clone(),
                format!(
                    "Planned {:.0} of {:.0} desired minutes",
                    choice.planned.value(),
                    candidate.desired.minutes.value()
                ),
            ));
        }

        occupied.push(choice.span);
        free = subtract_many(&horizon, &occupied);

        placed.push(ScheduledTarget {
            target: candidate.target.clone(),
            start_time: choice.span.start_datetime(),
            end_time: choice.span.end_datetime(),
            duration: span_hours(choice.span.duration()),
            transit_time: candidate.visibility.transit_time,
            max_altitude: candidate.visibility.transit_altitude,
            moon_distance: choice.moon_distance,
            feasibility: candidate.feasibility,
            conflicts: Vec::new(),
            is_locked: false,
            is_manual: candidate.is_manual,
            desired: Some(candidate.desired),
            order: 0,
        });
    }
    placed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::Priority;
    use qtty::{Degrees, Hours};

    fn minutes(from: f64, to: f64) -> TimeInterval {
        TimeInterval::from_f64(from * 60_000.0, to * 60_000.0)
    }

    fn candidate(target: &Target, transit_min: Option<f64>, feasibility: f64) -> Candidate<'_> {
        Candidate {
            target,
            visibility: Visibility {
                transit_time: transit_min
                    .map(|m| crate::units::datetime_of(Quantity::new(m * 60_000.0))),
                transit_altitude: Degrees::new(60.0),
                imaging_window: None,
                dark_imaging_window: None,
                dark_imaging_hours: Hours::new(0.0),
                is_circumpolar: false,
                never_rises: false,
            },
            feasibility: Feasibility::from_components(
                feasibility,
                feasibility,
                feasibility,
                feasibility,
            ),
            dark_window: minutes(0.0, 600.0),
            desired: DesiredDuration {
                minutes: Minutes::new(60.0),
                source: DurationSource::Window,
            },
            preferred_start: None,
            is_manual: false,
        }
    }

    #[test]
    fn desired_duration_prefers_manual_then_plan_then_window() {
        let window = minutes(0.0, 240.0);
        let minimum = Minutes::new(30.0);
        let target = Target::new("a", "A", 0.0, 0.0).with_desired_exposure(90.0);
        let manual = ManualScheduleItem::new("a").lasting(45.0);

        let d = desired_duration(&target, Some(&manual), &window, true, minimum);
        assert_eq!((d.minutes.value(), d.source), (45.0, DurationSource::Manual));

        let d = desired_duration(&target, None, &window, true, minimum);
        assert_eq!((d.minutes.value(), d.source), (90.0, DurationSource::ExposurePlan));

        let d = desired_duration(&target, None, &window, false, minimum);
        assert_eq!((d.minutes.value(), d.source), (240.0, DurationSource::Window));

        let short = Target::new("b", "B", 0.0, 0.0).with_desired_exposure(10.0);
        let d = desired_duration(&short, None, &window, true, minimum);
        assert_eq!(d.minutes.value(), 30.0);
    }

    #[test]
    fn priority_outranks_strategy_key() {
        let high = Target::new("z", "Z", 0.0, 0.0).with_priority(Priority::High);
        let low = Target::new("a", "A", 0.0, 0.0).with_priority(Priority::Low);
        let a = candidate(&high, None, 10.0);
        let b = candidate(&low, None, 90.0);
        assert_eq!(compare_candidates(&a, &b, Strategy::Balanced), Ordering::Less);
    }

    #[test]
    fn ties_break_on_id() {
        let x = Target::new("x", "X", 0.0, 0.0);
        let y = Target::new("y", "Y", 0.0, 0.0);
        let a = candidate(&x, None, 50.0);
        let b = candidate(&y, None, 50.0);
        assert_eq!(compare_candidates(&a, &b, Strategy::Balanced), Ordering::Less);
    }

    #[test]
    fn transit_strategy_orders_earliest_first() {
        let x = Target::new("x", "X", 0.0, 0.0);
        let y = Target::new("y", "Y", 0.0, 0.0);
        let late = candidate(&x, Some(300.0), 50.0);
        let early = candidate(&y, Some(100.0), 50.0);
        assert_eq!(compare_candidates(&early, &late, Strategy::Transit), Ordering::Less);
    }

    #[test]
    fn anchors_are_clamped_and_unique() {
        let t = Target::new("t", "T", 0.0, 0.0);
        let mut c = candidate(&t, Some(10.0), 50.0);
        c.preferred_start = Some(Quantity::new(0.0));
        let room = minutes(0.0, 120.0);
        let starts = anchors(&c, &room, minutes_span(Minutes::new(60.0)));
        // preferred 0, transit-centred clamps to 0, window start 0, latest 60.
        assert_eq!(starts.len(), 2);
        assert_eq!(starts[0].value(), 0.0);
        assert_eq!(starts[1].value(), 60.0 * 60_000.0);
    }
}
