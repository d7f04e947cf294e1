//! Turns locked and placed entries into the final plan.

use qtty::{Hours, Minutes};

use super::conflict::{ConflictKind, ConflictLog, SessionConflict};
use super::context::RunContext;
use super::model::{
    PlanAdvice, PlanWarning, ScheduledTarget, SessionPlan, WeatherLimits, WeatherSnapshot,
};
use crate::oracle::SkyOracle;
use crate::timeline::{subtract_many, total_duration, TimeInterval};
use crate::units::{span_hours, span_minutes};

/// Gaps at or below this length are not worth reporting.
const MIN_GAP: Minutes = Minutes::new(15.0);
/// Feasibility score an entry needs to count as efficient.
const EFFICIENT_FEASIBILITY: f64 = 70.0;
const LOW_COVERAGE_PERCENT: f64 = 50.0;
const LOW_EFFICIENCY_PERCENT: f64 = 50.0;
const BRIGHT_MOON_PERCENT: f64 = 70.0;

fn weather_conflicts(
    entry: &ScheduledTarget,
    snapshot: &WeatherSnapshot,
    limits: &WeatherLimits,
) -> Vec<SessionConflict> {
    let checks = [
        ("Cloud cover", snapshot.cloud_cover, limits.max_cloud_cover, "%"),
        ("Humidity", snapshot.humidity, limits.max_humidity, "%"),
        ("Wind speed", snapshot.wind_speed, limits.max_wind_speed, ""),
    ];
    checks
        .into_iter()
        .filter_map(|(label, value, limit, unit)| {
            let limit = limit?;
            (value > limit).then(|| {
                SessionConflict::for_target(
                    ConflictKind::Weather,
                    entry.target.id.clone(),
                    format!("{label} {value:.0}{unit} exceeds limit {limit:.0}{unit}"),
                )
            })
        })
        .collect()
}

fn global_conflicts<O: SkyOracle + ?Sized>(
    ctx: &RunContext<'_, O>,
    entries: &[ScheduledTarget],
) -> Vec<SessionConflict> {
    let constraints = ctx.constraints();
    let mut found = Vec::new();

    for pair in entries.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        if a.interval().overlaps(&b.interval()) {
            found.push(SessionConflict::for_target(
                ConflictKind::Overlap,
                b.target.id.clone(),
                format!("{} overlaps {}", b.target.name, a.target.name),
            ));
        }
    }

    for entry in entries {
        if entry.max_altitude.value() < constraints.min_altitude.value() {
            found.push(SessionConflict::for_target(
                ConflictKind::Altitude,
                entry.target.id.clone(),
                format!(
                    "{} peaks at {:.0}°, below the {:.0}° minimum",
                    entry.target.name,
                    entry.max_altitude.value(),
                    constraints.min_altitude.value()
                ),
            ));
        }
        if let Some(min_moon) = constraints.min_moon_distance {
            if entry.moon_distance < min_moon.value() {
                found.push(SessionConflict::for_target(
                    ConflictKind::MoonDistance,
                    entry.target.id.clone(),
                    format!(
                        "Moon {:.0}° from {}, below the {:.0}° minimum",
                        entry.moon_distance,
                        entry.target.name,
                        min_moon.value()
                    ),
                ));
            }
        }
        let weather = (&ctx.request.weather, &constraints.weather_limits);
        if let (Some(snapshot), Some(limits)) = weather {
            found.extend(weather_conflicts(entry, snapshot, limits));
        }
    }
    found
}

/// Orders, annotates and scores the merged entries.
pub(crate) fn build_plan<O: SkyOracle + ?Sized>(
    ctx: &RunContext<'_, O>,
    mut entries: Vec<ScheduledTarget>,
    mut conflicts: ConflictLog,
) -> SessionPlan {
    entries.sort_by(|a, b| {
        a.start_time
            .cmp(&b.start_time)
            .then_with(|| a.target.id.cmp(&b.target.id))
    });

    let intervals: Vec<TimeInterval> = entries.iter().map(ScheduledTarget::interval).collect();
    let names: Vec<String> = entries.iter().map(|e| e.target.name.clone()).collect();
    for (i, entry) in entries.iter_mut().enumerate() {
        entry.order = i + 1;
        entry.conflicts = intervals
            .iter()
            .enumerate()
            .filter(|&(j, other)| j != i && other.overlaps(&intervals[i]))
            .map(|(j, _)| names[j].clone())
            .collect();
    }

    let horizon = ctx.horizon;
    let gaps: Vec<TimeInterval> = subtract_many(&horizon.window, &intervals)
        .into_iter()
        .filter(|g| span_minutes(g.duration()).value() > MIN_GAP.value())
        .collect();

    let total = total_duration(&intervals);
    let total_ms = total.value();
    let total_imaging_time: Hours = span_hours(total);
    let darkness_ms = horizon.darkness.duration().value();
    let night_coverage = if darkness_ms > 0.0 {
        (total_ms / darkness_ms * 100.0).min(100.0)
    } else {
        0.0
    };
    let efficiency = if entries.is_empty() {
        0.0
    } else {
        let efficient = entries
            .iter()
            .filter(|e| e.feasibility.score >= EFFICIENT_FEASIBILITY)
            .count();
        efficient as f64 / entries.len() as f64 * 100.0
    };

    conflicts.extend(global_conflicts(ctx, &entries));
    let conflicts = conflicts.into_vec();

    let illumination = ctx.oracle.moon_illumination(horizon.window.midpoint_datetime());
    let mut recommendations = Vec::new();
    let mut warnings = Vec::new();
    if entries.is_empty() {
        recommendations.push(PlanAdvice::AddTargets);
        warnings.push(PlanWarning::NoTargets);
    } else {
        if night_coverage < LOW_COVERAGE_PERCENT {
            recommendations.push(PlanAdvice::LowCoverage);
        }
        if efficiency < LOW_EFFICIENCY_PERCENT {
            warnings.push(PlanWarning::LowEfficiency);
        }
    }
    if !gaps.is_empty() {
        recommendations.push(PlanAdvice::FillGaps);
    }
    if illumination > BRIGHT_MOON_PERCENT {
        recommendations.push(PlanAdvice::UseNarrowband);
        warnings.push(PlanWarning::BrightMoon);
    }
    if !conflicts.is_empty() {
        warnings.push(PlanWarning::UnresolvedConflicts);
    }

    log::info!(
        "planned {} targets: {:.1} h imaging, {:.0}% coverage, {} gaps, {} conflicts",
        entries.len(),
        total_imaging_time.value(),
        night_coverage,
        gaps.len(),
        conflicts.len()
    );

    SessionPlan {
        targets: entries,
        total_imaging_time,
        night_coverage,
        efficiency,
        gaps,
        recommendations,
        warnings,
        conflicts,
    }
}
