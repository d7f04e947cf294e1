//! Dry run of a night's target sequence.

use chrono::{DateTime, Utc};
use qtty::Seconds;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::config::MountSafetyConfig;
use super::engine::{check_target_safety, TargetSafetyCheck, DEFAULT_SAMPLE_INTERVAL};
use super::issue::{SafetyIssue, SafetyIssueKind, Severity};
use crate::astro::angular_separation;
use crate::oracle::Site;
use crate::target::Target;
use crate::timeline::TimeInterval;
use crate::Id;

/// Declination beyond which a slew is considered to pass near the pole.
const POLE_DEC_LIMIT: f64 = 85.0;
/// RA change that sends a slew across the pole rather than around it.
const POLE_RA_SWING: f64 = 90.0;
/// Accumulated RA rotation that risks wrapping cables.
const CABLE_WRAP_LIMIT: f64 = 360.0;

/// One target and the window it is tracked for.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SequenceStep {
    pub target: Target,
    pub window: TimeInterval,
}

impl SequenceStep {
    pub fn new(target: Target, window: TimeInterval) -> Self {
        Self { target, window }
    }
}

/// Slew between two consecutive steps.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Slew {
    pub from: Id,
    pub to: Id,
    pub start: DateTime<Utc>,
    pub separation_deg: f64,
    pub duration: Seconds,
    pub meridian_flip: bool,
    pub through_pole: bool,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SimulationResult {
    pub checks: Vec<TargetSafetyCheck>,
    pub slews: Vec<Slew>,
    /// Sequence-level issues; per-target issues stay on their check.
    pub issues: Vec<SafetyIssue>,
    pub total_slew_time: Seconds,
    pub meridian_flips: usize,
    pub cumulative_rotation_deg: f64,
    pub cable_wrap_risk: bool,
    pub is_safe: bool,
}

/// Smallest absolute RA difference, `[0, 180]`.
fn wrapped_ra_delta(a: f64, b: f64) -> f64 {
    let d = (a - b).rem_euclid(360.0);
    d.min(360.0 - d)
}

fn near_visible_pole(dec: f64, latitude: f64) -> bool {
    if latitude >= 0.0 {
        dec > POLE_DEC_LIMIT
    } else {
        dec < -POLE_DEC_LIMIT
    }
}

/// Checks every step with the mount engine and models the slews between them.
///
/// Steps are processed in start order regardless of input order.
pub fn simulate_sequence(
    steps: &[SequenceStep],
    config: &MountSafetyConfig,
    site: &Site,
) -> SimulationResult {
    let mut ordered: Vec<&SequenceStep> = steps.iter().collect();
    ordered.sort_by(|a, b| {
        a.window
            .start()
            .value()
            .partial_cmp(&b.window.start().value())
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let checks: Vec<TargetSafetyCheck> = ordered
        .iter()
        .map(|s| check_target_safety(&s.target, &s.window, site, config, DEFAULT_SAMPLE_INTERVAL))
        .collect();

    let mut slews = Vec::with_capacity(ordered.len().saturating_sub(1));
    let mut issues = Vec::new();
    let mut cumulative_rotation_deg = 0.0;
    let mut cable_wrap_risk = false;

    for (i, pair) in ordered.windows(2).enumerate() {
        let (prev, next) = (pair[0], pair[1]);
        let separation_deg = angular_separation(&prev.target.coordinates, &next.target.coordinates);
        let duration =
            Seconds::new(separation_deg / config.slew_rate_deg_per_sec + config.settle_seconds);

        let meridian_flip = config.mount_type.is_gem()
            && checks[i].pier_side_end != checks[i + 1].pier_side_start;

        let lat = site.latitude_deg();
        let through_pole = (near_visible_pole(prev.target.dec(), lat)
            || near_visible_pole(next.target.dec(), lat))
            && wrapped_ra_delta(prev.target.ra(), next.target.ra()) > POLE_RA_SWING;
        let start = prev.window.end_datetime();
        if through_pole {
            issues.push(SafetyIssue::new(
                SafetyIssueKind::SlewThroughPole,
                Severity::Warning,
                next.target.id.clone(),
                next.target.name.clone(),
                start,
                format!(
                    "Slew from {} to {} passes near the pole",
                    prev.target.name, next.target.name
                ),
            ));
        }

        cumulative_rotation_deg += (next.target.ra() - prev.target.ra()).abs();
        if !cable_wrap_risk && cumulative_rotation_deg > CABLE_WRAP_LIMIT {
            cable_wrap_risk = true;
            issues.push(SafetyIssue::new(
                SafetyIssueKind::CableWrap,
                Severity::Warning,
                next.target.id.clone(),
                next.target.name.clone(),
                start,
                format!("Accumulated RA rotation {:.0}° exceeds one turn", cumulative_rotation_deg),
            ));
        }

        slews.push(Slew {
            from: prev.target.id.clone(),
            to: next.target.id.clone(),
            start,
            separation_deg,
            duration,
            meridian_flip,
            through_pole,
        });
    }

    let total_slew_time = slews.iter().fold(Seconds::new(0.0), |acc, s| acc + s.duration);
    let meridian_flips = slews.iter().filter(|s| s.meridian_flip).count()
        + checks.iter().filter(|c| c.needs_meridian_flip).count();
    let is_safe = checks.iter().all(|c| c.is_safe) && !issues.iter().any(SafetyIssue::is_danger);

    log::debug!(
        "simulated {} steps: {:.0}s slewing, {} flips, rotation {:.0}°",
        checks.len(),
        total_slew_time.value(),
        meridian_flips,
        cumulative_rotation_deg
    );

    SimulationResult {
        checks,
        slews,
        issues,
        total_slew_time,
        meridian_flips,
        cumulative_rotation_deg,
        cable_wrap_risk,
        is_safe,
    }
}
