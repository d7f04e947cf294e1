//! Per-target safety evaluation.
//!
//! The engine walks a tracking window at a fixed cadence and reports every
//! limit the mount would hit: hour-angle and declination limits, dropping
//! below the horizon, the meridian flip, and the GEM-specific counterweight
//! and pier geometry.

use chrono::{DateTime, Duration, Utc};
use qtty::Minutes;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::config::MountSafetyConfig;
use super::issue::{PierSide, SafetyIssue, SafetyIssueKind, Severity};
use crate::astro::{self, SIDEREAL_RATIO};
use crate::oracle::Site;
use crate::target::Target;
use crate::timeline::TimeInterval;
use crate::units::{datetime_of, minutes_span};
use crate::Id;

/// Default cadence for sampling a tracking window.
pub const DEFAULT_SAMPLE_INTERVAL: Minutes = Minutes::new(5.0);
/// Upper bound on samples per window; long windows get a coarser cadence.
const MAX_SAMPLES: f64 = 2_000.0;

/// Hour angle (hours) inside which a GEM tube can swing into the pier.
const PIER_COLLISION_HA_HOURS: f64 = 0.5;
/// Declination band around the site latitude where that swing is possible.
const PIER_COLLISION_DEC_BAND: f64 = 10.0;
/// Optical train length (tube plus counterweight) the thresholds are tuned for.
const REFERENCE_TRAIN_MM: f64 = 800.0;

/// Outcome of [`check_target_safety`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TargetSafetyCheck {
    pub target_id: Id,
    pub target_name: String,
    pub window: TimeInterval,
    pub is_safe: bool,
    pub issues: Vec<SafetyIssue>,
    pub pier_side_start: PierSide,
    pub pier_side_end: PierSide,
    pub needs_meridian_flip: bool,
    pub meridian_flip_time: Option<DateTime<Utc>>,
    /// The window reaches into `[crossing - before, crossing + after]` of a
    /// meridian crossing (GEM with flips enabled only).
    pub touches_flip_window: bool,
    pub hour_angle_start: f64,
    pub hour_angle_end: f64,
    pub min_altitude: f64,
    pub max_altitude: f64,
}

impl TargetSafetyCheck {
    pub fn dangers(&self) -> impl Iterator<Item = &SafetyIssue> {
        self.issues.iter().filter(|i| i.is_danger())
    }
}

/// Time from `at` until the target next crosses the meridian.
fn until_next_crossing(ha_hours: f64) -> Duration {
    let hours = if ha_hours < 0.0 { -ha_hours } else { 24.0 - ha_hours };
    Duration::milliseconds((hours * SIDEREAL_RATIO * 3_600_000.0).round() as i64)
}

/// A flip margin as a chrono duration; unrepresentable margins count as zero.
fn margin(minutes: Minutes) -> Duration {
    let ms = minutes_span(minutes).value().round();
    if !ms.is_finite() || ms.abs() >= i64::MAX as f64 {
        return Duration::zero();
    }
    Duration::try_milliseconds(ms as i64).unwrap_or_default()
}

fn exceeds_hour_angle_limit(ha_hours: f64, config: &MountSafetyConfig) -> bool {
    (ha_hours < 0.0 && -ha_hours > config.hour_angle_limit_east.value())
        || (ha_hours > 0.0 && ha_hours > config.hour_angle_limit_west.value())
}

/// Scales the collision thresholds with the length of the optical train.
fn collision_scale(config: &MountSafetyConfig) -> f64 {
    let train = config.telescope_length_mm + config.counterweight_length_mm;
    (train / REFERENCE_TRAIN_MM).clamp(0.5, 2.0)
}

/// Evaluates the mount's safety while tracking `target` across `window`.
///
/// Samples every `sample` (bounded in count, window end always included).
pub fn check_target_safety(
    target: &Target,
    window: &TimeInterval,
    site: &Site,
    config: &MountSafetyConfig,
    sample: Minutes,
) -> TargetSafetyCheck {
    let start = window.start_datetime();
    let end = window.end_datetime();
    let (ra, dec) = (target.ra(), target.dec());
    let (lat, lon) = (site.latitude_deg(), site.longitude_deg());
    let is_gem = config.mount_type.is_gem();

    let ha_start = astro::hour_angle_hours(start, ra, lon);
    let ha_end = astro::hour_angle_hours(end, ra, lon);
    let pier_side_start = PierSide::from_hour_angle(ha_start);

    let issue = |kind, severity, time, message: String| {
        SafetyIssue::new(kind, severity, target.id.clone(), target.name.clone(), time, message)
    };
    let mut issues = Vec::new();

    if dec < config.dec_limit_min.value() || dec > config.dec_limit_max.value() {
        issues.push(issue(
            SafetyIssueKind::DecLimit,
            Severity::Danger,
            start,
            format!(
                "Declination {:.1}° outside mount limits [{:.1}°, {:.1}°]",
                dec,
                config.dec_limit_min.value(),
                config.dec_limit_max.value()
            ),
        ));
    }

    let mut meridian_flip_time = None;
    let mut touches_flip_window = false;
    if is_gem && config.meridian_flip.enabled {
        let before = margin(config.meridian_flip.minutes_before_meridian);
        let after = margin(config.meridian_flip.minutes_after_meridian);
        let crossing = start + until_next_crossing(ha_start);
        let previous = crossing - until_next_crossing(0.0);
        touches_flip_window = [previous, crossing].into_iter().any(|c| {
            let opens = c.checked_sub_signed(before).unwrap_or(c);
            let closes = c.checked_add_signed(after).unwrap_or(c);
            opens <= end && closes >= start
        });
        if crossing >= start && crossing <= end {
            let flip_at = crossing.checked_add_signed(after).unwrap_or(crossing);
            meridian_flip_time = Some(flip_at);
            issues.push(
                issue(
                    SafetyIssueKind::MeridianFlip,
                    Severity::Info,
                    flip_at,
                    format!("Meridian flip required at {}", flip_at.format("%H:%M UTC")),
                )
                .with_hour_angle(0.0)
                .with_pier_side(pier_side_start.flipped()),
            );
        }
    }

    let scale = collision_scale(config);
    let collision_ha = PIER_COLLISION_HA_HOURS * scale;
    let collision_band = PIER_COLLISION_DEC_BAND * scale;

    let span = window.duration().value();
    let step = minutes_span(sample).value().max(span / MAX_SAMPLES).max(1.0);

    let mut min_altitude = f64::INFINITY;
    let mut max_altitude = f64::NEG_INFINITY;
    let mut below_reported: Option<Severity> = None;
    let mut in_ha_violation = false;
    let mut in_collision = false;
    let mut counterweight_reported = false;

    let mut offset = 0.0;
    loop {
        let at = datetime_of(window.start() + qtty::Quantity::new(offset));
        let ha = astro::hour_angle_hours(at, ra, lon);
        let alt = astro::altitude_from_hour_angle(ha, dec, lat);
        min_altitude = min_altitude.min(alt);
        max_altitude = max_altitude.max(alt);

        let pier = match meridian_flip_time {
            Some(flip_at) if at >= flip_at => pier_side_start.flipped(),
            _ => pier_side_start,
        };

        if alt < config.min_altitude.value() {
            let severity = if alt < 0.0 { Severity::Danger } else { Severity::Warning };
            if below_reported.map_or(true, |s| severity > s) {
                issues.push(
                    issue(
                        SafetyIssueKind::BelowHorizon,
                        severity,
                        at,
                        format!(
                            "Altitude {:.1}° below limit {:.1}°",
                            alt,
                            config.min_altitude.value()
                        ),
                    )
                    .with_altitude(alt)
                    .with_hour_angle(ha),
                );
                below_reported = Some(severity);
            }
        } else {
            below_reported = None;
        }

        let ha_violation = exceeds_hour_angle_limit(ha, config);
        if ha_violation && !in_ha_violation {
            issues.push(
                issue(
                    SafetyIssueKind::HourAngleLimit,
                    Severity::Danger,
                    at,
                    format!("Hour angle {:+.2}h beyond mount limit", ha),
                )
                .with_hour_angle(ha)
                .with_pier_side(pier),
            );
        }
        in_ha_violation = ha_violation;

        if is_gem
            && !counterweight_reported
            && ha > 0.0
            && pier == PierSide::West
            && meridian_flip_time.is_none()
        {
            issues.push(
                issue(
                    SafetyIssueKind::CounterweightUp,
                    Severity::Warning,
                    at,
                    "Target past the meridian without a flip; counterweight rising".to_string(),
                )
                .with_hour_angle(ha)
                .with_pier_side(pier),
            );
            counterweight_reported = true;
        }

        let collision = is_gem && ha.abs() < collision_ha && (dec - lat).abs() < collision_band;
        if collision && !in_collision {
            issues.push(
                issue(
                    SafetyIssueKind::PierCollision,
                    Severity::Warning,
                    at,
                    format!("Tube may strike the pier near the meridian (dec {:.1}°)", dec),
                )
                .with_hour_angle(ha)
                .with_altitude(alt)
                .with_pier_side(pier),
            );
        }
        in_collision = collision;

        if offset >= span {
            break;
        }
        offset = (offset + step).min(span);
    }

    let pier_side_end = match meridian_flip_time {
        Some(flip_at) if flip_at <= end => pier_side_start.flipped(),
        _ if is_gem => pier_side_start,
        _ => PierSide::from_hour_angle(ha_end),
    };

    let is_safe = !issues.iter().any(SafetyIssue::is_danger);
    TargetSafetyCheck {
        target_id: target.id.clone(),
        target_name: target.name.clone(),
        window: *window,
        is_safe,
        issues,
        pier_side_start,
        pier_side_end,
        needs_meridian_flip: meridian_flip_time.is_some(),
        meridian_flip_time,
        touches_flip_window,
        hour_angle_start: ha_start,
        hour_angle_end: ha_end,
        min_altitude,
        max_altitude,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mount::MountType;
    use chrono::TimeZone;
    use qtty::{Degrees, Hours};

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, h, m, 0).unwrap()
    }

    fn window(from: DateTime<Utc>, hours: i64) -> TimeInterval {
        TimeInterval::from_datetimes(from, from + Duration::hours(hours)).unwrap()
    }

    fn run_check(
        target: &Target,
        window: &TimeInterval,
        site: &Site,
        config: &MountSafetyConfig,
    ) -> TargetSafetyCheck {
        check_target_safety(target, window, site, config, DEFAULT_SAMPLE_INTERVAL)
    }

    /// A target whose hour angle at `when` equals `ha_hours` for a site at longitude 0.
    fn target_at_hour_angle(when: DateTime<Utc>, ha_hours: f64, dec: f64) -> Target {
        let lst = astro::lst_degrees(when, 0.0);
        let ra = (lst - ha_hours * 15.0).rem_euclid(360.0);
        Target::new("t", "Test", ra, dec)
    }

    #[test]
    fn flip_detected_when_crossing_inside_window() {
        let start = at(22, 0);
        let target = target_at_hour_angle(start, -1.0, 20.0);
        let site = Site::new(45.0, 0.0);
        let config = MountSafetyConfig::default();
        let check = run_check(&target, &window(start, 3), &site, &config);

        assert!(check.needs_meridian_flip);
        assert_eq!(check.pier_side_start, PierSide::West);
        assert_eq!(check.pier_side_end, PierSide::East);
        let flip = check.meridian_flip_time.unwrap();
        let expected = start + Duration::minutes(60) - Duration::seconds(10) + Duration::minutes(5);
        assert!((flip - expected).num_seconds().abs() < 30);
        assert!(check
            .issues
            .iter()
            .any(|i| i.kind == SafetyIssueKind::MeridianFlip && i.severity == Severity::Info));
        assert!(check.is_safe);
    }

    #[test]
    fn flip_window_covers_margins_around_the_crossing() {
        let start = at(22, 0);
        let site = Site::new(45.0, 0.0);
        let config = MountSafetyConfig::default();
        let check = |ha: f64| {
            let target = target_at_hour_angle(start, ha, 20.0);
            run_check(&target, &window(start, 1), &site, &config)
        };

        // Crossed three minutes before the window opens.
        let just_after = check(0.05);
        assert!(!just_after.needs_meridian_flip);
        assert!(just_after.touches_flip_window);

        // Crosses three minutes after the window closes.
        let just_before = check(-1.05);
        assert!(!just_before.needs_meridian_flip);
        assert!(just_before.touches_flip_window);

        assert!(!check(-3.0).touches_flip_window);
        assert!(check(-0.5).touches_flip_window);
    }

    #[test]
    fn oversized_flip_delay_does_not_overflow() {
        let start = at(22, 0);
        let target = target_at_hour_angle(start, -1.0, 20.0);
        let mut config = MountSafetyConfig::default();
        config.meridian_flip.minutes_after_meridian = Minutes::new(1e15);
        let check = check_target_safety(
            &target,
            &window(start, 3),
            &Site::new(45.0, 0.0),
            &config,
            DEFAULT_SAMPLE_INTERVAL,
        );
        assert!(check.needs_meridian_flip);
    }

    #[test]
    fn dec_limits_flag_danger() {
        let start = at(22, 0);
        let target = target_at_hour_angle(start, -3.0, 70.0);
        let site = Site::new(45.0, 0.0);
        let config = MountSafetyConfig {
            dec_limit_min: Degrees::new(0.0),
            dec_limit_max: Degrees::new(0.0),
            ..MountSafetyConfig::default()
        };
        let check = run_check(&target, &window(start, 1), &site, &config);
        assert!(!check.is_safe);
        let dec_issue = check.dangers().find(|i| i.kind == SafetyIssueKind::DecLimit).unwrap();
        assert_eq!(dec_issue.time, start);
    }

    #[test]
    fn counterweight_up_without_flip() {
        let start = at(22, 0);
        let target = target_at_hour_angle(start, -0.5, 10.0);
        let site = Site::new(45.0, 0.0);
        let mut config = MountSafetyConfig::default();
        config.meridian_flip.enabled = false;
        let check = run_check(&target, &window(start, 2), &site, &config);
        assert!(!check.needs_meridian_flip);
        let count = check
            .issues
            .iter()
            .filter(|i| i.kind == SafetyIssueKind::CounterweightUp)
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn fork_mount_has_no_gem_issues() {
        let start = at(22, 0);
        let target = target_at_hour_angle(start, -0.5, 45.0);
        let site = Site::new(45.0, 0.0);
        let config = MountSafetyConfig {
            mount_type: MountType::Fork,
            ..MountSafetyConfig::default()
        };
        let check = run_check(&target, &window(start, 2), &site, &config);
        assert!(!check.needs_meridian_flip);
        assert!(check.issues.iter().all(|i| !matches!(
            i.kind,
            SafetyIssueKind::CounterweightUp
                | SafetyIssueKind::PierCollision
                | SafetyIssueKind::MeridianFlip
        )));
    }

    #[test]
    fn pier_collision_near_zenith_transit() {
        let start = at(22, 0);
        let target = target_at_hour_angle(start, -0.25, 47.0);
        let site = Site::new(45.0, 0.0);
        let config = MountSafetyConfig::default();
        let check = run_check(&target, &window(start, 1), &site, &config);
        let collisions = check
            .issues
            .iter()
            .filter(|i| i.kind == SafetyIssueKind::PierCollision)
            .count();
        assert_eq!(collisions, 1);
    }

    #[test]
    fn hour_angle_limit_recorded_per_violation_run() {
        let start = at(22, 0);
        let target = target_at_hour_angle(start, 1.5, 30.0);
        let site = Site::new(45.0, 0.0);
        let config = MountSafetyConfig {
            hour_angle_limit_west: Hours::new(2.0),
            ..MountSafetyConfig::default()
        };
        let check = run_check(&target, &window(start, 2), &site, &config);
        let runs = check
            .issues
            .iter()
            .filter(|i| i.kind == SafetyIssueKind::HourAngleLimit)
            .count();
        assert_eq!(runs, 1);
        assert!(!check.is_safe);
    }

    #[test]
    fn below_horizon_escalates_once() {
        let start = at(22, 0);
        // Setting southern target: starts above 0°, ends well below.
        let target = target_at_hour_angle(start, 3.0, -30.0);
        let site = Site::new(45.0, 0.0);
        let config = MountSafetyConfig {
            min_altitude: Degrees::new(10.0),
            hour_angle_limit_west: Hours::new(12.0),
            ..MountSafetyConfig::default()
        };
        let check = run_check(&target, &window(start, 3), &site, &config);
        let below: Vec<_> = check
            .issues
            .iter()
            .filter(|i| i.kind == SafetyIssueKind::BelowHorizon)
            .collect();
        assert_eq!(below.len(), 2);
        assert_eq!(below[0].severity, Severity::Warning);
        assert_eq!(below[1].severity, Severity::Danger);
        assert!(check.min_altitude < 0.0);
    }

    #[test]
    fn sample_count_is_bounded_and_end_is_sampled() {
        let start = at(22, 0);
        let target = target_at_hour_angle(start, -2.0, 30.0);
        let site = Site::new(45.0, 0.0);
        let config = MountSafetyConfig::default();
        let check =
            check_target_safety(&target, &window(start, 4), &site, &config, Minutes::new(0.0));
        let end_at = start + Duration::hours(4);
        let end_alt = astro::altitude_deg(&target.coordinates, end_at, 45.0, 0.0);
        assert!(check.max_altitude >= end_alt - 1e-9);
    }
}
