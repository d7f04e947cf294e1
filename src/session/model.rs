//! Inputs and outputs of a scheduling run.

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use qtty::{Degrees, Hours, Minutes};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::conflict::SessionConflict;
#[cfg(feature = "serde")]
use crate::mount::ConfigError;
use crate::mount::{MountSafetyConfig, SequenceStep};
use crate::oracle::{Feasibility, Site, Twilight};
use crate::target::Target;
use crate::timeline::TimeInterval;
use crate::units::{instant_of, span_minutes};
use crate::Id;

/// What the greedy placement optimizes for after priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Strategy {
    /// Highest culmination first, placed close to transit.
    Altitude,
    /// Earliest transit first, centred on transit.
    Transit,
    /// Longest dark window first, longest placement wins.
    Duration,
    /// Least moon-affected first.
    Moon,
    #[default]
    Balanced,
}

/// Upper bounds on acceptable weather. Unset limits are not checked.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct WeatherLimits {
    pub max_cloud_cover: Option<f64>,
    pub max_humidity: Option<f64>,
    pub max_wind_speed: Option<f64>,
}

/// Forecast or current conditions for the night.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WeatherSnapshot {
    /// Percent.
    pub cloud_cover: f64,
    /// Percent.
    pub humidity: f64,
    pub wind_speed: f64,
}

/// Local clock bounds (`HH:MM`) the user wants to observe within.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SessionWindow {
    pub start: String,
    pub end: String,
}

impl SessionWindow {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }
}

/// Hard and soft limits applied to every target.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ConstraintSet {
    pub min_altitude: Degrees,
    pub min_imaging_time: Minutes,
    pub min_moon_distance: Option<Degrees>,
    pub weather_limits: Option<WeatherLimits>,
    pub enforce_mount_safety: bool,
    pub avoid_meridian_flip_window: bool,
    pub session_window: Option<SessionWindow>,
    /// Size placements from each target's exposure plan when it has one.
    pub use_exposure_plan_duration: bool,
}

impl Default for ConstraintSet {
    fn default() -> Self {
        Self {
            min_altitude: Degrees::new(30.0),
            min_imaging_time: Minutes::new(30.0),
            min_moon_distance: None,
            weather_limits: None,
            enforce_mount_safety: false,
            avoid_meridian_flip_window: false,
            session_window: None,
            use_exposure_plan_duration: true,
        }
    }
}

/// A user edit for one target. Locked items are hard constraints; unlocked
/// ones only hint at a preferred start and duration.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ManualScheduleItem {
    pub target_id: Id,
    #[cfg_attr(feature = "serde", serde(default))]
    pub start_time: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub end_time: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub duration_minutes: Option<f64>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub locked: bool,
}

impl ManualScheduleItem {
    pub fn new(target_id: impl Into<Id>) -> Self {
        Self {
            target_id: target_id.into(),
            start_time: None,
            end_time: None,
            duration_minutes: None,
            locked: false,
        }
    }

    pub fn starting_at(mut self, hhmm: impl Into<String>) -> Self {
        self.start_time = Some(hhmm.into());
        self
    }

    pub fn ending_at(mut self, hhmm: impl Into<String>) -> Self {
        self.end_time = Some(hhmm.into());
        self
    }

    pub fn lasting(mut self, minutes: f64) -> Self {
        self.duration_minutes = Some(minutes);
        self
    }

    pub fn locked(mut self) -> Self {
        self.locked = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum DurationSource {
    ExposurePlan,
    Manual,
    Window,
}

/// How long a target wanted to be imaged, and why.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DesiredDuration {
    pub minutes: Minutes,
    pub source: DurationSource,
}

/// One slot of the final plan.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ScheduledTarget {
    pub target: Target,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration: Hours,
    pub transit_time: Option<DateTime<Utc>>,
    pub max_altitude: Degrees,
    /// Moon separation at the slot midpoint, degrees.
    pub moon_distance: f64,
    pub feasibility: Feasibility,
    /// Names of other entries this one overlaps.
    pub conflicts: Vec<String>,
    pub is_locked: bool,
    pub is_manual: bool,
    pub desired: Option<DesiredDuration>,
    /// 1-based position in the night.
    pub order: usize,
}

impl ScheduledTarget {
    pub fn interval(&self) -> TimeInterval {
        let start = instant_of(self.start_time);
        TimeInterval::new(start, instant_of(self.end_time.max(self.start_time)))
    }

    pub fn duration_minutes(&self) -> f64 {
        (self.end_time - self.start_time).num_milliseconds() as f64 / 60_000.0
    }
}

impl From<&ScheduledTarget> for SequenceStep {
    fn from(entry: &ScheduledTarget) -> Self {
        SequenceStep::new(entry.target.clone(), entry.interval())
    }
}

/// Localizable suggestion for the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PlanAdvice {
    AddTargets,
    LowCoverage,
    FillGaps,
    UseNarrowband,
}

impl PlanAdvice {
    pub const fn key(self) -> &'static str {
        match self {
            Self::AddTargets => "session.recommendations.add_targets",
            Self::LowCoverage => "session.recommendations.low_coverage",
            Self::FillGaps => "session.recommendations.fill_gaps",
            Self::UseNarrowband => "session.recommendations.use_narrowband",
        }
    }
}

/// Localizable caution for the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PlanWarning {
    NoTargets,
    BrightMoon,
    LowEfficiency,
    UnresolvedConflicts,
}

impl PlanWarning {
    pub const fn key(self) -> &'static str {
        match self {
            Self::NoTargets => "session.warnings.no_targets",
            Self::BrightMoon => "session.warnings.bright_moon",
            Self::LowEfficiency => "session.warnings.low_efficiency",
            Self::UnresolvedConflicts => "session.warnings.unresolved_conflicts",
        }
    }
}

/// Result of a scheduling run.
///
/// A non-empty `conflicts` list is informational; only an empty `targets`
/// list means nothing could be scheduled.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SessionPlan {
    pub targets: Vec<ScheduledTarget>,
    pub total_imaging_time: Hours,
    /// Percent of astronomical darkness covered by entries, at most 100.
    pub night_coverage: f64,
    /// Percent of entries with feasibility of at least 70.
    pub efficiency: f64,
    /// Uncovered stretches of the horizon longer than 15 minutes.
    pub gaps: Vec<TimeInterval>,
    pub recommendations: Vec<PlanAdvice>,
    pub warnings: Vec<PlanWarning>,
    pub conflicts: Vec<SessionConflict>,
}

impl SessionPlan {
    /// A plan with nothing scheduled.
    pub fn empty(conflicts: Vec<SessionConflict>) -> Self {
        Self {
            targets: Vec::new(),
            total_imaging_time: Hours::new(0.0),
            night_coverage: 0.0,
            efficiency: 0.0,
            gaps: Vec::new(),
            recommendations: vec![PlanAdvice::AddTargets],
            warnings: vec![PlanWarning::NoTargets],
            conflicts,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn entry(&self, target_id: &str) -> Option<&ScheduledTarget> {
        self.targets.iter().find(|t| t.target.id == target_id)
    }

    pub fn gap_minutes(&self) -> f64 {
        self.gaps.iter().map(|g| span_minutes(g.duration()).value()).sum()
    }

    /// Entries in order as a mount simulation sequence.
    pub fn sequence(&self) -> Vec<SequenceStep> {
        self.targets.iter().map(SequenceStep::from).collect()
    }
}

/// Everything that varies from night to night.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SessionRequest {
    pub targets: Vec<Target>,
    pub twilight: Twilight,
    /// Local date the night starts on.
    pub plan_date: NaiveDate,
    #[cfg_attr(feature = "serde", serde(default))]
    pub excluded: HashSet<Id>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub manual_edits: Vec<ManualScheduleItem>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub weather: Option<WeatherSnapshot>,
}

impl SessionRequest {
    pub fn new(targets: Vec<Target>, twilight: Twilight, plan_date: NaiveDate) -> Self {
        Self {
            targets,
            twilight,
            plan_date,
            excluded: HashSet::new(),
            manual_edits: Vec::new(),
            weather: None,
        }
    }

    pub fn with_manual_edit(mut self, item: ManualScheduleItem) -> Self {
        self.manual_edits.push(item);
        self
    }

    pub fn excluding(mut self, target_id: impl Into<Id>) -> Self {
        self.excluded.insert(target_id.into());
        self
    }

    pub fn with_weather(mut self, weather: WeatherSnapshot) -> Self {
        self.weather = Some(weather);
        self
    }

    pub fn target(&self, id: &str) -> Option<&Target> {
        self.targets.iter().find(|t| t.id == id)
    }
}

/// Settings that stay fixed across nights for one observer.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SchedulerConfig {
    pub site: Site,
    pub strategy: Strategy,
    pub constraints: ConstraintSet,
    /// Mount limits; without them no safety checks run.
    pub mount: Option<MountSafetyConfig>,
}

impl SchedulerConfig {
    pub fn new(site: Site) -> Self {
        Self {
            site,
            ..Self::default()
        }
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_constraints(mut self, constraints: ConstraintSet) -> Self {
        self.constraints = constraints;
        self
    }

    pub fn with_mount(mut self, mount: MountSafetyConfig) -> Self {
        self.mount = Some(mount);
        self
    }

    /// Parses a TOML document; the mount section is validated when present.
    #[cfg(feature = "serde")]
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        if let Some(mount) = &config.mount {
            mount.validate()?;
        }
        Ok(config)
    }
}
