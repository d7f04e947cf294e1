//! Shared, read-only state of one scheduling run.

use chrono::{DateTime, FixedOffset, Utc};

use super::clock::{resolve_near_dusk, ClockError, ClockTime, ResolvedTime};
use super::horizon::Horizon;
use super::model::{ConstraintSet, SchedulerConfig, SessionRequest};
use crate::astro::angular_separation;
use crate::mount::{check_target_safety, TargetSafetyCheck, DEFAULT_SAMPLE_INTERVAL};
use crate::oracle::{Site, SkyOracle};
use crate::target::Target;
use crate::timeline::TimeInterval;

pub(crate) struct RunContext<'a, O: ?Sized> {
    pub oracle: &'a O,
    pub config: &'a SchedulerConfig,
    pub request: &'a SessionRequest,
    pub horizon: Horizon,
}

impl<'a, O: SkyOracle + ?Sized> RunContext<'a, O> {
    pub fn site(&self) -> &Site {
        &self.config.site
    }

    pub fn constraints(&self) -> &ConstraintSet {
        &self.config.constraints
    }

    pub fn offset(&self) -> FixedOffset {
        self.config.site.offset()
    }

    /// Pins a local clock time to tonight.
    pub fn resolve(&self, clock: ClockTime) -> Result<ResolvedTime, ClockError> {
        resolve_near_dusk(
            clock,
            self.request.plan_date,
            self.offset(),
            self.horizon.dusk(),
            self.horizon.dawn(),
        )
    }

    pub fn moon_distance(&self, target: &Target, at: DateTime<Utc>) -> f64 {
        angular_separation(&target.coordinates, &self.oracle.moon_position(at))
    }

    /// Mount safety over `span`, when mount limits are configured.
    pub fn safety_check(&self, target: &Target, span: &TimeInterval) -> Option<TargetSafetyCheck> {
        self.config
            .mount
            .as_ref()
            .map(|mount| {
                check_target_safety(target, span, self.site(), mount, DEFAULT_SAMPLE_INTERVAL)
            })
    }
}
