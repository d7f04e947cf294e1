//! Night session scheduling.
//!
//! A run goes through four phases:
//!
//! 1. **Horizon**: astronomical darkness, optionally narrowed to the user's
//!    `HH:MM` session window.
//! 2. **Lock**: locked manual edits are pinned exactly where the user put
//!    them, even when they break other constraints (those become conflicts).
//! 3. **Place**: every other target is greedily placed, in priority order,
//!    into what is left of the horizon.
//! 4. **Aggregate**: entries are ordered and the plan-level metrics,
//!    conflicts and advice are derived.
//!
//! Structural problems never panic; they come back as conflicts on a plan
//! that may be empty.

mod aggregate;
mod clock;
mod conflict;
mod context;
mod horizon;
mod lock;
mod model;
mod placement;


pub use clock::{ClockError, ClockTime};
pub use conflict::{ConflictKind, SessionConflict};
pub use model::{
    ConstraintSet, DesiredDuration, DurationSource, ManualScheduleItem, PlanAdvice, PlanWarning,
    ScheduledTarget, SchedulerConfig, SessionPlan, SessionRequest, SessionWindow, Strategy,
    WeatherLimits, WeatherSnapshot,
};

use crate::oracle::SkyOracle;
use crate::timeline::TimeInterval;

use self::conflict::ConflictLog;
use self::context::RunContext;

/// Plans nights for one observer setup.
#[derive(Debug, Clone, Default)]
pub struct SessionScheduler {
    config: SchedulerConfig,
}

impl SessionScheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Builds the plan for one night.
    ///
    /// Deterministic: the same request against the same oracle yields the
    /// same plan.
    pub fn schedule<O: SkyOracle + ?Sized>(
        &self,
        oracle: &O,
        request: &SessionRequest,
    ) -> SessionPlan {
        let mut conflicts = ConflictLog::default();

        let offset = self.config.site.offset();
        let horizon = match horizon::resolve_horizon(
            &request.twilight,
            self.config.constraints.session_window.as_ref(),
            request.plan_date,
            offset,
        ) {
            Ok(horizon) => horizon,
            Err(conflict) => {
                log::info!("no horizon for {}: {}", request.plan_date, conflict.message);
                conflicts.push(conflict);
                return SessionPlan::empty(conflicts.into_vec());
            }
        };

        let ctx = RunContext {
            oracle,
            config: &self.config,
            request,
            horizon,
        };

        let locked = lock::lock_manual_items(&ctx, &mut conflicts);
        let locked_spans: Vec<TimeInterval> =
            locked.entries.iter().map(ScheduledTarget::interval).collect();

        let candidates = placement::collect_candidates(&ctx, &locked.claimed, &mut conflicts);
        log::debug!(
            "{} locked entries, {} candidates for {}",
            locked.entries.len(),
            candidates.len(),
            request.plan_date
        );
        let placed = placement::place_candidates(&ctx, candidates, &locked_spans, &mut conflicts);

        let mut entries = locked.entries;
        entries.extend(placed);
        aggregate::build_plan(&ctx, entries, conflicts)
    }
}

/// One-shot convenience over [`SessionScheduler::schedule`].
pub fn schedule_session<O: SkyOracle + ?Sized>(
    oracle: &O,
    config: &SchedulerConfig,
    request: &SessionRequest,
) -> SessionPlan {
    SessionScheduler::new(config.clone()).schedule(oracle, request)
}
