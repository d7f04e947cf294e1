//! nightplan - night-session planning for astrophotography
//!
//! A constraint-based interval scheduler that packs a night's targets into
//! astronomical darkness, together with the mount-safety engine it consults
//! (hour-angle and declination limits, meridian flips, counterweight and pier
//! collision heuristics, slew and cable-wrap simulation).
//!
//! ```no_run
//! use chrono::{NaiveDate, TimeZone, Utc};
//! use nightplan::oracle::{Site, StandardOracle, Twilight};
//! use nightplan::session::{SchedulerConfig, SessionRequest, SessionScheduler};
//! use nightplan::target::Target;
//!
//! let twilight = Twilight::astronomical(
//!     Utc.with_ymd_and_hms(2024, 3, 10, 19, 30, 0).unwrap(),
//!     Utc.with_ymd_and_hms(2024, 3, 11, 4, 30, 0).unwrap(),
//! );
//! let request = SessionRequest::new(
//!     vec![Target::new("m42", "Orion Nebula", 83.82, -5.39)],
//!     twilight.clone(),
//!     NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
//! );
//! let scheduler = SessionScheduler::new(SchedulerConfig::new(Site::new(40.0, -3.7)));
//! let plan = scheduler.schedule(&StandardOracle::new(twilight), &request);
//! for entry in &plan.targets {
//!     println!("{} {} -> {}", entry.target.name, entry.start_time, entry.end_time);
//! }
//! ```

pub mod astro;
pub mod mount;
pub mod oracle;
pub mod session;
pub mod target;
pub mod timeline;
pub mod units;

// Re-export unit conversion traits for ergonomic use
pub use units::{convert, SameDim};

pub use mount::{check_target_safety, simulate_sequence, MountSafetyConfig};
pub use oracle::{SkyOracle, StandardOracle};
pub use session::{
    schedule_session, SchedulerConfig, SessionPlan, SessionRequest, SessionScheduler,
};
pub use target::Target;

/// Identifier type used for targets.
pub type Id = String;
