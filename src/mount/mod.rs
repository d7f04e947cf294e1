//! Mount safety: per-target limit checks and whole-sequence slew simulation.

mod config;
pub mod engine;
mod error;
mod issue;
pub mod simulator;

pub use config::{MeridianFlipConfig, MountSafetyConfig, MountType};
pub use engine::{check_target_safety, TargetSafetyCheck, DEFAULT_SAMPLE_INTERVAL};
pub use error::ConfigError;
pub use issue::{PierSide, SafetyIssue, SafetyIssueKind, Severity};
pub use simulator::{simulate_sequence, SequenceStep, SimulationResult, Slew};
