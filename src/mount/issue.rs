use chrono::{DateTime, Utc};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::Id;

/// Side of the pier the tube is on for a German equatorial mount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum PierSide {
    East,
    West,
}

impl PierSide {
    /// Pier side implied by a signed hour angle (hours).
    pub fn from_hour_angle(ha_hours: f64) -> Self {
        if ha_hours >= 0.0 {
            Self::East
        } else {
            Self::West
        }
    }

    pub const fn flipped(self) -> Self {
        match self {
            Self::East => Self::West,
            Self::West => Self::East,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SafetyIssueKind {
    MeridianFlip,
    HourAngleLimit,
    DecLimit,
    BelowHorizon,
    CounterweightUp,
    CableWrap,
    PierCollision,
    SlewThroughPole,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Severity {
    Info,
    Warning,
    Danger,
}

/// A problem the mount would run into while tracking or slewing.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SafetyIssue {
    pub kind: SafetyIssueKind,
    pub severity: Severity,
    pub target_id: Id,
    pub target_name: String,
    pub time: DateTime<Utc>,
    pub message: String,
    pub hour_angle: Option<f64>,
    pub altitude: Option<f64>,
    pub pier_side: Option<PierSide>,
}

impl SafetyIssue {
    pub fn new(
        kind: SafetyIssueKind,
        severity: Severity,
        target_id: impl Into<Id>,
        target_name: impl Into<String>,
        time: DateTime<Utc>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            severity,
            target_id: target_id.into(),
            target_name: target_name.into(),
            time,
            message: message.into(),
            hour_angle: None,
            altitude: None,
            pier_side: None,
        }
    }

    pub fn with_hour_angle(mut self, ha_hours: f64) -> Self {
        self.hour_angle = Some(ha_hours);
        self
    }

    pub fn with_altitude(mut self, alt_deg: f64) -> Self {
        self.altitude = Some(alt_deg);
        self
    }

    pub fn with_pier_side(mut self, side: PierSide) -> Self {
        self.pier_side = Some(side);
        self
    }

    pub fn is_danger(&self) -> bool {
        self.severity == Severity::Danger
    }
}
