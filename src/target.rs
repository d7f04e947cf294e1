//! Imaging targets.

use qtty::{Degrees, Minutes};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::Id;

/// Equatorial coordinates (J2000-ish, degrees).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EquatorialCoords {
    /// Right ascension, `[0, 360)`.
    pub ra: Degrees,
    /// Declination, `[-90, 90]`.
    pub dec: Degrees,
}

impl EquatorialCoords {
    pub fn new(ra_deg: f64, dec_deg: f64) -> Self {
        Self {
            ra: Degrees::new(ra_deg),
            dec: Degrees::new(dec_deg),
        }
    }
}

/// User-assigned importance of a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    /// Ordering weight: high = 2, medium = 1, low = 0.
    pub const fn weight(self) -> u8 {
        match self {
            Self::High => 2,
            Self::Medium => 1,
            Self::Low => 0,
        }
    }
}

/// A celestial object the user wants to image tonight.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Target {
    pub id: Id,
    pub name: String,
    pub coordinates: EquatorialCoords,
    #[cfg_attr(feature = "serde", serde(default))]
    pub priority: Priority,
    /// Total exposure the user's plan calls for, if one exists.
    #[cfg_attr(feature = "serde", serde(default))]
    pub desired_exposure: Option<Minutes>,
}

impl Target {
    pub fn new(id: impl Into<Id>, name: impl Into<String>, ra_deg: f64, dec_deg: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            coordinates: EquatorialCoords::new(ra_deg, dec_deg),
            priority: Priority::default(),
            desired_exposure: None,
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_desired_exposure(mut self, minutes: f64) -> Self {
        self.desired_exposure = Some(Minutes::new(minutes));
        self
    }

    pub fn ra(&self) -> f64 {
        self.coordinates.ra.value()
    }

    pub fn dec(&self) -> f64 {
        self.coordinates.dec.value()
    }
}
