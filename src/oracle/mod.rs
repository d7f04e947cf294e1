//! Celestial geometry consumed by the scheduler.
//!
//! The scheduler never computes rise/set times itself; it asks a [`SkyOracle`]
//! for each target's visibility and feasibility at an explicit reference time.
//! [`StandardOracle`] answers from the low-precision models in
//! [`crate::astro`], but tests and callers with better ephemerides can plug in
//! their own.

mod site;
mod standard;

pub use site::{Site, Twilight};
pub use standard::StandardOracle;

use chrono::{DateTime, Utc};
use qtty::{Degrees, Hours};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::astro;
use crate::target::{EquatorialCoords, Target};
use crate::timeline::TimeInterval;

/// Where and when a target can be imaged around a reference time.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Visibility {
    pub transit_time: Option<DateTime<Utc>>,
    pub transit_altitude: Degrees,
    /// Time above the minimum altitude around the transit.
    pub imaging_window: Option<TimeInterval>,
    /// Imaging window clipped to astronomical darkness.
    pub dark_imaging_window: Option<TimeInterval>,
    pub dark_imaging_hours: Hours,
    pub is_circumpolar: bool,
    pub never_rises: bool,
}

impl Visibility {
    /// A target that is never above the minimum altitude.
    pub fn hidden(transit_altitude: Degrees) -> Self {
        Self {
            transit_time: None,
            transit_altitude,
            imaging_window: None,
            dark_imaging_window: None,
            dark_imaging_hours: Hours::new(0.0),
            is_circumpolar: false,
            never_rises: true,
        }
    }
}

/// Verbal grade of a feasibility score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Recommendation {
    Excellent,
    Good,
    Fair,
    Poor,
    NotRecommended,
}

impl Recommendation {
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 80.0 => Self::Excellent,
            s if s >= 60.0 => Self::Good,
            s if s >= 40.0 => Self::Fair,
            s if s >= 20.0 => Self::Poor,
            _ => Self::NotRecommended,
        }
    }
}

/// How worthwhile a target is tonight. All scores are 0–100.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Feasibility {
    pub score: f64,
    pub moon_score: f64,
    pub altitude_score: f64,
    pub duration_score: f64,
    pub twilight_score: f64,
    pub recommendation: Recommendation,
    pub warnings: Vec<String>,
    pub tips: Vec<String>,
}

impl Feasibility {
    /// Composite of the component scores.
    pub fn from_components(altitude: f64, duration: f64, moon: f64, twilight: f64) -> Self {
        let score =
            (0.35 * altitude + 0.3 * duration + 0.25 * moon + 0.1 * twilight).clamp(0.0, 100.0);
        Self {
            score,
            moon_score: moon,
            altitude_score: altitude,
            duration_score: duration,
            twilight_score: twilight,
            recommendation: Recommendation::from_score(score),
            warnings: Vec::new(),
            tips: Vec::new(),
        }
    }
}

/// Source of per-target sky geometry.
///
/// Every query takes an explicit reference time so that repeated runs with
/// the same inputs give the same answers.
pub trait SkyOracle {
    fn visibility(
        &self,
        target: &Target,
        site: &Site,
        min_altitude: Degrees,
        reference: DateTime<Utc>,
    ) -> Visibility;

    fn feasibility(
        &self,
        target: &Target,
        site: &Site,
        min_altitude: Degrees,
        reference: DateTime<Utc>,
    ) -> Feasibility;

    fn moon_position(&self, at: DateTime<Utc>) -> EquatorialCoords {
        astro::moon_position(at)
    }

    /// Illuminated fraction of the Moon, percent.
    fn moon_illumination(&self, at: DateTime<Utc>) -> f64 {
        astro::moon_illumination(at)
    }
}

impl<O: SkyOracle + ?Sized> SkyOracle for &O {
    fn visibility(
        &self,
        target: &Target,
        site: &Site,
        min_altitude: Degrees,
        reference: DateTime<Utc>,
    ) -> Visibility {
        (**self).visibility(target, site, min_altitude, reference)
    }

    fn feasibility(
        &self,
        target: &Target,
        site: &Site,
        min_altitude: Degrees,
        reference: DateTime<Utc>,
    ) -> Feasibility {
        (**self).feasibility(target, site, min_altitude, reference)
    }

    fn moon_position(&self, at: DateTime<Utc>) -> EquatorialCoords {
        (**self).moon_position(at)
    }

    fn moon_illumination(&self, at: DateTime<Utc>) -> f64 {
        (**self).moon_illumination(at)
    }
}
