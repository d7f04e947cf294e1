//! Oracle backed by the built-in astronomy models.

use chrono::{DateTime, Duration, Utc};
use qtty::{Degrees, Hours};

use super::{Feasibility, Site, SkyOracle, Twilight, Visibility};
use crate::astro::{self, SIDEREAL_RATIO};
use crate::target::Target;
use crate::timeline::{intersect, TimeInterval};
use crate::units::span_hours;

/// Dark-imaging hours at which the duration score saturates.
const FULL_DURATION_HOURS: f64 = 4.0;
/// Moon separation at which the moon score saturates, degrees.
const FULL_MOON_SEPARATION: f64 = 90.0;

/// [`SkyOracle`] using geometric rise/set around the nearest transit and a
/// fixed twilight table for the night.
#[derive(Debug, Clone, Default)]
pub struct StandardOracle {
    twilight: Twilight,
}

impl StandardOracle {
    pub fn new(twilight: Twilight) -> Self {
        Self { twilight }
    }

    pub fn twilight(&self) -> &Twilight {
        &self.twilight
    }
}

fn sidereal_hours(hours: f64) -> Duration {
    Duration::milliseconds((hours * SIDEREAL_RATIO * 3_600_000.0).round() as i64)
}

/// Altitude window around one transit, `None` when the target stays below.
fn window_around(transit: DateTime<Utc>, half_width_hours: f64) -> Option<TimeInterval> {
    let half = sidereal_hours(half_width_hours);
    TimeInterval::from_datetimes(transit - half, transit + half)
}

impl SkyOracle for StandardOracle {
    fn visibility(
        &self,
        target: &Target,
        site: &Site,
        min_altitude: Degrees,
        reference: DateTime<Utc>,
    ) -> Visibility {
        let lat = site.latitude_deg().to_radians();
        let dec = target.dec().to_radians();
        let transit_altitude =
            Degrees::new(astro::transit_altitude_deg(target.dec(), site.latitude_deg()));

        let denom = lat.cos() * dec.cos();
        let cos_h0 = if denom.abs() < 1e-12 {
            // At a pole (site or target) altitude is constant.
            if transit_altitude.value() >= min_altitude.value() {
                -1.0
            } else {
                1.0
            }
        } else {
            (min_altitude.value().to_radians().sin() - lat.sin() * dec.sin()) / denom
        };

        let never_rises = cos_h0 >= 1.0;
        let is_circumpolar = cos_h0 <= -1.0;
        if never_rises {
            return Visibility::hidden(transit_altitude);
        }

        let half_width_hours = if is_circumpolar {
            12.0
        } else {
            cos_h0.acos().to_degrees() / 15.0
        };

        let ha_now = astro::hour_angle_hours(reference, target.ra(), site.longitude_deg());
        let nearest = reference - sidereal_hours(ha_now);
        let day = sidereal_hours(24.0);
        let darkness = self.twilight.darkness();

        // The night may be better served by the previous or next culmination.
        let mut best: Option<(DateTime<Utc>, TimeInterval, Option<TimeInterval>)> = None;
        for transit in [nearest - day, nearest, nearest + day] {
            let Some(window) = window_around(transit, half_width_hours) else {
                continue;
            };
            let dark = darkness.as_ref().and_then(|d| intersect(&window, d));
            let length =
                |iv: &Option<TimeInterval>| iv.map(|i| i.duration().value()).unwrap_or(0.0);
            let better = match &best {
                None => transit == nearest || dark.is_some(),
                Some((_, _, best_dark)) => length(&dark) > length(best_dark),
            };
            if better {
                best = Some((transit, window, dark));
            }
        }

        let (transit, window, mut dark) = match best {
            Some(found) => found,
            None => return Visibility::hidden(transit_altitude),
        };
        if is_circumpolar {
            // Always above the limit, so the whole night is usable.
            dark = darkness;
        }

        Visibility {
            transit_time: Some(transit),
            transit_altitude,
            imaging_window: Some(window),
            dark_imaging_window: dark,
            dark_imaging_hours: dark.map(|d| span_hours(d.duration())).unwrap_or(Hours::new(0.0)),
            is_circumpolar,
            never_rises: false,
        }
    }

    fn feasibility(
        &self,
        target: &Target,
        site: &Site,
        min_altitude: Degrees,
        reference: DateTime<Utc>,
    ) -> Feasibility {
        let vis = self.visibility(target, site, min_altitude, reference);

        let headroom = 90.0 - min_altitude.value();
        let altitude_score = if headroom <= 0.0 {
            0.0
        } else {
            let above = vis.transit_altitude.value() - min_altitude.value();
            (above / headroom * 100.0).clamp(0.0, 100.0)
        };

        let dark_hours = vis.dark_imaging_hours.value();
        let duration_score = (dark_hours / FULL_DURATION_HOURS * 100.0).clamp(0.0, 100.0);

        let illumination = self.moon_illumination(reference);
        let moon = self.moon_position(reference);
        let separation = astro::angular_separation(&target.coordinates, &moon);
        let distance_score = (separation / FULL_MOON_SEPARATION).min(1.0) * 100.0;
        let moon_score =
            (100.0 - illumination / 100.0 * (100.0 - distance_score)).clamp(0.0, 100.0);

        let twilight_score = match (vis.imaging_window, self.twilight.darkness()) {
            (Some(window), Some(dark)) => {
                let reachable = window.duration().value().min(dark.duration().value());
                if reachable > 0.0 {
                    let covered =
                        vis.dark_imaging_window.map(|d| d.duration().value()).unwrap_or(0.0);
                    (covered / reachable * 100.0).clamp(0.0, 100.0)
                } else {
                    0.0
                }
            }
            _ => 0.0,
        };

        let mut feasibility = Feasibility::from_components(
            altitude_score,
            duration_score,
            moon_score,
            twilight_score,
        );

        if vis.never_rises {
            feasibility
                .warnings
                .push(format!("{} never rises above {:.0}°", target.name, min_altitude.value()));
        } else if dark_hours < 1.0 {
            feasibility
                .warnings
                .push(format!("{} has less than one hour of dark imaging time", target.name));
        }
        if illumination > 50.0 && separation < 30.0 {
            feasibility
                .warnings
                .push(format!("Bright moon {:.0}° from {}", separation, target.name));
        }
        if illumination > 70.0 {
            feasibility.tips.push("Consider narrowband filters tonight".to_string());
        }
        if let (Some(transit), Some(dark)) = (vis.transit_time, self.twilight.darkness()) {
            if !dark.contains(crate::units::instant_of(transit)) {
                feasibility
                    .tips
                    .push(format!("{} transits outside astronomical darkness", target.name));
            }
        }

        feasibility
    }
}
