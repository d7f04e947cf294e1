//! Physical limits of the telescope mount.

use qtty::{Degrees, Hours, Minutes};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::error::ConfigError;

/// Longest accepted flip margin on either side of the meridian.
const MAX_FLIP_MARGIN_MINUTES: f64 = 720.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum MountType {
    /// German equatorial: flips at the meridian, has a counterweight.
    #[default]
    Gem,
    Fork,
    Altaz,
}

impl MountType {
    pub const fn is_gem(self) -> bool {
        matches!(self, Self::Gem)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MeridianFlipConfig {
    pub enabled: bool,
    /// Margin before the crossing; with the delay after it, bounds the flip window.
    pub minutes_before_meridian: Minutes,
    /// Delay after the crossing before the flip is performed.
    pub minutes_after_meridian: Minutes,
}

impl Default for MeridianFlipConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            minutes_before_meridian: Minutes::new(5.0),
            minutes_after_meridian: Minutes::new(5.0),
        }
    }
}

/// Mount geometry and safety limits.
///
/// Hour-angle limits are magnitudes: east limit applies to negative hour
/// angles, west limit to positive ones.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MountSafetyConfig {
    pub mount_type: MountType,
    pub hour_angle_limit_east: Hours,
    pub hour_angle_limit_west: Hours,
    pub dec_limit_min: Degrees,
    pub dec_limit_max: Degrees,
    pub min_altitude: Degrees,
    pub meridian_flip: MeridianFlipConfig,

    // --- Collision heuristics ---
    pub telescope_length_mm: f64,
    pub counterweight_length_mm: f64,

    // --- Slew model ---
    pub slew_rate_deg_per_sec: f64,
    pub settle_seconds: f64,
}

impl Default for MountSafetyConfig {
    fn default() -> Self {
        Self {
            mount_type: MountType::Gem,
            hour_angle_limit_east: Hours::new(6.0),
            hour_angle_limit_west: Hours::new(6.0),
            dec_limit_min: Degrees::new(-90.0),
            dec_limit_max: Degrees::new(90.0),
            min_altitude: Degrees::new(0.0),
            meridian_flip: MeridianFlipConfig::default(),
            telescope_length_mm: 500.0,
            counterweight_length_mm: 300.0,
            slew_rate_deg_per_sec: 3.0,
            settle_seconds: 5.0,
        }
    }
}

impl MountSafetyConfig {
    /// Checks the limits for internal consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dec_limit_min.value() > self.dec_limit_max.value() {
            return Err(ConfigError::InvertedDecLimits {
                min: self.dec_limit_min.value(),
                max: self.dec_limit_max.value(),
            });
        }
        for (field, margin) in [
            ("minutes_before_meridian", self.meridian_flip.minutes_before_meridian),
            ("minutes_after_meridian", self.meridian_flip.minutes_after_meridian),
        ] {
            if !(0.0..=MAX_FLIP_MARGIN_MINUTES).contains(&margin.value()) {
                return Err(ConfigError::FlipMargin {
                    field,
                    value: margin.value(),
                });
            }
        }
        for (field, limit) in [
            ("hour_angle_limit_east", self.hour_angle_limit_east),
            ("hour_angle_limit_west", self.hour_angle_limit_west),
        ] {
            if !(0.0..=12.0).contains(&limit.value()) {
                return Err(ConfigError::HourAngleLimit {
                    field,
                    value: limit.value(),
                });
            }
        }
        if self.slew_rate_deg_per_sec <= 0.0 {
            return Err(ConfigError::NonPositive {
                field: "slew_rate_deg_per_sec",
                value: self.slew_rate_deg_per_sec,
            });
        }
        if self.telescope_length_mm <= 0.0 {
            return Err(ConfigError::NonPositive {
                field: "telescope_length_mm",
                value: self.telescope_length_mm,
            });
        }
        Ok(())
    }

    /// Parses and validates a TOML document; missing keys take defaults.
    #[cfg(feature = "serde")]
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = MountSafetyConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.mount_type.is_gem());
        assert!(config.meridian_flip.enabled);
    }

    #[test]
    fn inverted_dec_limits_rejected() {
        let config = MountSafetyConfig {
            dec_limit_min: Degrees::new(10.0),
            dec_limit_max: Degrees::new(0.0),
            ..MountSafetyConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvertedDecLimits { .. })));
    }

    #[test]
    fn hour_angle_limit_out_of_range() {
        let config = MountSafetyConfig {
            hour_angle_limit_west: Hours::new(13.0),
            ..MountSafetyConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::HourAngleLimit {
                field: "hour_angle_limit_west",
                value: 13.0
            })
        );
    }

    #[test]
    fn flip_margins_are_bounded() {
        let mut config = MountSafetyConfig::default();
        config.meridian_flip.minutes_after_meridian = Minutes::new(1e15);
        assert_eq!(
            config.validate(),
            Err(ConfigError::FlipMargin {
                field: "minutes_after_meridian",
                value: 1e15
            })
        );

        config.meridian_flip.minutes_after_meridian = Minutes::new(5.0);
        config.meridian_flip.minutes_before_meridian = Minutes::new(f64::NAN);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::FlipMargin {
                field: "minutes_before_meridian",
                ..
            })
        ));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn loads_partial_toml() {
        let config = MountSafetyConfig::from_toml_str(
            r#"
            mount_type = "fork"
            dec_limit_min = -20.0
            telescope_length_mm = 800.0

            [meridian_flip]
            enabled = false
            "#,
        )
        .unwrap();
        assert_eq!(config.mount_type, MountType::Fork);
        assert_eq!(config.dec_limit_min.value(), -20.0);
        assert_eq!(config.dec_limit_max.value(), 90.0);
        assert!(!config.meridian_flip.enabled);
        assert_eq!(config.meridian_flip.minutes_after_meridian.value(), 5.0);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn toml_errors_are_reported() {
        assert!(matches!(
            MountSafetyConfig::from_toml_str("mount_type = 3"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            MountSafetyConfig::from_toml_str("slew_rate_deg_per_sec = 0.0"),
            Err(ConfigError::NonPositive { .. })
        ));
    }
}
