use thiserror::Error;

/// Errors raised while loading or validating mount and scheduler settings.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Declination limits are inverted: min {min}° > max {max}°")]
    InvertedDecLimits { min: f64, max: f64 },

    #[error("Hour-angle limit {field} must lie in [0, 12] hours, got {value}")]
    HourAngleLimit { field: &'static str, value: f64 },

    #[error("{field} must be positive, got {value}")]
    NonPositive { field: &'static str, value: f64 },

    #[error("Meridian flip margin {field} must lie in [0, 720] minutes, got {value}")]
    FlipMargin { field: &'static str, value: f64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inverted_dec_limits_display() {
        let e = ConfigError::InvertedDecLimits { min: 10.0, max: -5.0 };
        assert_eq!(e.to_string(), "Declination limits are inverted: min 10° > max -5°");
    }

    #[test]
    fn non_positive_display() {
        let e = ConfigError::NonPositive {
            field: "slew_rate_deg_per_sec",
            value: 0.0,
        };
        assert!(e.to_string().starts_with("slew_rate_deg_per_sec must be positive"));
    }
}
