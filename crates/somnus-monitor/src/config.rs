//! Monitor configuration.
//!
//! Thresholds, window size and evaluation policy. A configuration is fixed
//! once a monitor is built from it; the monitor exposes no setters.

use serde::{Deserialize, Serialize};

use crate::error::{MonitorError, MonitorResult};

/// Pressure mean below which breathing effort counts as reduced.
pub const DEFAULT_PRESSURE_THRESHOLD: f32 = 20.0;

/// Sound mean below which the airway counts as silent.
pub const DEFAULT_SOUND_THRESHOLD: f32 = 30.0;

/// Most-recent readings kept per channel.
pub const DEFAULT_WINDOW_CAPACITY: usize = 5;

/// Upper bound on readings kept per channel.
pub const MAX_WINDOW_CAPACITY: usize = 5;

/// Which channels must cross their threshold for an apnea verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationPolicy {
    /// Pressure mean below its threshold and sound mean below its threshold.
    #[default]
    BothChannels,
    /// Pressure mean below its threshold; the sound window is ignored.
    PressureOnly,
}

impl std::fmt::Display for EvaluationPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EvaluationPolicy::BothChannels => write!(f, "both-channels"),
            EvaluationPolicy::PressureOnly => write!(f, "pressure-only"),
        }
    }
}

/// Per-channel apnea thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ApneaThresholds {
    /// Pressure threshold (strictly-below comparison).
    pub pressure: f32,

    /// Sound threshold (strictly-below comparison).
    pub sound: f32,
}

impl Default for ApneaThresholds {
    fn default() -> Self {
        Self {
            pressure: DEFAULT_PRESSURE_THRESHOLD,
            sound: DEFAULT_SOUND_THRESHOLD,
        }
    }
}

impl ApneaThresholds {
    /// Whether a pressure mean indicates reduced effort. Ties are not apnea.
    pub fn pressure_low(&self, mean: f64) -> bool {
        mean < f64::from(self.pressure)
    }

    /// Whether a sound mean indicates silence. Ties are not apnea.
    pub fn sound_low(&self, mean: f64) -> bool {
        mean < f64::from(self.sound)
    }
}

/// Configuration for an [`ApneaMonitor`](crate::ApneaMonitor).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Apnea thresholds.
    #[serde(default)]
    pub thresholds: ApneaThresholds,

    /// Readings kept per channel window.
    #[serde(default = "default_window_capacity")]
    pub window_capacity: usize,

    /// Channels considered by the evaluator.
    #[serde(default)]
    pub policy: EvaluationPolicy,
}

fn default_window_capacity() -> usize {
    DEFAULT_WINDOW_CAPACITY
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            thresholds: ApneaThresholds::default(),
            window_capacity: DEFAULT_WINDOW_CAPACITY,
            policy: EvaluationPolicy::default(),
        }
    }
}

impl MonitorConfig {
    /// Default configuration with a different evaluation policy.
    pub fn with_policy(policy: EvaluationPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    /// Reject configurations the evaluator cannot work with.
    pub fn validate(&self) -> MonitorResult<()> {
        if !(1..=MAX_WINDOW_CAPACITY).contains(&self.window_capacity) {
            return Err(MonitorError::InvalidConfig(format!(
                "window capacity {} outside 1..={}",
                self.window_capacity, MAX_WINDOW_CAPACITY
            )));
        }
        if !self.thresholds.pressure.is_finite() {
            return Err(MonitorError::InvalidConfig(format!(
                "pressure threshold {} is not finite",
                self.thresholds.pressure
            )));
        }
        if !self.thresholds.sound.is_finite() {
            return Err(MonitorError::InvalidConfig(format!(
                "sound threshold {} is not finite",
                self.thresholds.sound
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_device_calibration() {
        let config = MonitorConfig::default();
        assert_eq!(config.thresholds.pressure, 20.0);
        assert_eq!(config.thresholds.sound, 30.0);
        assert_eq!(config.window_capacity, 5);
        assert_eq!(config.policy, EvaluationPolicy::BothChannels);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn threshold_ties_are_not_low() {
        let thresholds = ApneaThresholds::default();
        assert!(!thresholds.pressure_low(20.0));
        assert!(thresholds.pressure_low(19.999));
        assert!(!thresholds.sound_low(30.0));
        assert!(thresholds.sound_low(0.0));
    }

    #[test]
    fn nan_mean_is_never_low() {
        let thresholds = ApneaThresholds::default();
        assert!(!thresholds.pressure_low(f64::NAN));
        assert!(!thresholds.sound_low(f64::NAN));
    }

    #[test]
    fn zero_window_rejected() {
        let config = MonitorConfig {
            window_capacity: 0,
            ..MonitorConfig::default()
        };
        assert!(matches!(config.validate(), Err(MonitorError::InvalidConfig(_))));
    }

    #[test]
    fn non_finite_threshold_rejected() {
        let mut config = MonitorConfig::default();
        config.thresholds.sound = f32::INFINITY;
        assert!(config.validate().is_err());

        let mut config = MonitorConfig::default();
        config.thresholds.pressure = f32::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn window_above_five_rejected() {
        let config = MonitorConfig {
            window_capacity: MAX_WINDOW_CAPACITY + 1,
            ..MonitorConfig::default()
        };
        assert!(matches!(config.validate(), Err(MonitorError::InvalidConfig(_))));

        let config = MonitorConfig {
            window_capacity: 3,
            ..MonitorConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn policy_display() {
        assert_eq!(EvaluationPolicy::BothChannels.to_string(), "both-channels");
        assert_eq!(EvaluationPolicy::PressureOnly.to_string(), "pressure-only");
    }

    #[test]
    fn partial_config_fills_defaults() {
        let config: MonitorConfig = serde_json::from_str(r#"{ "policy": "pressure_only" }"#).unwrap();
        assert_eq!(config.policy, EvaluationPolicy::PressureOnly);
        assert_eq!(config.window_capacity, DEFAULT_WINDOW_CAPACITY);
        assert_eq!(config.thresholds, ApneaThresholds::default());
    }
}
