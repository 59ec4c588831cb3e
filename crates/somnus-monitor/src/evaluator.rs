//! Sliding-window apnea evaluation.
//!
//! The evaluator keeps one [`ReadingWindow`] per channel and compares the
//! window means against the configured thresholds. Evaluation never mutates
//! the windows, so repeated calls agree until a new reading is recorded.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use somnus_device::SensorChannel;
use tracing::{debug, warn};

use crate::config::{ApneaThresholds, EvaluationPolicy, MonitorConfig, MAX_WINDOW_CAPACITY};
use crate::window::{ReadingWindow, WindowSummary};

/// Outcome of one evaluation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApneaAssessment {
    /// Pressure window at evaluation time.
    pub pressure: WindowSummary,

    /// Sound window at evaluation time.
    pub sound: WindowSummary,

    /// Thresholds compared against.
    pub thresholds: ApneaThresholds,

    /// Channels that had to cross their threshold.
    pub policy: EvaluationPolicy,

    /// Apnea verdict.
    pub apnea: bool,

    /// When the evaluation ran.
    pub assessed_at: DateTime<Utc>,
}

/// Rolling windows plus the rule that turns them into a verdict.
#[derive(Clone, Debug)]
pub struct ApneaEvaluator {
    pressure: ReadingWindow,
    sound: ReadingWindow,
    thresholds: ApneaThresholds,
    policy: EvaluationPolicy,
}

impl ApneaEvaluator {
    /// Create an evaluator with empty windows. Capacity is capped at
    /// [`MAX_WINDOW_CAPACITY`].
    pub fn new(config: &MonitorConfig) -> Self {
        let capacity = config.window_capacity.min(MAX_WINDOW_CAPACITY);
        Self {
            pressure: ReadingWindow::new(capacity),
            sound: ReadingWindow::new(capacity),
            thresholds: config.thresholds,
            policy: config.policy,
        }
    }

    /// Record one sample into a channel window.
    pub fn record(&mut self, channel: SensorChannel, value: f32) {
        if !value.is_finite() {
            warn!(%channel, value, "Non-finite reading recorded");
        }
        let evicted = self.window_mut(channel).push(value);
        debug!(%channel, value, evicted = ?evicted, "Reading recorded");
    }

    /// Whether the current windows indicate apnea.
    ///
    /// With no pressure readings there is no evidence and the answer is
    /// `false`; under [`EvaluationPolicy::BothChannels`] the same holds for
    /// an empty sound window.
    pub fn is_apnea(&self) -> bool {
        let pressure_low = self
            .pressure
            .mean()
            .is_some_and(|mean| self.thresholds.pressure_low(mean));

        match self.policy {
            EvaluationPolicy::PressureOnly => pressure_low,
            EvaluationPolicy::BothChannels => {
                pressure_low
                    && self
                        .sound
                        .mean()
                        .is_some_and(|mean| self.thresholds.sound_low(mean))
            }
        }
    }

    /// Full assessment of the current windows.
    pub fn assess(&self) -> ApneaAssessment {
        ApneaAssessment {
            pressure: self.pressure.summary(),
            sound: self.sound.summary(),
            thresholds: self.thresholds,
            policy: self.policy,
            apnea: self.is_apnea(),
            assessed_at: Utc::now(),
        }
    }

    /// Window of one channel.
    pub fn window(&self, channel: SensorChannel) -> &ReadingWindow {
        match channel {
            SensorChannel::Pressure => &self.pressure,
            SensorChannel::Sound => &self.sound,
        }
    }

    fn window_mut(&mut self, channel: SensorChannel) -> &mut ReadingWindow {
        match channel {
            SensorChannel::Pressure => &mut self.pressure,
            SensorChannel::Sound => &mut self.sound,
        }
    }

    /// Thresholds in use.
    pub fn thresholds(&self) -> ApneaThresholds {
        self.thresholds
    }

    /// Policy in use.
    pub fn policy(&self) -> EvaluationPolicy {
        self.policy
    }

    /// Empty both windows.
    pub fn clear(&mut self) {
        self.pressure.clear();
        self.sound.clear();
    }
}

impl Default for ApneaEvaluator {
    fn default() -> Self {
        Self::new(&MonitorConfig::default())
    }
}
