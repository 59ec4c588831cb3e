//! # somnus-monitor
//!
//! Control core of a dual-sensor (pressure + sound) sleep-apnea monitor.
//!
//! The core owns exactly one [`SensorDevice`](somnus_device::SensorDevice)
//! and does two things with it:
//!
//! - **Lifecycle protocol**: connect and configure both channels
//!   ([`ApneaMonitor::initialize`]), report connectivity
//!   ([`ApneaMonitor::is_connected`]) and restore it
//!   ([`ApneaMonitor::reconnect`]). Pressure always goes first; a pressure
//!   connect failure means the sound channel is never touched.
//! - **Apnea evaluation**: each [`ApneaMonitor::fetch_reading`] appends one
//!   sample per channel to a bounded window (5 by default, oldest evicted
//!   first) and [`ApneaMonitor::evaluate_apnea`] compares the window means
//!   against fixed thresholds (pressure 20.0, sound 30.0, strictly below).
//!
//! The core never retries; retry policy belongs to the host.
//!
//! ## Example
//!
//! ```rust
//! use somnus_device::{ScriptedDevice, SensorChannel};
//! use somnus_monitor::{ApneaMonitor, MonitorConfig};
//!
//! let device = ScriptedDevice::new("bedside")
//!     .with_readings(SensorChannel::Pressure, [10.0, 15.0, 19.0]);
//!
//! let mut monitor = ApneaMonitor::new(MonitorConfig::default()).unwrap();
//! monitor.attach_device(Box::new(device));
//! assert!(monitor.initialize().unwrap());
//!
//! for _ in 0..3 {
//!     monitor.fetch_reading().unwrap();
//! }
//! assert!(monitor.evaluate_apnea());
//! ```
//!
//! ## Evaluation policy
//!
//! By default both channels must agree (low pressure effort and a silent
//! airway). [`EvaluationPolicy::PressureOnly`] considers the pressure
//! window alone.

#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod evaluator;
pub mod lifecycle;
pub mod monitor;
pub mod window;

// ── Re-exports ──────────────────────────────────────────────────────

pub use config::{
    ApneaThresholds, EvaluationPolicy, MonitorConfig, DEFAULT_PRESSURE_THRESHOLD,
    DEFAULT_SOUND_THRESHOLD, DEFAULT_WINDOW_CAPACITY, MAX_WINDOW_CAPACITY,
};
pub use error::{MonitorError, MonitorResult};
pub use evaluator::{ApneaAssessment, ApneaEvaluator};
pub use lifecycle::{LinkReport, LinkState, ProtocolKind, ProtocolStep};
pub use monitor::{ApneaMonitor, MonitorId, MonitorSnapshot};
pub use window::{ReadingWindow, WindowSummary};
