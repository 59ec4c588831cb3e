//! # somnus-device
//!
//! Sensor device capability for the Somnus apnea monitor.
//!
//! A monitoring device pairs two independent sensor channels (airway
//! pressure and breathing sound). The monitor core drives devices only
//! through the [`SensorDevice`] trait, so any concrete sensor pairing, or
//! the [`ScriptedDevice`] substitute shipped here, can be attached.
//!
//! ## Capability
//!
//! | Operation | Output |
//! |---|---|
//! | `connect(channel)` | `true` iff the channel connects |
//! | `configure(channel)` | `true` iff configuration succeeds |
//! | `is_connected()` | aggregate connectivity snapshot |
//! | `read(channel)` | latest sample |
//!
//! Outcomes are plain values: a device never raises errors.
//!
//! ## Example
//!
//! ```rust
//! use somnus_device::{DeviceCall, ScriptedDevice, SensorChannel, SensorDevice};
//!
//! let mut device = ScriptedDevice::new("bedside")
//!     .with_connect(SensorChannel::Sound, [false, true])
//!     .with_readings(SensorChannel::Pressure, [18.0, 21.5]);
//! let calls = device.calls();
//!
//! assert!(device.connect(SensorChannel::Pressure));
//! assert!(!device.connect(SensorChannel::Sound));
//! assert_eq!(device.read(SensorChannel::Pressure), 18.0);
//! assert_eq!(calls.count(DeviceCall::Connect(SensorChannel::Sound)), 1);
//! ```

#![deny(unsafe_code)]

pub mod calls;
pub mod capability;
pub mod channel;
pub mod error;
pub mod scripted;

// ── Re-exports ──────────────────────────────────────────────────────

pub use calls::{CallLog, DeviceCall};
pub use capability::SensorDevice;
pub use channel::SensorChannel;
pub use error::{DeviceError, DeviceResult};
pub use scripted::{ChannelScript, DeviceScript, ScriptedDevice, DEFAULT_READING};

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Scripted readings replay in order and then hold the last value.
        #[test]
        fn readings_replay_then_hold(readings in prop::collection::vec(-100.0f32..100.0, 1..12), extra in 0usize..5) {
            let mut device = ScriptedDevice::default()
                .with_readings(SensorChannel::Pressure, readings.clone());
            for expected in &readings {
                prop_assert_eq!(device.read(SensorChannel::Pressure), *expected);
            }
            let last = *readings.last().unwrap();
            for _ in 0..extra {
                prop_assert_eq!(device.read(SensorChannel::Pressure), last);
            }
        }

        /// The journal counts exactly the calls made.
        #[test]
        fn journal_counts_calls(connects in 0usize..8, probes in 0usize..8) {
            let mut device = ScriptedDevice::default();
            let calls = device.calls();
            for _ in 0..connects {
                device.connect(SensorChannel::Sound);
            }
            for _ in 0..probes {
                device.is_connected();
            }
            prop_assert_eq!(calls.count(DeviceCall::Connect(SensorChannel::Sound)), connects);
            prop_assert_eq!(calls.count(DeviceCall::IsConnected), probes);
            prop_assert_eq!(calls.len(), connects + probes);
        }
    }
}
