//! Scripted sensor device for deterministic testing and simulation.
//!
//! Every channel operation draws its outcome from a per-channel queue. When
//! a queue is down to its last entry that entry keeps being returned, so a
//! script of `[false, true]` means "fail once, then succeed forever". An
//! empty queue falls back to a healthy default (connect and configure
//! succeed, readings are `0.0`).
//!
//! Connectivity is derived from the connect outcomes (the device is
//! connected once both channels are linked) unless explicit connectivity
//! answers are scripted.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calls::{CallLog, DeviceCall};
use crate::capability::SensorDevice;
use crate::channel::SensorChannel;
use crate::error::{DeviceError, DeviceResult};

/// Default reading returned once a channel runs out of scripted samples.
pub const DEFAULT_READING: f32 = 0.0;

// ── Script format ───────────────────────────────────────────────────

/// Scripted outcomes for one channel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelScript {
    /// Successive `connect` outcomes.
    pub connect: Vec<bool>,
    /// Successive `configure` outcomes.
    pub configure: Vec<bool>,
    /// Successive readings.
    pub readings: Vec<f32>,
}

/// Full device script, loadable from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceScript {
    /// Device name for logging.
    #[serde(default = "default_device_name")]
    pub name: String,

    /// Pressure channel script.
    #[serde(default)]
    pub pressure: ChannelScript,

    /// Sound channel script.
    #[serde(default)]
    pub sound: ChannelScript,

    /// Explicit answers for the connectivity probe. Empty means "derive
    /// from the channel links".
    #[serde(default)]
    pub connectivity: Vec<bool>,
}

fn default_device_name() -> String {
    "scripted-device".to_string()
}

impl Default for DeviceScript {
    fn default() -> Self {
        Self {
            name: default_device_name(),
            pressure: ChannelScript::default(),
            sound: ChannelScript::default(),
            connectivity: Vec::new(),
        }
    }
}

impl DeviceScript {
    /// Parse a script from JSON text.
    pub fn from_json(json: &str) -> DeviceResult<Self> {
        let script: DeviceScript = serde_json::from_str(json)?;
        script.validate()?;
        Ok(script)
    }

    /// Load a script from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> DeviceResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Check the script for content a device could never produce.
    pub fn validate(&self) -> DeviceResult<()> {
        if self.name.trim().is_empty() {
            return Err(DeviceError::InvalidScript(
                "device name must not be empty".into(),
            ));
        }

        for channel in SensorChannel::ALL {
            if let Some(bad) = self.channel(channel).readings.iter().find(|v| !v.is_finite()) {
                return Err(DeviceError::InvalidScript(format!(
                    "{} reading {} is not finite",
                    channel, bad
                )));
            }
        }

        Ok(())
    }

    /// Script for one channel.
    pub fn channel(&self, channel: SensorChannel) -> &ChannelScript {
        match channel {
            SensorChannel::Pressure => &self.pressure,
            SensorChannel::Sound => &self.sound,
        }
    }
}

// ── Outcome sequences ───────────────────────────────────────────────

/// Queue whose last entry sticks.
#[derive(Debug, Clone)]
struct Sequence<T> {
    queue: VecDeque<T>,
    fallback: T,
}

impl<T: Copy> Sequence<T> {
    fn new(values: impl IntoIterator<Item = T>, fallback: T) -> Self {
        Self {
            queue: values.into_iter().collect(),
            fallback,
        }
    }

    fn next(&mut self) -> T {
        if self.queue.len() > 1 {
            self.queue.pop_front().unwrap_or(self.fallback)
        } else {
            self.queue.front().copied().unwrap_or(self.fallback)
        }
    }

    fn is_scripted(&self) -> bool {
        !self.queue.is_empty()
    }
}

#[derive(Debug, Clone)]
struct ChannelState {
    connect: Sequence<bool>,
    configure: Sequence<bool>,
    readings: Sequence<f32>,
    linked: bool,
    configured: bool,
}

impl ChannelState {
    fn from_script(script: &ChannelScript) -> Self {
        Self {
            connect: Sequence::new(script.connect.iter().copied(), true),
            configure: Sequence::new(script.configure.iter().copied(), true),
            readings: Sequence::new(script.readings.iter().copied(), DEFAULT_READING),
            linked: false,
            configured: false,
        }
    }
}

// ── Scripted device ─────────────────────────────────────────────────

/// A [`SensorDevice`] driven entirely by a script.
///
/// Every call is recorded in a shared [`CallLog`]; keep a clone of
/// [`ScriptedDevice::calls`] before handing the device to a monitor to
/// verify call discipline afterwards.
#[derive(Debug)]
pub struct ScriptedDevice {
    name: String,
    pressure: ChannelState,
    sound: ChannelState,
    connectivity: RefCell<Sequence<bool>>,
    calls: CallLog,
}

impl ScriptedDevice {
    /// Create a healthy device: every connect and configure succeeds and
    /// both channels read `0.0`.
    pub fn new(name: impl Into<String>) -> Self {
        Self::from_script(DeviceScript {
            name: name.into(),
            ..DeviceScript::default()
        })
    }

    /// Build a device from a script.
    pub fn from_script(script: DeviceScript) -> Self {
        Self {
            pressure: ChannelState::from_script(&script.pressure),
            sound: ChannelState::from_script(&script.sound),
            connectivity: RefCell::new(Sequence::new(script.connectivity, false)),
            name: script.name,
            calls: CallLog::new(),
        }
    }

    /// Script successive `connect` outcomes for a channel.
    pub fn with_connect(
        mut self,
        channel: SensorChannel,
        outcomes: impl IntoIterator<Item = bool>,
    ) -> Self {
        self.state_mut(channel).connect = Sequence::new(outcomes, true);
        self
    }

    /// Script successive `configure` outcomes for a channel.
    pub fn with_configure(
        mut self,
        channel: SensorChannel,
        outcomes: impl IntoIterator<Item = bool>,
    ) -> Self {
        self.state_mut(channel).configure = Sequence::new(outcomes, true);
        self
    }

    /// Script successive readings for a channel.
    pub fn with_readings(
        mut self,
        channel: SensorChannel,
        readings: impl IntoIterator<Item = f32>,
    ) -> Self {
        self.state_mut(channel).readings = Sequence::new(readings, DEFAULT_READING);
        self
    }

    /// Script explicit answers for the connectivity probe.
    pub fn with_connectivity(mut self, answers: impl IntoIterator<Item = bool>) -> Self {
        *self.connectivity.get_mut() = Sequence::new(answers, false);
        self
    }

    /// Shared handle on the call journal.
    pub fn calls(&self) -> CallLog {
        self.calls.clone()
    }

    /// Whether a channel's last connect succeeded and has not been dropped.
    pub fn is_linked(&self, channel: SensorChannel) -> bool {
        self.state(channel).linked
    }

    /// Whether a channel has been configured successfully at least once.
    pub fn is_configured(&self, channel: SensorChannel) -> bool {
        self.state(channel).configured
    }

    /// Simulate the device losing its link on both channels.
    ///
    /// Scripted connectivity answers, if any, still take precedence.
    pub fn drop_link(&mut self) {
        debug!(device = %self.name, "Dropping scripted device link");
        self.pressure.linked = false;
        self.sound.linked = false;
    }

    fn state(&self, channel: SensorChannel) -> &ChannelState {
        match channel {
            SensorChannel::Pressure => &self.pressure,
            SensorChannel::Sound => &self.sound,
        }
    }

    fn state_mut(&mut self, channel: SensorChannel) -> &mut ChannelState {
        match channel {
            SensorChannel::Pressure => &mut self.pressure,
            SensorChannel::Sound => &mut self.sound,
        }
    }
}

impl Default for ScriptedDevice {
    fn default() -> Self {
        Self::new(default_device_name())
    }
}

impl SensorDevice for ScriptedDevice {
    fn connect(&mut self, channel: SensorChannel) -> bool {
        self.calls.record(DeviceCall::Connect(channel));
        let state = self.state_mut(channel);
        let outcome = state.connect.next();
        state.linked = outcome;
        debug!(device = %self.name, %channel, outcome, "Scripted connect");
        outcome
    }

    fn configure(&mut self, channel: SensorChannel) -> bool {
        self.calls.record(DeviceCall::Configure(channel));
        let state = self.state_mut(channel);
        let outcome = state.configure.next();
        state.configured |= outcome;
        debug!(device = %self.name, %channel, outcome, "Scripted configure");
        outcome
    }

    fn is_connected(&self) -> bool {
        self.calls.record(DeviceCall::IsConnected);
        let mut connectivity = self.connectivity.borrow_mut();
        if connectivity.is_scripted() {
            connectivity.next()
        } else {
            self.pressure.linked && self.sound.linked
        }
    }

    fn read(&mut self, channel: SensorChannel) -> f32 {
        self.calls.record(DeviceCall::Read(channel));
        self.state_mut(channel).readings.next()
    }

    fn name(&self) -> &str {
        &self.name
    }
}
