//! Device lifecycle protocol.
//!
//! Brings both channels of a device into a connected-and-configured state
//! and restores connectivity afterwards. The pressure channel always goes
//! first; if it cannot connect the sound channel is never touched. Each
//! device call runs at most once per protocol run and nothing is retried.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use somnus_device::{SensorChannel, SensorDevice};
use tracing::{debug, warn};

/// Informational link state of the attached device.
///
/// Connectivity answers always come from the device itself; this only
/// records where the last protocol run left things.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkState {
    /// No device attached.
    Unattached,
    /// Device attached but not (or no longer) connected.
    Disconnected,
    /// Connected by a reconnect, never configured.
    Connected,
    /// Connected and configured.
    Ready,
}

impl std::fmt::Display for LinkState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LinkState::Unattached => write!(f, "unattached"),
            LinkState::Disconnected => write!(f, "disconnected"),
            LinkState::Connected => write!(f, "connected"),
            LinkState::Ready => write!(f, "ready"),
        }
    }
}

/// Which protocol produced a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtocolKind {
    Initialize,
    Reconnect,
}

/// One device call made by a protocol run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum ProtocolStep {
    Probe { connected: bool },
    Connect { channel: SensorChannel, ok: bool },
    Configure { channel: SensorChannel, ok: bool },
}

/// Ordered record of a protocol run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkReport {
    pub kind: ProtocolKind,
    pub steps: Vec<ProtocolStep>,
    pub success: bool,
    pub finished_at: DateTime<Utc>,
}

impl LinkReport {
    fn new(kind: ProtocolKind) -> Self {
        Self {
            kind,
            steps: Vec::new(),
            success: false,
            finished_at: Utc::now(),
        }
    }

    fn finish(mut self, success: bool) -> Self {
        self.success = success;
        self.finished_at = Utc::now();
        self
    }

    /// Whether any call touched `channel`.
    pub fn touched(&self, channel: SensorChannel) -> bool {
        self.steps.iter().any(|step| match step {
            ProtocolStep::Connect { channel: c, .. } | ProtocolStep::Configure { channel: c, .. } => {
                *c == channel
            }
            ProtocolStep::Probe { .. } => false,
        })
    }

    /// Whether a reconnect stopped because the device was already connected.
    pub fn was_refused(&self) -> bool {
        self.kind == ProtocolKind::Reconnect
            && self.steps == [ProtocolStep::Probe { connected: true }]
    }

    /// Whether the run ended with both channels configured.
    pub fn configured_both(&self) -> bool {
        SensorChannel::ALL.iter().all(|channel| {
            self.steps.iter().any(|step| {
                matches!(step, ProtocolStep::Configure { channel: c, ok: true } if c == channel)
            })
        })
    }
}

fn connect(device: &mut dyn SensorDevice, channel: SensorChannel, report: &mut LinkReport) -> bool {
    let ok = device.connect(channel);
    debug!(device = device.name(), %channel, ok, "Connect");
    report.steps.push(ProtocolStep::Connect { channel, ok });
    ok
}

fn configure(
    device: &mut dyn SensorDevice,
    channel: SensorChannel,
    report: &mut LinkReport,
) -> bool {
    let ok = device.configure(channel);
    debug!(device = device.name(), %channel, ok, "Configure");
    report.steps.push(ProtocolStep::Configure { channel, ok });
    ok
}

/// Connect and configure both channels.
///
/// Order: connect pressure (stop on failure), configure pressure, connect
/// sound, configure sound only if sound connected. Sound is attempted
/// whenever pressure connected, even if pressure configuration failed.
pub fn initialize(device: &mut dyn SensorDevice) -> LinkReport {
    let mut report = LinkReport::new(ProtocolKind::Initialize);

    if !connect(device, SensorChannel::Pressure, &mut report) {
        warn!(device = device.name(), "Pressure channel failed to connect, sound channel skipped");
        return report.finish(false);
    }

    let pressure_configured = configure(device, SensorChannel::Pressure, &mut report);

    let sound_ready = connect(device, SensorChannel::Sound, &mut report)
        && configure(device, SensorChannel::Sound, &mut report);

    report.finish(pressure_configured && sound_ready)
}

/// Re-establish connectivity of a disconnected device.
///
/// Refuses (returns an unsuccessful report after the probe) when the device
/// already reports connected. Configuration is not re-applied.
pub fn reconnect(device: &mut dyn SensorDevice) -> LinkReport {
    let mut report = LinkReport::new(ProtocolKind::Reconnect);

    let connected = device.is_connected();
    report.steps.push(ProtocolStep::Probe { connected });
    if connected {
        debug!(device = device.name(), "Device already connected, reconnect refused");
        return report.finish(false);
    }

    let ok = connect(device, SensorChannel::Pressure, &mut report)
        && connect(device, SensorChannel::Sound, &mut report);

    report.finish(ok)
}
