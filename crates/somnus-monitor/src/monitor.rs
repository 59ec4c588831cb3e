//! The apnea monitor: one device, two reading windows.
//!
//! `ApneaMonitor` owns the attached device handle, drives the lifecycle
//! protocol against it and feeds its readings into the evaluator. Every
//! operation that needs the device fails with
//! [`MonitorError::DeviceNotAttached`] until one is attached.

use serde::{Deserialize, Serialize};
use somnus_device::{SensorChannel, SensorDevice};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::config::MonitorConfig;
use crate::error::{MonitorError, MonitorResult};
use crate::evaluator::{ApneaAssessment, ApneaEvaluator};
use crate::lifecycle::{self, LinkReport, LinkState};

/// Identifier of a monitor instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MonitorId(Uuid);

impl MonitorId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for MonitorId {
    fn default() -> Self {
        Self::generate()
    }
}

impl std::fmt::Display for MonitorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "monitor:{}", self.0)
    }
}

/// Point-in-time view of a monitor, for host-side logging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorSnapshot {
    pub id: MonitorId,
    pub device: Option<String>,
    pub link_state: LinkState,
    pub pressure_window: Vec<f32>,
    pub sound_window: Vec<f32>,
    pub last_report: Option<LinkReport>,
    pub config: MonitorConfig,
}

/// Control core for one device pairing.
pub struct ApneaMonitor {
    id: MonitorId,
    config: MonitorConfig,
    device: Option<Box<dyn SensorDevice>>,
    evaluator: ApneaEvaluator,
    link_state: LinkState,
    configured: bool,
    last_report: Option<LinkReport>,
}

impl ApneaMonitor {
    /// Create a monitor with no device attached.
    pub fn new(config: MonitorConfig) -> MonitorResult<Self> {
        config.validate()?;
        Ok(Self {
            id: MonitorId::generate(),
            evaluator: ApneaEvaluator::new(&config),
            config,
            device: None,
            link_state: LinkState::Unattached,
            configured: false,
            last_report: None,
        })
    }

    /// Create a monitor with a device already attached.
    pub fn with_device(
        config: MonitorConfig,
        device: Box<dyn SensorDevice>,
    ) -> MonitorResult<Self> {
        let mut monitor = Self::new(config)?;
        monitor.attach_device(device);
        Ok(monitor)
    }

    pub fn id(&self) -> MonitorId {
        self.id
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Attach a device, replacing and returning any previous one.
    ///
    /// The new device starts out [`LinkState::Disconnected`]; nothing from
    /// the previous device's link carries over. Reading windows are kept.
    #[instrument(skip(self, device), fields(monitor = %self.id, device = device.name()))]
    pub fn attach_device(
        &mut self,
        device: Box<dyn SensorDevice>,
    ) -> Option<Box<dyn SensorDevice>> {
        let previous = self.device.replace(device);
        if let Some(old) = &previous {
            info!(replaced = old.name(), "Device replaced");
        } else {
            info!("Device attached");
        }
        self.link_state = LinkState::Disconnected;
        self.configured = false;
        self.last_report = None;
        previous
    }

    /// Detach and return the current device.
    #[instrument(skip(self), fields(monitor = %self.id))]
    pub fn detach_device(&mut self) -> Option<Box<dyn SensorDevice>> {
        let device = self.device.take();
        if device.is_some() {
            info!("Device detached");
        }
        self.link_state = LinkState::Unattached;
        self.configured = false;
        device
    }

    /// Whether a device is attached.
    pub fn has_device(&self) -> bool {
        self.device.is_some()
    }

    /// Name of the attached device.
    pub fn device_name(&self) -> Option<&str> {
        self.device.as_deref().map(|d| d.name())
    }

    fn device_mut(&mut self) -> MonitorResult<&mut (dyn SensorDevice + 'static)> {
        self.device
            .as_deref_mut()
            .ok_or(MonitorError::DeviceNotAttached)
    }

    /// Connect and configure both channels.
    ///
    /// Returns `Ok(true)` iff pressure connect, pressure configure, sound
    /// connect and sound configure all succeeded.
    #[instrument(skip(self), fields(monitor = %self.id))]
    pub fn initialize(&mut self) -> MonitorResult<bool> {
        let report = lifecycle::initialize(self.device_mut()?);
        let success = report.success;

        if success {
            self.configured = true;
            self.link_state = LinkState::Ready;
            info!("Device initialized");
        } else {
            self.link_state = LinkState::Disconnected;
            warn!(steps = report.steps.len(), "Device initialization failed");
        }

        self.last_report = Some(report);
        Ok(success)
    }

    /// Ask the device whether it is connected.
    pub fn is_connected(&self) -> MonitorResult<bool> {
        self.device
            .as_deref()
            .map(|device| device.is_connected())
            .ok_or(MonitorError::DeviceNotAttached)
    }

    /// Reconnect both channels of a disconnected device.
    ///
    /// Returns `Ok(false)` without any connect attempt when the device is
    /// already connected.
    #[instrument(skip(self), fields(monitor = %self.id))]
    pub fn reconnect(&mut self) -> MonitorResult<bool> {
        let report = lifecycle::reconnect(self.device_mut()?);
        let success = report.success;

        if success {
            self.link_state = if self.configured {
                LinkState::Ready
            } else {
                LinkState::Connected
            };
            info!(link_state = %self.link_state, "Device reconnected");
        } else if report.was_refused() {
            debug!("Reconnect refused, device already connected");
        } else {
            self.link_state = LinkState::Disconnected;
            warn!("Device reconnect failed");
        }

        self.last_report = Some(report);
        Ok(success)
    }

    /// Read one sample from each channel into the windows.
    #[instrument(skip(self), fields(monitor = %self.id))]
    pub fn fetch_reading(&mut self) -> MonitorResult<()> {
        let device = self.device_mut()?;
        let pressure = device.read(SensorChannel::Pressure);
        let sound = device.read(SensorChannel::Sound);

        self.evaluator.record(SensorChannel::Pressure, pressure);
        self.evaluator.record(SensorChannel::Sound, sound);
        Ok(())
    }

    /// Whether the current windows indicate an apnea episode.
    pub fn evaluate_apnea(&self) -> bool {
        self.evaluator.is_apnea()
    }

    /// Detailed evaluation of the current windows.
    pub fn assess(&self) -> ApneaAssessment {
        self.evaluator.assess()
    }

    /// One measurement tick: fetch a reading, then assess.
    pub fn sample(&mut self) -> MonitorResult<ApneaAssessment> {
        self.fetch_reading()?;
        let assessment = self.assess();
        if assessment.apnea {
            info!(
                monitor = %self.id,
                pressure_mean = ?assessment.pressure.mean,
                sound_mean = ?assessment.sound.mean,
                "Apnea condition detected"
            );
        }
        Ok(assessment)
    }

    /// Empty both reading windows.
    pub fn clear_readings(&mut self) {
        self.evaluator.clear();
    }

    pub fn evaluator(&self) -> &ApneaEvaluator {
        &self.evaluator
    }

    /// Where the last protocol run left the device.
    pub fn link_state(&self) -> LinkState {
        self.link_state
    }

    /// Report of the last `initialize` or `reconnect`.
    pub fn last_link_report(&self) -> Option<&LinkReport> {
        self.last_report.as_ref()
    }

    pub fn snapshot(&self) -> MonitorSnapshot {
        MonitorSnapshot {
            id: self.id,
            device: self.device_name().map(str::to_string),
            link_state: self.link_state,
            pressure_window: self.evaluator.window(SensorChannel::Pressure).to_vec(),
            sound_window: self.evaluator.window(SensorChannel::Sound).to_vec(),
            last_report: self.last_report.clone(),
            config: self.config.clone(),
        }
    }
}

impl Default for ApneaMonitor {
    fn default() -> Self {
        Self {
            id: MonitorId::generate(),
            config: MonitorConfig::default(),
            device: None,
            evaluator: ApneaEvaluator::default(),
            link_state: LinkState::Unattached,
            configured: false,
            last_report: None,
        }
    }
}

impl std::fmt::Debug for ApneaMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApneaMonitor")
            .field("id", &self.id)
            .field("device", &self.device_name())
            .field("link_state", &self.link_state)
            .field("evaluator", &self.evaluator)
            .finish()
    }
}
