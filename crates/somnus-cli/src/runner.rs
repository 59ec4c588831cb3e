//! Monitoring session loop.
//!
//! The monitor core never retries. The session owns the retry policy: a
//! failed `initialize` and every outage seen between ticks get up to
//! `max_reconnect_attempts` attempts before the session gives up. An
//! attempt whose reconnect is refused (the link is already up) re-runs
//! `initialize` instead, since only configuration can be missing.

use std::io::Write;

use serde::Serialize;
use somnus_device::{DeviceScript, ScriptedDevice};
use somnus_monitor::{ApneaAssessment, ApneaMonitor, LinkReport, MonitorConfig};
use tracing::{debug, info, instrument, warn};

use crate::config::SessionConfig;
use crate::error::{CliError, CliResult};

/// One line of session output.
#[derive(Debug, Serialize)]
pub struct TickRecord<'a> {
    pub tick: u64,
    #[serde(flatten)]
    pub assessment: &'a ApneaAssessment,
}

/// Totals for a finished session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub ticks: u64,
    pub apnea_ticks: u64,
    pub reconnect_attempts: u32,
}

/// Build a monitor with a scripted device attached.
pub fn build_monitor(config: MonitorConfig, script: DeviceScript) -> CliResult<ApneaMonitor> {
    let device = ScriptedDevice::from_script(script);
    Ok(ApneaMonitor::with_device(config, Box::new(device))?)
}

/// Drives one monitor through a fixed number of measurement ticks.
pub struct Session<W: Write> {
    monitor: ApneaMonitor,
    config: SessionConfig,
    out: W,
    summary: SessionSummary,
}

impl<W: Write> Session<W> {
    pub fn new(monitor: ApneaMonitor, config: SessionConfig, out: W) -> Self {
        Self {
            monitor,
            config,
            out,
            summary: SessionSummary::default(),
        }
    }

    /// Initialize the device, then run every tick.
    #[instrument(skip(self), fields(monitor = %self.monitor.id(), ticks = self.config.ticks))]
    pub fn run(&mut self) -> CliResult<SessionSummary> {
        if !self.monitor.initialize()? {
            warn!("Initialization failed, falling back to reconnect");
            self.restore_link()?;
        }

        for tick in 1..=self.config.ticks {
            self.tick(tick)?;
        }

        let snapshot = self.monitor.snapshot();
        info!(
            snapshot = ?snapshot,
            apnea_ticks = self.summary.apnea_ticks,
            reconnect_attempts = self.summary.reconnect_attempts,
            "Session finished"
        );
        self.out.flush()?;
        Ok(self.summary.clone())
    }

    fn tick(&mut self, tick: u64) -> CliResult<()> {
        if !self.monitor.is_connected()? {
            warn!(tick, "Device link lost");
            self.restore_link()?;
        }

        let assessment = self.monitor.sample()?;
        self.summary.ticks += 1;
        if assessment.apnea {
            self.summary.apnea_ticks += 1;
        }

        serde_json::to_writer(
            &mut self.out,
            &TickRecord {
                tick,
                assessment: &assessment,
            },
        )?;
        writeln!(self.out)?;
        Ok(())
    }

    fn restore_link(&mut self) -> CliResult<()> {
        let budget = self.config.max_reconnect_attempts;
        for attempt in 1..=budget {
            self.summary.reconnect_attempts += 1;
            if self.monitor.reconnect()? {
                info!(attempt, "Link restored");
                return Ok(());
            }

            let refused = self
                .monitor
                .last_link_report()
                .is_some_and(LinkReport::was_refused);
            if refused {
                debug!(attempt, "Link already up, re-running initialization");
                if self.monitor.initialize()? {
                    info!(attempt, "Device initialized");
                    return Ok(());
                }
            }
            debug!(attempt, budget, "Link restore attempt failed");
        }
        Err(CliError::LinkUnavailable { attempts: budget })
    }

    pub fn monitor(&self) -> &ApneaMonitor {
        &self.monitor
    }

    /// Consume the session, returning the output sink.
    pub fn into_output(self) -> W {
        self.out
    }
}
