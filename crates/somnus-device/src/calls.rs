//! Recording of capability calls made against a device.
//!
//! A [`CallLog`] is shared between a device and whoever wants to inspect it
//! after the device has been handed over to a monitor, so tests can verify
//! which channel operations ran, how often and in which order.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

use crate::channel::SensorChannel;

/// One capability call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "op", content = "channel", rename_all = "snake_case")]
pub enum DeviceCall {
    Connect(SensorChannel),
    Configure(SensorChannel),
    IsConnected,
    Read(SensorChannel),
}

impl std::fmt::Display for DeviceCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceCall::Connect(channel) => write!(f, "connect({})", channel),
            DeviceCall::Configure(channel) => write!(f, "configure({})", channel),
            DeviceCall::IsConnected => write!(f, "is_connected"),
            DeviceCall::Read(channel) => write!(f, "read({})", channel),
        }
    }
}

#[derive(Debug, Default)]
struct CallJournal {
    entries: Vec<DeviceCall>,
    counts: HashMap<DeviceCall, usize>,
}

/// Shared, cloneable journal of device calls.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    inner: Arc<Mutex<CallJournal>>,
}

impl CallLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    fn journal(&self) -> MutexGuard<'_, CallJournal> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a call.
    pub fn record(&self, call: DeviceCall) {
        let mut journal = self.journal();
        journal.entries.push(call);
        *journal.counts.entry(call).or_insert(0) += 1;
    }

    /// How many times `call` was made.
    pub fn count(&self, call: DeviceCall) -> usize {
        self.journal().counts.get(&call).copied().unwrap_or(0)
    }

    /// Total calls touching `channel` (connect, configure and read).
    pub fn channel_calls(&self, channel: SensorChannel) -> usize {
        self.journal()
            .entries
            .iter()
            .filter(|call| match call {
                DeviceCall::Connect(c) | DeviceCall::Configure(c) | DeviceCall::Read(c) => {
                    *c == channel
                }
                DeviceCall::IsConnected => false,
            })
            .count()
    }

    /// All calls in the order they were made.
    pub fn entries(&self) -> Vec<DeviceCall> {
        self.journal().entries.clone()
    }

    /// Total number of recorded calls.
    pub fn len(&self) -> usize {
        self.journal().entries.len()
    }

    /// Whether no call has been recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        let mut journal = self.journal();
        journal.entries.clear();
        journal.counts.clear();
    }
}
