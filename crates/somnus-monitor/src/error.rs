//! Error types for somnus-monitor.
//!
//! Device outcomes are never errors; only monitor preconditions are.

use thiserror::Error;

/// Errors raised by the monitor core.
#[derive(Debug, Error, PartialEq)]
pub enum MonitorError {
    /// An operation needing the device ran before one was attached.
    #[error("no device attached to the monitor")]
    DeviceNotAttached,

    /// Monitor configuration is unusable.
    #[error("invalid monitor configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for monitor operations.
pub type MonitorResult<T> = Result<T, MonitorError>;
