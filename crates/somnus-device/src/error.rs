//! Error types for somnus-device.
//!
//! The capability itself never errors; these cover loading device scripts.

use thiserror::Error;

/// Errors raised while building a scripted device.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// Script content is malformed or inconsistent.
    #[error("invalid device script: {0}")]
    InvalidScript(String),

    /// Script file could not be read.
    #[error("device script io error: {0}")]
    Io(String),
}

impl From<serde_json::Error> for DeviceError {
    fn from(e: serde_json::Error) -> Self {
        DeviceError::InvalidScript(e.to_string())
    }
}

impl From<std::io::Error> for DeviceError {
    fn from(e: std::io::Error) -> Self {
        DeviceError::Io(e.to_string())
    }
}

/// Result type for device operations.
pub type DeviceResult<T> = Result<T, DeviceError>;
