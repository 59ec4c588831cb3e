//! Host error types

use somnus_device::DeviceError;
use somnus_monitor::MonitorError;
use thiserror::Error;

/// Errors raised by the somnus host
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Device script error: {0}")]
    Script(#[from] DeviceError),

    #[error("Monitor error: {0}")]
    Monitor(#[from] MonitorError),

    #[error("Device link unavailable after {attempts} reconnect attempts")]
    LinkUnavailable { attempts: u32 },

    #[error("Output error: {0}")]
    Output(#[from] std::io::Error),
}

impl From<config::ConfigError> for CliError {
    fn from(err: config::ConfigError) -> Self {
        CliError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::Output(err.into())
    }
}

/// Result type for host operations
pub type CliResult<T> = Result<T, CliError>;
