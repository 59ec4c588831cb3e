//! Somnus host - runs a monitoring session against a device script
//!
//! The host provides:
//! - Layered configuration (defaults, file, `SOMNUS_*` environment)
//! - A session loop that owns the reconnect retry policy
//! - One JSON assessment line per measurement tick

pub mod config;
pub mod error;
pub mod runner;

pub use config::{CliConfig, LoggingConfig, SessionConfig, ENV_PREFIX};
pub use error::{CliError, CliResult};
pub use runner::{build_monitor, Session, SessionSummary, TickRecord};
