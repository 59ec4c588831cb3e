//! Configuration for the somnus host

use serde::{Deserialize, Serialize};
use somnus_monitor::MonitorConfig;
use std::path::Path;

use crate::error::{CliError, CliResult};

/// Environment variable prefix, e.g. `SOMNUS_SESSION__TICKS=40`.
pub const ENV_PREFIX: &str = "SOMNUS";

/// Main host configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CliConfig {
    /// Monitor core configuration
    #[serde(default)]
    pub monitor: MonitorConfig,

    /// Session loop configuration
    #[serde(default)]
    pub session: SessionConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            monitor: MonitorConfig::default(),
            session: SessionConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Session loop configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Measurement ticks to run
    #[serde(default = "default_ticks")]
    pub ticks: u64,

    /// Reconnect attempts allowed per outage
    #[serde(default = "default_max_reconnect_attempts")]
    pub max_reconnect_attempts: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ticks: default_ticks(),
            max_reconnect_attempts: default_max_reconnect_attempts(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// Default value helpers
fn default_ticks() -> u64 {
    20
}

fn default_max_reconnect_attempts() -> u32 {
    3
}

fn default_log_level() -> String {
    "info".to_string()
}

impl CliConfig {
    /// Load configuration: defaults, then the optional file, then
    /// `SOMNUS_*` environment variables.
    pub fn load(path: Option<&Path>) -> CliResult<Self> {
        Self::load_with(path, Self::environment())
    }

    fn environment() -> config::Environment {
        config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
    }

    fn load_with(path: Option<&Path>, environment: config::Environment) -> CliResult<Self> {
        let mut builder = config::Config::builder();

        // Add default configuration
        builder = builder.add_source(config::Config::try_from(&CliConfig::default())?);

        // An explicitly named file must exist
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        builder = builder.add_source(environment);

        let config: CliConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the session cannot run with.
    pub fn validate(&self) -> CliResult<()> {
        self.monitor.validate()?;
        if self.logging.level.trim().is_empty() {
            return Err(CliError::Config("log level must not be empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use somnus_monitor::EvaluationPolicy;
    use std::io::Write;

    fn no_env() -> config::Environment {
        CliConfig::environment().source(Some(config::Map::new()))
    }

    fn env(vars: &[(&str, &str)]) -> config::Environment {
        let map = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        CliConfig::environment().source(Some(map))
    }

    #[test]
    fn test_default_config() {
        let config = CliConfig::default();
        assert_eq!(config.session.ticks, 20);
        assert_eq!(config.session.max_reconnect_attempts, 3);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.monitor, MonitorConfig::default());
    }

    #[test]
    fn test_load_defaults_only() {
        let config = CliConfig::load_with(None, no_env()).unwrap();
        assert_eq!(config, CliConfig::default());
    }

    #[test]
    fn test_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[session]
ticks = 7

[monitor]
policy = "pressure_only"
window_capacity = 3

[monitor.thresholds]
pressure = 18.5
"#
        )
        .unwrap();

        let config = CliConfig::load_with(Some(file.path()), no_env()).unwrap();
        assert_eq!(config.session.ticks, 7);
        assert_eq!(config.session.max_reconnect_attempts, 3);
        assert_eq!(config.monitor.policy, EvaluationPolicy::PressureOnly);
        assert_eq!(config.monitor.window_capacity, 3);
        assert_eq!(config.monitor.thresholds.pressure, 18.5);
        assert_eq!(config.monitor.thresholds.sound, 30.0);
    }

    #[test]
    fn test_env_overrides_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[session]\nticks = 7").unwrap();

        let config = CliConfig::load_with(
            Some(file.path()),
            env(&[
                ("SOMNUS_SESSION__TICKS", "40"),
                ("SOMNUS_LOGGING__JSON", "true"),
            ]),
        )
        .unwrap();
        assert_eq!(config.session.ticks, 40);
        assert!(config.logging.json);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        assert!(matches!(
            CliConfig::load_with(Some(&missing), no_env()),
            Err(CliError::Config(_))
        ));
    }

    #[test]
    fn test_window_capacity_outside_bounds_rejected() {
        for capacity in ["0", "6"] {
            let config = CliConfig::load_with(
                None,
                env(&[("SOMNUS_MONITOR__WINDOW_CAPACITY", capacity)]),
            );
            assert!(matches!(config, Err(CliError::Monitor(_))));
        }
    }

    #[test]
    fn test_defaults_round_trip_as_json() {
        let json = serde_json::to_string_pretty(&CliConfig::default()).unwrap();
        let back: CliConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, CliConfig::default());
    }
}
