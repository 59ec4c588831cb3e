//! Somnus - dual-sensor apnea monitor host
//!
//! Runs a monitoring session against a scripted device and prints one JSON
//! assessment per tick on stdout. Logs go to stderr.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use somnus_cli::{build_monitor, CliConfig, LoggingConfig, Session};
use somnus_device::DeviceScript;
use somnus_monitor::EvaluationPolicy;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Somnus CLI
#[derive(Parser)]
#[command(name = "somnus")]
#[command(about = "Somnus - dual-sensor apnea monitor", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "SOMNUS_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Log level
    #[arg(long, env = "SOMNUS_LOG_LEVEL", global = true)]
    log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long, env = "SOMNUS_LOG_JSON", global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a monitoring session against a device script
    Run(RunArgs),

    /// Print the default configuration as JSON
    Defaults,
}

#[derive(Args)]
struct RunArgs {
    /// Device script (JSON)
    #[arg(short, long)]
    script: PathBuf,

    /// Measurement ticks to run
    #[arg(short, long)]
    ticks: Option<u64>,

    /// Evaluation policy
    #[arg(long, value_enum)]
    policy: Option<PolicyArg>,

    /// Reconnect attempts allowed per outage
    #[arg(long)]
    max_reconnect_attempts: Option<u32>,
}

#[derive(Clone, Copy, ValueEnum)]
enum PolicyArg {
    /// Low pressure and a silent sound channel
    Both,
    /// Low pressure alone
    Pressure,
}

impl From<PolicyArg> for EvaluationPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Both => EvaluationPolicy::BothChannels,
            PolicyArg::Pressure => EvaluationPolicy::PressureOnly,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config =
        CliConfig::load(cli.config.as_deref()).context("failed to load configuration")?;

    // Override with CLI args
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    if cli.json {
        config.logging.json = true;
    }

    init_tracing(&config.logging);

    match cli.command {
        Commands::Run(args) => run(config, args),
        Commands::Defaults => {
            println!("{}", serde_json::to_string_pretty(&CliConfig::default())?);
            Ok(())
        }
    }
}

fn init_tracing(logging: &LoggingConfig) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| logging.level.clone().into());

    if logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn run(mut config: CliConfig, args: RunArgs) -> anyhow::Result<()> {
    if let Some(ticks) = args.ticks {
        config.session.ticks = ticks;
    }
    if let Some(policy) = args.policy {
        config.monitor.policy = policy.into();
    }
    if let Some(attempts) = args.max_reconnect_attempts {
        config.session.max_reconnect_attempts = attempts;
    }

    let script = DeviceScript::from_path(&args.script)
        .with_context(|| format!("failed to load device script {}", args.script.display()))?;

    info!(
        device = %script.name,
        policy = %config.monitor.policy,
        ticks = config.session.ticks,
        "Starting session"
    );

    let monitor = build_monitor(config.monitor, script)?;
    let mut session = Session::new(monitor, config.session, std::io::stdout().lock());
    let summary = session.run()?;

    info!(
        ticks = summary.ticks,
        apnea_ticks = summary.apnea_ticks,
        reconnect_attempts = summary.reconnect_attempts,
        "Done"
    );
    Ok(())
}
