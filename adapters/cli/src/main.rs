#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that dry-runs the Vanguard agent offline.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{info, LevelFilter};
use vanguard_agent::{run_session, Agent, AgentConfig};

mod offline;

use offline::OfflineClient;

/// Runs the agent against a scripted one-base map and prints a summary.
#[derive(Debug, Parser)]
#[command(name = "vanguard", version)]
struct Cli {
    /// TOML file with agent settings; missing keys keep their defaults.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Observations to run before stopping.
    #[arg(long, default_value_t = 2000)]
    ticks: u64,
    /// Overrides the configured random seed.
    #[arg(long)]
    seed: Option<u64>,
    /// Log level used unless RUST_LOG says otherwise.
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    log_level: LogLevel,
}

/// Verbosity accepted by `--log-level`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

/// Entry point for the Vanguard command-line interface.
fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::new()
        .filter_level(cli.log_level.into())
        .parse_default_env()
        .init();

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }

    let mut agent = Agent::new(config).context("invalid agent configuration")?;
    let mut client = OfflineClient::new();
    info!("dry run of {} observations with seed {}", cli.ticks, config.seed);

    let summary = run_session(&mut client, &mut agent, cli.ticks);

    println!("{summary}");
    if let Some(step) = agent.current_step() {
        println!("build order stopped at: {step}");
    }
    println!("attack waves alive: {}", agent.waves().len());
    Ok(())
}

/// Reads the agent settings, falling back to the defaults without a file.
fn load_config(path: Option<&Path>) -> Result<AgentConfig> {
    let Some(path) = path else {
        return Ok(AgentConfig::default());
    };

    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("failed to parse config file {}", path.display()))
}
