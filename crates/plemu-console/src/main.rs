//! Power loss emulator console entry point.
//!
//! Wires the configuration file, host clock, and pulse output into an
//! [`Emulator`] and drives it from an interactive menu, or runs the
//! configured workload once with `--run`.

mod console;
mod menu;
mod signals;

use anyhow::{Context, Result};
use clap::Parser;
use plemu_common::config::{EmulatorConfig, WaveformProfile};
use plemu_runtime::{
    create_pulse_output, Clock, CommandStatus, Emulator, MonotonicClock, PulseOutput,
};
use std::path::PathBuf;
use tracing::{info, warn};

use crate::console::StdioOperator;
use crate::signals::SignalHandler;

/// Environment variable naming a configuration file.
const CONFIG_ENV: &str = "PLEMU_CONFIG_PATH";

/// Power loss emulator command-line arguments.
#[derive(Parser, Debug)]
#[command(
    name = "plemu",
    about = "Power loss emulator - waveform-modulated pulse generator",
    version,
    long_about = None
)]
struct Args {
    /// Path to a configuration file (TOML).
    #[arg(long, short = 'c', value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, short = 'l', default_value = "warn")]
    log_level: String,

    /// Run the configured workload once and exit.
    #[arg(long, short = 'r')]
    run: bool,

    /// Print the run report as JSON (with --run).
    #[arg(long, requires = "run")]
    json: bool,

    /// Override the configured waveform profile (name or number).
    #[arg(long, short = 'p', value_parser = parse_profile)]
    profile: Option<WaveformProfile>,

    /// Print the effective configuration as TOML and exit.
    #[arg(long)]
    print_config: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level);

    info!(version = env!("CARGO_PKG_VERSION"), "Starting power loss emulator");

    let mut config = load_config(&args)?;
    if let Some(profile) = args.profile {
        apply_profile_override(&mut config, profile);
    }

    if args.print_config {
        print!("{}", config.to_toml().context("Failed to serialize config")?);
        return Ok(());
    }

    info!(
        profile = %config.workload.profile,
        poll_interval = ?config.scheduler.poll_interval,
        pulse_output = ?config.pulse.output,
        "Configuration loaded"
    );

    let signals = SignalHandler::new().context("Failed to set up signal handlers")?;
    let clock = MonotonicClock::with_poll_interval(config.scheduler.poll_interval);
    let pulse = create_pulse_output(config.pulse.output);
    let mut emulator = Emulator::new(config.workload, clock, pulse);
    let operator = StdioOperator::new(signals.clone()).context("Failed to start stdin reader")?;

    if args.run {
        let operator = if args.json { operator.quiet() } else { operator };
        return run_once(&mut emulator, operator, args.json);
    }

    let mut operator = operator;
    menu::splash(&mut operator);
    let exit = menu::run(&mut emulator, &mut operator, &signals, || {
        let mut config = load_config(&args)?;
        if let Some(profile) = args.profile {
            apply_profile_override(&mut config, profile);
        }
        Ok(config.workload)
    })
    .context("Menu failed")?;

    info!(?exit, "Power loss emulator exiting");
    Ok(())
}

/// Initialize logging with the specified log level.
///
/// Logs go to stderr; stdout belongs to the operator console.
fn init_logging(level: &str) {
    let filter = format!("plemu={level},plemu_runtime={level},plemu_common={level}");

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}

/// Parse a profile given by name (`sine`) or menu number (`2`).
fn parse_profile(value: &str) -> Result<WaveformProfile, String> {
    if let Some(profile) = WaveformProfile::ALL.iter().find(|p| p.name() == value) {
        return Ok(*profile);
    }
    let index: i64 = value
        .parse()
        .map_err(|_| format!("unknown profile '{value}'"))?;
    WaveformProfile::from_index(index).map_err(|e| e.to_string())
}

fn apply_profile_override(config: &mut EmulatorConfig, profile: WaveformProfile) {
    config.workload.profile = profile;
    if config.workload.normalize_bounds() {
        warn!(%profile, "Period bounds swapped to suit profile override");
    }
}

/// Load configuration from file or use defaults.
///
/// Resolution priority (first existing file wins):
/// 1. Command-line `--config` argument
/// 2. `PLEMU_CONFIG_PATH` environment variable
/// 3. `/etc/plemu/config.toml` (system path)
/// 4. `config/default.toml` (local development)
/// 5. Built-in defaults
fn load_config(args: &Args) -> Result<EmulatorConfig> {
    // 1. Command-line argument (highest priority)
    if let Some(config_path) = &args.config {
        info!(?config_path, "Loading config from command-line argument");
        return EmulatorConfig::from_file(config_path)
            .with_context(|| format!("Failed to load config from {config_path:?}"));
    }

    // 2. Environment variable
    if let Ok(env_path) = std::env::var(CONFIG_ENV) {
        let config_path = PathBuf::from(&env_path);
        if config_path.exists() {
            info!(?config_path, "Loading config from {CONFIG_ENV}");
            return EmulatorConfig::from_file(&config_path)
                .with_context(|| format!("Failed to load config from {CONFIG_ENV}={env_path:?}"));
        }
        warn!(
            path = %env_path,
            "{CONFIG_ENV} set but file does not exist, checking other locations"
        );
    }

    // 3. System path
    let system_path = PathBuf::from("/etc/plemu/config.toml");
    if system_path.exists() {
        info!(?system_path, "Loading config from system path");
        return EmulatorConfig::from_file(&system_path)
            .with_context(|| format!("Failed to load config from {system_path:?}"));
    }

    // 4. Local development path
    let local_path = PathBuf::from("config/default.toml");
    if local_path.exists() {
        info!(?local_path, "Loading config from local path");
        return EmulatorConfig::from_file(&local_path)
            .with_context(|| format!("Failed to load config from {local_path:?}"));
    }

    // 5. Built-in defaults
    info!("No config file found, using built-in defaults");
    Ok(EmulatorConfig::default())
}

/// Run the active workload once, non-interactively.
fn run_once<C: Clock, P: PulseOutput>(
    emulator: &mut Emulator<C, P>,
    mut operator: StdioOperator,
    json: bool,
) -> Result<()> {
    if emulator.run_workload(&mut operator) == CommandStatus::Failure {
        anyhow::bail!("Workload did not run");
    }

    if json {
        let report = emulator
            .last_report()
            .context("Workload finished without a report")?;
        println!(
            "{}",
            serde_json::to_string_pretty(report).context("Failed to serialize run report")?
        );
    }
    Ok(())
}
