//! tsnctl entry point.
//!
//! Drives the TSN offload engine against a simulated register bank so a
//! configuration can be checked, applied and inspected without hardware.

mod diagnostics;

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};
use tsn_common::{AdapterConfig, DeviceTime, DispatchCounters, TsnStats};
use tsn_offload::{regs, Adapter, ApplyOutcome, DeviceVariant, SimulatedRegisters, TsnOffload};

use crate::diagnostics::{format_prometheus_metrics, Report};

/// How long `apply` waits for a deferred reset to finish.
const DEFERRED_RESET_TIMEOUT: Duration = Duration::from_secs(5);

/// tsnctl command-line arguments.
#[derive(Parser, Debug)]
#[command(
    name = "tsnctl",
    about = "TSN offload control tool for i225/i226 adapters",
    version,
    long_about = None
)]
struct Args {
    /// Log level (trace, debug, info, warn, error).
    #[arg(long, short = 'l', default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply a configuration and print the resulting register image.
    Apply(ApplyArgs),

    /// Return a fresh adapter to link defaults and print the register image.
    Disable {
        /// Number of transmit queues.
        #[arg(long, short = 'q', default_value = "4")]
        queues: usize,

        /// Output format.
        #[arg(long, short = 'f', value_enum, default_value = "json")]
        format: OutputFormat,
    },

    /// Parse and validate a configuration, then print the derived features.
    Check {
        /// Path to an adapter configuration file (TOML).
        #[arg(long, short = 'c', value_name = "FILE")]
        config: Option<PathBuf>,
    },
}

#[derive(ClapArgs, Debug)]
struct ApplyArgs {
    /// Path to an adapter configuration file (TOML).
    #[arg(long, short = 'c', value_name = "FILE")]
    config: Option<PathBuf>,

    /// Device clock at apply time, in nanoseconds.
    #[arg(long, default_value = "0")]
    systim_ns: i64,

    /// Start from a gate schedule already running in TSN mode.
    #[arg(long)]
    base_time_running: bool,

    /// Output format.
    #[arg(long, short = 'f', value_enum, default_value = "json")]
    format: OutputFormat,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    /// JSON report with the named register image.
    Json,
    /// Prometheus text exposition of the statistics.
    Prometheus,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    init_logging(&args.log_level);

    match args.command {
        Command::Apply(apply) => {
            let config = load_config(apply.config.as_deref())?;
            let report = run_apply(&config, apply.systim_ns, apply.base_time_running)?;
            print_report(&report, apply.format)
        }
        Command::Disable { queues, format } => {
            let report = run_disable(queues)?;
            print_report(&report, format)
        }
        Command::Check { config } => {
            let config = load_config(config.as_deref())?;
            let summary = run_check(&config)?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
            Ok(())
        }
    }
}

/// Initialize logging with the specified log level.
///
/// Logs go to stderr so reports on stdout stay machine-readable.
fn init_logging(level: &str) {
    let filter = format!("tsnctl={level},tsn_offload={level},tsn_common={level}");

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&filter)),
        )
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(std::io::stderr)
        .init();
}

/// Load configuration from file or use defaults.
///
/// Resolution priority (first existing file wins):
/// 1. Command-line `--config` argument
/// 2. `TSN_CONFIG_PATH` environment variable
/// 3. Built-in defaults (TSN disabled)
fn load_config(path: Option<&Path>) -> Result<AdapterConfig> {
    if let Some(config_path) = path {
        info!(?config_path, "Loading config from command-line argument");
        return AdapterConfig::from_file(config_path)
            .with_context(|| format!("Failed to load config from {config_path:?}"));
    }

    if let Ok(env_path) = std::env::var("TSN_CONFIG_PATH") {
        let config_path = PathBuf::from(&env_path);
        if config_path.exists() {
            info!(?config_path, "Loading config from TSN_CONFIG_PATH");
            return AdapterConfig::from_file(&config_path).with_context(|| {
                format!("Failed to load config from TSN_CONFIG_PATH={env_path:?}")
            });
        }
        warn!(path = %env_path, "TSN_CONFIG_PATH set but file does not exist");
    }

    info!("No config file given, using built-in defaults");
    Ok(AdapterConfig::default())
}

/// Build the engine on a simulated bank, dispatch one reset, and report.
fn run_apply(config: &AdapterConfig, systim_ns: i64, base_time_running: bool) -> Result<Report> {
    let mut bank = SimulatedRegisters::with_clock(DeviceTime(systim_ns));
    if base_time_running {
        bank.preload(regs::TQAVCTRL, regs::TQAVCTRL_TRANSMIT_MODE_TSN);
        bank.preload(regs::BASET_H, 1);
    }

    let adapter =
        Adapter::from_config(bank, config).context("Failed to build adapter from config")?;
    let variant = adapter.variant();
    let offload = TsnOffload::new(adapter).context("Failed to start TSN offload engine")?;

    let outcome = offload.apply();
    if outcome == ApplyOutcome::Deferred && !offload.wait_idle(DEFERRED_RESET_TIMEOUT) {
        anyhow::bail!("Deferred reset did not finish within {DEFERRED_RESET_TIMEOUT:?}");
    }

    let stats = offload.stats();
    let registers = offload.with_adapter(|adapter| adapter.regs().named_snapshot());
    info!(?outcome, flags = %stats.flags, "Configuration applied");

    Ok(Report {
        variant,
        outcome: Some(outcome),
        stats,
        registers,
    })
}

/// Run the disable path on a fresh bank.
fn run_disable(queues: usize) -> Result<Report> {
    let mut adapter = Adapter::new(SimulatedRegisters::new(), DeviceVariant::I225, queues)
        .context("Failed to create adapter")?;
    adapter.disable_offload();

    let stats = TsnStats::new(adapter.flags(), adapter.counters(), &DispatchCounters::new());
    Ok(Report {
        variant: adapter.variant(),
        outcome: None,
        stats,
        registers: adapter.regs().named_snapshot(),
    })
}

/// Validate a configuration and summarize what it would enable.
fn run_check(config: &AdapterConfig) -> Result<serde_json::Value> {
    let adapter = Adapter::from_config(SimulatedRegisters::new(), config)
        .context("Configuration is invalid")?;

    Ok(serde_json::json!({
        "variant": adapter.variant(),
        "queues": adapter.num_queues(),
        "flags": adapter.new_flags(),
        "defers_when_running": adapter.variant().requires_quiescent_reset(),
    }))
}

fn print_report(report: &Report, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let json =
                serde_json::to_string_pretty(report).context("Failed to serialize report")?;
            println!("{json}");
        }
        OutputFormat::Prometheus => {
            print!("{}", format_prometheus_metrics(&report.stats, report.variant));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tsn_common::TsnFeature;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_args_parsing() {
        let args = Args::parse_from(["tsnctl", "apply", "-c", "tsn.toml", "--systim-ns", "42"]);
        match args.command {
            Command::Apply(apply) => {
                assert_eq!(apply.config, Some(PathBuf::from("tsn.toml")));
                assert_eq!(apply.systim_ns, 42);
                assert!(!apply.base_time_running);
                assert_eq!(apply.format, OutputFormat::Json);
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert_eq!(args.log_level, "info");
    }

    #[test]
    fn test_global_log_level() {
        let args = Args::parse_from(["tsnctl", "disable", "--queues", "2", "-l", "debug"]);
        assert_eq!(args.log_level, "debug");
        assert!(matches!(args.command, Command::Disable { queues: 2, .. }));
    }

    #[test]
    fn test_prometheus_format_flag() {
        let args = Args::parse_from(["tsnctl", "apply", "--format", "prometheus"]);
        assert!(matches!(
            args.command,
            Command::Apply(ApplyArgs {
                format: OutputFormat::Prometheus,
                ..
            })
        ));
    }

    #[test]
    fn test_apply_defaults_disable() {
        let report = run_apply(&AdapterConfig::default(), 0, false).unwrap();
        assert_eq!(report.outcome, Some(ApplyOutcome::Applied));
        assert!(report.stats.flags.is_empty());
        assert_eq!(report.stats.disables, 1);
        assert_eq!(report.registers.get("TXPBS"), Some(&0x0400_0014));
    }

    #[test]
    fn test_apply_from_file() {
        let file = write_config(
            r#"
            [device]
            device_id = 0x15F3
            netdev_running = true

            [schedule]
            time_aware_gating = true
            cycle_time = "1ms"
            qdisc = "taprio"
            "#,
        );
        let config = load_config(Some(file.path())).unwrap();
        let report = run_apply(&config, 2_500_000, true).unwrap();

        assert_eq!(report.variant, DeviceVariant::I225);
        assert_eq!(report.outcome, Some(ApplyOutcome::Deferred));
        assert!(report.stats.flags.contains(TsnFeature::Qbv));
        assert_eq!(report.stats.schedule_change_errors, 1);
        assert_eq!(report.registers.get("BASET_L"), Some(&3_000_000));
        assert_eq!(report.registers.get("BASET_H"), Some(&0));
    }

    #[test]
    fn test_disable_report() {
        let report = run_disable(2).unwrap();
        assert!(report.outcome.is_none());
        assert_eq!(report.registers.get("ENDQT(1)"), Some(&1_000_000_000));
        assert!(report.registers.get("ENDQT(2)").is_none());
        assert!(run_disable(0).is_err());
    }

    #[test]
    fn test_check_summary() {
        let mut config = AdapterConfig::default();
        config.device.device_id = 0x125B;
        config.queues[1].cbs_enable = true;

        let summary = run_check(&config).unwrap();
        assert_eq!(summary["variant"], "i226");
        assert_eq!(summary["flags"], serde_json::json!(["qav"]));
        assert_eq!(summary["defers_when_running"], false);
    }

    #[test]
    fn test_check_rejects_unknown_device() {
        let mut config = AdapterConfig::default();
        config.device.device_id = 0x1533;
        assert!(run_check(&config).is_err());
    }

    #[test]
    fn test_missing_config_file() {
        assert!(load_config(Some(Path::new("/nonexistent/tsn.toml"))).is_err());
    }
}
