//! CLI argument definitions and shared statics.

use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;
use std::sync::atomic::AtomicBool;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();
/// Set by the Ctrl-C handler; long-running commands poll it.
pub static SHUTDOWN: AtomicBool = AtomicBool::new(false);

#[derive(Parser, Debug)]
#[command(name = "rpm_cli", version, about = "RPM consistency & compensation controller")]
pub struct Cli {
    /// Path to config TOML (missing default file means built-in defaults)
    #[arg(long, value_name = "FILE", default_value = DEFAULT_CONFIG)]
    pub config: PathBuf,

    /// Emit JSON lines (output and logs) instead of pretty text
    #[arg(long, action = ArgAction::SetTrue, global = true)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); RUST_LOG wins when set
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    #[command(flatten)]
    pub tuning: Tuning,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

pub const DEFAULT_CONFIG: &str = "etc/rpm_config.toml";

/// Controller knobs; each one overrides the config file.
#[derive(Args, Debug, Default, Clone)]
pub struct Tuning {
    /// Consistency tolerance (RPM, inclusive)
    #[arg(long, value_name = "RPM", global = true)]
    pub tolerance: Option<u32>,
    /// Sudden-drop threshold (RPM)
    #[arg(long = "drop-threshold", value_name = "RPM", global = true)]
    pub drop_threshold: Option<u32>,
    /// Percent added per compensation boost
    #[arg(long, value_name = "PERCENT", global = true)]
    pub increment: Option<u8>,
    /// Consecutive consistent readings needed to revert
    #[arg(long, value_name = "N", global = true)]
    pub target: Option<u32>,
    /// Manual-override window after an operator change (ms)
    #[arg(long = "override-ms", value_name = "MS", global = true)]
    pub override_ms: Option<u64>,
    /// Telemetry line prefix
    #[arg(long, value_name = "TEXT", global = true)]
    pub prefix: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Control a live peripheral; operator commands are read from stdin
    Run {
        /// Serial device node (e.g. /dev/rfcomm0)
        #[arg(long, value_name = "PATH", conflicts_with = "tcp")]
        device: Option<PathBuf>,
        /// TCP serial bridge (host:port)
        #[arg(long, value_name = "ADDR")]
        tcp: Option<String>,
    },
    /// Bench run against the simulated motor
    Simulate {
        /// Operator setpoint applied right after connecting
        #[arg(long, value_name = "PERCENT", default_value_t = 50)]
        speed: u8,
        /// Stop after this many telemetry samples (0 = until Ctrl-C)
        #[arg(long, value_name = "N", default_value_t = 120)]
        samples: u32,
        /// Run lockstep on a virtual clock instead of in real time
        #[arg(long, action = ArgAction::SetTrue)]
        fast: bool,
    },
    /// Replay a recorded telemetry/operator script offline
    Replay {
        /// Script file: telemetry lines plus @directives
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Virtual time between telemetry lines (ms)
        #[arg(long = "interval-ms", value_name = "MS", default_value_t = 100)]
        interval_ms: u64,
        /// Also print the verdict for every reading
        #[arg(long, action = ArgAction::SetTrue)]
        verdicts: bool,
    },
    /// Validate the configuration and print effective parameters
    SelfCheck,
}
