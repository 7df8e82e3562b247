//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "cgmcal", version, about = "CGM calibration replay tool")]
pub struct Cli {
    /// Path to config TOML (typed); stock thresholds when omitted
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print results and logs as JSON lines instead of pretty text
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); RUST_LOG overrides
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replay sensor readings through live calibration, one decision per reading
    Live {
        /// Readings CSV (read_date_ms,glucose,unfiltered,filtered,device_calibrated)
        #[arg(long, value_name = "FILE")]
        readings: PathBuf,
        /// Sensor insert time in epoch ms
        #[arg(long, value_name = "MS", allow_negative_numbers = true)]
        sensor_insert: Option<i64>,
    },
    /// Compute an expired-session calibration from reference checks
    Expired {
        /// Reference checks CSV (date_ms,type,glucose,unfiltered)
        #[arg(long, value_name = "FILE")]
        checks: PathBuf,
        /// Readings CSV used to fill in missing raw values by interpolation
        #[arg(long, value_name = "FILE")]
        readings: Option<PathBuf>,
        /// Sensor insert time in epoch ms
        #[arg(long, value_name = "MS", allow_negative_numbers = true)]
        sensor_insert: Option<i64>,
    },
    /// Apply a calibration to a raw value
    Estimate {
        /// Raw (unfiltered) sensor value
        #[arg(long, allow_negative_numbers = true)]
        raw: f64,
        /// Calibration slope (raw counts per mg/dL)
        #[arg(long, allow_negative_numbers = true)]
        slope: f64,
        /// Calibration intercept (raw counts)
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        intercept: f64,
    },
    /// Estimate the raw value at a timestamp from bracketing readings
    Interpolate {
        /// Readings CSV (read_date_ms,glucose,unfiltered,filtered,device_calibrated)
        #[arg(long, value_name = "FILE")]
        readings: PathBuf,
        /// Target time in epoch ms
        #[arg(long, value_name = "MS", allow_negative_numbers = true)]
        at: i64,
    },
}
