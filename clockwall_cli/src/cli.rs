//! CLI argument definitions and shared statics.

use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

use clockwall_config::Settings;
use clockwall_config::settings::{MAX_UTC_OFFSET_HOURS, MIN_UTC_OFFSET_HOURS};
use clockwall_core::ClockError;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "clockwall", version, about = "Wall of analog clocks drawing the time")]
pub struct Cli {
    /// Path to config TOML; built-in defaults when omitted
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Where user settings are persisted (overrides [settings].path)
    #[arg(long, value_name = "FILE")]
    pub settings: Option<PathBuf>,

    /// JSON output: frames and results as JSON lines, logs as JSON
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); RUST_LOG wins when set
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

/// Display overrides shared by several commands. Highest precedence.
#[derive(Args, Debug, Clone, Default)]
pub struct DisplayArgs {
    /// UTC offset in hours (whole or half, -12..=14)
    #[arg(long, value_name = "HOURS", allow_negative_numbers = true)]
    pub gmt: Option<f64>,

    /// 12-hour clock with AM/PM
    #[arg(long, action = ArgAction::SetTrue, conflicts_with = "h24")]
    pub h12: bool,

    /// 24-hour clock
    #[arg(long, action = ArgAction::SetTrue)]
    pub h24: bool,

    /// Theme name
    #[arg(long, value_name = "NAME")]
    pub theme: Option<String>,

    /// Share link or query string (`gmt=..&h12=..&theme=..`) to apply
    #[arg(long, value_name = "URL_OR_QUERY")]
    pub share: Option<String>,
}

impl DisplayArgs {
    pub fn twelve_hour(&self) -> Option<bool> {
        match (self.h12, self.h24) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }

    /// Layer share query, then explicit flags, over `base`.
    pub fn apply(&self, mut base: Settings) -> eyre::Result<Settings> {
        if let Some(q) = &self.share
            && !clockwall_config::share::apply_query(&mut base, q)
        {
            tracing::warn!(share = %q, "share link carried no usable settings");
        }
        if let Some(h) = self.gmt {
            let range = MIN_UTC_OFFSET_HOURS..=MAX_UTC_OFFSET_HOURS;
            if !h.is_finite() || !range.contains(&h) {
                return Err(eyre::Report::new(ClockError::Config(format!(
                    "--gmt must be in [-12, 14], got {h}"
                ))));
            }
            base.utc_offset_hours = h;
        }
        if let Some(on) = self.twelve_hour() {
            base.twelve_hour = on;
        }
        if let Some(t) = &self.theme {
            base.theme = t.clone();
        }
        Ok(base.sanitized())
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the clock in the terminal until Ctrl-C or `quit`
    Run {
        #[command(flatten)]
        display: DisplayArgs,
        /// Use only simulated sources (no network)
        #[arg(long, action = ArgAction::SetTrue)]
        offline: bool,
        /// Stop after this many ticks
        #[arg(long, value_name = "N")]
        max_ticks: Option<u64>,
        /// Do not write settings changes back to disk
        #[arg(long, action = ArgAction::SetTrue)]
        no_persist: bool,
        /// Ignore control commands on stdin
        #[arg(long, action = ArgAction::SetTrue)]
        no_input: bool,
    },
    /// Run one calibration pass and report every source
    Calibrate {
        /// Use only simulated sources (no network)
        #[arg(long, action = ArgAction::SetTrue)]
        offline: bool,
    },
    /// Print the digits shown for an instant
    Digits {
        /// RFC 3339 timestamp or Unix epoch milliseconds; now when omitted
        #[arg(long, value_name = "TIME", allow_negative_numbers = true)]
        at: Option<String>,
        /// Also draw the face grid
        #[arg(long, action = ArgAction::SetTrue)]
        grid: bool,
        #[command(flatten)]
        display: DisplayArgs,
    },
    /// Print a share link for the effective settings
    Share {
        /// Page URL to attach the query to; prints the bare query when omitted
        #[arg(long, value_name = "URL")]
        base: Option<String>,
        #[command(flatten)]
        display: DisplayArgs,
    },
}
