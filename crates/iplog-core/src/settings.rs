use clap::Parser;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::models::{TimeWindow, DEFAULT_RANGE_MINUTES, DEFAULT_START_HOUR, DEFAULT_START_MINUTE};

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Count client IPs seen inside a time-of-day window across JSON log files
#[derive(Parser, Debug, Clone)]
#[command(
    name = "iplog",
    about = "Count client IPs seen inside a time-of-day window across JSON log files",
    version
)]
pub struct Settings {
    /// Log files, exported .csv reports to merge, or directories to search for
    /// .log / .txt / .jsonl files
    #[arg(required = true, value_name = "PATHS")]
    pub paths: Vec<PathBuf>,

    /// Hour of the counting window (0-23)
    #[arg(
        long,
        env = "IPLOG_START_HOUR",
        default_value_t = DEFAULT_START_HOUR,
        value_parser = clap::value_parser!(u32).range(0..=23)
    )]
    pub start_hour: u32,

    /// First minute of the counting window (0-59)
    #[arg(
        long,
        env = "IPLOG_START_MINUTE",
        default_value_t = DEFAULT_START_MINUTE,
        value_parser = clap::value_parser!(u32).range(0..=59)
    )]
    pub start_minute: u32,

    /// Width of the counting window in minutes
    #[arg(
        long,
        env = "IPLOG_RANGE_MINUTES",
        default_value_t = DEFAULT_RANGE_MINUTES,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub range_minutes: u32,

    /// Directory the CSV report is written to (defaults to the download directory)
    #[arg(long, env = "IPLOG_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Print the CSV report to stdout instead of writing a file
    #[arg(long)]
    pub stdout: bool,

    /// Logging level
    #[arg(
        long,
        env = "IPLOG_LOG_LEVEL",
        default_value = "INFO",
        value_parser = ["DEBUG", "INFO", "WARNING", "ERROR"]
    )]
    pub log_level: String,
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse the process arguments (and `IPLOG_*` environment fallbacks).
    pub fn load() -> Self {
        Settings::parse()
    }

    /// Validated counting window built from the three window flags.
    pub fn time_window(&self) -> Result<TimeWindow> {
        TimeWindow::new(self.start_hour, self.start_minute, self.range_minutes)
    }

    /// Directory the report is written to.
    ///
    /// Order: `--output-dir`, the platform download directory, then `.`.
    pub fn resolved_output_dir(&self) -> PathBuf {
        resolve_output_dir(self.output_dir.as_deref())
    }
}

/// Resolve the report directory from an optional override.
pub fn resolve_output_dir(explicit: Option<&Path>) -> PathBuf {
    if let Some(dir) = explicit {
        return dir.to_path_buf();
    }
    dirs::download_dir().unwrap_or_else(|| PathBuf::from("."))
}

// ── Tests ──────────────────────────────────────────────────────────────────────
