//! Log line decoding and source discovery.
//!
//! Turns one line of newline-delimited JSON into a [`LogRecord`], and expands
//! user-supplied paths into the list of log files to process.

use std::path::{Path, PathBuf};

use iplog_core::data_processors::TimestampProcessor;
use iplog_core::error::{IpLogError, Result};
use iplog_core::models::LogRecord;
use serde_json::Value;
use tracing::{debug, warn};

/// File extensions picked up when a directory is given as a source.
pub const LOG_EXTENSIONS: &[&str] = &["log", "txt", "jsonl"];

/// Extension of exported reports. Files given explicitly with it are read
/// back as reports; directory scans never pick them up.
pub const REPORT_EXTENSION: &str = "csv";

// ── Record decoding ───────────────────────────────────────────────────────────

/// Decode one log line into a [`LogRecord`].
///
/// The line must be a JSON object with a `timestamp` (string or epoch
/// milliseconds) and a string `message`. Unknown fields are ignored. Any
/// other shape is an error that disqualifies only this line.
pub fn parse_line(line: &str) -> Result<LogRecord> {
    let data: Value = serde_json::from_str(line.trim())?;
    let Some(fields) = data.as_object() else {
        return Err(IpLogError::InvalidRecord(format!(
            "expected a JSON object, found {}",
            json_kind(&data)
        )));
    };

    let ts_value = match fields.get("timestamp") {
        None | Some(Value::Null) => {
            return Err(IpLogError::InvalidRecord(
                "missing `timestamp` field".to_string(),
            ))
        }
        Some(v) => v,
    };
    let timestamp = TimestampProcessor::parse(ts_value)
        .ok_or_else(|| IpLogError::TimestampParse(ts_value.to_string()))?;

    let message = match fields.get("message") {
        Some(Value::String(s)) => s.clone(),
        None | Some(Value::Null) => {
            return Err(IpLogError::InvalidRecord(
                "missing `message` field".to_string(),
            ))
        }
        Some(other) => {
            return Err(IpLogError::InvalidRecord(format!(
                "`message` is not a string: {}",
                other
            )))
        }
    };

    Ok(LogRecord { timestamp, message })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ── Source discovery ──────────────────────────────────────────────────────────

/// Find log files recursively under `dir`, sorted by path.
pub fn find_log_files(dir: &Path) -> Vec<PathBuf> {
    if !dir.exists() {
        warn!("Source directory does not exist: {}", dir.display());
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file() && has_log_extension(entry.path()))
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    files
}

/// Expand user-supplied paths into source files.
///
/// Directories are searched with [`find_log_files`]; anything else is kept
/// as given so that unreadable or missing files surface as read errors.
pub fn expand_source_paths(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut sources = Vec::new();
    for path in paths {
        if path.is_dir() {
            let found = find_log_files(path);
            debug!("Found {} log files under {}", found.len(), path.display());
            sources.extend(found);
        } else {
            sources.push(path.clone());
        }
    }
    sources
}

/// Whether `path` names a previously exported CSV report.
pub fn is_report_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(REPORT_EXTENSION))
        .unwrap_or(false)
}

fn has_log_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| LOG_EXTENSIONS.iter().any(|e| ext.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
