use std::path::{Path, PathBuf};

use anyhow::Context;
use iplog_runtime::orchestrator::ReportArtifact;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// ── Logging bootstrap ──────────────────────────────────────────────────────────

/// Map a `--log-level` name to an [`EnvFilter`] directive.
///
/// Accepts the Python-style names offered on the command line as well as
/// plain tracing level names; anything unrecognised is passed through and
/// rejected later by `EnvFilter`.
pub fn filter_directive(log_level: &str) -> String {
    let upper = log_level.to_uppercase();
    match upper.as_str() {
        "DEBUG" => "debug".to_string(),
        "INFO" => "info".to_string(),
        "WARNING" | "WARN" => "warn".to_string(),
        "ERROR" | "CRITICAL" => "error".to_string(),
        _ => log_level.to_string(),
    }
}

/// Initialise the global `tracing` subscriber.
///
/// Output goes to stderr so that a report printed to stdout stays clean.
/// Falls back to `"info"` if the level string is not recognised.
pub fn setup_logging(log_level: &str) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_new(filter_directive(log_level)).unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(subscriber)
        .try_init()
        .context("failed to install tracing subscriber")?;

    Ok(())
}

// ── Report output ──────────────────────────────────────────────────────────────

/// Write `artifact` into `dir` under its generated file name.
///
/// Creates `dir` when missing and overwrites an existing report of the same
/// name. Returns the written path.
pub fn write_report(dir: &Path, artifact: &ReportArtifact) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output directory {}", dir.display()))?;
    let path = dir.join(&artifact.file_name);
    std::fs::write(&path, artifact.csv_bytes())
        .with_context(|| format!("failed to write report {}", path.display()))?;
    Ok(path)
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use iplog_runtime::orchestrator::ReportOrchestrator;
    use tempfile::TempDir;

    fn fixed_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 6).unwrap()
    }

    fn sample_artifact() -> ReportArtifact {
        let line = r#"{"timestamp":"2024-01-01T11:20:00","message":"'x-real-ip' => { name: 'x-real-ip', value: '10.0.0.1' }"}"#;
        let mut orch = ReportOrchestrator::default().with_report_date(fixed_date);
        orch.accept_bytes("a.log", line.as_bytes());
        orch.merged_report().cloned().expect("report")
    }

    #[test]
    fn test_filter_directive_mapping() {
        assert_eq!(filter_directive("DEBUG"), "debug");
        assert_eq!(filter_directive("info"), "info");
        assert_eq!(filter_directive("WARNING"), "warn");
        assert_eq!(filter_directive("ERROR"), "error");
        assert_eq!(filter_directive("CRITICAL"), "error");
        assert_eq!(filter_directive("trace"), "trace");
    }

    #[test]
    fn test_write_report_creates_dir_and_file() {
        let tmp = TempDir::new().expect("tempdir");
        let out = tmp.path().join("reports").join("nested");

        let artifact = sample_artifact();
        let path = write_report(&out, &artifact).expect("write");

        assert_eq!(path, out.join("log_2024-05-06.csv"));
        let written = std::fs::read_to_string(&path).expect("read back");
        assert_eq!(written, "IP Address,Count\n10.0.0.1,1");
    }

    #[test]
    fn test_write_report_overwrites_existing() {
        let tmp = TempDir::new().expect("tempdir");
        let target = tmp.path().join("log_2024-05-06.csv");
        std::fs::write(&target, "stale").unwrap();

        write_report(tmp.path(), &sample_artifact()).expect("write");
        assert_eq!(
            std::fs::read_to_string(&target).unwrap(),
            "IP Address,Count\n10.0.0.1,1"
        );
    }
}
