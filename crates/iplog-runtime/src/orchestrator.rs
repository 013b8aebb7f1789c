//! Source orchestration.
//!
//! [`ReportOrchestrator`] is the only stateful part of iplog. It reads
//! sources, runs one aggregation pass per source with a snapshot of the
//! current window, retains every source's counts, and builds report
//! artifacts on demand. Paths ending in `.csv` are read back as previously
//! exported reports and retained alongside log sources. All counting logic
//! lives in `iplog-data`.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use iplog_core::data_processors::report_date;
use iplog_core::error::{IpLogError, Result};
use iplog_core::models::{CountMap, TimeWindow};
use iplog_data::aggregator::{aggregate_bytes, import_report, merge_counts, SourceTally};
use iplog_data::reader::is_report_path;
use iplog_data::report::Report;

// ── ReportArtifact ────────────────────────────────────────────────────────────

/// Everything the output side needs to hand a report to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportArtifact {
    pub report: Report,
    /// Rendered CSV text.
    pub csv: String,
    /// Suggested file name, `log_<YYYY-MM-DD>.csv`.
    pub file_name: String,
}

impl ReportArtifact {
    fn build(counts: &CountMap, generated_on: NaiveDate) -> Self {
        let report = Report::from_counts(counts, generated_on);
        let csv = report.to_csv();
        let file_name = report.file_name();
        Self {
            report,
            csv,
            file_name,
        }
    }

    /// CSV content as bytes, ready to be written out.
    pub fn csv_bytes(&self) -> &[u8] {
        self.csv.as_bytes()
    }
}

// ── ReportOrchestrator ────────────────────────────────────────────────────────

/// Coordinates source passes, retained counts, merging and reset.
pub struct ReportOrchestrator {
    /// Window applied to the next pass.
    window: TimeWindow,
    /// One tally per accepted source, in acceptance order.
    sources: Vec<SourceTally>,
    /// Most recently generated report.
    latest: Option<ReportArtifact>,
    /// Date stamp source for new reports.
    today: fn() -> NaiveDate,
}

impl ReportOrchestrator {
    pub fn new(window: TimeWindow) -> Self {
        Self {
            window,
            sources: Vec::new(),
            latest: None,
            today: report_date,
        }
    }

    /// Replace the date source used to stamp reports.
    pub fn with_report_date(mut self, today: fn() -> NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn window(&self) -> TimeWindow {
        self.window
    }

    /// Change the window for subsequent passes.
    ///
    /// Counts already retained keep the window they were computed with.
    pub fn set_window(&mut self, window: TimeWindow) {
        tracing::debug!(%window, "time window updated");
        self.window = window;
    }

    /// Retained per-source tallies, in acceptance order.
    pub fn sources(&self) -> &[SourceTally] {
        &self.sources
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// The most recently generated report, if any.
    pub fn latest_report(&self) -> Option<&ReportArtifact> {
        self.latest.as_ref()
    }

    // ── Source intake ─────────────────────────────────────────────────────

    /// Run a pass over an in-memory source and retain its counts.
    ///
    /// The latest report is replaced by a report for this source alone.
    pub fn accept_bytes(&mut self, name: &str, bytes: &[u8]) -> &SourceTally {
        let window = self.window;
        let tally = aggregate_bytes(name, bytes, &window);

        tracing::info!(
            source = name,
            %window,
            lines = tally.stats.lines_read,
            malformed = tally.stats.malformed,
            counted = tally.stats.counted,
            distinct_ips = tally.counts.len(),
            "source processed"
        );

        self.latest = Some(ReportArtifact::build(&tally.counts, (self.today)()));
        self.sources.push(tally);
        &self.sources[self.sources.len() - 1]
    }

    /// Retain the counts of a previously exported CSV report.
    ///
    /// The counts are taken as exported, without a window pass. A malformed
    /// report is returned as [`IpLogError::InvalidReport`] and leaves the
    /// retained state untouched.
    pub fn accept_report(&mut self, name: &str, bytes: &[u8]) -> Result<&SourceTally> {
        let tally = import_report(name, bytes, &self.window)?;

        tracing::info!(
            source = name,
            distinct_ips = tally.counts.len(),
            total = tally.stats.counted,
            "report imported"
        );

        self.latest = Some(ReportArtifact::build(&tally.counts, (self.today)()));
        self.sources.push(tally);
        Ok(&self.sources[self.sources.len() - 1])
    }

    /// Read a file and retain its counts.
    ///
    /// `.csv` files go through [`accept_report`](Self::accept_report), every
    /// other file through [`accept_bytes`](Self::accept_bytes). A read failure
    /// is returned as [`IpLogError::SourceRead`] and leaves the retained state
    /// untouched.
    pub async fn accept_path(&mut self, path: &Path) -> Result<&SourceTally> {
        let bytes = read_source(path).await?;
        let index = self.ingest(path, &bytes)?;
        Ok(&self.sources[index])
    }

    /// Read several files concurrently, then run their passes in input order.
    ///
    /// Each entry of the result corresponds to the path at the same index; a
    /// failing source does not affect the others.
    pub async fn accept_paths(&mut self, paths: &[PathBuf]) -> Vec<Result<&SourceTally>> {
        let handles: Vec<_> = paths
            .iter()
            .cloned()
            .map(|path| tokio::spawn(async move { read_source(&path).await }))
            .collect();

        // Positions in `self.sources` of accepted sources, or the read error.
        let mut outcomes: Vec<Result<usize>> = Vec::with_capacity(paths.len());
        for (path, handle) in paths.iter().zip(handles) {
            let read = match handle.await {
                Ok(read) => read,
                Err(join_err) => Err(IpLogError::SourceRead {
                    path: path.clone(),
                    source: std::io::Error::other(join_err),
                }),
            };
            match read.and_then(|bytes| self.ingest(path, &bytes)) {
                Ok(index) => outcomes.push(Ok(index)),
                Err(e) => {
                    tracing::error!(error = %e, "source skipped");
                    outcomes.push(Err(e));
                }
            }
        }

        let sources = &self.sources;
        outcomes
            .into_iter()
            .map(|outcome| outcome.map(|index| &sources[index]))
            .collect()
    }

    /// Dispatch already-read file contents by kind; returns the new tally's
    /// position in `self.sources`.
    fn ingest(&mut self, path: &Path, bytes: &[u8]) -> Result<usize> {
        let name = path.display().to_string();
        if is_report_path(path) {
            self.accept_report(&name, bytes)?;
        } else {
            self.accept_bytes(&name, bytes);
        }
        Ok(self.sources.len() - 1)
    }

    // ── Reports ───────────────────────────────────────────────────────────

    /// Sum of all retained counts.
    pub fn merged_counts(&self) -> CountMap {
        merge_counts(self.sources.iter().map(|s| &s.counts))
    }

    /// Build a report over every retained source.
    ///
    /// Returns `None` when no source has been accepted. A single retained
    /// source merges to its own counts.
    pub fn merged_report(&mut self) -> Option<&ReportArtifact> {
        if self.sources.is_empty() {
            return None;
        }
        let merged = self.merged_counts();
        tracing::info!(
            sources = self.sources.len(),
            distinct_ips = merged.len(),
            total = merged.total(),
            "merged report generated"
        );
        self.latest = Some(ReportArtifact::build(&merged, (self.today)()));
        self.latest.as_ref()
    }

    /// Drop every retained tally and the latest report.
    pub fn reset(&mut self) {
        tracing::info!(discarded = self.sources.len(), "orchestrator reset");
        self.sources.clear();
        self.latest = None;
    }
}

impl Default for ReportOrchestrator {
    fn default() -> Self {
        Self::new(TimeWindow::default())
    }
}

// ── Private helpers ───────────────────────────────────────────────────────────

async fn read_source(path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(path)
        .await
        .map_err(|source| IpLogError::SourceRead {
            path: path.to_path_buf(),
            source,
        })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
