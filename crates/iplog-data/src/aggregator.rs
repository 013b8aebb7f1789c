//! Per-source IP counting and cross-source merging.
//!
//! [`aggregate_source`] runs one pass over a source's text: every non-blank
//! line goes through decode → window check → IP extraction, and surviving IPs
//! are tallied into a [`CountMap`]. [`import_report`] turns a previously
//! exported CSV report back into a tally. [`merge_counts`] folds any number of
//! such maps into one by pointwise addition.

use iplog_core::error::Result;
use iplog_core::models::{CountMap, TimeWindow};
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::extractor::extract_ip;
use crate::reader::parse_line;
use crate::report::parse_csv;

// ── PassStats ─────────────────────────────────────────────────────────────────

/// Line counters collected during one aggregation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PassStats {
    /// Non-blank lines examined.
    pub lines_read: u64,
    /// Empty or whitespace-only lines skipped.
    pub blank_lines: u64,
    /// Lines that could not be decoded into a record.
    pub malformed: u64,
    /// Decoded records whose local time fell outside the window.
    pub outside_window: u64,
    /// In-window records without an `x-real-ip` entry.
    pub missing_ip: u64,
    /// Records that contributed to the count map.
    pub counted: u64,
}

// ── SourceTally ───────────────────────────────────────────────────────────────

/// Result of one aggregation pass over one source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceTally {
    /// Display name of the source (usually its path).
    pub name: String,
    /// The window the pass ran with.
    pub window: TimeWindow,
    pub counts: CountMap,
    pub stats: PassStats,
}

// ── Aggregation ───────────────────────────────────────────────────────────────

/// Count in-window client IPs in the full text of one source.
///
/// Lines that fail to decode are reported as `warn` diagnostics and skipped;
/// no line can abort the pass. A leading byte-order mark is ignored.
pub fn aggregate_source(name: &str, text: &str, window: &TimeWindow) -> SourceTally {
    let text = text.strip_prefix('\u{FEFF}').unwrap_or(text);
    let mut counts = CountMap::new();
    let mut stats = PassStats::default();

    for (index, line) in text.split('\n').enumerate() {
        if line.trim().is_empty() {
            stats.blank_lines += 1;
            continue;
        }
        stats.lines_read += 1;

        let record = match parse_line(line) {
            Ok(r) => r,
            Err(e) => {
                stats.malformed += 1;
                if e.is_line_error() {
                    warn!(source = name, line = index + 1, error = %e, "skipping undecodable log line");
                } else {
                    error!(source = name, line = index + 1, error = %e, "unexpected error decoding log line");
                }
                continue;
            }
        };

        if !window.contains(&record.timestamp) {
            stats.outside_window += 1;
            continue;
        }

        match extract_ip(&record.message) {
            Some(ip) => {
                counts.increment(ip);
                stats.counted += 1;
            }
            None => stats.missing_ip += 1,
        }
    }

    debug!(
        source = name,
        window = %window,
        read = stats.lines_read,
        malformed = stats.malformed,
        outside_window = stats.outside_window,
        missing_ip = stats.missing_ip,
        counted = stats.counted,
        distinct_ips = counts.len(),
        "aggregation pass complete"
    );

    SourceTally {
        name: name.to_string(),
        window: *window,
        counts,
        stats,
    }
}

/// Same as [`aggregate_source`] for raw bytes.
///
/// Invalid UTF-8 sequences are replaced with U+FFFD rather than rejected, so
/// a damaged line only affects itself.
pub fn aggregate_bytes(name: &str, bytes: &[u8], window: &TimeWindow) -> SourceTally {
    let text = String::from_utf8_lossy(bytes);
    aggregate_source(name, &text, window)
}

/// Read an exported CSV report as a tally so it can be merged with log sources.
///
/// No window is applied: the counts are taken as exported. `window` is only
/// recorded on the tally. Any malformed row rejects the whole report.
pub fn import_report(name: &str, bytes: &[u8], window: &TimeWindow) -> Result<SourceTally> {
    let text = String::from_utf8_lossy(bytes);
    let counts = parse_csv(&text)?;
    let stats = PassStats {
        lines_read: counts.len() as u64,
        counted: counts.total(),
        ..PassStats::default()
    };

    debug!(
        source = name,
        distinct_ips = counts.len(),
        total = stats.counted,
        "report imported"
    );

    Ok(SourceTally {
        name: name.to_string(),
        window: *window,
        counts,
        stats,
    })
}

// ── Merging ───────────────────────────────────────────────────────────────────

/// Combine any number of count maps by summing counts per IP.
///
/// Order-independent; an empty input yields an empty map.
pub fn merge_counts<'a, I>(maps: I) -> CountMap
where
    I: IntoIterator<Item = &'a CountMap>,
{
    let mut merged = CountMap::new();
    for map in maps {
        merged.merge_from(map);
    }
    merged
}

// ── Tests ─────────────────────────────────────────────────────────────────────
