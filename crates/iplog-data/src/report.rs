//! Sorted IP count reports and their CSV form.

use std::cmp::Ordering;

use chrono::NaiveDate;
use iplog_core::error::{IpLogError, Result};
use iplog_core::models::{CountMap, IpCount};
use serde::Serialize;

/// Header row of every CSV report.
pub const CSV_HEADER: &str = "IP Address,Count";

// ── Report ────────────────────────────────────────────────────────────────────

/// An immutable, ordered view of a [`CountMap`].
///
/// Entries are sorted by count, highest first. Equal counts are ordered by
/// ascending IP string (byte-wise), so the same map always renders to the
/// same CSV.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    entries: Vec<IpCount>,
    generated_on: NaiveDate,
}

impl Report {
    /// Build a report from `counts`, stamped with `generated_on`.
    pub fn from_counts(counts: &CountMap, generated_on: NaiveDate) -> Self {
        let mut entries = counts.clone().into_ip_counts();
        entries.sort_by(compare_entries);
        Self {
            entries,
            generated_on,
        }
    }

    pub fn entries(&self) -> &[IpCount] {
        &self.entries
    }

    pub fn generated_on(&self) -> NaiveDate {
        self.generated_on
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of all counts in the report.
    pub fn total(&self) -> u64 {
        self.entries
            .iter()
            .fold(0u64, |acc, e| acc.saturating_add(e.count))
    }

    /// Render as CSV: the header, then `<ip>,<count>` per entry.
    ///
    /// Rows are joined with `\n` and there is no trailing line terminator; an
    /// empty report is the header alone.
    pub fn to_csv(&self) -> String {
        let mut out = String::with_capacity(CSV_HEADER.len() + self.entries.len() * 20);
        out.push_str(CSV_HEADER);
        for entry in &self.entries {
            out.push('\n');
            out.push_str(&entry.ip);
            out.push(',');
            out.push_str(&entry.count.to_string());
        }
        out
    }

    /// Download name of the report: `log_<YYYY-MM-DD>.csv`.
    pub fn file_name(&self) -> String {
        report_file_name(self.generated_on)
    }
}

/// `log_<YYYY-MM-DD>.csv` for the given date.
pub fn report_file_name(date: NaiveDate) -> String {
    format!("log_{}.csv", date.format("%Y-%m-%d"))
}

fn compare_entries(a: &IpCount, b: &IpCount) -> Ordering {
    b.count.cmp(&a.count).then_with(|| a.ip.cmp(&b.ip))
}

// ── CSV reading ───────────────────────────────────────────────────────────────

/// Read a rendered report back into a [`CountMap`].
///
/// Accepts `\n` or `\r\n` line endings, a trailing newline and a leading
/// byte-order mark. Repeated IPs are summed; a sum that does not fit in a
/// `u64` is rejected rather than saturated, since no real export holds it.
pub fn parse_csv(text: &str) -> Result<CountMap> {
    let text = text.strip_prefix('\u{FEFF}').unwrap_or(text);
    let mut lines = text.lines();
    match lines.next().map(str::trim_end) {
        Some(CSV_HEADER) => {}
        Some(other) => {
            return Err(IpLogError::InvalidReport(format!(
                "unexpected header: {:?}",
                other
            )))
        }
        None => return Err(IpLogError::InvalidReport("empty report".to_string())),
    }

    let mut counts = CountMap::new();
    for (index, row) in lines.enumerate() {
        let row = row.trim_end();
        if row.is_empty() {
            continue;
        }
        let (ip, count) = row.rsplit_once(',').ok_or_else(|| {
            IpLogError::InvalidReport(format!("row {}: missing delimiter", index + 2))
        })?;
        if ip.is_empty() {
            return Err(IpLogError::InvalidReport(format!(
                "row {}: empty IP address",
                index + 2
            )));
        }
        let count: u64 = count.parse().map_err(|_| {
            IpLogError::InvalidReport(format!("row {}: invalid count {:?}", index + 2, count))
        })?;
        if counts.get(ip).checked_add(count).is_none() {
            return Err(IpLogError::InvalidReport(format!(
                "row {}: count for {} overflows",
                index + 2,
                ip
            )));
        }
        counts.add(ip, count);
    }
    Ok(counts)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()
    }

    fn counts(pairs: &[(&str, u64)]) -> CountMap {
        pairs.iter().map(|(ip, c)| (*ip, *c)).collect()
    }

    #[test]
    fn test_merged_example_csv() {
        let map = counts(&[("10.0.0.3", 1), ("10.0.0.1", 5)]);
        let report = Report::from_counts(&map, date());
        assert_eq!(report.to_csv(), "IP Address,Count\n10.0.0.1,5\n10.0.0.3,1");
        assert_eq!(report.total(), 6);
    }

    #[test]
    fn test_sorted_descending_with_ip_tie_break() {
        let map = counts(&[
            ("10.0.0.9", 2),
            ("10.0.0.10", 2),
            ("192.168.0.1", 7),
            ("10.0.0.2", 2),
            ("1.1.1.1", 1),
        ]);
        let report = Report::from_counts(&map, date());
        let order: Vec<(&str, u64)> = report
            .entries()
            .iter()
            .map(|e| (e.ip.as_str(), e.count))
            .collect();
        assert_eq!(
            order,
            vec![
                ("192.168.0.1", 7),
                ("10.0.0.10", 2),
                ("10.0.0.2", 2),
                ("10.0.0.9", 2),
                ("1.1.1.1", 1),
            ]
        );
    }

    #[test]
    fn test_empty_report_is_header_only() {
        let report = Report::from_counts(&CountMap::new(), date());
        assert!(report.is_empty());
        assert_eq!(report.to_csv(), CSV_HEADER);
    }

    #[test]
    fn test_file_name_uses_generation_date() {
        let report = Report::from_counts(&CountMap::new(), date());
        assert_eq!(report.file_name(), "log_2024-03-09.csv");
        assert_eq!(report.generated_on(), date());
    }

    #[test]
    fn test_csv_round_trip_recovers_counts() {
        let map = counts(&[
            ("10.0.0.1", 5),
            ("10.0.0.3", 1),
            ("172.16.0.4", 12),
            ("999.1.1.1", 1),
        ]);
        let csv = Report::from_counts(&map, date()).to_csv();
        assert_eq!(parse_csv(&csv).unwrap(), map);
    }

    #[test]
    fn test_parse_csv_tolerates_crlf_and_trailing_newline() {
        let parsed = parse_csv("IP Address,Count\r\n10.0.0.1,5\r\n10.0.0.1,2\r\n").unwrap();
        assert_eq!(parsed, counts(&[("10.0.0.1", 7)]));
        assert!(parse_csv("IP Address,Count").unwrap().is_empty());
    }

    #[test]
    fn test_parse_csv_rejects_malformed() {
        assert!(matches!(parse_csv(""), Err(IpLogError::InvalidReport(_))));
        assert!(matches!(
            parse_csv("ip,count\n10.0.0.1,1"),
            Err(IpLogError::InvalidReport(_))
        ));
        assert!(matches!(
            parse_csv("IP Address,Count\n10.0.0.1"),
            Err(IpLogError::InvalidReport(_))
        ));
        assert!(matches!(
            parse_csv("IP Address,Count\n10.0.0.1,many"),
            Err(IpLogError::InvalidReport(_))
        ));
        assert!(matches!(
            parse_csv("IP Address,Count\n,3"),
            Err(IpLogError::InvalidReport(_))
        ));
    }

    #[test]
    fn test_parse_csv_rejects_overflowing_sum() {
        let text = "IP Address,Count\n10.0.0.1,18446744073709551615\n10.0.0.1,1";
        let err = parse_csv(text).unwrap_err();
        assert!(matches!(err, IpLogError::InvalidReport(_)), "{err}");

        let text = "IP Address,Count\n10.0.0.1,18446744073709551615\n10.0.0.2,1";
        let counts = parse_csv(text).unwrap();
        assert_eq!(counts.get("10.0.0.1"), u64::MAX);
    }

    #[test]
    fn test_parse_csv_ignores_byte_order_mark() {
        let counts = parse_csv("\u{FEFF}IP Address,Count\n10.0.0.1,4\n").unwrap();
        assert_eq!(counts.get("10.0.0.1"), 4);
    }

    #[test]
    fn test_report_is_a_snapshot() {
        let mut map = counts(&[("10.0.0.1", 1)]);
        let report = Report::from_counts(&map, date());
        map.increment("10.0.0.1");
        assert_eq!(report.entries()[0].count, 1);
    }
}
