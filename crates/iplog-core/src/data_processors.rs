use chrono::{
    DateTime, Duration, FixedOffset, Local, LocalResult, NaiveDate, NaiveDateTime, Offset,
    TimeZone, Utc,
};
use serde_json::Value;

// ── TimestampProcessor ────────────────────────────────────────────────────────

/// Resolves the timestamp formats found in log records into host local time.
pub struct TimestampProcessor;

/// Offset-less date-time patterns, interpreted as host-local wall clock.
const LOCAL_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

impl TimestampProcessor {
    /// Attempt to resolve a [`serde_json::Value`] into a local [`DateTime`].
    ///
    /// Handles:
    /// * JSON string → RFC 3339 with offset or `Z` (converted to local time),
    ///   offset-less date-times (taken as local wall clock), or a bare
    ///   `YYYY-MM-DD` date (UTC midnight).
    /// * JSON number → Unix epoch milliseconds.
    ///
    /// Anything else yields `None`.
    pub fn parse(value: &Value) -> Option<DateTime<Local>> {
        match value {
            Value::String(s) => Self::parse_str(s.as_str()),
            Value::Number(n) => {
                let millis = match n.as_i64() {
                    Some(ms) => ms,
                    None => {
                        let f = n.as_f64()?;
                        if !f.is_finite() {
                            return None;
                        }
                        f.trunc() as i64
                    }
                };
                DateTime::from_timestamp_millis(millis).map(|dt| dt.with_timezone(&Local))
            }
            _ => None,
        }
    }

    /// Resolve a timestamp string into local time.
    pub fn parse_str(s: &str) -> Option<DateTime<Local>> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }

        // Replace trailing 'Z' with '+00:00' for RFC 3339 compatibility.
        let normalised = if let Some(stripped) = s.strip_suffix('Z') {
            format!("{}+00:00", stripped)
        } else {
            s.to_string()
        };

        if let Ok(dt) = DateTime::parse_from_rfc3339(&normalised) {
            return Some(dt.with_timezone(&Local));
        }

        for fmt in LOCAL_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
                return Self::from_local_naive(&naive);
            }
        }

        // Date-only strings denote UTC midnight.
        if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            let naive = date.and_hms_opt(0, 0, 0)?;
            return Some(Utc.from_utc_datetime(&naive).with_timezone(&Local));
        }

        None
    }

    /// Attach the host timezone to a wall-clock value.
    fn from_local_naive(naive: &NaiveDateTime) -> Option<DateTime<Local>> {
        resolve_wall_clock(&Local, naive)
    }
}

/// Attach `tz` to a wall-clock value the way ECMAScript `Date` does.
///
/// Ambiguous times (DST fall-back) resolve to the earlier instant. Times
/// skipped by a DST jump are read with the offset in force before the jump,
/// which moves them forward by the length of the gap (02:30 becomes 03:30).
fn resolve_wall_clock<Tz: TimeZone>(tz: &Tz, naive: &NaiveDateTime) -> Option<DateTime<Tz>> {
    match tz.from_local_datetime(naive) {
        LocalResult::Single(dt) => Some(dt),
        LocalResult::Ambiguous(earliest, _) => Some(earliest),
        LocalResult::None => {
            // Gaps are at most a few hours; a day earlier is safely before it.
            let before = naive.checked_sub_signed(Duration::days(1))?;
            let offset = tz.offset_from_local_datetime(&before).earliest()?.fix();
            let utc = gap_to_utc(naive, offset)?;
            Some(tz.from_utc_datetime(&utc))
        }
    }
}

/// UTC instant of a skipped wall-clock value, using the pre-jump offset.
fn gap_to_utc(naive: &NaiveDateTime, offset_before: FixedOffset) -> Option<NaiveDateTime> {
    naive.checked_sub_signed(Duration::seconds(i64::from(
        offset_before.local_minus_utc(),
    )))
}

// ── Report date ───────────────────────────────────────────────────────────────

/// Calendar date used to stamp generated reports: today's UTC date.
pub fn report_date() -> NaiveDate {
    Utc::now().date_naive()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
