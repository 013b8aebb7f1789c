use std::collections::hash_map::{self, HashMap};

use chrono::{DateTime, Local, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::{IpLogError, Result};

// ── LogRecord ─────────────────────────────────────────────────────────────────

/// A single decoded log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// Point in time of the record, resolved into host local time.
    pub timestamp: DateTime<Local>,
    /// Free-text message body.
    pub message: String,
}

// ── TimeWindow ────────────────────────────────────────────────────────────────

/// Default start hour of the counting window.
pub const DEFAULT_START_HOUR: u32 = 11;
/// Default start minute of the counting window.
pub const DEFAULT_START_MINUTE: u32 = 19;
/// Default width of the counting window in minutes.
pub const DEFAULT_RANGE_MINUTES: u32 = 8;

/// Time-of-day window used to admit records for counting.
///
/// Admits local times with `hour == start_hour` and a minute in
/// `[start_minute, start_minute + range_minutes)`. The window never rolls
/// into the next hour: minutes past 59 are simply never matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    start_hour: u32,
    start_minute: u32,
    range_minutes: u32,
}

impl TimeWindow {
    /// Build a validated window.
    ///
    /// Fails with [`IpLogError::InvalidWindow`] when `start_hour > 23`,
    /// `start_minute > 59` or `range_minutes == 0`.
    pub fn new(start_hour: u32, start_minute: u32, range_minutes: u32) -> Result<Self> {
        if start_hour > 23 {
            return Err(IpLogError::InvalidWindow(format!(
                "start hour {} is outside 0-23",
                start_hour
            )));
        }
        if start_minute > 59 {
            return Err(IpLogError::InvalidWindow(format!(
                "start minute {} is outside 0-59",
                start_minute
            )));
        }
        if range_minutes == 0 {
            return Err(IpLogError::InvalidWindow(
                "range must be at least one minute".to_string(),
            ));
        }
        Ok(Self {
            start_hour,
            start_minute,
            range_minutes,
        })
    }

    pub fn start_hour(&self) -> u32 {
        self.start_hour
    }

    pub fn start_minute(&self) -> u32 {
        self.start_minute
    }

    pub fn range_minutes(&self) -> u32 {
        self.range_minutes
    }

    /// First minute past the window, which may exceed 59.
    pub fn end_minute_exclusive(&self) -> u32 {
        self.start_minute.saturating_add(self.range_minutes)
    }

    /// `true` when part of the configured range falls past the end of the
    /// hour and can therefore never match.
    pub fn is_truncated(&self) -> bool {
        self.end_minute_exclusive() > 60
    }

    /// Test an hour/minute pair against the window.
    pub fn contains_hm(&self, hour: u32, minute: u32) -> bool {
        hour == self.start_hour && minute >= self.start_minute && minute < self.end_minute_exclusive()
    }

    /// Test any clock value (seconds are ignored).
    pub fn contains<T: Timelike>(&self, time: &T) -> bool {
        self.contains_hm(time.hour(), time.minute())
    }
}

impl Default for TimeWindow {
    fn default() -> Self {
        Self {
            start_hour: DEFAULT_START_HOUR,
            start_minute: DEFAULT_START_MINUTE,
            range_minutes: DEFAULT_RANGE_MINUTES,
        }
    }
}

impl std::fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:02}:{:02}+{}m",
            self.start_hour, self.start_minute, self.range_minutes
        )
    }
}

// ── IpCount ───────────────────────────────────────────────────────────────────

/// Number of occurrences of one client IP within a source or a merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpCount {
    pub ip: String,
    pub count: u64,
}

// ── CountMap ──────────────────────────────────────────────────────────────────

/// Per-IP occurrence tally.
///
/// Keys are compared as exact strings; no address normalisation is applied.
/// Every stored count is at least 1. Counts saturate at `u64::MAX` instead of
/// wrapping, so merging never panics or loses magnitude order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CountMap {
    counts: HashMap<String, u64>,
}

impl CountMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one occurrence of `ip`.
    pub fn increment(&mut self, ip: &str) {
        self.add(ip, 1);
    }

    /// Add `count` occurrences of `ip`. A zero count is ignored.
    pub fn add(&mut self, ip: &str, count: u64) {
        if count == 0 {
            return;
        }
        match self.counts.get_mut(ip) {
            Some(existing) => *existing = existing.saturating_add(count),
            None => {
                self.counts.insert(ip.to_string(), count);
            }
        }
    }

    /// Pointwise-add every entry of `other` into `self`.
    pub fn merge_from(&mut self, other: &CountMap) {
        for (ip, count) in other.iter() {
            self.add(ip, count);
        }
    }

    /// Count for `ip`, `0` when absent.
    pub fn get(&self, ip: &str) -> u64 {
        self.counts.get(ip).copied().unwrap_or(0)
    }

    /// Number of distinct IPs.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all counts, saturating at `u64::MAX`.
    pub fn total(&self) -> u64 {
        self.counts
            .values()
            .fold(0u64, |acc, count| acc.saturating_add(*count))
    }

    /// Iterate `(ip, count)` pairs in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(ip, count)| (ip.as_str(), *count))
    }

    /// Convert into unordered [`IpCount`] values.
    pub fn into_ip_counts(self) -> Vec<IpCount> {
        self.counts
            .into_iter()
            .map(|(ip, count)| IpCount { ip, count })
            .collect()
    }
}

impl<S: Into<String>> FromIterator<(S, u64)> for CountMap {
    fn from_iter<I: IntoIterator<Item = (S, u64)>>(iter: I) -> Self {
        let mut map = CountMap::new();
        for (ip, count) in iter {
            let ip: String = ip.into();
            map.add(&ip, count);
        }
        map
    }
}

impl IntoIterator for CountMap {
    type Item = (String, u64);
    type IntoIter = hash_map::IntoIter<String, u64>;

    fn into_iter(self) -> Self::IntoIter {
        self.counts.into_iter()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
