//! Data pipeline for iplog.
//!
//! Decodes JSON log lines, extracts client IPs, counts them per source inside
//! a time window, merges per-source counts and renders the CSV report. Every
//! function here is pure over its inputs; retained state lives in the runtime
//! crate.

pub mod aggregator;
pub mod extractor;
pub mod reader;
pub mod report;

pub use iplog_core as core;
