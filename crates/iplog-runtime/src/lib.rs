//! Runtime coordination layer for iplog.
//!
//! Reads sources asynchronously, keeps each source's counts, and produces
//! per-source or merged report artifacts on request.

pub mod orchestrator;

pub use iplog_core as core;
pub use iplog_data as data;
