//! Core types shared by the iplog crates.
//!
//! Holds the log record and count data model, the counting window, timestamp
//! resolution, command-line settings and the common error type.

pub mod data_processors;
pub mod error;
pub mod models;
pub mod settings;

pub use error::{IpLogError, Result};
pub use models::{CountMap, IpCount, LogRecord, TimeWindow};
