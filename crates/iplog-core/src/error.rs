use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the iplog crates.
#[derive(Error, Debug)]
pub enum IpLogError {
    /// A source file could not be opened or read from disk.
    #[error("Failed to read source {path}: {source}")]
    SourceRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A log line is not valid JSON.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// A timestamp value did not match any recognised format.
    #[error("Invalid timestamp format: {0}")]
    TimestampParse(String),

    /// A decoded record is missing a required field or has the wrong shape.
    #[error("Invalid log record: {0}")]
    InvalidRecord(String),

    /// A time window was configured with out-of-range values.
    #[error("Invalid time window: {0}")]
    InvalidWindow(String),

    /// A CSV report could not be read back.
    #[error("Invalid report: {0}")]
    InvalidReport(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl IpLogError {
    /// `true` for the errors that only disqualify a single log line.
    ///
    /// These are recovered locally by the aggregator and must never fail a
    /// whole source.
    pub fn is_line_error(&self) -> bool {
        matches!(
            self,
            IpLogError::JsonParse(_) | IpLogError::TimestampParse(_) | IpLogError::InvalidRecord(_)
        )
    }
}

/// Convenience alias used throughout the iplog crates.
pub type Result<T> = std::result::Result<T, IpLogError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_source_read() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = IpLogError::SourceRead {
            path: PathBuf::from("/some/access.log"),
            source: io_err,
        };
        let msg = err.to_string();
        assert!(msg.contains("Failed to read source"));
        assert!(msg.contains("/some/access.log"));
        assert!(msg.contains("no such file"));
    }

    #[test]
    fn test_error_display_timestamp_parse() {
        let err = IpLogError::TimestampParse("not-a-timestamp".to_string());
        assert_eq!(err.to_string(), "Invalid timestamp format: not-a-timestamp");
    }

    #[test]
    fn test_error_display_invalid_window() {
        let err = IpLogError::InvalidWindow("start_hour 24 out of range".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid time window: start_hour 24 out of range"
        );
    }

    #[test]
    fn test_error_from_serde_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{invalid}").unwrap_err();
        let err: IpLogError = json_err.into();
        assert!(err.to_string().contains("Failed to parse JSON"));
        assert!(err.is_line_error());
    }

    #[test]
    fn test_source_read_is_not_line_error() {
        let err = IpLogError::SourceRead {
            path: PathBuf::from("x.log"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(!err.is_line_error());
        assert!(!IpLogError::InvalidWindow("x".into()).is_line_error());
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: IpLogError = io_err.into();
        assert!(err.to_string().contains("denied"));
    }
}
