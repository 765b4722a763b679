//! Crate-level error type.

use std::time::Duration;

use thiserror::Error;

/// Everything that can go wrong between the prompt and a file on disk.
///
/// Each variant carries enough context to render a useful message in the
/// error panel without inspecting the originating error.
#[derive(Debug, Error)]
pub enum ClientError {
    /// A TCP-level connection or transport failure.
    #[error("Connection failed to {url}: {detail}")]
    Connect { url: String, detail: String },

    /// The service replied with a non-2xx status code.
    #[error("HTTP {status} from {url}")]
    Http { status: u16, url: String },

    /// The response body could not be decoded.
    #[error("Invalid response from {url}: {detail}")]
    Json { url: String, detail: String },

    /// The request did not complete within the configured timeout.
    #[error("Request to {url} timed out after {after:?}")]
    Timeout { url: String, after: Duration },

    /// A newer submission (or a reload) replaced this one while it was in flight.
    #[error("Request superseded by a newer submission")]
    Superseded,

    /// The user interrupted the request (Ctrl+C).
    #[error("Request aborted by user")]
    Aborted,

    /// A download was requested with no session or an empty file list.
    #[error("No files available to download")]
    NoFiles,

    /// A tab index outside `0..len`.
    #[error("No file at index {index} (session has {len} files)")]
    InvalidIndex { index: usize, len: usize },

    /// `open_history` was given an id the service does not know.
    #[error("No stored session with id '{0}'")]
    UnknownSession(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_display_has_status_and_url() {
        let err = ClientError::Http {
            status: 503,
            url: "http://localhost:8000/generate-code".to_string(),
        };
        let s = err.to_string();
        assert!(s.contains("503"), "expected status in display: {s}");
        assert!(s.contains("/generate-code"), "expected url: {s}");
    }

    #[test]
    fn connect_display_has_detail() {
        let err = ClientError::Connect {
            url: "http://localhost:8000".to_string(),
            detail: "connection refused".to_string(),
        };
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn timeout_display_has_seconds() {
        let err = ClientError::Timeout {
            url: "u".to_string(),
            after: Duration::from_secs(7),
        };
        assert!(err.to_string().contains("7s"));
    }

    #[test]
    fn sub_second_timeout_keeps_millis() {
        let err = ClientError::Timeout {
            url: "http://localhost:8000/generate-code".to_string(),
            after: Duration::from_millis(50),
        };
        let s = err.to_string();
        assert!(s.contains("50ms"), "expected millis: {s}");
        assert!(!s.contains("0s"), "must not round to zero: {s}");
    }

    #[test]
    fn aborted_is_distinct_from_superseded() {
        let aborted = ClientError::Aborted.to_string();
        assert!(aborted.contains("aborted"));
        assert_ne!(aborted, ClientError::Superseded.to_string());
    }

    #[test]
    fn no_files_message_matches_alert_text() {
        assert_eq!(ClientError::NoFiles.to_string(), "No files available to download");
    }

    #[test]
    fn io_error_exposes_source() {
        use std::error::Error as _;
        let err = ClientError::Io {
            path: "/tmp/x".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.source().is_some());
        assert!(err.to_string().contains("/tmp/x"));
    }
}
