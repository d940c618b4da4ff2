//! Error taxonomy for per-item lookups
//!
//! Every snapshot read, declaration lookup and tracker call returns
//! `Result<Option<T>, LookupError>`: `Ok(Some(_))` when found, `Ok(None)` when
//! the item is absent at the requested revision, and `Err(_)` when the lookup
//! itself failed. Orchestrators fold all three into "skip and continue".

use std::time::Duration;
use thiserror::Error;

/// Outcome of a single lookup
pub type LookupResult<T> = Result<Option<T>, LookupError>;

/// Failure of a single lookup
#[derive(Debug, Error)]
pub enum LookupError {
    /// The source could not be turned into a usable syntax tree
    #[error("failed to parse {path}: {reason}")]
    ParseFailure { path: String, reason: String },

    /// An external process or HTTP call exceeded its budget
    #[error("{operation} timed out after {}s", .timeout.as_secs())]
    Timeout { operation: String, timeout: Duration },

    /// Non-zero exit status or non-2xx response
    #[error("{service} failed ({status}): {detail}")]
    ExternalService {
        service: String,
        status: String,
        detail: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A response did not match the expected shape
    #[error("failed to decode {what}: {reason}")]
    Decode { what: String, reason: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl LookupError {
    /// Errors that callers must treat exactly like a missing item
    pub fn is_absent(&self) -> bool {
        matches!(self, LookupError::ParseFailure { .. })
    }

    pub(crate) fn external(
        service: impl Into<String>,
        status: impl ToString,
        detail: impl Into<String>,
    ) -> Self {
        LookupError::ExternalService {
            service: service.into(),
            status: status.to_string(),
            detail: detail.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_failure_counts_as_absent() {
        let err = LookupError::ParseFailure {
            path: "kernel/sched/fair.c".to_string(),
            reason: "no tree".to_string(),
        };
        assert!(err.is_absent());

        let err = LookupError::Timeout {
            operation: "git show".to_string(),
            timeout: Duration::from_secs(30),
        };
        assert!(!err.is_absent());
        assert_eq!(err.to_string(), "git show timed out after 30s");
    }

    #[test]
    fn test_external_display() {
        let err = LookupError::external("git show", "exit status: 128", "fatal: bad revision");
        assert_eq!(
            err.to_string(),
            "git show failed (exit status: 128): fatal: bad revision"
        );
    }
}
