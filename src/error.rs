//! Crate-wide error type.
//!
//! Each variant classifies one kind of failure and maps to a distinct
//! process exit code, so scripts driving the CLI can tell a task failure
//! from a timeout or a transport problem.

use thiserror::Error;

/// Any failure the client can produce.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid arguments or configuration, caught before any remote call.
    #[error("{0}")]
    Validation(String),

    /// The request never produced an HTTP response.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The service answered with a non-2xx status.
    #[error("request to {url} failed with status {status}: {body}")]
    Api {
        /// The request URL.
        url: String,
        /// The HTTP status code.
        status: u16,
        /// The response body, truncated for display.
        body: String,
    },

    /// A task reached a terminal status other than completed.
    #[error("task failed: {body}")]
    TaskFailed {
        /// The final status payload, verbatim.
        body: String,
    },

    /// A task was still in progress when the poll ceiling was exceeded.
    #[error("task still in progress after {timeout_secs} seconds")]
    TimedOut {
        /// The configured ceiling in seconds.
        timeout_secs: u64,
    },

    /// Consecutive transport failures exhausted the status-query retry
    /// bound.
    #[error("status query failed after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        /// Attempts issued before giving up.
        attempts: u32,
        /// The last transport error observed.
        last_error: String,
    },

    /// A local file could not be read or written.
    #[error("{context}: {source}")]
    Io {
        /// What was being done when the failure occurred.
        context: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Wraps an I/O error with a description of the operation that failed.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io { context: context.into(), source }
    }

    /// The process exit code for this failure. Zero is reserved for
    /// success; each variant gets its own nonzero code.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) => 2,
            Self::Transport(_) => 3,
            Self::Api { .. } => 4,
            Self::TaskFailed { .. } => 5,
            Self::TimedOut { .. } => 6,
            Self::RetriesExhausted { .. } => 7,
            Self::Io { .. } => 8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn every_variant_has_a_distinct_nonzero_exit_code() {
        let errors = [
            Error::Validation("v".into()),
            Error::Transport("t".into()),
            Error::Api { url: "u".into(), status: 500, body: "b".into() },
            Error::TaskFailed { body: "b".into() },
            Error::TimedOut { timeout_secs: 1 },
            Error::RetriesExhausted { attempts: 3, last_error: "e".into() },
            Error::io("reading", std::io::Error::other("boom")),
        ];
        let codes: HashSet<u8> = errors.iter().map(Error::exit_code).collect();
        assert_eq!(codes.len(), errors.len());
        assert!(!codes.contains(&0));
    }

    #[test]
    fn task_failure_carries_the_body_verbatim() {
        let body = r#"{"status":"failed","message":"fusion set removed"}"#;
        let err = Error::TaskFailed { body: body.into() };
        assert!(err.to_string().contains(body));
    }

    #[test]
    fn io_errors_name_the_operation() {
        let err = Error::io("reading app file demo.apk", std::io::Error::other("denied"));
        let text = err.to_string();
        assert!(text.contains("reading app file demo.apk"));
        assert!(text.contains("denied"));
    }
}
