//! Abstraction over where counter statistics come from.
//!
//! The `StatsSource` trait lets a check run against the local control socket,
//! the HTTP API, or canned data in tests, selected once at startup.

use std::fmt;

use crate::storage::model::{Snapshot, Watchlist};

/// Error produced while collecting statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectError {
    /// Control tool executable could not be found.
    NotFound(String),
    /// Control tool exited with a non-zero status. Holds its output.
    CommandFailed(String),
    /// Other I/O failure while running the control tool.
    Io(String),
    /// API rejected the key (HTTP 401).
    Auth(String),
    /// API could not be reached.
    Connection(String),
    /// API answered with a status other than 200 or 401.
    UnexpectedStatus(u16),
    /// Response could not be decoded.
    Malformed(String),
    /// Source returned no watched counters.
    Empty(String),
}

impl fmt::Display for CollectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollectError::NotFound(tool) => write!(f, "Control command '{}' not found.", tool),
            CollectError::CommandFailed(output) => write!(f, "{}", output),
            CollectError::Io(msg) => write!(f, "I/O error: {}", msg),
            CollectError::Auth(url) => write!(f, "Authentication failed: API key rejected by {}", url),
            CollectError::Connection(msg) => write!(f, "Connection error: {}", msg),
            CollectError::UnexpectedStatus(code) => {
                write!(f, "Unexpected result: API returned HTTP status {}", code)
            }
            CollectError::Malformed(msg) => write!(f, "Malformed statistics: {}", msg),
            CollectError::Empty(source) => write!(f, "No statistics returned by {}", source),
        }
    }
}

impl std::error::Error for CollectError {}

/// Producer of counter snapshots.
pub trait StatsSource {
    /// Short human-readable name used in logs and error messages.
    fn name(&self) -> &str;

    /// Reads the current counters, keeping only the ones on the watchlist.
    ///
    /// An empty result is reported as `CollectError::Empty`.
    fn collect(&mut self, watchlist: &Watchlist) -> Result<Snapshot, CollectError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages() {
        assert_eq!(
            CollectError::NotFound("pdns_control".into()).to_string(),
            "Control command 'pdns_control' not found."
        );
        assert_eq!(
            CollectError::CommandFailed("Unable to connect to remote".into()).to_string(),
            "Unable to connect to remote"
        );
        assert!(
            CollectError::UnexpectedStatus(500)
                .to_string()
                .contains("500")
        );
        assert!(
            CollectError::Auth("http://127.0.0.1:8081/".into())
                .to_string()
                .starts_with("Authentication failed")
        );
    }
}
