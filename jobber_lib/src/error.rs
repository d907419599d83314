//! Error type for a single pipeline run.

use std::fmt;

use crate::db::StoreError;
use crate::extract::ParseError;

/// Failures that abort a run. Everything else (bad job cards, duplicate
/// inserts, failed notifications) is handled inside the run.
#[derive(Debug)]
pub enum RunError {
    /// Fetching the search page failed or timed out. Nothing was stored.
    Transport(jobber_fetch::Error),
    /// The fetched document could not be parsed at all.
    Parse(ParseError),
    /// The posting store failed for a reason other than a duplicate URL.
    Store(StoreError),
    /// The run's task panicked or was cancelled before it produced a result.
    Aborted(String),
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "Fetch error: {}", e),
            Self::Parse(e) => write!(f, "Parse error: {}", e),
            Self::Store(e) => write!(f, "Store error: {}", e),
            Self::Aborted(reason) => write!(f, "Run aborted: {}", reason),
        }
    }
}

impl std::error::Error for RunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Transport(e) => Some(e),
            Self::Parse(e) => Some(e),
            Self::Store(e) => Some(e),
            Self::Aborted(_) => None,
        }
    }
}

impl From<jobber_fetch::Error> for RunError {
    fn from(e: jobber_fetch::Error) -> Self {
        Self::Transport(e)
    }
}

impl From<ParseError> for RunError {
    fn from(e: ParseError) -> Self {
        Self::Parse(e)
    }
}

impl From<StoreError> for RunError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}
