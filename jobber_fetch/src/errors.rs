//! Error types for the search page client.

/// Errors that can occur when fetching a search page.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// An HTTP request failed (network error or unreadable response).
    #[error("Request failed")]
    RequestFailed,
    /// The request did not complete within the configured timeout.
    #[error("Request timed out")]
    Timeout,
    /// The server returned a non-success status with a body snippet.
    #[error("Request failed with status {status}")]
    HttpStatus { status: u16, body: String },
    /// The base URL and search path did not form a valid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}
