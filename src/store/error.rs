//! Store adapter error types.

use thiserror::Error;

/// A failure surfaced by the store service's read/write/delete path.
///
/// Every variant is terminal for the call that produced it; nothing is retried.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The request could not be sent or the response could not be read.
    #[error("Store request failed: {0}")]
    Http(String),

    /// The service answered with a non-success status.
    #[error("Store returned {status}: {message}")]
    Status { status: u16, message: String },

    /// A unique key already exists.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A single-row read matched more than one row.
    #[error("Expected at most one row, got {0}")]
    MultipleRows(usize),

    /// A response body did not match the expected shape.
    #[error("Failed to decode store response: {0}")]
    Decode(String),

    /// A change-feed channel could not be opened.
    #[error("Change feed error: {0}")]
    ChangeFeed(String),
}

impl From<reqwest::Error> for StoreError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            StoreError::Decode(e.to_string())
        } else {
            StoreError::Http(e.to_string())
        }
    }
}
