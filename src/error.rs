//! Crate-level error type returned by the state managers and the board.

use thiserror::Error;

use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum Error {
    /// The store service failed or could not be reached.
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Validation failed: {0}")]
    Validation(String),

    /// The connectivity probe failed.
    #[error("Store unreachable: {0}")]
    Connectivity(String),

    #[error("Not permitted: {0}")]
    Permission(String),

    #[error("No user is signed in")]
    NotSignedIn,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
