//! Collaborator error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors from the identity service.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// Email/password pair was rejected.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// The service answered with an error status.
    #[error("identity service rejected the request ({status}): {message}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Error description from the service.
        message: String,
    },

    /// The service answered with something we could not understand.
    #[error("malformed identity response: {0}")]
    Malformed(String),

    /// Transport failure talking to the service.
    #[error("identity service unreachable: {0}")]
    Http(#[from] reqwest::Error),

    /// Service unavailable (used by in-process providers).
    #[error("identity service unavailable: {0}")]
    Unavailable(String),
}

/// Errors from the profile directory.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// Database operation failed.
    #[error("profile lookup failed: {0}")]
    Repository(#[from] RepositoryError),

    /// Directory unavailable (used by in-process directories).
    #[error("profile directory unavailable: {0}")]
    Unavailable(String),
}
