//! HTTP client errors.

use thiserror::Error;

use super::DecodeError;

/// Errors from generated client calls.
///
/// These are delivered as the error arm of the callback's `Result`, or
/// returned directly from the `_async` methods.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Server returned a non-success HTTP status code.
    #[error("HTTP {status}: {body}")]
    Http {
        /// The HTTP status code returned.
        status: u16,
        /// Response body text.
        body: String,
    },

    /// HTTP request failed due to network or protocol error.
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response payload could not be decoded.
    #[error("failed to decode response: {0}")]
    Decode(#[from] DecodeError),

    /// The background task running the call panicked or was cancelled.
    #[error("call aborted: {0}")]
    Aborted(String),
}

impl ClientError {
    /// Returns the HTTP status code if the server answered with an error.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
