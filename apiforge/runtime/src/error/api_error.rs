//! Server-side request errors.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use super::{DecodeError, ValidationError};

/// Errors a generated handler can short-circuit with.
///
/// Every variant maps to a client-error status: authentication failures to
/// `401`, everything else to `400`. The body is a JSON object with a single
/// `error` key.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A required parameter was not supplied.
    #[error("missing required {location} parameter `{name}`")]
    MissingParameter {
        /// Parameter name.
        name: &'static str,
        /// Request location (path, query, header, form, body).
        location: &'static str,
    },

    /// A parameter was supplied but could not be parsed.
    #[error("invalid {location} parameter `{name}`: {reason}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Request location.
        location: &'static str,
        /// Why parsing failed.
        reason: String,
    },

    /// A parameter or decoded body broke a validation rule.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The request did not satisfy the operation's security requirements.
    #[error("unauthorized: requires {schemes}")]
    Unauthorized {
        /// Required scheme names, comma separated.
        schemes: String,
    },

    /// The request body could not be decoded.
    #[error("invalid request body: {0}")]
    Decode(DecodeError),
}

impl From<DecodeError> for ApiError {
    fn from(err: DecodeError) -> Self {
        match err.into_violation() {
            Ok(violation) => Self::Validation(violation),
            Err(other) => Self::Decode(other),
        }
    }
}

impl ApiError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        tracing::debug!(status = status.as_u16(), error = %self, "rejecting request");
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}
