//! Error types for generated code.
//!
//! - [`ValidationError`] - a value broke a declared rule
//! - [`DecodeError`] - a payload could not be decoded
//! - [`ApiError`] - a server handler rejected a request
//! - [`ClientError`] - a client call failed

mod api_error;
mod client_error;
mod decode_error;
mod validation_error;

pub use api_error::ApiError;
pub use client_error::ClientError;
pub use decode_error::{DecodeError, json_kind};
pub use validation_error::ValidationError;
