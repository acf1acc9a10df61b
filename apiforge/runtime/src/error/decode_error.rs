//! Payload decoding errors.

use serde_json::Value;
use thiserror::Error;

use super::ValidationError;

/// Errors while decoding a JSON payload into a typed value.
///
/// Nested failures are wrapped with the owning type and field (or list
/// index), so the message traces the path to the offending value.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// A required key was absent or `null`.
    #[error("{owner}: missing required field `{field}`")]
    MissingField {
        /// Type being decoded.
        owner: &'static str,
        /// Wire key that was missing.
        field: &'static str,
    },

    /// The JSON value had the wrong shape.
    #[error("expected {expected}, found {found}")]
    WrongType {
        /// Expected JSON kind.
        expected: &'static str,
        /// Actual JSON kind.
        found: &'static str,
    },

    /// A nested field failed to decode.
    #[error("{owner}.{field}: {source}")]
    InField {
        /// Type being decoded.
        owner: &'static str,
        /// Wire key of the failing field.
        field: &'static str,
        /// Underlying failure.
        #[source]
        source: Box<DecodeError>,
    },

    /// A list element failed to decode.
    #[error("[{index}]: {source}")]
    AtIndex {
        /// Position in the list.
        index: usize,
        /// Underlying failure.
        #[source]
        source: Box<DecodeError>,
    },

    /// An object was required.
    #[error("{owner}: expected a JSON object, found {found}")]
    ExpectedObject {
        /// Type being decoded.
        owner: &'static str,
        /// Actual JSON kind.
        found: &'static str,
    },

    /// The raw payload was not JSON.
    #[error("malformed JSON payload: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The decoded value broke a validation rule.
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    /// No codec is registered for the requested type.
    #[error("no codec registered for {0}")]
    Unregistered(&'static str),
}

impl DecodeError {
    /// A [`DecodeError::WrongType`] for `value`.
    pub fn wrong_type(expected: &'static str, value: &Value) -> Self {
        Self::WrongType {
            expected,
            found: json_kind(value),
        }
    }

    /// Wraps this error with the field it occurred in.
    pub fn in_field(self, owner: &'static str, field: &'static str) -> Self {
        Self::InField {
            owner,
            field,
            source: Box::new(self),
        }
    }

    /// Wraps this error with the list index it occurred at.
    pub fn at_index(self, index: usize) -> Self {
        Self::AtIndex {
            index,
            source: Box::new(self),
        }
    }

    /// Returns the innermost error, unwrapping field and index context.
    pub fn root(&self) -> &DecodeError {
        match self {
            Self::InField { source, .. } | Self::AtIndex { source, .. } => source.root(),
            other => other,
        }
    }

    /// Extracts a rule violation from any depth of field and index context.
    ///
    /// The violation's field becomes the full path to the offending value
    /// (`inner.name`, `pets[2].tag`). Errors that are not rule violations
    /// come back unchanged in `Err`.
    pub fn into_violation(self) -> Result<ValidationError, DecodeError> {
        if !matches!(self.root(), Self::Invalid(_)) {
            return Err(self);
        }
        let mut path = String::new();
        let mut current = self;
        loop {
            match current {
                Self::InField { field, source, .. } => {
                    if !path.is_empty() {
                        path.push('.');
                    }
                    path.push_str(field);
                    current = *source;
                }
                Self::AtIndex { index, source } => {
                    path.push_str(&format!("[{index}]"));
                    current = *source;
                }
                Self::Invalid(mut violation) => {
                    if !path.is_empty() {
                        violation.field = format!("{path}.{}", violation.field);
                    }
                    return Ok(violation);
                }
                other => return Err(other),
            }
        }
    }
}

/// Name of the JSON kind of `value`, for diagnostics.
pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
