//! Rule violations.

use thiserror::Error;

/// A value failed a declared validation rule.
///
/// Names the field or parameter that was checked and the rule it broke.
///
/// ## Examples
///
/// ```
/// use apiforge_runtime::ValidationError;
///
/// let ok = ValidationError::check(true, "name", "not empty");
/// assert!(ok.is_ok());
///
/// let err = ValidationError::check(false, "name", "not empty").unwrap_err();
/// assert_eq!(err.field, "name");
/// assert_eq!(err.to_string(), "invalid `name`: must be not empty");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid `{field}`: must be {rule}")]
pub struct ValidationError {
    /// The field or parameter that failed.
    pub field: String,
    /// Human-readable rendering of the rule.
    pub rule: String,
}

impl ValidationError {
    /// Creates a violation for `field`.
    pub fn new(field: impl Into<String>, rule: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            rule: rule.into(),
        }
    }

    /// Returns `Ok(())` when `holds` is true, otherwise a violation for `field`.
    pub fn check(holds: bool, field: &str, rule: &str) -> Result<(), ValidationError> {
        if holds {
            Ok(())
        } else {
            Err(Self::new(field, rule))
        }
    }
}
