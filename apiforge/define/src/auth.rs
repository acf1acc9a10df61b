//! Authentication requirements for operations.
//!
//! The model only names the schemes an operation requires. How a scheme is
//! checked is decided at runtime by whatever authenticator the generated
//! server is constructed with.

use serde::{Deserialize, Serialize};

/// A named authentication scheme an operation requires.
///
/// Deserializes from either a bare string or an object with a `name` key.
///
/// ## Examples
///
/// ```
/// use apiforge_define::SecurityRequirement;
///
/// let from_str: SecurityRequirement = serde_json::from_str(r#""bearer""#).unwrap();
/// let from_obj: SecurityRequirement = serde_json::from_str(r#"{"name":"bearer"}"#).unwrap();
/// assert_eq!(from_str, from_obj);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RequirementRepr")]
pub struct SecurityRequirement {
    /// Scheme name (e.g., "bearer", "api_key").
    pub name: String,
}

impl SecurityRequirement {
    /// Creates a requirement for the named scheme.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RequirementRepr {
    Name(String),
    Object { name: String },
}

impl From<RequirementRepr> for SecurityRequirement {
    fn from(repr: RequirementRepr) -> Self {
        match repr {
            RequirementRepr::Name(name) | RequirementRepr::Object { name } => Self { name },
        }
    }
}
