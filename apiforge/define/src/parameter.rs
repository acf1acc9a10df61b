//! Operation parameters.
//!
//! A parameter is a named, typed value an operation reads from one location
//! of the incoming request.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use crate::rule::Rule;
use crate::schema::TypeRef;

/// Where in the request a parameter is read from.
///
/// ## Examples
///
/// ```
/// use apiforge_define::Location;
///
/// assert_eq!(Location::Query.to_string(), "query");
/// let loc: Location = serde_json::from_str(r#""form""#).unwrap();
/// assert_eq!(loc, Location::Form);
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Location {
    /// The JSON request body.
    Body,
    /// A request header.
    Header,
    /// A query string entry.
    Query,
    /// A path template placeholder.
    Path,
    /// A url-encoded form field.
    Form,
}

/// A named, typed input of an operation.
///
/// ## Examples
///
/// ```
/// use apiforge_define::{Location, Parameter, Rule, TypeRef};
///
/// let limit = Parameter::query("limit", TypeRef::int())
///     .optional()
///     .with_default(serde_json::json!(20))
///     .with_rule(Rule::range(Some(1.0), Some(100.0)));
///
/// assert_eq!(limit.location, Location::Query);
/// assert!(!limit.required);
/// assert!(limit.effective_rule().is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Name as it appears on the wire.
    pub name: String,
    /// Request location.
    pub location: Location,
    /// Value type.
    pub ty: TypeRef,
    /// Rule attached to the parameter itself.
    #[serde(default)]
    pub rule: Option<Rule>,
    /// Required parameters must be supplied by the caller.
    #[serde(default)]
    pub required: bool,
    /// Value bound when the parameter is absent.
    #[serde(default)]
    pub default: Option<serde_json::Value>,
    /// Parameter documentation.
    #[serde(default)]
    pub description: Option<String>,
}

impl Parameter {
    /// A required parameter at the given location.
    pub fn new(name: impl Into<String>, location: Location, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            location,
            ty,
            rule: None,
            required: true,
            default: None,
            description: None,
        }
    }

    /// A required path parameter.
    pub fn path(name: impl Into<String>, ty: TypeRef) -> Self {
        Self::new(name, Location::Path, ty)
    }

    /// A required query parameter.
    pub fn query(name: impl Into<String>, ty: TypeRef) -> Self {
        Self::new(name, Location::Query, ty)
    }

    /// A required header parameter.
    pub fn header(name: impl Into<String>, ty: TypeRef) -> Self {
        Self::new(name, Location::Header, ty)
    }

    /// A required form parameter.
    pub fn form(name: impl Into<String>, ty: TypeRef) -> Self {
        Self::new(name, Location::Form, ty)
    }

    /// A required body parameter.
    pub fn body(name: impl Into<String>, ty: TypeRef) -> Self {
        Self::new(name, Location::Body, ty)
    }

    /// Marks the parameter optional.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Attaches a rule.
    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rule = Some(rule);
        self
    }

    /// Sets the default value.
    pub fn with_default(mut self, default: serde_json::Value) -> Self {
        self.default = Some(default);
        self
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// The attached rule combined with the rule carried on the type.
    pub fn effective_rule(&self) -> Option<Rule> {
        Rule::combine(self.rule.as_ref(), self.ty.rule())
    }

    /// Rule every element of a list parameter must satisfy.
    pub fn element_rule(&self) -> Option<Rule> {
        self.ty.element_rule().cloned()
    }
}
