//! Core types for the API model.
//!
//! This module provides the top-level pieces of an API description:
//!
//! - [`ApiModel`] - The complete, already-normalized model
//! - [`PathModel`] - A path template and the operations bound to it
//! - [`PathMethodModel`] - One HTTP verb bound to one path (an operation)
//! - [`HttpMethod`] - HTTP method enumeration
//! - [`OperationKey`] - Structural identity of an operation
//! - [`Tag`] - Route grouping label

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::auth::SecurityRequirement;
use crate::parameter::{Location, Parameter};
use crate::schema::{Definition, TypeRef};

/// HTTP methods an operation can be bound to.
///
/// ## Examples
///
/// Parse from string:
///
/// ```
/// use std::str::FromStr;
/// use apiforge_define::HttpMethod;
///
/// let method = HttpMethod::from_str("GET").unwrap();
/// assert_eq!(method, HttpMethod::Get);
/// ```
///
/// Display as uppercase:
///
/// ```
/// use apiforge_define::HttpMethod;
///
/// assert_eq!(HttpMethod::Post.to_string(), "POST");
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum HttpMethod {
    /// HTTP GET
    Get,
    /// HTTP POST
    Post,
    /// HTTP PUT
    Put,
    /// HTTP PATCH
    Patch,
    /// HTTP DELETE
    Delete,
    /// HTTP HEAD
    Head,
    /// HTTP OPTIONS
    Options,
}

/// Descriptive information about the API as a whole.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiInfo {
    /// API title (e.g., "Petstore"). Generated server and client type names
    /// derive from it unless the build configuration overrides them.
    pub title: String,
    /// Free-form description, rendered into module documentation.
    #[serde(default)]
    pub description: String,
    /// API version string.
    #[serde(default)]
    pub version: String,
}

/// Structural identity of an operation: its verb and path template.
///
/// Two operations with the same key are the same operation no matter how
/// many tags reference them or where they live in memory.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OperationKey {
    /// HTTP method.
    pub method: HttpMethod,
    /// Path template, placeholders included.
    pub path: String,
}

impl std::fmt::Display for OperationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

/// A route grouping label.
///
/// Tags partition route registration; they carry no identity for
/// deduplication purposes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// Tag name as it appears on operations.
    pub name: String,
    /// Optional description rendered on the registration function.
    #[serde(default)]
    pub description: Option<String>,
}

impl Tag {
    /// Creates a tag with no description.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }
}

/// A declared error response of an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// HTTP status code (e.g., 404).
    pub status: u16,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
}

/// A single operation: one HTTP verb bound to one path.
///
/// ## Examples
///
/// ```
/// use apiforge_define::{HttpMethod, Parameter, PathMethodModel, TypeRef};
///
/// let op = PathMethodModel::new(HttpMethod::Get, "/users/{id}")
///     .with_operation_id("getUser")
///     .with_parameter(Parameter::path("id", TypeRef::int()))
///     .with_response(TypeRef::reference("User"))
///     .with_tag("users");
///
/// assert_eq!(op.key().to_string(), "GET /users/{id}");
/// assert_eq!(op.path_parameters().count(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathMethodModel {
    /// HTTP verb.
    pub method: HttpMethod,
    /// Path template (e.g., "/users/{id}").
    pub path: String,
    /// Operation identifier used to name generated methods.
    ///
    /// When absent, a name is derived from the verb and path.
    #[serde(default)]
    pub operation_id: Option<String>,
    /// One-line summary.
    #[serde(default)]
    pub summary: String,
    /// Longer description.
    #[serde(default)]
    pub description: String,
    /// Parameters in declaration order.
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    /// Request body schema, if the operation takes one.
    #[serde(default)]
    pub request_body: Option<TypeRef>,
    /// Success response type. `None` is the void sentinel.
    #[serde(default)]
    pub response: Option<TypeRef>,
    /// Description of the success response.
    #[serde(default)]
    pub response_description: Option<String>,
    /// Declared error responses.
    #[serde(default)]
    pub errors: Vec<ErrorResponse>,
    /// Security requirements that gate this operation.
    #[serde(default)]
    pub security: Vec<SecurityRequirement>,
    /// Tags this operation is published under.
    #[serde(default)]
    pub tags: Vec<String>,
}

impl PathMethodModel {
    /// Creates an operation with no parameters, a void response and no tags.
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            operation_id: None,
            summary: String::new(),
            description: String::new(),
            parameters: Vec::new(),
            request_body: None,
            response: None,
            response_description: None,
            errors: Vec::new(),
            security: Vec::new(),
            tags: Vec::new(),
        }
    }

    /// Sets the operation identifier.
    pub fn with_operation_id(mut self, operation_id: impl Into<String>) -> Self {
        self.operation_id = Some(operation_id.into());
        self
    }

    /// Sets the summary line.
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }

    /// Appends a parameter.
    pub fn with_parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Sets the request body schema.
    pub fn with_request_body(mut self, body: TypeRef) -> Self {
        self.request_body = Some(body);
        self
    }

    /// Sets the success response type.
    pub fn with_response(mut self, response: TypeRef) -> Self {
        self.response = Some(response);
        self
    }

    /// Appends a declared error response.
    pub fn with_error(mut self, status: u16, description: impl Into<String>) -> Self {
        self.errors.push(ErrorResponse {
            status,
            description: description.into(),
        });
        self
    }

    /// Appends a security requirement.
    pub fn with_security(mut self, name: impl Into<String>) -> Self {
        self.security.push(SecurityRequirement::new(name));
        self
    }

    /// Appends a tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Returns the structural identity of this operation.
    pub fn key(&self) -> OperationKey {
        OperationKey {
            method: self.method,
            path: self.path.clone(),
        }
    }

    /// Returns `true` if this operation is published under `tag`.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Parameters bound to the given location, in declaration order.
    pub fn parameters_in(&self, location: Location) -> impl Iterator<Item = &Parameter> {
        self.parameters
            .iter()
            .filter(move |p| p.location == location)
    }

    /// Path parameters in declaration order.
    pub fn path_parameters(&self) -> impl Iterator<Item = &Parameter> {
        self.parameters_in(Location::Path)
    }

    /// Query parameters in declaration order.
    pub fn query_parameters(&self) -> impl Iterator<Item = &Parameter> {
        self.parameters_in(Location::Query)
    }

    /// Returns `true` if the operation reads anything from the request body.
    pub fn reads_body(&self) -> bool {
        self.request_body.is_some()
            || self
                .parameters
                .iter()
                .any(|p| matches!(p.location, Location::Body | Location::Form))
    }
}

/// A path template with the operations bound to it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathModel {
    /// Path template (e.g., "/users/{id}").
    pub path: String,
    /// One operation per HTTP verb, in declaration order.
    #[serde(default)]
    pub methods: Vec<PathMethodModel>,
}

impl PathModel {
    /// Creates a path with no operations.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            methods: Vec::new(),
        }
    }

    /// Appends an operation.
    pub fn with_method(mut self, method: PathMethodModel) -> Self {
        self.methods.push(method);
        self
    }
}

/// The complete, normalized API model consumed by the generator.
///
/// Parsing raw API-description documents into this model happens elsewhere;
/// the generator treats it as immutable input.
///
/// ## Examples
///
/// ```
/// use apiforge_define::{ApiModel, Definition, HttpMethod, PathMethodModel, PathModel, Property, TypeRef};
///
/// let model = ApiModel::new("Petstore")
///     .with_definition(
///         Definition::new("User")
///             .with_property(Property::required("id", TypeRef::int()))
///             .with_property(Property::optional("name", TypeRef::string())),
///     )
///     .with_route(PathModel::new("/users").with_method(
///         PathMethodModel::new(HttpMethod::Get, "/users")
///             .with_response(TypeRef::list_of(TypeRef::reference("User"))),
///     ));
///
/// assert_eq!(model.definitions.len(), 1);
/// assert_eq!(model.operations().count(), 1);
/// assert!(model.definition("User").is_some());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiModel {
    /// Title, description and version.
    pub info: ApiInfo,
    /// Definitions in model order.
    #[serde(default)]
    pub definitions: Vec<Definition>,
    /// Paths in model order.
    #[serde(default)]
    pub routes: Vec<PathModel>,
    /// Tags in model order.
    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl ApiModel {
    /// Creates an empty model with the given title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            info: ApiInfo {
                title: title.into(),
                ..ApiInfo::default()
            },
            ..Self::default()
        }
    }

    /// Sets the API description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.info.description = description.into();
        self
    }

    /// Appends a definition.
    pub fn with_definition(mut self, definition: Definition) -> Self {
        self.definitions.push(definition);
        self
    }

    /// Appends a path.
    pub fn with_route(mut self, route: PathModel) -> Self {
        self.routes.push(route);
        self
    }

    /// Appends a tag.
    pub fn with_tag(mut self, tag: Tag) -> Self {
        self.tags.push(tag);
        self
    }

    /// Looks up a definition by name.
    pub fn definition(&self, name: &str) -> Option<&Definition> {
        self.definitions.iter().find(|d| d.name == name)
    }

    /// Iterates over every operation in model order.
    pub fn operations(&self) -> impl Iterator<Item = &PathMethodModel> {
        self.routes.iter().flat_map(|route| route.methods.iter())
    }

    /// Returns `true` if any operation requires authentication.
    pub fn has_security(&self) -> bool {
        self.operations().any(|op| !op.security.is_empty())
    }
}
