//! apiforge Model Library
//!
//! This crate provides the normalized API model consumed by the `apiforge-gen`
//! code generator, along with the build configuration that controls naming
//! and output files.
//!
//! ## Core Types
//!
//! - [`ApiModel`] - Info, definitions, paths and tags of one API
//! - [`Definition`] / [`Property`] - Named object types and their fields
//! - [`TypeRef`] / [`Primitive`] - Tagged-union type references
//! - [`Rule`] - Declarative validation constraints
//! - [`PathModel`] / [`PathMethodModel`] - Path templates and their operations
//! - [`Parameter`] / [`Location`] - Operation inputs and where they come from
//! - [`HttpMethod`] - HTTP methods (GET, POST, PUT, etc.)
//! - [`SecurityRequirement`] - Named authentication schemes
//! - [`Tag`] - Route grouping labels
//! - [`BuildConfig`] - Package naming and artifact file names
//!
//! The model is deserializable with serde, so a normalized description can be
//! stored as JSON and handed to the generator binary.
//!
//! ## Examples
//!
//! ```
//! use apiforge_define::{ApiModel, Definition, HttpMethod, Parameter, PathMethodModel, PathModel, Property, TypeRef};
//!
//! let model = ApiModel::new("Petstore")
//!     .with_definition(
//!         Definition::new("User")
//!             .with_property(Property::required("id", TypeRef::int()))
//!             .with_property(Property::optional("name", TypeRef::string())),
//!     )
//!     .with_route(PathModel::new("/users/{id}").with_method(
//!         PathMethodModel::new(HttpMethod::Get, "/users/{id}")
//!             .with_parameter(Parameter::path("id", TypeRef::int()))
//!             .with_response(TypeRef::reference("User"))
//!             .with_tag("users"),
//!     ));
//!
//! assert_eq!(model.info.title, "Petstore");
//! assert_eq!(model.operations().count(), 1);
//! ```

pub mod auth;
pub mod config;
pub mod parameter;
pub mod prelude;
pub mod rule;
pub mod schema;
pub mod types;

// Re-export main types at crate root
pub use auth::SecurityRequirement;
pub use config::{BuildConfig, ConfigError};
pub use parameter::{Location, Parameter};
pub use rule::Rule;
pub use schema::{Definition, Primitive, Property, TypeRef};
pub use types::{
    ApiInfo, ApiModel, ErrorResponse, HttpMethod, OperationKey, PathMethodModel, PathModel, Tag,
};
