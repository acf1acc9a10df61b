//! Convenient re-exports for building API models by hand.
//!
//! ```
//! use apiforge_define::prelude::*;
//!
//! let model = ApiModel::new("Petstore").with_route(
//!     PathModel::new("/pets/{id}").with_method(
//!         PathMethodModel::new(HttpMethod::Get, "/pets/{id}")
//!             .with_parameter(Parameter::path("id", TypeRef::int()))
//!             .with_response(TypeRef::reference("Pet")),
//!     ),
//! );
//! assert_eq!(model.operations().count(), 1);
//! ```

pub use crate::auth::SecurityRequirement;
pub use crate::config::BuildConfig;
pub use crate::parameter::{Location, Parameter};
pub use crate::rule::Rule;
pub use crate::schema::{Definition, Primitive, Property, TypeRef};
pub use crate::types::{ApiModel, HttpMethod, OperationKey, PathMethodModel, PathModel, Tag};
