//! apiforge code generator library.
//!
//! This crate turns a normalized API model (see `apiforge-define`) into
//! three coupled Rust artifacts plus router glue:
//!
//! - Data transfer objects with keyed JSON codecs and rule validation
//! - An axum server with one registration function per tag and one
//!   handler per operation
//! - A client SDK with an async method and a callback method per operation
//! - An `application()` function mounting every route
//!
//! All artifacts derive types through one [`codegen::TypeMapper`] and names
//! through [`naming`], which keeps them consistent with each other.
//!
//! ## Modules
//!
//! - [`codegen`] - Per-artifact compilers
//! - [`naming`] - Identifier derivation
//! - [`parser`] - Path template utilities
//! - [`validation`] - Pre-generation model checks
//! - [`output`] - Assembly, validation, formatting and emission
//! - [`errors`] - Error types for the generator
//!
//! ## Example Usage
//!
//! ```
//! use apiforge_define::{ApiModel, BuildConfig, Definition, Property, TypeRef};
//! use apiforge_gen::output::{MemoryEmitter, generate};
//!
//! let model = ApiModel::new("Petstore").with_definition(
//!     Definition::new("Pet").with_property(Property::required("id", TypeRef::int())),
//! );
//!
//! let mut emitter = MemoryEmitter::new();
//! generate(&model, &BuildConfig::default(), &mut emitter).unwrap();
//! assert!(emitter.get("dto.rs").unwrap().contains("pub struct Pet"));
//! ```

pub mod codegen;
pub mod errors;
pub mod naming;
pub mod output;
pub mod parser;
pub mod validation;

#[cfg(test)]
mod test_utils;
