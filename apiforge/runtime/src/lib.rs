//! Runtime support for apiforge-generated code.
//!
//! Generated DTO, server and client files depend only on this crate. It
//! re-exports the HTTP stack they are written against (`axum`, `reqwest`,
//! `tokio`, `bytes`, `serde_json`) so a consuming crate needs a single
//! dependency.
//!
//! ## Modules
//!
//! - [`codec`] - The keyed JSON [`Codec`] trait and field accessors
//! - [`registry`] - [`CodecRegistry`], the client's type-indexed decoders
//! - [`rules`] - Predicate helpers for validation rules
//! - [`server`] - Authentication gate and parameter binding for axum handlers
//! - [`client`] - Response helpers and asynchronous callback delivery
//! - [`error`] - Typed errors for all of the above
//!
//! ## Example
//!
//! ```
//! use apiforge_runtime::codec::field;
//! use apiforge_runtime::{Codec, DecodeError};
//! use serde_json::{Map, Value, json};
//!
//! #[derive(Debug, PartialEq)]
//! struct User { id: i64, name: Option<String> }
//!
//! impl Codec for User {
//!     fn decode(value: &Value) -> Result<Self, DecodeError> {
//!         let object = field::expect_object(value, "User")?;
//!         Ok(User {
//!             id: field::integer(object, "User", "id")?,
//!             name: field::string_opt(object, "User", "name")?,
//!         })
//!     }
//!
//!     fn encode(&self) -> Value {
//!         let mut object = Map::new();
//!         field::put(&mut object, "id", &self.id);
//!         field::put_opt(&mut object, "name", &self.name);
//!         Value::Object(object)
//!     }
//! }
//!
//! let user = User::decode(&json!({ "id": 1 })).unwrap();
//! assert_eq!(user, User { id: 1, name: None });
//! assert_eq!(user.encode(), json!({ "id": 1 }));
//! ```

pub mod client;
pub mod codec;
pub mod error;
pub mod registry;
pub mod rules;
pub mod server;

pub use axum;
pub use bytes;
pub use reqwest;
pub use serde_json;
pub use tokio;

pub use codec::Codec;
pub use error::{ApiError, ClientError, DecodeError, ValidationError};
pub use registry::CodecRegistry;
