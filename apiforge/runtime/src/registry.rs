//! Codec registry shared by a generated client.
//!
//! The client registers exactly the DTO types its operations exchange, plus
//! list codecs for those that travel as lists. Responses are decoded by
//! looking the target type up here, so a response type the client never
//! registered fails with [`DecodeError::Unregistered`] instead of guessing.

use std::any::{Any, TypeId};
use std::collections::HashMap;

use serde_json::Value;

use crate::codec::Codec;
use crate::error::DecodeError;

type DecodeFn = Box<dyn Fn(&Value) -> Result<Box<dyn Any + Send>, DecodeError> + Send + Sync>;

struct Entry {
    name: &'static str,
    decode: DecodeFn,
}

/// Type-indexed decoders.
///
/// ## Examples
///
/// ```
/// use apiforge_runtime::CodecRegistry;
/// use serde_json::json;
///
/// let mut codecs = CodecRegistry::new();
/// codecs.register::<String>();
/// codecs.register_list::<String>();
///
/// let names: Vec<String> = codecs.decode_list(r#"["a","b"]"#).unwrap();
/// assert_eq!(names, vec!["a", "b"]);
/// assert!(codecs.decode::<i64>(&json!(1)).is_err());
/// ```
#[derive(Default)]
pub struct CodecRegistry {
    entries: HashMap<TypeId, Entry>,
    order: Vec<TypeId>,
}

impl CodecRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the codec for `T`. Registering twice is a no-op.
    pub fn register<T: Codec + Send + 'static>(&mut self) {
        let id = TypeId::of::<T>();
        if self.entries.contains_key(&id) {
            return;
        }
        self.entries.insert(
            id,
            Entry {
                name: std::any::type_name::<T>(),
                decode: Box::new(|value: &Value| {
                    T::decode(value).map(|v| Box::new(v) as Box<dyn Any + Send>)
                }),
            },
        );
        self.order.push(id);
    }

    /// Registers the list codec for `Vec<T>`.
    pub fn register_list<T: Codec + Send + 'static>(&mut self) {
        self.register::<Vec<T>>();
    }

    /// Returns `true` if `T` has a registered codec.
    pub fn is_registered<T: 'static>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<T>())
    }

    /// Type names in registration order.
    pub fn names(&self) -> Vec<&'static str> {
        self.order
            .iter()
            .filter_map(|id| self.entries.get(id).map(|e| e.name))
            .collect()
    }

    /// Number of registered codecs.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns `true` when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Decodes `value` with the codec registered for `T`.
    pub fn decode<T: 'static>(&self, value: &Value) -> Result<T, DecodeError> {
        let name = std::any::type_name::<T>();
        let entry = self.entries.get(&TypeId::of::<T>()).ok_or_else(|| {
            tracing::debug!(type_name = name, "decode requested for unregistered codec");
            DecodeError::Unregistered(name)
        })?;
        let decoded = (entry.decode)(value)?;
        decoded
            .downcast::<T>()
            .map(|boxed| *boxed)
            .map_err(|_| DecodeError::Unregistered(name))
    }

    /// Parses raw response text and decodes it with the list codec for `T`.
    pub fn decode_list<T: 'static>(&self, raw: &str) -> Result<Vec<T>, DecodeError> {
        let value: Value = serde_json::from_str(raw)?;
        self.decode::<Vec<T>>(&value)
    }
}

impl std::fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodecRegistry")
            .field("codecs", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tracing_test::traced_test;

    #[test]
    fn register_is_idempotent_and_ordered() {
        let mut codecs = CodecRegistry::new();
        codecs.register::<i64>();
        codecs.register::<String>();
        codecs.register::<i64>();
        assert_eq!(codecs.len(), 2);
        assert_eq!(codecs.names(), vec!["i64", "alloc::string::String"]);
    }

    #[test]
    fn list_and_element_are_distinct() {
        let mut codecs = CodecRegistry::new();
        codecs.register_list::<i64>();
        assert!(codecs.is_registered::<Vec<i64>>());
        assert!(!codecs.is_registered::<i64>());
    }

    #[test]
    #[traced_test]
    fn unregistered_type_fails() {
        let codecs = CodecRegistry::new();
        let err = codecs.decode::<bool>(&json!(true)).unwrap_err();
        assert!(matches!(err, DecodeError::Unregistered("bool")));
        assert!(logs_contain("decode requested for unregistered codec"));
    }

    #[test]
    fn decode_list_preserves_wire_length() {
        let mut codecs = CodecRegistry::new();
        codecs.register_list::<i64>();
        let values: Vec<i64> = codecs.decode_list("[3, 1, 2, 2]").unwrap();
        assert_eq!(values, vec![3, 1, 2, 2]);
    }

    #[test]
    fn decode_list_rejects_malformed_text() {
        let mut codecs = CodecRegistry::new();
        codecs.register_list::<i64>();
        let err = codecs.decode_list::<i64>("[1, 2").unwrap_err();
        assert!(matches!(err, DecodeError::Malformed(_)));
    }
}
