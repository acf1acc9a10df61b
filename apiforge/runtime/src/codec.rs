//! Keyed JSON codecs.
//!
//! Every generated DTO implements [`Codec`] by reading and writing its fields
//! by wire key, one at a time, through the accessors in [`field`]. Scalars,
//! lists and boxes implement it here.
//!
//! ## Examples
//!
//! ```
//! use apiforge_runtime::Codec;
//! use serde_json::json;
//!
//! let ids = Vec::<i64>::decode(&json!([1, 2, 3])).unwrap();
//! assert_eq!(ids, vec![1, 2, 3]);
//! assert_eq!(ids.encode(), json!([1, 2, 3]));
//! ```

use serde_json::Value;

use crate::error::DecodeError;

/// Conversion between a typed value and its JSON tree.
pub trait Codec: Sized {
    /// Decodes `value`, failing on shape mismatches and rule violations.
    fn decode(value: &Value) -> Result<Self, DecodeError>;

    /// Encodes `self`. Optional fields that are absent are omitted.
    fn encode(&self) -> Value;
}

impl Codec for bool {
    fn decode(value: &Value) -> Result<Self, DecodeError> {
        value
            .as_bool()
            .ok_or_else(|| DecodeError::wrong_type("boolean", value))
    }

    fn encode(&self) -> Value {
        Value::Bool(*self)
    }
}

impl Codec for i64 {
    fn decode(value: &Value) -> Result<Self, DecodeError> {
        value
            .as_i64()
            .ok_or_else(|| DecodeError::wrong_type("integer", value))
    }

    fn encode(&self) -> Value {
        Value::from(*self)
    }
}

impl Codec for f64 {
    fn decode(value: &Value) -> Result<Self, DecodeError> {
        value
            .as_f64()
            .ok_or_else(|| DecodeError::wrong_type("number", value))
    }

    // Non-finite floats have no JSON form and encode as null.
    fn encode(&self) -> Value {
        serde_json::Number::from_f64(*self)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

impl Codec for String {
    fn decode(value: &Value) -> Result<Self, DecodeError> {
        value
            .as_str()
            .map(str::to_owned)
            .ok_or_else(|| DecodeError::wrong_type("string", value))
    }

    fn encode(&self) -> Value {
        Value::String(self.clone())
    }
}

impl Codec for () {
    fn decode(_value: &Value) -> Result<Self, DecodeError> {
        Ok(())
    }

    fn encode(&self) -> Value {
        Value::Null
    }
}

impl<T: Codec> Codec for Vec<T> {
    fn decode(value: &Value) -> Result<Self, DecodeError> {
        let items = value
            .as_array()
            .ok_or_else(|| DecodeError::wrong_type("array", value))?;
        items
            .iter()
            .enumerate()
            .map(|(index, item)| T::decode(item).map_err(|e| e.at_index(index)))
            .collect()
    }

    fn encode(&self) -> Value {
        Value::Array(self.iter().map(Codec::encode).collect())
    }
}

impl<T: Codec> Codec for Box<T> {
    fn decode(value: &Value) -> Result<Self, DecodeError> {
        T::decode(value).map(Box::new)
    }

    fn encode(&self) -> Value {
        (**self).encode()
    }
}

impl<T: Codec> Codec for Option<T> {
    fn decode(value: &Value) -> Result<Self, DecodeError> {
        match value {
            Value::Null => Ok(None),
            other => T::decode(other).map(Some),
        }
    }

    fn encode(&self) -> Value {
        self.as_ref().map_or(Value::Null, Codec::encode)
    }
}

/// Keyed field accessors used by generated `decode`/`encode` bodies.
///
/// The required accessors fail with [`DecodeError::MissingField`] when the
/// key is absent or `null`; the `_opt` accessors return `None` instead.
/// Errors inside a present value are wrapped with the owner and key.
pub mod field {
    use serde_json::{Map, Value};

    use super::Codec;
    use crate::error::{DecodeError, json_kind};

    /// JSON object being decoded.
    pub type Object = Map<String, Value>;

    /// Borrows `value` as an object, or fails naming `owner`.
    pub fn expect_object<'a>(value: &'a Value, owner: &'static str) -> Result<&'a Object, DecodeError> {
        value.as_object().ok_or(DecodeError::ExpectedObject {
            owner,
            found: json_kind(value),
        })
    }

    /// Decodes a required field of any codec type.
    pub fn required<T: Codec>(
        object: &Object,
        owner: &'static str,
        key: &'static str,
    ) -> Result<T, DecodeError> {
        optional(object, owner, key)?.ok_or(DecodeError::MissingField { owner, field: key })
    }

    /// Decodes an optional field of any codec type.
    pub fn optional<T: Codec>(
        object: &Object,
        owner: &'static str,
        key: &'static str,
    ) -> Result<Option<T>, DecodeError> {
        match object.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => T::decode(value)
                .map(Some)
                .map_err(|e| e.in_field(owner, key)),
        }
    }

    /// Required boolean field.
    pub fn boolean(object: &Object, owner: &'static str, key: &'static str) -> Result<bool, DecodeError> {
        required(object, owner, key)
    }

    /// Optional boolean field.
    pub fn boolean_opt(object: &Object, owner: &'static str, key: &'static str) -> Result<Option<bool>, DecodeError> {
        optional(object, owner, key)
    }

    /// Required integer field.
    pub fn integer(object: &Object, owner: &'static str, key: &'static str) -> Result<i64, DecodeError> {
        required(object, owner, key)
    }

    /// Optional integer field.
    pub fn integer_opt(object: &Object, owner: &'static str, key: &'static str) -> Result<Option<i64>, DecodeError> {
        optional(object, owner, key)
    }

    /// Required float field.
    pub fn float(object: &Object, owner: &'static str, key: &'static str) -> Result<f64, DecodeError> {
        required(object, owner, key)
    }

    /// Optional float field.
    pub fn float_opt(object: &Object, owner: &'static str, key: &'static str) -> Result<Option<f64>, DecodeError> {
        optional(object, owner, key)
    }

    /// Required string (or date) field.
    pub fn string(object: &Object, owner: &'static str, key: &'static str) -> Result<String, DecodeError> {
        required(object, owner, key)
    }

    /// Optional string (or date) field.
    pub fn string_opt(object: &Object, owner: &'static str, key: &'static str) -> Result<Option<String>, DecodeError> {
        optional(object, owner, key)
    }

    /// Required unit field. Only presence of the key is checked.
    pub fn unit(object: &Object, owner: &'static str, key: &'static str) -> Result<(), DecodeError> {
        if object.contains_key(key) {
            Ok(())
        } else {
            Err(DecodeError::MissingField { owner, field: key })
        }
    }

    /// Optional unit field. Present keys decode to `Some(())`, even when `null`.
    pub fn unit_opt(object: &Object, _owner: &'static str, key: &'static str) -> Result<Option<()>, DecodeError> {
        Ok(object.contains_key(key).then_some(()))
    }

    /// Required nested object field.
    pub fn object<T: Codec>(object: &Object, owner: &'static str, key: &'static str) -> Result<T, DecodeError> {
        required(object, owner, key)
    }

    /// Optional nested object field.
    pub fn object_opt<T: Codec>(object: &Object, owner: &'static str, key: &'static str) -> Result<Option<T>, DecodeError> {
        optional(object, owner, key)
    }

    /// Required list field; each element goes through `T`'s codec.
    pub fn list<T: Codec>(object: &Object, owner: &'static str, key: &'static str) -> Result<Vec<T>, DecodeError> {
        required(object, owner, key)
    }

    /// Optional list field.
    pub fn list_opt<T: Codec>(object: &Object, owner: &'static str, key: &'static str) -> Result<Option<Vec<T>>, DecodeError> {
        optional(object, owner, key)
    }

    /// Writes a field.
    pub fn put<T: Codec>(object: &mut Object, key: &str, value: &T) {
        object.insert(key.to_string(), value.encode());
    }

    /// Writes a field only when present.
    pub fn put_opt<T: Codec>(object: &mut Object, key: &str, value: &Option<T>) {
        if let Some(value) = value {
            put(object, key, value);
        }
    }
}
