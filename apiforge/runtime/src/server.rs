//! Server-side support for generated axum handlers.
//!
//! Generated handlers gate on an [`Authenticator`], bind parameters through
//! the [`params`] helpers and check rules with [`check_parameter`]. Every
//! failure is an [`ApiError`], which renders as a `400`/`401` JSON response.

use std::collections::HashSet;

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;

pub use crate::error::ApiError;
use crate::error::ValidationError;

/// Decides whether a request satisfies an operation's security requirements.
///
/// `schemes` lists the requirement names declared on the operation; the
/// request passes if any one of them is satisfied.
pub trait Authenticator: Send + Sync + 'static {
    /// Returns `Ok(())` when the request is authenticated.
    fn authenticate(&self, schemes: &[&str], headers: &HeaderMap) -> Result<(), ApiError>;
}

/// Accepts every request.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl Authenticator for AllowAll {
    fn authenticate(&self, _schemes: &[&str], _headers: &HeaderMap) -> Result<(), ApiError> {
        Ok(())
    }
}

/// Accepts requests carrying `Authorization: Bearer <token>` with a known token.
///
/// ## Examples
///
/// ```
/// use apiforge_runtime::server::{Authenticator, BearerTokens};
/// use axum::http::HeaderMap;
///
/// let auth = BearerTokens::new(["secret"]);
/// let mut headers = HeaderMap::new();
/// assert!(auth.authenticate(&["bearer"], &headers).is_err());
///
/// headers.insert("authorization", "Bearer secret".parse().unwrap());
/// assert!(auth.authenticate(&["bearer"], &headers).is_ok());
/// ```
#[derive(Debug, Clone, Default)]
pub struct BearerTokens {
    tokens: HashSet<String>,
}

impl BearerTokens {
    /// Creates an authenticator accepting the given tokens.
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tokens: tokens.into_iter().map(Into::into).collect(),
        }
    }
}

impl Authenticator for BearerTokens {
    fn authenticate(&self, schemes: &[&str], headers: &HeaderMap) -> Result<(), ApiError> {
        let token = headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));

        match token {
            Some(token) if self.tokens.contains(token) => Ok(()),
            _ => {
                tracing::debug!(?schemes, "bearer authentication failed");
                Err(ApiError::Unauthorized {
                    schemes: schemes.join(", "),
                })
            }
        }
    }
}

/// Fails with a `400` naming the parameter when `holds` is false.
pub fn check_parameter(holds: bool, name: &str, rule: &str) -> Result<(), ApiError> {
    ValidationError::check(holds, name, rule).map_err(ApiError::from)
}

/// Location-specific parameter binding.
///
/// Path, query, header and form values arrive as text and are parsed with
/// [`FromParam`](params::FromParam); structured values in those locations are
/// JSON text decoded with their codec (the `_object` variants). Body
/// parameters are keys of the JSON request object.
///
/// Every lookup returns `Ok(None)` when the parameter is absent; callers pick
/// [`required`](params::required) or a default.
pub mod params {
    use std::collections::HashMap;

    use axum::http::HeaderMap;
    use bytes::Bytes;
    use serde_json::{Map, Value};

    use super::ApiError;
    use crate::codec::Codec;
    use crate::error::{DecodeError, json_kind};

    /// Text-to-value parsing for non-body parameters.
    pub trait FromParam: Sized {
        /// Parses the raw text.
        fn from_param(raw: &str) -> Result<Self, String>;
    }

    impl FromParam for bool {
        fn from_param(raw: &str) -> Result<Self, String> {
            raw.parse().map_err(|_| format!("expected true or false, got {raw:?}"))
        }
    }

    impl FromParam for i64 {
        fn from_param(raw: &str) -> Result<Self, String> {
            raw.parse().map_err(|_| format!("expected an integer, got {raw:?}"))
        }
    }

    impl FromParam for f64 {
        fn from_param(raw: &str) -> Result<Self, String> {
            raw.parse().map_err(|_| format!("expected a number, got {raw:?}"))
        }
    }

    impl FromParam for String {
        fn from_param(raw: &str) -> Result<Self, String> {
            Ok(raw.to_string())
        }
    }

    impl FromParam for () {
        fn from_param(_raw: &str) -> Result<Self, String> {
            Ok(())
        }
    }

    /// Comma-separated lists; the empty string is the empty list.
    impl<T: FromParam> FromParam for Vec<T> {
        fn from_param(raw: &str) -> Result<Self, String> {
            if raw.is_empty() {
                return Ok(Vec::new());
            }
            raw.split(',').map(T::from_param).collect()
        }
    }

    fn parse<T: FromParam>(
        raw: Option<&str>,
        name: &'static str,
        location: &'static str,
    ) -> Result<Option<T>, ApiError> {
        raw.map(|raw| {
            T::from_param(raw).map_err(|reason| ApiError::InvalidParameter {
                name,
                location,
                reason,
            })
        })
        .transpose()
    }

    fn parse_object<T: Codec>(
        raw: Option<&str>,
        name: &'static str,
        location: &'static str,
    ) -> Result<Option<T>, ApiError> {
        raw.map(|raw| {
            serde_json::from_str::<Value>(raw)
                .map_err(DecodeError::from)
                .and_then(|value| T::decode(&value))
                .map_err(|e| {
                    if !matches!(e.root(), DecodeError::Invalid(_)) {
                        return ApiError::InvalidParameter {
                            name,
                            location,
                            reason: e.to_string(),
                        };
                    }
                    ApiError::from(e.in_field(location, name))
                })
        })
        .transpose()
    }

    /// Path placeholder value.
    pub fn path<T: FromParam>(
        params: &HashMap<String, String>,
        name: &'static str,
    ) -> Result<Option<T>, ApiError> {
        parse(params.get(name).map(String::as_str), name, "path")
    }

    /// Structured path placeholder value.
    pub fn path_object<T: Codec>(
        params: &HashMap<String, String>,
        name: &'static str,
    ) -> Result<Option<T>, ApiError> {
        parse_object(params.get(name).map(String::as_str), name, "path")
    }

    /// Query string value.
    pub fn query<T: FromParam>(
        params: &HashMap<String, String>,
        name: &'static str,
    ) -> Result<Option<T>, ApiError> {
        parse(params.get(name).map(String::as_str), name, "query")
    }

    /// Structured query string value.
    pub fn query_object<T: Codec>(
        params: &HashMap<String, String>,
        name: &'static str,
    ) -> Result<Option<T>, ApiError> {
        parse_object(params.get(name).map(String::as_str), name, "query")
    }

    fn header_text<'a>(
        headers: &'a HeaderMap,
        name: &'static str,
    ) -> Result<Option<&'a str>, ApiError> {
        headers
            .get(name)
            .map(|v| {
                v.to_str().map_err(|e| ApiError::InvalidParameter {
                    name,
                    location: "header",
                    reason: e.to_string(),
                })
            })
            .transpose()
    }

    /// Header value.
    pub fn header<T: FromParam>(
        headers: &HeaderMap,
        name: &'static str,
    ) -> Result<Option<T>, ApiError> {
        parse(header_text(headers, name)?, name, "header")
    }

    /// Structured header value.
    pub fn header_object<T: Codec>(
        headers: &HeaderMap,
        name: &'static str,
    ) -> Result<Option<T>, ApiError> {
        parse_object(header_text(headers, name)?, name, "header")
    }

    /// Parses a url-encoded request body into its fields.
    pub fn form_fields(body: &Bytes) -> HashMap<String, String> {
        url::form_urlencoded::parse(body)
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    /// Form field value.
    pub fn form<T: FromParam>(
        fields: &HashMap<String, String>,
        name: &'static str,
    ) -> Result<Option<T>, ApiError> {
        parse(fields.get(name).map(String::as_str), name, "form")
    }

    /// Structured form field value.
    pub fn form_object<T: Codec>(
        fields: &HashMap<String, String>,
        name: &'static str,
    ) -> Result<Option<T>, ApiError> {
        parse_object(fields.get(name).map(String::as_str), name, "form")
    }

    /// Parses the JSON request body as an object. An empty body is an empty object.
    pub fn body_object(body: &Bytes) -> Result<Map<String, Value>, ApiError> {
        if body.is_empty() {
            return Ok(Map::new());
        }
        let value: Value = serde_json::from_slice(body).map_err(DecodeError::from)?;
        match value {
            Value::Object(map) => Ok(map),
            other => Err(DecodeError::ExpectedObject {
                owner: "request body",
                found: json_kind(&other),
            }
            .into()),
        }
    }

    /// Key of the JSON request object, decoded with its codec.
    pub fn body<T: Codec>(
        object: &Map<String, Value>,
        name: &'static str,
    ) -> Result<Option<T>, ApiError> {
        match object.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => T::decode(value)
                .map(Some)
                .map_err(|e| ApiError::from(e.in_field("request body", name))),
        }
    }

    /// Decodes the whole request body with `T`'s codec.
    pub fn request_body<T: Codec>(body: &Bytes) -> Result<T, ApiError> {
        if body.is_empty() {
            return Err(ApiError::MissingParameter {
                name: "body",
                location: "body",
            });
        }
        let value: Value = serde_json::from_slice(body).map_err(DecodeError::from)?;
        Ok(T::decode(&value)?)
    }

    /// Unwraps a required parameter.
    pub fn required<T>(
        value: Option<T>,
        name: &'static str,
        location: &'static str,
    ) -> Result<T, ApiError> {
        value.ok_or(ApiError::MissingParameter { name, location })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use bytes::Bytes;
    use serde_json::{Map, Value};

    use super::params::{self, FromParam};
    use super::*;
    use crate::codec::{Codec, field};
    use crate::error::DecodeError;

    fn map(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn allow_all_accepts_anything() {
        assert!(AllowAll.authenticate(&["bearer"], &HeaderMap::new()).is_ok());
    }

    #[test]
    fn bearer_rejects_unknown_token() {
        let auth = BearerTokens::new(["good"]);
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, "Bearer bad".parse().unwrap());
        let err = auth.authenticate(&["bearer", "api_key"], &headers).unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized { schemes } if schemes == "bearer, api_key"));
    }

    #[test]
    fn list_params_split_on_commas() {
        assert_eq!(Vec::<i64>::from_param("1,2,3").unwrap(), vec![1, 2, 3]);
        assert!(Vec::<i64>::from_param("").unwrap().is_empty());
        assert!(Vec::<i64>::from_param("1,x").is_err());
    }

    #[test]
    fn path_param_parses_and_reports_invalid() {
        let params = map(&[("id", "42"), ("bad", "forty")]);
        assert_eq!(params::path::<i64>(&params, "id").unwrap(), Some(42));
        assert_eq!(params::path::<i64>(&params, "missing").unwrap(), None);
        let err = params::path::<i64>(&params, "bad").unwrap_err();
        assert!(matches!(
            err,
            ApiError::InvalidParameter {
                name: "bad",
                location: "path",
                ..
            }
        ));
    }

    #[test]
    fn query_object_decodes_json_text() {
        let params = map(&[("ids", "[1,2]")]);
        let ids: Option<Vec<i64>> = params::query_object(&params, "ids").unwrap();
        assert_eq!(ids, Some(vec![1, 2]));
    }

    #[test]
    fn header_param_reads_value() {
        let mut headers = HeaderMap::new();
        headers.insert("x-request-id", "7".parse().unwrap());
        let id: Option<i64> = params::header(&headers, "x-request-id").unwrap();
        assert_eq!(id, Some(7));
    }

    #[test]
    fn form_fields_are_url_decoded() {
        let fields = params::form_fields(&Bytes::from_static(b"name=Rex+the+dog&age=3"));
        assert_eq!(params::form::<String>(&fields, "name").unwrap().as_deref(), Some("Rex the dog"));
        assert_eq!(params::form::<i64>(&fields, "age").unwrap(), Some(3));
    }

    #[test]
    fn body_object_accepts_empty_and_rejects_arrays() {
        assert!(params::body_object(&Bytes::new()).unwrap().is_empty());
        let err = params::body_object(&Bytes::from_static(b"[1]")).unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[test]
    fn body_param_reads_key() {
        let object = params::body_object(&Bytes::from_static(br#"{"count": 3}"#)).unwrap();
        assert_eq!(params::body::<i64>(&object, "count").unwrap(), Some(3));
        assert_eq!(params::body::<i64>(&object, "other").unwrap(), None);
    }

    #[derive(Debug, PartialEq)]
    struct Inner {
        name: String,
    }

    impl Codec for Inner {
        fn decode(value: &Value) -> Result<Self, DecodeError> {
            let object = field::expect_object(value, "Inner")?;
            let decoded = Self {
                name: field::string(object, "Inner", "name")?,
            };
            ValidationError::check(!decoded.name.is_empty(), "name", "not empty")?;
            Ok(decoded)
        }

        fn encode(&self) -> Value {
            let mut object = Map::new();
            field::put(&mut object, "name", &self.name);
            Value::Object(object)
        }
    }

    #[derive(Debug)]
    struct Outer {
        inner: Inner,
    }

    impl Codec for Outer {
        fn decode(value: &Value) -> Result<Self, DecodeError> {
            let object = field::expect_object(value, "Outer")?;
            Ok(Self {
                inner: field::object(object, "Outer", "inner")?,
            })
        }

        fn encode(&self) -> Value {
            let mut object = Map::new();
            field::put(&mut object, "inner", &self.inner);
            Value::Object(object)
        }
    }

    #[test]
    fn nested_rule_violation_in_request_body_is_validation() {
        let body = Bytes::from_static(br#"{"inner": {"name": ""}}"#);
        let err = params::request_body::<Outer>(&body).unwrap_err();
        assert!(matches!(err, ApiError::Validation(ref v) if v.field == "inner.name"));
    }

    #[test]
    fn rule_violation_in_body_param_is_validation() {
        let object = params::body_object(&Bytes::from_static(br#"{"pet": {"name": ""}}"#)).unwrap();
        let err = params::body::<Inner>(&object, "pet").unwrap_err();
        assert!(matches!(err, ApiError::Validation(ref v) if v.field == "pet.name"));

        let ok = params::body::<Inner>(&object, "missing").unwrap();
        assert_eq!(ok, None);
    }

    #[test]
    fn rule_violation_in_structured_query_is_validation() {
        let params = map(&[("filter", r#"{"name":""}"#), ("broken", "{")]);
        let err = params::query_object::<Inner>(&params, "filter").unwrap_err();
        assert!(matches!(err, ApiError::Validation(ref v) if v.field == "filter.name"));
        let err = params::query_object::<Inner>(&params, "broken").unwrap_err();
        assert!(matches!(err, ApiError::InvalidParameter { name: "broken", .. }));
    }

    #[test]
    fn request_body_requires_content() {
        let err = params::request_body::<i64>(&Bytes::new()).unwrap_err();
        assert!(matches!(err, ApiError::MissingParameter { name: "body", .. }));
        assert_eq!(params::request_body::<i64>(&Bytes::from_static(b"5")).unwrap(), 5);
    }

    #[test]
    fn required_reports_location() {
        let err = params::required::<i64>(None, "limit", "query").unwrap_err();
        assert_eq!(err.to_string(), "missing required query parameter `limit`");
    }

    #[test]
    fn check_parameter_names_parameter() {
        assert!(check_parameter(true, "limit", "at most 10").is_ok());
        let err = check_parameter(false, "limit", "at most 10").unwrap_err();
        assert!(matches!(err, ApiError::Validation(v) if v.field == "limit"));
    }
}
