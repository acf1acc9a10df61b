//! Drives a handler written the way apiforge-gen emits them through a real
//! axum router.

use std::collections::HashMap;
use std::sync::Arc;

use apiforge_runtime::axum::body::{Body, to_bytes};
use apiforge_runtime::axum::extract::{Path, Query, State};
use apiforge_runtime::axum::http::{HeaderMap, Request, StatusCode};
use apiforge_runtime::axum::response::{IntoResponse, Response};
use apiforge_runtime::axum::routing::{delete, get, post};
use apiforge_runtime::axum::{Json, Router};
use apiforge_runtime::bytes::Bytes;
use apiforge_runtime::codec::field;
use apiforge_runtime::serde_json::{self, Map, Value, json};
use apiforge_runtime::server::{ApiError, Authenticator, BearerTokens, check_parameter, params};
use apiforge_runtime::{Codec, DecodeError, ValidationError, rules};
use tower::ServiceExt;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct User {
    pub id: i64,
    pub name: Option<String>,
}

impl User {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(value) = &self.name {
            ValidationError::check(rules::non_empty(value), "name", "not empty")?;
        }
        Ok(())
    }
}

impl Codec for User {
    fn decode(value: &Value) -> Result<Self, DecodeError> {
        let object = field::expect_object(value, "User")?;
        let decoded = Self {
            id: field::integer(object, "User", "id")?,
            name: field::string_opt(object, "User", "name")?,
        };
        decoded.validate()?;
        Ok(decoded)
    }

    fn encode(&self) -> Value {
        let mut object = Map::new();
        field::put(&mut object, "id", &self.id);
        field::put_opt(&mut object, "name", &self.name);
        Value::Object(object)
    }
}

pub struct UsersServer<A: Authenticator> {
    pub authenticator: A,
}

impl<A: Authenticator> UsersServer<A> {
    pub fn register_users(router: Router<Arc<Self>>) -> Router<Arc<Self>> {
        router
            .route("/users", get(list_users_handler::<A>))
            .route("/users", post(create_user_handler::<A>))
            .route("/users/:id", delete(delete_user_handler::<A>))
    }
}

async fn list_users_handler<A: Authenticator>(
    State(_server): State<Arc<UsersServer<A>>>,
    Query(query_params): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    let limit: Option<i64> = params::query(&query_params, "limit")?;
    if let Some(value) = &limit {
        check_parameter(rules::in_range(value, Some(1f64), Some(100f64)), "limit", "between 1 and 100")?;
    }
    let limit = limit.unwrap_or_else(|| 20i64);
    let response: Vec<User> = (1..=limit.min(3)).map(|id| User { id, name: None }).collect();
    Ok(Json(response.encode()).into_response())
}

async fn create_user_handler<A: Authenticator>(
    State(server): State<Arc<UsersServer<A>>>,
    headers: HeaderMap,
    body_bytes: Bytes,
) -> Result<Response, ApiError> {
    server.authenticator.authenticate(&["bearer"], &headers)?;
    let body: User = params::request_body(&body_bytes)?;
    Ok(Json(body.encode()).into_response())
}

async fn delete_user_handler<A: Authenticator>(
    State(_server): State<Arc<UsersServer<A>>>,
    Path(path_params): Path<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    let _id: i64 = params::required(params::path(&path_params, "id")?, "id", "path")?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

fn application<A: Authenticator>(server: UsersServer<A>) -> Router {
    let router: Router<Arc<UsersServer<A>>> = Router::new();
    let router = UsersServer::<A>::register_users(router);
    router.with_state(Arc::new(server))
}

fn app() -> Router {
    application(UsersServer {
        authenticator: BearerTokens::new(["secret"]),
    })
}

async fn send(request: Request<Body>) -> (StatusCode, Value) {
    let response = app().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_user(token: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/users")
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

#[tokio::test]
async fn optional_query_falls_back_to_default() {
    let (status, body) = send(get_request("/users")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([{ "id": 1 }, { "id": 2 }, { "id": 3 }]));
}

#[tokio::test]
async fn query_rule_violation_is_400_naming_parameter() {
    let (status, body) = send(get_request("/users?limit=500")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("`limit`"));
}

#[tokio::test]
async fn unparsable_query_is_400() {
    let (status, body) = send(get_request("/users?limit=many")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("limit"));
}

#[tokio::test]
async fn missing_token_is_401_before_body_decoding() {
    let (status, body) = send(post_user(None, "not json")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].as_str().unwrap().contains("bearer"));
}

#[tokio::test]
async fn authenticated_body_round_trips() {
    let (status, body) = send(post_user(Some("secret"), r#"{"id":7,"name":"Ada","extra":true}"#)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "id": 7, "name": "Ada" }));
}

#[tokio::test]
async fn decoded_body_is_validated() {
    let (status, body) = send(post_user(Some("secret"), r#"{"id":7,"name":""}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("`name`"));
}

#[tokio::test]
async fn missing_required_field_is_400() {
    let (status, _) = send(post_user(Some("secret"), r#"{"name":"Ada"}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn void_operation_returns_no_content() {
    let request = Request::builder()
        .method("DELETE")
        .uri("/users/3")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(request).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);
}

#[tokio::test]
async fn bad_path_parameter_is_400() {
    let request = Request::builder()
        .method("DELETE")
        .uri("/users/abc")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
