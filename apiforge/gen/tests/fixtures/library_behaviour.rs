//! Exercises the code generated from `library.json`.
//!
//! Copied into the scratch crate's `tests/` directory and run with
//! `cargo test` there.

use apiforge_runtime::axum::Router;
use apiforge_runtime::axum::body::{Body, to_bytes};
use apiforge_runtime::axum::http::{Request, StatusCode};
use apiforge_runtime::serde_json::{Value, json};
use apiforge_runtime::server::BearerTokens;
use apiforge_runtime::{Codec, DecodeError};
use library_generated::application::application;
use library_generated::dto::{Author, Book, LoginReply};
use library_generated::server::LibraryServer;
use tower::ServiceExt;

fn router() -> Router {
    application(LibraryServer::new(BearerTokens::new(["secret"])))
}

async fn send(request: Request<Body>) -> (StatusCode, Value) {
    let response = router().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        apiforge_runtime::serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

#[test]
fn author_round_trips_through_its_codec() {
    let value = json!({ "id": 1, "name": "Ursula" });
    let author = Author::decode(&value).unwrap();
    assert_eq!(author.id, 1);
    assert_eq!(author.name, "Ursula");
    assert_eq!(author.born, None);
    assert_eq!(author.encode(), value);
}

#[test]
fn missing_required_field_is_reported() {
    let err = Author::decode(&json!({ "name": "Ursula" })).unwrap_err();
    assert!(matches!(err.root(), DecodeError::MissingField { .. }), "{err:?}");
}

#[test]
fn field_rule_is_checked_on_decode() {
    let err = Author::decode(&json!({ "id": 1, "name": "" })).unwrap_err();
    assert!(matches!(err.root(), DecodeError::Invalid(_)), "{err:?}");
}

#[test]
fn list_of_references_keeps_every_element() {
    let value = json!({
        "isbn": "978-0-441-47812-5",
        "title": "The Left Hand of Darkness",
        "authors": [{ "id": 1, "name": "Ursula" }, { "id": 2, "name": "Guest" }],
        "tags": ["classic"]
    });
    let book = Book::decode(&value).unwrap();
    assert_eq!(book.authors.len(), 2);
    assert_eq!(book.authors[1].name, "Guest");
    assert_eq!(book.tags, Some(vec!["classic".to_string()]));
    assert_eq!(Book::decode(&book.encode()).unwrap(), book);
}

#[test]
fn synthetic_definitions_still_decode() {
    let reply = LoginReply::decode(&json!({ "token": "t" })).unwrap();
    assert_eq!(reply.token, "t");
}

#[tokio::test]
async fn router_builds_with_every_operation_mounted() {
    let (status, body) = send(get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!(""));
}

#[tokio::test]
async fn single_path_placeholder_is_extracted() {
    let (status, body) = send(get("/books/978-0-441-47812-5")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["authors"], json!([]));
}

#[tokio::test]
async fn query_rule_violation_is_a_bad_request() {
    let (status, _) = send(get("/books?limit=500")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(get("/books?limit=5")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn secured_operation_requires_a_token() {
    let request = Request::delete("/books/1234567890").body(Body::empty()).unwrap();
    let (status, _) = send(request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let request = Request::delete("/books/1234567890")
        .header("authorization", "Bearer secret")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(request).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn invalid_request_body_is_rejected() {
    let request = Request::post("/books")
        .header("authorization", "Bearer secret")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"isbn":"nope","title":"T","authors":[]}"#))
        .unwrap();
    let (status, _) = send(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
