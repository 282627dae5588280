//! Router behaviour that never reaches the database: probes, settings, request validation.

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use game_rules_api::{app, connect_lazy, AppState, Settings};
use serde_json::{json, Value};
use std::collections::HashMap;
use tower::ServiceExt;

fn settings() -> Settings {
    let vars: HashMap<String, String> = [
        ("APP_NAME", "Catalog Test"),
        ("POSTGRES_USER", "games"),
        ("POSTGRES_PASSWORD", "hunter2"),
        ("POSTGRES_HOST", "127.0.0.1"),
        ("POSTGRES_PORT", "1"),
        ("POSTGRES_DB", "catalog"),
        ("DB_ACQUIRE_TIMEOUT_SECS", "1"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    Settings::from_vars(vars).unwrap()
}

fn test_app() -> Router {
    let settings = settings();
    let pool = connect_lazy(&settings);
    app(AppState::new(pool, settings))
}

async fn send(req: Request<Body>) -> (StatusCode, Value) {
    let resp = test_app().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn health_probes_always_report_ok() {
    for uri in ["/health", "/health/ready", "/health/live"] {
        let (status, body) = send(get(uri)).await;
        assert_eq!(status, StatusCode::OK, "{}", uri);
        assert_eq!(body, json!({ "status": "ok", "message": "Service is healthy" }));
    }
}

#[tokio::test]
async fn info_dumps_settings_without_password() {
    let (status, body) = send(get("/info")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["app_name"], "Catalog Test");
    assert_eq!(body["postgres_db"], "catalog");
    assert_eq!(body["debug"], false);
    assert!(body.get("postgres_password").is_none());
    assert!(!body.to_string().contains("hunter2"));
}

#[tokio::test]
async fn inverted_player_range_is_rejected_before_the_database() {
    let (status, body) = send(post_json(
        "/games",
        json!({ "name": "Chess", "min_players": 4, "max_players": 2 }),
    ))
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "validation_error");
    assert_eq!(body["error"]["details"]["field"], "max_players");
}

#[tokio::test]
async fn complexity_out_of_range_is_rejected() {
    let (status, body) = send(post_json(
        "/games/",
        json!({ "name": "Twilight Struggle", "min_players": 2, "max_players": 2, "complexity_rating": 5.5 }),
    ))
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["details"]["field"], "complexity_rating");
}

#[tokio::test]
async fn negative_rulebook_size_is_rejected() {
    let (status, body) = send(post_json(
        "/rulebooks",
        json!({
            "game_id": 1,
            "document_type": "rules",
            "minio_bucket": "b",
            "minio_object_path": "p",
            "file_name": "chess.pdf",
            "file_size_bytes": -10
        }),
    ))
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["details"]["field"], "file_size_bytes");
}

#[tokio::test]
async fn missing_required_field_is_unprocessable() {
    let (status, body) = send(post_json("/games", json!({ "min_players": 1, "max_players": 2 }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "validation_error");
    assert_eq!(body["error"]["details"]["field"], "name");
}

#[tokio::test]
async fn wrong_field_type_is_unprocessable_with_field() {
    let (status, body) = send(post_json(
        "/games",
        json!({ "name": "Go", "min_players": "two", "max_players": 2 }),
    ))
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["code"], "validation_error");
    assert_eq!(body["error"]["details"]["field"], "min_players");
}

#[tokio::test]
async fn malformed_json_uses_error_envelope() {
    let req = Request::builder()
        .method(Method::POST)
        .uri("/rulebooks")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"game_id\": 1,"))
        .unwrap();
    let (status, body) = send(req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "bad_request");
}

#[tokio::test]
async fn non_numeric_id_is_bad_request() {
    let (status, body) = send(get("/games/chess")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "bad_request");
    assert!(body["error"]["message"].as_str().unwrap().contains("chess"));

    let (status, body) = send(Request::builder().method(Method::DELETE).uri("/rulebooks/abc").body(Body::empty()).unwrap()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "bad_request");
}

#[tokio::test]
async fn bad_paging_and_filters_are_bad_request() {
    let (status, body) = send(get("/games?limit=-3")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "bad_request");

    let (status, _) = send(get("/games/count?min_age=ten")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let big = "x".repeat(game_rules_api::routes::BODY_LIMIT_BYTES + 1);
    let req = Request::builder()
        .method(Method::POST)
        .uri("/games")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::CONTENT_LENGTH, big.len())
        .body(Body::from(big))
        .unwrap();
    let (status, _) = send(req).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}
