use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use chrono::Local;
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::api::{build_router, AppState};
use crate::db::{create_test_pool, migrations};

use super::{RpcError, RpcResponse};

async fn app() -> Router {
    let pool = create_test_pool().await.expect("Failed to create test pool");
    migrations::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");
    build_router(AppState::new(pool, 7), "http://localhost:3000").expect("Failed to build router")
}

async fn post_raw(app: &Router, body: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/rpc")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn call(app: &Router, method: &str, params: Value, session: Option<&str>) -> Value {
    let body = json!({
        "jsonrpc": "2.0",
        "method": method,
        "params": params,
        "id": 1,
        "session": session,
    });
    let (status, value) = post_raw(app, &body.to_string()).await;
    assert_eq!(status, StatusCode::OK);
    value
}

fn error_code(response: &Value) -> i64 {
    response["error"]["code"]
        .as_i64()
        .unwrap_or_else(|| panic!("expected an error, got {}", response))
}

async fn signup(app: &Router, email: &str) -> String {
    let created = call(app, "create_account", json!([email, "pw"]), None).await;
    assert_eq!(created["result"], json!(true));
    let login = call(app, "login", json!([email, "pw"]), None).await;
    login["result"].as_str().expect("login returns a key").to_string()
}

/// A team with one coach and one athlete
async fn team(app: &Router) -> (String, String) {
    let coach = signup(app, "coach@x.com").await;
    let athlete = signup(app, "athlete@x.com").await;
    call(app, "create_team", json!(["Rowers"]), Some(&coach)).await;
    let added = call(app, "add_to_team", json!(["athlete@x.com"]), Some(&coach)).await;
    assert_eq!(added["result"], json!(true));
    (coach, athlete)
}

fn today() -> String {
    Local::now().date_naive().format("%Y-%m-%d").to_string()
}

#[tokio::test]
async fn test_echo() {
    let app = app().await;
    let response = call(&app, "echo", json!([{"a": [1, 2]}]), None).await;
    assert_eq!(response["result"], json!({"a": [1, 2]}));
    assert_eq!(response["jsonrpc"], "2.0");
    assert_eq!(response["id"], 1);
}

#[tokio::test]
async fn test_create_account_errors() {
    let app = app().await;
    signup(&app, "a@x.com").await;

    let duplicate = call(&app, "create_account", json!(["a@x.com", "other"]), None).await;
    assert_eq!(error_code(&duplicate), 1);

    let bad_email = call(&app, "create_account", json!(["not-an-email", "pw"]), None).await;
    assert_eq!(error_code(&bad_email), 10);

    let empty = call(&app, "create_account", json!(["b@x.com", ""]), None).await;
    assert_eq!(error_code(&empty), 4);

    let missing = call(&app, "create_account", json!(["b@x.com"]), None).await;
    assert_eq!(error_code(&missing), 11);
}

#[tokio::test]
async fn test_login_key_shape_and_bad_password() {
    let app = app().await;
    let key = signup(&app, "a@x.com").await;
    assert_eq!(key.len(), 32);
    assert!(key.chars().all(|c| c.is_ascii_alphanumeric()));

    let bad = call(&app, "login", json!(["a@x.com", "wrong"]), None).await;
    assert_eq!(error_code(&bad), 2);

    let unknown = call(&app, "login", json!(["nobody@x.com", "pw"]), None).await;
    assert_eq!(error_code(&unknown), 2);
}

#[tokio::test]
async fn test_logout_invalidates_key() {
    let app = app().await;
    let key = signup(&app, "a@x.com").await;

    let status = call(&app, "user_status", json!([]), Some(&key)).await;
    assert_eq!(status["result"], json!([true, false, false]));

    let out = call(&app, "logout", json!([]), Some(&key)).await;
    assert_eq!(out["result"], json!(true));

    let status = call(&app, "user_status", json!([]), Some(&key)).await;
    assert_eq!(status["result"], json!([false, false, false]));

    let again = call(&app, "logout", json!([]), Some(&key)).await;
    assert_eq!(error_code(&again), 3);
}

#[tokio::test]
async fn test_user_id_must_match_key() {
    let app = app().await;
    let key = signup(&app, "a@x.com").await;
    signup(&app, "b@x.com").await;

    let body = json!({
        "jsonrpc": "2.0", "method": "logged_in", "id": 1, "session": key, "user_id": 2
    });
    let (_, response) = post_raw(&app, &body.to_string()).await;
    assert_eq!(response["result"], json!([false, false]));

    let body = json!({
        "jsonrpc": "2.0", "method": "logged_in", "id": 1, "session": key, "user_id": 1
    });
    let (_, response) = post_raw(&app, &body.to_string()).await;
    assert_eq!(response["result"], json!([true, false]));
}

#[tokio::test]
async fn test_create_team() {
    let app = app().await;

    let anonymous = call(&app, "create_team", json!(["Rowers"]), None).await;
    assert_eq!(error_code(&anonymous), 3);

    let key = signup(&app, "a@x.com").await;
    let created = call(&app, "create_team", json!(["Rowers"]), Some(&key)).await;
    assert!(created["result"].is_i64());

    let status = call(&app, "user_status", json!([]), Some(&key)).await;
    assert_eq!(status["result"], json!([true, true, true]));

    let info = call(&app, "my_team_info", json!([]), Some(&key)).await;
    assert_eq!(info["result"], json!([created["result"], "Rowers", ["a@x.com", true]]));
}

#[tokio::test]
async fn test_team_membership_rules() {
    let app = app().await;
    let (coach, athlete) = team(&app).await;

    let not_coach = call(&app, "add_to_team", json!(["coach@x.com"]), Some(&athlete)).await;
    assert_eq!(error_code(&not_coach), 5);

    let unknown = call(&app, "add_to_team", json!(["ghost@x.com"]), Some(&coach)).await;
    assert_eq!(error_code(&unknown), 7);

    let last_coach = call(&app, "set_coach_status", json!(["coach@x.com", false]), Some(&coach)).await;
    assert_eq!(error_code(&last_coach), 9);

    let promoted = call(&app, "set_coach_status", json!(["athlete@x.com", true]), Some(&coach)).await;
    assert_eq!(promoted["result"], json!(true));
    let demoted = call(&app, "set_coach_status", json!(["coach@x.com", false]), Some(&coach)).await;
    assert_eq!(demoted["result"], json!(true));

    let left = call(&app, "remove_from_team", json!(["coach@x.com"]), Some(&coach)).await;
    assert_eq!(left["result"], json!(true));
    let info = call(&app, "my_team_info", json!([]), Some(&coach)).await;
    assert_eq!(error_code(&info), 6);
}

#[tokio::test]
async fn test_health_data_upsert_and_team_view() {
    let app = app().await;
    let (coach, athlete) = team(&app).await;
    let date = today();

    call(&app, "add_health_data", json!([date, 60, 80, "tired"]), Some(&athlete)).await;
    let second = call(&app, "add_health_data", json!([date, 55, 79, ""]), Some(&athlete)).await;
    assert_eq!(second["result"], json!(true));

    let mine = call(&app, "get_my_health_data", json!([7]), Some(&athlete)).await;
    assert_eq!(mine["result"], json!([[date, 55, 79, ""]]));

    let team_view = call(&app, "get_team_health_data", json!([7]), Some(&coach)).await;
    assert_eq!(team_view["result"], json!([["athlete@x.com", [[date, 55, 79, ""]]]]));

    let as_athlete = call(&app, "get_team_health_data", json!([7]), Some(&athlete)).await;
    assert_eq!(error_code(&as_athlete), 5);
}

#[tokio::test]
async fn test_coach_cannot_log_data() {
    let app = app().await;
    let (coach, _) = team(&app).await;

    let health = call(&app, "add_health_data", json!([today(), 60, 80, ""]), Some(&coach)).await;
    assert_eq!(error_code(&health), 8);

    let training = call(
        &app,
        "add_training",
        json!([format!("{}T08:00:00", today()), true, "", [[60, 200, null, 30]]]),
        Some(&coach),
    )
    .await;
    assert_eq!(error_code(&training), 8);
}

#[tokio::test]
async fn test_training_roundtrip() {
    let app = app().await;
    let (coach, athlete) = team(&app).await;
    let time = format!("{}T08:00:00", today());

    let added = call(
        &app,
        "add_training",
        json!([time, true, "steady", [[600, 180, 125, 60], {"duration": 300, "power": 250, "rest": 0}]]),
        Some(&athlete),
    )
    .await;
    assert_eq!(added["result"], json!(true));

    let expected = json!([[time, true, "steady", [[600, 180, 125, 60], [300, 250, null, 0]]]]);
    let mine = call(&app, "get_my_training_data", json!([1]), Some(&athlete)).await;
    assert_eq!(mine["result"], expected);

    let team_view = call(&app, "get_team_training_data", json!([1]), Some(&coach)).await;
    assert_eq!(team_view["result"], json!([["athlete@x.com", expected]]));

    let empty = call(&app, "add_training", json!([time, true, "", []]), Some(&athlete)).await;
    assert_eq!(error_code(&empty), -32602);

    let no_power = call(&app, "add_training", json!([time, true, "", [[60, null, null, 0]]]), Some(&athlete)).await;
    assert_eq!(error_code(&no_power), 11);
}

#[tokio::test]
async fn test_named_params() {
    let app = app().await;
    let created = call(
        &app,
        "create_account",
        json!({"email": "a@x.com", "password": "pw"}),
        None,
    )
    .await;
    assert_eq!(created["result"], json!(true));

    let bad_type = call(&app, "get_my_health_data", json!({"days_in_the_past": "many"}), None).await;
    assert_eq!(error_code(&bad_type), -32602);
}

#[tokio::test]
async fn test_protocol_errors() {
    let app = app().await;

    let (status, parse) = post_raw(&app, "{not json").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse["error"]["code"], -32700);
    assert_eq!(parse["id"], Value::Null);

    let (_, empty) = post_raw(&app, "[]").await;
    assert_eq!(empty["error"]["code"], -32600);

    let (_, invalid) = post_raw(&app, r#"{"jsonrpc":"2.0","id":1}"#).await;
    assert_eq!(invalid["error"]["code"], -32600);

    let unknown = call(&app, "fly", json!([]), None).await;
    assert_eq!(error_code(&unknown), -32601);
}

#[tokio::test]
async fn test_notifications_and_batches() {
    let app = app().await;

    let (status, body) = post_raw(&app, r#"{"jsonrpc":"2.0","method":"echo","params":[1]}"#).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let batch = json!([
        {"jsonrpc": "2.0", "method": "echo", "params": ["a"], "id": "first"},
        {"jsonrpc": "2.0", "method": "echo", "params": ["skipped"]},
        42,
        {"jsonrpc": "2.0", "method": "echo", "params": ["b"], "id": 3},
    ]);
    let (status, body) = post_raw(&app, &batch.to_string()).await;
    assert_eq!(status, StatusCode::OK);
    let replies = body.as_array().expect("batch reply is an array");
    assert_eq!(replies.len(), 3);
    assert_eq!(replies[0]["result"], "a");
    assert_eq!(replies[0]["id"], "first");
    assert_eq!(replies[1]["error"]["code"], -32600);
    assert_eq!(replies[2]["result"], "b");
}

#[tokio::test]
async fn test_root_path_is_served() {
    let app = app().await;
    let request = Request::builder()
        .method("POST")
        .uri("/")
        .body(Body::from(r#"{"method":"echo","params":[true],"id":9}"#))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(value["result"], true);
}

#[test]
fn test_internal_error_fallback_matches_envelope() {
    let expected = serde_json::to_value(RpcResponse::error(json!(5), RpcError::Internal)).unwrap();
    assert_eq!(super::internal_error_value(json!(5)), expected);
}

#[tokio::test]
async fn test_out_of_range_lifespan_fails_cleanly() {
    let pool = create_test_pool().await.expect("Failed to create test pool");
    migrations::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");
    let app = build_router(AppState::new(pool, 1_000_000_000), "http://localhost:3000").unwrap();

    let created = call(&app, "create_account", json!(["a@x.com", "pw"]), None).await;
    assert_eq!(created["result"], json!(true));

    let login = call(&app, "login", json!(["a@x.com", "pw"]), None).await;
    assert_eq!(error_code(&login), -32603);
}
