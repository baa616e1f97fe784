//! API integration tests.
//!
//! These tests drive the full router with axum's test utilities.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use serde_json::{json, Value};
use agent_gateway::api::{create_router, create_router_with_state, AppState};
use agent_gateway::security::ApiKeyStore;
use tower::ServiceExt;

/// Helper to create a JSON request.
fn json_request(method: Method, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");

    match body {
        Some(json) => builder.body(Body::from(json.to_string())).unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Helper to extract body as string.
async fn response_text(response: axum::response::Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8_lossy(&body).to_string()
}

/// Helper to extract JSON from response.
async fn response_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap_or(Value::Null)
}

// ============================================================================
// Health & Info Tests
// ============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_router();

    let response = app
        .oneshot(json_request(Method::GET, "/health", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_text(response).await, "OK");
}

#[tokio::test]
async fn test_api_info_endpoint() {
    let app = create_router_with_state(AppState::new());

    let response = app
        .oneshot(json_request(Method::GET, "/api/v1", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = response_json(response).await;
    assert_eq!(json["name"], "agent-gateway");
    assert_eq!(json["status"], "running");
}

// ============================================================================
// Tunnel Tests
// ============================================================================

#[tokio::test]
async fn test_list_tunnels_empty() {
    let app = create_router_with_state(AppState::new());

    let response = app
        .oneshot(json_request(Method::GET, "/api/v1/tunnels", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = response_json(response).await;
    assert_eq!(json["count"], 0);
    assert!(json["tunnels"].as_array().unwrap().is_empty());
    assert_eq!(json["summary"], "No servers are currently being shared.");
}

#[tokio::test]
async fn test_stop_unknown_tunnel() {
    let app = create_router_with_state(AppState::new());

    let response = app
        .oneshot(json_request(Method::DELETE, "/api/v1/tunnels/ghost", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let json = response_json(response).await;
    assert_eq!(json["code"], "TUNNEL_NOT_FOUND");
    assert_eq!(json["retryable"], false);
}

#[tokio::test]
async fn test_stop_trims_name() {
    let app = create_router_with_state(AppState::new());

    let response = app
        .oneshot(json_request(Method::DELETE, "/api/v1/tunnels/%20ghost%20", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        response_json(response).await["message"],
        "server ghost is not currently shared"
    );
}

#[tokio::test]
async fn test_stop_blank_name() {
    let app = create_router_with_state(AppState::new());

    let response = app
        .oneshot(json_request(Method::DELETE, "/api/v1/tunnels/%20", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_share_requires_name() {
    let app = create_router_with_state(AppState::new());

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/v1/tunnels",
            Some(json!({ "name": "  " })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response_json(response).await["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_share_missing_program() {
    let mut config = agent_gateway::config::Config::default();
    config.tunnel.program = "nonexistent-share-tool-7c21".to_string();
    let state = AppState::from_config(&config);

    let response = create_router_with_state(state.clone())
        .oneshot(json_request(
            Method::POST,
            "/api/v1/tunnels",
            Some(json!({ "name": "memory" })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response_json(response).await["code"], "START_FAILURE");
    assert_eq!(state.tunnels.registry().count(), 0);
}

#[cfg(unix)]
#[tokio::test]
async fn test_share_list_stop_flow() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("fake-share");
    std::fs::write(
        &script,
        "#!/bin/sh\necho \"Sharing $2\"\necho \"Public URL: https://$2.example.test/abc\"\nexec sleep 30\n",
    )
    .unwrap();
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

    let mut config = agent_gateway::config::Config::default();
    config.tunnel.program = script.to_string_lossy().into_owned();
    config.tunnel.deadline_secs = 10;
    let state = AppState::from_config(&config);

    // Share
    let response = create_router_with_state(state.clone())
        .oneshot(json_request(
            Method::POST,
            "/api/v1/tunnels",
            Some(json!({ "name": "memory" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = response_json(response).await;
    assert_eq!(json["name"], "memory");
    assert_eq!(json["url"], "https://memory.example.test/abc");

    // Sharing the same name again conflicts
    let response = create_router_with_state(state.clone())
        .oneshot(json_request(
            Method::POST,
            "/api/v1/tunnels",
            Some(json!({ "name": "memory" })),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(response_json(response).await["code"], "DUPLICATE_TUNNEL");

    // List
    let response = create_router_with_state(state.clone())
        .oneshot(json_request(Method::GET, "/api/v1/tunnels", None))
        .await
        .unwrap();
    let json = response_json(response).await;
    assert_eq!(json["count"], 1);
    assert_eq!(json["tunnels"][0]["name"], "memory");
    assert_eq!(json["tunnels"][0]["active"], true);
    assert_eq!(json["summary"], "Currently shared servers:\n- memory");

    // Stop
    let response = create_router_with_state(state.clone())
        .oneshot(json_request(Method::DELETE, "/api/v1/tunnels/%20memory%20", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response_json(response).await["message"],
        "Stopped sharing server memory"
    );

    assert!(state.tunnels.list().unwrap().is_empty());
}

// ============================================================================
// Execution Tests
// ============================================================================

#[tokio::test]
async fn test_execute_missing_binary() {
    let app = create_router_with_state(AppState::new());

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/v1/execute",
            Some(json!({ "program": "nonexistent-binary-9a3e", "args": ["ls"] })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let json = response_json(response).await;
    assert_eq!(json["code"], "START_FAILURE");
    assert!(json["message"]
        .as_str()
        .unwrap()
        .contains("nonexistent-binary-9a3e"));
}

#[tokio::test]
async fn test_execute_requires_program() {
    let app = create_router_with_state(AppState::new());

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/v1/execute",
            Some(json!({ "program": "" })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[cfg(unix)]
#[tokio::test]
async fn test_execute_success() {
    let app = create_router_with_state(AppState::new());

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/v1/execute",
            Some(json!({
                "program": "sh",
                "args": ["-c", "printf '\\033[32mready\\033[0m\\n'; echo \"$NO_COLOR $GREETING\""],
                "env": { "GREETING": "hi" }
            })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = response_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["exit_code"], 0);
    assert_eq!(json["output"], "ready\ntrue hi");
}

#[cfg(unix)]
#[tokio::test]
async fn test_execute_nonzero_exit() {
    let app = create_router_with_state(AppState::new());

    let response = app
        .oneshot(json_request(
            Method::POST,
            "/api/v1/execute",
            Some(json!({ "program": "sh", "args": ["-c", "echo boom >&2; exit 3"] })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = response_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["exit_code"], 3);
    assert_eq!(json["output"], "boom");
    assert!(json["error"].is_string());
}

// ============================================================================
// Authentication Tests
// ============================================================================

fn authenticated_state() -> AppState {
    AppState {
        auth: Arc::new(ApiKeyStore::with_keys(["secret"])),
        ..AppState::new()
    }
}

#[tokio::test]
async fn test_auth_rejects_missing_key() {
    let app = create_router_with_state(authenticated_state());

    let response = app
        .oneshot(json_request(Method::GET, "/api/v1/tunnels", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_accepts_valid_key() {
    let app = create_router_with_state(authenticated_state());

    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/v1/tunnels")
        .header(header::AUTHORIZATION, "Bearer secret")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_auth_health_is_public() {
    let app = create_router_with_state(authenticated_state());

    let response = app
        .oneshot(json_request(Method::GET, "/health", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

// ============================================================================
// Error Handling Tests
// ============================================================================

#[tokio::test]
async fn test_invalid_json_body() {
    let app = create_router_with_state(AppState::new());

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/tunnels")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{ invalid json }"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_method_not_allowed() {
    let app = create_router_with_state(AppState::new());

    let response = app
        .oneshot(json_request(Method::PUT, "/health", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_not_found_route() {
    let app = create_router_with_state(AppState::new());

    let response = app
        .oneshot(json_request(Method::GET, "/nonexistent", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
