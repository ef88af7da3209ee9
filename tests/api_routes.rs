use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use secrecy::Secret;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceExt;
use tower_sessions::MemoryStore;

use eventive::api::{
    self,
    middleware::session::{session_layer, AppState},
};
use eventive::config::Config;

fn test_config() -> Config {
    Config {
        database_url: "postgres://localhost/eventive_test".to_string(),
        base_url: "http://localhost:8000".to_string(),
        host: "127.0.0.1".to_string(),
        port: 8000,
        cors_origin: None,
        event_status_schedule: "0 */15 * * * *".to_string(),
        match_refresh_schedule: "0 0 * * * *".to_string(),
        session_secret: Secret::new("test-session-secret".to_string()),
        ticket_signing_key: Secret::new("test-ticket-key".to_string()),
    }
}

/// Full router over a lazy pool; nothing here touches the database
fn app() -> Router {
    let config = test_config();
    let pool = PgPoolOptions::new()
        .connect_lazy(&config.database_url)
        .unwrap();

    api::router()
        .layer(session_layer(MemoryStore::default(), "test-session-secret", false))
        .with_state(AppState::new(pool, config))
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_protected_routes_require_login() {
    for uri in [
        "/api/sessions.get_my_sessions",
        "/api/ticket.get_my_tickets",
        "/api/networking.get_matches",
        "/api/events.get_my_events",
    ] {
        let response = app()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", uri);
        let body = json_body(response).await;
        assert_eq!(body["error"], "AuthenticationError");
    }
}

#[tokio::test]
async fn test_check_in_requires_login() {
    let response = app()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/ticket.check_in")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"event_id":"00000000-0000-0000-0000-000000000000","qr_code":"x"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_for_event_requires_login() {
    let response = app()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/events.register_for_event")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"event_id":"00000000-0000-0000-0000-000000000000"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["error"], "AuthenticationError");
}

#[tokio::test]
async fn test_guest_current_user() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/api/auth.get_current_user")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["message"]["is_logged_in"], false);
    assert!(body["message"]["user_id"].is_null());
}

#[tokio::test]
async fn test_logout_without_session_succeeds() {
    let response = app()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/auth.api_logout")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["message"], "Logged out successfully");
}

#[tokio::test]
async fn test_quote_rejects_malformed_attendee_list() {
    let response = app()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/booking.quote")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    r#"{"event_id":"00000000-0000-0000-0000-000000000000","attendees":"[{not json"}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"], "ValidationError");
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let response = app()
        .oneshot(
            Request::builder()
                .uri("/api/unknown.route")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
