//! End-to-end tests of the composed router: login, session checks, logout.

use std::sync::Arc;

use axum::{
  Router,
  body::Body,
  http::{Request, StatusCode, header},
};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use chrono::Duration;
use salesops_api::ApiState;
use salesops_providers::ZoomPhoneClient;
use salesops_store_sqlite::SqliteStore;
use serde_json::Value;
use tower::ServiceExt as _;

use crate::{
  AppState,
  auth::{AuthConfig, hash_password},
  router,
  session::SessionRegistry,
};

async fn app_with_ttl(ttl: Duration) -> Router {
  let store = SqliteStore::open_in_memory().await.expect("in-memory store");
  let api = ApiState::<_, ZoomPhoneClient>::new(Arc::new(store), None);
  let state = AppState {
    auth:     Arc::new(AuthConfig {
      username:      "ops".into(),
      password_hash: hash_password("hunter2").unwrap(),
    }),
    sessions: SessionRegistry::new(ttl),
  };
  router(state, api)
}

async fn app() -> Router { app_with_ttl(Duration::minutes(60)).await }

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Option<String>, Value) {
  let resp = app.clone().oneshot(req).await.unwrap();
  let status = resp.status();
  let challenge = resp
    .headers()
    .get(header::WWW_AUTHENTICATE)
    .and_then(|v| v.to_str().ok())
    .map(str::to_owned);
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  let body = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).unwrap()
  };
  (status, challenge, body)
}

fn login_request(user: &str, pass: &str) -> Request<Body> {
  Request::post("/auth/login")
    .header(header::AUTHORIZATION, format!("Basic {}", B64.encode(format!("{user}:{pass}"))))
    .body(Body::empty())
    .unwrap()
}

fn with_token(method: &str, uri: &str, token: &str) -> Request<Body> {
  Request::builder()
    .method(method)
    .uri(uri)
    .header(header::AUTHORIZATION, format!("Bearer {token}"))
    .body(Body::empty())
    .unwrap()
}

async fn login(app: &Router) -> String {
  let (status, _, body) = send(app, login_request("ops", "hunter2")).await;
  assert_eq!(status, StatusCode::OK);
  assert!(body["expiresAt"].is_string());
  body["token"].as_str().unwrap().to_owned()
}

#[tokio::test]
async fn health_needs_no_session() {
  let app = app().await;
  let (status, _, body) = send(&app, Request::get("/health").body(Body::empty()).unwrap()).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn api_requires_a_session() {
  let app = app().await;
  let (status, challenge, body) =
    send(&app, Request::get("/api/series").body(Body::empty()).unwrap()).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
  assert_eq!(challenge.as_deref(), Some("Bearer"));
  assert_eq!(body["error"], "unauthorized");

  let (status, _, _) = send(&app, with_token("GET", "/api/series", "made-up")).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn bad_credentials_get_a_basic_challenge() {
  let app = app().await;
  let (status, challenge, _) = send(&app, login_request("ops", "wrong")).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
  assert!(challenge.unwrap().starts_with("Basic"));
}

#[tokio::test]
async fn login_then_query_then_logout() {
  let app = app().await;
  let token = login(&app).await;

  let (status, _, body) =
    send(&app, with_token("GET", "/api/series?days=2&end=2025-01-02", &token)).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body.as_array().unwrap().len(), 2);

  let (status, _, _) = send(&app, with_token("POST", "/auth/logout", &token)).await;
  assert_eq!(status, StatusCode::NO_CONTENT);

  let (status, _, _) = send(&app, with_token("GET", "/api/series", &token)).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn expired_sessions_are_rejected() {
  let app = app_with_ttl(Duration::minutes(-1)).await;
  let token = login(&app).await;
  let (status, _, _) = send(&app, with_token("GET", "/api/series", &token)).await;
  assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn attribution_reports_missing_telephony() {
  let app = app().await;
  let token = login(&app).await;
  let (status, _, body) = send(
    &app,
    with_token("GET", "/api/attribution?from=2025-01-01&to=2025-01-02", &token),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert!(body.get("results").is_none());
  assert!(body["error"].as_str().unwrap().contains("telephony"));
}
