//! HTTP server for the sales dashboard.
//!
//! Composes the reporting API from `salesops-api` behind session
//! authentication, adds login/logout and a health probe, and wraps the
//! whole router in request tracing.

pub mod auth;
pub mod config;
pub mod error;
pub mod session;

pub use config::{ServerConfig, StoreBackend, StoreConfig, TelephonyConfig};
pub use error::Error;

use std::sync::Arc;

use axum::{
  Json, Router,
  extract::State,
  http::{HeaderMap, StatusCode},
  middleware,
  response::IntoResponse,
  routing::{get, post},
};
use salesops_api::{ApiState, api_router};
use salesops_core::{call_log::CallLogSource, store::SalesStore};
use serde_json::json;
use tower_http::trace::TraceLayer;

use auth::{AuthConfig, bearer_token, verify_basic};
use session::{IssuedToken, SessionRegistry, require_session};

// ─── Application state ────────────────────────────────────────────────────────

/// State for the routes this crate owns; the API keeps its own.
#[derive(Clone)]
pub struct AppState {
  pub auth:     Arc<AuthConfig>,
  pub sessions: SessionRegistry,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the full application router.
pub fn router<S, T>(state: AppState, api: ApiState<S, T>) -> Router
where
  S: SalesStore + 'static,
  T: CallLogSource + 'static,
{
  let protected = api_router(api).route_layer(middleware::from_fn_with_state(
    state.sessions.clone(),
    require_session,
  ));

  Router::new()
    .route("/health", get(health))
    .route("/auth/login", post(login))
    .route("/auth/logout", post(logout))
    .with_state(state)
    .nest("/api", protected)
    .layer(TraceLayer::new_for_http())
}

// ─── Handlers ────────────────────────────────────────────────────────────────

async fn health() -> impl IntoResponse { Json(json!({ "status": "ok" })) }

/// `POST /auth/login` with HTTP Basic credentials.
async fn login(
  State(state): State<AppState>,
  headers: HeaderMap,
) -> Result<Json<IssuedToken>, Error> {
  let username = verify_basic(&headers, &state.auth).inspect_err(|_| {
    tracing::warn!("rejected login attempt");
  })?;
  Ok(Json(state.sessions.issue(&username).await))
}

/// `POST /auth/logout` with the bearer token to revoke.
async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Result<StatusCode, Error> {
  let token = bearer_token(&headers).ok_or(Error::Unauthorized)?;
  if state.sessions.revoke(token).await {
    Ok(StatusCode::NO_CONTENT)
  } else {
    Err(Error::Unauthorized)
  }
}

#[cfg(test)]
mod tests;
