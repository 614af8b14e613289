//! Error types and axum `IntoResponse` implementation.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// Bad or missing credentials at login.
  #[error("invalid credentials")]
  InvalidCredentials,
  /// Missing, unknown, or expired session token.
  #[error("unauthorized")]
  Unauthorized,
  #[error("configuration error: {0}")]
  Config(String),
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    let (status, challenge) = match self {
      Error::InvalidCredentials => {
        (StatusCode::UNAUTHORIZED, Some("Basic realm=\"salesops\""))
      }
      Error::Unauthorized => (StatusCode::UNAUTHORIZED, Some("Bearer")),
      Error::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, None),
    };
    let mut res = (status, Json(json!({ "error": self.to_string() }))).into_response();
    if let Some(challenge) = challenge {
      res
        .headers_mut()
        .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static(challenge));
    }
    res
  }
}
