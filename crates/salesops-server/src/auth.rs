//! HTTP Basic credential check used by the login endpoint.

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::http::HeaderMap;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;

use crate::error::Error;

/// Credentials accepted as valid for this server instance.
#[derive(Clone)]
pub struct AuthConfig {
  pub username:      String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
}

/// Verify `Authorization: Basic …` against `config`; returns the username.
pub fn verify_basic(headers: &HeaderMap, config: &AuthConfig) -> Result<String, Error> {
  let header_val = headers
    .get(axum::http::header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(Error::InvalidCredentials)?;

  let encoded = header_val
    .strip_prefix("Basic ")
    .ok_or(Error::InvalidCredentials)?;

  let decoded = B64.decode(encoded).map_err(|_| Error::InvalidCredentials)?;
  let creds   = std::str::from_utf8(&decoded).map_err(|_| Error::InvalidCredentials)?;

  let (username, password) = creds.split_once(':').ok_or(Error::InvalidCredentials)?;

  if username != config.username {
    return Err(Error::InvalidCredentials);
  }

  let parsed_hash = PasswordHash::new(&config.password_hash)
    .map_err(|_| Error::InvalidCredentials)?;

  Argon2::default()
    .verify_password(password.as_bytes(), &parsed_hash)
    .map_err(|_| Error::InvalidCredentials)?;

  Ok(username.to_owned())
}

/// `Authorization: Bearer <token>`, if present.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
  headers
    .get(axum::http::header::AUTHORIZATION)?
    .to_str()
    .ok()?
    .strip_prefix("Bearer ")
    .map(str::trim)
    .filter(|t| !t.is_empty())
}

/// Produce the PHC string stored in `auth_password_hash`.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
  use argon2::{PasswordHasher, password_hash::SaltString};
  use rand_core::OsRng;

  let salt = SaltString::generate(&mut OsRng);
  Ok(Argon2::default().hash_password(password.as_bytes(), &salt)?.to_string())
}
