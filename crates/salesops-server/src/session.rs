//! Bearer sessions issued at login.
//!
//! Tokens are random v4 UUIDs handed to the client once; the registry keeps
//! only their SHA-256 digests. Every `/api` request passes through [`require_session`], which is the one
//! place session validity is decided.

use std::{collections::HashMap, sync::Arc};

use axum::{
  extract::{Request, State},
  middleware::Next,
  response::Response,
};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{auth::bearer_token, error::Error};

/// An authenticated login, placed in request extensions by [`require_session`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
  pub username:   String,
  pub expires_at: DateTime<Utc>,
}

/// Returned to the client at login.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedToken {
  pub token:      String,
  pub expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct SessionRegistry {
  ttl:      Duration,
  sessions: Arc<RwLock<HashMap<String, Session>>>,
}

fn digest(token: &str) -> String { hex::encode(Sha256::digest(token.as_bytes())) }

impl SessionRegistry {
  pub fn new(ttl: Duration) -> Self {
    Self { ttl, sessions: Arc::default() }
  }

  pub async fn issue(&self, username: &str) -> IssuedToken {
    self.issue_at(username, Utc::now()).await
  }

  async fn issue_at(&self, username: &str, now: DateTime<Utc>) -> IssuedToken {
    let token = Uuid::new_v4().simple().to_string();
    let session = Session {
      username:   username.to_owned(),
      expires_at: now + self.ttl,
    };
    let expires_at = session.expires_at;

    let mut sessions = self.sessions.write().await;
    sessions.retain(|_, s| s.expires_at > now);
    sessions.insert(digest(&token), session);
    tracing::info!(username, %expires_at, "session issued");

    IssuedToken { token, expires_at }
  }

  /// The live session for `token`; expired sessions are dropped on sight.
  pub async fn validate(&self, token: &str) -> Option<Session> {
    self.validate_at(token, Utc::now()).await
  }

  async fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Option<Session> {
    let key = digest(token);
    let found = self.sessions.read().await.get(&key).cloned()?;
    if found.expires_at > now {
      return Some(found);
    }
    self.sessions.write().await.remove(&key);
    None
  }

  /// Returns whether a session was removed.
  pub async fn revoke(&self, token: &str) -> bool {
    self.sessions.write().await.remove(&digest(token)).is_some()
  }
}

/// Reject requests without a live bearer session; otherwise attach the
/// [`Session`] to the request and continue.
pub async fn require_session(
  State(registry): State<SessionRegistry>,
  mut req: Request,
  next: Next,
) -> Result<Response, Error> {
  let token = bearer_token(req.headers()).ok_or(Error::Unauthorized)?;
  let session = registry.validate(token).await.ok_or(Error::Unauthorized)?;
  req.extensions_mut().insert(session);
  Ok(next.run(req).await)
}
