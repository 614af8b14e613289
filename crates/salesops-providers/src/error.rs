//! Error type for `salesops-providers`.

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("{url} returned {status}: {body}")]
  Status {
    url:    String,
    status: StatusCode,
    body:   String,
  },

  #[error("could not decode response from {url}: {source}")]
  Decode {
    url:    String,
    source: serde_json::Error,
  },

  #[error("invalid configuration: {0}")]
  Config(String),
}

impl ProviderError {
  /// Timeouts, connection failures, and throttling or server-side statuses.
  pub fn is_retryable(&self) -> bool {
    match self {
      Self::Http(e) => e.is_timeout() || e.is_connect(),
      Self::Status { status, .. } => is_retryable_status(*status),
      Self::Decode { .. } | Self::Config(_) => false,
    }
  }
}

pub fn is_retryable_status(status: StatusCode) -> bool {
  status == StatusCode::TOO_MANY_REQUESTS
    || status == StatusCode::REQUEST_TIMEOUT
    || status.is_server_error()
}

pub type Result<T, E = ProviderError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn retryable_statuses() {
    for code in [408, 429, 500, 502, 503] {
      assert!(is_retryable_status(StatusCode::from_u16(code).unwrap()), "{code}");
    }
    for code in [400, 401, 404, 409] {
      assert!(!is_retryable_status(StatusCode::from_u16(code).unwrap()), "{code}");
    }
  }
}
