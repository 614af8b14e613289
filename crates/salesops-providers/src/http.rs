//! Shared reqwest plumbing.

use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;

use crate::{ProviderError, Result, retry::RetryPolicy};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub fn client(timeout: Duration) -> Result<Client> {
  Ok(Client::builder().timeout(timeout).build()?)
}

/// Join `base` and `path` with exactly one slash between them.
pub fn join(base: &str, path: &str) -> String {
  format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// Send the request built by `make`, retrying per `policy`, and decode a
/// successful body as JSON. Non-2xx responses become
/// [`ProviderError::Status`] carrying the response body.
pub async fn get_json<T: DeserializeOwned>(
  policy: &RetryPolicy,
  label: &str,
  make: impl Fn() -> RequestBuilder,
) -> Result<T> {
  let make = &make;
  policy
    .run(label, ProviderError::is_retryable, move || async move {
      let resp = make().send().await?;
      let url = resp.url().to_string();
      let status = resp.status();
      if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(ProviderError::Status { url, status, body });
      }
      let bytes = resp.bytes().await?;
      serde_json::from_slice(&bytes).map_err(|source| ProviderError::Decode { url, source })
    })
    .await
}
