//! [`ZoomPhoneClient`]: call logs and the caller directory from Zoom Phone.
//!
//! Both listings are token-paginated: each response carries a
//! `next_page_token`, and the listing is complete when it is empty or absent.

use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use reqwest::Client;
use serde::{Deserialize, de::DeserializeOwned};

use salesops_core::call_log::{
  CallDirection, CallLogEntry, CallLogSource, CallerDirectory, DirectoryEntry,
};

use crate::{ProviderError, Result, http, retry::RetryPolicy};

/// Largest page the call-log endpoint accepts.
pub const DEFAULT_PAGE_SIZE: u32 = 300;

#[derive(Debug, Clone)]
pub struct ZoomPhoneConfig {
  pub base_url:  String,
  pub api_token: String,
  pub page_size: u32,
  pub timeout:   Duration,
}

impl ZoomPhoneConfig {
  pub fn new(base_url: impl Into<String>, api_token: impl Into<String>) -> Self {
    Self {
      base_url:  base_url.into(),
      api_token: api_token.into(),
      page_size: DEFAULT_PAGE_SIZE,
      timeout:   http::DEFAULT_TIMEOUT,
    }
  }
}

#[derive(Clone)]
pub struct ZoomPhoneClient {
  client: Client,
  config: ZoomPhoneConfig,
  retry:  RetryPolicy,
}

// ─── Wire shapes ─────────────────────────────────────────────────────────────

/// One page of a listing. Items stay raw so a single malformed record can be
/// skipped without losing the rest of the page.
#[derive(Deserialize)]
struct Page {
  #[serde(default = "Vec::new", alias = "call_logs", alias = "users")]
  items:           Vec<serde_json::Value>,
  #[serde(default)]
  next_page_token: Option<String>,
}

/// Decode each item on its own, dropping (and logging) the ones that fail.
fn decode_items<T: DeserializeOwned>(path: &str, items: Vec<serde_json::Value>) -> Vec<T> {
  items
    .into_iter()
    .filter_map(|item| match serde_json::from_value(item) {
      Ok(decoded) => Some(decoded),
      Err(error) => {
        tracing::warn!(path, %error, "skipping undecodable record");
        None
      }
    })
    .collect()
}

#[derive(Deserialize)]
struct RawCallLog {
  #[serde(default)]
  callee_number: Option<String>,
  date_time:     DateTime<Utc>,
  #[serde(default = "unknown_direction")]
  direction:     CallDirection,
  #[serde(default)]
  user_id:       Option<String>,
  #[serde(default)]
  owner:         Option<RawOwner>,
  #[serde(default)]
  duration:      u32,
  #[serde(default)]
  result:        Option<String>,
}

#[derive(Deserialize)]
struct RawOwner {
  #[serde(default)]
  id:   Option<String>,
  #[serde(default)]
  name: Option<String>,
}

fn unknown_direction() -> CallDirection { CallDirection::Other }

impl From<RawCallLog> for CallLogEntry {
  fn from(raw: RawCallLog) -> Self {
    let (owner_id, owner_name) = match raw.owner {
      Some(o) => (o.id, o.name),
      None => (None, None),
    };
    Self {
      callee_number:    raw.callee_number.unwrap_or_default(),
      date_time:        raw.date_time,
      direction:        raw.direction,
      user_id:          raw.user_id.or(owner_id),
      owner_name,
      duration_seconds: raw.duration,
      result:           raw.result,
    }
  }
}

#[derive(Deserialize)]
struct RawUser {
  id:               String,
  #[serde(default)]
  name:             Option<String>,
  #[serde(default)]
  display_name:     Option<String>,
  #[serde(default)]
  extension_number: Option<serde_json::Value>,
}

impl RawUser {
  /// Users without any usable name are skipped.
  fn into_entry(self) -> Option<DirectoryEntry> {
    let name = self
      .name
      .or(self.display_name)
      .filter(|n| !n.trim().is_empty())?;
    let extension_number = match self.extension_number {
      Some(serde_json::Value::String(s)) => Some(s),
      Some(serde_json::Value::Number(n)) => Some(n.to_string()),
      _ => None,
    };
    Some(DirectoryEntry { id: self.id, name, extension_number })
  }
}

// ─── Client ──────────────────────────────────────────────────────────────────

impl ZoomPhoneClient {
  pub fn new(config: ZoomPhoneConfig) -> Result<Self> {
    if config.base_url.trim().is_empty() {
      return Err(ProviderError::Config("telephony base url is empty".into()));
    }
    Ok(Self {
      client: http::client(config.timeout)?,
      config,
      retry: RetryPolicy::default(),
    })
  }

  pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
    self.retry = retry;
    self
  }

  /// Follow `next_page_token` until the listing at `path` is exhausted.
  async fn paginate<T: DeserializeOwned>(
    &self,
    path: &str,
    params: &[(&str, String)],
  ) -> Result<Vec<T>> {
    let url = http::join(&self.config.base_url, path);
    let page_size = self.config.page_size.to_string();
    let mut items = Vec::new();
    let mut token: Option<String> = None;

    loop {
      let page: Page = http::get_json(&self.retry, path, || {
        let mut req = self
          .client
          .get(&url)
          .bearer_auth(&self.config.api_token)
          .query(params)
          .query(&[("page_size", &page_size)]);
        if let Some(t) = &token {
          req = req.query(&[("next_page_token", t)]);
        }
        req
      })
      .await?;

      tracing::debug!(path, got = page.items.len(), "fetched page");
      items.extend(decode_items::<T>(path, page.items));
      match page.next_page_token.filter(|t| !t.is_empty()) {
        Some(next) => token = Some(next),
        None => break,
      }
    }

    Ok(items)
  }
}

impl CallLogSource for ZoomPhoneClient {
  type Error = ProviderError;

  async fn outbound_calls(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<CallLogEntry>> {
    let params = [("from", from.to_string()), ("to", to.to_string())];
    let raws: Vec<RawCallLog> = self.paginate("calls", &params).await?;
    Ok(
      raws
        .into_iter()
        .map(CallLogEntry::from)
        .filter(|c| c.direction == CallDirection::Outbound)
        .collect(),
    )
  }

  async fn directory(&self) -> Result<CallerDirectory> {
    let users: Vec<RawUser> = self.paginate("users", &[]).await?;
    Ok(users.into_iter().filter_map(RawUser::into_entry).collect())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn owner_fills_in_missing_user_id() {
    let raw: RawCallLog = serde_json::from_value(serde_json::json!({
      "callee_number": "+15551112222",
      "date_time": "2025-01-01T10:00:00Z",
      "direction": "outbound",
      "owner": {"id": "u1", "name": "Sam Setter"},
      "duration": 42,
    }))
    .unwrap();
    let entry = CallLogEntry::from(raw);
    assert_eq!(entry.user_id.as_deref(), Some("u1"));
    assert_eq!(entry.owner_name.as_deref(), Some("Sam Setter"));
    assert_eq!(entry.duration_seconds, 42);
  }

  #[test]
  fn unknown_direction_is_other() {
    let raw: RawCallLog = serde_json::from_value(serde_json::json!({
      "date_time": "2025-01-01T10:00:00Z",
      "direction": "internal",
    }))
    .unwrap();
    assert_eq!(CallLogEntry::from(raw).direction, CallDirection::Other);
  }

  #[test]
  fn pages_read_either_listing_key() {
    let calls: Page = serde_json::from_value(serde_json::json!({
      "call_logs": [{"date_time": "2025-01-01T10:00:00Z"}],
      "next_page_token": "p2",
    }))
    .unwrap();
    assert_eq!(calls.items.len(), 1);
    assert_eq!(calls.next_page_token.as_deref(), Some("p2"));

    let users: Page = serde_json::from_value(serde_json::json!({"users": [{"id": "u1"}]})).unwrap();
    assert_eq!(users.items.len(), 1);
    assert!(users.next_page_token.is_none());

    let empty: Page = serde_json::from_value(serde_json::json!({})).unwrap();
    assert!(empty.items.is_empty());
  }

  #[test]
  fn malformed_call_logs_are_skipped() {
    let items = vec![
      serde_json::json!({"callee_number": "555", "date_time": "2025-01-01T10:00:00Z"}),
      serde_json::json!({"callee_number": "556"}),
      serde_json::json!({"callee_number": "557", "date_time": "yesterday"}),
      serde_json::json!({"callee_number": "558", "date_time": "2025-01-01T11:00:00Z"}),
    ];
    let raws: Vec<RawCallLog> = decode_items("calls", items);
    let numbers: Vec<_> = raws.into_iter().map(|r| r.callee_number.unwrap()).collect();
    assert_eq!(numbers, vec!["555", "558"]);
  }

  #[test]
  fn users_fall_back_to_display_name() {
    let user: RawUser = serde_json::from_value(serde_json::json!({
      "id": "u2", "display_name": "Dee", "extension_number": 1002,
    }))
    .unwrap();
    let entry = user.into_entry().unwrap();
    assert_eq!(entry.name, "Dee");
    assert_eq!(entry.extension_number.as_deref(), Some("1002"));

    let nameless: RawUser = serde_json::from_value(serde_json::json!({"id": "u3"})).unwrap();
    assert!(nameless.into_entry().is_none());
  }
}
