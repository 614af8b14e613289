//! Telephony call-log records and the `CallLogSource` trait.
//!
//! The trait is implemented by telephony adapters (e.g. the Zoom Phone client
//! in `salesops-providers`). The reconciler in [`crate::attribution`] only
//! sees the records, never the provider.

use std::{collections::HashMap, future::Future};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ─── Records ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallDirection {
  Outbound,
  Inbound,
  #[serde(other)]
  Other,
}

/// One call made or received through the telephony provider. Immutable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallLogEntry {
  /// Raw, unnormalised number of the called party.
  pub callee_number:    String,
  pub date_time:        DateTime<Utc>,
  pub direction:        CallDirection,
  /// Provider user id of the caller.
  pub user_id:          Option<String>,
  /// Display name of the line owner as reported on the record itself.
  pub owner_name:       Option<String>,
  pub duration_seconds: u32,
  pub result:           Option<String>,
}

/// A provider user, as listed by the caller directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
  pub id:               String,
  pub name:             String,
  pub extension_number: Option<String>,
}

/// Caller id → display name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallerDirectory {
  names: HashMap<String, String>,
}

impl CallerDirectory {
  pub fn new() -> Self { Self::default() }

  pub fn insert(&mut self, id: impl Into<String>, name: impl Into<String>) {
    self.names.insert(id.into(), name.into());
  }

  pub fn name_of(&self, id: &str) -> Option<&str> {
    self.names.get(id).map(String::as_str)
  }

  pub fn len(&self) -> usize { self.names.len() }

  pub fn is_empty(&self) -> bool { self.names.is_empty() }
}

impl FromIterator<DirectoryEntry> for CallerDirectory {
  fn from_iter<T: IntoIterator<Item = DirectoryEntry>>(iter: T) -> Self {
    Self {
      names: iter.into_iter().map(|e| (e.id, e.name)).collect(),
    }
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Read-only access to a telephony provider.
///
/// Both methods are enrichment sources: callers are expected to degrade to an
/// empty result on error rather than fail the whole request.
pub trait CallLogSource: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Every outbound call dated within `from..=to` (UTC days), across all
  /// result pages.
  fn outbound_calls(
    &self,
    from: NaiveDate,
    to: NaiveDate,
  ) -> impl Future<Output = Result<Vec<CallLogEntry>, Self::Error>> + Send + '_;

  /// The provider's user list, keyed by caller id.
  fn directory(&self) -> impl Future<Output = Result<CallerDirectory, Self::Error>> + Send + '_;
}
