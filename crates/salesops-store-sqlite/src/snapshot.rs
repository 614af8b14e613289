//! Exported table dumps.
//!
//! A snapshot is one JSON object holding the rows of each table under its
//! table name, in the same shape the REST interface returns them:
//!
//! ```json
//! { "calls": [...], "outcome_log": [...], "setters": [...], "closers": [...] }
//! ```
//!
//! Missing tables are treated as empty.

use std::path::Path;

use serde::{Deserialize, Serialize};

use salesops_core::booking::{Booking, Closer, OutcomeLogEntry, Setter};

use crate::Result;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
  #[serde(default)]
  pub calls:       Vec<Booking>,
  #[serde(default)]
  pub outcome_log: Vec<OutcomeLogEntry>,
  #[serde(default)]
  pub setters:     Vec<Setter>,
  #[serde(default)]
  pub closers:     Vec<Closer>,
}

impl Snapshot {
  pub fn from_json(raw: &str) -> Result<Self> { Ok(serde_json::from_str(raw)?) }

  pub async fn read(path: impl AsRef<Path>) -> Result<Self> {
    let raw = tokio::fs::read_to_string(path).await?;
    Self::from_json(&raw)
  }

  /// Total number of rows across all tables.
  pub fn len(&self) -> usize {
    self.calls.len() + self.outcome_log.len() + self.setters.len() + self.closers.len()
  }

  pub fn is_empty(&self) -> bool { self.len() == 0 }
}
