//! Booking and outcome rows: the records every statistical view is built on.
//!
//! Field names follow the column names of the `calls` and `outcome_log`
//! tables so rows deserialise straight from the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, de};

// ─── Booking ─────────────────────────────────────────────────────────────────

/// One scheduled call (a row of the `calls` table).
///
/// A lead that was rescheduled has several rows sharing `lead_id`; the rows
/// created by a reschedule carry `is_reschedule = true`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
  #[serde(deserialize_with = "int_id")]
  pub id:              i64,
  #[serde(deserialize_with = "id_string")]
  pub lead_id:         String,
  #[serde(default)]
  pub phone:           Option<String>,
  /// When the appointment was booked.
  pub book_date:       DateTime<Utc>,
  /// When the appointment is scheduled to take place.
  #[serde(default)]
  pub call_date:       Option<DateTime<Utc>>,
  #[serde(default, deserialize_with = "opt_id_string")]
  pub setter_id:       Option<String>,
  #[serde(default, deserialize_with = "opt_id_string")]
  pub first_setter_id: Option<String>,
  #[serde(default, deserialize_with = "opt_id_string")]
  pub closer_id:       Option<String>,
  #[serde(default, deserialize_with = "null_as_false")]
  pub is_reschedule:   bool,
  #[serde(default)]
  pub source_type:     Option<String>,
  /// `None` means the column is NULL; the literal string `"null"` is a
  /// distinct value and is kept as `Some("null")`.
  #[serde(default)]
  pub utm_source:      Option<String>,
  #[serde(default)]
  pub utm_medium:      Option<String>,
  #[serde(default)]
  pub utm_campaign:    Option<String>,
  #[serde(default, deserialize_with = "null_as_false")]
  pub confirmed:       bool,
  #[serde(default, deserialize_with = "null_as_false")]
  pub picked_up:       bool,
  #[serde(default, deserialize_with = "null_as_false")]
  pub showed_up:       bool,
  #[serde(default, deserialize_with = "null_as_false")]
  pub purchased:       bool,
  #[serde(default, deserialize_with = "null_as_false")]
  pub cancelled:       bool,
}

impl Booking {
  /// A booking with every optional field empty and every flag cleared.
  pub fn new(id: i64, lead_id: impl Into<String>, book_date: DateTime<Utc>) -> Self {
    Self {
      id,
      lead_id: lead_id.into(),
      phone: None,
      book_date,
      call_date: None,
      setter_id: None,
      first_setter_id: None,
      closer_id: None,
      is_reschedule: false,
      source_type: None,
      utm_source: None,
      utm_medium: None,
      utm_campaign: None,
      confirmed: false,
      picked_up: false,
      showed_up: false,
      purchased: false,
      cancelled: false,
    }
  }

  /// Paid traffic: `source_type` contains `"ad"`, case-insensitively.
  pub fn is_paid(&self) -> bool {
    self
      .source_type
      .as_deref()
      .is_some_and(|s| s.to_ascii_lowercase().contains("ad"))
  }
}

// ─── Outcomes ────────────────────────────────────────────────────────────────

/// The recorded result of a closing call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Outcome {
  Yes,
  Refund,
  Other(String),
}

impl From<String> for Outcome {
  fn from(value: String) -> Self {
    match value.trim().to_ascii_lowercase().as_str() {
      "yes" => Self::Yes,
      "refund" => Self::Refund,
      _ => Self::Other(value),
    }
  }
}

impl From<Outcome> for String {
  fn from(value: Outcome) -> Self {
    match value {
      Outcome::Yes => "yes".to_owned(),
      Outcome::Refund => "refund".to_owned(),
      Outcome::Other(s) => s,
    }
  }
}

/// Clawback applied when the column is NULL: a full refund.
pub const DEFAULT_CLAWBACK: f64 = 100.0;

/// A purchase or refund record (a row of the `outcome_log` table).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeLogEntry {
  #[serde(deserialize_with = "int_id")]
  pub id:            i64,
  pub outcome:       Outcome,
  /// Percentage (0–100) of the purchase that was refunded.
  #[serde(default)]
  pub clawback:      Option<f64>,
  #[serde(default)]
  pub purchase_date: Option<DateTime<Utc>>,
  /// The booking this outcome belongs to.
  #[serde(default, deserialize_with = "opt_int_id")]
  pub call_id:       Option<i64>,
}

impl OutcomeLogEntry {
  pub fn clawback(&self) -> f64 { self.clawback.unwrap_or(DEFAULT_CLAWBACK) }

  /// A purchase counts when it stuck, or was only partially refunded.
  pub fn is_counted_purchase(&self) -> bool {
    match self.outcome {
      Outcome::Yes => true,
      Outcome::Refund => self.clawback() < DEFAULT_CLAWBACK,
      Outcome::Other(_) => false,
    }
  }
}

// ─── Staff ───────────────────────────────────────────────────────────────────

/// A setter: books appointments and makes the first follow-up call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Setter {
  #[serde(deserialize_with = "id_string")]
  pub id:     String,
  pub name:   String,
  #[serde(default = "default_true", deserialize_with = "null_as_true")]
  pub active: bool,
}

/// A closer: runs the scheduled sales call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Closer {
  #[serde(deserialize_with = "id_string")]
  pub id:     String,
  pub name:   String,
  #[serde(default = "default_true", deserialize_with = "null_as_true")]
  pub active: bool,
}

// ─── Serde helpers ───────────────────────────────────────────────────────────

/// Identifiers arrive as strings from some tables and integers from others.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
  Text(String),
  Int(i64),
}

impl From<RawId> for String {
  fn from(value: RawId) -> Self {
    match value {
      RawId::Text(s) => s,
      RawId::Int(i) => i.to_string(),
    }
  }
}

fn id_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
  RawId::deserialize(d).map(String::from)
}

fn opt_id_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
  Ok(Option::<RawId>::deserialize(d)?.map(String::from))
}

impl RawId {
  fn into_int<E: de::Error>(self) -> Result<i64, E> {
    match self {
      RawId::Int(i) => Ok(i),
      RawId::Text(s) => s
        .trim()
        .parse()
        .map_err(|_| E::custom(format!("expected a numeric id, got {s:?}"))),
    }
  }
}

fn int_id<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
  RawId::deserialize(d)?.into_int()
}

fn opt_int_id<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
  Option::<RawId>::deserialize(d)?.map(RawId::into_int).transpose()
}

fn null_as_false<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
  Ok(Option::<bool>::deserialize(d)?.unwrap_or(false))
}

fn null_as_true<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
  Ok(Option::<bool>::deserialize(d)?.unwrap_or(true))
}

fn default_true() -> bool { true }

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn booking_row_tolerates_nulls_and_numeric_ids() {
    let row = serde_json::json!({
      "id": 12,
      "lead_id": 345,
      "phone": "(555) 111-2222",
      "book_date": "2025-01-01T10:00:00+00:00",
      "call_date": null,
      "setter_id": "a1b2",
      "closer_id": null,
      "is_reschedule": null,
      "utm_source": "null",
      "confirmed": true,
      "showed_up": null,
    });
    let booking: Booking = serde_json::from_value(row).unwrap();
    assert_eq!(booking.lead_id, "345");
    assert_eq!(booking.setter_id.as_deref(), Some("a1b2"));
    assert!(!booking.is_reschedule);
    assert!(booking.confirmed);
    assert!(!booking.showed_up);
    assert_eq!(booking.utm_source.as_deref(), Some("null"));
    assert_eq!(booking.utm_medium, None);
  }

  #[test]
  fn numeric_ids_accept_text() {
    let booking: Booking = serde_json::from_value(serde_json::json!({
      "id": "12",
      "lead_id": "L1",
      "book_date": "2025-01-01T10:00:00Z",
    }))
    .unwrap();
    assert_eq!(booking.id, 12);

    let entry: OutcomeLogEntry = serde_json::from_value(serde_json::json!({
      "id": "7",
      "outcome": "yes",
      "call_id": "12",
    }))
    .unwrap();
    assert_eq!((entry.id, entry.call_id), (7, Some(12)));

    let unlinked: OutcomeLogEntry =
      serde_json::from_value(serde_json::json!({"id": 8, "outcome": "no", "call_id": null}))
        .unwrap();
    assert_eq!(unlinked.call_id, None);

    let bad = serde_json::from_value::<Booking>(serde_json::json!({
      "id": "twelve",
      "lead_id": "L1",
      "book_date": "2025-01-01T10:00:00Z",
    }));
    assert!(bad.is_err());
  }

  #[test]
  fn paid_flag_is_case_insensitive_substring() {
    let mut b = Booking::new(1, "L1", Utc::now());
    assert!(!b.is_paid());
    b.source_type = Some("Facebook ADS".into());
    assert!(b.is_paid());
    b.source_type = Some("organic".into());
    assert!(!b.is_paid());
  }

  #[test]
  fn purchase_counting_rule() {
    let entry = |outcome: &str, clawback: Option<f64>| OutcomeLogEntry {
      id: 1,
      outcome: Outcome::from(outcome.to_owned()),
      clawback,
      purchase_date: None,
      call_id: Some(1),
    };
    assert!(entry("yes", None).is_counted_purchase());
    assert!(entry("refund", Some(50.0)).is_counted_purchase());
    assert!(!entry("refund", Some(100.0)).is_counted_purchase());
    assert!(!entry("refund", None).is_counted_purchase());
    assert!(!entry("no", None).is_counted_purchase());
  }
}
