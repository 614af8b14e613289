//! Conversions between domain rows and SQLite column values.
//!
//! Timestamps are written with [`format_instant`] and read back as RFC 3339.
//! Rows are first read into `Raw*` structs inside the connection closure and
//! decoded afterwards, so parse failures surface as [`Error::DateParse`]
//! rather than as opaque rusqlite errors.

use chrono::{DateTime, Utc};
use rusqlite::Row;
use salesops_core::{
  booking::{Booking, Closer, Outcome, OutcomeLogEntry, Setter},
  day::format_instant,
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { format_instant(dt) }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

fn decode_opt_dt(s: Option<String>) -> Result<Option<DateTime<Utc>>> {
  s.as_deref().map(decode_dt).transpose()
}

// ─── Bookings ────────────────────────────────────────────────────────────────

/// Column list shared by every `calls` read, in [`RawBooking::from_row`] order.
pub const BOOKING_COLUMNS: &str = "id, lead_id, phone, book_date, call_date, \
   setter_id, first_setter_id, closer_id, is_reschedule, source_type, \
   utm_source, utm_medium, utm_campaign, confirmed, picked_up, showed_up, \
   purchased, cancelled";

pub struct RawBooking {
  id:              i64,
  lead_id:         String,
  phone:           Option<String>,
  book_date:       String,
  call_date:       Option<String>,
  setter_id:       Option<String>,
  first_setter_id: Option<String>,
  closer_id:       Option<String>,
  is_reschedule:   bool,
  source_type:     Option<String>,
  utm_source:      Option<String>,
  utm_medium:      Option<String>,
  utm_campaign:    Option<String>,
  flags:           [bool; 5],
}

impl RawBooking {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:              row.get(0)?,
      lead_id:         row.get(1)?,
      phone:           row.get(2)?,
      book_date:       row.get(3)?,
      call_date:       row.get(4)?,
      setter_id:       row.get(5)?,
      first_setter_id: row.get(6)?,
      closer_id:       row.get(7)?,
      is_reschedule:   row.get(8)?,
      source_type:     row.get(9)?,
      utm_source:      row.get(10)?,
      utm_medium:      row.get(11)?,
      utm_campaign:    row.get(12)?,
      flags:           [row.get(13)?, row.get(14)?, row.get(15)?, row.get(16)?, row.get(17)?],
    })
  }

  pub fn into_booking(self) -> Result<Booking> {
    let [confirmed, picked_up, showed_up, purchased, cancelled] = self.flags;
    Ok(Booking {
      id: self.id,
      lead_id: self.lead_id,
      phone: self.phone,
      book_date: decode_dt(&self.book_date)?,
      call_date: decode_opt_dt(self.call_date)?,
      setter_id: self.setter_id,
      first_setter_id: self.first_setter_id,
      closer_id: self.closer_id,
      is_reschedule: self.is_reschedule,
      source_type: self.source_type,
      utm_source: self.utm_source,
      utm_medium: self.utm_medium,
      utm_campaign: self.utm_campaign,
      confirmed,
      picked_up,
      showed_up,
      purchased,
      cancelled,
    })
  }
}

// ─── Outcomes ────────────────────────────────────────────────────────────────

pub const OUTCOME_COLUMNS: &str = "id, outcome, clawback, purchase_date, call_id";

pub struct RawOutcome {
  id:            i64,
  outcome:       String,
  clawback:      Option<f64>,
  purchase_date: Option<String>,
  call_id:       Option<i64>,
}

impl RawOutcome {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:            row.get(0)?,
      outcome:       row.get(1)?,
      clawback:      row.get(2)?,
      purchase_date: row.get(3)?,
      call_id:       row.get(4)?,
    })
  }

  pub fn into_outcome(self) -> Result<OutcomeLogEntry> {
    Ok(OutcomeLogEntry {
      id:            self.id,
      outcome:       Outcome::from(self.outcome),
      clawback:      self.clawback,
      purchase_date: decode_opt_dt(self.purchase_date)?,
      call_id:       self.call_id,
    })
  }
}

// ─── Staff ───────────────────────────────────────────────────────────────────

pub fn setter_from_row(row: &Row<'_>) -> rusqlite::Result<Setter> {
  Ok(Setter {
    id:     row.get(0)?,
    name:   row.get(1)?,
    active: row.get(2)?,
  })
}

pub fn closer_from_row(row: &Row<'_>) -> rusqlite::Result<Closer> {
  Ok(Closer {
    id:     row.get(0)?,
    name:   row.get(1)?,
    active: row.get(2)?,
  })
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn timestamps_are_fixed_width_and_round_trip() {
    let ts = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
    let encoded = encode_dt(ts);
    assert_eq!(encoded, "2025-01-02T03:04:05.000Z");
    assert_eq!(decode_dt(&encoded).unwrap(), ts);
  }

  #[test]
  fn offset_timestamps_decode_to_utc() {
    let ts = decode_dt("2025-01-02T01:00:00+02:00").unwrap();
    assert_eq!(encode_dt(ts), "2025-01-01T23:00:00.000Z");
  }

  #[test]
  fn garbage_dates_are_reported() {
    assert!(matches!(decode_dt("yesterday"), Err(Error::DateParse(_))));
  }
}
