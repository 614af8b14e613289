//! UTC day boundaries.
//!
//! Every day-level range in the system (store queries, bucketing, series)
//! goes through [`day_bounds`], so a day always runs from
//! `T00:00:00.000Z` to `T23:59:59.999Z` regardless of the host timezone.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// An inclusive range of instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
  pub from: DateTime<Utc>,
  pub to:   DateTime<Utc>,
}

impl TimeRange {
  /// The range covering every day from `first` to `last`, both inclusive.
  pub fn days(first: NaiveDate, last: NaiveDate) -> Result<Self> {
    if first > last {
      return Err(Error::InvertedRange {
        from: first.to_string(),
        to:   last.to_string(),
      });
    }
    Ok(Self {
      from: day_bounds(first).from,
      to:   day_bounds(last).to,
    })
  }

  pub fn contains(&self, ts: DateTime<Utc>) -> bool { self.from <= ts && ts <= self.to }

  /// Lower bound rendered the way store queries expect it.
  pub fn from_param(&self) -> String { format_instant(self.from) }

  /// Upper bound rendered the way store queries expect it.
  pub fn to_param(&self) -> String { format_instant(self.to) }
}

/// Bounds of a single UTC calendar day.
pub fn day_bounds(date: NaiveDate) -> TimeRange {
  let from = date.and_time(NaiveTime::MIN).and_utc();
  TimeRange {
    from,
    to: from + Duration::days(1) - Duration::milliseconds(1),
  }
}

/// Render an instant as `YYYY-MM-DDTHH:MM:SS.mmmZ`.
pub fn format_instant(ts: DateTime<Utc>) -> String {
  ts.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// Parse a `YYYY-MM-DD` day string.
pub fn parse_day(raw: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
    .map_err(|_| Error::InvalidDate(raw.to_owned()))
}

/// The UTC calendar day an instant falls on.
pub fn day_of(ts: DateTime<Utc>) -> NaiveDate { ts.date_naive() }

pub fn today_utc() -> NaiveDate { Utc::now().date_naive() }

/// The last `n` days ending with `today`, oldest first.
pub fn last_n_days(n: u32, today: NaiveDate) -> Vec<NaiveDate> {
  (0..i64::from(n))
    .rev()
    .map(|back| today - Duration::days(back))
    .collect()
}

/// [`last_n_days`] anchored on the current UTC date.
pub fn last_n_days_utc(n: u32) -> Vec<NaiveDate> { last_n_days(n, today_utc()) }
