//! Query-string parsing shared by the report handlers.

use chrono::{Duration, NaiveDate};
use salesops_core::day::{TimeRange, day_bounds, parse_day, today_utc};
use serde::Deserialize;

use crate::ApiError;

/// Days covered when a report is requested without a range.
pub const DEFAULT_RANGE_DAYS: i64 = 7;

/// `?from=YYYY-MM-DD&to=YYYY-MM-DD`, both optional.
#[derive(Debug, Default, Deserialize)]
pub struct RangeParams {
  pub from: Option<String>,
  pub to:   Option<String>,
}

/// A resolved inclusive day range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayRange {
  pub from: NaiveDate,
  pub to:   NaiveDate,
}

impl DayRange {
  pub fn instants(&self) -> TimeRange {
    TimeRange {
      from: day_bounds(self.from).from,
      to:   day_bounds(self.to).to,
    }
  }
}

impl RangeParams {
  /// `to` defaults to today (UTC); `from` to the week ending at `to`.
  pub fn resolve(&self) -> Result<DayRange, ApiError> {
    let to = optional_day(self.to.as_deref())?.unwrap_or_else(today_utc);
    let from = optional_day(self.from.as_deref())?
      .unwrap_or_else(|| to - Duration::days(DEFAULT_RANGE_DAYS - 1));
    TimeRange::days(from, to)?;
    Ok(DayRange { from, to })
  }
}

/// Parse an optional day parameter; blank counts as absent.
pub fn optional_day(raw: Option<&str>) -> Result<Option<NaiveDate>, ApiError> {
  match raw.map(str::trim) {
    None | Some("") => Ok(None),
    Some(s) => Ok(Some(parse_day(s)?)),
  }
}
