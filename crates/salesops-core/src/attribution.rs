//! Call attribution: match outbound calls to the bookings they follow up on.
//!
//! A booking is matched to the earliest outbound call to the same normalised
//! phone number made at or after the booking instant. The response time is
//! the gap between the two, in whole minutes.
//!
//! Matching is restricted to an [`AttributionWindow`] that never reaches
//! further back than [`LOOKBACK_DAYS`] before the end date. A booking older
//! than that reads as "not called" even when a call exists; this bounds the
//! provider query and is not a statement about the call history.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  booking::{Booking, Setter},
  call_log::{CallDirection, CallLogEntry, CallerDirectory},
  day::{TimeRange, day_bounds, day_of},
  metrics::percentage,
  phone::{normalize, normalize_opt},
};

/// Hard cap on how far before the end date call logs are consulted.
pub const LOOKBACK_DAYS: i64 = 90;

// ─── Window ──────────────────────────────────────────────────────────────────

/// The UTC days of call history consulted for one reconciliation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributionWindow {
  pub from: NaiveDate,
  pub to:   NaiveDate,
}

impl AttributionWindow {
  /// `[max(earliest booking day, end - lookback_days), end]`.
  ///
  /// Returns `None` when there are no bookings to attribute.
  pub fn for_bookings<'a>(
    bookings: impl IntoIterator<Item = &'a Booking>,
    end: NaiveDate,
    lookback_days: i64,
  ) -> Option<Self> {
    let earliest = bookings.into_iter().map(|b| day_of(b.book_date)).min()?;
    let floor = end - Duration::days(lookback_days);
    Some(Self {
      from: earliest.max(floor).min(end),
      to:   end,
    })
  }

  pub fn range(&self) -> TimeRange {
    TimeRange {
      from: day_bounds(self.from).from,
      to:   day_bounds(self.to).to,
    }
  }
}

// ─── Results ─────────────────────────────────────────────────────────────────

/// The attribution outcome for one booking. Derived on every read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributionResult {
  pub booking_id:            i64,
  pub lead_id:               String,
  pub setter_id:             String,
  /// Display name the caller is compared against.
  pub expected_setter:       String,
  pub book_date:             DateTime<Utc>,
  pub called:                bool,
  pub first_call_at:         Option<DateTime<Utc>>,
  pub response_time_minutes: Option<i64>,
  pub actual_caller:         Option<String>,
  pub correct_setter:        Option<bool>,
}

/// Everything a reconciliation run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribution {
  pub results: Vec<AttributionResult>,
  /// Bookings dropped for lacking a phone number or a setter.
  pub skipped: u32,
  pub window:  Option<AttributionWindow>,
}

// ─── Reconciler ──────────────────────────────────────────────────────────────

/// Lookup tables used to name callers and expected setters.
#[derive(Debug, Clone)]
pub struct Reconciler {
  directory:     CallerDirectory,
  setter_names:  HashMap<String, String>,
  lookback_days: i64,
}

impl Default for Reconciler {
  fn default() -> Self { Self::new(CallerDirectory::default(), &[]) }
}

impl Reconciler {
  pub fn new(directory: CallerDirectory, setters: &[Setter]) -> Self {
    Self {
      directory,
      setter_names: setters.iter().map(|s| (s.id.clone(), s.name.clone())).collect(),
      lookback_days: LOOKBACK_DAYS,
    }
  }

  /// Override the lookback cap; mostly useful for tests and tuning.
  pub fn with_lookback_days(mut self, days: i64) -> Self {
    self.lookback_days = days;
    self
  }

  pub fn window(&self, bookings: &[Booking], end: NaiveDate) -> Option<AttributionWindow> {
    AttributionWindow::for_bookings(
      bookings.iter().filter(|b| is_attributable(b)),
      end,
      self.lookback_days,
    )
  }

  /// Produce one result per attributable booking, in input order.
  pub fn reconcile(
    &self,
    bookings: &[Booking],
    calls: &[CallLogEntry],
    end: NaiveDate,
  ) -> Attribution {
    let window = self.window(bookings, end);
    let index = window
      .map(|w| CallIndex::build(calls, w.range()))
      .unwrap_or_default();

    let mut skipped = 0;
    let mut results = Vec::with_capacity(bookings.len());
    for booking in bookings {
      if !is_attributable(booking) {
        skipped += 1;
        continue;
      }
      results.push(self.attribute(booking, &index));
    }

    Attribution { results, skipped, window }
  }

  fn attribute(&self, booking: &Booking, index: &CallIndex<'_>) -> AttributionResult {
    let setter_id = booking.setter_id.clone().unwrap_or_default();
    let expected_setter = self
      .setter_names
      .get(&setter_id)
      .cloned()
      .unwrap_or_else(|| setter_id.clone());

    let mut result = AttributionResult {
      booking_id: booking.id,
      lead_id: booking.lead_id.clone(),
      setter_id,
      expected_setter,
      book_date: booking.book_date,
      called: false,
      first_call_at: None,
      response_time_minutes: None,
      actual_caller: None,
      correct_setter: None,
    };

    let phone = normalize_opt(booking.phone.as_deref());
    let Some(call) = index.first_call_after(&phone, booking.book_date) else {
      return result;
    };

    let caller = self.resolve_caller(call);
    result.called = true;
    result.first_call_at = Some(call.date_time);
    result.response_time_minutes = Some(minutes_between(booking.book_date, call.date_time));
    result.correct_setter = Some(
      caller
        .as_deref()
        .is_some_and(|name| names_match(&result.expected_setter, name)),
    );
    result.actual_caller = caller;
    result
  }

  /// Directory name of the caller, else the owner name on the record (unless
  /// it is the auto-receptionist), else the raw caller id.
  fn resolve_caller(&self, call: &CallLogEntry) -> Option<String> {
    if let Some(name) = call.user_id.as_deref().and_then(|id| self.directory.name_of(id)) {
      return Some(name.to_owned());
    }
    if let Some(owner) = call.owner_name.as_deref()
      && !owner.trim().is_empty()
      && !is_auto_receptionist(owner)
    {
      return Some(owner.trim().to_owned());
    }
    call.user_id.clone()
  }
}

fn is_attributable(booking: &Booking) -> bool {
  !normalize_opt(booking.phone.as_deref()).is_empty()
    && booking.setter_id.as_deref().is_some_and(|s| !s.trim().is_empty())
}

fn is_auto_receptionist(name: &str) -> bool {
  let squashed: String = name
    .chars()
    .filter(char::is_ascii_alphanumeric)
    .map(|c| c.to_ascii_lowercase())
    .collect();
  squashed.contains("autoreceptionist")
}

/// Whole minutes from `from` to `to`, rounded half up.
fn minutes_between(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
  ((to - from).num_milliseconds() as f64 / 60_000.0).round() as i64
}

/// Case-insensitive containment in either direction, after trimming.
///
/// Tolerates short and long forms of the same name ("Sam" / "Samuel").
pub fn names_match(expected: &str, actual: &str) -> bool {
  let expected = expected.trim().to_lowercase();
  let actual = actual.trim().to_lowercase();
  if expected.is_empty() || actual.is_empty() {
    return false;
  }
  expected.contains(&actual) || actual.contains(&expected)
}

// ─── Call index ──────────────────────────────────────────────────────────────

/// Outbound calls within the window, grouped by normalised callee number and
/// sorted by time.
#[derive(Default)]
struct CallIndex<'a> {
  by_number: HashMap<String, Vec<&'a CallLogEntry>>,
}

impl<'a> CallIndex<'a> {
  fn build(calls: &'a [CallLogEntry], range: TimeRange) -> Self {
    let mut by_number: HashMap<String, Vec<&'a CallLogEntry>> = HashMap::new();
    for call in calls {
      if call.direction != CallDirection::Outbound || !range.contains(call.date_time) {
        continue;
      }
      let number = normalize(&call.callee_number);
      if number.is_empty() {
        continue;
      }
      by_number.entry(number).or_default().push(call);
    }
    for list in by_number.values_mut() {
      list.sort_by_key(|c| c.date_time);
    }
    Self { by_number }
  }

  fn first_call_after(&self, number: &str, at: DateTime<Utc>) -> Option<&'a CallLogEntry> {
    let list = self.by_number.get(number)?;
    let idx = list.partition_point(|c| c.date_time < at);
    list.get(idx).copied()
  }
}

// ─── Summary ─────────────────────────────────────────────────────────────────

/// Per-setter response statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetterResponse {
  pub setter_id:                String,
  pub setter_name:              String,
  pub bookings:                 u32,
  pub called:                   u32,
  pub average_response_minutes: Option<f64>,
}

/// Aggregate view over one reconciliation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributionSummary {
  pub total:                    u32,
  pub called:                   u32,
  pub not_called:               u32,
  pub skipped:                  u32,
  /// Bookings made before the window start; their "not called" may be an
  /// artefact of the lookback cap.
  pub window_truncated:         u32,
  pub average_response_minutes: Option<f64>,
  pub median_response_minutes:  Option<f64>,
  /// Percentage of called bookings where the caller was the expected setter.
  pub correct_setter_rate:      Option<f64>,
  pub by_setter:                Vec<SetterResponse>,
}

impl Attribution {
  pub fn summary(&self) -> AttributionSummary {
    let minutes: Vec<i64> = self
      .results
      .iter()
      .filter_map(|r| r.response_time_minutes)
      .collect();
    let called = self.results.iter().filter(|r| r.called).count() as u32;
    let correct = self
      .results
      .iter()
      .filter(|r| r.correct_setter == Some(true))
      .count() as u32;
    let window_start = self.window.map(|w| w.range().from);
    let window_truncated = self
      .results
      .iter()
      .filter(|r| window_start.is_some_and(|start| r.book_date < start))
      .count() as u32;

    let mut per_setter: BTreeMap<&str, (&str, u32, Vec<i64>)> = BTreeMap::new();
    for r in &self.results {
      let entry = per_setter
        .entry(r.setter_id.as_str())
        .or_insert((r.expected_setter.as_str(), 0, Vec::new()));
      entry.1 += 1;
      if let Some(m) = r.response_time_minutes {
        entry.2.push(m);
      }
    }
    let by_setter = per_setter
      .into_iter()
      .map(|(id, (name, bookings, mins))| SetterResponse {
        setter_id: id.to_owned(),
        setter_name: name.to_owned(),
        bookings,
        called: mins.len() as u32,
        average_response_minutes: mean(&mins),
      })
      .collect();

    AttributionSummary {
      total: self.results.len() as u32,
      called,
      not_called: self.results.len() as u32 - called,
      skipped: self.skipped,
      window_truncated,
      average_response_minutes: mean(&minutes),
      median_response_minutes: median(minutes),
      correct_setter_rate: percentage(correct, called),
      by_setter,
    }
  }
}

fn mean(values: &[i64]) -> Option<f64> {
  (!values.is_empty()).then(|| values.iter().sum::<i64>() as f64 / values.len() as f64)
}

fn median(mut values: Vec<i64>) -> Option<f64> {
  if values.is_empty() {
    return None;
  }
  values.sort_unstable();
  let mid = values.len() / 2;
  Some(if values.len() % 2 == 0 {
    (values[mid - 1] + values[mid]) as f64 / 2.0
  } else {
    values[mid] as f64
  })
}
