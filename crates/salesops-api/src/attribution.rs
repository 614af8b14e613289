//! Handler for `GET /attribution`.
//!
//! Matches the bookings made in a day range against outbound calls from the
//! telephony provider. The provider is optional: without it the response
//! omits `results` and `summary` and explains why in `error`.

use axum::{
  Json,
  extract::{Query, State},
};
use chrono::NaiveDate;
use salesops_core::{
  attribution::{AttributionResult, AttributionSummary, AttributionWindow, Reconciler},
  call_log::{CallLogSource, CallerDirectory},
  day::today_utc,
  store::{BookingQuery, SalesStore},
};
use serde::{Deserialize, Serialize};

use crate::{
  ApiState,
  degrade::Degraded,
  error::ApiError,
  params::{RangeParams, optional_day},
};

pub const TELEPHONY_DISABLED: &str = "telephony provider is not configured";

#[derive(Debug, Default, Deserialize)]
pub struct AttributionParams {
  pub from: Option<String>,
  pub to:   Option<String>,
  /// Last day of call history consulted; defaults to today (UTC).
  pub end:  Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributionReport {
  pub from:    NaiveDate,
  pub to:      NaiveDate,
  pub end:     NaiveDate,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub window:  Option<AttributionWindow>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub results: Option<Vec<AttributionResult>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub summary: Option<AttributionSummary>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error:   Option<String>,
}

/// `GET /attribution[?from=..][&to=..][&end=..]`
pub async fn handler<S, T>(
  State(state): State<ApiState<S, T>>,
  Query(params): Query<AttributionParams>,
) -> Result<Json<AttributionReport>, ApiError>
where
  S: SalesStore,
  T: CallLogSource,
{
  let range = RangeParams { from: params.from, to: params.to }.resolve()?;
  let end = optional_day(params.end.as_deref())?.unwrap_or_else(today_utc);

  let mut report = AttributionReport {
    from: range.from,
    to: range.to,
    end,
    window: None,
    results: None,
    summary: None,
    error: None,
  };

  let Some(telephony) = state.telephony.as_deref() else {
    report.error = Some(TELEPHONY_DISABLED.to_owned());
    return Ok(Json(report));
  };

  let query = BookingQuery::booked_in(range.instants());
  let (bookings, setters, directory) = tokio::join!(
    state.store.bookings(&query),
    state.store.setters(),
    telephony.directory(),
  );

  let mut degraded = Degraded::default();
  let bookings = degraded.take("bookings", bookings);
  let setters = degraded.take("setters", setters);
  let directory: CallerDirectory = degraded.take("caller directory", directory);

  let reconciler = Reconciler::new(directory, &setters).with_lookback_days(state.lookback_days);
  let calls = match reconciler.window(&bookings, end) {
    Some(w) => degraded.take("call logs", telephony.outbound_calls(w.from, w.to).await),
    None => Vec::new(),
  };

  let attribution = reconciler.reconcile(&bookings, &calls, end);
  tracing::debug!(
    bookings = bookings.len(),
    calls = calls.len(),
    skipped = attribution.skipped,
    "reconciled call logs"
  );

  report.window = attribution.window;
  report.summary = Some(attribution.summary());
  report.results = Some(attribution.results);
  report.error = degraded.message();
  Ok(Json(report))
}
