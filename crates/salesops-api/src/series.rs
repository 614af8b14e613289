//! Handler for `GET /series`.

use axum::{
  Json,
  extract::{Query, State},
};
use salesops_core::{
  call_log::CallLogSource,
  day::{TimeRange, last_n_days, today_utc},
  series::{DayPoint, SeriesInput, build_series, clamp_days},
  store::{BookingQuery, OutcomeQuery, SalesStore},
};
use serde::Deserialize;

use crate::{ApiState, degrade::Degraded, error::ApiError, params::optional_day};

#[derive(Debug, Default, Deserialize)]
pub struct SeriesParams {
  /// Number of days, clamped to 1–90. Unparsable values fall back to 7.
  pub days: Option<String>,
  /// Last day of the series; defaults to today (UTC).
  pub end:  Option<String>,
}

/// `GET /series[?days=N][&end=YYYY-MM-DD]`
///
/// Always returns one entry per day. When a source could not be read every
/// entry carries the same `error` text.
pub async fn handler<S, T>(
  State(state): State<ApiState<S, T>>,
  Query(params): Query<SeriesParams>,
) -> Result<Json<Vec<DayPoint>>, ApiError>
where
  S: SalesStore,
  T: CallLogSource,
{
  let requested = params.days.as_deref().and_then(|d| d.trim().parse::<i64>().ok());
  let end = optional_day(params.end.as_deref())?.unwrap_or_else(today_utc);
  let days = last_n_days(clamp_days(requested), end);
  let range = TimeRange::days(days[0], end)?;

  let booked_q = BookingQuery::booked_in(range);
  let scheduled_q = BookingQuery::scheduled_in(range);
  let outcomes_q = OutcomeQuery::purchased_in(range);

  let (booked, scheduled, outcomes) = tokio::join!(
    state.store.bookings(&booked_q),
    state.store.bookings(&scheduled_q),
    state.store.outcomes(&outcomes_q),
  );

  let mut degraded = Degraded::default();
  let input = SeriesInput {
    booked:    degraded.take("bookings", booked),
    scheduled: degraded.take("scheduled calls", scheduled),
    outcomes:  degraded.take("outcomes", outcomes),
  };

  let mut points = build_series(&days, &input);
  if let Some(message) = degraded.message() {
    for point in &mut points {
      point.error = Some(message.clone());
    }
  }
  Ok(Json(points))
}
