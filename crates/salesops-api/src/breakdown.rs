//! Handler for `GET /breakdown`.

use axum::{
  Json,
  extract::{Query, State},
};
use chrono::NaiveDate;
use salesops_core::{
  booking::OutcomeLogEntry,
  breakdown::{BreakdownRow, Dimension, breakdown, label_rows},
  call_log::CallLogSource,
  store::{BookingQuery, OutcomeQuery, SalesStore},
};
use serde::{Deserialize, Serialize};

use crate::{ApiState, degrade::Degraded, error::ApiError, params::RangeParams};

/// Booking ids per outcome lookup; keeps `in.(...)` filters a sane length.
const OUTCOME_CHUNK: usize = 200;

#[derive(Debug, Default, Deserialize)]
pub struct BreakdownParams {
  /// `source`, `medium`, `campaign`, `setter`, or `closer`; defaults to
  /// `source`.
  pub dimension: Option<String>,
  pub from:      Option<String>,
  pub to:        Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakdownReport {
  pub dimension: Dimension,
  pub from:      NaiveDate,
  pub to:        NaiveDate,
  pub rows:      Vec<BreakdownRow>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error:     Option<String>,
}

/// `GET /breakdown[?dimension=..][&from=YYYY-MM-DD][&to=YYYY-MM-DD]`
///
/// Groups the bookings made in the range. Purchases are looked up by booking
/// id, so a sale recorded after the range still counts for its booking.
pub async fn handler<S, T>(
  State(state): State<ApiState<S, T>>,
  Query(params): Query<BreakdownParams>,
) -> Result<Json<BreakdownReport>, ApiError>
where
  S: SalesStore,
  T: CallLogSource,
{
  let dimension: Dimension = match params.dimension.as_deref().map(str::trim) {
    None | Some("") => Dimension::Source,
    Some(raw) => raw.parse()?,
  };
  let range = RangeParams { from: params.from, to: params.to }.resolve()?;
  let query = BookingQuery::booked_in(range.instants());

  let (bookings, names) = tokio::join!(
    state.store.bookings(&query),
    staff_names(state.store.as_ref(), dimension),
  );

  let mut degraded = Degraded::default();
  let bookings = degraded.take("bookings", bookings);
  let names = degraded.take("staff names", names);

  let ids: Vec<i64> = bookings.iter().map(|b| b.id).collect();
  let outcomes = degraded.take("outcomes", outcomes_for(state.store.as_ref(), &ids).await);

  let mut rows = breakdown(&bookings, &outcomes, dimension);
  if !dimension.is_source() {
    label_rows(&mut rows, names.iter().map(|(id, name)| (id.as_str(), name.as_str())));
  }

  Ok(Json(BreakdownReport {
    dimension,
    from: range.from,
    to: range.to,
    rows,
    error: degraded.message(),
  }))
}

/// `(id, name)` pairs for the staff table behind `dimension`, if any.
async fn staff_names<S: SalesStore>(
  store: &S,
  dimension: Dimension,
) -> Result<Vec<(String, String)>, S::Error> {
  Ok(match dimension {
    Dimension::Setter => store.setters().await?.into_iter().map(|s| (s.id, s.name)).collect(),
    Dimension::Closer => store.closers().await?.into_iter().map(|c| (c.id, c.name)).collect(),
    _ => Vec::new(),
  })
}

async fn outcomes_for<S: SalesStore>(
  store: &S,
  call_ids: &[i64],
) -> Result<Vec<OutcomeLogEntry>, S::Error> {
  let mut out = Vec::new();
  for chunk in call_ids.chunks(OUTCOME_CHUNK) {
    let query = OutcomeQuery { call_ids: chunk.to_vec(), ..OutcomeQuery::default() };
    out.extend(store.outcomes(&query).await?);
  }
  Ok(out)
}
