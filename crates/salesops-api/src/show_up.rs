//! Handler for `GET /show-up`.

use axum::{
  Json,
  extract::{Query, State},
};
use chrono::NaiveDate;
use salesops_core::{
  call_log::CallLogSource,
  dedup::dedup_reschedules,
  metrics::{SegmentedShowUp, ShowUpCounts},
  store::{BookingQuery, SalesStore},
};
use serde::Serialize;

use crate::{ApiState, degrade::Degraded, error::ApiError, params::RangeParams};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentStats {
  pub confirmed:    u32,
  pub showed_up:    u32,
  pub show_up_rate: Option<f64>,
}

impl From<ShowUpCounts> for SegmentStats {
  fn from(c: ShowUpCounts) -> Self {
    Self {
      confirmed:    c.confirmed,
      showed_up:    c.showed_up,
      show_up_rate: c.rate(),
    }
  }
}

/// Show-up statistics for calls scheduled in a day range.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowUpReport {
  pub from:    NaiveDate,
  pub to:      NaiveDate,
  /// Deduplicated bookings with a `call_date` in the range.
  pub calls:   u32,
  pub all:     SegmentStats,
  pub organic: SegmentStats,
  pub ads:     SegmentStats,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error:   Option<String>,
}

/// `GET /show-up[?from=YYYY-MM-DD][&to=YYYY-MM-DD]`
pub async fn handler<S, T>(
  State(state): State<ApiState<S, T>>,
  Query(params): Query<RangeParams>,
) -> Result<Json<ShowUpReport>, ApiError>
where
  S: SalesStore,
  T: CallLogSource,
{
  let range = params.resolve()?;
  let query = BookingQuery::scheduled_in(range.instants());

  let mut degraded = Degraded::default();
  let rows = degraded.take("scheduled calls", state.store.bookings(&query).await);

  let kept = dedup_reschedules(&rows);
  let stats = SegmentedShowUp::tally(kept.iter().copied());

  Ok(Json(ShowUpReport {
    from:    range.from,
    to:      range.to,
    calls:   kept.len() as u32,
    all:     stats.all.into(),
    organic: stats.organic.into(),
    ads:     stats.ads.into(),
    error:   degraded.message(),
  }))
}
