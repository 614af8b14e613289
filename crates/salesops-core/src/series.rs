//! The per-day management series.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
  booking::{Booking, OutcomeLogEntry},
  day::{day_bounds, day_of},
  dedup::dedup_reschedules,
  metrics::{SegmentedShowUp, count_purchases},
};

pub const DEFAULT_DAYS: u32 = 7;
pub const MAX_DAYS: u32 = 90;

/// Clamp a requested series length to `1..=90`, defaulting to 7.
pub fn clamp_days(requested: Option<i64>) -> u32 {
  match requested {
    Some(n) => n.clamp(1, i64::from(MAX_DAYS)) as u32,
    None => DEFAULT_DAYS,
  }
}

/// One day of the series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayPoint {
  pub date:                 NaiveDate,
  pub show_up_rate:         Option<f64>,
  pub show_up_rate_organic: Option<f64>,
  pub show_up_rate_ads:     Option<f64>,
  pub total_showed_up:      u32,
  pub total_confirmed:      u32,
  pub total_purchased:      u32,
  pub bookings:             u32,
  pub bookings_organic:     u32,
  pub bookings_ads:         u32,
  pub bookings_rescheduled: u32,
  pub calls:                u32,
  /// Set when one of the inputs could not be fetched.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub error:                Option<String>,
}

impl DayPoint {
  /// A day with no data: zero counts and no rates.
  pub fn empty(date: NaiveDate) -> Self {
    Self {
      date,
      show_up_rate: None,
      show_up_rate_organic: None,
      show_up_rate_ads: None,
      total_showed_up: 0,
      total_confirmed: 0,
      total_purchased: 0,
      bookings: 0,
      bookings_organic: 0,
      bookings_ads: 0,
      bookings_rescheduled: 0,
      calls: 0,
      error: None,
    }
  }
}

/// Rows fetched for the whole series window.
#[derive(Debug, Clone, Default)]
pub struct SeriesInput {
  /// Bookings whose `book_date` falls in the window.
  pub booked:    Vec<Booking>,
  /// Bookings whose `call_date` falls in the window.
  pub scheduled: Vec<Booking>,
  /// Outcomes whose `purchase_date` falls in the window.
  pub outcomes:  Vec<OutcomeLogEntry>,
}

/// Build one [`DayPoint`] per entry of `days`, in the same order.
///
/// Rows are bucketed by UTC day and deduplicated per bucket, the same as
/// issuing one store query per day.
pub fn build_series(days: &[NaiveDate], input: &SeriesInput) -> Vec<DayPoint> {
  let booked = bucket(&input.booked, |b| Some(day_of(b.book_date)));
  let scheduled = bucket(&input.scheduled, |b| b.call_date.map(day_of));

  days
    .iter()
    .map(|&date| {
      let mut point = DayPoint::empty(date);

      if let Some(rows) = booked.get(&date) {
        let kept = dedup_reschedules(rows.iter().copied());
        point.bookings = kept.len() as u32;
        point.bookings_ads = kept.iter().filter(|b| b.is_paid()).count() as u32;
        point.bookings_organic = point.bookings - point.bookings_ads;
        point.bookings_rescheduled = rows.iter().filter(|b| b.is_reschedule).count() as u32;
      }

      if let Some(rows) = scheduled.get(&date) {
        let kept = dedup_reschedules(rows.iter().copied());
        let show = SegmentedShowUp::tally(kept.iter().copied());
        point.calls = kept.len() as u32;
        point.total_confirmed = show.all.confirmed;
        point.total_showed_up = show.all.showed_up;
        point.show_up_rate = show.all.rate();
        point.show_up_rate_organic = show.organic.rate();
        point.show_up_rate_ads = show.ads.rate();
      }

      point.total_purchased = count_purchases(&input.outcomes, day_bounds(date));
      point
    })
    .collect()
}

fn bucket<'a>(
  rows: &'a [Booking],
  day: impl Fn(&Booking) -> Option<NaiveDate>,
) -> HashMap<NaiveDate, Vec<&'a Booking>> {
  let mut out: HashMap<NaiveDate, Vec<&Booking>> = HashMap::new();
  for b in rows {
    if let Some(d) = day(b) {
      out.entry(d).or_default().push(b);
    }
  }
  out
}
