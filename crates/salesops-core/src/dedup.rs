//! Reschedule deduplication.
//!
//! A rescheduled lead has an original row plus one row per reschedule. Every
//! statistical view counts such a lead through its reschedule rows only, so
//! all views share [`dedup_reschedules`] and agree with each other.

use std::collections::HashSet;

use crate::booking::Booking;

/// Drop original rows whose lead also has a reschedule row in `bookings`.
///
/// Reschedule rows and leads without any reschedule are always kept. Input
/// order is preserved.
pub fn dedup_reschedules<'a, I>(bookings: I) -> Vec<&'a Booking>
where
  I: IntoIterator<Item = &'a Booking>,
  I::IntoIter: Clone,
{
  let rows = bookings.into_iter();
  let rescheduled: HashSet<&str> = rows
    .clone()
    .filter(|b| b.is_reschedule)
    .map(|b| b.lead_id.as_str())
    .collect();

  rows
    .filter(|b| b.is_reschedule || !rescheduled.contains(b.lead_id.as_str()))
    .collect()
}

/// Whether a row can be attributed to a traffic source.
///
/// A reschedule row whose `utm_source` is NULL carries no campaign signal of
/// its own. The literal string `"null"` is a real value and stays.
pub fn source_attributable(booking: &Booking) -> bool {
  !(booking.is_reschedule && booking.utm_source.is_none())
}

/// The rows a UTM/source view counts: deduplicated, attributable, organic.
pub fn source_view<'a, I>(bookings: I) -> Vec<&'a Booking>
where
  I: IntoIterator<Item = &'a Booking>,
  I::IntoIter: Clone,
{
  dedup_reschedules(bookings)
    .into_iter()
    .filter(|b| source_attributable(b) && !b.is_paid())
    .collect()
}
