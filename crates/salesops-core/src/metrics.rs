//! Show-up and purchase metrics shared by every view.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::{
  booking::{Booking, OutcomeLogEntry},
  day::TimeRange,
};

// ─── Rates ───────────────────────────────────────────────────────────────────

/// `numerator / denominator * 100`, or `None` when the denominator is zero.
///
/// `None` means "no data" and must be shown as such, never as 0%.
pub fn percentage(numerator: u32, denominator: u32) -> Option<f64> {
  (denominator > 0).then(|| f64::from(numerator) / f64::from(denominator) * 100.0)
}

// ─── Show-up ─────────────────────────────────────────────────────────────────

/// Confirmed and showed-up counts over an already deduplicated row set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowUpCounts {
  pub confirmed: u32,
  pub showed_up: u32,
}

impl ShowUpCounts {
  pub fn tally<'a>(rows: impl IntoIterator<Item = &'a Booking>) -> Self {
    rows.into_iter().fold(Self::default(), |mut acc, b| {
      acc.confirmed += u32::from(b.confirmed);
      acc.showed_up += u32::from(b.showed_up);
      acc
    })
  }

  pub fn rate(&self) -> Option<f64> { percentage(self.showed_up, self.confirmed) }
}

/// Show-up counts split into all / organic / paid traffic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SegmentedShowUp {
  pub all:     ShowUpCounts,
  pub organic: ShowUpCounts,
  pub ads:     ShowUpCounts,
}

impl SegmentedShowUp {
  pub fn tally<'a>(rows: impl IntoIterator<Item = &'a Booking>) -> Self {
    let mut out = Self::default();
    for b in rows {
      let single = ShowUpCounts::tally([b]);
      let segment = if b.is_paid() { &mut out.ads } else { &mut out.organic };
      segment.confirmed += single.confirmed;
      segment.showed_up += single.showed_up;
      out.all.confirmed += single.confirmed;
      out.all.showed_up += single.showed_up;
    }
    out
  }
}

// ─── Purchases ───────────────────────────────────────────────────────────────

/// Keep only the latest (highest `id`) entry per `call_id`.
///
/// Entries without a `call_id` cannot collide and are all kept. The result
/// is ordered by `id`, independent of input order.
pub fn latest_outcomes<'a>(
  entries: impl IntoIterator<Item = &'a OutcomeLogEntry>,
) -> Vec<&'a OutcomeLogEntry> {
  let mut by_call: HashMap<i64, &OutcomeLogEntry> = HashMap::new();
  let mut unlinked = Vec::new();
  for entry in entries {
    match entry.call_id {
      Some(call_id) => {
        by_call
          .entry(call_id)
          .and_modify(|kept| {
            if entry.id > kept.id {
              *kept = entry;
            }
          })
          .or_insert(entry);
      }
      None => unlinked.push(entry),
    }
  }
  let mut out: Vec<_> = by_call.into_values().chain(unlinked).collect();
  out.sort_by_key(|e| e.id);
  out
}

/// Count purchases whose `purchase_date` falls in `range`.
///
/// Order of operations: restrict to the range, keep the latest entry per
/// call, then apply the counting rule.
pub fn count_purchases(entries: &[OutcomeLogEntry], range: TimeRange) -> u32 {
  let in_range = entries
    .iter()
    .filter(|e| e.purchase_date.is_some_and(|at| range.contains(at)));
  latest_outcomes(in_range)
    .into_iter()
    .filter(|e| e.is_counted_purchase())
    .count() as u32
}

/// The `call_id`s whose latest outcome is a counted purchase.
pub fn purchased_call_ids(entries: &[OutcomeLogEntry]) -> HashSet<i64> {
  latest_outcomes(entries)
    .into_iter()
    .filter(|e| e.is_counted_purchase())
    .filter_map(|e| e.call_id)
    .collect()
}

#[cfg(test)]
mod tests {
  use chrono::{DateTime, TimeZone, Utc};

  use super::*;
  use crate::{booking::Outcome, day::day_bounds};

  fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, day, hour, 0, 0).unwrap()
  }

  fn outcome(id: i64, call_id: i64, outcome: &str, clawback: Option<f64>) -> OutcomeLogEntry {
    OutcomeLogEntry {
      id,
      outcome: Outcome::from(outcome.to_owned()),
      clawback,
      purchase_date: Some(at(10, 12)),
      call_id: Some(call_id),
    }
  }

  #[test]
  fn rate_is_none_without_confirmed_calls() {
    let counts = ShowUpCounts { confirmed: 0, showed_up: 3 };
    assert_eq!(counts.rate(), None);
    assert_eq!(ShowUpCounts::default().rate(), None);
  }

  #[test]
  fn rate_is_percentage_of_confirmed() {
    let counts = ShowUpCounts { confirmed: 4, showed_up: 3 };
    assert_eq!(counts.rate(), Some(75.0));
  }

  #[test]
  fn segmented_tally_splits_paid_rows() {
    let mut organic = Booking::new(1, "L1", at(10, 9));
    organic.confirmed = true;
    organic.showed_up = true;
    let mut paid = Booking::new(2, "L2", at(10, 9));
    paid.source_type = Some("ad".into());
    paid.confirmed = true;

    let rows = [organic, paid];
    let seg = SegmentedShowUp::tally(&rows);
    assert_eq!(seg.all, ShowUpCounts { confirmed: 2, showed_up: 1 });
    assert_eq!(seg.organic.rate(), Some(100.0));
    assert_eq!(seg.ads.rate(), Some(0.0));
  }

  #[test]
  fn latest_outcome_wins_regardless_of_order() {
    let forward = vec![outcome(5, 9, "yes", None), outcome(7, 9, "refund", None)];
    let backward = vec![outcome(7, 9, "refund", None), outcome(5, 9, "yes", None)];
    for entries in [forward, backward] {
      let latest = latest_outcomes(&entries);
      assert_eq!(latest.len(), 1);
      assert_eq!(latest[0].id, 7);
      assert_eq!(count_purchases(&entries, day_bounds(at(10, 0).date_naive())), 0);
    }
  }

  #[test]
  fn partial_clawback_refund_still_counts() {
    let entries = vec![outcome(1, 1, "yes", None), outcome(2, 2, "refund", Some(30.0))];
    assert_eq!(count_purchases(&entries, day_bounds(at(10, 0).date_naive())), 2);
    assert_eq!(purchased_call_ids(&entries).len(), 2);
  }

  #[test]
  fn purchases_outside_range_are_ignored() {
    let entries = vec![outcome(1, 1, "yes", None)];
    assert_eq!(count_purchases(&entries, day_bounds(at(11, 0).date_naive())), 0);
  }
}
