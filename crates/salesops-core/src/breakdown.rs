//! Grouped statistics by traffic source or setter.

use std::{collections::HashMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
  Error,
  booking::{Booking, OutcomeLogEntry},
  dedup::{dedup_reschedules, source_view},
  metrics::{ShowUpCounts, percentage, purchased_call_ids},
};

/// The column a breakdown groups by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
  Source,
  Medium,
  Campaign,
  Setter,
  Closer,
}

impl Dimension {
  fn key(self, booking: &Booking) -> Option<String> {
    match self {
      Self::Source => booking.utm_source.clone(),
      Self::Medium => booking.utm_medium.clone(),
      Self::Campaign => booking.utm_campaign.clone(),
      Self::Setter => booking.setter_id.clone(),
      Self::Closer => booking.closer_id.clone(),
    }
  }

  /// UTM dimensions attribute traffic; the staff dimensions do not.
  pub fn is_source(self) -> bool { !matches!(self, Self::Setter | Self::Closer) }
}

impl FromStr for Dimension {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "source" | "utm_source" => Ok(Self::Source),
      "medium" | "utm_medium" => Ok(Self::Medium),
      "campaign" | "utm_campaign" => Ok(Self::Campaign),
      "setter" | "setter_id" => Ok(Self::Setter),
      "closer" | "closer_id" => Ok(Self::Closer),
      other => Err(Error::UnknownDimension(other.to_owned())),
    }
  }
}

impl fmt::Display for Dimension {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::Source => "source",
      Self::Medium => "medium",
      Self::Campaign => "campaign",
      Self::Setter => "setter",
      Self::Closer => "closer",
    })
  }
}

/// Statistics for one group.
///
/// `key` is `None` for rows where the grouped column is NULL, which is not
/// the same group as the literal string `"null"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreakdownRow {
  pub key:             Option<String>,
  /// Display name for staff keys, filled in by [`label_rows`].
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub label:           Option<String>,
  pub bookings:        u32,
  pub confirmed:       u32,
  pub showed_up:       u32,
  pub show_up_rate:    Option<f64>,
  pub purchased:       u32,
  /// Purchases per showed-up call, in percent.
  pub conversion_rate: Option<f64>,
}

/// Group `bookings` by `dimension`.
///
/// Source dimensions count [`source_view`] rows (deduplicated, attributable,
/// organic); staff dimensions count [`dedup_reschedules`] rows. A
/// booking is purchased when the latest outcome for it is a counted purchase.
/// Rows come out by descending booking count, then key.
pub fn breakdown(
  bookings: &[Booking],
  outcomes: &[OutcomeLogEntry],
  dimension: Dimension,
) -> Vec<BreakdownRow> {
  let rows = if dimension.is_source() {
    source_view(bookings)
  } else {
    dedup_reschedules(bookings)
  };
  let purchased = purchased_call_ids(outcomes);

  let mut groups: HashMap<Option<String>, Vec<&Booking>> = HashMap::new();
  for b in rows {
    groups.entry(dimension.key(b)).or_default().push(b);
  }

  let mut out: Vec<BreakdownRow> = groups
    .into_iter()
    .map(|(key, members)| {
      let counts = ShowUpCounts::tally(members.iter().copied());
      let bought = members.iter().filter(|b| purchased.contains(&b.id)).count() as u32;
      BreakdownRow {
        key,
        label: None,
        bookings: members.len() as u32,
        confirmed: counts.confirmed,
        showed_up: counts.showed_up,
        show_up_rate: counts.rate(),
        purchased: bought,
        conversion_rate: percentage(bought, counts.showed_up),
      }
    })
    .collect();

  out.sort_by(|a, b| b.bookings.cmp(&a.bookings).then_with(|| a.key.cmp(&b.key)));
  out
}

/// Attach display names to staff keys; rows with unknown ids stay unlabelled.
pub fn label_rows<'a>(
  rows: &mut [BreakdownRow],
  names: impl IntoIterator<Item = (&'a str, &'a str)>,
) {
  let names: HashMap<&str, &str> = names.into_iter().collect();
  for row in rows {
    row.label = row
      .key
      .as_deref()
      .and_then(|k| names.get(k))
      .map(|n| (*n).to_owned());
  }
}

#[cfg(test)]
mod tests {
  use chrono::{TimeZone, Utc};

  use super::*;
  use crate::booking::Outcome;

  fn booking(id: i64, lead: &str, source: Option<&str>) -> Booking {
    let mut b = Booking::new(id, lead, Utc.with_ymd_and_hms(2025, 2, 1, 9, 0, 0).unwrap());
    b.utm_source = source.map(Into::into);
    b.setter_id = Some("s1".into());
    b
  }

  fn purchase(id: i64, call_id: i64) -> OutcomeLogEntry {
    OutcomeLogEntry {
      id,
      outcome: Outcome::Yes,
      clawback: None,
      purchase_date: None,
      call_id: Some(call_id),
    }
  }

  #[test]
  fn null_and_literal_null_are_separate_groups() {
    let rows = vec![
      booking(1, "L1", None),
      booking(2, "L2", Some("null")),
      booking(3, "L3", Some("null")),
    ];
    let out = breakdown(&rows, &[], Dimension::Source);
    assert_eq!(out.len(), 2);
    assert_eq!(out[0].key.as_deref(), Some("null"));
    assert_eq!(out[0].bookings, 2);
    assert_eq!(out[1].key, None);
    assert_eq!(out[1].bookings, 1);
  }

  #[test]
  fn source_breakdown_excludes_paid_and_bare_reschedules() {
    let mut paid = booking(1, "L1", Some("fb"));
    paid.source_type = Some("Paid Ads".into());
    let mut bare = booking(2, "L2", None);
    bare.is_reschedule = true;
    let organic = booking(3, "L3", Some("ig"));

    let out = breakdown(&[paid.clone(), bare.clone(), organic.clone()], &[], Dimension::Source);
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].key.as_deref(), Some("ig"));

    // The setter view only deduplicates.
    let by_setter = breakdown(&[paid, bare, organic], &[], Dimension::Setter);
    assert_eq!(by_setter[0].bookings, 3);
  }

  #[test]
  fn conversion_is_purchases_over_show_ups() {
    let mut a = booking(1, "L1", Some("ig"));
    a.confirmed = true;
    a.showed_up = true;
    let mut b = booking(2, "L2", Some("ig"));
    b.confirmed = true;
    b.showed_up = true;
    let c = booking(3, "L3", Some("ig"));

    let out = breakdown(&[a, b, c], &[purchase(10, 1)], Dimension::Source);
    let row = &out[0];
    assert_eq!(row.bookings, 3);
    assert_eq!(row.show_up_rate, Some(100.0));
    assert_eq!(row.purchased, 1);
    assert_eq!(row.conversion_rate, Some(50.0));
  }

  #[test]
  fn empty_group_rates_are_none() {
    let out = breakdown(&[booking(1, "L1", Some("ig"))], &[], Dimension::Source);
    assert_eq!(out[0].show_up_rate, None);
    assert_eq!(out[0].conversion_rate, None);
  }

  #[test]
  fn staff_rows_get_labels() {
    let mut unknown = booking(2, "L2", None);
    unknown.setter_id = Some("s9".into());
    let mut out = breakdown(&[booking(1, "L1", None), unknown], &[], Dimension::Setter);
    label_rows(&mut out, [("s1", "Sam")]);
    assert_eq!(out[0].label.as_deref(), Some("Sam"));
    assert_eq!(out[1].label, None);
  }

  #[test]
  fn parses_dimension_names() {
    assert_eq!("utm_campaign".parse::<Dimension>().unwrap(), Dimension::Campaign);
    assert_eq!("Setter".parse::<Dimension>().unwrap(), Dimension::Setter);
    assert!("country".parse::<Dimension>().is_err());
  }
}
