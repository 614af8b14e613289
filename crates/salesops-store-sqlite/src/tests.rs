//! Integration tests for `SqliteStore` against an in-memory database.

use chrono::{DateTime, NaiveDate, Utc};
use salesops_core::{
  booking::{Booking, Closer, Outcome, OutcomeLogEntry, Setter},
  day::TimeRange,
  store::{BookingOrder, BookingQuery, OutcomeQuery, SalesStore},
};

use crate::{Snapshot, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn ts(s: &str) -> DateTime<Utc> { s.parse().unwrap() }

fn days(from: &str, to: &str) -> TimeRange {
  TimeRange::days(
    from.parse::<NaiveDate>().unwrap(),
    to.parse::<NaiveDate>().unwrap(),
  )
  .unwrap()
}

fn booking(id: i64, lead: &str, booked: &str) -> Booking {
  Booking::new(id, lead, ts(booked))
}

// ─── Bookings ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn booking_round_trips_every_column() {
  let s = store().await;
  let mut b = booking(7, "L7", "2025-01-01T10:00:00Z");
  b.phone = Some("+1 555 111 2222".into());
  b.call_date = Some(ts("2025-01-03T15:30:00Z"));
  b.setter_id = Some("s1".into());
  b.closer_id = Some("c1".into());
  b.is_reschedule = true;
  b.source_type = Some("Facebook Ads".into());
  b.utm_source = Some("null".into());
  b.confirmed = true;
  b.showed_up = true;
  s.insert_booking(b.clone()).await.unwrap();

  let rows = s.bookings(&BookingQuery::default()).await.unwrap();
  assert_eq!(rows, vec![b]);
}

#[tokio::test]
async fn day_range_includes_both_edges() {
  let s = store().await;
  s.insert_booking(booking(1, "L1", "2025-01-01T00:00:00Z")).await.unwrap();
  s.insert_booking(booking(2, "L2", "2025-01-01T23:59:59.999Z")).await.unwrap();
  s.insert_booking(booking(3, "L3", "2025-01-02T00:00:00Z")).await.unwrap();
  s.insert_booking(booking(4, "L4", "2024-12-31T23:59:59.999Z")).await.unwrap();

  let rows = s
    .bookings(&BookingQuery::booked_in(days("2025-01-01", "2025-01-01")))
    .await
    .unwrap();
  let ids: Vec<i64> = rows.iter().map(|b| b.id).collect();
  assert_eq!(ids, vec![1, 2]);
}

#[tokio::test]
async fn scheduled_range_skips_rows_without_call_date() {
  let s = store().await;
  let mut with = booking(1, "L1", "2025-01-01T09:00:00Z");
  with.call_date = Some(ts("2025-01-05T12:00:00Z"));
  s.insert_booking(with).await.unwrap();
  s.insert_booking(booking(2, "L2", "2025-01-05T09:00:00Z")).await.unwrap();

  let rows = s
    .bookings(&BookingQuery::scheduled_in(days("2025-01-05", "2025-01-05")))
    .await
    .unwrap();
  assert_eq!(rows.len(), 1);
  assert_eq!(rows[0].id, 1);
}

#[tokio::test]
async fn filters_combine() {
  let s = store().await;
  let mut a = booking(1, "L1", "2025-01-01T09:00:00Z");
  a.setter_id = Some("s1".into());
  a.source_type = Some("Google ADS".into());
  let mut b = booking(2, "L2", "2025-01-01T10:00:00Z");
  b.setter_id = Some("s2".into());
  b.source_type = Some("organic".into());
  let mut c = booking(3, "L3", "2025-01-01T11:00:00Z");
  c.setter_id = Some("s1".into());
  c.source_type = Some("ads".into());
  c.is_reschedule = true;
  for row in [a, b, c] {
    s.insert_booking(row).await.unwrap();
  }

  let query = BookingQuery {
    setter_ids: vec!["s1".into(), "s3".into()],
    source_type_like: Some("Ad".into()),
    is_reschedule: Some(false),
    ..BookingQuery::default()
  };
  let rows = s.bookings(&query).await.unwrap();
  assert_eq!(rows.len(), 1);
  assert_eq!(rows[0].id, 1);

  let by_lead = BookingQuery {
    lead_ids: vec!["L2".into(), "L3".into()],
    ..BookingQuery::default()
  };
  assert_eq!(s.bookings(&by_lead).await.unwrap().len(), 2);
}

#[tokio::test]
async fn order_and_limit_apply() {
  let s = store().await;
  s.insert_booking(booking(1, "L1", "2025-01-01T09:00:00Z")).await.unwrap();
  s.insert_booking(booking(2, "L2", "2025-01-03T09:00:00Z")).await.unwrap();
  s.insert_booking(booking(3, "L3", "2025-01-02T09:00:00Z")).await.unwrap();

  let query = BookingQuery {
    order: BookingOrder::BookDateDesc,
    limit: Some(2),
    ..BookingQuery::default()
  };
  let ids: Vec<i64> = s.bookings(&query).await.unwrap().iter().map(|b| b.id).collect();
  assert_eq!(ids, vec![2, 3]);
}

// ─── Outcomes ────────────────────────────────────────────────────────────────

fn outcome(id: i64, call_id: i64, outcome: &str, purchased: &str) -> OutcomeLogEntry {
  OutcomeLogEntry {
    id,
    outcome: Outcome::from(outcome.to_owned()),
    clawback: None,
    purchase_date: Some(ts(purchased)),
    call_id: Some(call_id),
  }
}

#[tokio::test]
async fn outcomes_filter_by_purchase_date_and_call() {
  let s = store().await;
  let mut partial = outcome(2, 10, "refund", "2025-01-01T12:00:00Z");
  partial.clawback = Some(50.0);
  s.insert_outcome(outcome(1, 10, "yes", "2025-01-01T09:00:00Z")).await.unwrap();
  s.insert_outcome(partial.clone()).await.unwrap();
  s.insert_outcome(outcome(3, 11, "yes", "2025-01-02T09:00:00Z")).await.unwrap();

  let in_day = s
    .outcomes(&OutcomeQuery::purchased_in(days("2025-01-01", "2025-01-01")))
    .await
    .unwrap();
  assert_eq!(in_day.len(), 2);
  assert_eq!(in_day[1], partial);

  let by_call = OutcomeQuery { call_ids: vec![11], ..OutcomeQuery::default() };
  let rows = s.outcomes(&by_call).await.unwrap();
  assert_eq!(rows.len(), 1);
  assert_eq!(rows[0].outcome, Outcome::Yes);
}

// ─── Staff ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn staff_lists_are_sorted_by_name() {
  let s = store().await;
  s.insert_setter(Setter { id: "2".into(), name: "Zoe".into(), active: true }).await.unwrap();
  s.insert_setter(Setter { id: "1".into(), name: "Abe".into(), active: false }).await.unwrap();
  s.insert_closer(Closer { id: "c".into(), name: "Cal".into(), active: true }).await.unwrap();

  let setters = s.setters().await.unwrap();
  assert_eq!(setters[0].name, "Abe");
  assert!(!setters[0].active);
  assert_eq!(s.closers().await.unwrap().len(), 1);
}

// ─── Snapshot import ─────────────────────────────────────────────────────────

const SNAPSHOT: &str = r#"{
  "calls": [
    {"id": 1, "lead_id": 100, "book_date": "2025-01-01T10:00:00+00:00",
     "setter_id": 5, "is_reschedule": null, "confirmed": null},
    {"id": 2, "lead_id": "100", "book_date": "2025-01-02T10:00:00Z",
     "is_reschedule": true}
  ],
  "outcome_log": [
    {"id": 9, "outcome": "yes", "purchase_date": "2025-01-03T10:00:00Z", "call_id": 1}
  ],
  "setters": [{"id": 5, "name": "Sam", "active": null}]
}"#;

#[tokio::test]
async fn import_loads_rest_shaped_rows() {
  let s = store().await;
  let snapshot = Snapshot::from_json(SNAPSHOT).unwrap();
  assert_eq!(snapshot.len(), 4);

  let summary = s.import(snapshot).await.unwrap();
  assert_eq!(summary.calls, 2);
  assert_eq!(summary.closers, 0);

  let rows = s.bookings(&BookingQuery::default()).await.unwrap();
  assert_eq!(rows[0].lead_id, "100");
  assert_eq!(rows[0].setter_id.as_deref(), Some("5"));
  assert!(!rows[0].is_reschedule);
  assert!(rows[1].is_reschedule);

  let setters = s.setters().await.unwrap();
  assert!(setters[0].active);
}

#[tokio::test]
async fn import_is_idempotent() {
  let s = store().await;
  s.import(Snapshot::from_json(SNAPSHOT).unwrap()).await.unwrap();
  s.import(Snapshot::from_json(SNAPSHOT).unwrap()).await.unwrap();

  assert_eq!(s.bookings(&BookingQuery::default()).await.unwrap().len(), 2);
  assert_eq!(s.outcomes(&OutcomeQuery::default()).await.unwrap().len(), 1);
}
