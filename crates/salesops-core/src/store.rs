//! The `SalesStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (`salesops-store-sqlite`, and
//! the PostgREST adapter in `salesops-providers`). Higher layers depend on
//! this abstraction, never on a concrete backend. The store is read-only from
//! this crate's point of view: rows are created and mutated elsewhere.

use std::future::Future;

use crate::{
  booking::{Booking, Closer, OutcomeLogEntry, Setter},
  day::TimeRange,
};

// ─── Query types ─────────────────────────────────────────────────────────────

/// Sort order for [`SalesStore::bookings`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BookingOrder {
  #[default]
  BookDateAsc,
  BookDateDesc,
  CallDateAsc,
}

/// Parameters for [`SalesStore::bookings`]. Every set filter must match.
#[derive(Debug, Clone, Default)]
pub struct BookingQuery {
  /// `book_date` within the range (inclusive).
  pub booked:           Option<TimeRange>,
  /// `call_date` within the range (inclusive).
  pub scheduled:        Option<TimeRange>,
  /// `setter_id IN (...)`; ignored when empty.
  pub setter_ids:       Vec<String>,
  /// `lead_id IN (...)`; ignored when empty.
  pub lead_ids:         Vec<String>,
  /// Case-insensitive substring match on `source_type`.
  pub source_type_like: Option<String>,
  pub is_reschedule:    Option<bool>,
  pub order:            BookingOrder,
  pub limit:            Option<usize>,
}

impl BookingQuery {
  pub fn booked_in(range: TimeRange) -> Self {
    Self { booked: Some(range), ..Self::default() }
  }

  pub fn scheduled_in(range: TimeRange) -> Self {
    Self {
      scheduled: Some(range),
      order: BookingOrder::CallDateAsc,
      ..Self::default()
    }
  }
}

/// Parameters for [`SalesStore::outcomes`].
#[derive(Debug, Clone, Default)]
pub struct OutcomeQuery {
  /// `purchase_date` within the range (inclusive).
  pub purchased: Option<TimeRange>,
  /// `call_id IN (...)`; ignored when empty.
  pub call_ids:  Vec<i64>,
  pub limit:     Option<usize>,
}

impl OutcomeQuery {
  pub fn purchased_in(range: TimeRange) -> Self {
    Self { purchased: Some(range), ..Self::default() }
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Read access to the sales tables.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`). Implementations
/// return every matching row, paging internally if the backend caps result
/// sizes.
pub trait SalesStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Rows of `calls` matching `query`.
  fn bookings<'a>(
    &'a self,
    query: &'a BookingQuery,
  ) -> impl Future<Output = Result<Vec<Booking>, Self::Error>> + Send + 'a;

  /// Rows of `outcome_log` matching `query`.
  fn outcomes<'a>(
    &'a self,
    query: &'a OutcomeQuery,
  ) -> impl Future<Output = Result<Vec<OutcomeLogEntry>, Self::Error>> + Send + 'a;

  /// Every setter, active or not.
  fn setters(&self) -> impl Future<Output = Result<Vec<Setter>, Self::Error>> + Send + '_;

  /// Every closer, active or not.
  fn closers(&self) -> impl Future<Output = Result<Vec<Closer>, Self::Error>> + Send + '_;
}
