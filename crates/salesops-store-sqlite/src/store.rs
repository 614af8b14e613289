//! [`SqliteStore`]: the SQLite implementation of [`SalesStore`].

use std::path::Path;

use rusqlite::{Connection, params, params_from_iter, types::Value};

use salesops_core::{
  booking::{Booking, Closer, OutcomeLogEntry, Setter},
  day::TimeRange,
  store::{BookingOrder, BookingQuery, OutcomeQuery, SalesStore},
};

use crate::{
  Result,
  encode::{
    BOOKING_COLUMNS, OUTCOME_COLUMNS, RawBooking, RawOutcome, closer_from_row,
    encode_dt, setter_from_row,
  },
  schema::SCHEMA,
  snapshot::Snapshot,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A local copy of the sales tables in a single SQLite file.
///
/// Cloning is cheap; the inner connection handle is shared.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

/// Rows written by [`SqliteStore::import`], per table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
  pub calls:       usize,
  pub outcome_log: usize,
  pub setters:     usize,
  pub closers:     usize,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, used by tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Upsert every row of `snapshot` in one transaction.
  ///
  /// Rows are keyed by `id`, so importing the same export twice leaves the
  /// store unchanged.
  pub async fn import(&self, snapshot: Snapshot) -> Result<ImportSummary> {
    let summary = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        for b in &snapshot.calls {
          upsert_booking(&tx, b)?;
        }
        for o in &snapshot.outcome_log {
          upsert_outcome(&tx, o)?;
        }
        for s in &snapshot.setters {
          upsert_staff(&tx, "setters", &s.id, &s.name, s.active)?;
        }
        for c in &snapshot.closers {
          upsert_staff(&tx, "closers", &c.id, &c.name, c.active)?;
        }
        tx.commit()?;
        Ok(ImportSummary {
          calls:       snapshot.calls.len(),
          outcome_log: snapshot.outcome_log.len(),
          setters:     snapshot.setters.len(),
          closers:     snapshot.closers.len(),
        })
      })
      .await?;

    tracing::info!(
      calls = summary.calls,
      outcomes = summary.outcome_log,
      setters = summary.setters,
      closers = summary.closers,
      "imported snapshot"
    );
    Ok(summary)
  }

  pub async fn insert_booking(&self, booking: Booking) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        upsert_booking(conn, &booking)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  pub async fn insert_outcome(&self, outcome: OutcomeLogEntry) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        upsert_outcome(conn, &outcome)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  pub async fn insert_setter(&self, setter: Setter) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        upsert_staff(conn, "setters", &setter.id, &setter.name, setter.active)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  pub async fn insert_closer(&self, closer: Closer) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        upsert_staff(conn, "closers", &closer.id, &closer.name, closer.active)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── Writes ──────────────────────────────────────────────────────────────────

fn upsert_booking(conn: &Connection, b: &Booking) -> rusqlite::Result<()> {
  conn.execute(
    &format!(
      "INSERT OR REPLACE INTO calls ({BOOKING_COLUMNS})
       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)"
    ),
    params![
      b.id,
      b.lead_id,
      b.phone,
      encode_dt(b.book_date),
      b.call_date.map(encode_dt),
      b.setter_id,
      b.first_setter_id,
      b.closer_id,
      b.is_reschedule,
      b.source_type,
      b.utm_source,
      b.utm_medium,
      b.utm_campaign,
      b.confirmed,
      b.picked_up,
      b.showed_up,
      b.purchased,
      b.cancelled,
    ],
  )?;
  Ok(())
}

fn upsert_outcome(conn: &Connection, o: &OutcomeLogEntry) -> rusqlite::Result<()> {
  conn.execute(
    &format!("INSERT OR REPLACE INTO outcome_log ({OUTCOME_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5)"),
    params![
      o.id,
      String::from(o.outcome.clone()),
      o.clawback,
      o.purchase_date.map(encode_dt),
      o.call_id,
    ],
  )?;
  Ok(())
}

fn upsert_staff(
  conn: &Connection,
  table: &str,
  id: &str,
  name: &str,
  active: bool,
) -> rusqlite::Result<()> {
  conn.execute(
    &format!("INSERT OR REPLACE INTO {table} (id, name, active) VALUES (?1, ?2, ?3)"),
    params![id, name, active],
  )?;
  Ok(())
}

// ─── Query building ──────────────────────────────────────────────────────────

/// Accumulates `WHERE` conditions and their positional parameters.
#[derive(Default)]
struct Filter {
  clauses: Vec<String>,
  params:  Vec<Value>,
}

impl Filter {
  fn push(&mut self, clause: String, value: Value) {
    self.params.push(value);
    self.clauses.push(clause.replace('?', &format!("?{}", self.params.len())));
  }

  fn range(&mut self, column: &str, range: Option<&TimeRange>) {
    if let Some(r) = range {
      self.push(format!("{column} >= ?"), Value::Text(encode_dt(r.from)));
      self.push(format!("{column} <= ?"), Value::Text(encode_dt(r.to)));
    }
  }

  fn any_of(&mut self, column: &str, values: impl IntoIterator<Item = Value>) {
    let start = self.params.len();
    self.params.extend(values);
    if self.params.len() == start {
      return;
    }
    let slots: Vec<String> =
      (start + 1..=self.params.len()).map(|i| format!("?{i}")).collect();
    self.clauses.push(format!("{column} IN ({})", slots.join(", ")));
  }

  /// Case-insensitive substring match.
  fn contains(&mut self, column: &str, needle: Option<&str>) {
    if let Some(n) = needle {
      let escaped = n
        .to_lowercase()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
      self.push(
        format!("LOWER({column}) LIKE ? ESCAPE '\\'"),
        Value::Text(format!("%{escaped}%")),
      );
    }
  }

  fn eq_bool(&mut self, column: &str, value: Option<bool>) {
    if let Some(v) = value {
      self.push(format!("{column} = ?"), Value::Integer(i64::from(v)));
    }
  }

  fn limit(&mut self, limit: Option<usize>) -> String {
    match limit {
      Some(n) => {
        self.params.push(Value::Integer(n as i64));
        format!(" LIMIT ?{}", self.params.len())
      }
      None => String::new(),
    }
  }

  fn where_clause(&self) -> String {
    if self.clauses.is_empty() {
      String::new()
    } else {
      format!(" WHERE {}", self.clauses.join(" AND "))
    }
  }
}

fn booking_sql(query: &BookingQuery) -> (String, Vec<Value>) {
  let mut f = Filter::default();
  f.range("book_date", query.booked.as_ref());
  f.range("call_date", query.scheduled.as_ref());
  f.any_of("setter_id", query.setter_ids.iter().cloned().map(Value::Text));
  f.any_of("lead_id", query.lead_ids.iter().cloned().map(Value::Text));
  f.contains("source_type", query.source_type_like.as_deref());
  f.eq_bool("is_reschedule", query.is_reschedule);

  let order = match query.order {
    BookingOrder::BookDateAsc => "book_date ASC, id ASC",
    BookingOrder::BookDateDesc => "book_date DESC, id DESC",
    BookingOrder::CallDateAsc => "call_date ASC, id ASC",
  };
  let where_clause = f.where_clause();
  let limit = f.limit(query.limit);
  (
    format!("SELECT {BOOKING_COLUMNS} FROM calls{where_clause} ORDER BY {order}{limit}"),
    f.params,
  )
}

fn outcome_sql(query: &OutcomeQuery) -> (String, Vec<Value>) {
  let mut f = Filter::default();
  f.range("purchase_date", query.purchased.as_ref());
  f.any_of("call_id", query.call_ids.iter().copied().map(Value::Integer));
  let where_clause = f.where_clause();
  let limit = f.limit(query.limit);
  (
    format!("SELECT {OUTCOME_COLUMNS} FROM outcome_log{where_clause} ORDER BY id ASC{limit}"),
    f.params,
  )
}

// ─── SalesStore impl ─────────────────────────────────────────────────────────

impl SalesStore for SqliteStore {
  type Error = crate::Error;

  async fn bookings(&self, query: &BookingQuery) -> Result<Vec<Booking>> {
    let (sql, values) = booking_sql(query);

    let raws: Vec<RawBooking> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(params_from_iter(values.iter()), RawBooking::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawBooking::into_booking).collect()
  }

  async fn outcomes(&self, query: &OutcomeQuery) -> Result<Vec<OutcomeLogEntry>> {
    let (sql, values) = outcome_sql(query);

    let raws: Vec<RawOutcome> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(params_from_iter(values.iter()), RawOutcome::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawOutcome::into_outcome).collect()
  }

  async fn setters(&self) -> Result<Vec<Setter>> {
    Ok(
      self
        .conn
        .call(|conn| {
          let mut stmt = conn.prepare("SELECT id, name, active FROM setters ORDER BY name")?;
          let rows = stmt
            .query_map([], setter_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          Ok(rows)
        })
        .await?,
    )
  }

  async fn closers(&self) -> Result<Vec<Closer>> {
    Ok(
      self
        .conn
        .call(|conn| {
          let mut stmt = conn.prepare("SELECT id, name, active FROM closers ORDER BY name")?;
          let rows = stmt
            .query_map([], closer_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          Ok(rows)
        })
        .await?,
    )
  }
}

#[cfg(test)]
mod sql_tests {
  use super::*;

  #[test]
  fn empty_query_has_no_where_clause() {
    let (sql, values) = booking_sql(&BookingQuery::default());
    assert!(!sql.contains("WHERE"));
    assert!(sql.ends_with("ORDER BY book_date ASC, id ASC"));
    assert!(values.is_empty());
  }

  #[test]
  fn parameters_are_numbered_in_order() {
    let query = BookingQuery {
      setter_ids: vec!["a".into(), "b".into()],
      is_reschedule: Some(false),
      limit: Some(5),
      ..BookingQuery::default()
    };
    let (sql, values) = booking_sql(&query);
    assert!(sql.contains("setter_id IN (?1, ?2) AND is_reschedule = ?3"));
    assert!(sql.ends_with("LIMIT ?4"));
    assert_eq!(values.len(), 4);
  }

  #[test]
  fn like_wildcards_in_needle_are_escaped() {
    let mut f = Filter::default();
    f.contains("source_type", Some("50%_Ad"));
    assert_eq!(f.params, vec![Value::Text("%50\\%\\_ad%".into())]);
  }
}
