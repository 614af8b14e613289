//! [`PostgrestStore`]: [`SalesStore`] over a PostgREST (Supabase) endpoint.
//!
//! Tables are read from `{base_url}/rest/v1/{table}`. Filters use PostgREST
//! operator syntax (`gte.`, `lte.`, `eq.`, `in.()`, `ilike.`), and results are
//! paged with `limit`/`offset` until a short page comes back, because the
//! server caps every response at its configured row limit.

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;

use salesops_core::{
  booking::{Booking, Closer, OutcomeLogEntry, Setter},
  day::TimeRange,
  store::{BookingOrder, BookingQuery, OutcomeQuery, SalesStore},
};

use crate::{ProviderError, Result, http, retry::RetryPolicy};

/// Largest page PostgREST returns by default.
pub const DEFAULT_PAGE_SIZE: usize = 1000;

#[derive(Debug, Clone)]
pub struct PostgrestConfig {
  /// Project URL, without the `/rest/v1` suffix.
  pub base_url:  String,
  /// Sent both as the `apikey` header and as the bearer token.
  pub api_key:   String,
  pub page_size: usize,
  pub timeout:   Duration,
}

impl PostgrestConfig {
  pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
    Self {
      base_url:  base_url.into(),
      api_key:   api_key.into(),
      page_size: DEFAULT_PAGE_SIZE,
      timeout:   http::DEFAULT_TIMEOUT,
    }
  }
}

/// Read-only client for the hosted sales tables.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct PostgrestStore {
  client: Client,
  config: PostgrestConfig,
  retry:  RetryPolicy,
}

impl PostgrestStore {
  pub fn new(config: PostgrestConfig) -> Result<Self> {
    if config.base_url.trim().is_empty() {
      return Err(ProviderError::Config("postgrest base url is empty".into()));
    }
    if config.api_key.trim().is_empty() {
      return Err(ProviderError::Config("postgrest api key is empty".into()));
    }
    if config.page_size == 0 {
      return Err(ProviderError::Config("postgrest page size must be positive".into()));
    }
    Ok(Self {
      client: http::client(config.timeout)?,
      config,
      retry: RetryPolicy::default(),
    })
  }

  pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
    self.retry = retry;
    self
  }

  fn table_url(&self, table: &str) -> String {
    http::join(&self.config.base_url, &format!("rest/v1/{table}"))
  }

  /// Every row of `table` matching `filters`, up to `limit` rows.
  async fn select_all<T: DeserializeOwned>(
    &self,
    table: &str,
    filters: &[(String, String)],
    limit: Option<usize>,
  ) -> Result<Vec<T>> {
    let url = self.table_url(table);
    let mut rows: Vec<T> = Vec::new();

    loop {
      let want = match limit {
        Some(max) => self.config.page_size.min(max - rows.len()),
        None => self.config.page_size,
      };
      if want == 0 {
        break;
      }
      let offset = rows.len();

      let page: Vec<T> = http::get_json(&self.retry, table, || {
        self
          .client
          .get(&url)
          .header("apikey", &self.config.api_key)
          .bearer_auth(&self.config.api_key)
          .query(filters)
          .query(&[("limit", want), ("offset", offset)])
      })
      .await?;

      let got = page.len();
      tracing::debug!(table, offset, got, "fetched page");
      rows.extend(page);
      if got < want {
        break;
      }
    }

    Ok(rows)
  }
}

// ─── Filter encoding ─────────────────────────────────────────────────────────

fn push_range(out: &mut Vec<(String, String)>, column: &str, range: Option<&TimeRange>) {
  if let Some(r) = range {
    out.push((column.to_owned(), format!("gte.{}", r.from_param())));
    out.push((column.to_owned(), format!("lte.{}", r.to_param())));
  }
}

fn push_in<T: ToString>(out: &mut Vec<(String, String)>, column: &str, values: &[T]) {
  if values.is_empty() {
    return;
  }
  let list: Vec<String> = values
    .iter()
    .map(|v| format!("\"{}\"", v.to_string().replace('"', "\\\"")))
    .collect();
  out.push((column.to_owned(), format!("in.({})", list.join(","))));
}

pub(crate) fn booking_filters(query: &BookingQuery) -> Vec<(String, String)> {
  let mut out = vec![("select".to_owned(), "*".to_owned())];
  push_range(&mut out, "book_date", query.booked.as_ref());
  push_range(&mut out, "call_date", query.scheduled.as_ref());
  push_in(&mut out, "setter_id", &query.setter_ids);
  push_in(&mut out, "lead_id", &query.lead_ids);
  if let Some(needle) = &query.source_type_like {
    out.push(("source_type".to_owned(), format!("ilike.*{needle}*")));
  }
  if let Some(flag) = query.is_reschedule {
    out.push(("is_reschedule".to_owned(), format!("eq.{flag}")));
  }
  let order = match query.order {
    BookingOrder::BookDateAsc => "book_date.asc,id.asc",
    BookingOrder::BookDateDesc => "book_date.desc,id.desc",
    BookingOrder::CallDateAsc => "call_date.asc,id.asc",
  };
  out.push(("order".to_owned(), order.to_owned()));
  out
}

pub(crate) fn outcome_filters(query: &OutcomeQuery) -> Vec<(String, String)> {
  let mut out = vec![("select".to_owned(), "*".to_owned())];
  push_range(&mut out, "purchase_date", query.purchased.as_ref());
  push_in(&mut out, "call_id", &query.call_ids);
  out.push(("order".to_owned(), "id.asc".to_owned()));
  out
}

fn staff_filters() -> Vec<(String, String)> {
  vec![
    ("select".to_owned(), "id,name,active".to_owned()),
    ("order".to_owned(), "name.asc".to_owned()),
  ]
}

// ─── SalesStore impl ─────────────────────────────────────────────────────────

impl SalesStore for PostgrestStore {
  type Error = ProviderError;

  async fn bookings(&self, query: &BookingQuery) -> Result<Vec<Booking>> {
    self.select_all("calls", &booking_filters(query), query.limit).await
  }

  async fn outcomes(&self, query: &OutcomeQuery) -> Result<Vec<OutcomeLogEntry>> {
    self.select_all("outcome_log", &outcome_filters(query), query.limit).await
  }

  async fn setters(&self) -> Result<Vec<Setter>> {
    self.select_all("setters", &staff_filters(), None).await
  }

  async fn closers(&self) -> Result<Vec<Closer>> {
    self.select_all("closers", &staff_filters(), None).await
  }
}
