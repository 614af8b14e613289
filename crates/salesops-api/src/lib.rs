//! JSON reporting API for the sales dashboard.
//!
//! Exposes an axum [`Router`] backed by any [`SalesStore`] and, optionally,
//! a [`CallLogSource`] for call attribution. Authentication, TLS, and
//! transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", salesops_api::api_router(state))
//! ```

pub mod attribution;
pub mod breakdown;
pub mod error;
pub mod series;
pub mod show_up;

mod degrade;
mod params;

use std::sync::Arc;

use axum::{Router, routing::get};
use salesops_core::{attribution::LOOKBACK_DAYS, call_log::CallLogSource, store::SalesStore};

pub use error::ApiError;

/// Shared state threaded through all report handlers.
pub struct ApiState<S, T> {
  pub store:         Arc<S>,
  /// `None` disables attribution; every other report still works.
  pub telephony:     Option<Arc<T>>,
  pub lookback_days: i64,
}

impl<S, T> ApiState<S, T> {
  pub fn new(store: Arc<S>, telephony: Option<Arc<T>>) -> Self {
    Self { store, telephony, lookback_days: LOOKBACK_DAYS }
  }

  pub fn with_lookback_days(mut self, days: i64) -> Self {
    self.lookback_days = days;
    self
  }
}

impl<S, T> Clone for ApiState<S, T> {
  fn clone(&self) -> Self {
    Self {
      store:         self.store.clone(),
      telephony:     self.telephony.clone(),
      lookback_days: self.lookback_days,
    }
  }
}

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, T>(state: ApiState<S, T>) -> Router<()>
where
  S: SalesStore + 'static,
  T: CallLogSource + 'static,
{
  Router::new()
    .route("/series", get(series::handler::<S, T>))
    .route("/show-up", get(show_up::handler::<S, T>))
    .route("/breakdown", get(breakdown::handler::<S, T>))
    .route("/attribution", get(attribution::handler::<S, T>))
    .with_state(state)
}
