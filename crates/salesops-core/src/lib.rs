//! Core types and pure analytics for the sales-operations dashboard.
//!
//! This crate is deliberately free of HTTP and database dependencies. Storage
//! backends implement [`store::SalesStore`], telephony adapters implement
//! [`call_log::CallLogSource`], and everything else in here is a synchronous
//! transformation over in-memory rows.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod attribution;
pub mod booking;
pub mod breakdown;
pub mod call_log;
pub mod day;
pub mod dedup;
pub mod error;
pub mod metrics;
pub mod phone;
pub mod series;
pub mod store;

pub use error::{Error, Result};
