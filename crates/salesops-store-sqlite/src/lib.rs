//! SQLite mirror of the sales tables.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Used for offline analysis of exported
//! snapshots and as the store behind the HTTP tests.

mod encode;
mod schema;
mod snapshot;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use snapshot::Snapshot;
pub use store::{ImportSummary, SqliteStore};

#[cfg(test)]
mod tests;
