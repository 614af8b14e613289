//! Error types for `salesops-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid date {0:?}: expected YYYY-MM-DD")]
  InvalidDate(String),

  #[error("invalid date range: {from} is after {to}")]
  InvertedRange { from: String, to: String },

  #[error("unknown breakdown dimension: {0:?}")]
  UnknownDimension(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
