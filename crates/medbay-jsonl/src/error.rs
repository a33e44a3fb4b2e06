//! Error types for the medbay-jsonl codec.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("line is not a JSON object")]
  NotAnObject,

  #[error("JSON error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("invalid record: {0}")]
  Record(#[from] medbay_core::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
