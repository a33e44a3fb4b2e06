//! Error types for `medbay-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("injury not found: {0}")]
  InjuryNotFound(String),

  #[error("injury {0} already exists")]
  DuplicateInjury(String),

  #[error("unknown injury status: {0:?}")]
  UnknownStatus(String),

  #[error("missing field {0}")]
  MissingField(&'static str),

  #[error("invalid date in {field}: {value:?}")]
  InvalidDate { field: &'static str, value: String },

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
