//! Error type for `veille-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("core error: {0}")]
  Core(#[from] veille_core::Error),

  /// A stored timestamp failed to parse back as RFC 3339.
  #[error("stored timestamp is invalid: {0}")]
  DateParse(String),

  #[error("json conversion failed: {0}")]
  Json(#[from] serde_json::Error),

  #[error("stored uuid is invalid: {0}")]
  Uuid(#[from] uuid::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
