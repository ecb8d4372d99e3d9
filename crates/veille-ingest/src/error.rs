//! Error types for `veille-ingest`.

use std::path::PathBuf;

use thiserror::Error;

/// A failure while reading or parsing one snapshot file.
#[derive(Debug, Error)]
pub enum LoadError {
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("row {row}, column {column:?} holds a nested array or object")]
  NestedValue { row: usize, column: String },
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("configuration error: {0}")]
  Configuration(String),

  #[error("cannot load snapshot for {list:?} from {path:?}: {source}")]
  Load {
    list:   String,
    path:   PathBuf,
    #[source]
    source: LoadError,
  },

  #[error("core error: {0}")]
  Core(#[from] veille_core::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
