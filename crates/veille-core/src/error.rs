//! Error types for `veille-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A pipeline invariant was violated. Fatal for the run; indicates a bug
  /// upstream of the stage that raised it, not a data-quality issue.
  #[error("integrity violation: {0}")]
  Integrity(String),

  #[error("unknown change type: {0:?}")]
  UnknownChangeType(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
