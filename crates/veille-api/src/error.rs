//! Handler error type and its HTTP mapping.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use veille_core::identity::Identity;

/// Failure modes shared by all handlers.
#[derive(Debug, Error)]
pub enum ApiError {
  /// No current-state row under this identity.
  #[error("substance {0} not found")]
  UnknownSubstance(Identity),

  /// A query parameter failed to parse, e.g. an unrecognised change type.
  #[error("invalid query: {0}")]
  Query(#[from] veille_core::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = match &self {
      ApiError::UnknownSubstance(_) => StatusCode::NOT_FOUND,
      ApiError::Query(_) => StatusCode::BAD_REQUEST,
      ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(json!({ "error": self.to_string() }))).into_response()
  }
}
