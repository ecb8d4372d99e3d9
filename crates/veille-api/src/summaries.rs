//! Handler for `GET /summaries` — per-list run summaries, newest first.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
};
use serde::Deserialize;
use veille_core::{history::RunSummary, store::SubstanceStore};

use crate::error::ApiError;

#[derive(Debug, Deserialize, Default)]
pub struct ListParams {
  /// Newest-first cap on the result set.
  pub limit: Option<usize>,
}

/// `GET /summaries[?limit=...]`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<RunSummary>>, ApiError>
where
  S: SubstanceStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let summaries = store
    .summaries(params.limit)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(summaries))
}
