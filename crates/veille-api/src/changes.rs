//! Handler for `GET /changes` — the append-only change history.
//!
//! Query params map directly to [`ChangeQuery`] fields. Results come back
//! newest first.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
};
use serde::Deserialize;
use veille_core::{
  history::{ChangeRecord, ChangeType},
  store::{ChangeQuery, SubstanceStore},
};

use crate::error::ApiError;

#[derive(Debug, Deserialize, Default)]
pub struct ListParams {
  /// One of `insertion`, `deletion`, `modification`.
  pub change_type: Option<String>,
  pub source_list: Option<String>,
  /// Exact natural key, e.g. a CAS number.
  pub key:         Option<String>,
  /// Newest-first cap on the result set.
  pub limit:       Option<usize>,
}

/// `GET /changes[?change_type=...][&source_list=...][&key=...][&limit=...]`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<ChangeRecord>>, ApiError>
where
  S: SubstanceStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let change_type = params
    .change_type
    .as_deref()
    .map(ChangeType::parse)
    .transpose()?;

  let query = ChangeQuery {
    change_type,
    source_list: params.source_list,
    key: params.key,
    limit: params.limit,
  };

  let changes = store
    .query_changes(&query)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(changes))
}
