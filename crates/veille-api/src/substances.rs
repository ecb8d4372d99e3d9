//! Handlers for `/substances` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/substances` | Optional `?source_list=<name>` |
//! | `GET`  | `/substances/:identity` | 404 if no current row |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
};
use serde::Deserialize;
use veille_core::{
  identity::Identity,
  record::SubstanceRecord,
  store::SubstanceStore,
};

use crate::error::ApiError;

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  /// If set, restrict to rows from this source list.
  pub source_list: Option<String>,
}

/// `GET /substances[?source_list=<name>]`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<SubstanceRecord>>, ApiError>
where
  S: SubstanceStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let mut records = store
    .load_state()
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  if let Some(list) = &params.source_list {
    records.retain(|r| &r.source_list == list);
  }

  Ok(Json(records))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /substances/:identity`
///
/// The identity's `|` separator must be percent-encoded as `%7C` in the path.
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(identity): Path<String>,
) -> Result<Json<SubstanceRecord>, ApiError>
where
  S: SubstanceStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let identity = Identity::from(identity);
  let record = store
    .get_record(identity.clone())
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::UnknownSubstance(identity))?;
  Ok(Json(record))
}
