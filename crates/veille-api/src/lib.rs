//! JSON read API for the veille engine.
//!
//! Exposes an axum [`Router`] backed by any
//! [`veille_core::store::SubstanceStore`]. Every route is read-only; the
//! state and history move through ingestion runs, never over HTTP. Auth,
//! TLS, and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", veille_api::api_router(store.clone()))
//! ```

pub mod changes;
pub mod error;
pub mod substances;
pub mod summaries;


use std::sync::Arc;

use axum::{Router, routing::get};
use veille_core::store::SubstanceStore;

pub use error::ApiError;

/// Build the API router over `store`.
///
/// State is baked in, so the resulting `Router<()>` nests into a parent
/// router of any state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: SubstanceStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  Router::new()
    // Current state
    .route("/substances", get(substances::list::<S>))
    .route("/substances/{identity}", get(substances::get_one::<S>))
    // History
    .route("/changes", get(changes::list::<S>))
    .route("/summaries", get(summaries::list::<S>))
    .with_state(store)
}
