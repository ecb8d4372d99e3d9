//! The `SubstanceStore` trait and its query types.
//!
//! Storage backends implement the trait (`veille-store-sqlite` ships the
//! SQLite one); `veille-ingest`, `veille-api` and the CLI only ever see
//! this abstraction.

use std::future::Future;

use crate::{
  history::{ChangeRecord, ChangeType, RunSummary},
  identity::Identity,
  record::SubstanceRecord,
};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for [`SubstanceStore::query_changes`]. Filters are conjunctive;
/// the default query matches everything.
#[derive(Debug, Clone, Default)]
pub struct ChangeQuery {
  pub change_type: Option<ChangeType>,
  pub source_list: Option<String>,
  /// Exact natural key to match.
  pub key:         Option<String>,
  /// Cap on the result set, applied after the newest-first ordering.
  pub limit:       Option<usize>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a veille state-and-history backend.
///
/// The current-state table is replaced wholesale each run. The change history
/// and run summaries are append-only: once written, rows are never updated or
/// deleted. [`SubstanceStore::apply_run`] bundles one run's writes into a
/// single atomic unit so a failed run leaves the store untouched.
///
/// Every method returns a `Send` future, so implementations work under
/// multi-threaded runtimes like tokio.
pub trait SubstanceStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Current state ─────────────────────────────────────────────────────

  /// Load the whole current-state table, ordered by identity.
  fn load_state(
    &self,
  ) -> impl Future<Output = Result<Vec<SubstanceRecord>, Self::Error>>
  + Send
  + '_;

  /// Retrieve one row by identity. Returns `None` if not present.
  fn get_record(
    &self,
    identity: Identity,
  ) -> impl Future<Output = Result<Option<SubstanceRecord>, Self::Error>>
  + Send
  + '_;

  /// Replace the current-state table with `records` in one transaction.
  fn replace_state(
    &self,
    records: Vec<SubstanceRecord>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── History — append-only writes ──────────────────────────────────────

  /// Append change records to the history log.
  fn append_changes(
    &self,
    changes: Vec<ChangeRecord>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Append run summaries, one per source list per run.
  fn append_summaries(
    &self,
    summaries: Vec<RunSummary>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Persist everything one run produced in a single transaction.
  ///
  /// `state` is `None` when the run changed nothing and the current-state
  /// table should stay as it is. Either every write lands or none do.
  fn apply_run(
    &self,
    state: Option<Vec<SubstanceRecord>>,
    changes: Vec<ChangeRecord>,
    summaries: Vec<RunSummary>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// Return history entries matching `query`, newest first.
  fn query_changes<'a>(
    &'a self,
    query: &'a ChangeQuery,
  ) -> impl Future<Output = Result<Vec<ChangeRecord>, Self::Error>> + Send + 'a;

  /// Return run summaries, newest first, optionally capped at `limit`.
  fn summaries(
    &self,
    limit: Option<usize>,
  ) -> impl Future<Output = Result<Vec<RunSummary>, Self::Error>> + Send + '_;
}
