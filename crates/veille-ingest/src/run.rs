//! The run pipeline — one complete ingestion cycle.
//!
//! A run loads every configured snapshot up front (one unreadable list
//! aborts the run before anything is written), builds the candidate state,
//! diffs it against the stored state, and persists state, history, and
//! summaries in a single store transaction.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use uuid::Uuid;
use veille_core::{
  dedup,
  diff::{self, ListSnapshot},
  history::RunSummary,
  reconcile,
  record::{NewRecord, StateTable},
  store::SubstanceStore,
};

use crate::{
  archive,
  config::EngineConfig,
  error::{Error, Result},
  loader,
};

// ─── Report ──────────────────────────────────────────────────────────────────

/// Whether a run moved the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
  /// The state table was replaced.
  Applied,
  /// The candidate state matched the stored state row for row, so the state
  /// write was skipped. Still a successful run.
  NoChange,
}

/// What one run did, for operators and tests.
#[derive(Debug, Clone)]
pub struct RunReport {
  pub run_id:             Uuid,
  pub run_at:             DateTime<Utc>,
  pub outcome:            RunOutcome,
  /// One entry per configured list, in configuration order.
  pub summaries:          Vec<RunSummary>,
  pub insertions:         usize,
  pub modifications:      usize,
  pub deletions:          usize,
  /// Rows dropped by last-occurrence-wins identity dedup across the batch.
  pub dropped_duplicates: usize,
}

// ─── Pipeline ────────────────────────────────────────────────────────────────

/// Execute one ingestion run at the current time with a fresh run id.
pub async fn run_batch<S: SubstanceStore>(
  config: &EngineConfig,
  store: &S,
) -> Result<RunReport> {
  run_batch_at(config, store, Uuid::new_v4(), Utc::now()).await
}

/// Execute one ingestion run with an injected run id and timestamp.
pub async fn run_batch_at<S: SubstanceStore>(
  config: &EngineConfig,
  store: &S,
  run_id: Uuid,
  run_at: DateTime<Utc>,
) -> Result<RunReport> {
  // Every snapshot is loaded before the store is touched; a single
  // unreadable list fails the whole run.
  let mut batches: Vec<Vec<NewRecord>> =
    Vec::with_capacity(config.lists.len());
  for list in &config.lists {
    let path = config.snapshot_path(list);
    let records = loader::load_snapshot(list, &path)?;
    tracing::debug!(list = %list.name, rows = records.len(), "snapshot loaded");
    batches.push(records);
  }

  let previous = store
    .load_state()
    .await
    .map_err(|e| Error::Store(Box::new(e)))?;

  // Per-list diff tables: keyed rows only, natural-key last-wins.
  let mut snapshots = Vec::with_capacity(batches.len());
  for (list, records) in config.lists.iter().zip(&batches) {
    let keyed = records
      .iter()
      .filter_map(|r| r.natural_key.clone().map(|key| (key, r.clone())));
    let (rows, dropped) = dedup::last_wins(keyed);
    if dropped > 0 {
      tracing::debug!(
        list = %list.name,
        dropped,
        "duplicate natural keys within snapshot"
      );
    }
    snapshots.push(ListSnapshot { source_list: list.name.clone(), rows });
  }

  // Candidate state: identity last-wins across the whole batch, in
  // configuration then file order.
  let union = batches.into_iter().flatten();
  let (candidates, dropped_duplicates) =
    dedup::last_wins(union.map(|r| (r.identity.clone(), r)));
  if dropped_duplicates > 0 {
    tracing::debug!(dropped_duplicates, "duplicate identities across batch");
  }

  let reconciled = reconcile::reconcile(
    &previous,
    candidates.into_values().collect(),
    run_at,
  )?;

  let changes = diff::diff_run(&previous, &snapshots, run_at);

  let summaries: Vec<RunSummary> = config
    .lists
    .iter()
    .map(|list| RunSummary::tally(run_id, &list.name, &changes, run_at))
    .collect();

  // Rows from lists that left the configuration stay in the state; dropping
  // a list is not a substance deletion.
  let configured: BTreeSet<&str> =
    config.lists.iter().map(|l| l.name.as_str()).collect();
  let mut next_state = reconciled;
  let mut vanished: BTreeSet<&str> = BTreeSet::new();
  for record in &previous {
    if !configured.contains(record.source_list.as_str()) {
      vanished.insert(record.source_list.as_str());
      next_state.insert(record.identity.clone(), record.clone());
    }
  }
  for list in &vanished {
    tracing::info!(list = %list, "source list no longer configured; rows kept");
  }

  let previous_table: StateTable = previous
    .iter()
    .map(|r| (r.identity.clone(), r.clone()))
    .collect();
  let no_change = changes.is_empty() && next_state == previous_table;

  let insertions: usize = summaries.iter().map(|s| s.insertions).sum();
  let modifications: usize = summaries.iter().map(|s| s.modifications).sum();
  let deletions: usize = summaries.iter().map(|s| s.deletions).sum();

  let state = if no_change {
    None
  } else {
    Some(next_state.into_values().collect())
  };
  store
    .apply_run(state, changes, summaries.clone())
    .await
    .map_err(|e| Error::Store(Box::new(e)))?;

  if config.archive {
    for list in &config.lists {
      let path = config.snapshot_path(list);
      let archived = archive::archive_snapshot(
        &path,
        &config.archive_dir,
        &list.name,
        run_at,
      );
      match archived {
        Ok(dest) => tracing::debug!(
          list = %list.name,
          dest = %dest.display(),
          "snapshot archived"
        ),
        Err(e) => tracing::warn!(
          list = %list.name,
          error = %e,
          "snapshot left in place; archive failed"
        ),
      }
    }
  }

  let outcome = if no_change {
    RunOutcome::NoChange
  } else {
    RunOutcome::Applied
  };
  tracing::info!(
    run_id = %run_id,
    ?outcome,
    insertions,
    modifications,
    deletions,
    dropped_duplicates,
    "run finished"
  );

  Ok(RunReport {
    run_id,
    run_at,
    outcome,
    summaries,
    insertions,
    modifications,
    deletions,
    dropped_duplicates,
  })
}

// ─── Tests ───────────────────────────────────────────────────────────────────
