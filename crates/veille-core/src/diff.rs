//! Diff engine — change detection between the stored state and a fresh
//! snapshot, one source list at a time.
//!
//! Rows pair up by natural key alone; a row whose key vanished and a new row
//! under a fresh key produce a deletion and an insertion, never a
//! modification. Rows without a natural key carry fallback identities that
//! are unstable across runs, so they stay out of the diff entirely.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::{
  history::ChangeRecord,
  record::{NewRecord, SubstanceRecord},
  value::Value,
};

/// A deduplicated snapshot of one source list, keyed by natural key.
///
/// Only keyed rows enter the map; fallback-identity rows are filtered out
/// upstream.
#[derive(Debug, Clone)]
pub struct ListSnapshot {
  pub source_list: String,
  pub rows:        BTreeMap<String, NewRecord>,
}

/// Diff one source list, producing insertions, then deletions, then
/// modifications, each group in ascending key order.
///
/// An empty `old` side yields one insertion per new row, which is exactly
/// the first-run case.
pub fn diff_list(
  source_list: &str,
  old: &BTreeMap<String, &SubstanceRecord>,
  new: &BTreeMap<String, NewRecord>,
  recorded_at: DateTime<Utc>,
) -> Vec<ChangeRecord> {
  let mut changes = Vec::new();

  for (key, row) in new {
    if !old.contains_key(key) {
      changes.push(ChangeRecord::insertion(
        source_list,
        key,
        row.display_name.clone(),
        row.comparable_fields(),
        recorded_at,
      ));
    }
  }

  for (key, row) in old {
    if !new.contains_key(key) {
      changes.push(ChangeRecord::deletion(
        source_list,
        key,
        row.display_name.clone(),
        row.comparable_fields(),
        recorded_at,
      ));
    }
  }

  for (key, new_row) in new {
    let Some(old_row) = old.get(key) else {
      continue;
    };
    let old_fields = old_row.comparable_fields();
    let new_fields = new_row.comparable_fields();
    let modified = modified_fields(&old_fields, &new_fields);
    if !modified.is_empty() {
      changes.push(ChangeRecord::modification(
        source_list,
        key,
        new_row.display_name.clone(),
        old_fields,
        new_fields,
        modified,
        recorded_at,
      ));
    }
  }

  changes
}

/// Column names whose values differ between the two field maps, in
/// ascending order.
///
/// Only columns present on both sides are compared; a column that exists on
/// one side only says the list layout changed, not the substance.
pub fn modified_fields(
  old: &BTreeMap<String, Value>,
  new: &BTreeMap<String, Value>,
) -> Vec<String> {
  old
    .iter()
    .filter_map(|(column, old_value)| match new.get(column) {
      Some(new_value) if new_value != old_value => Some(column.clone()),
      _ => None,
    })
    .collect()
}

/// Diff every snapshot in a run against the stored state.
///
/// The previous state is grouped by source list first; a list with no stored
/// rows (or one never seen before) diffs against an empty table. Keyless
/// stored rows are skipped for the reason given at the module level.
pub fn diff_run(
  previous: &[SubstanceRecord],
  snapshots: &[ListSnapshot],
  recorded_at: DateTime<Utc>,
) -> Vec<ChangeRecord> {
  let mut old_by_list: BTreeMap<&str, BTreeMap<String, &SubstanceRecord>> =
    BTreeMap::new();
  for record in previous {
    if let Some(key) = &record.natural_key {
      old_by_list
        .entry(record.source_list.as_str())
        .or_default()
        .insert(key.clone(), record);
    }
  }

  let empty = BTreeMap::new();
  let mut changes = Vec::new();
  for snapshot in snapshots {
    let old = old_by_list
      .get(snapshot.source_list.as_str())
      .unwrap_or(&empty);
    changes.extend(diff_list(
      &snapshot.source_list,
      old,
      &snapshot.rows,
      recorded_at,
    ));
  }
  changes
}

// ─── Tests ───────────────────────────────────────────────────────────────────
