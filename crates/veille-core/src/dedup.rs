//! Last-occurrence-wins deduplication.
//!
//! Sources republish rows, and a snapshot occasionally carries the same key
//! twice. The whole pipeline resolves such conflicts the same way: the row
//! encountered last is the one that counts.

use std::collections::BTreeMap;

/// Collapse `(key, row)` pairs so only the last occurrence of each key
/// survives. Returns the surviving rows and how many were dropped.
///
/// Idempotent: feeding the output back in drops nothing.
pub fn last_wins<K: Ord, V>(
  rows: impl IntoIterator<Item = (K, V)>,
) -> (BTreeMap<K, V>, usize) {
  let mut kept = BTreeMap::new();
  let mut dropped = 0;
  for (key, row) in rows {
    if kept.insert(key, row).is_some() {
      dropped += 1;
    }
  }
  (kept, dropped)
}
