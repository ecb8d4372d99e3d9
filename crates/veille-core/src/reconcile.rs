//! Timestamp reconciliation — merging a candidate batch with the stored
//! state.
//!
//! `created_at` records the first run an identity appeared in and never
//! changes afterwards. `updated_at` advances to the run timestamp only when a
//! comparable field actually differs; republishing an identical row leaves
//! both timestamps alone.

use chrono::{DateTime, Utc};

use crate::{
  dedup,
  error::{Error, Result},
  record::{NewRecord, StateTable, SubstanceRecord},
};

/// Merge `candidates` with `previous` at `now`.
///
/// The returned table holds exactly the candidate identities; rows present
/// only in `previous` are omitted (the Diff Engine records their
/// disappearance). The previous rows are re-deduplicated first, last
/// occurrence winning. A duplicate identity among the candidates is an
/// [`Error::Integrity`]: candidates must arrive deduplicated, so a collision
/// here means a resolver or deduplicator bug, not bad source data.
///
/// Deterministic for fixed inputs, apart from the injected `now`.
pub fn reconcile(
  previous: &[SubstanceRecord],
  candidates: Vec<NewRecord>,
  now: DateTime<Utc>,
) -> Result<StateTable> {
  let (prior, dropped) =
    dedup::last_wins(previous.iter().map(|r| (r.identity.clone(), r)));
  if dropped > 0 {
    tracing::warn!(
      dropped,
      "stored state carried duplicate identities; kept last occurrences"
    );
  }

  let mut table = StateTable::new();
  for candidate in candidates {
    let identity = candidate.identity.clone();
    if table.contains_key(&identity) {
      return Err(Error::Integrity(format!(
        "duplicate identity in candidate batch: {identity}"
      )));
    }

    let record = match prior.get(&identity) {
      Some(existing) => {
        let changed =
          existing.comparable_fields() != candidate.comparable_fields();
        let updated_at = if changed { now } else { existing.updated_at };
        SubstanceRecord::from_new(candidate, existing.created_at, updated_at)
      }
      None => SubstanceRecord::from_new(candidate, now, now),
    };
    table.insert(identity, record);
  }

  Ok(table)
}

// ─── Tests ───────────────────────────────────────────────────────────────────
