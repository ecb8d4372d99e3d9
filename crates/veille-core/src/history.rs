//! History types — immutable change records and per-list run summaries.
//!
//! A [`ChangeRecord`] is written once and never edited; the history log is
//! the audit trail for every insertion, deletion, and modification the diff
//! engine produced. A [`RunSummary`] is the per-list rollup of one run,
//! written even for runs that changed nothing so the cadence of successful
//! runs stays visible.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  error::{Error, Result},
  value::Value,
};

/// What happened to a substance row between two runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
  Insertion,
  Deletion,
  Modification,
}

impl ChangeType {
  pub fn as_str(self) -> &'static str {
    match self {
      ChangeType::Insertion => "insertion",
      ChangeType::Deletion => "deletion",
      ChangeType::Modification => "modification",
    }
  }

  pub fn parse(s: &str) -> Result<Self> {
    match s {
      "insertion" => Ok(ChangeType::Insertion),
      "deletion" => Ok(ChangeType::Deletion),
      "modification" => Ok(ChangeType::Modification),
      other => Err(Error::UnknownChangeType(other.to_string())),
    }
  }
}

/// One recorded change to one substance row.
///
/// `old_values` is absent for insertions, `new_values` for deletions;
/// modifications carry both plus the affected column names in ascending
/// order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeRecord {
  pub change_id:       Uuid,
  pub change_type:     ChangeType,
  pub source_list:     String,
  pub key:             String,
  pub display_name:    Option<String>,
  pub recorded_at:     DateTime<Utc>,
  pub old_values:      Option<BTreeMap<String, Value>>,
  pub new_values:      Option<BTreeMap<String, Value>>,
  pub modified_fields: Vec<String>,
}

impl ChangeRecord {
  pub fn insertion(
    source_list: &str,
    key: &str,
    display_name: Option<String>,
    new_values: BTreeMap<String, Value>,
    recorded_at: DateTime<Utc>,
  ) -> Self {
    Self {
      change_id: Uuid::new_v4(),
      change_type: ChangeType::Insertion,
      source_list: source_list.to_string(),
      key: key.to_string(),
      display_name,
      recorded_at,
      old_values: None,
      new_values: Some(new_values),
      modified_fields: Vec::new(),
    }
  }

  pub fn deletion(
    source_list: &str,
    key: &str,
    display_name: Option<String>,
    old_values: BTreeMap<String, Value>,
    recorded_at: DateTime<Utc>,
  ) -> Self {
    Self {
      change_id: Uuid::new_v4(),
      change_type: ChangeType::Deletion,
      source_list: source_list.to_string(),
      key: key.to_string(),
      display_name,
      recorded_at,
      old_values: Some(old_values),
      new_values: None,
      modified_fields: Vec::new(),
    }
  }

  #[allow(clippy::too_many_arguments)]
  pub fn modification(
    source_list: &str,
    key: &str,
    display_name: Option<String>,
    old_values: BTreeMap<String, Value>,
    new_values: BTreeMap<String, Value>,
    modified_fields: Vec<String>,
    recorded_at: DateTime<Utc>,
  ) -> Self {
    Self {
      change_id: Uuid::new_v4(),
      change_type: ChangeType::Modification,
      source_list: source_list.to_string(),
      key: key.to_string(),
      display_name,
      recorded_at,
      old_values: Some(old_values),
      new_values: Some(new_values),
      modified_fields,
    }
  }
}

/// Per-list rollup of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
  pub run_id:        Uuid,
  pub source_list:   String,
  pub insertions:    usize,
  pub modifications: usize,
  pub deletions:     usize,
  pub changed:       bool,
  pub run_at:        DateTime<Utc>,
}

impl RunSummary {
  /// Count the changes belonging to `source_list`.
  pub fn tally(
    run_id: Uuid,
    source_list: &str,
    changes: &[ChangeRecord],
    run_at: DateTime<Utc>,
  ) -> Self {
    let mut insertions = 0;
    let mut modifications = 0;
    let mut deletions = 0;
    for change in changes {
      if change.source_list != source_list {
        continue;
      }
      match change.change_type {
        ChangeType::Insertion => insertions += 1,
        ChangeType::Deletion => deletions += 1,
        ChangeType::Modification => modifications += 1,
      }
    }
    Self {
      run_id,
      source_list: source_list.to_string(),
      insertions,
      modifications,
      deletions,
      changed: insertions + modifications + deletions > 0,
      run_at,
    }
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
