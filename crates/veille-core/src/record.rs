//! Record types — the unit the pipeline merges, diffs, and persists.
//!
//! A [`NewRecord`] is a candidate row as it leaves the loader: identity
//! resolved, no timestamps yet. The Timestamp Reconciler turns candidates
//! into [`SubstanceRecord`]s by attaching `created_at`/`updated_at`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{identity, identity::Identity, value::Value};

/// Canonical column name for the natural key in comparable views and change
/// records. The loader maps whatever a source calls its key column to this.
pub const KEY_FIELD: &str = "natural_key";

/// Canonical column name for the display name.
pub const NAME_FIELD: &str = "display_name";

// ─── NewRecord ───────────────────────────────────────────────────────────────

/// A candidate row before timestamps are assigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRecord {
  pub identity:     Identity,
  /// Normalised natural key; `None` when the source supplied a placeholder.
  pub natural_key:  Option<String>,
  pub display_name: Option<String>,
  pub source_list:  String,
  pub attributes:   BTreeMap<String, Value>,
}

impl NewRecord {
  /// Build a candidate row from split snapshot cells. The key cell is
  /// normalised and the identity resolved from whatever survives.
  pub fn from_cells(
    source_list: &str,
    key_cell: &Value,
    name_cell: &Value,
    attributes: BTreeMap<String, Value>,
  ) -> Self {
    let natural_key = identity::normalize_key(key_cell);
    let display_name = display_text(name_cell);
    let identity = identity::resolve(
      natural_key.as_deref(),
      source_list,
      display_name.as_deref(),
      &attributes,
    );
    Self {
      identity,
      natural_key,
      display_name,
      source_list: source_list.to_owned(),
      attributes,
    }
  }

  /// All fields that participate in change detection, under canonical column
  /// names. Identity, source list, and timestamps are excluded.
  pub fn comparable_fields(&self) -> BTreeMap<String, Value> {
    comparable(&self.natural_key, &self.display_name, &self.attributes)
  }
}

fn display_text(cell: &Value) -> Option<String> {
  match cell {
    Value::Missing => None,
    Value::Text(s) => {
      let trimmed = s.trim();
      (!trimmed.is_empty()).then(|| trimmed.to_owned())
    }
    other => Some(other.to_string()),
  }
}

fn comparable(
  natural_key: &Option<String>,
  display_name: &Option<String>,
  attributes: &BTreeMap<String, Value>,
) -> BTreeMap<String, Value> {
  let mut fields = attributes.clone();
  fields.insert(
    KEY_FIELD.to_owned(),
    natural_key.clone().map(Value::Text).unwrap_or(Value::Missing),
  );
  fields.insert(
    NAME_FIELD.to_owned(),
    display_name.clone().map(Value::Text).unwrap_or(Value::Missing),
  );
  fields
}

// ─── SubstanceRecord ─────────────────────────────────────────────────────────

/// A row of the current-state table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubstanceRecord {
  pub identity:     Identity,
  pub natural_key:  Option<String>,
  pub display_name: Option<String>,
  pub source_list:  String,
  pub attributes:   BTreeMap<String, Value>,
  /// When this identity first appeared in any run. Immutable once set.
  pub created_at:   DateTime<Utc>,
  /// When a comparable field last differed from the stored row.
  pub updated_at:   DateTime<Utc>,
}

impl SubstanceRecord {
  /// Attach timestamps to a candidate row.
  pub fn from_new(
    new: NewRecord,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
  ) -> Self {
    Self {
      identity: new.identity,
      natural_key: new.natural_key,
      display_name: new.display_name,
      source_list: new.source_list,
      attributes: new.attributes,
      created_at,
      updated_at,
    }
  }

  /// Same comparable view as [`NewRecord::comparable_fields`].
  pub fn comparable_fields(&self) -> BTreeMap<String, Value> {
    comparable(&self.natural_key, &self.display_name, &self.attributes)
  }
}

/// The materialised current state: one record per identity, replaced
/// wholesale on every applied run.
pub type StateTable = BTreeMap<Identity, SubstanceRecord>;

// ─── Tests ───────────────────────────────────────────────────────────────────
