//! Snapshot loader — one JSON table file per source list.
//!
//! A snapshot is an array of objects mapping column names to scalar cells.
//! The configured key and name columns are recognised here and handed to the
//! core as such, so every downstream stage sees the canonical
//! `natural_key` / `display_name` columns regardless of how a list labels
//! its own.

use std::{collections::BTreeMap, fs, path::Path};

use chrono::NaiveDate;
use veille_core::{record::NewRecord, value::Value};

use crate::{
  config::ListSpec,
  error::{Error, LoadError, Result},
};

/// Read and parse the snapshot file for `spec`.
///
/// Any failure is reported as [`Error::Load`] naming the list and path, so a
/// malformed table never reaches the core stages.
pub fn load_snapshot(spec: &ListSpec, path: &Path) -> Result<Vec<NewRecord>> {
  let text = fs::read_to_string(path).map_err(|e| Error::Load {
    list:   spec.name.clone(),
    path:   path.to_path_buf(),
    source: LoadError::Io(e),
  })?;
  parse_snapshot(spec, &text).map_err(|e| Error::Load {
    list:   spec.name.clone(),
    path:   path.to_path_buf(),
    source: e,
  })
}

/// Parse one snapshot document into candidate records, in row order.
pub fn parse_snapshot(
  spec: &ListSpec,
  text: &str,
) -> Result<Vec<NewRecord>, LoadError> {
  let rows: Vec<BTreeMap<String, serde_json::Value>> =
    serde_json::from_str(text)?;
  rows
    .into_iter()
    .enumerate()
    .map(|(row, cells)| row_to_record(spec, row, cells))
    .collect()
}

fn row_to_record(
  spec: &ListSpec,
  row: usize,
  cells: BTreeMap<String, serde_json::Value>,
) -> Result<NewRecord, LoadError> {
  let mut key_cell = Value::Missing;
  let mut name_cell = Value::Missing;
  let mut attributes = BTreeMap::new();

  for (column, cell) in cells {
    let value = coerce_cell(row, &column, cell)?;
    if column == spec.key_column {
      key_cell = value;
    } else if Some(column.as_str()) == spec.name_column.as_deref() {
      name_cell = value;
    } else {
      attributes.insert(column, value);
    }
  }

  Ok(NewRecord::from_cells(&spec.name, &key_cell, &name_cell, attributes))
}

/// Coerce one JSON cell to a [`Value`].
///
/// Strings in `YYYY-MM-DD` form become dates; booleans take their text form;
/// nested arrays and objects are load errors.
fn coerce_cell(
  row: usize,
  column: &str,
  cell: serde_json::Value,
) -> Result<Value, LoadError> {
  Ok(match cell {
    serde_json::Value::Null => Value::Missing,
    serde_json::Value::Bool(b) => Value::Text(b.to_string()),
    serde_json::Value::Number(n) => match n.as_f64() {
      Some(f) => Value::Number(f),
      None => Value::Text(n.to_string()),
    },
    serde_json::Value::String(s) => {
      match NaiveDate::parse_from_str(&s, "%Y-%m-%d") {
        Ok(d) => Value::Date(d),
        Err(_) => Value::Text(s),
      }
    }
    serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
      return Err(LoadError::NestedValue { row, column: column.to_string() });
    }
  })
}

// ─── Tests ───────────────────────────────────────────────────────────────────
