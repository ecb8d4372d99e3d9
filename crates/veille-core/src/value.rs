//! Cell values — the scalar payload of every snapshot column.
//!
//! Source tables arrive as loosely-typed grids; the loader coerces each cell
//! into [`Value`] so that the rest of the pipeline compares values with
//! explicit semantics. In particular, two [`Value::Missing`] cells are equal —
//! a column that is empty in both the old and new row of a record is not a
//! change.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One cell of a substance row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Value {
  Text(String),
  Number(f64),
  /// A calendar date, e.g. an entry-into-force date.
  Date(NaiveDate),
  /// The cell is absent or empty. Missing compares equal to missing and to
  /// nothing else.
  Missing,
}

impl Value {
  /// The discriminant string of the serialised form.
  pub fn kind(&self) -> &'static str {
    match self {
      Self::Text(_) => "text",
      Self::Number(_) => "number",
      Self::Date(_) => "date",
      Self::Missing => "missing",
    }
  }

  pub fn is_missing(&self) -> bool { matches!(self, Self::Missing) }
}

impl fmt::Display for Value {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Text(s) => f.write_str(s),
      Self::Number(n) => f.write_str(&format_number(*n)),
      Self::Date(d) => write!(f, "{d}"),
      Self::Missing => Ok(()),
    }
  }
}

/// Render a numeric cell without a spurious fractional part. Spreadsheet
/// exports routinely promote integer columns to floats.
pub(crate) fn format_number(n: f64) -> String {
  if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
    format!("{}", n as i64)
  } else {
    n.to_string()
  }
}
