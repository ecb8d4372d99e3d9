//! Identity resolution — the stable key that tracks one logical record.
//!
//! A row's identity is its normalised natural key joined to its source list
//! (`50-00-0|clp_annex_vi`). Rows without a usable natural key fall back to a
//! content hash of the row, so an unchanged keyless row resolves to the same
//! identity on every run.

use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::value::{Value, format_number};

/// Marker prefix of fallback identities for rows without a natural key.
pub const NOKEY_PREFIX: &str = "<NOKEY>";

/// Joins the key part of an identity to its source-list part.
pub const IDENTITY_SEPARATOR: char = '|';

// ─── Identity ────────────────────────────────────────────────────────────────

/// The resolved, internally stable key for one logical record.
#[derive(
  Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
  pub fn as_str(&self) -> &str { &self.0 }

  pub fn into_inner(self) -> String { self.0 }

  /// Whether this identity was derived from a content hash rather than a
  /// natural key.
  pub fn is_fallback(&self) -> bool { self.0.starts_with(NOKEY_PREFIX) }
}

impl fmt::Display for Identity {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<String> for Identity {
  fn from(s: String) -> Self { Self(s) }
}

impl From<&str> for Identity {
  fn from(s: &str) -> Self { Self(s.to_owned()) }
}

// ─── Natural-key normalisation ───────────────────────────────────────────────

/// Normalise a raw key cell into a usable natural key, if any.
///
/// Whitespace is trimmed; the placeholder values sources use for "no key"
/// (empty string, a lone dash, "None" in any case, a missing cell) all
/// resolve to `None`. Keys that picked up a trailing `.0` from a float-typed
/// spreadsheet column are repaired.
pub fn normalize_key(raw: &Value) -> Option<String> {
  let text = match raw {
    Value::Text(s) => s.trim().to_owned(),
    Value::Number(n) => format_number(*n),
    Value::Date(d) => d.to_string(),
    Value::Missing => return None,
  };

  if text.is_empty() || text == "-" || text.eq_ignore_ascii_case("none") {
    return None;
  }

  Some(strip_float_artifact(&text))
}

/// Drop a trailing `.0` when what remains is digits and dashes, the shape of
/// a registry number (`50-00-0.0` came from `50-00-0`).
fn strip_float_artifact(s: &str) -> String {
  if let Some(stem) = s.strip_suffix(".0")
    && !stem.is_empty()
    && stem.chars().all(|c| c.is_ascii_digit() || c == '-')
  {
    return stem.to_owned();
  }
  s.to_owned()
}

// ─── Resolution ──────────────────────────────────────────────────────────────

/// Resolve the identity for a row. Never fails; a row without a natural key
/// gets a content-derived fallback identity.
pub fn resolve(
  natural_key: Option<&str>,
  source_list: &str,
  display_name: Option<&str>,
  attributes: &BTreeMap<String, Value>,
) -> Identity {
  match natural_key {
    Some(key) => {
      Identity(format!("{key}{IDENTITY_SEPARATOR}{source_list}"))
    }
    None => {
      let digest = content_digest(source_list, display_name, attributes);
      Identity(format!(
        "{NOKEY_PREFIX}_{digest}{IDENTITY_SEPARATOR}{source_list}"
      ))
    }
  }
}

/// First 16 hex characters of a SHA-256 over the row content. BTreeMap
/// iteration order makes the digest independent of column arrival order.
fn content_digest(
  source_list: &str,
  display_name: Option<&str>,
  attributes: &BTreeMap<String, Value>,
) -> String {
  let mut hasher = Sha256::new();
  hasher.update(source_list.as_bytes());
  hasher.update([0]);
  hasher.update(display_name.unwrap_or("").as_bytes());
  for (column, value) in attributes {
    hasher.update([0]);
    hasher.update(column.as_bytes());
    hasher.update([0x1f]);
    hash_value(&mut hasher, value);
  }
  hex::encode(&hasher.finalize()[..8])
}

fn hash_value(hasher: &mut Sha256, value: &Value) {
  match value {
    Value::Text(s) => {
      hasher.update([b't']);
      hasher.update(s.as_bytes());
    }
    Value::Number(n) => {
      hasher.update([b'n']);
      hasher.update(n.to_le_bytes());
    }
    Value::Date(d) => {
      hasher.update([b'd']);
      hasher.update(d.to_string().as_bytes());
    }
    Value::Missing => hasher.update([b'm']),
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  fn attrs(pairs: &[(&str, Value)]) -> BTreeMap<String, Value> {
    pairs
      .iter()
      .map(|(k, v)| (k.to_string(), v.clone()))
      .collect()
  }

  #[test]
  fn keyed_identity_joins_key_and_list() {
    let id = resolve(Some("50-00-0"), "clp_annex_vi", None, &BTreeMap::new());
    assert_eq!(id.as_str(), "50-00-0|clp_annex_vi");
    assert!(!id.is_fallback());
  }

  #[test]
  fn same_key_and_list_always_resolve_identically() {
    let a = resolve(Some("64-17-5"), "reach_svhc", None, &BTreeMap::new());
    let b = resolve(
      Some("64-17-5"),
      "reach_svhc",
      Some("Ethanol"),
      &attrs(&[("hazard", Value::Text("H225".into()))]),
    );
    assert_eq!(a, b);
  }

  #[test]
  fn placeholder_keys_are_absent() {
    assert_eq!(normalize_key(&Value::Missing), None);
    assert_eq!(normalize_key(&Value::Text("".into())), None);
    assert_eq!(normalize_key(&Value::Text("   ".into())), None);
    assert_eq!(normalize_key(&Value::Text("-".into())), None);
    assert_eq!(normalize_key(&Value::Text("None".into())), None);
    assert_eq!(normalize_key(&Value::Text("none".into())), None);
  }

  #[test]
  fn keys_are_trimmed() {
    assert_eq!(
      normalize_key(&Value::Text("  50-00-0 ".into())),
      Some("50-00-0".into())
    );
  }

  #[test]
  fn float_artifacts_are_stripped() {
    assert_eq!(
      normalize_key(&Value::Text("50-00-0.0".into())),
      Some("50-00-0".into())
    );
    assert_eq!(
      normalize_key(&Value::Text("7732.0".into())),
      Some("7732".into())
    );
    // not a float artifact: the stem is not a bare registry number
    assert_eq!(
      normalize_key(&Value::Text("v2.0".into())),
      Some("v2.0".into())
    );
    assert_eq!(
      normalize_key(&Value::Text("1.0.0".into())),
      Some("1.0.0".into())
    );
  }

  #[test]
  fn numeric_keys_render_without_fraction() {
    assert_eq!(normalize_key(&Value::Number(7440.0)), Some("7440".into()));
    assert_eq!(normalize_key(&Value::Number(13.5)), Some("13.5".into()));
  }

  #[test]
  fn keyless_identity_is_stable_for_identical_content() {
    let fields = attrs(&[("hazard", Value::Text("H315".into()))]);
    let a = resolve(None, "biocides", Some("Mixture X"), &fields);
    let b = resolve(None, "biocides", Some("Mixture X"), &fields);
    assert_eq!(a, b);
    assert!(a.is_fallback());
    assert!(a.as_str().starts_with(NOKEY_PREFIX));
    assert!(a.as_str().ends_with("|biocides"));
  }

  #[test]
  fn keyless_identity_differs_when_content_differs() {
    let a = resolve(
      None,
      "biocides",
      Some("Mixture X"),
      &attrs(&[("hazard", Value::Text("H315".into()))]),
    );
    let b = resolve(
      None,
      "biocides",
      Some("Mixture X"),
      &attrs(&[("hazard", Value::Text("H319".into()))]),
    );
    assert_ne!(a, b);
  }

  #[test]
  fn keyless_identity_differs_across_lists() {
    let fields = attrs(&[("hazard", Value::Text("H315".into()))]);
    let a = resolve(None, "list_a", None, &fields);
    let b = resolve(None, "list_b", None, &fields);
    assert_ne!(a, b);
  }

  #[test]
  fn missing_and_empty_text_hash_differently() {
    let a = resolve(None, "l", None, &attrs(&[("x", Value::Missing)]));
    let b = resolve(None, "l", None, &attrs(&[("x", Value::Text("".into()))]));
    assert_ne!(a, b);
  }
}
