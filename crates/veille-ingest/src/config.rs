//! Engine configuration, deserialised from `veille.toml`.

use std::{
  collections::BTreeSet,
  path::{Path, PathBuf},
};

use serde::Deserialize;

use crate::error::{Error, Result};

/// One configured source list.
#[derive(Debug, Clone, Deserialize)]
pub struct ListSpec {
  /// Stable machine name; becomes `source_list` on every row.
  pub name:        String,
  /// Snapshot file name under `data_dir`.
  pub file:        String,
  /// Column holding the natural key (e.g. the CAS number).
  pub key_column:  String,
  /// Column holding the human-readable substance name, if the list has one.
  pub name_column: Option<String>,
  pub description: Option<String>,
}

/// Runtime engine configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
  pub store_path:  PathBuf,
  /// Directory the snapshot files are read from.
  pub data_dir:    PathBuf,
  /// Move consumed snapshot files into `archive_dir` after a run.
  #[serde(default)]
  pub archive:     bool,
  #[serde(default = "default_archive_dir")]
  pub archive_dir: PathBuf,
  pub lists:       Vec<ListSpec>,
}

fn default_archive_dir() -> PathBuf { PathBuf::from("data/archive") }

impl EngineConfig {
  /// Load and validate the configuration at `path`. Environment variables
  /// prefixed `VEILLE_` override file values.
  pub fn load(path: &Path) -> Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path.to_path_buf()))
      .add_source(config::Environment::with_prefix("VEILLE"))
      .build()
      .map_err(|e| Error::Configuration(e.to_string()))?;

    let config: EngineConfig = settings
      .try_deserialize()
      .map_err(|e| Error::Configuration(e.to_string()))?;
    config.validate()?;
    Ok(config)
  }

  /// Where the snapshot file for `list` is expected before a run.
  pub fn snapshot_path(&self, list: &ListSpec) -> PathBuf {
    self.data_dir.join(&list.file)
  }

  fn validate(&self) -> Result<()> {
    if self.lists.is_empty() {
      return Err(Error::Configuration(
        "at least one [[lists]] entry is required".into(),
      ));
    }
    let mut seen = BTreeSet::new();
    for list in &self.lists {
      if !seen.insert(list.name.as_str()) {
        return Err(Error::Configuration(format!(
          "duplicate list name: {:?}",
          list.name
        )));
      }
    }
    Ok(())
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  fn write_config(dir: &tempfile::TempDir, body: &str) -> PathBuf {
    let path = dir.path().join("veille.toml");
    std::fs::write(&path, body).unwrap();
    path
  }

  #[test]
  fn full_config_parses() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
      &dir,
      r#"
store_path  = "veille.db"
data_dir    = "data/input"
archive     = true
archive_dir = "attic"

[[lists]]
name        = "clp_annex_vi"
file        = "clp.json"
key_column  = "cas_id"
name_column = "cas_name"
description = "CLP Annex VI harmonised classifications"

[[lists]]
name       = "reach_svhc"
file       = "svhc.json"
key_column = "cas"
"#,
    );

    let config = EngineConfig::load(&path).unwrap();
    assert_eq!(config.store_path, PathBuf::from("veille.db"));
    assert!(config.archive);
    assert_eq!(config.archive_dir, PathBuf::from("attic"));
    assert_eq!(config.lists.len(), 2);
    assert_eq!(config.lists[0].name_column.as_deref(), Some("cas_name"));
    assert!(config.lists[1].name_column.is_none());
  }

  #[test]
  fn archive_defaults_off() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
      &dir,
      r#"
store_path = "veille.db"
data_dir   = "in"

[[lists]]
name       = "l"
file       = "l.json"
key_column = "k"
"#,
    );

    let config = EngineConfig::load(&path).unwrap();
    assert!(!config.archive);
    assert_eq!(config.archive_dir, PathBuf::from("data/archive"));
  }

  #[test]
  fn snapshot_path_joins_data_dir() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
      &dir,
      r#"
store_path = "veille.db"
data_dir   = "data/input"

[[lists]]
name       = "clp_annex_vi"
file       = "clp.json"
key_column = "cas_id"
"#,
    );

    let config = EngineConfig::load(&path).unwrap();
    assert_eq!(
      config.snapshot_path(&config.lists[0]),
      PathBuf::from("data/input/clp.json")
    );
  }

  #[test]
  fn missing_lists_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
      &dir,
      r#"
store_path = "veille.db"
data_dir   = "in"
lists      = []
"#,
    );

    let err = EngineConfig::load(&path).unwrap_err();
    assert!(matches!(err, Error::Configuration(_)));
  }

  #[test]
  fn duplicate_list_names_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
      &dir,
      r#"
store_path = "veille.db"
data_dir   = "in"

[[lists]]
name       = "same"
file       = "a.json"
key_column = "k"

[[lists]]
name       = "same"
file       = "b.json"
key_column = "k"
"#,
    );

    let err = EngineConfig::load(&path).unwrap_err();
    assert!(matches!(err, Error::Configuration(_)));
  }
}
