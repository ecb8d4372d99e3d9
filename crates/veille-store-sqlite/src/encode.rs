//! Conversions between the domain types and the text columns that hold them.
//!
//! Timestamps travel as RFC 3339 strings, attribute maps and modified-field
//! lists as compact JSON, and UUIDs as hyphenated lowercase strings.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;
use veille_core::{
  history::{ChangeRecord, ChangeType, RunSummary},
  identity::Identity,
  record::SubstanceRecord,
  value::Value,
};

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Field maps ──────────────────────────────────────────────────────────────

pub fn encode_attributes(map: &BTreeMap<String, Value>) -> Result<String> {
  Ok(serde_json::to_string(map)?)
}

pub fn decode_attributes(s: &str) -> Result<BTreeMap<String, Value>> {
  Ok(serde_json::from_str(s)?)
}

pub fn encode_fields(fields: &[String]) -> Result<String> {
  Ok(serde_json::to_string(fields)?)
}

pub fn decode_fields(s: &str) -> Result<Vec<String>> {
  Ok(serde_json::from_str(s)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings mirroring one `current_state` row.
pub struct RawRecord {
  pub identity:     String,
  pub natural_key:  Option<String>,
  pub display_name: Option<String>,
  pub source_list:  String,
  pub attributes:   String,
  pub created_at:   String,
  pub updated_at:   String,
}

impl RawRecord {
  pub fn from_record(record: &SubstanceRecord) -> Result<Self> {
    Ok(Self {
      identity:     record.identity.as_str().to_owned(),
      natural_key:  record.natural_key.clone(),
      display_name: record.display_name.clone(),
      source_list:  record.source_list.clone(),
      attributes:   encode_attributes(&record.attributes)?,
      created_at:   encode_dt(record.created_at),
      updated_at:   encode_dt(record.updated_at),
    })
  }

  pub fn into_record(self) -> Result<SubstanceRecord> {
    Ok(SubstanceRecord {
      identity:     Identity::from(self.identity),
      natural_key:  self.natural_key,
      display_name: self.display_name,
      source_list:  self.source_list,
      attributes:   decode_attributes(&self.attributes)?,
      created_at:   decode_dt(&self.created_at)?,
      updated_at:   decode_dt(&self.updated_at)?,
    })
  }
}

/// Raw strings mirroring one `change_history` row.
pub struct RawChange {
  pub change_id:       String,
  pub change_type:     String,
  pub source_list:     String,
  pub natural_key:     String,
  pub display_name:    Option<String>,
  pub recorded_at:     String,
  pub old_values:      Option<String>,
  pub new_values:      Option<String>,
  pub modified_fields: String,
}

impl RawChange {
  pub fn from_change(change: &ChangeRecord) -> Result<Self> {
    let old_values =
      change.old_values.as_ref().map(encode_attributes).transpose()?;
    let new_values =
      change.new_values.as_ref().map(encode_attributes).transpose()?;

    Ok(Self {
      change_id: encode_uuid(change.change_id),
      change_type: change.change_type.as_str().to_owned(),
      source_list: change.source_list.clone(),
      natural_key: change.key.clone(),
      display_name: change.display_name.clone(),
      recorded_at: encode_dt(change.recorded_at),
      old_values,
      new_values,
      modified_fields: encode_fields(&change.modified_fields)?,
    })
  }

  pub fn into_change(self) -> Result<ChangeRecord> {
    let old_values =
      self.old_values.as_deref().map(decode_attributes).transpose()?;
    let new_values =
      self.new_values.as_deref().map(decode_attributes).transpose()?;

    Ok(ChangeRecord {
      change_id: decode_uuid(&self.change_id)?,
      change_type: ChangeType::parse(&self.change_type)?,
      source_list: self.source_list,
      key: self.natural_key,
      display_name: self.display_name,
      recorded_at: decode_dt(&self.recorded_at)?,
      old_values,
      new_values,
      modified_fields: decode_fields(&self.modified_fields)?,
    })
  }
}

/// Raw values mirroring one `run_summaries` row.
pub struct RawSummary {
  pub run_id:        String,
  pub source_list:   String,
  pub insertions:    i64,
  pub modifications: i64,
  pub deletions:     i64,
  pub changed:       bool,
  pub run_at:        String,
}

impl RawSummary {
  pub fn from_summary(summary: &RunSummary) -> Self {
    Self {
      run_id:        encode_uuid(summary.run_id),
      source_list:   summary.source_list.clone(),
      insertions:    summary.insertions as i64,
      modifications: summary.modifications as i64,
      deletions:     summary.deletions as i64,
      changed:       summary.changed,
      run_at:        encode_dt(summary.run_at),
    }
  }

  pub fn into_summary(self) -> Result<RunSummary> {
    Ok(RunSummary {
      run_id:        decode_uuid(&self.run_id)?,
      source_list:   self.source_list,
      insertions:    self.insertions as usize,
      modifications: self.modifications as usize,
      deletions:     self.deletions as usize,
      changed:       self.changed,
      run_at:        decode_dt(&self.run_at)?,
    })
  }
}
