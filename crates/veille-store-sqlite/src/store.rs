//! [`SqliteStore`] — the SQLite implementation of [`SubstanceStore`].

use std::path::Path;

use rusqlite::OptionalExtension as _;

use veille_core::{
  history::{ChangeRecord, RunSummary},
  identity::Identity,
  record::SubstanceRecord,
  store::{ChangeQuery, SubstanceStore},
};

use crate::{
  Error, Result,
  encode::{RawChange, RawRecord, RawSummary},
  schema::SCHEMA,
};

// ─── Insert helpers ──────────────────────────────────────────────────────────

const INSERT_STATE: &str = "INSERT INTO current_state (
     identity, natural_key, display_name, source_list,
     attributes, created_at, updated_at
   ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)";

const INSERT_CHANGE: &str = "INSERT INTO change_history (
     change_id, change_type, source_list, natural_key, display_name,
     recorded_at, old_values, new_values, modified_fields
   ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)";

const INSERT_SUMMARY: &str = "INSERT INTO run_summaries (
     run_id, source_list, insertions, modifications, deletions,
     changed, run_at
   ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)";

// Callable on a Transaction as well, via its Deref to Connection.

fn insert_state_rows(
  conn: &rusqlite::Connection,
  rows: &[RawRecord],
) -> rusqlite::Result<()> {
  let mut stmt = conn.prepare(INSERT_STATE)?;
  for row in rows {
    stmt.execute(rusqlite::params![
      row.identity,
      row.natural_key,
      row.display_name,
      row.source_list,
      row.attributes,
      row.created_at,
      row.updated_at,
    ])?;
  }
  Ok(())
}

fn insert_change_rows(
  conn: &rusqlite::Connection,
  rows: &[RawChange],
) -> rusqlite::Result<()> {
  let mut stmt = conn.prepare(INSERT_CHANGE)?;
  for row in rows {
    stmt.execute(rusqlite::params![
      row.change_id,
      row.change_type,
      row.source_list,
      row.natural_key,
      row.display_name,
      row.recorded_at,
      row.old_values,
      row.new_values,
      row.modified_fields,
    ])?;
  }
  Ok(())
}

fn insert_summary_rows(
  conn: &rusqlite::Connection,
  rows: &[RawSummary],
) -> rusqlite::Result<()> {
  let mut stmt = conn.prepare(INSERT_SUMMARY)?;
  for row in rows {
    stmt.execute(rusqlite::params![
      row.run_id,
      row.source_list,
      row.insertions,
      row.modifications,
      row.deletions,
      row.changed,
      row.run_at,
    ])?;
  }
  Ok(())
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A veille substance store backed by a single SQLite file.
///
/// Clones share one reference-counted connection, so handing a clone to
/// each API handler costs nothing.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) the database at `path` and apply the schema.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open a store over an in-memory database, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── SubstanceStore impl ─────────────────────────────────────────────────────

impl SubstanceStore for SqliteStore {
  type Error = Error;

  // ── Current state ─────────────────────────────────────────────────────────

  async fn load_state(&self) -> Result<Vec<SubstanceRecord>> {
    let raws: Vec<RawRecord> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT identity, natural_key, display_name, source_list,
                  attributes, created_at, updated_at
           FROM current_state
           ORDER BY identity",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawRecord {
              identity:     row.get(0)?,
              natural_key:  row.get(1)?,
              display_name: row.get(2)?,
              source_list:  row.get(3)?,
              attributes:   row.get(4)?,
              created_at:   row.get(5)?,
              updated_at:   row.get(6)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRecord::into_record).collect()
  }

  async fn get_record(
    &self,
    identity: Identity,
  ) -> Result<Option<SubstanceRecord>> {
    let id_str = identity.into_inner();

    let raw: Option<RawRecord> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT identity, natural_key, display_name, source_list,
                    attributes, created_at, updated_at
             FROM current_state WHERE identity = ?1",
            rusqlite::params![id_str],
            |row| {
              Ok(RawRecord {
                identity:     row.get(0)?,
                natural_key:  row.get(1)?,
                display_name: row.get(2)?,
                source_list:  row.get(3)?,
                attributes:   row.get(4)?,
                created_at:   row.get(5)?,
                updated_at:   row.get(6)?,
              })
            },
          )
          .optional()?)
      })
      .await?;

    raw.map(RawRecord::into_record).transpose()
  }

  async fn replace_state(&self, records: Vec<SubstanceRecord>) -> Result<()> {
    let rows = records
      .iter()
      .map(RawRecord::from_record)
      .collect::<Result<Vec<_>>>()?;

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM current_state", [])?;
        insert_state_rows(&tx, &rows)?;
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── History — append-only writes ──────────────────────────────────────────

  async fn append_changes(&self, changes: Vec<ChangeRecord>) -> Result<()> {
    if changes.is_empty() {
      return Ok(());
    }
    let rows = changes
      .iter()
      .map(RawChange::from_change)
      .collect::<Result<Vec<_>>>()?;

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        insert_change_rows(&tx, &rows)?;
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn append_summaries(&self, summaries: Vec<RunSummary>) -> Result<()> {
    if summaries.is_empty() {
      return Ok(());
    }
    let rows: Vec<RawSummary> =
      summaries.iter().map(RawSummary::from_summary).collect();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        insert_summary_rows(&tx, &rows)?;
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn apply_run(
    &self,
    state: Option<Vec<SubstanceRecord>>,
    changes: Vec<ChangeRecord>,
    summaries: Vec<RunSummary>,
  ) -> Result<()> {
    let state_rows = state
      .as_deref()
      .map(|records| {
        records
          .iter()
          .map(RawRecord::from_record)
          .collect::<Result<Vec<_>>>()
      })
      .transpose()?;
    let change_rows = changes
      .iter()
      .map(RawChange::from_change)
      .collect::<Result<Vec<_>>>()?;
    let summary_rows: Vec<RawSummary> =
      summaries.iter().map(RawSummary::from_summary).collect();

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if let Some(rows) = &state_rows {
          tx.execute("DELETE FROM current_state", [])?;
          insert_state_rows(&tx, rows)?;
        }
        insert_change_rows(&tx, &change_rows)?;
        insert_summary_rows(&tx, &summary_rows)?;
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn query_changes(
    &self,
    query: &ChangeQuery,
  ) -> Result<Vec<ChangeRecord>> {
    let type_str = query.change_type.map(|t| t.as_str().to_owned());
    let list_str = query.source_list.clone();
    let key_str = query.key.clone();
    let limit = query.limit.map(|n| n as i64).unwrap_or(-1);

    let raws: Vec<RawChange> = self
      .conn
      .call(move |conn| {
        // Build WHERE clause dynamically.
        let mut conds: Vec<&'static str> = vec![];
        if type_str.is_some() {
          conds.push("change_type = ?1");
        }
        if list_str.is_some() {
          conds.push("source_list = ?2");
        }
        if key_str.is_some() {
          conds.push("natural_key = ?3");
        }

        let where_clause = if conds.is_empty() {
          String::new()
        } else {
          format!("WHERE {}", conds.join(" AND "))
        };

        // LIMIT -1 means unbounded. rowid keeps each run's production order
        // stable under the newest-first sort.
        let sql = format!(
          "SELECT change_id, change_type, source_list, natural_key,
                  display_name, recorded_at, old_values, new_values,
                  modified_fields
           FROM change_history
           {where_clause}
           ORDER BY recorded_at DESC, rowid
           LIMIT ?4"
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(
            rusqlite::params![
              type_str.as_deref(),
              list_str.as_deref(),
              key_str.as_deref(),
              limit,
            ],
            |row| {
              Ok(RawChange {
                change_id:       row.get(0)?,
                change_type:     row.get(1)?,
                source_list:     row.get(2)?,
                natural_key:     row.get(3)?,
                display_name:    row.get(4)?,
                recorded_at:     row.get(5)?,
                old_values:      row.get(6)?,
                new_values:      row.get(7)?,
                modified_fields: row.get(8)?,
              })
            },
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawChange::into_change).collect()
  }

  async fn summaries(&self, limit: Option<usize>) -> Result<Vec<RunSummary>> {
    let limit = limit.map(|n| n as i64).unwrap_or(-1);

    let raws: Vec<RawSummary> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT run_id, source_list, insertions, modifications, deletions,
                  changed, run_at
           FROM run_summaries
           ORDER BY run_at DESC, rowid
           LIMIT ?1",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![limit], |row| {
            Ok(RawSummary {
              run_id:        row.get(0)?,
              source_list:   row.get(1)?,
              insertions:    row.get(2)?,
              modifications: row.get(3)?,
              deletions:     row.get(4)?,
              changed:       row.get(5)?,
              run_at:        row.get(6)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSummary::into_summary).collect()
  }
}
