//! SQL schema for the veille SQLite store.
//!
//! Applied on every open; `PRAGMA user_version` records the schema
//! revision so later migrations know where they start from.

/// Full schema DDL. Safe to re-run: everything is `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- One row per living identity; replaced wholesale on each run that moves
-- the state.
CREATE TABLE IF NOT EXISTS current_state (
    identity     TEXT PRIMARY KEY,
    natural_key  TEXT,            -- NULL for fallback identities
    display_name TEXT,
    source_list  TEXT NOT NULL,
    attributes   TEXT NOT NULL,   -- JSON map of tagged cell values
    created_at   TEXT NOT NULL,   -- ISO 8601 UTC; first run the identity appeared
    updated_at   TEXT NOT NULL    -- ISO 8601 UTC; last run a field moved
);

-- Append-only. Nothing ever UPDATEs or DELETEs a history row.
CREATE TABLE IF NOT EXISTS change_history (
    change_id       TEXT PRIMARY KEY,
    change_type     TEXT NOT NULL,   -- 'insertion' | 'deletion' | 'modification'
    source_list     TEXT NOT NULL,
    natural_key     TEXT NOT NULL,
    display_name    TEXT,
    recorded_at     TEXT NOT NULL,   -- ISO 8601 UTC; the run timestamp
    old_values      TEXT,            -- JSON map or NULL (insertions)
    new_values      TEXT,            -- JSON map or NULL (deletions)
    modified_fields TEXT NOT NULL DEFAULT '[]'
);

-- Append-only journal. One row per source list per run, including runs
-- that changed nothing.
CREATE TABLE IF NOT EXISTS run_summaries (
    run_id        TEXT NOT NULL,
    source_list   TEXT NOT NULL,
    insertions    INTEGER NOT NULL,
    modifications INTEGER NOT NULL,
    deletions     INTEGER NOT NULL,
    changed       INTEGER NOT NULL,   -- 0 | 1
    run_at        TEXT NOT NULL,
    PRIMARY KEY (run_id, source_list)
);

CREATE INDEX IF NOT EXISTS state_list_idx       ON current_state(source_list);
CREATE INDEX IF NOT EXISTS history_type_idx     ON change_history(change_type);
CREATE INDEX IF NOT EXISTS history_list_idx     ON change_history(source_list);
CREATE INDEX IF NOT EXISTS history_key_idx      ON change_history(natural_key);
CREATE INDEX IF NOT EXISTS history_recorded_idx ON change_history(recorded_at);
CREATE INDEX IF NOT EXISTS summaries_run_idx    ON run_summaries(run_at);

PRAGMA user_version = 1;
";
