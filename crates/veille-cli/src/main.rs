//! `veille` — regulatory substance list watcher.
//!
//! # Usage
//!
//! ```
//! veille run                                    # ingest configured snapshots
//! veille state --list clp_annex_vi
//! veille history --change-type modification --limit 20
//! veille summaries
//! veille serve --port 8210                      # read-only JSON API
//! ```
//!
//! All subcommands read `veille.toml` (or the path given with `--config`);
//! any config key can be overridden through `VEILLE_`-prefixed environment
//! variables.

use std::{collections::BTreeMap, path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use veille_core::{
  history::{ChangeRecord, ChangeType, RunSummary},
  record::SubstanceRecord,
  store::{ChangeQuery, SubstanceStore},
  value::Value,
};
use veille_ingest::{
  config::EngineConfig,
  run::{RunOutcome, RunReport},
};
use veille_store_sqlite::SqliteStore;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(author, version, about = "Regulatory substance list watcher")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "veille.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Ingest every configured snapshot and record the changes.
  Run,
  /// Print the current state table.
  State {
    /// Restrict to one source list.
    #[arg(long)]
    list: Option<String>,
  },
  /// Print the change history, newest first.
  History {
    /// One of `insertion`, `deletion`, `modification`.
    #[arg(long)]
    change_type: Option<String>,

    /// Restrict to one source list.
    #[arg(long)]
    list: Option<String>,

    /// Exact natural key, e.g. a CAS number.
    #[arg(long)]
    key: Option<String>,

    #[arg(long, default_value_t = 50)]
    limit: usize,
  },
  /// Print per-list run summaries, newest first.
  Summaries {
    #[arg(long, default_value_t = 20)]
    limit: usize,
  },
  /// Serve the read-only JSON API over HTTP.
  Serve {
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    #[arg(long, default_value_t = 8210)]
    port: u16,
  },
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let config = EngineConfig::load(&cli.config)
    .with_context(|| format!("failed to read config at {:?}", cli.config))?;

  let store = SqliteStore::open(&config.store_path)
    .await
    .with_context(|| {
      format!("failed to open store at {:?}", config.store_path)
    })?;

  match cli.command {
    Command::Run => {
      let report = veille_ingest::run::run_batch(&config, &store).await?;
      print_report(&report);
    }
    Command::State { list } => {
      let mut records = store.load_state().await?;
      if let Some(list) = &list {
        records.retain(|r| &r.source_list == list);
      }
      for record in &records {
        print_record(record);
      }
    }
    Command::History { change_type, list, key, limit } => {
      let change_type = change_type
        .as_deref()
        .map(ChangeType::parse)
        .transpose()?;
      let query = ChangeQuery {
        change_type,
        source_list: list,
        key,
        limit: Some(limit),
      };
      for change in &store.query_changes(&query).await? {
        print_change(change);
      }
    }
    Command::Summaries { limit } => {
      for summary in &store.summaries(Some(limit)).await? {
        print_summary(summary);
      }
    }
    Command::Serve { host, port } => {
      serve(store, &host, port).await?;
    }
  }

  Ok(())
}

async fn serve(
  store: SqliteStore,
  host: &str,
  port: u16,
) -> anyhow::Result<()> {
  let app =
    veille_api::api_router(Arc::new(store)).layer(TraceLayer::new_for_http());
  let address = format!("{host}:{port}");

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

// ─── Output ───────────────────────────────────────────────────────────────────

fn print_report(report: &RunReport) {
  let outcome = match report.outcome {
    RunOutcome::Applied => "applied",
    RunOutcome::NoChange => "no change",
  };
  println!(
    "run {} at {}: {outcome}",
    report.run_id,
    report.run_at.format("%Y-%m-%d %H:%M:%S")
  );
  for summary in &report.summaries {
    println!(
      "  {}: +{} ~{} -{}",
      summary.source_list,
      summary.insertions,
      summary.modifications,
      summary.deletions
    );
  }
  if report.dropped_duplicates > 0 {
    println!("  dropped {} duplicate rows", report.dropped_duplicates);
  }
}

fn print_record(record: &SubstanceRecord) {
  let name = record.display_name.as_deref().unwrap_or("-");
  println!(
    "{}  {}  (updated {})",
    record.identity,
    name,
    record.updated_at.format("%Y-%m-%d")
  );
}

fn print_change(change: &ChangeRecord) {
  let when = change.recorded_at.format("%Y-%m-%d %H:%M");
  let marker = match change.change_type {
    ChangeType::Insertion => "+",
    ChangeType::Deletion => "-",
    ChangeType::Modification => "~",
  };
  let name = change.display_name.as_deref().unwrap_or("-");
  println!("{when}  {marker} [{}] {}  {name}", change.source_list, change.key);
  for field in &change.modified_fields {
    let old = field_value(change.old_values.as_ref(), field);
    let new = field_value(change.new_values.as_ref(), field);
    println!("      {field}: {old} -> {new}");
  }
}

fn print_summary(summary: &RunSummary) {
  let flag = if summary.changed { "changed" } else { "quiet" };
  println!(
    "{}  {}: +{} ~{} -{} ({flag})",
    summary.run_at.format("%Y-%m-%d %H:%M"),
    summary.source_list,
    summary.insertions,
    summary.modifications,
    summary.deletions
  );
}

fn field_value(
  values: Option<&BTreeMap<String, Value>>,
  field: &str,
) -> String {
  match values.and_then(|m| m.get(field)) {
    Some(v) if !v.is_missing() => v.to_string(),
    _ => "-".to_string(),
  }
}
