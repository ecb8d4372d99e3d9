//! `SqliteStore` exercised end to end over in-memory databases.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use uuid::Uuid;
use veille_core::{
  history::{ChangeRecord, ChangeType, RunSummary},
  record::{NewRecord, SubstanceRecord},
  store::{ChangeQuery, SubstanceStore},
  value::Value,
};

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn ts(hour: u32) -> DateTime<Utc> {
  Utc.with_ymd_and_hms(2024, 3, 1, hour, 0, 0).unwrap()
}

fn record(list: &str, key: &str, hazard: &str) -> SubstanceRecord {
  let new = NewRecord::from_cells(
    list,
    &Value::Text(key.into()),
    &Value::Text(format!("Substance {key}")),
    [("hazard".to_string(), Value::Text(hazard.into()))]
      .into_iter()
      .collect(),
  );
  SubstanceRecord::from_new(new, ts(8), ts(8))
}

fn insertion(list: &str, key: &str, at: DateTime<Utc>) -> ChangeRecord {
  ChangeRecord::insertion(
    list,
    key,
    Some(format!("Substance {key}")),
    [("hazard".to_string(), Value::Text("H350".into()))]
      .into_iter()
      .collect(),
    at,
  )
}

fn deletion(list: &str, key: &str, at: DateTime<Utc>) -> ChangeRecord {
  ChangeRecord::deletion(
    list,
    key,
    Some(format!("Substance {key}")),
    [("hazard".to_string(), Value::Text("H350".into()))]
      .into_iter()
      .collect(),
    at,
  )
}

fn summary(list: &str, insertions: usize, at: DateTime<Utc>) -> RunSummary {
  RunSummary {
    run_id: Uuid::new_v4(),
    source_list: list.to_string(),
    insertions,
    modifications: 0,
    deletions: 0,
    changed: insertions > 0,
    run_at: at,
  }
}

// ─── Current state ───────────────────────────────────────────────────────────

#[tokio::test]
async fn replace_and_load_state_roundtrip() {
  let s = store().await;

  let records = vec![
    record("clp_annex_vi", "50-00-0", "H350"),
    record("reach_svhc", "64-17-5", "H225"),
  ];
  s.replace_state(records.clone()).await.unwrap();

  let mut loaded = s.load_state().await.unwrap();
  loaded.sort_by(|a, b| a.source_list.cmp(&b.source_list));
  assert_eq!(loaded, records);
}

#[tokio::test]
async fn replace_state_overwrites_the_previous_table() {
  let s = store().await;

  s.replace_state(vec![
    record("clp_annex_vi", "50-00-0", "H350"),
    record("clp_annex_vi", "64-17-5", "H225"),
  ])
  .await
  .unwrap();
  s.replace_state(vec![record("clp_annex_vi", "71-43-2", "H350")])
    .await
    .unwrap();

  let loaded = s.load_state().await.unwrap();
  assert_eq!(loaded.len(), 1);
  assert_eq!(loaded[0].natural_key.as_deref(), Some("71-43-2"));
}

#[tokio::test]
async fn get_record_by_identity() {
  let s = store().await;

  let target = record("clp_annex_vi", "50-00-0", "H350");
  s.replace_state(vec![target.clone()]).await.unwrap();

  let fetched = s.get_record(target.identity.clone()).await.unwrap();
  assert_eq!(fetched, Some(target));
}

#[tokio::test]
async fn get_record_missing_returns_none() {
  let s = store().await;
  let fetched = s.get_record("50-00-0|clp_annex_vi".into()).await.unwrap();
  assert!(fetched.is_none());
}

#[tokio::test]
async fn attributes_roundtrip_every_value_kind() {
  let s = store().await;

  let attributes: BTreeMap<String, Value> = [
    ("cas".to_string(), Value::Text("50-00-0".into())),
    ("limit_ppm".to_string(), Value::Number(0.3)),
    (
      "entry_date".to_string(),
      Value::Date(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()),
    ),
    ("note".to_string(), Value::Missing),
  ]
  .into_iter()
  .collect();
  let new = NewRecord::from_cells(
    "clp_annex_vi",
    &Value::Text("50-00-0".into()),
    &Value::Text("Formaldehyde".into()),
    attributes,
  );
  let target = SubstanceRecord::from_new(new, ts(8), ts(8));

  s.replace_state(vec![target.clone()]).await.unwrap();
  let loaded = s.load_state().await.unwrap();
  assert_eq!(loaded, vec![target]);
}

#[tokio::test]
async fn keyless_record_roundtrips_with_fallback_identity() {
  let s = store().await;

  let new = NewRecord::from_cells(
    "reach_svhc",
    &Value::Missing,
    &Value::Text("Unnamed mixture".into()),
    BTreeMap::new(),
  );
  let target = SubstanceRecord::from_new(new, ts(8), ts(8));
  assert!(target.identity.is_fallback());

  s.replace_state(vec![target.clone()]).await.unwrap();
  let loaded = s.load_state().await.unwrap();
  assert_eq!(loaded, vec![target]);
  assert!(loaded[0].natural_key.is_none());
}

// ─── History ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn append_changes_and_query_everything() {
  let s = store().await;

  s.append_changes(vec![
    insertion("clp_annex_vi", "50-00-0", ts(6)),
    deletion("clp_annex_vi", "64-17-5", ts(6)),
  ])
  .await
  .unwrap();

  let all = s.query_changes(&ChangeQuery::default()).await.unwrap();
  assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn query_changes_filters_by_type() {
  let s = store().await;

  s.append_changes(vec![
    insertion("clp_annex_vi", "50-00-0", ts(6)),
    deletion("clp_annex_vi", "64-17-5", ts(6)),
  ])
  .await
  .unwrap();

  let deletions = s
    .query_changes(&ChangeQuery {
      change_type: Some(ChangeType::Deletion),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(deletions.len(), 1);
  assert_eq!(deletions[0].key, "64-17-5");
}

#[tokio::test]
async fn query_changes_filters_by_list() {
  let s = store().await;

  s.append_changes(vec![
    insertion("clp_annex_vi", "50-00-0", ts(6)),
    insertion("reach_svhc", "64-17-5", ts(6)),
  ])
  .await
  .unwrap();

  let svhc = s
    .query_changes(&ChangeQuery {
      source_list: Some("reach_svhc".into()),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(svhc.len(), 1);
  assert_eq!(svhc[0].source_list, "reach_svhc");
}

#[tokio::test]
async fn query_changes_filters_by_key() {
  let s = store().await;

  s.append_changes(vec![
    insertion("clp_annex_vi", "50-00-0", ts(6)),
    insertion("reach_svhc", "50-00-0", ts(7)),
    insertion("clp_annex_vi", "64-17-5", ts(6)),
  ])
  .await
  .unwrap();

  let hits = s
    .query_changes(&ChangeQuery {
      key: Some("50-00-0".into()),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(hits.len(), 2);
  assert!(hits.iter().all(|c| c.key == "50-00-0"));
}

#[tokio::test]
async fn query_changes_conjoins_filters() {
  let s = store().await;

  s.append_changes(vec![
    insertion("clp_annex_vi", "50-00-0", ts(6)),
    deletion("clp_annex_vi", "50-00-0", ts(7)),
    insertion("reach_svhc", "50-00-0", ts(6)),
  ])
  .await
  .unwrap();

  let hits = s
    .query_changes(&ChangeQuery {
      change_type: Some(ChangeType::Insertion),
      source_list: Some("clp_annex_vi".into()),
      key: Some("50-00-0".into()),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(hits.len(), 1);
  assert_eq!(hits[0].change_type, ChangeType::Insertion);
}

#[tokio::test]
async fn query_changes_returns_newest_run_first() {
  let s = store().await;

  s.append_changes(vec![insertion("clp_annex_vi", "50-00-0", ts(6))])
    .await
    .unwrap();
  s.append_changes(vec![insertion("clp_annex_vi", "64-17-5", ts(9))])
    .await
    .unwrap();

  let all = s.query_changes(&ChangeQuery::default()).await.unwrap();
  assert_eq!(all[0].key, "64-17-5");
  assert_eq!(all[1].key, "50-00-0");
}

#[tokio::test]
async fn query_changes_limit_caps_the_newest() {
  let s = store().await;

  s.append_changes(vec![insertion("clp_annex_vi", "50-00-0", ts(6))])
    .await
    .unwrap();
  s.append_changes(vec![insertion("clp_annex_vi", "64-17-5", ts(9))])
    .await
    .unwrap();

  let capped = s
    .query_changes(&ChangeQuery { limit: Some(1), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(capped.len(), 1);
  assert_eq!(capped[0].key, "64-17-5");
}

#[tokio::test]
async fn change_payloads_roundtrip() {
  let s = store().await;

  let old_values: BTreeMap<String, Value> =
    [("hazard".to_string(), Value::Text("H350".into()))]
      .into_iter()
      .collect();
  let new_values: BTreeMap<String, Value> =
    [("hazard".to_string(), Value::Text("H351".into()))]
      .into_iter()
      .collect();
  let change = ChangeRecord::modification(
    "clp_annex_vi",
    "50-00-0",
    Some("Formaldehyde".into()),
    old_values.clone(),
    new_values.clone(),
    vec!["hazard".to_string()],
    ts(6),
  );

  s.append_changes(vec![change.clone()]).await.unwrap();
  let all = s.query_changes(&ChangeQuery::default()).await.unwrap();
  assert_eq!(all, vec![change]);
}

#[tokio::test]
async fn append_empty_batches_is_a_noop() {
  let s = store().await;

  s.append_changes(vec![]).await.unwrap();
  s.append_summaries(vec![]).await.unwrap();

  assert!(s.query_changes(&ChangeQuery::default()).await.unwrap().is_empty());
  assert!(s.summaries(None).await.unwrap().is_empty());
}

// ─── Run application ─────────────────────────────────────────────────────────

#[tokio::test]
async fn apply_run_persists_state_history_and_summaries_together() {
  let s = store().await;

  s.apply_run(
    Some(vec![record("clp_annex_vi", "50-00-0", "H350")]),
    vec![insertion("clp_annex_vi", "50-00-0", ts(6))],
    vec![summary("clp_annex_vi", 1, ts(6))],
  )
  .await
  .unwrap();

  assert_eq!(s.load_state().await.unwrap().len(), 1);
  assert_eq!(
    s.query_changes(&ChangeQuery::default()).await.unwrap().len(),
    1
  );
  assert_eq!(s.summaries(None).await.unwrap().len(), 1);
}

#[tokio::test]
async fn apply_run_without_state_leaves_the_table_alone() {
  let s = store().await;

  s.replace_state(vec![record("clp_annex_vi", "50-00-0", "H350")])
    .await
    .unwrap();
  s.apply_run(None, vec![], vec![summary("clp_annex_vi", 0, ts(9))])
    .await
    .unwrap();

  let loaded = s.load_state().await.unwrap();
  assert_eq!(loaded.len(), 1);
  let summaries = s.summaries(None).await.unwrap();
  assert_eq!(summaries.len(), 1);
  assert!(!summaries[0].changed);
}

// ─── Summaries ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn summaries_come_back_newest_first() {
  let s = store().await;

  s.append_summaries(vec![summary("clp_annex_vi", 3, ts(6))])
    .await
    .unwrap();
  s.append_summaries(vec![summary("clp_annex_vi", 0, ts(9))])
    .await
    .unwrap();

  let all = s.summaries(None).await.unwrap();
  assert_eq!(all.len(), 2);
  assert_eq!(all[0].run_at, ts(9));
  assert_eq!(all[1].run_at, ts(6));
}

#[tokio::test]
async fn summaries_limit_caps_the_newest() {
  let s = store().await;

  s.append_summaries(vec![summary("clp_annex_vi", 3, ts(6))])
    .await
    .unwrap();
  s.append_summaries(vec![summary("clp_annex_vi", 1, ts(9))])
    .await
    .unwrap();

  let capped = s.summaries(Some(1)).await.unwrap();
  assert_eq!(capped.len(), 1);
  assert_eq!(capped[0].run_at, ts(9));
}

#[tokio::test]
async fn summary_counts_roundtrip() {
  let s = store().await;

  let target = RunSummary {
    run_id: Uuid::new_v4(),
    source_list: "reach_svhc".to_string(),
    insertions: 2,
    modifications: 5,
    deletions: 1,
    changed: true,
    run_at: ts(6),
  };
  s.append_summaries(vec![target.clone()]).await.unwrap();

  let all = s.summaries(None).await.unwrap();
  assert_eq!(all, vec![target]);
}
