//! Reconciliation of the simple child tables: key/value pairs (legalities,
//! images) and bare values (types, subtypes, rules).

use std::collections::BTreeMap;

use rusqlite::{Connection, ToSql};
use tcgsync_core::reconcile::{ReconcileReport, reconcile};

use crate::Result;

/// A child table holding `key → value` rows scoped to one parent.
pub struct PairTable {
  pub table: &'static str,
  pub scope: &'static str,
  pub key:   &'static str,
  pub value: &'static str,
}

pub const SET_LEGALITIES: PairTable =
  PairTable { table: "set_legalities", scope: "set_id", key: "format", value: "legality" };

pub const SET_IMAGES: PairTable =
  PairTable { table: "set_images", scope: "set_id", key: "image_type", value: "url" };

pub const CARD_IMAGES: PairTable =
  PairTable { table: "card_images", scope: "card_id", key: "resolution", value: "url" };

/// A child table holding bare values scoped to one parent. The value is the
/// natural key, so rows are only ever inserted or deleted.
pub struct ValueTable {
  pub table: &'static str,
  pub scope: &'static str,
  pub value: &'static str,
}

pub const CARD_TYPES: ValueTable =
  ValueTable { table: "card_types", scope: "details_id", value: "type" };

pub const CARD_SUBTYPES: ValueTable =
  ValueTable { table: "card_subtypes", scope: "card_id", value: "subtype" };

pub const CARD_RULES: ValueTable = ValueTable { table: "card_rules", scope: "card_id", value: "rule" };

// ─── Pairs ───────────────────────────────────────────────────────────────────

pub fn load_pairs(
  conn: &Connection,
  t: &PairTable,
  scope: &dyn ToSql,
) -> Result<BTreeMap<String, String>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {key}, {value} FROM {table} WHERE {scope} = ?1",
    key = t.key,
    value = t.value,
    table = t.table,
    scope = t.scope,
  ))?;
  let pairs = stmt
    .query_map(rusqlite::params![scope], |row| Ok((row.get(0)?, row.get(1)?)))?
    .collect::<rusqlite::Result<_>>()?;
  Ok(pairs)
}

/// Make the rows of `t` under `scope` equal `desired`.
pub fn sync_pairs(
  conn: &Connection,
  t: &PairTable,
  scope: &dyn ToSql,
  desired: &BTreeMap<String, String>,
) -> Result<ReconcileReport> {
  let current: Vec<((), (String, String))> =
    load_pairs(conn, t, scope)?.into_iter().map(|pair| ((), pair)).collect();
  let desired: Vec<(String, String)> =
    desired.iter().map(|(k, v)| (k.clone(), v.clone())).collect();

  let changes = reconcile(&desired, &current, |(k, _)| k.clone(), |a, b| a.1 == b.1);

  for (key, value) in &changes.to_insert {
    conn.execute(
      &format!(
        "INSERT INTO {table} ({scope}, {key_col}, {value_col}) VALUES (?1, ?2, ?3)",
        table = t.table,
        scope = t.scope,
        key_col = t.key,
        value_col = t.value,
      ),
      rusqlite::params![scope, key, value],
    )?;
  }
  for (_, (key, value)) in &changes.to_update {
    conn.execute(
      &format!(
        "UPDATE {table} SET {value_col} = ?3 WHERE {scope} = ?1 AND {key_col} = ?2",
        table = t.table,
        scope = t.scope,
        key_col = t.key,
        value_col = t.value,
      ),
      rusqlite::params![scope, key, value],
    )?;
  }
  for (_, (key, _)) in &changes.to_delete {
    conn.execute(
      &format!(
        "DELETE FROM {table} WHERE {scope} = ?1 AND {key_col} = ?2",
        table = t.table,
        scope = t.scope,
        key_col = t.key,
      ),
      rusqlite::params![scope, key],
    )?;
  }

  Ok(ReconcileReport::from(&changes))
}

// ─── Values ──────────────────────────────────────────────────────────────────

pub fn load_values(conn: &Connection, t: &ValueTable, scope: &dyn ToSql) -> Result<Vec<String>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {value} FROM {table} WHERE {scope} = ?1 ORDER BY {value}",
    value = t.value,
    table = t.table,
    scope = t.scope,
  ))?;
  let values = stmt
    .query_map(rusqlite::params![scope], |row| row.get(0))?
    .collect::<rusqlite::Result<_>>()?;
  Ok(values)
}

/// Make the rows of `t` under `scope` equal the set of `desired` values.
pub fn sync_values(
  conn: &Connection,
  t: &ValueTable,
  scope: &dyn ToSql,
  desired: &[String],
) -> Result<ReconcileReport> {
  let current: Vec<((), String)> =
    load_values(conn, t, scope)?.into_iter().map(|v| ((), v)).collect();

  let changes = reconcile(desired, &current, String::clone, |_, _| true);

  for value in &changes.to_insert {
    conn.execute(
      &format!(
        "INSERT INTO {table} ({scope}, {value_col}) VALUES (?1, ?2)",
        table = t.table,
        scope = t.scope,
        value_col = t.value,
      ),
      rusqlite::params![scope, value],
    )?;
  }
  for (_, value) in &changes.to_delete {
    conn.execute(
      &format!(
        "DELETE FROM {table} WHERE {scope} = ?1 AND {value_col} = ?2",
        table = t.table,
        scope = t.scope,
        value_col = t.value,
      ),
      rusqlite::params![scope, value],
    )?;
  }

  Ok(ReconcileReport::from(&changes))
}

/// Delete every row of `t` under `scope`, returning how many went.
pub fn clear_values(conn: &Connection, t: &ValueTable, scope: &dyn ToSql) -> Result<usize> {
  Ok(conn.execute(
    &format!("DELETE FROM {table} WHERE {scope} = ?1", table = t.table, scope = t.scope),
    rusqlite::params![scope],
  )?)
}
