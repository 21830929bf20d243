//! Set import and numbering lookup.

use rusqlite::{Connection, OptionalExtension as _};
use tcgsync_core::{
  era::{REFERENCE_SET_ID, is_fixed_padding},
  reconcile::ReconcileReport,
  set::{SetNumbering, SetRecord},
};

use crate::{
  Result,
  collections::{SET_IMAGES, SET_LEGALITIES, sync_pairs},
  encode::{decode_date, decode_series, encode_date, encode_datetime, encode_series},
};

/// The `sets` row as stored.
#[derive(Debug, PartialEq, Eq)]
struct SetRow {
  code:          String,
  name:          String,
  series:        String,
  release_date:  String,
  last_updated:  String,
  printed_total: i64,
  total:         i64,
}

impl SetRow {
  fn encode(set: &SetRecord) -> Self {
    Self {
      code:          set.code.clone(),
      name:          set.name.clone(),
      series:        encode_series(set.series).to_owned(),
      release_date:  encode_date(set.release_date),
      last_updated:  encode_datetime(set.last_updated),
      printed_total: i64::from(set.printed_total),
      total:         i64::from(set.total),
    }
  }
}

/// Upsert every set and reconcile its legalities and images.
pub fn import(conn: &Connection, sets: &[SetRecord]) -> Result<ReconcileReport> {
  let mut report = ReconcileReport::default();
  for set in sets {
    report.absorb(upsert(conn, set)?);
    report.absorb(sync_pairs(conn, &SET_LEGALITIES, &set.id, &set.legalities)?);
    report.absorb(sync_pairs(conn, &SET_IMAGES, &set.id, &set.images)?);
  }
  Ok(report)
}

/// Insert or update the set row; a row already equal to the record is left
/// alone.
fn upsert(conn: &Connection, set: &SetRecord) -> Result<ReconcileReport> {
  let row = SetRow::encode(set);
  let stored: Option<SetRow> = conn
    .query_row(
      "SELECT code, name, series, release_date, last_updated, printed_total, total
       FROM sets WHERE id = ?1",
      rusqlite::params![set.id],
      |r| {
        Ok(SetRow {
          code:          r.get(0)?,
          name:          r.get(1)?,
          series:        r.get(2)?,
          release_date:  r.get(3)?,
          last_updated:  r.get(4)?,
          printed_total: r.get(5)?,
          total:         r.get(6)?,
        })
      },
    )
    .optional()?;

  match stored {
    Some(stored) if stored == row => Ok(ReconcileReport::default()),
    Some(_) => {
      conn.execute(
        "UPDATE sets SET code = ?2, name = ?3, series = ?4, release_date = ?5,
                         last_updated = ?6, printed_total = ?7, total = ?8
         WHERE id = ?1",
        rusqlite::params![
          set.id,
          row.code,
          row.name,
          row.series,
          row.release_date,
          row.last_updated,
          row.printed_total,
          row.total,
        ],
      )?;
      Ok(ReconcileReport { updated: 1, ..Default::default() })
    }
    None => {
      conn.execute(
        "INSERT INTO sets (id, code, name, series, release_date, last_updated, printed_total, total)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        rusqlite::params![
          set.id,
          row.code,
          row.name,
          row.series,
          row.release_date,
          row.last_updated,
          row.printed_total,
          row.total,
        ],
      )?;
      Ok(ReconcileReport { inserted: 1, ..Default::default() })
    }
  }
}

pub fn ids(conn: &Connection) -> Result<Vec<String>> {
  let mut stmt = conn.prepare("SELECT id FROM sets ORDER BY id")?;
  let ids = stmt
    .query_map([], |r| r.get(0))?
    .collect::<rusqlite::Result<_>>()?;
  Ok(ids)
}

fn release_date(conn: &Connection, set_id: &str) -> Result<Option<chrono::NaiveDate>> {
  let raw: Option<String> = conn
    .query_row(
      "SELECT release_date FROM sets WHERE id = ?1",
      rusqlite::params![set_id],
      |r| r.get(0),
    )
    .optional()?;
  raw.as_deref().map(decode_date).transpose()
}

/// Printed total and padding policy of `set_id`, or `None` if the set is not
/// stored. Classification needs the reference set's release date, which is
/// looked up alongside.
///
/// A stored printed total outside `u32` fails the lookup.
pub fn numbering(conn: &Connection, set_id: &str) -> Result<Option<SetNumbering>> {
  let raw: Option<(String, String, u32)> = conn
    .query_row(
      "SELECT series, release_date, printed_total FROM sets WHERE id = ?1",
      rusqlite::params![set_id],
      |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
    )
    .optional()?;
  let Some((series, released, printed_total)) = raw else {
    return Ok(None);
  };

  let series = decode_series(&series)?;
  let released = decode_date(&released)?;
  let reference = release_date(conn, REFERENCE_SET_ID)?;

  Ok(Some(SetNumbering {
    printed_total,
    fixed_padding: is_fixed_padding(series, released, reference),
  }))
}

#[cfg(test)]
mod tests {
  use tcgsync_core::era::Series;

  use super::*;
  use crate::{Error, schema::SCHEMA};

  fn conn_with_total(printed_total: i64) -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(SCHEMA).unwrap();
    conn
      .execute(
        "INSERT INTO sets (id, code, name, series, release_date, last_updated, printed_total, total)
         VALUES ('base1', 'BS', 'Base', ?1, '1999-01-09', '1999-01-09 00:00:00', ?2, 102)",
        rusqlite::params![encode_series(Series::Base), printed_total],
      )
      .unwrap();
    conn
  }

  #[test]
  fn numbering_reads_the_printed_total() {
    let conn = conn_with_total(102);
    let numbering = numbering(&conn, "base1").unwrap().unwrap();
    assert_eq!(numbering.printed_total, 102);
    assert!(!numbering.fixed_padding);
  }

  #[test]
  fn corrupt_printed_total_is_an_error() {
    let conn = conn_with_total(-1);
    assert!(matches!(numbering(&conn, "base1"), Err(Error::Sqlite(_))));
  }
}
