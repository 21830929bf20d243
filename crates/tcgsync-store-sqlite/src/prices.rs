//! Price versioning.
//!
//! `card_price` holds one current row per (card, finish, condition).
//! Overwriting it with an observation from a different point in time first
//! archives the outgoing value into `card_price_history`. Re-recording the
//! same observation writes no history.

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension as _};
use tcgsync_core::price::{
  Condition, CurrentPrice, Finish, PriceHistoryEntry, PriceObservation, PriceOutcome,
};

use crate::{
  Result, cards,
  encode::{decode_condition, decode_dt, decode_finish, encode_condition, encode_dt, encode_finish},
};

/// Record one observation for the card with store id `card_id`. An unknown
/// card writes nothing.
pub fn record_one(
  conn: &Connection,
  card_id: i64,
  finish: Finish,
  condition: Condition,
  price: Option<f64>,
  observed_at: DateTime<Utc>,
) -> Result<PriceOutcome> {
  let known = conn
    .query_row("SELECT 1 FROM cards WHERE id = ?1", rusqlite::params![card_id], |_| Ok(()))
    .optional()?
    .is_some();
  if !known {
    tracing::warn!(card_id, "card is not in the catalog; price not recorded");
    return Ok(PriceOutcome::UnknownCard);
  }

  let archived = record(conn, card_id, finish, condition, price, observed_at)?;
  Ok(PriceOutcome::Recorded { variants: 1, archived: usize::from(archived) })
}

/// Record one observation of a known card. Returns whether the previous
/// value was archived.
fn record(
  conn: &Connection,
  card_id: i64,
  finish: Finish,
  condition: Condition,
  price: Option<f64>,
  observed_at: DateTime<Utc>,
) -> Result<bool> {
  let finish_str = encode_finish(finish);
  let condition_str = encode_condition(condition);

  let current: Option<(Option<f64>, String)> = conn
    .query_row(
      "SELECT price, updated_at FROM card_price
       WHERE card_id = ?1 AND finish = ?2 AND condition = ?3",
      rusqlite::params![card_id, finish_str, condition_str],
      |r| Ok((r.get(0)?, r.get(1)?)),
    )
    .optional()?;

  let mut archived = false;
  if let Some((Some(previous), previous_at)) = current
    && decode_dt(&previous_at)? != observed_at
  {
    conn.execute(
      "INSERT INTO card_price_history (card_id, finish, condition, price, timestamp)
       VALUES (?1, ?2, ?3, ?4, ?5)",
      rusqlite::params![card_id, finish_str, condition_str, previous, previous_at],
    )?;
    archived = true;
  }

  conn.execute(
    "INSERT INTO card_price (card_id, finish, condition, price, updated_at)
     VALUES (?1, ?2, ?3, ?4, ?5)
     ON CONFLICT (card_id, finish, condition)
     DO UPDATE SET price = excluded.price, updated_at = excluded.updated_at",
    rusqlite::params![card_id, finish_str, condition_str, price, encode_dt(observed_at)],
  )?;

  Ok(archived)
}

/// Record every variant of one feed record for the card with `external_id`.
pub fn record_card(
  conn: &Connection,
  external_id: &str,
  observations: &[PriceObservation],
) -> Result<PriceOutcome> {
  let Some(card_id) = cards::id_by_external(conn, external_id)? else {
    return Ok(PriceOutcome::UnknownCard);
  };

  let mut archived = 0;
  for o in observations {
    if record(conn, card_id, o.finish, o.condition, o.price, o.observed_at)? {
      archived += 1;
    }
  }
  Ok(PriceOutcome::Recorded { variants: observations.len(), archived })
}

// ─── Reads ───────────────────────────────────────────────────────────────────

pub fn current(conn: &Connection, card_id: i64) -> Result<Vec<CurrentPrice>> {
  let mut stmt = conn.prepare(
    "SELECT finish, condition, price, updated_at FROM card_price
     WHERE card_id = ?1 ORDER BY finish, condition",
  )?;
  let raws: Vec<(String, String, Option<f64>, String)> = stmt
    .query_map(rusqlite::params![card_id], |r| {
      Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?))
    })?
    .collect::<rusqlite::Result<_>>()?;

  raws
    .into_iter()
    .map(|(finish, condition, price, updated_at)| {
      Ok(CurrentPrice {
        card_id,
        finish: decode_finish(&finish)?,
        condition: decode_condition(&condition)?,
        price,
        updated_at: decode_dt(&updated_at)?,
      })
    })
    .collect()
}

pub fn history(conn: &Connection, card_id: i64) -> Result<Vec<PriceHistoryEntry>> {
  let mut stmt = conn.prepare(
    "SELECT finish, condition, price, timestamp FROM card_price_history
     WHERE card_id = ?1 ORDER BY id",
  )?;
  let raws: Vec<(String, String, f64, String)> = stmt
    .query_map(rusqlite::params![card_id], |r| {
      Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?))
    })?
    .collect::<rusqlite::Result<_>>()?;

  raws
    .into_iter()
    .map(|(finish, condition, price, timestamp)| {
      Ok(PriceHistoryEntry {
        card_id,
        finish: decode_finish(&finish)?,
        condition: decode_condition(&condition)?,
        price,
        timestamp: decode_dt(&timestamp)?,
      })
    })
    .collect()
}
