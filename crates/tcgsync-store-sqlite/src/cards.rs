//! Card reconciliation.
//!
//! Each card is matched on `(external_id, set_id)` and updated in place.
//! Its child collections are then diffed against the stored rows with
//! [`reconcile`] and only the differences are written:
//!
//! ```text
//! cards ─┬─ card_pokemon_details ─┬─ card_attacks ── card_attack_costs
//!        │                        ├─ card_abilities
//!        │                        └─ card_types
//!        ├─ card_subtypes
//!        ├─ card_rules
//!        └─ card_images
//! ```
//!
//! Deletes always run children first so no orphan row survives a parent.

use std::collections::{HashMap, HashSet};

use rusqlite::{Connection, OptionalExtension as _};
use tcgsync_core::{
  card::{Ability, Attack, CardRecord, CardRow, CostSlot, PokemonDetails, StoredCard},
  number::normalize,
  reconcile::{ReconcileReport, reconcile},
  set::SetNumbering,
};

use crate::{
  Error, Result,
  collections::{
    CARD_IMAGES, CARD_RULES, CARD_SUBTYPES, CARD_TYPES, clear_values, load_pairs, load_values,
    sync_pairs, sync_values,
  },
  encode::{decode_modifier, encode_modifier},
  sets,
};

/// Reconcile every card of one file against the store.
pub fn import(conn: &Connection, set_id: &str, cards: &[CardRecord]) -> Result<ReconcileReport> {
  let numbering =
    sets::numbering(conn, set_id)?.ok_or_else(|| Error::UnknownSet(set_id.to_owned()))?;

  let mut report = ReconcileReport::default();
  for card in cards {
    report.absorb(import_card(conn, set_id, numbering, card)?);
  }
  Ok(report)
}

fn import_card(
  conn: &Connection,
  set_id: &str,
  numbering: SetNumbering,
  card: &CardRecord,
) -> Result<ReconcileReport> {
  let set_number = canonical_number(card, numbering)?;
  let row = CardRow {
    name: card.name.clone(),
    set_number,
    rarity: card.rarity.clone(),
    illustrator: card.illustrator.clone(),
    supertype: card.supertype.clone(),
  };

  let (card_id, mut report) = upsert_card(conn, &card.external_id, set_id, &row)?;

  if let Some(details_id) = sync_details(conn, card_id, card.details.as_ref(), &mut report)? {
    report.absorb(sync_attacks(conn, details_id, &card.attacks)?);
    report.absorb(sync_abilities(conn, details_id, &card.abilities)?);
    report.absorb(sync_values(conn, &CARD_TYPES, &details_id, &card.types)?);
  }
  report.absorb(sync_values(conn, &CARD_SUBTYPES, &card_id, &card.subtypes)?);
  report.absorb(sync_values(conn, &CARD_RULES, &card_id, &card.rules)?);
  report.absorb(sync_pairs(conn, &CARD_IMAGES, &card_id, &card.images)?);

  Ok(report)
}

/// A blank feed number stores as NULL; anything else must normalise.
fn canonical_number(card: &CardRecord, numbering: SetNumbering) -> Result<Option<String>> {
  if card.number.trim().is_empty() {
    return Ok(None);
  }
  normalize(&card.number, numbering.printed_total, numbering.fixed_padding)
    .map(Some)
    .ok_or_else(|| {
      Error::Core(tcgsync_core::Error::InvalidNumber {
        external_id: card.external_id.clone(),
        raw:         card.number.clone(),
      })
    })
}

// ─── Card row ────────────────────────────────────────────────────────────────

fn upsert_card(
  conn: &Connection,
  external_id: &str,
  set_id: &str,
  row: &CardRow,
) -> Result<(i64, ReconcileReport)> {
  let stored: Option<(i64, CardRow)> = conn
    .query_row(
      "SELECT id, name, set_number, rarity, illustrator, supertype
       FROM cards WHERE external_id = ?1 AND set_id = ?2",
      rusqlite::params![external_id, set_id],
      |r| {
        Ok((r.get(0)?, CardRow {
          name:        r.get(1)?,
          set_number:  r.get(2)?,
          rarity:      r.get(3)?,
          illustrator: r.get(4)?,
          supertype:   r.get(5)?,
        }))
      },
    )
    .optional()?;

  match stored {
    Some((id, stored)) if stored == *row => Ok((id, ReconcileReport::default())),
    Some((id, _)) => {
      conn.execute(
        "UPDATE cards SET name = ?2, set_number = ?3, rarity = ?4, illustrator = ?5, supertype = ?6
         WHERE id = ?1",
        rusqlite::params![id, row.name, row.set_number, row.rarity, row.illustrator, row.supertype],
      )?;
      Ok((id, ReconcileReport { updated: 1, ..Default::default() }))
    }
    None => {
      let id: i64 = conn.query_row(
        "INSERT INTO cards (external_id, set_id, set_number, name, rarity, illustrator, supertype)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         RETURNING id",
        rusqlite::params![
          external_id,
          set_id,
          row.set_number,
          row.name,
          row.rarity,
          row.illustrator,
          row.supertype,
        ],
        |r| r.get(0),
      )?;
      Ok((id, ReconcileReport { inserted: 1, ..Default::default() }))
    }
  }
}

// ─── Details ─────────────────────────────────────────────────────────────────

fn load_details(conn: &Connection, card_id: i64) -> Result<Option<(i64, PokemonDetails)>> {
  Ok(
    conn
      .query_row(
        "SELECT id, hit_points, retreat_cost, flavor_text,
                weakness_type, weakness_modifier, weakness_value,
                resistance_type, resistance_modifier, resistance_value
         FROM card_pokemon_details WHERE card_id = ?1",
        rusqlite::params![card_id],
        |r| {
          Ok((r.get(0)?, PokemonDetails {
            hit_points:   r.get(1)?,
            retreat_cost: r.get(2)?,
            flavor_text:  r.get(3)?,
            weakness:     decode_modifier((r.get(4)?, r.get(5)?, r.get(6)?)),
            resistance:   decode_modifier((r.get(7)?, r.get(8)?, r.get(9)?)),
          }))
        },
      )
      .optional()?,
  )
}

/// Bring the details row in line with `desired` and return its id, if the
/// card should have one.
fn sync_details(
  conn: &Connection,
  card_id: i64,
  desired: Option<&PokemonDetails>,
  report: &mut ReconcileReport,
) -> Result<Option<i64>> {
  let stored = load_details(conn, card_id)?;

  match (desired, stored) {
    (None, None) => Ok(None),
    (None, Some((details_id, _))) => {
      report.absorb(drop_details(conn, details_id)?);
      Ok(None)
    }
    (Some(want), Some((details_id, have))) => {
      if have != *want {
        let (wk, wm, wv) = encode_modifier(want.weakness.as_ref());
        let (rk, rm, rv) = encode_modifier(want.resistance.as_ref());
        conn.execute(
          "UPDATE card_pokemon_details
           SET hit_points = ?2, retreat_cost = ?3, flavor_text = ?4,
               weakness_type = ?5, weakness_modifier = ?6, weakness_value = ?7,
               resistance_type = ?8, resistance_modifier = ?9, resistance_value = ?10
           WHERE id = ?1",
          rusqlite::params![
            details_id,
            want.hit_points,
            want.retreat_cost,
            want.flavor_text,
            wk,
            wm,
            wv,
            rk,
            rm,
            rv,
          ],
        )?;
        report.updated += 1;
      }
      Ok(Some(details_id))
    }
    (Some(want), None) => {
      let (wk, wm, wv) = encode_modifier(want.weakness.as_ref());
      let (rk, rm, rv) = encode_modifier(want.resistance.as_ref());
      let details_id: i64 = conn.query_row(
        "INSERT INTO card_pokemon_details (
           card_id, hit_points, retreat_cost, flavor_text,
           weakness_type, weakness_modifier, weakness_value,
           resistance_type, resistance_modifier, resistance_value
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
         RETURNING id",
        rusqlite::params![
          card_id,
          want.hit_points,
          want.retreat_cost,
          want.flavor_text,
          wk,
          wm,
          wv,
          rk,
          rm,
          rv,
        ],
        |r| r.get(0),
      )?;
      report.inserted += 1;
      Ok(Some(details_id))
    }
  }
}

/// Remove a details row and everything scoped to it.
fn drop_details(conn: &Connection, details_id: i64) -> Result<ReconcileReport> {
  let mut deleted = conn.execute(
    "DELETE FROM card_attack_costs
     WHERE attack_id IN (SELECT id FROM card_attacks WHERE details_id = ?1)",
    rusqlite::params![details_id],
  )?;
  deleted += conn.execute(
    "DELETE FROM card_attacks WHERE details_id = ?1",
    rusqlite::params![details_id],
  )?;
  deleted += conn.execute(
    "DELETE FROM card_abilities WHERE details_id = ?1",
    rusqlite::params![details_id],
  )?;
  deleted += clear_values(conn, &CARD_TYPES, &details_id)?;
  deleted += conn.execute(
    "DELETE FROM card_pokemon_details WHERE id = ?1",
    rusqlite::params![details_id],
  )?;
  Ok(ReconcileReport { deleted, ..Default::default() })
}

// ─── Attacks ─────────────────────────────────────────────────────────────────

/// Stored attacks under one details row. Costs are not loaded.
fn load_attacks(conn: &Connection, details_id: i64) -> Result<Vec<(i64, Attack)>> {
  let mut stmt = conn.prepare(
    "SELECT id, name, damage, text FROM card_attacks WHERE details_id = ?1 ORDER BY id",
  )?;
  let attacks = stmt
    .query_map(rusqlite::params![details_id], |r| {
      Ok((r.get(0)?, Attack {
        name:   r.get(1)?,
        damage: r.get(2)?,
        text:   r.get(3)?,
        cost:   vec![],
      }))
    })?
    .collect::<rusqlite::Result<_>>()?;
  Ok(attacks)
}

/// Attacks first, then each surviving attack's costs, then stale attacks
/// together with their costs.
fn sync_attacks(conn: &Connection, details_id: i64, desired: &[Attack]) -> Result<ReconcileReport> {
  let current = load_attacks(conn, details_id)?;
  let changes = reconcile(desired, &current, |a| a.name.clone(), Attack::same_fields);

  let mut report = ReconcileReport::default();
  let mut ids: HashMap<&str, i64> =
    current.iter().map(|(id, a)| (a.name.as_str(), *id)).collect();

  for attack in &changes.to_insert {
    let id: i64 = conn.query_row(
      "INSERT INTO card_attacks (details_id, name, damage, text) VALUES (?1, ?2, ?3, ?4)
       RETURNING id",
      rusqlite::params![details_id, attack.name, attack.damage, attack.text],
      |r| r.get(0),
    )?;
    ids.insert(attack.name.as_str(), id);
    report.inserted += 1;
  }

  for (id, attack) in &changes.to_update {
    conn.execute(
      "UPDATE card_attacks SET damage = ?2, text = ?3 WHERE id = ?1",
      rusqlite::params![id, attack.damage, attack.text],
    )?;
    report.updated += 1;
  }

  let mut seen = HashSet::new();
  for attack in desired {
    if !seen.insert(attack.name.as_str()) {
      continue;
    }
    if let Some(&attack_id) = ids.get(attack.name.as_str()) {
      report.absorb(sync_costs(conn, attack_id, attack)?);
    }
  }

  for (id, _) in &changes.to_delete {
    report.deleted += conn.execute(
      "DELETE FROM card_attack_costs WHERE attack_id = ?1",
      rusqlite::params![id],
    )?;
    report.deleted +=
      conn.execute("DELETE FROM card_attacks WHERE id = ?1", rusqlite::params![id])?;
  }

  Ok(report)
}

fn load_costs(conn: &Connection, attack_id: i64) -> Result<Vec<(i64, CostSlot)>> {
  let mut stmt = conn.prepare(
    "SELECT id, cost, ordinal FROM card_attack_costs WHERE attack_id = ?1 ORDER BY id",
  )?;
  let costs = stmt
    .query_map(rusqlite::params![attack_id], |r| {
      let ordinal: i64 = r.get(2)?;
      Ok((r.get(0)?, CostSlot { symbol: r.get(1)?, ordinal: ordinal as usize }))
    })?
    .collect::<rusqlite::Result<_>>()?;
  Ok(costs)
}

/// Costs are a multiset keyed by `(symbol, ordinal)`, so they are only
/// inserted or deleted.
fn sync_costs(conn: &Connection, attack_id: i64, attack: &Attack) -> Result<ReconcileReport> {
  let current = load_costs(conn, attack_id)?;
  let desired = attack.cost_slots();
  let changes = reconcile(&desired, &current, CostSlot::clone, |_, _| true);

  for (id, _) in &changes.to_delete {
    conn.execute("DELETE FROM card_attack_costs WHERE id = ?1", rusqlite::params![id])?;
  }
  for slot in &changes.to_insert {
    conn.execute(
      "INSERT INTO card_attack_costs (attack_id, cost, ordinal) VALUES (?1, ?2, ?3)",
      rusqlite::params![attack_id, slot.symbol, slot.ordinal as i64],
    )?;
  }

  Ok(ReconcileReport::from(&changes))
}

// ─── Abilities ───────────────────────────────────────────────────────────────

fn load_abilities(conn: &Connection, details_id: i64) -> Result<Vec<(i64, Ability)>> {
  let mut stmt = conn.prepare(
    "SELECT id, name, text, type FROM card_abilities WHERE details_id = ?1 ORDER BY name",
  )?;
  let abilities = stmt
    .query_map(rusqlite::params![details_id], |r| {
      Ok((r.get(0)?, Ability { name: r.get(1)?, text: r.get(2)?, kind: r.get(3)? }))
    })?
    .collect::<rusqlite::Result<_>>()?;
  Ok(abilities)
}

fn sync_abilities(
  conn: &Connection,
  details_id: i64,
  desired: &[Ability],
) -> Result<ReconcileReport> {
  let current = load_abilities(conn, details_id)?;
  let changes = reconcile(desired, &current, |a| a.name.clone(), Ability::same_fields);

  for ability in &changes.to_insert {
    conn.execute(
      "INSERT INTO card_abilities (details_id, name, text, type) VALUES (?1, ?2, ?3, ?4)",
      rusqlite::params![details_id, ability.name, ability.text, ability.kind],
    )?;
  }
  for (id, ability) in &changes.to_update {
    conn.execute(
      "UPDATE card_abilities SET text = ?2, type = ?3 WHERE id = ?1",
      rusqlite::params![id, ability.text, ability.kind],
    )?;
  }
  for (id, _) in &changes.to_delete {
    conn.execute("DELETE FROM card_abilities WHERE id = ?1", rusqlite::params![id])?;
  }

  Ok(ReconcileReport::from(&changes))
}

// ─── Reads ───────────────────────────────────────────────────────────────────

/// Store id of the first card imported with `external_id`.
pub fn id_by_external(conn: &Connection, external_id: &str) -> Result<Option<i64>> {
  Ok(
    conn
      .query_row(
        "SELECT id FROM cards WHERE external_id = ?1 ORDER BY id LIMIT 1",
        rusqlite::params![external_id],
        |r| r.get(0),
      )
      .optional()?,
  )
}

pub fn load(conn: &Connection, card_id: i64) -> Result<Option<StoredCard>> {
  let head: Option<(String, String, CardRow)> = conn
    .query_row(
      "SELECT external_id, set_id, name, set_number, rarity, illustrator, supertype
       FROM cards WHERE id = ?1",
      rusqlite::params![card_id],
      |r| {
        Ok((r.get(0)?, r.get(1)?, CardRow {
          name:        r.get(2)?,
          set_number:  r.get(3)?,
          rarity:      r.get(4)?,
          illustrator: r.get(5)?,
          supertype:   r.get(6)?,
        }))
      },
    )
    .optional()?;
  let Some((external_id, set_id, row)) = head else {
    return Ok(None);
  };

  let (details, attacks, abilities, types) = match load_details(conn, card_id)? {
    Some((details_id, details)) => {
      let mut attacks = vec![];
      for (attack_id, mut attack) in load_attacks(conn, details_id)? {
        attack.cost = load_costs(conn, attack_id)?.into_iter().map(|(_, s)| s.symbol).collect();
        attacks.push(attack);
      }
      let abilities = load_abilities(conn, details_id)?.into_iter().map(|(_, a)| a).collect();
      let types = load_values(conn, &CARD_TYPES, &details_id)?;
      (Some(details), attacks, abilities, types)
    }
    None => (None, vec![], vec![], vec![]),
  };

  Ok(Some(StoredCard {
    id: card_id,
    external_id,
    set_id,
    row,
    details,
    attacks,
    abilities,
    types,
    subtypes: load_values(conn, &CARD_SUBTYPES, &card_id)?,
    rules: load_values(conn, &CARD_RULES, &card_id)?,
    images: load_pairs(conn, &CARD_IMAGES, &card_id)?,
  }))
}
