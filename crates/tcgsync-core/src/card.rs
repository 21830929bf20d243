//! Canonical card records: what the store is reconciled towards.
//!
//! These are built from feed records by [`crate::feed`] and carry everything
//! needed for one card's reconciliation except the canonical set number,
//! which depends on store state (the set's printed total and numbering era).

use std::collections::BTreeMap;

/// Supertype value marking creature cards, the only ones with details.
pub const CREATURE_SUPERTYPE: &str = "Pokémon";

/// Cost symbol standing in for "no energy requirement", so that a free
/// attack is stored as exactly one cost row.
pub const NO_COST: &str = "Free";

/// One card as desired in the store.
#[derive(Debug, Clone, PartialEq)]
pub struct CardRecord {
  /// The feed's identifier, unique within a set.
  pub external_id: String,
  pub name:        String,
  /// Raw feed number; normalised against the set at import time.
  pub number:      String,
  pub rarity:      Option<String>,
  pub illustrator: Option<String>,
  pub supertype:   Option<String>,
  /// Present only for creature cards.
  pub details:     Option<PokemonDetails>,
  pub attacks:     Vec<Attack>,
  pub abilities:   Vec<Ability>,
  pub types:       Vec<String>,
  pub subtypes:    Vec<String>,
  /// Rules text; only kept for non-creature cards.
  pub rules:       Vec<String>,
  /// Resolution → url.
  pub images:      BTreeMap<String, String>,
}

impl CardRecord {
  pub fn is_creature(&self) -> bool {
    self.supertype.as_deref() == Some(CREATURE_SUPERTYPE)
  }
}

/// The base `cards` row, minus store-assigned identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardRow {
  pub name:        String,
  pub set_number:  Option<String>,
  pub rarity:      Option<String>,
  pub illustrator: Option<String>,
  pub supertype:   Option<String>,
}

/// A card as read back from the store. Child collections are ordered by
/// their natural key; attack costs keep their stored order.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredCard {
  pub id:          i64,
  pub external_id: String,
  pub set_id:      String,
  pub row:         CardRow,
  pub details:     Option<PokemonDetails>,
  pub attacks:     Vec<Attack>,
  pub abilities:   Vec<Ability>,
  pub types:       Vec<String>,
  pub subtypes:    Vec<String>,
  pub rules:       Vec<String>,
  pub images:      BTreeMap<String, String>,
}

/// Creature-only attributes, stored 1:1 with the card.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PokemonDetails {
  pub hit_points:   Option<i64>,
  pub retreat_cost: i64,
  pub flavor_text:  Option<String>,
  pub weakness:     Option<Modifier>,
  pub resistance:   Option<Modifier>,
}

/// A weakness or resistance: `{type: "Fire", value: "×2"}` becomes
/// `{kind: "Fire", modifier: '×', value: 2}`. An empty feed value leaves
/// both `modifier` and `value` unset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Modifier {
  pub kind:     Option<String>,
  pub modifier: Option<char>,
  pub value:    Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attack {
  pub name:   String,
  pub damage: Option<String>,
  pub text:   Option<String>,
  /// Never empty: a free attack carries a single [`NO_COST`] symbol.
  pub cost:   Vec<String>,
}

impl Attack {
  /// Fields compared when deciding whether a stored attack needs an update.
  pub fn same_fields(&self, other: &Attack) -> bool {
    self.damage == other.damage && self.text == other.text
  }

  /// The attack's cost multiset as individually keyed slots.
  pub fn cost_slots(&self) -> Vec<CostSlot> { CostSlot::number(self.cost.iter().cloned()) }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ability {
  pub name: String,
  pub text: Option<String>,
  pub kind: Option<String>,
}

impl Ability {
  pub fn same_fields(&self, other: &Ability) -> bool {
    self.text == other.text && self.kind == other.kind
  }
}

/// One entry of an attack's cost multiset.
///
/// Costs repeat (`[Fire, Fire, Colorless]`), so the symbol alone is not a
/// natural key. Each occurrence is numbered among equal symbols in order,
/// giving `(Fire, 0)`, `(Fire, 1)`, `(Colorless, 0)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CostSlot {
  pub symbol:  String,
  pub ordinal: usize,
}

impl CostSlot {
  /// Number the symbols of a cost list, in order.
  pub fn number(symbols: impl IntoIterator<Item = String>) -> Vec<CostSlot> {
    let mut seen: BTreeMap<String, usize> = BTreeMap::new();
    symbols
      .into_iter()
      .map(|symbol| {
        let count = seen.entry(symbol.clone()).or_default();
        let slot = CostSlot { symbol, ordinal: *count };
        *count += 1;
        slot
      })
      .collect()
  }
}

/// Normalise a feed cost list: absent or empty means [`NO_COST`].
pub fn normalize_cost(cost: Option<Vec<String>>) -> Vec<String> {
  match cost {
    Some(cost) if !cost.is_empty() => cost,
    _ => vec![NO_COST.to_string()],
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn missing_or_empty_cost_becomes_sentinel() {
    assert_eq!(normalize_cost(None), vec![NO_COST]);
    assert_eq!(normalize_cost(Some(vec![])), vec![NO_COST]);
    assert_eq!(
      normalize_cost(Some(vec!["Fire".into(), "Colorless".into()])),
      vec!["Fire", "Colorless"]
    );
  }

  #[test]
  fn repeated_costs_get_distinct_ordinals() {
    let slots = CostSlot::number(["Fire", "Fire", "Colorless", "Fire"].map(String::from));
    let keys: Vec<(&str, usize)> =
      slots.iter().map(|s| (s.symbol.as_str(), s.ordinal)).collect();
    assert_eq!(keys, vec![("Fire", 0), ("Fire", 1), ("Colorless", 0), ("Fire", 2)]);
  }
}
