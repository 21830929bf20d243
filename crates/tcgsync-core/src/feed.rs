//! Feed record shapes and their conversion into canonical records.
//!
//! The feed is JSON with camelCase keys. Card and set files are read from
//! disk; price records arrive as pages over HTTP. Conversion is where
//! per-item validation happens (dates, weakness/resistance values), so a
//! malformed item surfaces as an [`Error`] before any store write.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;

use crate::{
  Error, Result,
  card::{Ability, Attack, CREATURE_SUPERTYPE, CardRecord, Modifier, PokemonDetails, normalize_cost},
  era::Series,
  price::{Condition, Finish, PriceObservation, Quote},
  set::SetRecord,
};

const RELEASE_DATE_FORMAT: &str = "%Y/%m/%d";
const UPDATED_AT_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

// ─── Pages ───────────────────────────────────────────────────────────────────

/// One page of a paginated feed response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
  #[serde(default = "Vec::new")]
  pub data:        Vec<T>,
  /// Records across all pages, when the feed reports it.
  pub total_count: Option<usize>,
}

/// A feed file is either `{ "data": [...] }` or a bare array.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Listing<T> {
  Wrapped { data: Vec<T> },
  Bare(Vec<T>),
}

impl<T> Listing<T> {
  pub fn into_items(self) -> Vec<T> {
    match self {
      Listing::Wrapped { data } => data,
      Listing::Bare(items) => items,
    }
  }
}

// ─── Sets ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedSet {
  pub id:            String,
  pub ptcgo_code:    Option<String>,
  pub name:          String,
  pub series:        String,
  pub release_date:  String,
  pub updated_at:    String,
  pub printed_total: u32,
  pub total:         u32,
  #[serde(default)]
  pub legalities:    BTreeMap<String, String>,
  #[serde(default)]
  pub images:        BTreeMap<String, String>,
}

impl FeedSet {
  pub fn into_record(self) -> Result<SetRecord> {
    let release_date = parse_date("releaseDate", &self.release_date)?;
    let last_updated = NaiveDateTime::parse_from_str(&self.updated_at, UPDATED_AT_FORMAT)
      .map_err(|source| Error::InvalidDate {
        field: "updatedAt",
        value: self.updated_at.clone(),
        source,
      })?;

    let code = match self.ptcgo_code.filter(|c| !c.trim().is_empty()) {
      Some(code) => code,
      None => {
        tracing::warn!(set = %self.name, "no short code in feed, using id {:?}", self.id);
        self.id.clone()
      }
    };

    let legalities = self
      .legalities
      .into_iter()
      .map(|(format, legality)| (format.to_uppercase(), legality))
      .collect();

    Ok(SetRecord {
      id: self.id,
      code,
      name: self.name,
      series: Series::from_feed_name(&self.series),
      release_date,
      last_updated,
      printed_total: self.printed_total,
      total: self.total,
      legalities,
      images: self.images,
    })
  }
}

// ─── Cards ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedCard {
  pub id:                     String,
  pub name:                   String,
  #[serde(default)]
  pub number:                 String,
  pub rarity:                 Option<String>,
  pub artist:                 Option<String>,
  pub supertype:              Option<String>,
  pub hp:                     Option<String>,
  pub converted_retreat_cost: Option<i64>,
  pub flavor_text:            Option<String>,
  #[serde(default)]
  pub weaknesses:             Vec<FeedModifier>,
  #[serde(default)]
  pub resistances:            Vec<FeedModifier>,
  #[serde(default)]
  pub attacks:                Vec<FeedAttack>,
  #[serde(default)]
  pub abilities:              Vec<FeedAbility>,
  #[serde(default)]
  pub types:                  Vec<String>,
  #[serde(default)]
  pub subtypes:               Vec<String>,
  #[serde(default)]
  pub rules:                  Vec<String>,
  #[serde(default)]
  pub images:                 BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedModifier {
  #[serde(rename = "type")]
  pub kind:  Option<String>,
  #[serde(default)]
  pub value: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedAttack {
  pub name:   String,
  pub cost:   Option<Vec<String>>,
  pub damage: Option<String>,
  pub text:   Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedAbility {
  pub name: String,
  pub text: Option<String>,
  #[serde(rename = "type")]
  pub kind: Option<String>,
}

impl FeedCard {
  /// Convert into the canonical record.
  ///
  /// Creature cards get details, attacks, abilities and types; every other
  /// supertype keeps its rules instead.
  pub fn into_record(self) -> Result<CardRecord> {
    let creature = self.supertype.as_deref() == Some(CREATURE_SUPERTYPE);

    let details = if creature {
      let weakness = match self.weaknesses.first() {
        Some(raw) => parse_modifier(&self.id, "weakness", raw)?,
        None => None,
      };
      let resistance = match self.resistances.first() {
        Some(raw) => parse_modifier(&self.id, "resistance", raw)?,
        None => None,
      };
      let hit_points = self
        .hp
        .as_deref()
        .filter(|hp| !hp.is_empty() && hp.chars().all(|c| c.is_ascii_digit()))
        .and_then(|hp| hp.parse().ok());

      Some(PokemonDetails {
        hit_points,
        retreat_cost: self.converted_retreat_cost.unwrap_or(0),
        flavor_text: self.flavor_text.clone(),
        weakness,
        resistance,
      })
    } else {
      None
    };

    let (attacks, abilities, types, rules) = if creature {
      let attacks = self
        .attacks
        .into_iter()
        .map(|a| Attack {
          name:   a.name,
          damage: a.damage,
          text:   a.text,
          cost:   normalize_cost(a.cost),
        })
        .collect();
      let abilities = self
        .abilities
        .into_iter()
        .map(|a| Ability { name: a.name, text: a.text, kind: a.kind })
        .collect();
      (attacks, abilities, self.types, vec![])
    } else {
      (vec![], vec![], vec![], self.rules)
    };

    Ok(CardRecord {
      external_id: self.id,
      name: self.name,
      number: self.number,
      rarity: self.rarity,
      illustrator: self.artist,
      supertype: self.supertype,
      details,
      attacks,
      abilities,
      types,
      subtypes: self.subtypes,
      rules,
      images: self.images,
    })
  }
}

/// Split a feed modifier value (`"×2"`, `"-30"`) into its one-character
/// modifier and magnitude. An empty value keeps only the type; an entry with
/// neither is dropped.
fn parse_modifier(
  external_id: &str,
  field: &'static str,
  raw: &FeedModifier,
) -> Result<Option<Modifier>> {
  let value = raw.value.trim();
  let mut chars = value.chars();
  let Some(modifier) = chars.next() else {
    return Ok(raw.kind.clone().map(|kind| Modifier {
      kind:     Some(kind),
      modifier: None,
      value:    None,
    }));
  };
  let magnitude = chars.as_str().parse::<i64>().map_err(|_| Error::MalformedField {
    external_id: external_id.to_string(),
    field,
    value: raw.value.clone(),
  })?;
  Ok(Some(Modifier {
    kind:     raw.kind.clone(),
    modifier: Some(modifier),
    value:    Some(magnitude),
  }))
}

// ─── Prices ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct FeedPriceCard {
  pub id:        String,
  pub name:      Option<String>,
  pub tcgplayer: Option<FeedMarket>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedMarket {
  pub updated_at: Option<String>,
  #[serde(default)]
  pub prices:     BTreeMap<String, Quote>,
}

impl FeedPriceCard {
  /// The date the market data was last refreshed, as midnight UTC.
  pub fn feed_date(&self) -> Result<Option<DateTime<Utc>>> {
    let Some(raw) = self.tcgplayer.as_ref().and_then(|m| m.updated_at.as_deref()) else {
      return Ok(None);
    };
    Ok(Some(midnight_utc(parse_date("updatedAt", raw)?)))
  }

  /// One observation per recognised price variant. Unknown variant keys are
  /// skipped.
  pub fn observations(&self, observed_at: DateTime<Utc>) -> Vec<PriceObservation> {
    let Some(market) = &self.tcgplayer else {
      return vec![];
    };
    market
      .prices
      .iter()
      .filter_map(|(key, quote)| {
        let Some(finish) = Finish::from_feed_key(key) else {
          tracing::debug!(card = %self.id, variant = %key, "skipping unknown price variant");
          return None;
        };
        Some(PriceObservation {
          finish,
          condition: Condition::NearMint,
          price: quote.select(),
          observed_at,
        })
      })
      .collect()
  }
}

// ─── Dates ───────────────────────────────────────────────────────────────────

fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(value, RELEASE_DATE_FORMAT).map_err(|source| Error::InvalidDate {
    field,
    value: value.to_string(),
    source,
  })
}

/// Midnight UTC of `date`.
pub fn midnight_utc(date: NaiveDate) -> DateTime<Utc> {
  date.and_time(chrono::NaiveTime::MIN).and_utc()
}

// ─── Tests ────────────────────────────────────────────────────────────────────
