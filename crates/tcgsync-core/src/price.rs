//! Price observations and quote selection.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// A card's physical print treatment; one axis of the price key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Finish {
  Normal,
  Holofoil,
  ReverseHolo,
  FirstEditionNormal,
  FirstEditionHolofoil,
  UnlimitedHolofoil,
}

impl Finish {
  /// Map a feed price-variant key (`"reverseHolofoil"`) to a finish.
  pub fn from_feed_key(key: &str) -> Option<Self> {
    match key {
      "normal" => Some(Self::Normal),
      "holofoil" => Some(Self::Holofoil),
      "reverseHolofoil" => Some(Self::ReverseHolo),
      "1stEditionNormal" => Some(Self::FirstEditionNormal),
      "1stEditionHolofoil" => Some(Self::FirstEditionHolofoil),
      "unlimitedHolofoil" => Some(Self::UnlimitedHolofoil),
      _ => None,
    }
  }
}

/// Grading bucket of the priced copy. Only one grade is tracked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Condition {
  #[default]
  NearMint,
}

/// The quote fields the feed offers for one variant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
  pub low:        Option<f64>,
  pub mid:        Option<f64>,
  pub high:       Option<f64>,
  pub market:     Option<f64>,
  pub direct_low: Option<f64>,
}

impl Quote {
  /// The single price stored for this variant: the first quote present of
  /// market, mid, low, high and direct low.
  pub fn select(&self) -> Option<f64> {
    self
      .market
      .or(self.mid)
      .or(self.low)
      .or(self.high)
      .or(self.direct_low)
  }
}

/// One price to record for a card variant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceObservation {
  pub finish:      Finish,
  pub condition:   Condition,
  pub price:       Option<f64>,
  pub observed_at: DateTime<Utc>,
}

/// The stored current price of one (card, finish, condition) triple.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentPrice {
  pub card_id:    i64,
  pub finish:     Finish,
  pub condition:  Condition,
  pub price:      Option<f64>,
  pub updated_at: DateTime<Utc>,
}

/// An archived price, written just before the current row was overwritten.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceHistoryEntry {
  pub card_id:   i64,
  pub finish:    Finish,
  pub condition: Condition,
  pub price:     f64,
  pub timestamp: DateTime<Utc>,
}

/// Result of recording the prices of one feed record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceOutcome {
  /// Prices written; `archived` history entries were appended.
  Recorded { variants: usize, archived: usize },
  /// The external id is not in the catalog; nothing was written.
  UnknownCard,
}
