//! The `CatalogStore` trait.
//!
//! Implemented by storage backends (e.g. `tcgsync-store-sqlite`). The import
//! orchestrator in `tcgsync-cli` depends on this abstraction, not on any
//! concrete backend.

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::{
  card::{CardRecord, StoredCard},
  price::{Condition, CurrentPrice, Finish, PriceHistoryEntry, PriceObservation, PriceOutcome},
  reconcile::ReconcileReport,
  set::{SetNumbering, SetRecord},
};

/// Abstraction over a catalog store backend.
///
/// Every import is transactional at the granularity noted on each method:
/// either all of its writes land or none do. Repeating an import with the
/// same input writes nothing and reports [`ReconcileReport::is_noop`].
///
/// All methods return `Send` futures so the store can be shared between
/// tokio worker tasks.
pub trait CatalogStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Sets ──────────────────────────────────────────────────────────────

  /// Upsert every set of one feed file and reconcile each set's legalities
  /// and images. One transaction for the whole file.
  fn import_sets(
    &self,
    sets: Vec<SetRecord>,
  ) -> impl Future<Output = Result<ReconcileReport, Self::Error>> + Send + '_;

  /// Ids of every stored set, sorted.
  fn set_ids(&self) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send + '_;

  /// The printed total and padding policy of a stored set, or `None` if the
  /// set is unknown.
  fn set_numbering(
    &self,
    set_id: String,
  ) -> impl Future<Output = Result<Option<SetNumbering>, Self::Error>> + Send + '_;

  // ── Cards ─────────────────────────────────────────────────────────────

  /// Reconcile every card of one card file against the store. One
  /// transaction for the whole file.
  ///
  /// Fails without writing anything if `set_id` is not a stored set, or if
  /// any card cannot be processed (e.g. an unnormalisable number).
  fn import_cards(
    &self,
    set_id: String,
    cards: Vec<CardRecord>,
  ) -> impl Future<Output = Result<ReconcileReport, Self::Error>> + Send + '_;

  /// Store id of the card with `external_id`, if any.
  fn card_id(
    &self,
    external_id: String,
  ) -> impl Future<Output = Result<Option<i64>, Self::Error>> + Send + '_;

  /// Read back a stored card with all of its child collections.
  fn load_card(
    &self,
    card_id: i64,
  ) -> impl Future<Output = Result<Option<StoredCard>, Self::Error>> + Send + '_;

  // ── Prices ────────────────────────────────────────────────────────────

  /// Record one price for a (card, finish, condition) triple.
  ///
  /// If a current price exists with a different timestamp and a non-null
  /// value, it is appended to the history first. The current row is then
  /// overwritten.
  ///
  /// An unknown `card_id` writes nothing and returns
  /// [`PriceOutcome::UnknownCard`]. Otherwise the outcome counts one variant
  /// and whether a history entry was appended.
  fn record_price(
    &self,
    card_id: i64,
    finish: Finish,
    condition: Condition,
    price: Option<f64>,
    observed_at: DateTime<Utc>,
  ) -> impl Future<Output = Result<PriceOutcome, Self::Error>> + Send + '_;

  /// Record every price variant of one feed record in one transaction.
  ///
  /// An unknown `external_id` is not an error: nothing is written and
  /// [`PriceOutcome::UnknownCard`] is returned.
  fn record_card_prices(
    &self,
    external_id: String,
    observations: Vec<PriceObservation>,
  ) -> impl Future<Output = Result<PriceOutcome, Self::Error>> + Send + '_;

  /// Current prices of a card, ordered by finish then condition.
  fn current_prices(
    &self,
    card_id: i64,
  ) -> impl Future<Output = Result<Vec<CurrentPrice>, Self::Error>> + Send + '_;

  /// Archived prices of a card, oldest first.
  fn price_history(
    &self,
    card_id: i64,
  ) -> impl Future<Output = Result<Vec<PriceHistoryEntry>, Self::Error>> + Send + '_;
}
