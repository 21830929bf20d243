//! [`SqliteStore`], the SQLite implementation of [`CatalogStore`].

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::Connection;

use tcgsync_core::{
  card::{CardRecord, StoredCard},
  price::{Condition, CurrentPrice, Finish, PriceHistoryEntry, PriceObservation, PriceOutcome},
  reconcile::ReconcileReport,
  set::{SetNumbering, SetRecord},
  store::CatalogStore,
};

use crate::{Error, Result, cards, prices, schema::SCHEMA, sets};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A catalog store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted and all
/// clones share its single database thread.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run `f` inside one transaction on the database thread. Any error rolls
  /// the whole transaction back.
  async fn transact<T, F>(&self, f: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&Connection) -> Result<T> + Send + 'static,
  {
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let out = f(&tx).map_err(Error::sink)?;
        tx.commit()?;
        Ok(out)
      })
      .await
      .map_err(Error::lift)
  }

  /// Run a read-only `f` on the database thread.
  async fn read<T, F>(&self, f: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&Connection) -> Result<T> + Send + 'static,
  {
    self
      .conn
      .call(move |conn| f(conn).map_err(Error::sink))
      .await
      .map_err(Error::lift)
  }
}

// ─── CatalogStore impl ───────────────────────────────────────────────────────

impl CatalogStore for SqliteStore {
  type Error = Error;

  // ── Sets ──────────────────────────────────────────────────────────────────

  async fn import_sets(&self, sets: Vec<SetRecord>) -> Result<ReconcileReport> {
    self.transact(move |conn| sets::import(conn, &sets)).await
  }

  async fn set_ids(&self) -> Result<Vec<String>> { self.read(sets::ids).await }

  async fn set_numbering(&self, set_id: String) -> Result<Option<SetNumbering>> {
    self.read(move |conn| sets::numbering(conn, &set_id)).await
  }

  // ── Cards ─────────────────────────────────────────────────────────────────

  async fn import_cards(&self, set_id: String, cards: Vec<CardRecord>) -> Result<ReconcileReport> {
    self
      .transact(move |conn| cards::import(conn, &set_id, &cards))
      .await
  }

  async fn card_id(&self, external_id: String) -> Result<Option<i64>> {
    self
      .read(move |conn| cards::id_by_external(conn, &external_id))
      .await
  }

  async fn load_card(&self, card_id: i64) -> Result<Option<StoredCard>> {
    self.read(move |conn| cards::load(conn, card_id)).await
  }

  // ── Prices ────────────────────────────────────────────────────────────────

  async fn record_price(
    &self,
    card_id:     i64,
    finish:      Finish,
    condition:   Condition,
    price:       Option<f64>,
    observed_at: DateTime<Utc>,
  ) -> Result<PriceOutcome> {
    self
      .transact(move |conn| {
        prices::record_one(conn, card_id, finish, condition, price, observed_at)
      })
      .await
  }

  async fn record_card_prices(
    &self,
    external_id:  String,
    observations: Vec<PriceObservation>,
  ) -> Result<PriceOutcome> {
    self
      .transact(move |conn| prices::record_card(conn, &external_id, &observations))
      .await
  }

  async fn current_prices(&self, card_id: i64) -> Result<Vec<CurrentPrice>> {
    self.read(move |conn| prices::current(conn, card_id)).await
  }

  async fn price_history(&self, card_id: i64) -> Result<Vec<PriceHistoryEntry>> {
    self.read(move |conn| prices::history(conn, card_id)).await
  }
}
