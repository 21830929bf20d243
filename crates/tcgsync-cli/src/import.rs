//! Import entry points shared by the CLI commands.
//!
//! Files are parsed and converted in full before the store is touched, so a
//! malformed item fails its file without a partial write.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result, anyhow};
use chrono::{DateTime, Utc};
use tcgsync_core::{
  Error as CoreError,
  feed::{FeedCard, FeedPriceCard, FeedSet, Listing},
  price::PriceOutcome,
  reconcile::ReconcileReport,
  store::CatalogStore,
};

use crate::feed::FeedClient;

// ─── Files ───────────────────────────────────────────────────────────────────

async fn read_listing<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
  let raw = tokio::fs::read_to_string(path)
    .await
    .with_context(|| format!("failed to read {}", path.display()))?;
  let listing: Listing<T> = serde_json::from_str(&raw)
    .with_context(|| format!("failed to parse {}", path.display()))?;
  Ok(listing.into_items())
}

/// The card files under `path`: the file itself, or every `*.json` file of a
/// directory in name order.
pub fn card_files(path: &Path) -> Result<Vec<PathBuf>> {
  if !path.is_dir() {
    return Ok(vec![path.to_path_buf()]);
  }
  let mut files = vec![];
  for entry in
    std::fs::read_dir(path).with_context(|| format!("failed to list {}", path.display()))?
  {
    let file = entry?.path();
    if file.is_file() && file.extension().is_some_and(|ext| ext == "json") {
      files.push(file);
    }
  }
  files.sort();
  Ok(files)
}

/// A card file is named after its set: `swsh1.json` holds set `swsh1`.
fn set_id_of(file: &Path) -> Result<String> {
  file
    .file_stem()
    .and_then(|stem| stem.to_str())
    .map(str::to_owned)
    .ok_or_else(|| anyhow!("cannot derive a set id from {}", file.display()))
}

// ─── Sets ────────────────────────────────────────────────────────────────────

pub async fn import_sets<S: CatalogStore>(store: &S, path: &Path) -> Result<ReconcileReport> {
  let sets = read_listing::<FeedSet>(path)
    .await?
    .into_iter()
    .map(FeedSet::into_record)
    .collect::<Result<Vec<_>, _>>()
    .with_context(|| format!("invalid set in {}", path.display()))?;

  let count = sets.len();
  let report = store
    .import_sets(sets)
    .await
    .with_context(|| format!("failed to import sets from {}", path.display()))?;
  tracing::info!("{}: {count} sets, {report}", path.display());
  Ok(report)
}

// ─── Cards ───────────────────────────────────────────────────────────────────

/// Import one card file in one transaction.
pub async fn import_card_file<S: CatalogStore>(store: &S, file: &Path) -> Result<ReconcileReport> {
  let set_id = set_id_of(file)?;
  let cards = read_listing::<FeedCard>(file)
    .await?
    .into_iter()
    .map(FeedCard::into_record)
    .collect::<Result<Vec<_>, _>>()
    .with_context(|| format!("invalid card in {}", file.display()))?;

  let count = cards.len();
  let report = store
    .import_cards(set_id.clone(), cards)
    .await
    .with_context(|| format!("failed to import {} into set {set_id}", file.display()))?;
  tracing::info!("{}: {count} cards, {report}", file.display());
  Ok(report)
}

/// Outcome of importing a card file or directory.
#[derive(Debug, Default)]
pub struct CardImportSummary {
  pub report: ReconcileReport,
  pub files:  usize,
  pub failed: Vec<PathBuf>,
}

/// Import every card file under `path` sequentially. A failed file is logged
/// and skipped; its transaction has rolled back. Later files still import and
/// commit after an earlier file fails.
pub async fn import_cards<S: CatalogStore>(store: &S, path: &Path) -> Result<CardImportSummary> {
  let mut summary = CardImportSummary::default();
  for file in card_files(path)? {
    summary.files += 1;
    match import_card_file(store, &file).await {
      Ok(report) => summary.report.absorb(report),
      Err(err) => {
        tracing::error!("{err:#}");
        summary.failed.push(file);
      }
    }
  }
  Ok(summary)
}

// ─── Prices ──────────────────────────────────────────────────────────────────

/// Which timestamp a price observation is recorded under.
#[derive(Debug, Clone, Copy)]
pub enum ObservationClock {
  /// The run date at midnight UTC; repeated runs on one day overwrite in
  /// place without archiving.
  RunDate(DateTime<Utc>),
  /// The feed's own `updatedAt` date, falling back to the run date when the
  /// record has none.
  FeedDate(DateTime<Utc>),
}

impl ObservationClock {
  pub fn today(use_feed_date: bool) -> Self {
    let midnight = tcgsync_core::feed::midnight_utc(Utc::now().date_naive());
    if use_feed_date {
      Self::FeedDate(midnight)
    } else {
      Self::RunDate(midnight)
    }
  }

  fn observed_at(&self, card: &FeedPriceCard) -> Result<DateTime<Utc>, CoreError> {
    match *self {
      Self::RunDate(at) => Ok(at),
      Self::FeedDate(fallback) => Ok(card.feed_date()?.unwrap_or(fallback)),
    }
  }
}

/// Counters for one price import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PriceSummary {
  pub cards:    usize,
  pub variants: usize,
  pub archived: usize,
  pub unknown:  usize,
}

impl PriceSummary {
  pub fn absorb(&mut self, other: PriceSummary) {
    self.cards += other.cards;
    self.variants += other.variants;
    self.archived += other.archived;
    self.unknown += other.unknown;
  }
}

/// Record the prices of already-fetched feed records, one transaction per
/// card.
pub async fn record_prices<S: CatalogStore>(
  store: &S,
  records: Vec<FeedPriceCard>,
  clock: ObservationClock,
) -> Result<PriceSummary> {
  let mut summary = PriceSummary::default();
  for record in records {
    let observed_at = clock
      .observed_at(&record)
      .with_context(|| format!("card {}", record.id))?;
    let observations = record.observations(observed_at);
    if observations.is_empty() {
      tracing::debug!(card = %record.id, "no price data");
      continue;
    }

    let outcome = store
      .record_card_prices(record.id.clone(), observations)
      .await
      .with_context(|| format!("failed to record prices for {}", record.id))?;
    match outcome {
      PriceOutcome::Recorded { variants, archived } => {
        summary.cards += 1;
        summary.variants += variants;
        summary.archived += archived;
      }
      PriceOutcome::UnknownCard => {
        tracing::warn!("card {} is not in the catalog; skipping its prices", record.id);
        summary.unknown += 1;
      }
    }
  }
  Ok(summary)
}

/// Fetch every page behind `url` and record the prices.
pub async fn import_prices<S: CatalogStore>(
  store: &S,
  client: &FeedClient,
  url: &str,
  clock: ObservationClock,
) -> Result<PriceSummary> {
  let records = client.price_cards(url).await?;
  tracing::info!("{url}: fetched {} price records", records.len());
  record_prices(store, records, clock).await
}

/// The feed URL of one set's partition.
pub fn partition_url(base_url: &str, set_id: &str) -> String {
  let joiner = if base_url.contains('?') { '&' } else { '?' };
  format!("{base_url}{joiner}q=set.id:{set_id}")
}

#[cfg(test)]
mod tests {
  use std::{collections::BTreeMap, fs};

  use chrono::{NaiveDate, TimeZone as _};
  use tcgsync_core::{
    card::CardRecord,
    price::{Condition, Finish, Quote},
    set::SetRecord,
  };
  use tcgsync_store_sqlite::SqliteStore;

  use super::*;

  const SETS: &str = r#"{"data": [{
    "id": "swsh1", "ptcgoCode": "SSH", "name": "Sword & Shield", "series": "Sword & Shield",
    "printedTotal": 202, "total": 216, "releaseDate": "2020/02/07",
    "updatedAt": "2020/08/14 09:35:00", "legalities": {"standard": "Legal"}
  }]}"#;

  const CARDS: &str = r#"[{
    "id": "swsh1-1", "name": "Celebi V", "supertype": "Pokémon", "number": "1",
    "hp": "180", "types": ["Grass"], "subtypes": ["Basic", "V"],
    "attacks": [
      {"name": "Find a Friend", "cost": ["Grass"], "damage": ""},
      {"name": "Line Force", "cost": ["Grass", "Colorless"], "damage": "50+"}
    ]
  }]"#;

  #[test]
  fn directory_enumerates_json_in_name_order() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["swsh2.json", "base1.json", "notes.txt", "sv1.json"] {
      fs::write(dir.path().join(name), "[]").unwrap();
    }
    let names: Vec<_> = card_files(dir.path())
      .unwrap()
      .iter()
      .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
      .collect();
    assert_eq!(names, vec!["base1.json", "sv1.json", "swsh2.json"]);
  }

  #[test]
  fn set_id_comes_from_the_file_stem() {
    assert_eq!(set_id_of(Path::new("/data/cards/swsh1.json")).unwrap(), "swsh1");
  }

  #[test]
  fn partition_urls_extend_the_query() {
    assert_eq!(
      partition_url("https://feed/v2/cards?select=id", "sv1"),
      "https://feed/v2/cards?select=id&q=set.id:sv1"
    );
    assert_eq!(partition_url("https://feed/v2/cards", "sv1"), "https://feed/v2/cards?q=set.id:sv1");
  }

  #[tokio::test]
  async fn files_import_and_reimport_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let sets = dir.path().join("sets.json");
    fs::write(&sets, SETS).unwrap();
    let cards = dir.path().join("cards");
    fs::create_dir(&cards).unwrap();
    fs::write(cards.join("swsh1.json"), CARDS).unwrap();
    fs::write(cards.join("xy404.json"), CARDS).unwrap();

    let store = SqliteStore::open_in_memory().await.unwrap();
    import_sets(&store, &sets).await.unwrap();

    let first = import_cards(&store, &cards).await.unwrap();
    assert_eq!(first.files, 2);
    assert_eq!(first.failed, vec![cards.join("xy404.json")]);
    assert!(first.report.inserted > 0);

    let id = store.card_id("swsh1-1".into()).await.unwrap().unwrap();
    let card = store.load_card(id).await.unwrap().unwrap();
    assert_eq!(card.row.set_number.as_deref(), Some("001/202"));

    let second = import_cards(&store, &cards).await.unwrap();
    assert!(second.report.is_noop());
  }

  #[tokio::test]
  async fn later_files_commit_after_a_failed_file() {
    let dir = tempfile::tempdir().unwrap();
    let sets = dir.path().join("sets.json");
    fs::write(&sets, SETS).unwrap();
    let cards = dir.path().join("cards");
    fs::create_dir(&cards).unwrap();
    fs::write(cards.join("base0.json"), CARDS).unwrap();
    fs::write(cards.join("swsh1.json"), CARDS).unwrap();

    let store = SqliteStore::open_in_memory().await.unwrap();
    import_sets(&store, &sets).await.unwrap();

    let summary = import_cards(&store, &cards).await.unwrap();
    assert_eq!(summary.failed, vec![cards.join("base0.json")]);
    assert!(store.card_id("swsh1-1".into()).await.unwrap().is_some());
  }

  async fn store_with_card() -> SqliteStore {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let day = NaiveDate::from_ymd_opt(2020, 2, 7).unwrap();
    store
      .import_sets(vec![SetRecord {
        id:            "swsh1".into(),
        code:          "SSH".into(),
        name:          "Sword & Shield".into(),
        series:        tcgsync_core::era::Series::SwordAndShield,
        release_date:  day,
        last_updated:  day.and_hms_opt(0, 0, 0).unwrap(),
        printed_total: 202,
        total:         216,
        legalities:    BTreeMap::new(),
        images:        BTreeMap::new(),
      }])
      .await
      .unwrap();
    store
      .import_cards("swsh1".into(), vec![CardRecord {
        external_id: "swsh1-1".into(),
        name:        "Celebi V".into(),
        number:      "1".into(),
        rarity:      None,
        illustrator: None,
        supertype:   Some("Trainer".into()),
        details:     None,
        attacks:     vec![],
        abilities:   vec![],
        types:       vec![],
        subtypes:    vec![],
        rules:       vec![],
        images:      BTreeMap::new(),
      }])
      .await
      .unwrap();
    store
  }

  fn price_record(id: &str, updated_at: Option<&str>, market: f64) -> FeedPriceCard {
    FeedPriceCard {
      id:        id.into(),
      name:      None,
      tcgplayer: Some(tcgsync_core::feed::FeedMarket {
        updated_at: updated_at.map(str::to_owned),
        prices:     BTreeMap::from([(
          "holofoil".to_string(),
          Quote { market: Some(market), ..Quote::default() },
        )]),
      }),
    }
  }

  #[tokio::test]
  async fn same_day_runs_do_not_archive() {
    let store = store_with_card().await;
    let today = ObservationClock::RunDate(Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap());

    for market in [1.0, 1.25] {
      record_prices(&store, vec![price_record("swsh1-1", None, market)], today)
        .await
        .unwrap();
    }
    let id = store.card_id("swsh1-1".into()).await.unwrap().unwrap();
    assert!(store.price_history(id).await.unwrap().is_empty());
    let current = store.current_prices(id).await.unwrap();
    assert_eq!(current[0].price, Some(1.25));
    assert_eq!(current[0].finish, Finish::Holofoil);
    assert_eq!(current[0].condition, Condition::NearMint);
  }

  #[tokio::test]
  async fn feed_date_clock_archives_across_feed_days() {
    let store = store_with_card().await;
    let clock = ObservationClock::FeedDate(Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap());

    record_prices(&store, vec![price_record("swsh1-1", Some("2024/05/01"), 1.0)], clock)
      .await
      .unwrap();
    let summary = record_prices(
      &store,
      vec![price_record("swsh1-1", Some("2024/05/02"), 2.0), price_record("nobody", None, 9.0)],
      clock,
    )
    .await
    .unwrap();
    assert_eq!(summary, PriceSummary { cards: 1, variants: 1, archived: 1, unknown: 1 });

    let id = store.card_id("swsh1-1".into()).await.unwrap().unwrap();
    let history = store.price_history(id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].price, 1.0);
    assert_eq!(history[0].timestamp, Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap());
  }
}
