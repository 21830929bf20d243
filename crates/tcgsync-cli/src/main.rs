//! `tcgsync`: keep a local card catalog converged with the public card feed.
//!
//! Reads `tcgsync.toml` (or the path given with `--config`) plus `TCGSYNC_*`
//! environment variables, opens the SQLite store, and runs one import.
//!
//! ```text
//! tcgsync sets data/sets/en.json
//! tcgsync cards data/cards/en/
//! tcgsync prices --url 'https://api.pokemontcg.io/v2/cards?q=set.id:sv1'
//! tcgsync prices-all --workers 4
//! ```

use std::path::PathBuf;

use anyhow::{Context as _, bail};
use clap::{Parser, Subcommand};
use tcgsync_cli::{
  feed::FeedClient,
  import::{self, ObservationClock, PriceSummary},
  partition::run_partitions,
  settings::Settings,
};
use tcgsync_core::store::CatalogStore as _;
use tcgsync_store_sqlite::SqliteStore;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Trading-card catalog sync")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "tcgsync.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Import a set feed file.
  Sets { path: PathBuf },

  /// Import a card feed file, or every `*.json` file of a directory.
  Cards { path: PathBuf },

  /// Import the prices behind one paginated feed URL.
  Prices {
    #[arg(long)]
    url:       String,
    /// Timestamp observations with the feed's update date instead of today.
    #[arg(long)]
    feed_date: bool,
  },

  /// Import prices for every stored set in parallel.
  PricesAll {
    /// Feed URL each set's `q=set.id:<id>` filter is appended to.
    #[arg(long)]
    base_url:  Option<String>,
    #[arg(long)]
    workers:   Option<usize>,
    #[arg(long)]
    feed_date: bool,
  },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = Settings::load(&cli.config)?;
  let token = match cli.command {
    Command::Prices { .. } | Command::PricesAll { .. } => Some(settings.api_token()?.to_owned()),
    _ => None,
  };

  let store_path = settings.database_path();
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  match cli.command {
    Command::Sets { path } => {
      import::import_sets(&store, &path).await?;
    }

    Command::Cards { path } => {
      let summary = import::import_cards(&store, &path).await?;
      tracing::info!(
        "{} card files, {} failed: {}",
        summary.files,
        summary.failed.len(),
        summary.report
      );
      if !summary.failed.is_empty() {
        bail!("{} card files failed to import", summary.failed.len());
      }
    }

    Command::Prices { url, feed_date } => {
      let client = FeedClient::new(token.unwrap_or_default())?;
      let summary =
        import::import_prices(&store, &client, &url, ObservationClock::today(feed_date)).await?;
      log_prices(&summary);
    }

    Command::PricesAll { base_url, workers, feed_date } => {
      let client = FeedClient::new(token.unwrap_or_default())?;
      let base_url = base_url.unwrap_or_else(|| settings.base_url.clone());
      let workers = workers.unwrap_or(settings.workers);
      let clock = ObservationClock::today(feed_date);

      let set_ids = store.set_ids().await.context("failed to list sets")?;
      tracing::info!("importing prices for {} sets with {workers} workers", set_ids.len());

      let summary = run_partitions(set_ids, workers, settings.retry_policy(), move |set_id| {
        let store = store.clone();
        let client = client.clone();
        let url = import::partition_url(&base_url, &set_id);
        async move { import::import_prices(&store, &client, &url, clock).await }
      })
      .await;

      let mut total = PriceSummary::default();
      for (_, partition) in &summary.succeeded {
        total.absorb(*partition);
      }
      log_prices(&total);

      if !summary.all_succeeded() {
        let failed: Vec<_> = summary.failed.iter().map(|(id, _)| id.as_str()).collect();
        bail!("{} partitions failed: {}", failed.len(), failed.join(", "));
      }
    }
  }

  Ok(())
}

fn log_prices(summary: &PriceSummary) {
  tracing::info!(
    "prices recorded for {} cards ({} variants, {} archived), {} unknown cards skipped",
    summary.cards,
    summary.variants,
    summary.archived,
    summary.unknown
  );
}
