//! Async HTTP client for the paginated price feed.

use std::future::Future;

use anyhow::{Context as _, Result, anyhow};
use reqwest::Client;
use serde::de::DeserializeOwned;
use tcgsync_core::feed::{FeedPriceCard, Page};

/// Price feed client. Cheap to clone; the inner [`reqwest::Client`] is
/// `Arc`-based.
#[derive(Clone)]
pub struct FeedClient {
  client: Client,
  token:  String,
}

impl FeedClient {
  pub fn new(token: impl Into<String>) -> Result<Self> {
    let client = Client::builder()
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, token: token.into() })
  }

  /// `GET <url>&page=<n>`
  async fn page<T: DeserializeOwned>(&self, url: &str, page: usize) -> Result<Page<T>> {
    let resp = self
      .client
      .get(url)
      .query(&[("page", page)])
      .bearer_auth(&self.token)
      .send()
      .await
      .with_context(|| format!("GET {url} (page {page}) failed"))?;

    if !resp.status().is_success() {
      return Err(anyhow!("GET {url} (page {page}) → {}", resp.status()));
    }
    resp
      .json()
      .await
      .with_context(|| format!("deserialising page {page} of {url}"))
  }

  /// Every price record behind `url`, across all pages.
  pub async fn price_cards(&self, url: &str) -> Result<Vec<FeedPriceCard>> {
    paginate(|page| self.page(url, page)).await
  }
}

/// Fetch pages `1, 2, ...` until the accumulated count reaches the reported
/// total or a page comes back empty.
pub async fn paginate<T, F, Fut>(mut fetch: F) -> Result<Vec<T>>
where
  F: FnMut(usize) -> Fut,
  Fut: Future<Output = Result<Page<T>>>,
{
  let mut records = vec![];
  let mut page = 1;
  loop {
    let Page { data, total_count } = fetch(page).await?;
    if data.is_empty() {
      break;
    }
    records.extend(data);
    tracing::debug!(page, fetched = records.len(), total = ?total_count, "fetched page");
    if total_count.is_none_or(|total| records.len() >= total) {
      break;
    }
    page += 1;
  }
  Ok(records)
}
