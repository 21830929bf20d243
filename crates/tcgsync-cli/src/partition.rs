//! Bounded worker pool with fixed-count retry.
//!
//! Each partition is an independent unit of work (one set's prices). Up to
//! `workers` partitions run at once as tokio tasks. A failed partition is
//! retried after a fixed delay; once its attempts are exhausted it is
//! reported failed without affecting the others.

use std::{
  collections::HashMap,
  future::Future,
  sync::Arc,
  time::{Duration, Instant},
};

use tokio::{sync::Semaphore, task::JoinSet};

/// Fixed retry: `attempts` tries in total, `delay` between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
  pub attempts: u32,
  pub delay:    Duration,
}

impl Default for RetryPolicy {
  fn default() -> Self { Self { attempts: 3, delay: Duration::from_secs(10) } }
}

/// Run `op` until it succeeds or `policy.attempts` is exhausted, returning
/// the last error.
pub async fn retry<T, F, Fut>(policy: RetryPolicy, label: &str, mut op: F) -> anyhow::Result<T>
where
  F: FnMut() -> Fut,
  Fut: Future<Output = anyhow::Result<T>>,
{
  let mut attempt = 1;
  loop {
    match op().await {
      Ok(value) => return Ok(value),
      Err(err) if attempt < policy.attempts => {
        tracing::warn!(
          "{label}: attempt {attempt}/{} failed: {err:#}; retrying in {:?}",
          policy.attempts,
          policy.delay
        );
        tokio::time::sleep(policy.delay).await;
        attempt += 1;
      }
      Err(err) => return Err(err.context(format!("{label}: gave up after {attempt} attempts"))),
    }
  }
}

/// Outcome of a pool run.
#[derive(Debug, Default)]
pub struct PartitionSummary<T> {
  pub succeeded: Vec<(String, T)>,
  /// Partition id and its final error, rendered.
  pub failed:    Vec<(String, String)>,
}

impl<T> PartitionSummary<T> {
  pub fn all_succeeded(&self) -> bool { self.failed.is_empty() }
}

/// Run `op` once per partition id on a pool of `workers` tasks, retrying each
/// per `policy`.
pub async fn run_partitions<T, F, Fut>(
  ids: Vec<String>,
  workers: usize,
  policy: RetryPolicy,
  op: F,
) -> PartitionSummary<T>
where
  T: Send + 'static,
  F: Fn(String) -> Fut + Clone + Send + Sync + 'static,
  Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
{
  let total = ids.len();
  let permits = Arc::new(Semaphore::new(workers.max(1)));
  let mut tasks = JoinSet::new();
  // A panicked task yields only its task id.
  let mut partition_of = HashMap::with_capacity(total);

  for id in ids {
    let permits = permits.clone();
    let op = op.clone();
    let partition = id.clone();
    let handle = tasks.spawn(async move {
      // The semaphore is never closed.
      let _permit = permits.acquire_owned().await.ok();
      retry(policy, &partition, || op(partition.clone())).await
    });
    partition_of.insert(handle.id(), id);
  }

  let started = Instant::now();
  let mut summary = PartitionSummary { succeeded: vec![], failed: vec![] };

  while let Some(joined) = tasks.join_next_with_id().await {
    let task_id = match &joined {
      Ok((task_id, _)) => *task_id,
      Err(join_err) => join_err.id(),
    };
    let id = partition_of.remove(&task_id).unwrap_or_default();
    match joined {
      Ok((_, Ok(value))) => summary.succeeded.push((id, value)),
      Ok((_, Err(err))) => {
        tracing::error!("partition {id} failed: {err:#}");
        summary.failed.push((id, format!("{err:#}")));
      }
      Err(join_err) => {
        tracing::error!("partition {id} panicked: {join_err}");
        summary.failed.push((id, join_err.to_string()));
      }
    }

    let done = summary.succeeded.len() + summary.failed.len();
    let remaining = total - done;
    let eta = started.elapsed().mul_f64(remaining as f64 / done as f64);
    tracing::info!(
      "progress: {done}/{total} partitions done, {} succeeded, ~{}s remaining",
      summary.succeeded.len(),
      eta.as_secs()
    );
  }

  summary
}
