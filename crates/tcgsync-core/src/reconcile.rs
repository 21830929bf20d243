//! Generic child-collection diff.
//!
//! Computes the minimal set of inserts, updates and deletes that transitions
//! the stored rows of one collection (scoped to one parent) to the desired
//! contents coming from the feed. Applying the result and diffing again with
//! the same desired input yields an empty [`Changes`].

use std::{
  collections::{HashMap, HashSet},
  fmt,
  hash::Hash,
};

/// What needs to change to make a stored collection equal the desired one.
///
/// `I` is the stored row's identity (a primary key, or `()` for value-keyed
/// collections, which are deleted by value).
#[derive(Debug)]
pub struct Changes<'a, I, T> {
  /// Desired items whose key is not stored yet, in desired order.
  pub to_insert: Vec<&'a T>,
  /// Stored rows whose key is desired but whose fields differ, paired with
  /// the desired item.
  pub to_update: Vec<(&'a I, &'a T)>,
  /// Stored rows whose key is no longer desired, in stored order.
  pub to_delete: Vec<(&'a I, &'a T)>,
}

impl<I, T> Changes<'_, I, T> {
  /// True if applying these changes would write nothing.
  pub fn is_empty(&self) -> bool {
    self.to_insert.is_empty() && self.to_update.is_empty() && self.to_delete.is_empty()
  }

  /// Number of row writes applying these changes performs.
  pub fn writes(&self) -> usize {
    self.to_insert.len() + self.to_update.len() + self.to_delete.len()
  }
}

/// Diff `desired` against `current`.
///
/// - `key_fn` extracts the natural key; it must be unique within one parent
///   scope. Desired items repeating a key collapse onto the first occurrence.
/// - `equals_fn` compares the non-key fields of a stored row with a desired
///   item; returning `true` means no update is needed. Value-keyed collections
///   pass `|_, _| true`.
pub fn reconcile<'a, I, T, K, KF, EF>(
  desired: &'a [T],
  current: &'a [(I, T)],
  key_fn: KF,
  equals_fn: EF,
) -> Changes<'a, I, T>
where
  K: Eq + Hash,
  KF: Fn(&T) -> K,
  EF: Fn(&T, &T) -> bool,
{
  let stored: HashMap<K, (&I, &T)> = current
    .iter()
    .map(|(id, item)| (key_fn(item), (id, item)))
    .collect();

  let mut wanted: HashSet<K> = HashSet::with_capacity(desired.len());
  let mut to_insert = vec![];
  let mut to_update = vec![];

  for item in desired {
    let key = key_fn(item);
    if wanted.contains(&key) {
      continue;
    }
    match stored.get(&key) {
      None => to_insert.push(item),
      Some((id, existing)) => {
        if !equals_fn(*existing, item) {
          to_update.push((*id, item));
        }
      }
    }
    wanted.insert(key);
  }

  let to_delete = current
    .iter()
    .filter(|(_, item)| !wanted.contains(&key_fn(item)))
    .map(|(id, item)| (id, item))
    .collect();

  Changes {
    to_insert,
    to_update,
    to_delete,
  }
}

// ─── Reporting ───────────────────────────────────────────────────────────────

/// Row-write counters accumulated while applying [`Changes`] to a store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
  pub inserted: usize,
  pub updated:  usize,
  pub deleted:  usize,
}

impl ReconcileReport {
  /// Total number of row writes.
  pub fn writes(&self) -> usize { self.inserted + self.updated + self.deleted }

  pub fn is_noop(&self) -> bool { self.writes() == 0 }

  /// Fold another report into this one.
  pub fn absorb(&mut self, other: ReconcileReport) {
    self.inserted += other.inserted;
    self.updated += other.updated;
    self.deleted += other.deleted;
  }
}

impl<I, T> From<&Changes<'_, I, T>> for ReconcileReport {
  fn from(changes: &Changes<'_, I, T>) -> Self {
    Self {
      inserted: changes.to_insert.len(),
      updated:  changes.to_update.len(),
      deleted:  changes.to_delete.len(),
    }
  }
}

impl fmt::Display for ReconcileReport {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.is_noop() {
      return write!(f, "no changes");
    }
    write!(
      f,
      "+{} inserted, ~{} updated, -{} deleted",
      self.inserted, self.updated, self.deleted
    )
  }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
