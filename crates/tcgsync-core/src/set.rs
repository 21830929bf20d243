//! Canonical set records.

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};

use crate::era::Series;

/// One set as desired in the store.
#[derive(Debug, Clone, PartialEq)]
pub struct SetRecord {
  pub id:            String,
  /// Short code; the set id when the feed has none.
  pub code:          String,
  pub name:          String,
  pub series:        Series,
  pub release_date:  NaiveDate,
  pub last_updated:  NaiveDateTime,
  pub printed_total: u32,
  pub total:         u32,
  /// Upper-cased format name → legality (`"STANDARD"` → `"Legal"`).
  pub legalities:    BTreeMap<String, String>,
  /// Image type → url (`"logo"`, `"symbol"`).
  pub images:        BTreeMap<String, String>,
}

/// The numbering inputs of a stored set, looked up once per card file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetNumbering {
  pub printed_total: u32,
  pub fixed_padding: bool,
}
