//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Dates are stored as `YYYY-MM-DD`, set update stamps as
//! `YYYY-MM-DD HH:MM:SS`, price timestamps as RFC 3339. Enumerations are
//! stored by their upper-case discriminant.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use tcgsync_core::{
  card::Modifier,
  era::Series,
  price::{Condition, Finish},
};

use crate::{Error, Result};

const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── NaiveDate / NaiveDateTime ───────────────────────────────────────────────

pub fn encode_date(date: NaiveDate) -> String { date.format(DATE_FORMAT).to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

pub fn encode_datetime(dt: NaiveDateTime) -> String { dt.format(DATETIME_FORMAT).to_string() }

// ─── Series ──────────────────────────────────────────────────────────────────

pub fn encode_series(series: Series) -> &'static str { series.as_str() }

pub fn decode_series(s: &str) -> Result<Series> {
  Series::parse(s).ok_or_else(|| Error::UnknownDiscriminant {
    kind:  "series",
    value: s.to_owned(),
  })
}

// ─── Finish ──────────────────────────────────────────────────────────────────

pub fn encode_finish(f: Finish) -> &'static str {
  match f {
    Finish::Normal => "NORMAL",
    Finish::Holofoil => "HOLOFOIL",
    Finish::ReverseHolo => "REVERSE_HOLO",
    Finish::FirstEditionNormal => "FIRST_EDITION_NORMAL",
    Finish::FirstEditionHolofoil => "FIRST_EDITION_HOLOFOIL",
    Finish::UnlimitedHolofoil => "UNLIMITED_HOLOFOIL",
  }
}

pub fn decode_finish(s: &str) -> Result<Finish> {
  match s {
    "NORMAL" => Ok(Finish::Normal),
    "HOLOFOIL" => Ok(Finish::Holofoil),
    "REVERSE_HOLO" => Ok(Finish::ReverseHolo),
    "FIRST_EDITION_NORMAL" => Ok(Finish::FirstEditionNormal),
    "FIRST_EDITION_HOLOFOIL" => Ok(Finish::FirstEditionHolofoil),
    "UNLIMITED_HOLOFOIL" => Ok(Finish::UnlimitedHolofoil),
    other => Err(Error::UnknownDiscriminant { kind: "finish", value: other.to_owned() }),
  }
}

// ─── Condition ───────────────────────────────────────────────────────────────

pub fn encode_condition(c: Condition) -> &'static str {
  match c {
    Condition::NearMint => "NEAR_MINT",
  }
}

pub fn decode_condition(s: &str) -> Result<Condition> {
  match s {
    "NEAR_MINT" => Ok(Condition::NearMint),
    other => Err(Error::UnknownDiscriminant { kind: "condition", value: other.to_owned() }),
  }
}

// ─── Modifier ────────────────────────────────────────────────────────────────

/// A weakness or resistance as its three nullable columns.
pub type ModifierColumns = (Option<String>, Option<String>, Option<i64>);

pub fn encode_modifier(m: Option<&Modifier>) -> ModifierColumns {
  match m {
    Some(m) => (m.kind.clone(), m.modifier.map(String::from), m.value),
    None => (None, None, None),
  }
}

/// All three columns null means no modifier.
pub fn decode_modifier((kind, modifier, value): ModifierColumns) -> Option<Modifier> {
  if kind.is_none() && modifier.is_none() && value.is_none() {
    return None;
  }
  Some(Modifier {
    kind,
    modifier: modifier.and_then(|m| m.chars().next()),
    value,
  })
}
