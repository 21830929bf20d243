//! Card number normalisation.
//!
//! The feed carries card numbers in whatever shape the printed card uses
//! (`"7"`, `"SWSH001"`, `"H9"`, `"TG04/TG30"`, `"25a"`). The store keeps a
//! canonical display form `number/printed_total`, padded according to the
//! set's numbering era (see [`crate::era`]).

use std::sync::LazyLock;

use regex::Regex;

/// Promo series codes that the feed prepends to promo numbers. The set id
/// already identifies the promo series, so these are not kept in the
/// canonical number.
const PROMO_SERIES_CODES: [&str; 6] = ["SWSH", "HGSS", "SM", "XY", "BW", "DP"];

/// Gallery sub-sets (`TG`, `GG`) are numbered apart from the main set.
static GALLERY: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^(TG|GG)(\d+)(?:/(TG|GG)\d+)?$").expect("gallery pattern")
});

static DIGITS: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"\d+").expect("digit pattern"));

/// Normalise a raw feed number into its canonical display form.
///
/// Returns `None` for blank input and for input without any digits.
///
/// - Gallery numbers always render as `PREFIXnn/PREFIXtotal`.
/// - Regular numbers keep any text around the first digit run; the digits are
///   zero-padded to three places when `fixed_padding` is set and left bare
///   otherwise.
pub fn normalize(raw: &str, printed_total: u32, fixed_padding: bool) -> Option<String> {
  let raw = raw.trim();
  if raw.is_empty() {
    return None;
  }

  if let Some(gallery) = normalize_gallery(raw, printed_total) {
    return Some(gallery);
  }

  let first = raw.split('/').next()?;
  let digits = DIGITS.find(first)?;
  let value: u64 = digits.as_str().parse().ok()?;

  let prefix = strip_promo_code(&first[..digits.start()]);
  let suffix = &first[digits.end()..];
  let number = if fixed_padding {
    format!("{value:03}")
  } else {
    value.to_string()
  };

  Some(format!("{prefix}{number}{suffix}/{printed_total}"))
}

fn normalize_gallery(raw: &str, printed_total: u32) -> Option<String> {
  let caps = GALLERY.captures(raw)?;
  let prefix = caps.get(1)?.as_str();
  // `TG04/GG30` is not a gallery number; let the regular rule handle it.
  if let Some(repeat) = caps.get(3)
    && repeat.as_str() != prefix
  {
    return None;
  }
  let value: u64 = caps.get(2)?.as_str().parse().ok()?;
  Some(format!("{prefix}{value:02}/{prefix}{printed_total}"))
}

fn strip_promo_code(prefix: &str) -> &str {
  if PROMO_SERIES_CODES.contains(&prefix) {
    ""
  } else {
    prefix
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn promo_series_code_is_dropped() {
    assert_eq!(normalize("SWSH001", 73, true).as_deref(), Some("001/73"));
    assert_eq!(normalize("SM01", 248, false).as_deref(), Some("1/248"));
  }

  #[test]
  fn gallery_number_keeps_two_digits() {
    assert_eq!(normalize("TG04/TG30", 30, false).as_deref(), Some("TG04/TG30"));
    assert_eq!(normalize("TG4", 30, true).as_deref(), Some("TG04/TG30"));
    assert_eq!(normalize("GG12", 70, true).as_deref(), Some("GG12/GG70"));
  }

  #[test]
  fn mismatched_gallery_prefix_falls_back_to_regular_rule() {
    assert_eq!(normalize("TG04/GG30", 30, false).as_deref(), Some("TG4/30"));
  }

  #[test]
  fn blank_input_is_none() {
    assert_eq!(normalize("", 102, false), None);
    assert_eq!(normalize("   ", 102, true), None);
  }

  #[test]
  fn no_digits_is_none() {
    assert_eq!(normalize("?", 102, false), None);
    assert_eq!(normalize("ONE/TWO", 102, true), None);
  }

  #[test]
  fn prefix_and_suffix_are_preserved() {
    assert_eq!(normalize("H9", 111, false).as_deref(), Some("H9/111"));
    assert_eq!(normalize("RC5", 25, true).as_deref(), Some("RC005/25"));
    assert_eq!(normalize("25a", 64, false).as_deref(), Some("25a/64"));
    assert_eq!(normalize("SV65", 94, false).as_deref(), Some("SV65/94"));
  }

  #[test]
  fn fixed_padding_widths() {
    assert_eq!(normalize("7", 198, true).as_deref(), Some("007/198"));
    assert_eq!(normalize("42", 198, true).as_deref(), Some("042/198"));
    assert_eq!(normalize("187", 198, true).as_deref(), Some("187/198"));
    // Independent of the printed total.
    assert_eq!(normalize("7", 30, true).as_deref(), Some("007/30"));
  }

  #[test]
  fn legacy_numbers_are_bare() {
    assert_eq!(normalize("007", 102, false).as_deref(), Some("7/102"));
    assert_eq!(normalize("58", 102, false).as_deref(), Some("58/102"));
  }

  #[test]
  fn only_first_segment_is_used() {
    assert_eq!(normalize("12/100", 102, true).as_deref(), Some("012/102"));
  }
}
