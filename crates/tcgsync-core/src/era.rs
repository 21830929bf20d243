//! Series classification and the numbering-era predicate.
//!
//! Sets released from the Sword & Shield base set onward print their numbers
//! with fixed three-digit padding (`007/198`); older sets print them bare
//! (`7/102`).

use chrono::NaiveDate;

/// Set whose release date marks the start of fixed-width numbering inside
/// the series preceding the newest one.
pub const REFERENCE_SET_ID: &str = "swsh1";

/// Series a set belongs to, as classified in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Series {
  Base,
  Gym,
  Neo,
  ECard,
  Ex,
  Pop,
  DiamondAndPearl,
  Platinum,
  HeartgoldAndSoulsilver,
  BlackAndWhite,
  Xy,
  SunAndMoon,
  SwordAndShield,
  ScarletAndViolet,
  Np,
  Other,
}

/// Main-line series in release order. `Np` and `Other` are not part of it.
const CHRONOLOGY: [Series; 14] = [
  Series::Base,
  Series::Gym,
  Series::Neo,
  Series::ECard,
  Series::Ex,
  Series::Pop,
  Series::DiamondAndPearl,
  Series::Platinum,
  Series::HeartgoldAndSoulsilver,
  Series::BlackAndWhite,
  Series::Xy,
  Series::SunAndMoon,
  Series::SwordAndShield,
  Series::ScarletAndViolet,
];

impl Series {
  /// Map a feed series name (`"Sword & Shield"`) to its classification.
  /// Unknown names classify as [`Series::Other`].
  pub fn from_feed_name(name: &str) -> Self {
    match name.trim().to_lowercase().as_str() {
      "base" => Self::Base,
      "gym" => Self::Gym,
      "neo" => Self::Neo,
      "e-card" => Self::ECard,
      "ex" => Self::Ex,
      "pop" => Self::Pop,
      "diamond & pearl" => Self::DiamondAndPearl,
      "platinum" => Self::Platinum,
      "heartgold & soulsilver" => Self::HeartgoldAndSoulsilver,
      "black & white" => Self::BlackAndWhite,
      "xy" => Self::Xy,
      "sun & moon" => Self::SunAndMoon,
      "sword & shield" => Self::SwordAndShield,
      "scarlet & violet" => Self::ScarletAndViolet,
      "np" => Self::Np,
      _ => Self::Other,
    }
  }

  /// The stored discriminant, e.g. `"SWORD_AND_SHIELD"`.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Base => "BASE",
      Self::Gym => "GYM",
      Self::Neo => "NEO",
      Self::ECard => "E_CARD",
      Self::Ex => "EX",
      Self::Pop => "POP",
      Self::DiamondAndPearl => "DIAMOND_AND_PEARL",
      Self::Platinum => "PLATINUM",
      Self::HeartgoldAndSoulsilver => "HEARTGOLD_AND_SOULSILVER",
      Self::BlackAndWhite => "BLACK_AND_WHITE",
      Self::Xy => "XY",
      Self::SunAndMoon => "SUN_AND_MOON",
      Self::SwordAndShield => "SWORD_AND_SHIELD",
      Self::ScarletAndViolet => "SCARLET_AND_VIOLET",
      Self::Np => "NP",
      Self::Other => "OTHER",
    }
  }

  /// Inverse of [`Series::as_str`].
  pub fn parse(s: &str) -> Option<Self> {
    CHRONOLOGY
      .iter()
      .chain([Self::Np, Self::Other].iter())
      .copied()
      .find(|series| series.as_str() == s)
  }

  /// The most recent classified series.
  pub fn newest() -> Self { CHRONOLOGY[CHRONOLOGY.len() - 1] }

  /// The series released immediately before [`Series::newest`].
  pub fn preceding_newest() -> Self { CHRONOLOGY[CHRONOLOGY.len() - 2] }
}

/// Whether a set uses fixed three-digit card numbering.
///
/// True for every set of the newest series, and for sets of the preceding
/// series released on or after `reference_release` (the release date of
/// [`REFERENCE_SET_ID`]). Without a reference date the preceding series
/// classifies as legacy.
pub fn is_fixed_padding(
  series: Series,
  release_date: NaiveDate,
  reference_release: Option<NaiveDate>,
) -> bool {
  if series == Series::newest() {
    return true;
  }
  if series == Series::preceding_newest() {
    return reference_release.is_some_and(|reference| release_date >= reference);
  }
  false
}
