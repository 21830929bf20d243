//! Error types for `tcgsync-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A card number with no digit run, or an empty one.
  #[error("card {external_id}: cannot normalise number {raw:?}")]
  InvalidNumber { external_id: String, raw: String },

  #[error("invalid {field} date {value:?}: {source}")]
  InvalidDate {
    field:  &'static str,
    value:  String,
    #[source]
    source: chrono::ParseError,
  },

  /// A feed field present but not in the expected shape (e.g. a weakness
  /// value that is not a modifier followed by a magnitude).
  #[error("card {external_id}: malformed {field} {value:?}")]
  MalformedField {
    external_id: String,
    field:       &'static str,
    value:       String,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
