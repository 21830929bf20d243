//! Error type for `tcgsync-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] tcgsync_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored discriminant (series, finish, condition) this build does not
  /// know.
  #[error("unknown {kind} {value:?} in store")]
  UnknownDiscriminant { kind: &'static str, value: String },

  /// A card file names a set that has not been imported.
  #[error("set not found: {0}")]
  UnknownSet(String),
}

impl Error {
  /// Recover an error raised inside a connection closure.
  ///
  /// Closures run by [`tokio_rusqlite::Connection::call`] can only fail with
  /// a `tokio_rusqlite::Error`, so domain errors travel as
  /// `tokio_rusqlite::Error::Other` and are unwrapped here.
  pub(crate) fn lift(err: tokio_rusqlite::Error) -> Self {
    match err {
      tokio_rusqlite::Error::Other(inner) => match inner.downcast::<Error>() {
        Ok(err) => *err,
        Err(other) => Error::Database(tokio_rusqlite::Error::Other(other)),
      },
      other => Error::Database(other),
    }
  }

  /// Box for transport out of a connection closure; see [`Error::lift`].
  pub(crate) fn sink(self) -> tokio_rusqlite::Error {
    match self {
      Error::Database(inner) => inner,
      Error::Sqlite(inner) => tokio_rusqlite::Error::Rusqlite(inner),
      other => tokio_rusqlite::Error::Other(Box::new(other)),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
