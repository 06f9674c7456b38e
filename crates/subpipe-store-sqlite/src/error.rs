//! Error type for `subpipe-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  /// A stored value could not be read back as the expected type.
  #[error("cannot decode column `{column}`: {detail}")]
  Decode {
    column: &'static str,
    detail: String,
  },
}

impl Error {
  pub(crate) fn decode(column: &'static str, detail: impl Into<String>) -> Self {
    Self::Decode { column, detail: detail.into() }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
