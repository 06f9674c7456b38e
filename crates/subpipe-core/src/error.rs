//! Error types for `subpipe-core`.
//!
//! Every variant here is fatal to a run. Recoverable input-shape problems are
//! expressed as [`DecodeError`](crate::student::DecodeError) instead and end
//! up in quarantine.

use thiserror::Error;

use crate::schema::ColumnType;

#[derive(Debug, Error)]
pub enum Error {
  #[error("missing {column}(s): {missing:?} in `{table}` table")]
  ReferentialIntegrityViolation {
    column:  &'static str,
    table:   &'static str,
    missing: Vec<i64>,
  },

  #[error("student uuid {0} appears more than once in the source table")]
  DuplicateStudent(i64),

  #[error("duplicate key {key} in `{table}` table")]
  DuplicateReferenceKey { table: &'static str, key: i64 },

  #[error(
    "there are {count} rows with missing values in the aggregated batch \
     (first: uuid {first_uuid}, column `{first_column}`)"
  )]
  IncompleteOutputRow {
    count:        usize,
    first_uuid:   i64,
    first_column: &'static str,
  },

  #[error("schema version mismatch: persisted v{persisted}, batch v{batch}")]
  SchemaVersionMismatch { persisted: u32, batch: u32 },

  #[error("column count mismatch: persisted {persisted}, batch {batch}")]
  ColumnCountMismatch { persisted: usize, batch: usize },

  #[error("column `{column}` type mismatch: persisted {persisted}, batch {batch}")]
  ColumnTypeMismatch {
    column:    String,
    persisted: ColumnType,
    batch:     ColumnType,
  },

  #[error("persisted column `{0}` is absent from the batch")]
  MissingColumn(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Wrap a backend error.
  pub fn store<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(err))
  }

  /// Whether this error reports a violated data invariant (as opposed to an
  /// I/O failure in a backend).
  pub fn is_integrity(&self) -> bool { !matches!(self, Self::Store(_)) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
