//! The source and output store traits.
//!
//! Implemented by storage backends (e.g. `subpipe-store-sqlite`). The
//! pipeline depends on these abstractions, not on any concrete backend.

use std::{collections::HashSet, future::Future};

use crate::{
  merge::AggregatedRecord,
  reference::{CareerPath, StudentJob},
  schema::TableSchema,
  student::RawStudent,
};

/// Read-only access to the three raw tables. Every read returns the whole
/// table.
pub trait SourceTables: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn read_students(
    &self,
  ) -> impl Future<Output = Result<Vec<RawStudent>, Self::Error>> + Send + '_;

  fn read_career_paths(
    &self,
  ) -> impl Future<Output = Result<Vec<CareerPath>, Self::Error>> + Send + '_;

  fn read_student_jobs(
    &self,
  ) -> impl Future<Output = Result<Vec<StudentJob>, Self::Error>> + Send + '_;
}

/// Append-only access to the aggregated and quarantine tables.
///
/// No method updates or deletes an existing row. Each append is atomic: it
/// either commits every row passed in or none of them.
pub trait OutputStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Keys ──────────────────────────────────────────────────────────────

  /// `uuid`s already in the aggregated table; empty if it does not exist.
  fn aggregated_keys(
    &self,
  ) -> impl Future<Output = Result<HashSet<i64>, Self::Error>> + Send + '_;

  /// `uuid`s already in the quarantine table; empty if it does not exist.
  fn quarantine_keys(
    &self,
  ) -> impl Future<Output = Result<HashSet<i64>, Self::Error>> + Send + '_;

  /// The persisted aggregated schema, or `None` if the table does not exist.
  fn aggregated_schema(
    &self,
  ) -> impl Future<Output = Result<Option<TableSchema>, Self::Error>> + Send + '_;

  // ── Appends ───────────────────────────────────────────────────────────

  /// Append raw rows to the quarantine table verbatim. Returns the number of
  /// rows written.
  fn append_quarantine<'a>(
    &'a self,
    rows: &'a [RawStudent],
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + 'a;

  /// Append a validated batch, creating the table from
  /// [`AggregatedRecord::schema`] on first use.
  fn append_aggregated<'a>(
    &'a self,
    rows: &'a [AggregatedRecord],
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + 'a;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// Re-read the whole aggregated table.
  fn read_aggregated(
    &self,
  ) -> impl Future<Output = Result<Vec<AggregatedRecord>, Self::Error>> + Send + '_;
}
