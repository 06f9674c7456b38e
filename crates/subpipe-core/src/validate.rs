//! Pre-commit gates: referential integrity, schema stability and
//! completeness. Any failure aborts the run before the aggregated batch is
//! written.

use std::collections::{BTreeSet, HashSet};

use crate::{
  Error, Result,
  merge::{AggregatedRecord, MergedRow},
  schema::TableSchema,
};

/// Fail if any foreign key in `child_keys` is absent from `parent_keys`.
pub fn check_references<I>(
  column: &'static str,
  table: &'static str,
  child_keys: I,
  parent_keys: &HashSet<i64>,
) -> Result<()>
where
  I: IntoIterator<Item = i64>,
{
  let missing: BTreeSet<i64> = child_keys
    .into_iter()
    .filter(|k| !parent_keys.contains(k))
    .collect();

  if missing.is_empty() {
    tracing::debug!(column, table, "all foreign keys present");
    Ok(())
  } else {
    Err(Error::ReferentialIntegrityViolation {
      column,
      table,
      missing: missing.into_iter().collect(),
    })
  }
}

/// Compare a batch schema against the persisted one, by column name.
///
/// `persisted` is `None` when the output table does not exist yet, in which
/// case there is nothing to compare against.
pub fn check_schema(batch: &TableSchema, persisted: Option<&TableSchema>) -> Result<()> {
  let Some(persisted) = persisted else {
    return Ok(());
  };

  if persisted.version != batch.version {
    return Err(Error::SchemaVersionMismatch {
      persisted: persisted.version,
      batch:     batch.version,
    });
  }

  if persisted.columns.len() != batch.columns.len() {
    return Err(Error::ColumnCountMismatch {
      persisted: persisted.columns.len(),
      batch:     batch.columns.len(),
    });
  }

  for col in &persisted.columns {
    let Some(ours) = batch.column(&col.name) else {
      return Err(Error::MissingColumn(col.name.clone()));
    };
    if ours.ty != col.ty {
      return Err(Error::ColumnTypeMismatch {
        column:    col.name.clone(),
        persisted: col.ty,
        batch:     ours.ty,
      });
    }
  }

  Ok(())
}

/// Convert merged rows into complete records, failing if any row has a
/// missing value in any column.
pub fn check_completeness(rows: Vec<MergedRow>) -> Result<Vec<AggregatedRecord>> {
  let mut complete = Vec::with_capacity(rows.len());
  let mut first: Option<(i64, &'static str)> = None;
  let mut count = 0;

  for row in rows {
    let uuid = row.student.uuid;
    match row.complete() {
      Ok(rec) => complete.push(rec),
      Err(column) => {
        count += 1;
        first.get_or_insert((uuid, column));
      }
    }
  }

  match first {
    None => Ok(complete),
    Some((first_uuid, first_column)) => Err(Error::IncompleteOutputRow {
      count,
      first_uuid,
      first_column,
    }),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    merge::{
      merge,
      tests::{jobs, paths, student},
    },
    schema::{ColumnDef, ColumnType},
  };

  fn keys(ids: &[i64]) -> HashSet<i64> { ids.iter().copied().collect() }

  // ── References ─────────────────────────────────────────────────────────────

  #[test]
  fn subset_keys_pass() {
    check_references("job_id", "student_jobs", [1, 2, 2], &keys(&[1, 2, 3])).unwrap();
  }

  #[test]
  fn missing_keys_are_named_sorted_and_unique() {
    let err =
      check_references("job_id", "student_jobs", [9, 1, 5, 9], &keys(&[1])).unwrap_err();
    match err {
      Error::ReferentialIntegrityViolation { column, missing, .. } => {
        assert_eq!(column, "job_id");
        assert_eq!(missing, vec![5, 9]);
      }
      other => panic!("unexpected error: {other}"),
    }
  }

  // ── Schema ─────────────────────────────────────────────────────────────────

  #[test]
  fn first_run_skips_schema_checks() {
    check_schema(&AggregatedRecord::schema(), None).unwrap();
  }

  #[test]
  fn identical_schema_in_other_order_passes() {
    let batch = AggregatedRecord::schema();
    let mut persisted = batch.clone();
    persisted.columns.reverse();
    check_schema(&batch, Some(&persisted)).unwrap();
  }

  #[test]
  fn extra_persisted_column_is_count_mismatch() {
    let batch = AggregatedRecord::schema();
    let mut persisted = batch.clone();
    persisted.columns.push(ColumnDef::new("index", ColumnType::Integer));
    let err = check_schema(&batch, Some(&persisted)).unwrap_err();
    assert!(matches!(err, Error::ColumnCountMismatch { persisted: 21, batch: 20 }));
  }

  #[test]
  fn renamed_column_is_missing_column() {
    let batch = AggregatedRecord::schema();
    let mut persisted = batch.clone();
    persisted.columns[4].name = "job".into();
    let err = check_schema(&batch, Some(&persisted)).unwrap_err();
    assert!(matches!(err, Error::MissingColumn(c) if c == "job"));
  }

  #[test]
  fn retyped_column_is_type_mismatch() {
    let batch = AggregatedRecord::schema();
    let mut persisted = batch.clone();
    persisted.columns[5].ty = ColumnType::Text;
    let err = check_schema(&batch, Some(&persisted)).unwrap_err();
    assert!(matches!(
      err,
      Error::ColumnTypeMismatch { persisted: ColumnType::Text, batch: ColumnType::Real, .. }
    ));
  }

  #[test]
  fn version_bump_is_rejected() {
    let batch = AggregatedRecord::schema();
    let mut persisted = batch.clone();
    persisted.version += 1;
    let err = check_schema(&batch, Some(&persisted)).unwrap_err();
    assert!(matches!(err, Error::SchemaVersionMismatch { .. }));
  }

  // ── Completeness ───────────────────────────────────────────────────────────

  #[test]
  fn complete_rows_pass() {
    let rows = merge(vec![student(1, 1, 7), student(2, 0, 7)], &paths(), &jobs()).unwrap();
    assert_eq!(check_completeness(rows).unwrap().len(), 2);
  }

  #[test]
  fn incomplete_rows_are_counted() {
    let mut nameless = student(2, 1, 7);
    nameless.name = None;
    let rows = merge(
      vec![student(1, 1, 7), nameless, student(3, 1, 99)],
      &paths(),
      &jobs(),
    )
    .unwrap();
    let err = check_completeness(rows).unwrap_err();
    assert!(matches!(
      err,
      Error::IncompleteOutputRow { count: 2, first_uuid: 2, first_column: "name" }
    ));
  }
}
