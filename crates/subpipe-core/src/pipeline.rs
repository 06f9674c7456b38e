//! One incremental run: extract, detect the delta, cleanse, validate, merge,
//! persist.
//!
//! The quarantine append is committed as soon as it is known and is not rolled
//! back if the aggregated batch later fails validation. The aggregated batch
//! is all-or-nothing.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::Serialize;

use crate::{
  Error, Result, delta,
  merge::{AggregatedRecord, merge},
  reference::{cleanse_career_paths, cleanse_student_jobs},
  store::{OutputStore, SourceTables},
  student::{RawStudent, cleanse_students},
  validate::{check_completeness, check_references, check_schema},
};

/// Per-run parameters.
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
  /// The date ages are computed against.
  pub as_of: NaiveDate,
}

/// What a run did.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
  pub as_of:             NaiveDate,
  /// Rows in the source student table.
  pub source_students:   usize,
  /// Source rows not yet in the aggregated table.
  pub new_students:      usize,
  pub aggregated_added:  usize,
  pub quarantined_added: usize,
  /// The full aggregated table after a successful append; `None` when
  /// nothing was appended.
  #[serde(skip)]
  pub snapshot:          Option<Vec<AggregatedRecord>>,
}

impl RunReport {
  /// Whether this run appended anything to either table.
  pub fn has_changes(&self) -> bool { self.aggregated_added + self.quarantined_added > 0 }
}

fn ensure_unique_uuids(rows: &[RawStudent]) -> Result<()> {
  let mut seen = HashSet::with_capacity(rows.len());
  match rows.iter().find(|r| !seen.insert(r.uuid)) {
    Some(dup) => Err(Error::DuplicateStudent(dup.uuid)),
    None => Ok(()),
  }
}

/// Execute one pipeline run against `source`, appending to `output`.
pub async fn run<S, O>(source: &S, output: &O, opts: RunOptions) -> Result<RunReport>
where
  S: SourceTables,
  O: OutputStore,
{
  let students = source.read_students().await.map_err(Error::store)?;
  let career_paths = source.read_career_paths().await.map_err(Error::store)?;
  let student_jobs = source.read_student_jobs().await.map_err(Error::store)?;
  ensure_unique_uuids(&students)?;

  let mut report = RunReport {
    as_of:             opts.as_of,
    source_students:   students.len(),
    new_students:      0,
    aggregated_added:  0,
    quarantined_added: 0,
    snapshot:          None,
  };

  // ── Delta ───────────────────────────────────────────────────────────────

  let committed = output.aggregated_keys().await.map_err(Error::store)?;
  let new_students = delta::new_rows(students, &committed, |s| s.uuid);
  report.new_students = new_students.len();
  tracing::info!(
    source = report.source_students,
    new = report.new_students,
    "detected new student rows"
  );

  let cleansed = cleanse_students(&new_students, opts.as_of);

  // ── Quarantine ──────────────────────────────────────────────────────────

  let quarantined = output.quarantine_keys().await.map_err(Error::store)?;
  let new_missing = delta::new_rows(cleansed.quarantined, &quarantined, |q| q.raw.uuid);
  if !new_missing.is_empty() {
    for q in &new_missing {
      tracing::warn!(uuid = q.raw.uuid, reason = %q.reason, "student row quarantined");
    }
    let raws: Vec<RawStudent> = new_missing.into_iter().map(|q| q.raw).collect();
    report.quarantined_added = output.append_quarantine(&raws).await.map_err(Error::store)?;
  }

  if cleansed.cleansed.is_empty() {
    tracing::info!(quarantined = report.quarantined_added, "no new student rows to merge");
    return Ok(report);
  }

  // ── Reference tables + integrity ────────────────────────────────────────

  let career_paths = cleanse_career_paths(career_paths);
  let student_jobs = cleanse_student_jobs(student_jobs);

  let job_keys: HashSet<i64> = student_jobs.iter().map(|j| j.job_id).collect();
  check_references(
    "job_id",
    "student_jobs",
    cleansed.cleansed.iter().map(|s| s.job_id),
    &job_keys,
  )?;

  let path_keys: HashSet<i64> = career_paths.iter().map(|p| p.career_path_id).collect();
  check_references(
    "career_path_id",
    "career_paths",
    cleansed.cleansed.iter().map(|s| s.current_career_path_id),
    &path_keys,
  )?;

  // ── Merge + schema/completeness ─────────────────────────────────────────

  let merged = merge(cleansed.cleansed, &career_paths, &student_jobs)?;

  let persisted_schema = output.aggregated_schema().await.map_err(Error::store)?;
  check_schema(&AggregatedRecord::schema(), persisted_schema.as_ref())?;
  let records = check_completeness(merged)?;

  // ── Commit ──────────────────────────────────────────────────────────────

  report.aggregated_added = output.append_aggregated(&records).await.map_err(Error::store)?;
  report.snapshot = Some(output.read_aggregated().await.map_err(Error::store)?);

  tracing::info!(
    aggregated = report.aggregated_added,
    quarantined = report.quarantined_added,
    "run committed"
  );
  Ok(report)
}
