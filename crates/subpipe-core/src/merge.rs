//! Merging cleansed students with the reference tables.
//!
//! Students are left-joined to career paths first, then to jobs. Both joins
//! preserve every student row; an unmatched lookup leaves the joined side
//! empty and is rejected later by the completeness check.

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::{
  Error, Result,
  cell::Cell,
  reference::{CareerPath, StudentJob},
  schema::{AGGREGATED_SCHEMA_VERSION, ColumnDef, ColumnType, TableSchema},
  student::CleansedStudent,
};

// ─── Join ────────────────────────────────────────────────────────────────────

/// One student row with whatever the joins found for it.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedRow {
  pub student:     CleansedStudent,
  pub career_path: Option<CareerPath>,
  pub job:         Option<StudentJob>,
}

/// Build a key → row index, rejecting two distinct rows under one key.
fn index_by_key<'a, T, F>(
  table: &'static str,
  rows: &'a [T],
  key: F,
) -> Result<HashMap<i64, &'a T>>
where
  F: Fn(&T) -> i64,
{
  let mut index = HashMap::with_capacity(rows.len());
  for row in rows {
    let k = key(row);
    if index.insert(k, row).is_some() {
      return Err(Error::DuplicateReferenceKey { table, key: k });
    }
  }
  Ok(index)
}

/// Left-join `students` → `career_paths` → `jobs`.
pub fn merge(
  students: Vec<CleansedStudent>,
  career_paths: &[CareerPath],
  jobs: &[StudentJob],
) -> Result<Vec<MergedRow>> {
  let paths = index_by_key("career_paths", career_paths, |p| p.career_path_id)?;
  let jobs = index_by_key("student_jobs", jobs, |j| j.job_id)?;

  let with_paths = students.into_iter().map(|student| {
    let career_path = paths.get(&student.current_career_path_id).map(|p| (*p).clone());
    (student, career_path)
  });

  Ok(
    with_paths
      .map(|(student, career_path)| {
        let job = jobs.get(&student.job_id).map(|j| (*j).clone());
        MergedRow { student, career_path, job }
      })
      .collect(),
  )
}

// ─── Aggregated record ───────────────────────────────────────────────────────

/// Column layout of the aggregated table, in storage order.
pub const AGGREGATED_COLUMNS: [(&str, ColumnType); 20] = [
  ("uuid", ColumnType::Integer),
  ("name", ColumnType::Text),
  ("dob", ColumnType::Text),
  ("sex", ColumnType::Text),
  ("job_id", ColumnType::Integer),
  ("num_course_taken", ColumnType::Real),
  ("current_career_path_id", ColumnType::Integer),
  ("time_spent_hrs", ColumnType::Real),
  ("age", ColumnType::Integer),
  ("age_group", ColumnType::Integer),
  ("email", ColumnType::Text),
  ("street", ColumnType::Text),
  ("city", ColumnType::Text),
  ("state", ColumnType::Text),
  ("zip_code", ColumnType::Text),
  ("career_path_id", ColumnType::Integer),
  ("career_path_name", ColumnType::Text),
  ("hours_to_complete", ColumnType::Integer),
  ("job_category", ColumnType::Text),
  ("avg_salary", ColumnType::Integer),
];

/// A fully-joined, complete output row.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedRecord {
  pub uuid:                   i64,
  pub name:                   String,
  pub dob:                    NaiveDate,
  pub sex:                    String,
  pub job_id:                 i64,
  pub num_course_taken:       f64,
  pub current_career_path_id: i64,
  pub time_spent_hrs:         f64,
  pub age:                    u32,
  pub age_group:              u32,
  pub email:                  String,
  pub street:                 String,
  pub city:                   String,
  pub state:                  String,
  pub zip_code:               String,
  pub career_path_id:         i64,
  pub career_path_name:       String,
  pub hours_to_complete:      i64,
  pub job_category:           String,
  pub avg_salary:             i64,
}

impl AggregatedRecord {
  /// The schema every batch of aggregated records is written with.
  pub fn schema() -> TableSchema {
    TableSchema {
      version: AGGREGATED_SCHEMA_VERSION,
      columns: AGGREGATED_COLUMNS
        .iter()
        .map(|(name, ty)| ColumnDef::new(*name, *ty))
        .collect(),
    }
  }

  /// The record's values in [`AGGREGATED_COLUMNS`] order.
  pub fn cells(&self) -> Vec<Cell> {
    vec![
      self.uuid.into(),
      self.name.as_str().into(),
      self.dob.format("%Y-%m-%d").to_string().into(),
      self.sex.as_str().into(),
      self.job_id.into(),
      self.num_course_taken.into(),
      self.current_career_path_id.into(),
      self.time_spent_hrs.into(),
      i64::from(self.age).into(),
      i64::from(self.age_group).into(),
      self.email.as_str().into(),
      self.street.as_str().into(),
      self.city.as_str().into(),
      self.state.as_str().into(),
      self.zip_code.as_str().into(),
      self.career_path_id.into(),
      self.career_path_name.as_str().into(),
      self.hours_to_complete.into(),
      self.job_category.as_str().into(),
      self.avg_salary.into(),
    ]
  }
}

impl MergedRow {
  /// Convert into a complete record, or name the first missing column.
  pub fn complete(self) -> Result<AggregatedRecord, &'static str> {
    let s = self.student;
    let name = s.name.ok_or("name")?;
    let sex = s.sex.ok_or("sex")?;
    let path = self.career_path.ok_or("career_path_id")?;
    let job = self.job.ok_or("job_category")?;

    Ok(AggregatedRecord {
      uuid: s.uuid,
      name,
      dob: s.dob,
      sex,
      job_id: s.job_id,
      num_course_taken: s.num_course_taken,
      current_career_path_id: s.current_career_path_id,
      time_spent_hrs: s.time_spent_hrs,
      age: s.age,
      age_group: s.age_group,
      email: s.email,
      street: s.street,
      city: s.city,
      state: s.state,
      zip_code: s.zip_code,
      career_path_id: path.career_path_id,
      career_path_name: path.career_path_name,
      hours_to_complete: path.hours_to_complete,
      job_category: job.job_category,
      avg_salary: job.avg_salary,
    })
  }
}

#[cfg(test)]
pub(crate) mod tests {
  use super::*;
  use crate::reference::cleanse_career_paths;

  pub(crate) fn student(uuid: i64, path: i64, job: i64) -> CleansedStudent {
    CleansedStudent {
      uuid,
      name: Some(format!("student {uuid}")),
      dob: NaiveDate::from_ymd_opt(1990, 3, 4).unwrap(),
      sex: Some("N".into()),
      job_id: job,
      num_course_taken: 3.0,
      current_career_path_id: path,
      time_spent_hrs: 10.5,
      age: 34,
      age_group: 30,
      email: "s@example.com".into(),
      street: "1 Main St".into(),
      city: "Town".into(),
      state: "OH".into(),
      zip_code: "44000".into(),
    }
  }

  pub(crate) fn paths() -> Vec<CareerPath> {
    cleanse_career_paths(vec![CareerPath {
      career_path_id:    1,
      career_path_name:  "data scientist".into(),
      hours_to_complete: 20,
    }])
  }

  pub(crate) fn jobs() -> Vec<StudentJob> {
    vec![StudentJob {
      job_id:       7,
      job_category: "analytics".into(),
      avg_salary:   86_000,
    }]
  }

  #[test]
  fn every_student_row_is_preserved() {
    let rows = merge(vec![student(1, 1, 7), student(2, 0, 7), student(3, 1, 99)], &paths(), &jobs())
      .unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[1].career_path.as_ref().unwrap().career_path_name, "not applicable");
    assert!(rows[2].career_path.is_some());
    assert!(rows[2].job.is_none());
  }

  #[test]
  fn complete_row_converts() {
    let row = merge(vec![student(1, 1, 7)], &paths(), &jobs()).unwrap().remove(0);
    let rec = row.complete().unwrap();
    assert_eq!(rec.career_path_id, 1);
    assert_eq!(rec.job_category, "analytics");
    assert_eq!(rec.cells().len(), AGGREGATED_COLUMNS.len());
  }

  #[test]
  fn unmatched_job_names_missing_column() {
    let row = merge(vec![student(1, 1, 99)], &paths(), &jobs()).unwrap().remove(0);
    assert_eq!(row.complete().unwrap_err(), "job_category");
  }

  #[test]
  fn conflicting_reference_keys_are_rejected() {
    let mut p = paths();
    p.push(CareerPath {
      career_path_id:    1,
      career_path_name:  "renamed".into(),
      hours_to_complete: 1,
    });
    let err = merge(vec![student(1, 1, 7)], &p, &jobs()).unwrap_err();
    assert!(matches!(err, Error::DuplicateReferenceKey { table: "career_paths", key: 1 }));
  }

  #[test]
  fn schema_matches_cells() {
    let schema = AggregatedRecord::schema();
    assert_eq!(schema.columns.len(), 20);
    assert_eq!(schema.column("time_spent_hrs").unwrap().ty, ColumnType::Real);
  }
}
