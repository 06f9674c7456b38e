//! Reference tables (career paths and jobs) and their cleansers.

use std::collections::HashSet;
use std::hash::Hash;


/// Key of the synthetic career path assigned to students with none.
pub const NOT_APPLICABLE_PATH_ID: i64 = 0;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CareerPath {
  pub career_path_id:    i64,
  pub career_path_name:  String,
  pub hours_to_complete: i64,
}

impl CareerPath {
  pub fn not_applicable() -> Self {
    Self {
      career_path_id:    NOT_APPLICABLE_PATH_ID,
      career_path_name:  "not applicable".to_owned(),
      hours_to_complete: 0,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StudentJob {
  pub job_id:       i64,
  pub job_category: String,
  pub avg_salary:   i64,
}

/// Remove exact-duplicate rows, keeping the first occurrence in place.
pub fn dedup_rows<T: Clone + Eq + Hash>(rows: Vec<T>) -> Vec<T> {
  let mut seen = HashSet::with_capacity(rows.len());
  rows.into_iter().filter(|r| seen.insert(r.clone())).collect()
}

/// Append the "not applicable" path, then drop exact duplicates.
pub fn cleanse_career_paths(mut rows: Vec<CareerPath>) -> Vec<CareerPath> {
  rows.push(CareerPath::not_applicable());
  dedup_rows(rows)
}

pub fn cleanse_student_jobs(rows: Vec<StudentJob>) -> Vec<StudentJob> { dedup_rows(rows) }
