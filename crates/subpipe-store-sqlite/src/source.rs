//! [`SqliteSource`] — read-only access to the raw source tables.

use std::path::Path;

use rusqlite::{OpenFlags, types::Value};
use subpipe_core::{
  reference::{CareerPath, StudentJob},
  store::SourceTables,
  student::RawStudent,
};

use crate::{
  Result,
  encode::{decode_career_path, decode_student, decode_student_job, row_values},
  schema::{CAREER_PATHS_TABLE, STUDENTS_TABLE, STUDENT_JOBS_TABLE, select_sql},
};

const CAREER_PATH_COLUMNS: [&str; 3] = ["career_path_id", "career_path_name", "hours_to_complete"];
const STUDENT_JOB_COLUMNS: [&str; 3] = ["job_id", "job_category", "avg_salary"];

/// The upstream database, opened read-only.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteSource {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteSource {
  /// Open the source database at `path`. The file must already exist.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_with_flags(
      path,
      OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .await?;
    Ok(Self { conn })
  }

  /// Open an empty in-memory source with the upstream tables created — useful
  /// for testing.
  #[cfg(test)]
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    conn
      .call(|conn| {
        conn.execute_batch(crate::schema::SOURCE_SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(Self { conn })
  }

  /// Fetch every row of `table` as raw values.
  async fn select_all(&self, table: &'static str, columns: &[&'static str]) -> Result<Vec<Vec<Value>>> {
    let sql = select_sql(table, columns.iter().copied());
    let width = columns.len();

    let rows = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map([], |row| row_values(row, width))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    tracing::debug!(table, rows = rows.len(), "read source table");
    Ok(rows)
  }
}

impl SourceTables for SqliteSource {
  type Error = crate::Error;

  async fn read_students(&self) -> Result<Vec<RawStudent>> {
    let rows = self.select_all(STUDENTS_TABLE, &RawStudent::COLUMNS).await?;
    rows.into_iter().map(decode_student).collect()
  }

  async fn read_career_paths(&self) -> Result<Vec<CareerPath>> {
    let rows = self.select_all(CAREER_PATHS_TABLE, &CAREER_PATH_COLUMNS).await?;
    rows.into_iter().map(decode_career_path).collect()
  }

  async fn read_student_jobs(&self) -> Result<Vec<StudentJob>> {
    let rows = self.select_all(STUDENT_JOBS_TABLE, &STUDENT_JOB_COLUMNS).await?;
    rows.into_iter().map(decode_student_job).collect()
  }
}
