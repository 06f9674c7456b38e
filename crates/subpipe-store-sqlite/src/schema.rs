//! Table names and DDL for the source and output databases.
//!
//! The aggregated table's DDL is generated from the
//! [`TableSchema`](subpipe_core::schema::TableSchema) descriptor; its version is
//! recorded in `PRAGMA user_version`.

use subpipe_core::schema::TableSchema;

pub const STUDENTS_TABLE: &str = "cademycode_students";
pub const CAREER_PATHS_TABLE: &str = "cademycode_courses";
pub const STUDENT_JOBS_TABLE: &str = "cademycode_student_jobs";

pub const AGGREGATED_TABLE: &str = "cademycode_aggregated";
pub const QUARANTINE_TABLE: &str = "incomplete_data";

/// Source tables, as the upstream system lays them out. Only used to create
/// fixtures; the pipeline itself never writes to the source.
#[cfg(test)]
pub const SOURCE_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS cademycode_students (
    uuid                   INTEGER,
    name                   TEXT,
    dob                    TEXT,
    sex                    TEXT,
    contact_info           TEXT,
    job_id                 TEXT,
    num_course_taken       TEXT,
    current_career_path_id TEXT,
    time_spent_hrs         TEXT
);

CREATE TABLE IF NOT EXISTS cademycode_courses (
    career_path_id    INTEGER,
    career_path_name  TEXT,
    hours_to_complete INTEGER
);

CREATE TABLE IF NOT EXISTS cademycode_student_jobs (
    job_id       INTEGER,
    job_category TEXT,
    avg_salary   INTEGER
);
";

/// Quarantine rows keep the raw cells untouched, so the columns carry no
/// declared type.
pub const QUARANTINE_DDL: &str = "
CREATE TABLE IF NOT EXISTS incomplete_data (
    uuid                   INTEGER,
    name,
    dob,
    sex,
    contact_info,
    job_id,
    num_course_taken,
    current_career_path_id,
    time_spent_hrs
);
";

/// `CREATE TABLE` for the aggregated table, from its descriptor.
pub fn aggregated_ddl(schema: &TableSchema) -> String {
  let columns = schema
    .columns
    .iter()
    .map(|c| format!("    {} {}", c.name, c.ty))
    .collect::<Vec<_>>()
    .join(",\n");
  format!(
    "CREATE TABLE IF NOT EXISTS {AGGREGATED_TABLE} (\n{columns}\n);\n\
     PRAGMA user_version = {};",
    schema.version
  )
}

/// `INSERT` with one positional parameter per column.
pub fn insert_sql<'a>(table: &str, columns: impl IntoIterator<Item = &'a str>) -> String {
  let columns: Vec<&str> = columns.into_iter().collect();
  let placeholders = (1..=columns.len())
    .map(|i| format!("?{i}"))
    .collect::<Vec<_>>()
    .join(", ");
  format!("INSERT INTO {table} ({}) VALUES ({placeholders})", columns.join(", "))
}

/// `SELECT` of the named columns, in order.
pub fn select_sql<'a>(table: &str, columns: impl IntoIterator<Item = &'a str>) -> String {
  let columns: Vec<&str> = columns.into_iter().collect();
  format!("SELECT {} FROM {table}", columns.join(", "))
}
