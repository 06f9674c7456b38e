//! Conversions between SQLite values and the core domain types.
//!
//! Rows are fetched as plain `Vec<Value>` inside the connection thread and
//! decoded here, outside it, so decode failures surface as [`Error::Decode`]
//! rather than as opaque database errors.

use chrono::NaiveDate;
use rusqlite::types::Value;
use subpipe_core::{
  cell::Cell,
  merge::{AGGREGATED_COLUMNS, AggregatedRecord},
  reference::{CareerPath, StudentJob},
  student::RawStudent,
};

use crate::{Error, Result};

// ─── Cell ────────────────────────────────────────────────────────────────────

pub fn encode_cell(cell: Cell) -> Value {
  match cell {
    Cell::Null => Value::Null,
    Cell::Integer(i) => Value::Integer(i),
    Cell::Real(r) => Value::Real(r),
    Cell::Text(s) => Value::Text(s),
  }
}

pub fn decode_cell(value: Value) -> Cell {
  match value {
    Value::Null => Cell::Null,
    Value::Integer(i) => Cell::Integer(i),
    Value::Real(r) => Cell::Real(r),
    Value::Text(s) => Cell::Text(s),
    Value::Blob(b) => Cell::Text(String::from_utf8_lossy(&b).into_owned()),
  }
}

// ─── Scalars ─────────────────────────────────────────────────────────────────

fn decode_i64(value: Value, column: &'static str) -> Result<i64> {
  let cell = decode_cell(value);
  cell
    .as_id()
    .ok_or_else(|| Error::decode(column, format!("expected an integer, got {cell:?}")))
}

fn decode_f64(value: Value, column: &'static str) -> Result<f64> {
  let cell = decode_cell(value);
  cell
    .as_f64()
    .ok_or_else(|| Error::decode(column, format!("expected a number, got {cell:?}")))
}

fn decode_text(value: Value, column: &'static str) -> Result<String> {
  match decode_cell(value) {
    Cell::Null => Err(Error::decode(column, "unexpected NULL")),
    cell => Ok(cell.to_string()),
  }
}

fn decode_date(value: Value, column: &'static str) -> Result<NaiveDate> {
  let text = decode_text(value, column)?;
  NaiveDate::parse_from_str(&text, "%Y-%m-%d").map_err(|e| Error::decode(column, e.to_string()))
}

fn decode_u32(value: Value, column: &'static str) -> Result<u32> {
  let v = decode_i64(value, column)?;
  u32::try_from(v).map_err(|e| Error::decode(column, e.to_string()))
}

/// Pops values off a fetched row in column order.
struct RowCursor(std::vec::IntoIter<Value>);

impl RowCursor {
  fn new(row: Vec<Value>) -> Self { Self(row.into_iter()) }

  fn take(&mut self) -> Value { self.0.next().unwrap_or(Value::Null) }
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub fn decode_student(row: Vec<Value>) -> Result<RawStudent> {
  let mut r = RowCursor::new(row);
  Ok(RawStudent {
    uuid:                   decode_i64(r.take(), "uuid")?,
    name:                   decode_cell(r.take()),
    dob:                    decode_cell(r.take()),
    sex:                    decode_cell(r.take()),
    contact_info:           decode_cell(r.take()),
    job_id:                 decode_cell(r.take()),
    num_course_taken:       decode_cell(r.take()),
    current_career_path_id: decode_cell(r.take()),
    time_spent_hrs:         decode_cell(r.take()),
  })
}

pub fn decode_career_path(row: Vec<Value>) -> Result<CareerPath> {
  let mut r = RowCursor::new(row);
  Ok(CareerPath {
    career_path_id:    decode_i64(r.take(), "career_path_id")?,
    career_path_name:  decode_text(r.take(), "career_path_name")?,
    hours_to_complete: decode_i64(r.take(), "hours_to_complete")?,
  })
}

pub fn decode_student_job(row: Vec<Value>) -> Result<StudentJob> {
  let mut r = RowCursor::new(row);
  Ok(StudentJob {
    job_id:       decode_i64(r.take(), "job_id")?,
    job_category: decode_text(r.take(), "job_category")?,
    avg_salary:   decode_i64(r.take(), "avg_salary")?,
  })
}

/// Decode a row selected in [`AGGREGATED_COLUMNS`] order.
pub fn decode_aggregated(row: Vec<Value>) -> Result<AggregatedRecord> {
  debug_assert_eq!(row.len(), AGGREGATED_COLUMNS.len());
  let mut r = RowCursor::new(row);
  Ok(AggregatedRecord {
    uuid:                   decode_i64(r.take(), "uuid")?,
    name:                   decode_text(r.take(), "name")?,
    dob:                    decode_date(r.take(), "dob")?,
    sex:                    decode_text(r.take(), "sex")?,
    job_id:                 decode_i64(r.take(), "job_id")?,
    num_course_taken:       decode_f64(r.take(), "num_course_taken")?,
    current_career_path_id: decode_i64(r.take(), "current_career_path_id")?,
    time_spent_hrs:         decode_f64(r.take(), "time_spent_hrs")?,
    age:                    decode_u32(r.take(), "age")?,
    age_group:              decode_u32(r.take(), "age_group")?,
    email:                  decode_text(r.take(), "email")?,
    street:                 decode_text(r.take(), "street")?,
    city:                   decode_text(r.take(), "city")?,
    state:                  decode_text(r.take(), "state")?,
    zip_code:               decode_text(r.take(), "zip_code")?,
    career_path_id:         decode_i64(r.take(), "career_path_id")?,
    career_path_name:       decode_text(r.take(), "career_path_name")?,
    hours_to_complete:      decode_i64(r.take(), "hours_to_complete")?,
    job_category:           decode_text(r.take(), "job_category")?,
    avg_salary:             decode_i64(r.take(), "avg_salary")?,
  })
}

/// Read every column of the current row as a raw [`Value`].
pub fn row_values(row: &rusqlite::Row<'_>, width: usize) -> rusqlite::Result<Vec<Value>> {
  (0..width).map(|i| row.get::<_, Value>(i)).collect()
}
