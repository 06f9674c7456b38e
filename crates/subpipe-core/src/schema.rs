//! Versioned schema descriptors for persisted tables.
//!
//! A batch's schema is known statically (see
//! [`AggregatedRecord::schema`](crate::merge::AggregatedRecord::schema)); the
//! persisted side is reconstructed by the backend from the table's declared
//! column types. Columns are compared by name, never by position.

use strum::Display;

/// Bumped whenever the aggregated column set or a column type changes.
pub const AGGREGATED_SCHEMA_VERSION: u32 = 1;

/// Storage type of a column, following SQLite's type affinity rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum ColumnType {
  Integer,
  Real,
  Text,
  Numeric,
  Blob,
}

impl ColumnType {
  /// Derive the affinity of a declared column type (SQLite §3.1).
  pub fn from_declared(decl: &str) -> Self {
    let d = decl.to_ascii_uppercase();
    if d.contains("INT") {
      Self::Integer
    } else if d.contains("CHAR") || d.contains("CLOB") || d.contains("TEXT") {
      Self::Text
    } else if d.is_empty() || d.contains("BLOB") {
      Self::Blob
    } else if d.contains("REAL") || d.contains("FLOA") || d.contains("DOUB") {
      Self::Real
    } else {
      Self::Numeric
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
  pub name: String,
  pub ty:   ColumnType,
}

impl ColumnDef {
  pub fn new(name: impl Into<String>, ty: ColumnType) -> Self {
    Self { name: name.into(), ty }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
  pub version: u32,
  pub columns: Vec<ColumnDef>,
}

impl TableSchema {
  pub fn column(&self, name: &str) -> Option<&ColumnDef> {
    self.columns.iter().find(|c| c.name == name)
  }

  pub fn names(&self) -> impl Iterator<Item = &str> {
    self.columns.iter().map(|c| c.name.as_str())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn affinity_rules() {
    assert_eq!(ColumnType::from_declared("INTEGER"), ColumnType::Integer);
    assert_eq!(ColumnType::from_declared("bigint"), ColumnType::Integer);
    assert_eq!(ColumnType::from_declared("VARCHAR(20)"), ColumnType::Text);
    assert_eq!(ColumnType::from_declared("DOUBLE"), ColumnType::Real);
    assert_eq!(ColumnType::from_declared(""), ColumnType::Blob);
    assert_eq!(ColumnType::from_declared("DECIMAL"), ColumnType::Numeric);
  }

  #[test]
  fn type_names_display_uppercase() {
    assert_eq!(ColumnType::Real.to_string(), "REAL");
  }
}
