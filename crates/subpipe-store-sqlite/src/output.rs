//! [`SqliteOutput`] — the append-only aggregated and quarantine tables.

use std::{collections::HashSet, path::Path};

use rusqlite::{OptionalExtension as _, params_from_iter};
use subpipe_core::{
  merge::{AGGREGATED_COLUMNS, AggregatedRecord},
  schema::{ColumnDef, ColumnType, TableSchema},
  store::OutputStore,
  student::RawStudent,
};

use crate::{
  Result,
  encode::{decode_aggregated, encode_cell, row_values},
  schema::{
    AGGREGATED_TABLE, QUARANTINE_DDL, QUARANTINE_TABLE, aggregated_ddl, insert_sql, select_sql,
  },
};

/// The output database. Rows are only ever inserted; no `UPDATE` or `DELETE`
/// is issued against either table.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteOutput {
  pub(crate) conn: tokio_rusqlite::Connection,
}

fn table_exists(conn: &rusqlite::Connection, table: &str) -> rusqlite::Result<bool> {
  Ok(
    conn
      .query_row(
        "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
        rusqlite::params![table],
        |_| Ok(true),
      )
      .optional()?
      .unwrap_or(false),
  )
}

impl SqliteOutput {
  /// Open (or create) the output database at `path`. Tables are created
  /// lazily on first append.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Ok(Self { conn })
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Ok(Self { conn })
  }

  /// `uuid`s in `table`, or an empty set if the table is absent.
  async fn keys(&self, table: &'static str) -> Result<HashSet<i64>> {
    let keys = self
      .conn
      .call(move |conn| {
        if !table_exists(conn, table)? {
          return Ok(HashSet::new());
        }
        let mut stmt = conn.prepare(&format!("SELECT uuid FROM {table}"))?;
        let keys = stmt
          .query_map([], |row| row.get::<_, i64>(0))?
          .collect::<rusqlite::Result<HashSet<_>>>()?;
        Ok(keys)
      })
      .await?;
    Ok(keys)
  }
}

impl OutputStore for SqliteOutput {
  type Error = crate::Error;

  // ── Keys ──────────────────────────────────────────────────────────────────

  async fn aggregated_keys(&self) -> Result<HashSet<i64>> { self.keys(AGGREGATED_TABLE).await }

  async fn quarantine_keys(&self) -> Result<HashSet<i64>> { self.keys(QUARANTINE_TABLE).await }

  async fn aggregated_schema(&self) -> Result<Option<TableSchema>> {
    let schema = self
      .conn
      .call(|conn| {
        if !table_exists(conn, AGGREGATED_TABLE)? {
          return Ok(None);
        }

        let version: u32 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;

        let mut stmt = conn.prepare(&format!("PRAGMA table_info({AGGREGATED_TABLE})"))?;
        let columns = stmt
          .query_map([], |row| {
            let name: String = row.get(1)?;
            let decl: String = row.get(2)?;
            Ok(ColumnDef::new(name, ColumnType::from_declared(&decl)))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(Some(TableSchema { version, columns }))
      })
      .await?;
    Ok(schema)
  }

  // ── Appends ───────────────────────────────────────────────────────────────

  async fn append_quarantine<'a>(&'a self, rows: &'a [RawStudent]) -> Result<usize> {
    let sql = insert_sql(QUARANTINE_TABLE, RawStudent::COLUMNS);
    let rows: Vec<Vec<_>> = rows
      .iter()
      .map(|r| r.cells().into_iter().map(encode_cell).collect())
      .collect();

    let written = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute_batch(QUARANTINE_DDL)?;
        {
          let mut stmt = tx.prepare(&sql)?;
          for row in &rows {
            stmt.execute(params_from_iter(row.iter()))?;
          }
        }
        tx.commit()?;
        Ok(rows.len())
      })
      .await?;

    tracing::debug!(table = QUARANTINE_TABLE, rows = written, "appended");
    Ok(written)
  }

  async fn append_aggregated<'a>(&'a self, rows: &'a [AggregatedRecord]) -> Result<usize> {
    let ddl = aggregated_ddl(&AggregatedRecord::schema());
    let sql = insert_sql(AGGREGATED_TABLE, AGGREGATED_COLUMNS.iter().map(|(name, _)| *name));
    let rows: Vec<Vec<_>> = rows
      .iter()
      .map(|r| r.cells().into_iter().map(encode_cell).collect())
      .collect();

    let written = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if !table_exists(&tx, AGGREGATED_TABLE)? {
          tx.execute_batch(&ddl)?;
        }
        {
          let mut stmt = tx.prepare(&sql)?;
          for row in &rows {
            stmt.execute(params_from_iter(row.iter()))?;
          }
        }
        tx.commit()?;
        Ok(rows.len())
      })
      .await?;

    tracing::debug!(table = AGGREGATED_TABLE, rows = written, "appended");
    Ok(written)
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn read_aggregated(&self) -> Result<Vec<AggregatedRecord>> {
    let sql = select_sql(AGGREGATED_TABLE, AGGREGATED_COLUMNS.iter().map(|(name, _)| *name));
    let width = AGGREGATED_COLUMNS.len();

    let rows = self
      .conn
      .call(move |conn| {
        if !table_exists(conn, AGGREGATED_TABLE)? {
          return Ok(Vec::new());
        }
        let mut stmt = conn.prepare(&format!("{sql} ORDER BY rowid"))?;
        let rows = stmt
          .query_map([], |row| row_values(row, width))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    rows.into_iter().map(decode_aggregated).collect()
  }
}
