//! SQLite backends for the subscriber pipeline.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. [`SqliteSource`] reads the raw tables;
//! [`SqliteOutput`] owns the append-only aggregated and quarantine tables.

mod encode;
mod output;
mod schema;
mod source;

pub mod error;

pub use error::{Error, Result};
pub use output::SqliteOutput;
pub use schema::{AGGREGATED_TABLE, QUARANTINE_TABLE};
pub use source::SqliteSource;
