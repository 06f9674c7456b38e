//! Core types and pipeline logic for the subscriber pipeline.
//!
//! This crate is deliberately free of database dependencies. It cleanses the
//! raw student, career-path and job tables, detects which students are new
//! relative to the persisted output, validates the merged batch, and hands
//! the results to an [`store::OutputStore`] backend.

pub mod cell;
pub mod delta;
pub mod error;
pub mod merge;
pub mod pipeline;
pub mod reference;
pub mod schema;
pub mod store;
pub mod student;
pub mod validate;

pub use error::{Error, Result};
