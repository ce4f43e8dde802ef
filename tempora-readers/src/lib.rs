//! Tabular import and export adapters for temporal event sets
//!
//! This crate reads CSV files, given as a path or a file-name wildcard
//! pattern, into raw records or in-memory event sets, and writes event sets
//! back to CSV.

#![warn(missing_docs)]

mod error;
pub mod pattern;

#[cfg(feature = "csv")]
pub mod csv;

pub use error::{Error, Result};

#[cfg(feature = "csv")]
pub use crate::csv::{
    read_event_set, read_raw, write_event_set, CsvReaderOptions, CsvWriterOptions, RawRecord,
};
