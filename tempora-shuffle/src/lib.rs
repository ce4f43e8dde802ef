//! Partitioned, key-grouped execution of temporal event-set graphs
//!
//! This crate runs event-set graphs on a local data-parallel runtime. A
//! distributed event set is a [`Collection`] of units, each holding the
//! events of one index key for one feature. Records are ingested with a
//! structure, group, merge pipeline, operators run unit by unit or regroup by
//! index key, and results are written back as sharded CSV files.

#![warn(missing_docs)]

pub mod collection;
pub mod config;
pub mod error;
pub mod evaluation;
pub mod event_set;
pub mod io;
pub mod operators;
pub mod pipeline;

pub use collection::{Collection, Runtime};
pub use config::ShuffleConfig;
pub use error::{Error, Result};
pub use evaluation::evaluate;
pub use event_set::{from_event_set, to_event_set, BeamEventSet, BeamUnit, UnitKey, TIMESTAMPS_ONLY};
pub use io::{read_csv, read_csv_raw, write_csv, WriteOptions};
pub use operators::{default_registry, DistributedImplementation, DistributedRegistry};
pub use pipeline::{from_internal, to_internal};
