//! CSV import and export of event sets
//!
//! Reading goes through raw records (one map of column name to text per row)
//! so the same records can feed both the in-memory builder and the
//! distributed ingestion. Writing emits one row per event, laid out as the
//! timestamp, then the index values, then the feature values.

mod reader;
mod writer;

pub use reader::{
    column, open_csv, parse_record, read_event_set, read_raw, CsvReader, CsvReaderOptions,
    RawRecord,
};
pub use writer::{
    create_csv_writer, format_row, header, write_event_set, CsvWriter, CsvWriterOptions,
};
