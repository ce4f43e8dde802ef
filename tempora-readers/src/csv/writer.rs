//! CSV writer implementation

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use csv::WriterBuilder;
use tempora_core::{EventSet, IndexKey, Schema, ScalarValue};
use tracing::debug;

use crate::error::{Error, Result};

/// Options for CSV writer
#[derive(Debug, Clone)]
pub struct CsvWriterOptions {
    /// Whether to write a header row
    pub write_header: bool,

    /// Delimiter character
    pub delimiter: u8,

    /// Quote character
    pub quote: u8,

    /// Whether to quote all fields
    pub quote_all: bool,

    /// Buffer size for writing
    pub buffer_size: usize,
}

impl Default for CsvWriterOptions {
    fn default() -> Self {
        Self {
            write_header: true,
            delimiter: b',',
            quote: b'"',
            quote_all: false,
            buffer_size: 64 * 1024, // 64KB
        }
    }
}

/// CSV writer
pub struct CsvWriter<W: Write> {
    /// Inner CSV writer
    writer: csv::Writer<W>,

    /// Number of columns of every row
    num_columns: usize,
}

impl<W: Write> CsvWriter<W> {
    /// Create a new CSV writer, writing `header` if the options ask for it
    pub fn new(writer: W, header: &[String], options: &CsvWriterOptions) -> Result<Self> {
        let mut csv_writer = WriterBuilder::new()
            .delimiter(options.delimiter)
            .quote(options.quote)
            .quote_style(if options.quote_all {
                csv::QuoteStyle::Always
            } else {
                csv::QuoteStyle::Necessary
            })
            .from_writer(writer);

        if options.write_header {
            csv_writer.write_record(header)?;
        }

        Ok(Self {
            writer: csv_writer,
            num_columns: header.len(),
        })
    }

    /// Write one row
    pub fn write_row(&mut self, row: &[String]) -> Result<()> {
        if row.len() != self.num_columns {
            return Err(Error::InvalidArgument(format!(
                "Row has {} values, expected {}",
                row.len(),
                self.num_columns
            )));
        }
        self.writer.write_record(row)?;
        Ok(())
    }

    /// Flush buffered rows
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Create a buffered CSV writer over a new file
pub fn create_csv_writer(
    path: &Path,
    header: &[String],
    options: &CsvWriterOptions,
) -> Result<CsvWriter<BufWriter<File>>> {
    let file = File::create(path)?;
    let writer = BufWriter::with_capacity(options.buffer_size, file);
    CsvWriter::new(writer, header, options)
}

/// Header of an event set file: the timestamp, then indexes, then features
pub fn header(schema: &Schema, timestamp_column: &str) -> Vec<String> {
    std::iter::once(timestamp_column.to_string())
        .chain(schema.index_names())
        .chain(schema.feature_names())
        .collect()
}

/// Format one event as a CSV row
pub fn format_row(timestamp: f64, index: &IndexKey, features: &[ScalarValue]) -> Vec<String> {
    std::iter::once(timestamp.to_string())
        .chain(index.iter().map(ToString::to_string))
        .chain(features.iter().map(ToString::to_string))
        .collect()
}

/// Write an event set to a single CSV file.
///
/// Rows are written index key by index key, in timestamp order within a key.
pub fn write_event_set(
    evset: &EventSet,
    path: &Path,
    timestamp_column: &str,
    options: &CsvWriterOptions,
) -> Result<()> {
    let mut writer = create_csv_writer(path, &header(evset.schema(), timestamp_column), options)?;

    for (key, data) in evset.iter() {
        for (row, timestamp) in data.timestamps.iter().enumerate() {
            let features = data
                .features
                .iter()
                .map(|feature| {
                    feature.value(row).ok_or_else(|| {
                        Error::Format(format!(
                            "Feature shorter than timestamps at index key {key}"
                        ))
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            writer.write_row(&format_row(*timestamp, key, &features))?;
        }
    }
    writer.flush()?;

    debug!(path = %path.display(), num_events = evset.num_events(), "wrote csv file");
    Ok(())
}

#[cfg(test)]
mod tests {
    use tempora_core::{event_set, FeatureArray};

    use super::*;

    #[test]
    fn test_csv_writer_quoting() {
        let header = vec!["a".to_string(), "b".to_string()];
        let mut buffer = Vec::new();
        {
            let mut writer =
                CsvWriter::new(&mut buffer, &header, &CsvWriterOptions::default()).unwrap();
            writer.write_row(&["x,y".to_string(), "1".to_string()]).unwrap();
            assert!(writer.write_row(&["only".to_string()]).is_err());
            writer.flush().unwrap();
        }
        assert_eq!(String::from_utf8(buffer).unwrap(), "a,b\n\"x,y\",1\n");
    }

    #[test]
    fn test_csv_writer_without_header() {
        let options = CsvWriterOptions {
            write_header: false,
            delimiter: b';',
            ..Default::default()
        };
        let mut buffer = Vec::new();
        {
            let header = ["a".to_string(), "b".to_string()];
            let mut writer = CsvWriter::new(&mut buffer, &header, &options).unwrap();
            writer.write_row(&["1".to_string(), "2".to_string()]).unwrap();
            writer.flush().unwrap();
        }
        assert_eq!(String::from_utf8(buffer).unwrap(), "1;2\n");
    }

    #[test]
    fn test_write_event_set() {
        let evset = event_set(
            vec![2.0, 1.0, 1.5],
            vec![
                ("a", FeatureArray::from(vec!["y", "x", "x"])),
                ("f", FeatureArray::from(vec![true, false, true])),
            ],
            &["a"],
        )
        .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        write_event_set(&evset, &path, "timestamp", &CsvWriterOptions::default()).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "timestamp,a,f\n1,x,false\n1.5,x,true\n2,y,true\n");
    }
}
