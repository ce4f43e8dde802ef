//! CSV reader implementation

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use csv::{ReaderBuilder, StringRecord};
use tempora_core::{EventSet, EventSetBuilder, IndexKey, IndexValue, ScalarValue, Schema};
use tracing::debug;

use crate::error::{Error, Result};
use crate::pattern;

/// One raw CSV row: column name to text value
pub type RawRecord = BTreeMap<String, String>;

/// Options for CSV reader
#[derive(Debug, Clone)]
pub struct CsvReaderOptions {
    /// Delimiter character
    pub delimiter: u8,

    /// Quote character
    pub quote: u8,

    /// Comment character
    pub comment: Option<u8>,

    /// Whether to trim whitespace around fields
    pub trim: bool,

    /// Name of the timestamp column
    pub timestamp_column: String,
}

impl Default for CsvReaderOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            quote: b'"',
            comment: None,
            trim: false,
            timestamp_column: "timestamp".to_string(),
        }
    }
}

/// CSV reader producing raw records, keyed by the header
pub struct CsvReader<R: Read> {
    /// Inner CSV reader
    reader: csv::Reader<R>,

    /// Header row
    header: Vec<String>,

    /// Name of the source, for error messages
    source: String,
}

impl<R: Read> CsvReader<R> {
    /// Create a reader, consuming the header row
    pub fn new(reader: R, source: &str, options: &CsvReaderOptions) -> Result<Self> {
        let mut builder = ReaderBuilder::new();
        builder
            .delimiter(options.delimiter)
            .quote(options.quote)
            .comment(options.comment)
            .has_headers(true)
            .flexible(true)
            .trim(if options.trim { csv::Trim::All } else { csv::Trim::None });

        let mut reader = builder.from_reader(reader);
        let header = reader.headers()?.iter().map(str::to_string).collect();
        Ok(Self {
            reader,
            header,
            source: source.to_string(),
        })
    }

    /// Get the header row
    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Read the next record, or `None` at the end of the input
    pub fn next_record(&mut self) -> Result<Option<RawRecord>> {
        let mut record = StringRecord::new();
        if !self.reader.read_record(&mut record)? {
            return Ok(None);
        }
        if record.len() != self.header.len() {
            let line = record.position().map_or(0, csv::Position::line);
            return Err(Error::Format(format!(
                "{}:{line}: expected {} columns, found {}",
                self.source,
                self.header.len(),
                record.len()
            )));
        }
        Ok(Some(
            self.header
                .iter()
                .cloned()
                .zip(record.iter().map(str::to_string))
                .collect(),
        ))
    }

    /// Read every remaining record
    pub fn read_all(&mut self) -> Result<Vec<RawRecord>> {
        let mut records = Vec::new();
        while let Some(record) = self.next_record()? {
            records.push(record);
        }
        Ok(records)
    }
}

/// Open a CSV file
pub fn open_csv(path: &Path, options: &CsvReaderOptions) -> Result<CsvReader<File>> {
    let file = File::open(path)?;
    CsvReader::new(file, &path.display().to_string(), options)
}

/// Read the raw records of every file matched by `pattern`.
///
/// Files are read in path order and their records concatenated.
pub fn read_raw(pattern: &str, options: &CsvReaderOptions) -> Result<Vec<RawRecord>> {
    let mut records = Vec::new();
    for path in pattern::expand(pattern)? {
        let mut reader = open_csv(&path, options)?;
        let before = records.len();
        records.extend(reader.read_all()?);
        debug!(path = %path.display(), num_records = records.len() - before, "read csv file");
    }
    Ok(records)
}

/// Look up a column of a raw record
pub fn column<'a>(record: &'a RawRecord, name: &str) -> Result<&'a str> {
    record
        .get(name)
        .map(String::as_str)
        .ok_or_else(|| Error::Format(format!("Missing column \"{name}\" in record")))
}

/// Cast the timestamp, index and feature values of a raw record
pub fn parse_record(
    record: &RawRecord,
    schema: &Schema,
    timestamp_column: &str,
) -> Result<(f64, IndexKey, Vec<ScalarValue>)> {
    let raw_timestamp = column(record, timestamp_column)?;
    let timestamp: f64 = raw_timestamp.trim().parse().map_err(|_| {
        Error::Format(format!(
            "Timestamp \"{raw_timestamp}\" in column \"{timestamp_column}\" is not a number"
        ))
    })?;

    let index = schema
        .indexes()
        .iter()
        .map(|field| -> Result<IndexValue> {
            Ok(IndexValue::cast(column(record, &field.name)?, field.dtype)?)
        })
        .collect::<Result<IndexKey>>()?;
    let features = schema
        .features()
        .iter()
        .map(|field| -> Result<ScalarValue> {
            Ok(ScalarValue::cast(column(record, &field.name)?, field.dtype)?)
        })
        .collect::<Result<Vec<_>>>()?;
    Ok((timestamp, index, features))
}

/// Read the CSV files matched by `pattern` into an event set of `schema`.
///
/// Columns not named by the schema or the timestamp column are ignored.
pub fn read_event_set(
    pattern: &str,
    schema: Arc<Schema>,
    options: &CsvReaderOptions,
) -> Result<EventSet> {
    let mut builder = EventSetBuilder::new(schema.clone());
    for record in read_raw(pattern, options)? {
        let (timestamp, index, features) =
            parse_record(&record, &schema, &options.timestamp_column)?;
        builder.push(index, timestamp, features)?;
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use tempora_core::{DType, FeatureArray};

    use super::*;

    #[test]
    fn test_csv_reader_records() {
        let data = "timestamp,a,b\n1,x,1.5\n2,y,2.5\n";
        let options = CsvReaderOptions::default();
        let mut reader = CsvReader::new(Cursor::new(data), "inline", &options).unwrap();

        assert_eq!(reader.header(), &["timestamp".to_string(), "a".to_string(), "b".to_string()]);
        let records = reader.read_all().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1]["a"], "y");
        assert_eq!(records[1]["b"], "2.5");
    }

    #[test]
    fn test_csv_reader_short_row() {
        let data = "timestamp,a,b\n1,x\n";
        let options = CsvReaderOptions::default();
        let mut reader = CsvReader::new(Cursor::new(data), "inline", &options).unwrap();
        let err = reader.next_record().unwrap_err();
        assert!(matches!(err, Error::Format(_)));
        assert!(err.to_string().contains("inline"));
    }

    #[test]
    fn test_parse_record_casts_strictly() {
        let schema = Schema::from_pairs(&[("a", DType::String)], &[("b", DType::Int64)]).unwrap();
        let mut record: RawRecord = [("t", "3"), ("a", "x"), ("b", "7")]
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();

        let (timestamp, index, features) = parse_record(&record, &schema, "t").unwrap();
        assert_eq!(timestamp, 3.0);
        assert_eq!(index, IndexKey::new(vec!["x".into()]));
        assert_eq!(features, vec![ScalarValue::Int64(7)]);

        record.insert("b".to_string(), "seven".to_string());
        let err = parse_record(&record, &schema, "t").unwrap_err();
        assert!(matches!(err, Error::Core(tempora_core::Error::Cast { .. })));

        record.remove("a");
        assert!(matches!(parse_record(&record, &schema, "t").unwrap_err(), Error::Format(_)));
    }

    #[test]
    fn test_read_event_set() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("input.csv");
        std::fs::write(&path, "timestamp,a,b,ignored\n2,x,2.5,z\n1,x,1.5,z\n1,y,0.5,z\n").unwrap();

        let schema = Schema::from_pairs(&[("a", DType::String)], &[("b", DType::Float64)]).unwrap();
        let schema = Arc::new(schema);
        let options = CsvReaderOptions::default();
        let evset = read_event_set(path.to_str().unwrap(), schema, &options).unwrap();

        assert_eq!(evset.num_index_keys(), 2);
        let x = evset.get(&IndexKey::new(vec!["x".into()])).unwrap();
        assert_eq!(&x.timestamps[..], &[1.0, 2.0]);
        assert_eq!(x.features[0], FeatureArray::from(vec![1.5, 2.5]));
    }
}
