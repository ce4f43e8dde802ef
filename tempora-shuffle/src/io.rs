//! Reading and writing distributed event sets as CSV files

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rayon::prelude::*;
use tempora_core::{IndexKey, Schema};
use tempora_readers::csv::{create_csv_writer, header, open_csv, CsvReaderOptions, CsvWriterOptions};
use tempora_readers::{pattern, RawRecord};
use tracing::debug;

use crate::collection::{partition_of, Collection, Runtime};
use crate::error::{Error, Result};
use crate::event_set::BeamEventSet;
use crate::pipeline::{group_rows, to_internal, TextRow};

/// Options for writing a distributed event set
#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// Number of output files
    pub num_shards: usize,

    /// Whether every file starts with the header row
    pub write_header: bool,

    /// Format of the files. Its `write_header` is ignored.
    pub csv: CsvWriterOptions,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            num_shards: 1,
            write_header: true,
            csv: CsvWriterOptions::default(),
        }
    }
}

/// Read the CSV files matched by `pattern` into raw records.
///
/// Files are read in parallel; records keep the order of the files (sorted
/// by path) and of the rows in each file.
pub fn read_csv_raw(
    runtime: &Arc<Runtime>,
    pattern: &str,
    options: &CsvReaderOptions,
) -> Result<Collection<RawRecord>> {
    let paths = pattern::expand(pattern)?;
    debug!(pattern, num_files = paths.len(), "matched csv files");

    runtime.from_vec(paths).try_flat_map(|path| -> Result<Vec<RawRecord>> {
        let records = open_csv(&path, options)?.read_all()?;
        debug!(path = %path.display(), num_records = records.len(), "read csv file");
        Ok(records)
    })
}

/// Read the CSV files matched by `pattern` into a distributed event set.
///
/// Timestamps are read from `options.timestamp_column` and must be numbers.
pub fn read_csv(
    runtime: &Arc<Runtime>,
    pattern: &str,
    schema: &Arc<Schema>,
    options: &CsvReaderOptions,
) -> Result<BeamEventSet> {
    let records = read_csv_raw(runtime, pattern, options)?;
    to_internal(records, schema, &options.timestamp_column)
}

/// Path of one shard.
///
/// A single shard is written at `prefix` itself; otherwise shards are named
/// `{prefix}-{shard:05}-of-{num_shards:05}`.
pub fn shard_path(prefix: &Path, shard: usize, num_shards: usize) -> PathBuf {
    if num_shards == 1 {
        return prefix.to_path_buf();
    }
    let mut name = prefix.as_os_str().to_os_string();
    name.push(format!("-{shard:05}-of-{num_shards:05}"));
    PathBuf::from(name)
}

/// Write a distributed event set of `schema` as CSV files.
///
/// The header is `[timestamp_key, *index names, *feature names]`. All the
/// events of one index key land in the same shard, in timestamp order; keys
/// are sorted within a shard. Returns the written paths, in shard order.
pub fn write_csv(
    units: BeamEventSet,
    prefix: &Path,
    schema: &Schema,
    timestamp_key: &str,
    options: &WriteOptions,
) -> Result<Vec<PathBuf>> {
    let num_shards = options.num_shards;
    if num_shards == 0 {
        return Err(Error::InvalidArgument("Cannot write zero shards".to_string()));
    }

    let runtime = units.runtime().clone();
    let mut shards: Vec<Vec<(IndexKey, Vec<TextRow>)>> =
        (0..num_shards).map(|_| Vec::new()).collect();
    for (index, rows) in group_rows(units, schema)?.collect() {
        if let Some(shard) = shards.get_mut(partition_of(&index, num_shards)) {
            shard.push((index, rows));
        }
    }

    let header = header(schema, timestamp_key);
    let csv_options = CsvWriterOptions {
        write_header: options.write_header,
        ..options.csv.clone()
    };

    runtime.install(|| {
        shards
            .into_par_iter()
            .enumerate()
            .map(|(shard, mut groups)| -> Result<PathBuf> {
                groups.sort_by(|a, b| a.0.cmp(&b.0));
                let path = shard_path(prefix, shard, num_shards);
                let mut writer = create_csv_writer(&path, &header, &csv_options)?;
                for row in groups.iter().flat_map(|(_, rows)| rows) {
                    writer.write_row(row)?;
                }
                writer.flush()?;
                debug!(path = %path.display(), num_keys = groups.len(), "wrote csv shard");
                Ok(path)
            })
            .collect::<Result<Vec<_>>>()
    })
}
