//! Conversion between raw records and distributed event sets
//!
//! Ingestion is structure, then group by index key, then merge. Every
//! operator that changes the index of its input follows the same three
//! steps. Egress groups the units of each index key back together and emits
//! one row per event.

use std::sync::Arc;

use tempora_core::event_set::Row;
use tempora_core::{DType, IndexData, IndexKey, Schema};
use tempora_readers::csv::{format_row, parse_record};
use tempora_readers::RawRecord;
use tracing::debug;

use crate::collection::Collection;
use crate::error::Result;
use crate::event_set::{
    group_by_index, pack_units, unpack_blocks, unpack_rows, BeamEventSet, BeamUnit, StructuredRow,
};

/// A row of text values: the timestamp, the index values, the feature values
pub type TextRow = Vec<String>;

/// Cast one raw record into a structured row.
///
/// Casting is strict: a value that does not parse as its dtype fails the
/// record.
pub fn structure(
    record: &RawRecord,
    schema: &Schema,
    timestamp_key: &str,
) -> Result<StructuredRow> {
    let (timestamp, index, features) = parse_record(record, schema, timestamp_key)?;
    Ok((index, (timestamp, features)))
}

/// Build the units of one index key from its rows.
///
/// The rows may arrive in any order: they are stably sorted by timestamp
/// first, so the result only depends on the multiset of rows (and, for equal
/// timestamps, on their arrival order).
pub fn merge(index: IndexKey, rows: Vec<Row>, dtypes: &[DType]) -> Result<Vec<BeamUnit>> {
    let data = IndexData::from_rows(dtypes, rows)?;
    Ok(pack_units(index, data))
}

/// Convert raw records into a distributed event set of `schema`
pub fn to_internal(
    records: Collection<RawRecord>,
    schema: &Arc<Schema>,
    timestamp_key: &str,
) -> Result<BeamEventSet> {
    let dtypes: Vec<DType> = schema.features().iter().map(|field| field.dtype).collect();

    let rows = records.try_map(|record| structure(&record, schema, timestamp_key))?;
    debug!(num_rows = rows.len(), "structured records");

    let units = rows.group_by_key().try_flat_map(|(index, rows)| merge(index, rows, &dtypes))?;
    debug!(num_units = units.len(), "merged records into units");
    Ok(units)
}

/// Rows of each index key, in timestamp order
pub(crate) fn group_rows(
    units: BeamEventSet,
    schema: &Schema,
) -> Result<Collection<(IndexKey, Vec<TextRow>)>> {
    let num_features = schema.num_features();
    group_by_index(units).try_map(|(index, blocks)| {
        let data = unpack_blocks(&index, blocks, num_features)?;
        let rows = unpack_rows(&index, &data)?
            .into_iter()
            .map(|(timestamp, features)| format_row(timestamp, &index, &features))
            .collect();
        Ok((index, rows))
    })
}

/// Convert a distributed event set of `schema` into text rows.
///
/// Each row is `[timestamp, *index values, *feature values]`. Rows of one
/// index key are contiguous and in timestamp order.
pub fn from_internal(units: BeamEventSet, schema: &Schema) -> Result<Collection<TextRow>> {
    Ok(group_rows(units, schema)?.flat_map(|(_, rows)| rows))
}
