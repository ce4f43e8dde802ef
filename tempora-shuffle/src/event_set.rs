//! Distributed event sets
//!
//! A distributed event set is a collection of units. A unit carries the
//! events of one index key for one feature: the shared timestamps and that
//! feature's values. Event sets without features are carried by a single
//! [`TIMESTAMPS_ONLY`] unit per key whose values are `None`.

use std::fmt;
use std::sync::Arc;

use tempora_core::event_set::Row;
use tempora_core::{EventSet, FeatureArray, IndexData, IndexKey, Schema, ScalarValue, Timestamps};

use crate::collection::{Collection, Runtime};
use crate::error::{Error, Result};

/// Feature index of the unit of an event set without features
pub const TIMESTAMPS_ONLY: i64 = -1;

/// One event keyed by its index: `(index, (timestamp, feature values))`
pub type StructuredRow = (IndexKey, Row);

/// Key of a unit: the index key and the position of the feature
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitKey {
    /// Index key
    pub index: IndexKey,

    /// Position of the feature in the schema, or [`TIMESTAMPS_ONLY`]
    pub feature_idx: i64,
}

impl UnitKey {
    /// Key of the feature at `position`
    #[allow(clippy::cast_possible_wrap)]
    pub fn feature(index: IndexKey, position: usize) -> Self {
        Self {
            index,
            feature_idx: position as i64,
        }
    }

    /// Key of the featureless unit
    pub fn timestamps_only(index: IndexKey) -> Self {
        Self {
            index,
            feature_idx: TIMESTAMPS_ONLY,
        }
    }

    /// Check if this is the key of a featureless unit
    pub fn is_timestamps_only(&self) -> bool {
        self.feature_idx == TIMESTAMPS_ONLY
    }
}

impl fmt::Display for UnitKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.index, self.feature_idx)
    }
}

/// Timestamps of one index key, and the values of one feature if any
pub type UnitValue = (Timestamps, Option<FeatureArray>);

/// The unit of data of a distributed event set
pub type BeamUnit = (UnitKey, UnitValue);

/// A distributed event set
pub type BeamEventSet = Collection<BeamUnit>;

/// The units of one index key: `(feature_idx, value)` sorted by feature
pub type FeatureBlocks = Vec<(i64, UnitValue)>;

/// Gather the units of each index key, sorted by feature position.
///
/// Grouping does not keep the order of the features; sorting restores the
/// schema order.
pub fn group_by_index(units: BeamEventSet) -> Collection<(IndexKey, FeatureBlocks)> {
    units
        .map(|(key, value)| (key.index, (key.feature_idx, value)))
        .group_by_key()
        .map(|(index, mut blocks)| {
            blocks.sort_by_key(|(feature_idx, _)| *feature_idx);
            (index, blocks)
        })
}

/// Timestamps and feature arrays of one index key.
///
/// All the blocks share the timestamps of the first one. Fails when there is
/// no block or when the number of feature arrays differs from `num_features`.
pub fn unpack_blocks(
    index: &IndexKey,
    blocks: FeatureBlocks,
    num_features: usize,
) -> Result<IndexData> {
    let timestamps = match blocks.first() {
        Some((_, (timestamps, _))) => timestamps.clone(),
        None => {
            return Err(Error::ContractViolation(format!(
                "Index key {index} has no feature block"
            )))
        }
    };
    let features: Vec<FeatureArray> =
        blocks.into_iter().filter_map(|(_, (_, values))| values).collect();
    if features.len() != num_features {
        return Err(Error::ContractViolation(format!(
            "Index key {index} has {} feature blocks, expected {num_features}",
            features.len()
        )));
    }
    if let Some(feature) = features.iter().find(|f| f.len() != timestamps.len()) {
        return Err(Error::ContractViolation(format!(
            "Index key {index} has {} timestamps but a feature block of {} values",
            timestamps.len(),
            feature.len()
        )));
    }
    Ok(IndexData::new(timestamps, features))
}

/// Split the events of one index key into units
pub fn pack_units(index: IndexKey, data: IndexData) -> Vec<BeamUnit> {
    let IndexData { timestamps, features } = data;
    if features.is_empty() {
        return vec![(UnitKey::timestamps_only(index), (timestamps, None))];
    }
    features
        .into_iter()
        .enumerate()
        .map(|(position, values)| {
            (UnitKey::feature(index.clone(), position), (timestamps.clone(), Some(values)))
        })
        .collect()
}

/// The events of one unit group as rows, in timestamp order
pub fn unpack_rows(index: &IndexKey, data: &IndexData) -> Result<Vec<Row>> {
    data.timestamps
        .iter()
        .enumerate()
        .map(|(event, timestamp)| {
            let values = data
                .features
                .iter()
                .map(|feature| {
                    feature.value(event).ok_or_else(|| {
                        Error::ContractViolation(format!(
                            "Feature block of index key {index} is too short"
                        ))
                    })
                })
                .collect::<Result<Vec<ScalarValue>>>()?;
            Ok((*timestamp, values))
        })
        .collect()
}

/// Distribute an in-memory event set.
///
/// Timestamp and feature buffers are shared with `evset`.
pub fn from_event_set(runtime: &Arc<Runtime>, evset: &EventSet) -> BeamEventSet {
    let units = evset
        .iter()
        .flat_map(|(key, data)| pack_units(key.clone(), data.clone()))
        .collect();
    runtime.from_vec(units)
}

/// Gather a distributed event set into memory
pub fn to_event_set(units: BeamEventSet, schema: Arc<Schema>) -> Result<EventSet> {
    let num_features = schema.num_features();
    let mut evset = EventSet::new(schema.clone());
    for (index, blocks) in group_by_index(units).collect() {
        let data = unpack_blocks(&index, blocks, num_features)?;
        evset.set_index_value(index, data);
    }

    // Same convention as the in-memory builder: an unindexed event set always
    // has the empty key
    if schema.indexes().is_empty() && evset.num_index_keys() == 0 {
        let features = schema
            .features()
            .iter()
            .map(|field| FeatureArray::from_values(field.dtype, Vec::new()))
            .collect::<tempora_core::Result<Vec<_>>>()?;
        evset.set_index_value(IndexKey::empty(), IndexData::new(Arc::from(Vec::new()), features));
    }
    Ok(evset)
}

#[cfg(test)]
mod tests {
    use tempora_core::{event_set, DType};

    use super::*;
    use crate::config::ShuffleConfig;

    fn runtime() -> Arc<Runtime> {
        Runtime::new(ShuffleConfig::with_workers(2)).unwrap()
    }

    #[test]
    fn test_round_trip_shares_buffers() {
        let evset = event_set(
            vec![1.0, 2.0, 3.0],
            vec![
                ("k", FeatureArray::from(vec![1_i64, 2, 1])),
                ("a", FeatureArray::from(vec![0.5, 1.5, 2.5])),
                ("b", FeatureArray::from(vec!["x", "y", "z"])),
            ],
            &["k"],
        )
        .unwrap();

        let units = from_event_set(&runtime(), &evset);
        assert_eq!(units.len(), 4);

        let back = to_event_set(units, evset.schema().clone()).unwrap();
        assert_eq!(back, evset);
        let key = IndexKey::new(vec![1_i64.into()]);
        assert!(Arc::ptr_eq(
            &back.index_data(&key).unwrap().timestamps,
            &evset.index_data(&key).unwrap().timestamps
        ));
    }

    #[test]
    fn test_featureless_units() {
        let evset =
            event_set(vec![1.0, 2.0], vec![("k", FeatureArray::from(vec!["a", "b"]))], &["k"])
                .unwrap();
        let mut units = from_event_set(&runtime(), &evset).collect();
        units.sort_by(|a, b| a.0.cmp(&b.0));

        assert_eq!(units.len(), 2);
        assert!(units
            .iter()
            .all(|(key, (_, values))| key.is_timestamps_only() && values.is_none()));
        assert_eq!(units[0].0.to_string(), "(a)#-1");
    }

    #[test]
    fn test_unpack_blocks_checks_features() {
        let index = IndexKey::empty();
        assert!(matches!(unpack_blocks(&index, Vec::new(), 0), Err(Error::ContractViolation(_))));

        let timestamps: Timestamps = Arc::from(vec![1.0, 2.0]);
        let blocks = vec![(0, (timestamps.clone(), Some(FeatureArray::from(vec![1_i32]))))];
        assert!(unpack_blocks(&index, blocks, 1).is_err());

        let blocks = vec![(0, (timestamps, Some(FeatureArray::from(vec![1_i32, 2]))))];
        assert!(unpack_blocks(&index, blocks, 2).is_err());
    }

    #[test]
    fn test_empty_unindexed_event_set() {
        let schema = Arc::new(Schema::from_pairs(&[], &[("f", DType::Float32)]).unwrap());
        let evset = to_event_set(runtime().empty(), schema).unwrap();
        assert_eq!(evset.num_index_keys(), 1);
        assert_eq!(evset.num_events(), 0);
    }
}
