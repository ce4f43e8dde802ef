//! In-memory event sets
//!
//! An [`EventSet`] maps each [`IndexKey`] to an [`IndexData`]: one shared
//! timestamp buffer and one [`FeatureArray`] per schema feature, all of the
//! same length. Operators that keep a sampling hand the *same* timestamp
//! buffer to their output, which is what makes sampling checks a pointer
//! comparison.

mod array;
mod builder;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

pub use array::{FeatureArray, Timestamps};
pub use builder::{event_set, EventSetBuilder, Row};

use crate::error::{Error, Result};
use crate::schema::Schema;
use crate::value::IndexKey;

/// Events of a single index key
#[derive(Debug, Clone)]
pub struct IndexData {
    /// Non-decreasing event timestamps
    pub timestamps: Timestamps,

    /// One array per schema feature, each as long as `timestamps`
    pub features: Vec<FeatureArray>,
}

impl IndexData {
    /// Create index data
    pub fn new(timestamps: Timestamps, features: Vec<FeatureArray>) -> Self {
        Self { timestamps, features }
    }

    /// Number of events
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// Check if there are no events
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}

impl PartialEq for IndexData {
    fn eq(&self, other: &Self) -> bool {
        self.timestamps == other.timestamps && self.features == other.features
    }
}

/// A collection of time-indexed feature values, partitioned by index key
#[derive(Debug, Clone)]
pub struct EventSet {
    /// Schema describing indexes and features
    schema: Arc<Schema>,

    /// Events by index key, in key order
    data: BTreeMap<IndexKey, IndexData>,
}

impl EventSet {
    /// Create an empty event set
    pub fn new(schema: Arc<Schema>) -> Self {
        Self {
            schema,
            data: BTreeMap::new(),
        }
    }

    /// Create an event set from already grouped data
    pub fn from_data(schema: Arc<Schema>, data: BTreeMap<IndexKey, IndexData>) -> Self {
        Self { schema, data }
    }

    /// Get the schema
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Get the events of all index keys
    pub fn data(&self) -> &BTreeMap<IndexKey, IndexData> {
        &self.data
    }

    /// Get the events of one index key
    pub fn get(&self, key: &IndexKey) -> Option<&IndexData> {
        self.data.get(key)
    }

    /// Get the events of one index key, failing if the key is absent
    pub fn index_data(&self, key: &IndexKey) -> Result<&IndexData> {
        self.data.get(key).ok_or_else(|| {
            Error::InvalidArgument(format!("Index key {key} not found in event set"))
        })
    }

    /// Set the events of one index key
    pub fn set_index_value(&mut self, key: IndexKey, data: IndexData) {
        self.data.insert(key, data);
    }

    /// Any index key of this event set (the first in key order)
    pub fn arbitrary_index_key(&self) -> Option<&IndexKey> {
        self.data.keys().next()
    }

    /// Iterate over index keys
    pub fn keys(&self) -> impl Iterator<Item = &IndexKey> {
        self.data.keys()
    }

    /// Iterate over index keys and their events
    pub fn iter(&self) -> impl Iterator<Item = (&IndexKey, &IndexData)> {
        self.data.iter()
    }

    /// Number of index keys
    pub fn num_index_keys(&self) -> usize {
        self.data.len()
    }

    /// Total number of events across index keys
    pub fn num_events(&self) -> usize {
        self.data.values().map(IndexData::len).sum()
    }
}

impl PartialEq for EventSet {
    fn eq(&self, other: &Self) -> bool {
        self.schema == other.schema && self.data == other.data
    }
}

impl fmt::Display for EventSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.schema)?;
        writeln!(f, "events:")?;
        for (key, data) in &self.data {
            let mut parts = Vec::with_capacity(key.len());
            for (index, value) in self.schema.indexes().iter().zip(key.iter()) {
                parts.push(format!("{}={}", index.name, value));
            }
            writeln!(f, "    {} ({} events):", parts.join(" "), data.len())?;
            writeln!(f, "        timestamps: {:?}", &data.timestamps[..])?;
            for (field, values) in self.schema.features().iter().zip(data.features.iter()) {
                let rendered: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                writeln!(f, "        '{}': [{}]", field.name, rendered.join(" "))?;
            }
        }
        Ok(())
    }
}
