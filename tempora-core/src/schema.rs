//! Schema definition for event sets

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::dtype::{check_is_valid_index_dtype, DType};
use crate::error::{Error, Result};

/// A named, typed column of a schema (an index or a feature)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Field {
    /// Name of the column
    pub name: String,

    /// Data type of the column
    pub dtype: DType,
}

impl Field {
    /// Create a new field
    pub fn new(name: &str, dtype: DType) -> Self {
        Self {
            name: name.to_string(),
            dtype,
        }
    }

    /// Get the name of this field
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the data type of this field
    pub fn dtype(&self) -> DType {
        self.dtype
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "('{}', {})", self.name, self.dtype)
    }
}

/// Ordered index and feature descriptors of an event set.
///
/// Names are unique across indexes and features. Two schemas are equal when
/// their ordered index and feature descriptors are equal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schema {
    /// Index columns, in key order
    indexes: Vec<Field>,

    /// Feature columns, in value order
    features: Vec<Field>,

    /// Feature positions by name for faster lookup
    #[serde(skip)]
    feature_indices: HashMap<String, usize>,
}

impl Schema {
    /// Create a new schema, validating names and index dtypes
    pub fn new(indexes: Vec<Field>, features: Vec<Field>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(indexes.len() + features.len());
        for field in indexes.iter().chain(features.iter()) {
            if !seen.insert(field.name.as_str()) {
                return Err(Error::InvalidArgument(format!(
                    "Duplicated column name \"{}\" in schema",
                    field.name
                )));
            }
        }

        for index in &indexes {
            check_is_valid_index_dtype(&index.name, index.dtype)?;
        }

        Ok(Self::from_parts(indexes, features))
    }

    /// Create a schema from `(name, dtype)` pairs
    pub fn from_pairs(indexes: &[(&str, DType)], features: &[(&str, DType)]) -> Result<Self> {
        Self::new(
            indexes.iter().map(|(name, dtype)| Field::new(name, *dtype)).collect(),
            features.iter().map(|(name, dtype)| Field::new(name, *dtype)).collect(),
        )
    }

    fn from_parts(indexes: Vec<Field>, features: Vec<Field>) -> Self {
        let feature_indices = features
            .iter()
            .enumerate()
            .map(|(i, field)| (field.name.clone(), i))
            .collect();

        Self {
            indexes,
            features,
            feature_indices,
        }
    }

    /// Get the index columns
    pub fn indexes(&self) -> &[Field] {
        &self.indexes
    }

    /// Get the feature columns
    pub fn features(&self) -> &[Field] {
        &self.features
    }

    /// Get the index names, in order
    pub fn index_names(&self) -> Vec<String> {
        self.indexes.iter().map(|f| f.name.clone()).collect()
    }

    /// Get the feature names, in order
    pub fn feature_names(&self) -> Vec<String> {
        self.features.iter().map(|f| f.name.clone()).collect()
    }

    /// Get the index dtypes, in order
    pub fn index_dtypes(&self) -> Vec<DType> {
        self.indexes.iter().map(|f| f.dtype).collect()
    }

    /// Get the position of a feature by name
    pub fn feature_index(&self, name: &str) -> Result<usize> {
        self.feature_indices
            .get(name)
            .copied()
            .ok_or_else(|| Error::InvalidArgument(format!("Feature not found: {name}")))
    }

    /// Get the number of features
    pub fn num_features(&self) -> usize {
        self.features.len()
    }

    /// Check that `other` has the same index descriptors
    pub fn check_compatible_index(&self, other: &Schema) -> Result<()> {
        if self.indexes != other.indexes {
            return Err(Error::SchemaMismatch(format!(
                "Arguments don't have the same index. {} != {}",
                FieldList(&self.indexes),
                FieldList(&other.indexes)
            )));
        }
        Ok(())
    }

    /// Serialize this schema to a binary format
    pub fn serialize(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(Error::Serialization)
    }

    /// Deserialize a schema from a binary format
    pub fn deserialize(data: &[u8]) -> Result<Self> {
        let schema: Self = bincode::deserialize(data).map_err(Error::Serialization)?;

        // Lookup table is skipped by serde; revalidate and rebuild it
        Self::new(schema.indexes, schema.features)
    }
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        self.indexes == other.indexes && self.features == other.features
    }
}

impl Eq for Schema {}

struct FieldList<'a>(&'a [Field]);

impl fmt::Display for FieldList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, field) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{field}")?;
        }
        write!(f, "]")
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "indexes: {} features: {}",
            FieldList(&self.indexes),
            FieldList(&self.features)
        )
    }
}
