//! Row-wise construction of event sets

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::dtype::DType;
use crate::error::{Error, Result};
use crate::event_set::{EventSet, FeatureArray, IndexData};
use crate::schema::{Field, Schema};
use crate::value::{IndexKey, IndexValue, ScalarValue};

/// One event: a timestamp and one value per feature
pub type Row = (f64, Vec<ScalarValue>);

impl IndexData {
    /// Build the events of one index key from unordered rows.
    ///
    /// Rows are stably sorted by timestamp; the result does not depend on the
    /// arrival order of rows with distinct timestamps.
    pub fn from_rows(dtypes: &[DType], mut rows: Vec<Row>) -> Result<Self> {
        rows.sort_by(|a, b| a.0.total_cmp(&b.0));

        let timestamps: Arc<[f64]> = rows.iter().map(|(t, _)| *t).collect();
        let mut columns: Vec<Vec<ScalarValue>> =
            dtypes.iter().map(|_| Vec::with_capacity(rows.len())).collect();
        for (timestamp, values) in rows {
            if values.len() != dtypes.len() {
                return Err(Error::InvalidArgument(format!(
                    "Event at timestamp {timestamp} has {} values, expected {}",
                    values.len(),
                    dtypes.len()
                )));
            }
            for (column, value) in columns.iter_mut().zip(values) {
                column.push(value);
            }
        }

        let features = dtypes
            .iter()
            .zip(columns)
            .map(|(dtype, column)| FeatureArray::from_values(*dtype, column))
            .collect::<Result<Vec<_>>>()?;

        Ok(IndexData::new(timestamps, features))
    }
}

/// Accumulates events and groups them by index key
#[derive(Debug)]
pub struct EventSetBuilder {
    /// Target schema
    schema: Arc<Schema>,

    /// Pending events by index key
    rows: BTreeMap<IndexKey, Vec<Row>>,
}

impl EventSetBuilder {
    /// Create a builder for `schema`
    pub fn new(schema: Arc<Schema>) -> Self {
        Self {
            schema,
            rows: BTreeMap::new(),
        }
    }

    /// Add one event
    pub fn push(&mut self, key: IndexKey, timestamp: f64, values: Vec<ScalarValue>) -> Result<()> {
        if key.len() != self.schema.indexes().len() {
            return Err(Error::InvalidArgument(format!(
                "Index key {key} has {} values, expected {}",
                key.len(),
                self.schema.indexes().len()
            )));
        }
        for (index, value) in self.schema.indexes().iter().zip(key.iter()) {
            if value.dtype() != index.dtype {
                return Err(Error::TypeMismatch(format!(
                    "Index \"{}\" expects {} values, got {}",
                    index.name,
                    index.dtype,
                    value.dtype()
                )));
            }
        }
        for (feature, value) in self.schema.features().iter().zip(values.iter()) {
            if value.dtype() != feature.dtype {
                return Err(Error::TypeMismatch(format!(
                    "Feature \"{}\" expects {} values, got {}",
                    feature.name,
                    feature.dtype,
                    value.dtype()
                )));
            }
        }

        self.rows.entry(key).or_default().push((timestamp, values));
        Ok(())
    }

    /// Group the events, sorting each index key by timestamp
    pub fn build(self) -> Result<EventSet> {
        let dtypes: Vec<DType> = self.schema.features().iter().map(Field::dtype).collect();
        let mut evset = EventSet::new(self.schema.clone());

        if self.schema.indexes().is_empty() && self.rows.is_empty() {
            evset.set_index_value(IndexKey::empty(), IndexData::from_rows(&dtypes, Vec::new())?);
        }

        for (key, rows) in self.rows {
            evset.set_index_value(key, IndexData::from_rows(&dtypes, rows)?);
        }
        Ok(evset)
    }
}

/// Create an event set from columns.
///
/// Every column is as long as `timestamps`. Columns named in `indexes` become
/// the index (in the order given); the remaining columns are features.
pub fn event_set(
    timestamps: Vec<f64>,
    columns: Vec<(&str, FeatureArray)>,
    indexes: &[&str],
) -> Result<EventSet> {
    for (name, column) in &columns {
        if column.len() != timestamps.len() {
            return Err(Error::InvalidArgument(format!(
                "Column \"{name}\" has {} values but there are {} timestamps",
                column.len(),
                timestamps.len()
            )));
        }
    }

    let mut index_columns = Vec::with_capacity(indexes.len());
    for index in indexes {
        let column = columns
            .iter()
            .find(|(name, _)| name == index)
            .ok_or_else(|| Error::InvalidArgument(format!("Index \"{index}\" is not a column")))?;
        index_columns.push(column);
    }
    let feature_columns: Vec<&(&str, FeatureArray)> =
        columns.iter().filter(|(name, _)| !indexes.contains(name)).collect();

    let schema = Arc::new(Schema::new(
        index_columns.iter().map(|(name, c)| Field::new(name, c.dtype())).collect(),
        feature_columns.iter().map(|(name, c)| Field::new(name, c.dtype())).collect(),
    )?);

    let mut builder = EventSetBuilder::new(schema);
    for (i, timestamp) in timestamps.iter().enumerate() {
        let key = index_columns
            .iter()
            .map(|(_, column)| value_at(column, i).and_then(IndexValue::try_from))
            .collect::<Result<IndexKey>>()?;
        let values = feature_columns
            .iter()
            .map(|(_, column)| value_at(column, i))
            .collect::<Result<Vec<_>>>()?;
        builder.push(key, *timestamp, values)?;
    }
    builder.build()
}

fn value_at(column: &FeatureArray, i: usize) -> Result<ScalarValue> {
    column
        .value(i)
        .ok_or_else(|| Error::InvalidArgument(format!("Row {i} out of bounds")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_set_groups_and_sorts() {
        let evset = event_set(
            vec![3.0, 1.0, 2.0, 1.0],
            vec![
                ("a", FeatureArray::from(vec!["x", "x", "y", "x"])),
                ("c", FeatureArray::from(vec![30_i64, 10, 20, 11])),
            ],
            &["a"],
        )
        .unwrap();

        assert_eq!(evset.schema().index_names(), vec!["a".to_string()]);
        assert_eq!(evset.schema().feature_names(), vec!["c".to_string()]);
        assert_eq!(evset.num_index_keys(), 2);

        let x = evset.get(&IndexKey::new(vec!["x".into()])).unwrap();
        assert_eq!(&x.timestamps[..], &[1.0, 1.0, 3.0]);
        assert_eq!(x.features[0], FeatureArray::from(vec![10_i64, 11, 30]));
    }

    #[test]
    fn test_event_set_without_events() {
        let evset = event_set(vec![], vec![], &[]).unwrap();
        assert_eq!(evset.num_index_keys(), 1);
        assert_eq!(evset.num_events(), 0);
    }

    #[test]
    fn test_event_set_rejects_float_index() {
        let err =
            event_set(vec![1.0], vec![("a", FeatureArray::from(vec![1.5]))], &["a"]).unwrap_err();
        assert!(matches!(err, Error::InvalidIndexDType { .. }));
    }

    #[test]
    fn test_builder_checks_dtypes() {
        let schema =
            Arc::new(Schema::from_pairs(&[("a", DType::Int64)], &[("f", DType::Float32)]).unwrap());
        let mut builder = EventSetBuilder::new(schema);

        assert!(builder
            .push(IndexKey::new(vec![IndexValue::Int32(1)]), 0.0, vec![ScalarValue::Float32(1.0)])
            .is_err());
        assert!(builder
            .push(IndexKey::new(vec![IndexValue::Int64(1)]), 0.0, vec![ScalarValue::Float64(1.0)])
            .is_err());
        builder
            .push(IndexKey::new(vec![IndexValue::Int64(1)]), 0.0, vec![ScalarValue::Float32(1.0)])
            .unwrap();
        assert_eq!(builder.build().unwrap().num_events(), 1);
    }
}
