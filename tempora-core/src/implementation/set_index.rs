//! In-memory add-index and set-index

use std::collections::BTreeMap;

use crate::dtype::DType;
use crate::error::{Error, Result};
use crate::event_set::{EventSet, IndexData, Row};
use crate::graph::Operator;
use crate::implementation::{input, EventSets, OperatorImplementation};
use crate::operators::OperatorKind;
use crate::schema::Schema;
use crate::value::{IndexKey, IndexValue, ScalarValue};

/// How an index-changing operator re-keys the events of its input
#[derive(Debug, Clone)]
pub struct Reindex {
    /// Positions of the features moved into the index, in index order
    index_positions: Vec<usize>,

    /// Positions of the features that stay features
    kept_positions: Vec<usize>,

    /// Whether the new index values extend the current key
    append: bool,
}

impl Reindex {
    /// Read the re-keying of an ADD_INDEX or SET_INDEX operator whose input
    /// has `input_schema`
    pub fn new(operator: &Operator, input_schema: &Schema) -> Result<Self> {
        let (names, append) = match operator.kind() {
            OperatorKind::AddIndex => (operator.attribute("indexes")?.as_strings()?, true),
            OperatorKind::SetIndex => (
                operator.attribute("feature_names")?.as_strings()?,
                operator.attribute("append")?.as_bool()?,
            ),
            _ => return Err(Error::contract(operator.key(), "not an index operator")),
        };

        let index_positions = names
            .iter()
            .map(|name| input_schema.feature_index(name))
            .collect::<Result<Vec<_>>>()?;
        let kept_positions = (0..input_schema.num_features())
            .filter(|i| !index_positions.contains(i))
            .collect();
        Ok(Self {
            index_positions,
            kept_positions,
            append,
        })
    }

    /// New index key and remaining feature values of one event of `index`
    pub fn apply(
        &self,
        index: &IndexKey,
        values: &[ScalarValue],
    ) -> Result<(IndexKey, Vec<ScalarValue>)> {
        let extra = self
            .index_positions
            .iter()
            .map(|&position| {
                values
                    .get(position)
                    .cloned()
                    .ok_or_else(|| {
                        Error::InvalidArgument(format!(
                            "Event of index key {index} has no feature {position}"
                        ))
                    })
                    .and_then(IndexValue::try_from)
            })
            .collect::<Result<Vec<_>>>()?;
        let key = if self.append {
            index.extended(extra)
        } else {
            IndexKey::new(extra)
        };
        let kept = self
            .kept_positions
            .iter()
            .filter_map(|&position| values.get(position).cloned())
            .collect();
        Ok((key, kept))
    }
}

/// Feature values of the event at `row`
pub(crate) fn row_values(key: &IndexKey, data: &IndexData, row: usize) -> Result<Vec<ScalarValue>> {
    data.features
        .iter()
        .map(|feature| {
            feature.value(row).ok_or_else(|| {
                Error::InvalidArgument(format!("Row {row} out of bounds at index key {key}"))
            })
        })
        .collect()
}

/// In-memory add-index and set-index operators.
///
/// Events are regrouped by their new key. Within a group, events keep the
/// timestamp order; ties are ordered by input key, then by input position.
#[derive(Debug, Default)]
pub struct SetIndexImplementation;

impl OperatorImplementation for SetIndexImplementation {
    fn execute(&self, operator: &Operator, inputs: &EventSets) -> Result<EventSets> {
        let source = input(operator, inputs, "input")?;
        let reindex = Reindex::new(operator, source.schema())?;
        let schema = operator.output_schema("output")?.clone();
        let dtypes: Vec<DType> = schema.features().iter().map(|field| field.dtype).collect();

        let mut groups: BTreeMap<IndexKey, Vec<Row>> = BTreeMap::new();
        for (key, data) in source.iter() {
            for (row, &timestamp) in data.timestamps.iter().enumerate() {
                let (new_key, kept) = reindex.apply(key, &row_values(key, data, row)?)?;
                groups.entry(new_key).or_default().push((timestamp, kept));
            }
        }

        let mut output = EventSet::new(schema);
        for (key, rows) in groups {
            output.set_index_value(key, IndexData::from_rows(&dtypes, rows)?);
        }
        Ok(BTreeMap::from([("output".to_string(), output)]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EvaluationConfig;
    use crate::event_set::{event_set, FeatureArray};
    use crate::graph::EventSetNode;
    use crate::implementation::call;
    use crate::operators;

    fn build_input(indexes: &[&str]) -> EventSet {
        event_set(
            vec![1.0, 2.0, 3.0, 4.0, 5.0, 1.0, 2.0, 3.0, 4.0, 5.0],
            vec![
                ("a", FeatureArray::from(vec!["x", "x", "x", "x", "x", "y", "y", "y", "y", "y"])),
                ("b", FeatureArray::from(vec![1_i64, 1, 1, 2, 2, 1, 1, 1, 1, 1])),
                ("c", FeatureArray::from(vec![2_i64, 3, 4, 3, 2, 22, 23, 24, 23, 22])),
            ],
            indexes,
        )
        .unwrap()
    }

    fn run(evset: EventSet, build: impl Fn(&EventSetNode) -> EventSetNode) -> EventSet {
        let source = EventSetNode::source((**evset.schema()).clone());
        let node = build(&source);
        let inputs = BTreeMap::from([("input".to_string(), evset)]);
        let mut out = call(
            &SetIndexImplementation,
            &node.creator().unwrap().operator,
            &inputs,
            &EvaluationConfig::debug(),
        )
        .unwrap();
        out.remove("output").unwrap()
    }

    #[test]
    fn test_add_index_two_features() {
        let out = run(build_input(&[]), |s| operators::add_index(s, &["a", "b"]).unwrap());

        assert_eq!(out.schema().index_names(), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(out.num_index_keys(), 3);
        let x2 = out.get(&IndexKey::new(vec!["x".into(), 2_i64.into()])).unwrap();
        assert_eq!(&x2.timestamps[..], &[4.0, 5.0]);
        assert_eq!(x2.features[0], FeatureArray::from(vec![3_i64, 2]));
    }

    #[test]
    fn test_add_index_on_top() {
        let out = run(build_input(&["b"]), |s| operators::add_index(s, &["a"]).unwrap());

        assert_eq!(out.schema().index_names(), vec!["b".to_string(), "a".to_string()]);
        let y = out.get(&IndexKey::new(vec![1_i64.into(), "y".into()])).unwrap();
        assert_eq!(&y.timestamps[..], &[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(y.features[0], FeatureArray::from(vec![22_i64, 23, 24, 23, 22]));
    }

    #[test]
    fn test_set_index_replaces_and_merges_keys() {
        let out = run(build_input(&["a"]), |s| operators::set_index(s, &["b"], false).unwrap());

        assert_eq!(out.schema().index_names(), vec!["b".to_string()]);
        assert_eq!(out.schema().feature_names(), vec!["c".to_string()]);
        assert_eq!(out.num_index_keys(), 2);

        // Events of "x" and "y" merge under b=1, ties keep the input key order.
        let one = out.get(&IndexKey::new(vec![1_i64.into()])).unwrap();
        assert_eq!(&one.timestamps[..], &[1.0, 1.0, 2.0, 2.0, 3.0, 3.0, 4.0, 5.0]);
        assert_eq!(
            one.features[0],
            FeatureArray::from(vec![2_i64, 22, 3, 23, 4, 24, 23, 22])
        );
        let two = out.get(&IndexKey::new(vec![2_i64.into()])).unwrap();
        assert_eq!(&two.timestamps[..], &[4.0, 5.0]);
    }

    #[test]
    fn test_set_index_append_matches_add_index() {
        let appended = run(build_input(&["b"]), |s| operators::set_index(s, &["a"], true).unwrap());
        let added = run(build_input(&["b"]), |s| operators::add_index(s, &["a"]).unwrap());
        assert_eq!(appended, added);
    }

    #[test]
    fn test_reindex_apply() {
        let source = EventSetNode::source(
            Schema::from_pairs(
                &[("k", DType::Int64)],
                &[("s", DType::String), ("f", DType::Float64), ("i", DType::Int32)],
            )
            .unwrap(),
        );
        let node = operators::set_index(&source, &["i", "s"], false).unwrap();
        let reindex = Reindex::new(&node.creator().unwrap().operator, source.schema()).unwrap();

        let index = IndexKey::new(vec![1_i64.into()]);
        let values = vec![
            ScalarValue::String("x".into()),
            ScalarValue::Float64(0.5),
            ScalarValue::Int32(3),
        ];
        let (key, kept) = reindex.apply(&index, &values).unwrap();
        assert_eq!(key, IndexKey::new(vec![3_i32.into(), "x".into()]));
        assert_eq!(kept, vec![ScalarValue::Float64(0.5)]);

        assert!(reindex.apply(&index, &values[..1]).is_err());
    }
}
