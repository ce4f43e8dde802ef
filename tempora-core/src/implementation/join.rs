//! In-memory left join

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::dtype::DType;
use crate::error::{Error, Result};
use crate::event_set::{EventSet, FeatureArray, IndexData};
use crate::graph::{Attribute, Operator};
use crate::implementation::{input, EventSets, OperatorImplementation};
use crate::operators::LEFT_JOIN;
use crate::schema::Schema;

/// Feature positions of a left join, resolved against both input schemas
#[derive(Debug, Clone)]
pub struct JoinPlan {
    /// Position of the `on` feature in the left input
    left_on: Option<usize>,

    /// Position of the `on` feature in the right input
    right_on: Option<usize>,

    /// Positions and dtypes of the right features copied to the output
    right_features: Vec<(usize, DType)>,
}

impl JoinPlan {
    /// Resolve the JOIN `operator` against its input schemas
    pub fn new(operator: &Operator, left: &Schema, right: &Schema) -> Result<Self> {
        let how = operator.attribute("how")?.as_str()?;
        if how != LEFT_JOIN {
            return Err(Error::contract(
                operator.key(),
                format!("unsupported join type \"{how}\""),
            ));
        }
        let on = operator.attributes().get("on").map(Attribute::as_str).transpose()?;

        let right_features = right
            .features()
            .iter()
            .enumerate()
            .filter(|(_, field)| Some(field.name.as_str()) != on)
            .map(|(position, field)| (position, field.dtype))
            .collect();
        Ok(Self {
            left_on: on.map(|name| left.feature_index(name)).transpose()?,
            right_on: on.map(|name| right.feature_index(name)).transpose()?,
            right_features,
        })
    }

    /// Join the events of one index key.
    ///
    /// The output shares the timestamps and feature buffers of `left`. Each
    /// left event takes the first right event with the same timestamp and
    /// `on` value; without one, or without `right`, it gets missing values.
    pub fn join(&self, left: &IndexData, right: Option<&IndexData>) -> Result<IndexData> {
        let matches = match right {
            Some(right) => self.matches(left, right)?,
            None => vec![None; left.len()],
        };

        let mut features = left.features.clone();
        for &(position, dtype) in &self.right_features {
            let missing = dtype.missing_value()?;
            let values = matches
                .iter()
                .map(|matched| match (matched, right) {
                    (Some(row), Some(right)) => right
                        .features
                        .get(position)
                        .and_then(|feature| feature.value(*row))
                        .ok_or_else(|| {
                            Error::InvalidArgument(format!(
                                "Right event {row} has no feature {position}"
                            ))
                        }),
                    _ => Ok(missing.clone()),
                })
                .collect::<Result<Vec<_>>>()?;
            features.push(FeatureArray::from_values(dtype, values)?);
        }
        Ok(IndexData::new(left.timestamps.clone(), features))
    }

    /// Row of `right` matching each event of `left`
    fn matches(&self, left: &IndexData, right: &IndexData) -> Result<Vec<Option<usize>>> {
        let left_on = self.left_on.map(|position| int64_feature(left, position)).transpose()?;
        let right_on = self.right_on.map(|position| int64_feature(right, position)).transpose()?;

        let matches = left
            .timestamps
            .iter()
            .enumerate()
            .map(|(row, timestamp)| {
                let start = right.timestamps.partition_point(|t| t.total_cmp(timestamp).is_lt());
                let end = right.timestamps.partition_point(|t| t.total_cmp(timestamp).is_le());
                (start..end).find(|&candidate| match (&left_on, &right_on) {
                    (Some(l), Some(r)) => l.get(row) == r.get(candidate),
                    _ => true,
                })
            })
            .collect();
        Ok(matches)
    }
}

fn int64_feature(data: &IndexData, position: usize) -> Result<Arc<[i64]>> {
    match data.features.get(position) {
        Some(FeatureArray::Int64(values)) => Ok(values.clone()),
        Some(other) => Err(Error::TypeMismatch(format!(
            "Join key has dtype {}, expected {}",
            other.dtype(),
            DType::Int64
        ))),
        None => Err(Error::InvalidArgument(format!("No join key at feature {position}"))),
    }
}

/// In-memory join operator
#[derive(Debug, Default)]
pub struct JoinImplementation;

impl OperatorImplementation for JoinImplementation {
    fn execute(&self, operator: &Operator, inputs: &EventSets) -> Result<EventSets> {
        let left = input(operator, inputs, "left")?;
        let right = input(operator, inputs, "right")?;
        let plan = JoinPlan::new(operator, left.schema(), right.schema())?;

        let mut output = EventSet::new(operator.output_schema("output")?.clone());
        for (key, data) in left.iter() {
            output.set_index_value(key.clone(), plan.join(data, right.get(key))?);
        }
        Ok(BTreeMap::from([("output".to_string(), output)]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EvaluationConfig;
    use crate::event_set::event_set;
    use crate::graph::EventSetNode;
    use crate::implementation::call;
    use crate::operators;
    use crate::value::IndexKey;

    fn run(left: EventSet, right: EventSet, on: Option<&str>) -> EventSet {
        let left_node = EventSetNode::source((**left.schema()).clone());
        let right_node = EventSetNode::source((**right.schema()).clone());
        let node = operators::join(&left_node, &right_node, "left", on).unwrap();
        let inputs = BTreeMap::from([("left".to_string(), left), ("right".to_string(), right)]);
        let mut out = call(
            &JoinImplementation,
            &node.creator().unwrap().operator,
            &inputs,
            &EvaluationConfig::debug(),
        )
        .unwrap();
        out.remove("output").unwrap()
    }

    #[test]
    fn test_join_on_timestamps() {
        let left = event_set(
            vec![1.0, 2.0, 3.0, 5.0],
            vec![
                ("x", FeatureArray::from(vec![1_i64, 1, 1, 2])),
                ("a", FeatureArray::from(vec![1.0, 2.0, 3.0, 4.0])),
            ],
            &["x"],
        )
        .unwrap();
        let right = event_set(
            vec![2.0, 2.0, 3.5, 5.0],
            vec![
                ("x", FeatureArray::from(vec![1_i64, 1, 1, 3])),
                ("b", FeatureArray::from(vec![10_i32, 11, 12, 13])),
                ("c", FeatureArray::from(vec!["p", "q", "r", "s"])),
            ],
            &["x"],
        )
        .unwrap();

        let out = run(left.clone(), right, None);
        assert_eq!(
            out.schema().feature_names(),
            vec!["a".to_string(), "b".to_string(), "c".to_string()]
        );
        assert_eq!(out.num_index_keys(), 2);

        let one = out.get(&IndexKey::new(vec![1_i64.into()])).unwrap();
        assert!(Arc::ptr_eq(&one.timestamps, &left.data().values().next().unwrap().timestamps));
        assert_eq!(one.features[1], FeatureArray::from(vec![0_i32, 10, 0]));
        assert_eq!(one.features[2], FeatureArray::from(vec!["", "p", ""]));

        // Key 2 is absent on the right side.
        let two = out.get(&IndexKey::new(vec![2_i64.into()])).unwrap();
        assert_eq!(two.features[1], FeatureArray::from(vec![0_i32]));
    }

    #[test]
    fn test_join_on_key() {
        let left = event_set(
            vec![1.0, 1.0, 2.0],
            vec![("id", FeatureArray::from(vec![1_i64, 2, 3]))],
            &[],
        )
        .unwrap();
        let right = event_set(
            vec![1.0, 1.0, 2.0],
            vec![
                ("id", FeatureArray::from(vec![2_i64, 1, 4])),
                ("v", FeatureArray::from(vec![20.0, 10.0, 40.0])),
            ],
            &[],
        )
        .unwrap();

        let out = run(left, right, Some("id"));
        assert_eq!(out.schema().feature_names(), vec!["id".to_string(), "v".to_string()]);

        let data = out.get(&IndexKey::empty()).unwrap();
        assert_eq!(data.features[0], FeatureArray::from(vec![1_i64, 2, 3]));
        assert_eq!(data.features[1], FeatureArray::from(vec![10.0, 20.0, f64::NAN]));
    }

    #[test]
    fn test_join_empty_left() {
        let left = event_set(vec![], vec![("a", FeatureArray::from(Vec::<f64>::new()))], &[])
            .unwrap();
        let right = event_set(vec![1.0], vec![("b", FeatureArray::from(vec![1.0]))], &[]).unwrap();

        let out = run(left, right, None);
        assert_eq!(out.num_events(), 0);
    }
}
