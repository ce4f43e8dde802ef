//! In-memory timestamps

use std::collections::BTreeMap;

use crate::error::Result;
use crate::event_set::{EventSet, FeatureArray, IndexData, Timestamps};
use crate::graph::Operator;
use crate::implementation::{input, EventSets, OperatorImplementation};

/// Timestamps as a feature, sharing their buffer
pub fn timestamps_feature(timestamps: &Timestamps) -> FeatureArray {
    FeatureArray::Float64(timestamps.clone())
}

/// In-memory timestamps operator
#[derive(Debug, Default)]
pub struct TimestampsImplementation;

impl OperatorImplementation for TimestampsImplementation {
    fn execute(&self, operator: &Operator, inputs: &EventSets) -> Result<EventSets> {
        let source = input(operator, inputs, "input")?;
        let mut output = EventSet::new(operator.output_schema("output")?.clone());
        for (key, data) in source.iter() {
            let features = vec![timestamps_feature(&data.timestamps)];
            output.set_index_value(key.clone(), IndexData::new(data.timestamps.clone(), features));
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

    #[test]
    fn test_timestamps_as_feature() {
        let evset = event_set(
            vec![3.0, -1.0, 2.5, 7.0],
            vec![
                ("k", FeatureArray::from(vec!["a", "a", "b", "a"])),
                ("v", FeatureArray::from(vec![true, false, true, true])),
            ],
            &["k"],
        )
        .unwrap();
        let source = EventSetNode::source((**evset.schema()).clone());
        let node = operators::timestamps(&source).unwrap();
        let inputs = BTreeMap::from([("input".to_string(), evset)]);

        let out = call(
            &TimestampsImplementation,
            &node.creator().unwrap().operator,
            &inputs,
            &EvaluationConfig::debug(),
        )
        .unwrap();
        let result = &out["output"];

        let a = result.get(&IndexKey::new(vec!["a".into()])).unwrap();
        assert_eq!(&a.timestamps[..], &[-1.0, 3.0, 7.0]);
        assert_eq!(a.features, vec![FeatureArray::from(vec![-1.0, 3.0, 7.0])]);
        let b = result.get(&IndexKey::new(vec!["b".into()])).unwrap();
        assert_eq!(b.features, vec![FeatureArray::from(vec![2.5])]);
    }
}
