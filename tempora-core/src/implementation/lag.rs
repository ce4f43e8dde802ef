//! In-memory lag

use std::collections::BTreeMap;

use crate::error::Result;
use crate::event_set::{EventSet, IndexData, Timestamps};
use crate::graph::Operator;
use crate::implementation::{input, EventSets, OperatorImplementation};

/// In-memory lag operator.
///
/// Timestamps are shifted into new buffers; feature buffers are shared.
#[derive(Debug, Default)]
pub struct LagImplementation;

impl OperatorImplementation for LagImplementation {
    fn execute(&self, operator: &Operator, inputs: &EventSets) -> Result<EventSets> {
        let duration = operator.attribute("duration")?.as_f64()?;
        let source = input(operator, inputs, "input")?;
        let mut output = EventSet::new(operator.output_schema("output")?.clone());

        for (key, data) in source.iter() {
            let timestamps: Timestamps = data.timestamps.iter().map(|t| t + duration).collect();
            output.set_index_value(key.clone(), IndexData::new(timestamps, data.features.clone()));
        }
        Ok(BTreeMap::from([("output".to_string(), output)]))
    }
}
