//! In-memory prefix

use std::collections::BTreeMap;

use crate::error::Result;
use crate::event_set::EventSet;
use crate::graph::Operator;
use crate::implementation::{input, EventSets, OperatorImplementation};

/// In-memory prefix operator.
///
/// Only the schema changes: timestamps and feature buffers are shared with
/// the input.
#[derive(Debug, Default)]
pub struct PrefixImplementation;

impl OperatorImplementation for PrefixImplementation {
    fn execute(&self, operator: &Operator, inputs: &EventSets) -> Result<EventSets> {
        let source = input(operator, inputs, "input")?;
        let schema = operator.output_schema("output")?.clone();
        let output = EventSet::from_data(schema, source.data().clone());
        Ok(BTreeMap::from([("output".to_string(), output)]))
    }
}
