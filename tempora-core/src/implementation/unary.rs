//! In-memory unary operators

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::event_set::{EventSet, FeatureArray, IndexData};
use crate::graph::Operator;
use crate::implementation::{input, EventSets, OperatorImplementation};
use crate::operators::{OperatorKind, UnaryOp};

fn map<T, U>(values: &[T], f: impl Fn(&T) -> U) -> Arc<[U]> {
    values.iter().map(f).collect()
}

/// Apply `op` to one feature array
pub fn unary_array(op: UnaryOp, array: &FeatureArray) -> Result<FeatureArray> {
    let result = match (op, array) {
        (UnaryOp::Abs, FeatureArray::Float64(v)) => FeatureArray::Float64(map(v, |x| x.abs())),
        (UnaryOp::Abs, FeatureArray::Float32(v)) => FeatureArray::Float32(map(v, |x| x.abs())),
        (UnaryOp::Abs, FeatureArray::Int64(v)) => FeatureArray::Int64(map(v, |x| x.wrapping_abs())),
        (UnaryOp::Abs, FeatureArray::Int32(v)) => FeatureArray::Int32(map(v, |x| x.wrapping_abs())),
        (UnaryOp::Log, FeatureArray::Float64(v)) => FeatureArray::Float64(map(v, |x| x.ln())),
        (UnaryOp::Log, FeatureArray::Float32(v)) => FeatureArray::Float32(map(v, |x| x.ln())),
        (UnaryOp::IsNan, FeatureArray::Float64(v)) => FeatureArray::Boolean(map(v, |x| x.is_nan())),
        (UnaryOp::IsNan, FeatureArray::Float32(v)) => FeatureArray::Boolean(map(v, |x| x.is_nan())),
        (UnaryOp::NotNan, FeatureArray::Float64(v)) => {
            FeatureArray::Boolean(map(v, |x| !x.is_nan()))
        }
        (UnaryOp::NotNan, FeatureArray::Float32(v)) => {
            FeatureArray::Boolean(map(v, |x| !x.is_nan()))
        }
        (UnaryOp::Invert, FeatureArray::Boolean(v)) => FeatureArray::Boolean(map(v, |x| !x)),
        (op, array) => {
            return Err(Error::TypeMismatch(format!(
                "{} does not apply to {} arrays",
                op.key(),
                array.dtype()
            )))
        }
    };
    Ok(result)
}

/// In-memory unary operators
#[derive(Debug, Default)]
pub struct UnaryImplementation;

impl OperatorImplementation for UnaryImplementation {
    fn execute(&self, operator: &Operator, inputs: &EventSets) -> Result<EventSets> {
        let OperatorKind::Unary(op) = *operator.kind() else {
            return Err(Error::contract(operator.key(), "not a unary operator"));
        };
        let source = input(operator, inputs, "input")?;
        let mut output = EventSet::new(operator.output_schema("output")?.clone());

        for (key, data) in source.iter() {
            let features = data
                .features
                .iter()
                .map(|feature| unary_array(op, feature))
                .collect::<Result<Vec<_>>>()?;
            output.set_index_value(key.clone(), IndexData::new(data.timestamps.clone(), features));
        }
        Ok(BTreeMap::from([("output".to_string(), output)]))
    }
}
