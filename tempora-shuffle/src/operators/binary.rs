//! Distributed binary operators

use tempora_core::implementation::{arithmetic_arrays, compare_arrays, resolution};
use tempora_core::operators::OperatorKind;
use tempora_core::{FeatureArray, Operator};

use crate::error::Result;
use crate::operators::{input, output, BeamEventSets, DistributedImplementation};

/// Pair the units of both inputs by unit key and apply `kernel` to each
/// pair of value arrays.
///
/// Both inputs share a sampling, so each unit key must be found exactly once
/// in each, with as many timestamps and values on both sides. The output
/// reuses the timestamps of `input_1`.
fn execute_binary<K>(
    operator: &Operator,
    inputs: &BeamEventSets,
    kernel: K,
) -> Result<BeamEventSets>
where
    K: Fn(&FeatureArray, &FeatureArray) -> tempora_core::Result<FeatureArray> + Send + Sync,
{
    resolution(operator)?;
    let input_1 = input(operator, inputs, "input_1")?;
    let input_2 = input(operator, inputs, "input_2")?;
    let key = operator.key();

    let units = input_1.co_group(input_2).try_map(|(unit_key, (left, right))| {
        let ([(timestamps, values_1)], [(timestamps_2, values_2)]) =
            (left.as_slice(), right.as_slice())
        else {
            return Err(tempora_core::Error::contract(
                key,
                format!(
                    "Unit {unit_key} is found {} times in \"input_1\" and {} times in \"input_2\"",
                    left.len(),
                    right.len()
                ),
            )
            .into());
        };
        let lengths = [values_1, values_2].map(|values| values.as_ref().map(FeatureArray::len));
        let num_events = timestamps.len();
        if timestamps_2.len() != num_events
            || lengths.iter().flatten().any(|&length| length != num_events)
        {
            return Err(tempora_core::Error::contract(
                key,
                format!(
                    "Unit {unit_key} has {num_events} timestamps in \"input_1\" and {} in \
                     \"input_2\", with value lengths {lengths:?}",
                    timestamps_2.len()
                ),
            )
            .into());
        }

        let values = match (values_1, values_2) {
            (Some(a), Some(b)) => Some(kernel(a, b)?),
            (None, None) => None,
            _ => {
                return Err(tempora_core::Error::contract(
                    key,
                    format!("Unit {unit_key} has values in only one input"),
                )
                .into())
            }
        };
        Ok((unit_key, (timestamps.clone(), values)))
    })?;
    Ok(output(units))
}

/// Distributed arithmetic operators
#[derive(Debug, Default)]
pub struct DistributedArithmetic;

impl DistributedImplementation for DistributedArithmetic {
    fn execute(&self, operator: &Operator, inputs: &BeamEventSets) -> Result<BeamEventSets> {
        let OperatorKind::Arithmetic(op) = *operator.kind() else {
            return Err(
                tempora_core::Error::contract(operator.key(), "not an arithmetic operator").into()
            );
        };
        execute_binary(operator, inputs, move |a, b| arithmetic_arrays(op, a, b))
    }
}

/// Distributed comparison operators
#[derive(Debug, Default)]
pub struct DistributedComparison;

impl DistributedImplementation for DistributedComparison {
    fn execute(&self, operator: &Operator, inputs: &BeamEventSets) -> Result<BeamEventSets> {
        let OperatorKind::Comparison(op) = *operator.kind() else {
            return Err(
                tempora_core::Error::contract(operator.key(), "not a comparison operator").into()
            );
        };
        execute_binary(operator, inputs, move |a, b| compare_arrays(op, a, b))
    }
}
