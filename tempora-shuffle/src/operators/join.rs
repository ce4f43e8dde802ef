//! Distributed left join

use tempora_core::implementation::JoinPlan;
use tempora_core::Operator;

use crate::error::{Error, Result};
use crate::event_set::{group_by_index, pack_units, unpack_blocks};
use crate::operators::{input, input_schema, output, BeamEventSets, DistributedImplementation};

/// Distributed join.
///
/// The units of both inputs are regrouped by index key and co-grouped. Keys
/// found only on the right are dropped; the others are joined in memory, one
/// key at a time, and split back into units sharing the left timestamps.
#[derive(Debug, Default)]
pub struct DistributedJoin;

impl DistributedImplementation for DistributedJoin {
    fn execute(&self, operator: &Operator, inputs: &BeamEventSets) -> Result<BeamEventSets> {
        let left_schema = input_schema(operator, "left")?;
        let right_schema = input_schema(operator, "right")?;
        let plan = JoinPlan::new(operator, &left_schema, &right_schema)?;
        let (num_left, num_right) = (left_schema.num_features(), right_schema.num_features());

        let left = group_by_index(input(operator, inputs, "left")?);
        let right = group_by_index(input(operator, inputs, "right")?);
        let grouped = left.co_group(right);
        let units = grouped.try_flat_map(|(index, (mut lefts, mut rights))| -> Result<Vec<_>> {
            if lefts.len() > 1 || rights.len() > 1 {
                return Err(Error::ContractViolation(format!(
                    "Index key {index} is grouped {} times on the left and {} times on the right",
                    lefts.len(),
                    rights.len()
                )));
            }
            let Some(left_blocks) = lefts.pop() else {
                return Ok(Vec::new());
            };
            let left_data = unpack_blocks(&index, left_blocks, num_left)?;
            let right_data = rights
                .pop()
                .map(|blocks| unpack_blocks(&index, blocks, num_right))
                .transpose()?;
            let joined = plan.join(&left_data, right_data.as_ref())?;
            Ok(pack_units(index, joined))
        })?;
        Ok(output(units))
    }
}
