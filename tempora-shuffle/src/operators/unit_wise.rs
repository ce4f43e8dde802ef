//! Operators applied to each unit independently

use std::sync::Arc;

use tempora_core::implementation::{calendar_value, timestamps_feature, unary_array};
use tempora_core::operators::OperatorKind;
use tempora_core::{FeatureArray, Operator};

use crate::error::Result;
use crate::event_set::UnitKey;
use crate::operators::{input, output, BeamEventSets, DistributedImplementation};

/// Distributed prefix: units are unchanged, only the schema differs
#[derive(Debug, Default)]
pub struct DistributedPrefix;

impl DistributedImplementation for DistributedPrefix {
    fn execute(&self, operator: &Operator, inputs: &BeamEventSets) -> Result<BeamEventSets> {
        Ok(output(input(operator, inputs, "input")?))
    }
}

/// Distributed unary operators
#[derive(Debug, Default)]
pub struct DistributedUnary;

impl DistributedImplementation for DistributedUnary {
    fn execute(&self, operator: &Operator, inputs: &BeamEventSets) -> Result<BeamEventSets> {
        let OperatorKind::Unary(op) = *operator.kind() else {
            return Err(
                tempora_core::Error::contract(operator.key(), "not a unary operator").into()
            );
        };
        let units = input(operator, inputs, "input")?.try_map(move |(key, (timestamps, values))| {
            let values = values.map(|values| unary_array(op, &values)).transpose()?;
            Ok((key, (timestamps, values)))
        })?;
        Ok(output(units))
    }
}

/// Distributed calendar operators.
///
/// One unit per index key is enough to read the timestamps: every key has
/// a unit for feature 0, or a single featureless unit.
#[derive(Debug, Default)]
pub struct DistributedCalendar;

impl DistributedImplementation for DistributedCalendar {
    fn execute(&self, operator: &Operator, inputs: &BeamEventSets) -> Result<BeamEventSets> {
        let OperatorKind::Calendar(unit) = *operator.kind() else {
            return Err(
                tempora_core::Error::contract(operator.key(), "not a calendar operator").into()
            );
        };
        let units = input(operator, inputs, "sampling")?
            .filter(|(key, _)| key.feature_idx <= 0)
            .try_map(move |(key, (timestamps, _))| {
                let values = timestamps
                    .iter()
                    .map(|t| calendar_value(unit, *t))
                    .collect::<tempora_core::Result<Arc<[i32]>>>()?;
                let values = Some(FeatureArray::Int32(values));
                Ok((UnitKey::feature(key.index, 0), (timestamps, values)))
            })?;
        Ok(output(units))
    }
}

/// Distributed timestamps: one feature unit per index key, holding the
/// timestamp buffer itself
#[derive(Debug, Default)]
pub struct DistributedTimestamps;

impl DistributedImplementation for DistributedTimestamps {
    fn execute(&self, operator: &Operator, inputs: &BeamEventSets) -> Result<BeamEventSets> {
        let units = input(operator, inputs, "input")?
            .filter(|(key, _)| key.feature_idx <= 0)
            .map(|(key, (timestamps, _))| {
                let values = timestamps_feature(&timestamps);
                (UnitKey::feature(key.index, 0), (timestamps, Some(values)))
            });
        Ok(output(units))
    }
}
