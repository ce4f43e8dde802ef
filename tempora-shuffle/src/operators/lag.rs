//! Distributed lag

use tempora_core::{Operator, Timestamps};

use crate::error::Result;
use crate::event_set::{group_by_index, UnitKey};
use crate::operators::{input, output, BeamEventSets, DistributedImplementation};

/// Distributed lag.
///
/// Units are regrouped by index key so that the shifted timestamps are
/// computed once per key and shared by all of its units.
#[derive(Debug, Default)]
pub struct DistributedLag;

impl DistributedImplementation for DistributedLag {
    fn execute(&self, operator: &Operator, inputs: &BeamEventSets) -> Result<BeamEventSets> {
        let duration = operator.attribute("duration")?.as_f64()?;
        let grouped = group_by_index(input(operator, inputs, "input")?);
        let units = grouped.flat_map(move |(index, blocks)| {
            let Some((_, (timestamps, _))) = blocks.first() else {
                return Vec::new();
            };
            let shifted: Timestamps = timestamps.iter().map(|t| t + duration).collect();
            blocks
                .into_iter()
                .map(|(feature_idx, (_, values))| {
                    let key = UnitKey {
                        index: index.clone(),
                        feature_idx,
                    };
                    (key, (shifted.clone(), values))
                })
                .collect::<Vec<_>>()
        });
        Ok(output(units))
    }
}
