//! Distributed add-index and set-index

use tempora_core::implementation::Reindex;
use tempora_core::{DType, Operator};

use crate::error::Result;
use crate::event_set::{group_by_index, unpack_blocks, unpack_rows};
use crate::operators::{input, input_schema, output, BeamEventSets, DistributedImplementation};
use crate::pipeline::merge;

/// Distributed add-index and set-index.
///
/// Events are unpacked into rows keyed by the new index, grouped by that
/// key, and merged back into units. Each row remembers its input key and
/// position so that events with equal timestamps are ordered as in memory,
/// whatever order the shuffle delivers them in.
#[derive(Debug, Default)]
pub struct DistributedSetIndex;

impl DistributedImplementation for DistributedSetIndex {
    fn execute(&self, operator: &Operator, inputs: &BeamEventSets) -> Result<BeamEventSets> {
        let schema = input_schema(operator, "input")?;
        let reindex = Reindex::new(operator, &schema)?;
        let num_features = schema.num_features();
        let dtypes: Vec<DType> = operator
            .output_schema("output")?
            .features()
            .iter()
            .map(|field| field.dtype)
            .collect();

        let rows = group_by_index(input(operator, inputs, "input")?).try_flat_map(
            |(index, blocks)| -> Result<Vec<_>> {
                let data = unpack_blocks(&index, blocks, num_features)?;
                unpack_rows(&index, &data)?
                    .into_iter()
                    .enumerate()
                    .map(|(position, (timestamp, values))| -> Result<_> {
                        let (key, kept) = reindex.apply(&index, &values)?;
                        Ok((key, (index.clone(), position, (timestamp, kept))))
                    })
                    .collect()
            },
        )?;
        let units = rows.group_by_key().try_flat_map(|(key, mut rows)| {
            rows.sort_by(|a, b| {
                a.2 .0
                    .total_cmp(&b.2 .0)
                    .then_with(|| a.0.cmp(&b.0))
                    .then(a.1.cmp(&b.1))
            });
            let rows = rows.into_iter().map(|(_, _, row)| row).collect();
            merge(key, rows, &dtypes)
        })?;
        Ok(output(units))
    }
}
