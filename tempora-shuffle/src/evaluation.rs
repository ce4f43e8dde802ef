//! Distributed graph evaluation

use std::collections::HashMap;

use tempora_core::graph::schedule;
use tempora_core::{EventSetNode, NodeId};
use tracing::debug;

use crate::error::Result;
use crate::event_set::BeamEventSet;
use crate::operators::{BeamEventSets, DistributedRegistry};

/// Evaluate `outputs` given distributed event sets for the graph inputs.
///
/// Operators run in dependency order. Units carry no schema, so the fed
/// collections are trusted to match their source nodes. Results are returned
/// in the order of `outputs`.
pub fn evaluate(
    outputs: &[EventSetNode],
    inputs: &HashMap<NodeId, BeamEventSet>,
    registry: &DistributedRegistry,
) -> Result<Vec<BeamEventSet>> {
    let plan = schedule(outputs);
    debug!(
        num_operators = plan.steps.len(),
        num_sources = plan.sources.len(),
        "starting distributed evaluation"
    );

    let mut values: HashMap<NodeId, BeamEventSet> = HashMap::new();
    for source in &plan.sources {
        let value = inputs.get(&source.id()).ok_or_else(|| {
            tempora_core::Error::MissingInput(format!(
                "No collection was provided for source {} ({})",
                source.name().unwrap_or("unnamed"),
                source.id()
            ))
        })?;
        values.insert(source.id(), value.clone());
    }

    for operator in &plan.steps {
        let implementation = registry.get(operator.key())?;

        let mut operator_inputs = BeamEventSets::new();
        for (key, node) in operator.inputs() {
            let value = values.get(&node.id()).ok_or_else(|| {
                let reason = format!("Input \"{key}\" was not computed before the operator");
                tempora_core::Error::contract(operator.key(), reason)
            })?;
            operator_inputs.insert(key.clone(), value.clone());
        }

        debug!(operator = operator.key(), "running distributed operator");
        for (key, units) in implementation.execute(operator, &operator_inputs)? {
            let spec = operator.outputs().get(&key).ok_or_else(|| {
                let reason = format!("Unexpected output \"{key}\"");
                tempora_core::Error::contract(operator.key(), reason)
            })?;
            values.insert(spec.id, units);
        }
    }

    let results = outputs
        .iter()
        .map(|node| {
            values.get(&node.id()).cloned().ok_or_else(|| {
                tempora_core::Error::MissingInput(format!("Node {} was not computed", node.id()))
                    .into()
            })
        })
        .collect::<Result<Vec<_>>>()?;
    debug!(num_outputs = results.len(), "distributed evaluation done");
    Ok(results)
}
