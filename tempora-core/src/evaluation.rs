//! In-memory graph evaluation

use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use crate::config::EvaluationConfig;
use crate::error::{Error, Result};
use crate::event_set::EventSet;
use crate::graph::{schedule, EventSetNode, NodeId};
use crate::implementation::{call, EventSets, ImplementationRegistry};

/// Evaluate `outputs` given event sets for the graph inputs.
///
/// Every source node reached from `outputs` must be fed, with an event set
/// of the node's schema. Operators run in dependency order through the
/// validating [`call`]. Results are returned in the order of `outputs`.
pub fn evaluate(
    outputs: &[EventSetNode],
    inputs: &HashMap<NodeId, EventSet>,
    registry: &ImplementationRegistry,
    config: &EvaluationConfig,
) -> Result<Vec<EventSet>> {
    let plan = schedule(outputs);
    debug!(
        num_operators = plan.steps.len(),
        num_sources = plan.sources.len(),
        validation = ?config.validation,
        "starting in-memory evaluation"
    );

    let mut values: HashMap<NodeId, EventSet> = HashMap::new();
    for source in &plan.sources {
        let value = inputs.get(&source.id()).ok_or_else(|| {
            Error::MissingInput(format!(
                "No event set was provided for source {} ({})",
                source.name().unwrap_or("unnamed"),
                source.id()
            ))
        })?;
        if value.schema().as_ref() != source.schema().as_ref() {
            return Err(Error::SchemaMismatch(format!(
                "Event set fed to source {} has schema {} but the node expects {}",
                source.id(),
                value.schema(),
                source.schema()
            )));
        }
        values.insert(source.id(), value.clone());
    }

    for operator in &plan.steps {
        let implementation = registry.get(operator.key())?;

        let mut operator_inputs: EventSets = BTreeMap::new();
        for (key, node) in operator.inputs() {
            let value = values.get(&node.id()).ok_or_else(|| {
                Error::contract(
                    operator.key(),
                    format!("Input \"{key}\" was not computed before the operator"),
                )
            })?;
            operator_inputs.insert(key.clone(), value.clone());
        }

        debug!(operator = operator.key(), "running operator");
        let operator_outputs = call(implementation.as_ref(), operator, &operator_inputs, config)?;
        for (key, value) in operator_outputs {
            let spec = operator.outputs().get(&key).ok_or_else(|| {
                Error::contract(operator.key(), format!("Unexpected output \"{key}\""))
            })?;
            values.insert(spec.id, value);
        }
        debug!(operator = operator.key(), "operator done");
    }

    outputs
        .iter()
        .map(|node| {
            values
                .get(&node.id())
                .cloned()
                .ok_or_else(|| Error::MissingInput(format!("Node {} was not computed", node.id())))
        })
        .collect()
}
