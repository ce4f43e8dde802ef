//! Dependency ordering of the operators needed for a set of outputs

use std::collections::HashSet;
use std::sync::Arc;

use crate::graph::node::{EventSetNode, NodeId};
use crate::graph::operator::{Operator, OperatorId};

/// Operators to run, in dependency order, and the graph inputs they need
#[derive(Debug, Clone, Default)]
pub struct Schedule {
    /// Operators, each after the creators of its inputs
    pub steps: Vec<Arc<Operator>>,

    /// Source nodes reached from the outputs
    pub sources: Vec<EventSetNode>,
}

/// Walk creators back from `outputs` and order the operators found.
///
/// Each operator appears once, after every operator producing one of its
/// inputs.
pub fn schedule(outputs: &[EventSetNode]) -> Schedule {
    let mut visited_nodes: HashSet<NodeId> = HashSet::new();
    let mut visited_operators: HashSet<OperatorId> = HashSet::new();
    let mut schedule = Schedule::default();

    // Explicit stack of (node, inputs expanded) to avoid deep recursion
    let mut stack: Vec<(EventSetNode, bool)> =
        outputs.iter().rev().map(|n| (n.clone(), false)).collect();

    while let Some((node, expanded)) = stack.pop() {
        let Some(creator) = node.creator() else {
            if visited_nodes.insert(node.id()) {
                schedule.sources.push(node);
            }
            continue;
        };
        let operator = &creator.operator;

        if expanded {
            if visited_operators.insert(operator.id()) {
                schedule.steps.push(operator.clone());
            }
            continue;
        }
        if !visited_nodes.insert(node.id()) || visited_operators.contains(&operator.id()) {
            continue;
        }

        stack.push((node.clone(), true));
        for input in operator.inputs().values().rev() {
            stack.push((input.clone(), false));
        }
    }

    schedule
}
