//! Distributed operator implementations
//!
//! Operators that keep the sampling of an input transform its units one by
//! one. Binary operators co-group the units of both inputs by unit key.
//! Operators that change the index (or the timestamps) of their input
//! regroup events by index key first.

mod binary;
mod join;
mod lag;
mod set_index;
mod unit_wise;

use std::collections::BTreeMap;
use std::sync::Arc;

use tempora_core::operators::{ArithmeticOp, CalendarUnit, ComparisonOp, OperatorKind, UnaryOp};
use tempora_core::{Operator, Registry, Schema};

use crate::error::{Error, Result};
use crate::event_set::BeamEventSet;

pub use binary::{DistributedArithmetic, DistributedComparison};
pub use join::DistributedJoin;
pub use lag::DistributedLag;
pub use set_index::DistributedSetIndex;
pub use unit_wise::{
    DistributedCalendar, DistributedPrefix, DistributedTimestamps, DistributedUnary,
};

/// Named distributed event sets passed to or returned by an operator
pub type BeamEventSets = BTreeMap<String, BeamEventSet>;

/// Distributed implementation of one operator kind
pub trait DistributedImplementation: Send + Sync {
    /// Apply `operator` to `inputs`
    fn execute(&self, operator: &Operator, inputs: &BeamEventSets) -> Result<BeamEventSets>;
}

/// Registry of distributed implementations
pub type DistributedRegistry = Registry<dyn DistributedImplementation>;

fn missing_input(operator: &Operator, key: &str) -> Error {
    tempora_core::Error::contract(operator.key(), format!("Missing input \"{key}\"")).into()
}

/// Get an input, cloning its units
pub(crate) fn input(
    operator: &Operator,
    inputs: &BeamEventSets,
    key: &str,
) -> Result<BeamEventSet> {
    inputs.get(key).cloned().ok_or_else(|| missing_input(operator, key))
}

/// Schema of the node an operator input comes from.
///
/// Units carry no schema, so operators that unpack events read it from the
/// graph.
pub(crate) fn input_schema(operator: &Operator, key: &str) -> Result<Arc<Schema>> {
    operator
        .inputs()
        .get(key)
        .map(|node| node.schema().clone())
        .ok_or_else(|| missing_input(operator, key))
}

/// Outputs of a single-output operator
pub(crate) fn output(units: BeamEventSet) -> BeamEventSets {
    BTreeMap::from([("output".to_string(), units)])
}

/// Registry with every distributed implementation of the catalog
pub fn default_registry() -> DistributedRegistry {
    let mut registry = DistributedRegistry::new();
    for op in ArithmeticOp::ALL {
        registry.register(OperatorKind::Arithmetic(op).key(), Arc::new(DistributedArithmetic));
    }
    for op in ComparisonOp::ALL {
        registry.register(OperatorKind::Comparison(op).key(), Arc::new(DistributedComparison));
    }
    for unit in CalendarUnit::ALL {
        registry.register(OperatorKind::Calendar(unit).key(), Arc::new(DistributedCalendar));
    }
    for op in UnaryOp::ALL {
        registry.register(OperatorKind::Unary(op).key(), Arc::new(DistributedUnary));
    }
    registry
        .register(OperatorKind::Prefix.key(), Arc::new(DistributedPrefix))
        .register(OperatorKind::Lag.key(), Arc::new(DistributedLag))
        .register(OperatorKind::AddIndex.key(), Arc::new(DistributedSetIndex))
        .register(OperatorKind::SetIndex.key(), Arc::new(DistributedSetIndex))
        .register(OperatorKind::Join.key(), Arc::new(DistributedJoin))
        .register(OperatorKind::Timestamps.key(), Arc::new(DistributedTimestamps));
    registry
}
