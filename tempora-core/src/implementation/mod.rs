//! In-memory operator implementations and the validating dispatcher
//!
//! Implementations are invoked through [`call`], which checks inputs against
//! the operator's declared interface before running it, and outputs plus
//! declared same-sampling pairs after.

mod binary;
mod calendar;
mod join;
mod lag;
mod prefix;
mod set_index;
mod timestamps;
mod unary;

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tracing::trace;

use crate::config::{EvaluationConfig, ValidationMode};
use crate::error::{Error, Result};
use crate::event_set::EventSet;
use crate::graph::Operator;
use crate::operators::{ArithmeticOp, CalendarUnit, ComparisonOp, OperatorKind, UnaryOp};
use crate::registry::Registry;
use crate::schema::Schema;

pub use binary::{
    arithmetic_arrays, compare_arrays, resolution, ArithmeticImplementation,
    ComparisonImplementation,
};
pub use calendar::{calendar_value, CalendarImplementation};
pub use join::{JoinImplementation, JoinPlan};
pub use lag::LagImplementation;
pub use prefix::PrefixImplementation;
pub use set_index::{Reindex, SetIndexImplementation};
pub use timestamps::{timestamps_feature, TimestampsImplementation};
pub use unary::{unary_array, UnaryImplementation};

/// Named event sets passed to or returned by an operator
pub type EventSets = BTreeMap<String, EventSet>;

/// In-memory implementation of one operator kind
pub trait OperatorImplementation: Send + Sync {
    /// Apply `operator` to `inputs`, without any validation
    fn execute(&self, operator: &Operator, inputs: &EventSets) -> Result<EventSets>;
}

/// Registry of in-memory implementations
pub type ImplementationRegistry = Registry<dyn OperatorImplementation>;

/// Run `implementation` with pre- and post-condition checks.
///
/// Inputs must match the operator's input keys and schemas; outputs must
/// match its output keys and schemas, and every declared same-sampling
/// `(input, output)` pair must share timestamp buffers.
pub fn call(
    implementation: &dyn OperatorImplementation,
    operator: &Operator,
    inputs: &EventSets,
    config: &EvaluationConfig,
) -> Result<EventSets> {
    check_input(operator, inputs)?;
    let outputs = implementation.execute(operator, inputs)?;
    check_output(operator, inputs, &outputs, config.validation)?;
    Ok(outputs)
}

fn check_keys<'a>(
    operator: &Operator,
    kind: &str,
    received: impl Iterator<Item = &'a String>,
    expected: impl Iterator<Item = &'a String>,
) -> Result<()> {
    let received: BTreeSet<&String> = received.collect();
    let expected: BTreeSet<&String> = expected.collect();
    if received != expected {
        return Err(Error::contract(
            operator.key(),
            format!(
                "{kind} keys do not match the expected ones. Received: {received:?}. \
                 Expected: {expected:?}."
            ),
        ));
    }
    Ok(())
}

/// Check one event set against its declared schema, inspecting the data of
/// a single index key
fn check_value_to_schema(
    operator: &Operator,
    label: &str,
    key: &str,
    value: &EventSet,
    schema: &Schema,
) -> Result<()> {
    if value.schema().as_ref() != schema {
        return Err(Error::SchemaMismatch(format!(
            "Non matching schema between event set and {label} node \"{key}\" of operator {}. \
             event set={} vs node={}",
            operator.key(),
            value.schema(),
            schema
        )));
    }

    let Some(index_key) = value.arbitrary_index_key() else {
        return Ok(());
    };
    let data = value.index_data(index_key)?;
    trace!(
        operator = operator.key(),
        label,
        key,
        index_key = %index_key,
        "checking event set data"
    );

    if data.features.len() != schema.num_features() {
        return Err(Error::SchemaMismatch(format!(
            "Non matching number of {label} features for \"{key}\". expected={} vs effective={}",
            schema.num_features(),
            data.features.len()
        )));
    }
    for (feature, field) in data.features.iter().zip(schema.features()) {
        if feature.dtype() != field.dtype {
            return Err(Error::SchemaMismatch(format!(
                "Non matching {label} feature dtype for \"{}\". expected={} vs effective={}",
                field.name,
                field.dtype,
                feature.dtype()
            )));
        }
        if feature.len() != data.timestamps.len() {
            return Err(Error::SchemaMismatch(format!(
                "Feature \"{}\" has {} values but there are {} timestamps at index key {index_key}",
                field.name,
                feature.len(),
                data.timestamps.len()
            )));
        }
    }
    Ok(())
}

fn check_input(operator: &Operator, inputs: &EventSets) -> Result<()> {
    check_keys(operator, "Input", inputs.keys(), operator.inputs().keys())?;
    for (key, node) in operator.inputs() {
        let value = input(operator, inputs, key)?;
        check_value_to_schema(operator, "input", key, value, node.schema())?;
    }
    Ok(())
}

fn check_output(
    operator: &Operator,
    inputs: &EventSets,
    outputs: &EventSets,
    mode: ValidationMode,
) -> Result<()> {
    check_keys(operator, "Output", outputs.keys(), operator.outputs().keys())?;
    for (key, spec) in operator.outputs() {
        let output = outputs
            .get(key)
            .ok_or_else(|| Error::contract(operator.key(), format!("Missing output \"{key}\"")))?;
        check_value_to_schema(operator, "output", key, output, &spec.schema)?;
    }

    for (input_key, output_key) in operator.matching_io_samplings() {
        let (Some(input), Some(output)) = (inputs.get(input_key), outputs.get(output_key)) else {
            return Err(Error::contract(
                operator.key(),
                format!(
                    "Same-sampling pair ('{input_key}', '{output_key}') names an unknown input \
                     or output"
                ),
            ));
        };
        if let Some(reason) = sampling_mismatch(output, input, mode) {
            return Err(Error::contract(
                operator.key(),
                format!(
                    "The sampling of input '{input_key}' and output '{output_key}' are expected \
                     to have THE SAME sampling. However, a different sampling was generated \
                     during the op execution. Reason: {reason}"
                ),
            ));
        }
    }
    Ok(())
}

/// Why `first` and `second` do not share a sampling, if they do not.
///
/// Timestamps are compared by buffer identity: equal values in distinct
/// buffers are a mismatch. [`ValidationMode::Fast`] checks a single index
/// key; [`ValidationMode::Debug`] checks every key and that both event sets
/// have the same keys. Two event sets without index keys share a sampling.
pub fn sampling_mismatch(
    first: &EventSet,
    second: &EventSet,
    mode: ValidationMode,
) -> Option<String> {
    if first.schema().indexes() != second.schema().indexes() {
        return Some("different index names".to_string());
    }

    let num_checks = match mode {
        ValidationMode::Fast => 1,
        ValidationMode::Debug => first.num_index_keys(),
    };
    for (index_key, data_1) in first.iter().take(num_checks) {
        let Some(data_2) = second.get(index_key) else {
            return Some(format!("index key {index_key} is missing"));
        };
        if !Arc::ptr_eq(&data_1.timestamps, &data_2.timestamps) {
            return Some(format!("timestamps at index key {index_key} are not the same buffer"));
        }
    }

    if mode == ValidationMode::Debug {
        let keys_1: BTreeSet<_> = first.keys().collect();
        let keys_2: BTreeSet<_> = second.keys().collect();
        let num_different = keys_1.symmetric_difference(&keys_2).count();
        if num_different > 0 {
            return Some(format!("found {num_different} different index keys"));
        }
    }
    None
}

/// Get a named input, failing with a contract violation if absent
pub(crate) fn input<'a>(
    operator: &Operator,
    inputs: &'a EventSets,
    key: &str,
) -> Result<&'a EventSet> {
    inputs
        .get(key)
        .ok_or_else(|| Error::contract(operator.key(), format!("Missing input \"{key}\"")))
}

/// Registry with every in-memory implementation of the catalog
pub fn default_registry() -> ImplementationRegistry {
    let mut registry = ImplementationRegistry::new();
    for op in ArithmeticOp::ALL {
        registry.register(OperatorKind::Arithmetic(op).key(), Arc::new(ArithmeticImplementation));
    }
    for op in ComparisonOp::ALL {
        registry.register(OperatorKind::Comparison(op).key(), Arc::new(ComparisonImplementation));
    }
    for unit in CalendarUnit::ALL {
        registry.register(OperatorKind::Calendar(unit).key(), Arc::new(CalendarImplementation));
    }
    for op in UnaryOp::ALL {
        registry.register(OperatorKind::Unary(op).key(), Arc::new(UnaryImplementation));
    }
    registry
        .register(OperatorKind::Prefix.key(), Arc::new(PrefixImplementation))
        .register(OperatorKind::Lag.key(), Arc::new(LagImplementation))
        .register(OperatorKind::AddIndex.key(), Arc::new(SetIndexImplementation))
        .register(OperatorKind::SetIndex.key(), Arc::new(SetIndexImplementation))
        .register(OperatorKind::Join.key(), Arc::new(JoinImplementation))
        .register(OperatorKind::Timestamps.key(), Arc::new(TimestampsImplementation));
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dtype::DType;
    use crate::event_set::{event_set, FeatureArray, IndexData};
    use crate::graph::EventSetNode;
    use crate::operators;
    use crate::value::IndexKey;

    fn input_evset() -> EventSet {
        event_set(
            vec![1.0, 2.0, 3.0, 1.0],
            vec![
                ("k", FeatureArray::from(vec!["a", "a", "a", "b"])),
                ("v", FeatureArray::from(vec![1.0, 2.0, 3.0, 4.0])),
            ],
            &["k"],
        )
        .unwrap()
    }

    fn source() -> EventSetNode {
        EventSetNode::source((**input_evset().schema()).clone())
    }

    /// Returns copies of the input timestamps instead of the input buffers
    struct CopyingPrefix;

    impl OperatorImplementation for CopyingPrefix {
        fn execute(&self, operator: &Operator, inputs: &EventSets) -> Result<EventSets> {
            let input = &inputs["input"];
            let schema = operator.output_schema("output")?.clone();
            let mut output = EventSet::new(schema);
            for (key, data) in input.iter() {
                let copied: Arc<[f64]> = data.timestamps.iter().copied().collect();
                output.set_index_value(key.clone(), IndexData::new(copied, data.features.clone()));
            }
            Ok(BTreeMap::from([("output".to_string(), output)]))
        }
    }

    /// Drops the last index key, keeping buffers of the others
    struct DroppingPrefix;

    impl OperatorImplementation for DroppingPrefix {
        fn execute(&self, operator: &Operator, inputs: &EventSets) -> Result<EventSets> {
            let input = &inputs["input"];
            let schema = operator.output_schema("output")?.clone();
            let mut output = EventSet::new(schema);
            let last = input.keys().last().cloned();
            for (key, data) in input.iter() {
                if Some(key) != last.as_ref() {
                    output.set_index_value(key.clone(), data.clone());
                }
            }
            Ok(BTreeMap::from([("output".to_string(), output)]))
        }
    }

    fn inputs(evset: EventSet) -> EventSets {
        BTreeMap::from([("input".to_string(), evset)])
    }

    #[test]
    fn test_call_prefix() {
        let node = operators::prefix(&source(), "p_").unwrap();
        let operator = node.creator().unwrap().operator.clone();

        let config = EvaluationConfig::default();
        let outputs =
            call(&PrefixImplementation, &operator, &inputs(input_evset()), &config).unwrap();
        assert_eq!(outputs["output"].schema().feature_names(), vec!["p_v".to_string()]);
    }

    #[test]
    fn test_call_rejects_copied_timestamps() {
        let node = operators::prefix(&source(), "p_").unwrap();
        let operator = node.creator().unwrap().operator.clone();

        let config = EvaluationConfig::default();
        let err = call(&CopyingPrefix, &operator, &inputs(input_evset()), &config).unwrap_err();
        match err {
            Error::ContractViolation { operator, reason } => {
                assert_eq!(operator, "PREFIX");
                assert!(reason.contains("'input'"));
                assert!(reason.contains("not the same buffer"));
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn test_debug_mode_detects_missing_keys() {
        let node = operators::prefix(&source(), "p_").unwrap();
        let operator = node.creator().unwrap().operator.clone();

        let (fast, debug) = (EvaluationConfig::default(), EvaluationConfig::debug());
        assert!(call(&DroppingPrefix, &operator, &inputs(input_evset()), &fast).is_ok());
        let err = call(&DroppingPrefix, &operator, &inputs(input_evset()), &debug).unwrap_err();
        assert!(err.to_string().contains("found 1 different index keys"));
    }

    #[test]
    fn test_call_rejects_input_keys() {
        let node = operators::prefix(&source(), "p_").unwrap();
        let operator = node.creator().unwrap().operator.clone();
        let wrong = BTreeMap::from([("other".to_string(), input_evset())]);

        let config = EvaluationConfig::default();
        let err = call(&PrefixImplementation, &operator, &wrong, &config).unwrap_err();
        assert!(matches!(err, Error::ContractViolation { .. }));
        assert!(err.to_string().contains("Received"));
    }

    #[test]
    fn test_call_rejects_schema() {
        let node = operators::prefix(&source(), "p_").unwrap();
        let operator = node.creator().unwrap().operator.clone();
        let other =
            event_set(vec![1.0], vec![("v", FeatureArray::from(vec![1_i32]))], &[]).unwrap();

        let config = EvaluationConfig::default();
        let err = call(&PrefixImplementation, &operator, &inputs(other), &config).unwrap_err();
        assert!(matches!(err, Error::SchemaMismatch(_)));
    }

    #[test]
    fn test_call_rejects_feature_dtype() {
        let node = operators::prefix(&source(), "p_").unwrap();
        let operator = node.creator().unwrap().operator.clone();

        let mut bad = EventSet::new(Arc::new((**input_evset().schema()).clone()));
        bad.set_index_value(
            IndexKey::new(vec!["a".into()]),
            IndexData::new(vec![1.0].into(), vec![FeatureArray::from(vec![1_i64])]),
        );
        let config = EvaluationConfig::default();
        let err = call(&PrefixImplementation, &operator, &inputs(bad), &config).unwrap_err();
        assert!(err.to_string().contains("expected=float64 vs effective=int64"));
    }

    #[test]
    fn test_sampling_mismatch_without_keys() {
        let schema = Arc::new(Schema::from_pairs(&[("k", DType::Int64)], &[]).unwrap());
        let a = EventSet::new(schema.clone());
        let b = EventSet::new(schema);
        assert!(sampling_mismatch(&a, &b, ValidationMode::Fast).is_none());
        assert!(sampling_mismatch(&a, &b, ValidationMode::Debug).is_none());
    }

    #[test]
    fn test_sampling_mismatch_index_names() {
        let a = input_evset();
        let b = event_set(vec![1.0], vec![("v", FeatureArray::from(vec![1.0]))], &[]).unwrap();
        assert_eq!(
            sampling_mismatch(&a, &b, ValidationMode::Fast).unwrap(),
            "different index names"
        );
    }

    #[test]
    fn test_default_registry_covers_catalog() {
        let registry = default_registry();
        for kind in OperatorKind::all() {
            assert!(registry.contains(kind.key()), "{kind} not registered");
        }
    }
}
