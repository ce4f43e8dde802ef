use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tempora_core::event_set::IndexData;
use tempora_core::implementation::{EventSets, ImplementationRegistry};
use tempora_core::operators;
use tempora_core::{
    default_registry, evaluate, event_set, DType, Error, EvaluationConfig, EventSet, EventSetNode,
    FeatureArray, IndexKey, Operator, OperatorImplementation, Result, Schema,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}

fn purchases() -> EventSet {
    event_set(
        vec![1_615_734_566.0, 1_615_734_600.0, 1_609_459_200.0, 1_612_137_600.0],
        vec![
            ("store", FeatureArray::from(vec!["north", "north", "south", "south"])),
            ("product", FeatureArray::from(vec![1_i64, 2, 1, 1])),
            ("price", FeatureArray::from(vec![10.0, 20.0, 5.0, 7.5])),
            ("cost", FeatureArray::from(vec![4.0, 8.0, 5.0, 2.5])),
        ],
        &["store"],
    )
    .unwrap()
}

#[test]
fn test_month_profit_by_product() {
    init_tracing();

    let evset = purchases();
    let source =
        EventSetNode::source_with_name((**evset.schema()).clone(), Some("purchases".to_string()));
    let by_product = operators::add_index(&source, &["product"]).unwrap();
    let month = operators::calendar_month(&by_product).unwrap();

    let registry = default_registry();
    let inputs = HashMap::from([(source.id(), evset)]);
    let config = EvaluationConfig::debug();
    let results = evaluate(&[by_product.clone(), month], &inputs, &registry, &config).unwrap();

    let indexed = &results[0];
    assert_eq!(indexed.schema().index_names(), vec!["store".to_string(), "product".to_string()]);
    assert_eq!(indexed.num_index_keys(), 3);

    let south = IndexKey::new(vec!["south".into(), 1_i64.into()]);
    let data = indexed.get(&south).unwrap();
    assert_eq!(&data.timestamps[..], &[1_609_459_200.0, 1_612_137_600.0]);
    assert_eq!(data.features[0], FeatureArray::from(vec![5.0, 7.5]));

    let months = results[1].get(&south).unwrap();
    assert_eq!(months.features[0], FeatureArray::from(vec![1_i32, 2]));
    assert!(Arc::ptr_eq(&months.timestamps, &data.timestamps));
}

/// A prefix implementation that reallocates timestamps, breaking sampling
/// identity while keeping the values
struct ReallocatingPrefix;

impl OperatorImplementation for ReallocatingPrefix {
    fn execute(&self, operator: &Operator, inputs: &EventSets) -> Result<EventSets> {
        let input = inputs.get("input").ok_or_else(|| Error::MissingInput("input".to_string()))?;
        let mut output = EventSet::new(operator.output_schema("output")?.clone());
        for (key, data) in input.iter() {
            let timestamps: Arc<[f64]> = data.timestamps.to_vec().into();
            output.set_index_value(key.clone(), IndexData::new(timestamps, data.features.clone()));
        }
        Ok(BTreeMap::from([("output".to_string(), output)]))
    }
}

#[test]
fn test_value_equal_timestamps_break_sampling() {
    init_tracing();

    let evset = purchases();
    let source = EventSetNode::source((**evset.schema()).clone());
    let prefixed = operators::prefix(&source, "p_").unwrap();

    let mut registry = default_registry();
    registry.register("PREFIX", Arc::new(ReallocatingPrefix));
    let inputs = HashMap::from([(source.id(), evset)]);

    let err = evaluate(&[prefixed], &inputs, &registry, &EvaluationConfig::default()).unwrap_err();
    match err {
        Error::ContractViolation { operator, reason } => {
            assert_eq!(operator, "PREFIX");
            assert!(reason.contains("timestamps at index key"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_divide_floats_end_to_end() {
    let evset = event_set(
        vec![1.0, 2.0],
        vec![
            ("x", FeatureArray::from(vec![1.0_f32, 3.0])),
            ("y", FeatureArray::from(vec![2.0_f32, 0.0])),
        ],
        &[],
    )
    .unwrap();
    let source = EventSetNode::source((**evset.schema()).clone());
    let swapped = operators::prefix(&source, "s_").unwrap();
    let ratio = operators::divide(&source, &swapped).unwrap();
    let nan = operators::is_nan(&ratio).unwrap();

    let inputs = HashMap::from([(source.id(), evset)]);
    let config = EvaluationConfig::default();
    let results = evaluate(&[ratio, nan], &inputs, &default_registry(), &config).unwrap();

    let data = results[0].get(&IndexKey::empty()).unwrap();
    assert_eq!(data.features[0], FeatureArray::from(vec![1.0_f32, 1.0]));
    assert_eq!(data.features[1], FeatureArray::from(vec![1.0_f32, f32::NAN]));

    let nan = results[1].get(&IndexKey::empty()).unwrap();
    assert_eq!(nan.features[1], FeatureArray::from(vec![false, true]));
}

#[test]
fn test_empty_registry_reports_key() {
    let source = EventSetNode::source(Schema::from_pairs(&[], &[("v", DType::Int32)]).unwrap());
    let node = operators::abs(&source).unwrap();
    let evset = event_set(vec![1.0], vec![("v", FeatureArray::from(vec![-3_i32]))], &[]).unwrap();
    let inputs = HashMap::from([(source.id(), evset)]);

    let config = EvaluationConfig::default();
    let err = evaluate(&[node], &inputs, &ImplementationRegistry::new(), &config).unwrap_err();
    assert!(err.to_string().contains("ABS"));
}

#[test]
fn test_join_discounts_on_product() {
    init_tracing();

    let evset = purchases();
    let discounts = event_set(
        vec![1_615_734_600.0, 1_615_734_566.0, 1_609_459_200.0],
        vec![
            ("store", FeatureArray::from(vec!["north", "north", "south"])),
            ("product", FeatureArray::from(vec![2_i64, 2, 1])),
            ("discount", FeatureArray::from(vec![0.5, 0.9, 0.25])),
        ],
        &["store"],
    )
    .unwrap();
    let source = EventSetNode::source((**evset.schema()).clone());
    let right = EventSetNode::source((**discounts.schema()).clone());
    let joined = operators::join(&source, &right, "left", Some("product")).unwrap();

    let inputs = HashMap::from([(source.id(), evset), (right.id(), discounts)]);
    let config = EvaluationConfig::debug();
    let results = evaluate(&[joined], &inputs, &default_registry(), &config).unwrap();

    let schema = results[0].schema();
    assert_eq!(schema.feature_names(), vec!["product", "price", "cost", "discount"]);
    let north = results[0].get(&IndexKey::new(vec!["north".into()])).unwrap();
    assert_eq!(north.features[3], FeatureArray::from(vec![f64::NAN, 0.5]));
    let south = results[0].get(&IndexKey::new(vec!["south".into()])).unwrap();
    assert_eq!(south.features[3], FeatureArray::from(vec![0.25, f64::NAN]));
}

#[test]
fn test_timestamps_after_set_index() {
    let evset = purchases();
    let source = EventSetNode::source((**evset.schema()).clone());
    let by_product = operators::set_index(&source, &["product"], false).unwrap();
    let stamps = operators::timestamps(&by_product).unwrap();

    let inputs = HashMap::from([(source.id(), evset)]);
    let config = EvaluationConfig::debug();
    let results = evaluate(&[by_product, stamps], &inputs, &default_registry(), &config).unwrap();

    assert_eq!(results[0].schema().index_names(), vec!["product".to_string()]);
    assert_eq!(results[0].schema().feature_names(), vec!["price", "cost"]);
    let first = results[0].get(&IndexKey::new(vec![1_i64.into()])).unwrap();
    assert_eq!(first.features[0], FeatureArray::from(vec![5.0, 7.5, 10.0]));

    let stamps = results[1].get(&IndexKey::new(vec![1_i64.into()])).unwrap();
    assert_eq!(
        stamps.features[0],
        FeatureArray::from(vec![1_609_459_200.0, 1_612_137_600.0, 1_615_734_566.0])
    );
    assert!(Arc::ptr_eq(&stamps.timestamps, &first.timestamps));
}
