//! Prefix operator

use crate::error::Result;
use crate::graph::{Attribute, EventSetNode, Operator, OutputSampling};
use crate::operators::OperatorKind;
use crate::schema::{Field, Schema};

/// Prepend `prefix` to the name of every feature.
///
/// The output keeps the input sampling and, once evaluated, the input's
/// feature buffers.
pub fn prefix(input: &EventSetNode, prefix: &str) -> Result<EventSetNode> {
    let features = input
        .schema()
        .features()
        .iter()
        .map(|f| Field::new(&format!("{prefix}{}", f.name), f.dtype))
        .collect();
    let schema = Schema::new(input.schema().indexes().to_vec(), features)?;

    let operator = Operator::builder(OperatorKind::Prefix)
        .input("input", input)
        .attribute("prefix", Attribute::String(prefix.to_string()))
        .output("output", schema, OutputSampling::SameAs("input"))?
        .build()?;
    operator.output("output")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dtype::DType;

    #[test]
    fn test_prefix_renames_features() {
        let features = [("a", DType::Float64), ("b", DType::Int32)];
        let input =
            EventSetNode::source(Schema::from_pairs(&[("k", DType::String)], &features).unwrap());
        let out = prefix(&input, "lag_").unwrap();

        assert_eq!(out.schema().feature_names(), vec!["lag_a".to_string(), "lag_b".to_string()]);
        assert_eq!(out.schema().features()[1].dtype, DType::Int32);
        assert!(out.same_sampling(&input));

        let operator = &out.creator().unwrap().operator;
        assert_eq!(operator.attribute("prefix").unwrap().as_str().unwrap(), "lag_");
        assert_eq!(
            operator.matching_io_samplings(),
            &[("input".to_string(), "output".to_string())]
        );
    }

    #[test]
    fn test_prefix_collision_with_index() {
        let schema =
            Schema::from_pairs(&[("p_a", DType::String)], &[("a", DType::Float64)]).unwrap();
        let input = EventSetNode::source(schema);
        assert!(prefix(&input, "p_").is_err());
    }
}
