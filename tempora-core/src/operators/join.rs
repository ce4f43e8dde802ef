//! Join operator

use std::collections::HashSet;

use crate::dtype::DType;
use crate::error::{Error, Result};
use crate::graph::{Attribute, EventSetNode, Operator, OutputSampling};
use crate::operators::OperatorKind;
use crate::schema::Schema;

/// The only supported join type
pub const LEFT_JOIN: &str = "left";

/// Join the features of `right` onto the events of `left`.
///
/// Each event of `left` takes the features of the first event of `right`
/// with the same index key and timestamp and, if `on` is set, the same value
/// of the int64 feature `on`. Events without a match get missing values. The
/// output keeps the sampling of `left` and its features are those of `left`
/// followed by those of `right` except `on`.
pub fn join(
    left: &EventSetNode,
    right: &EventSetNode,
    how: &str,
    on: Option<&str>,
) -> Result<EventSetNode> {
    let key = OperatorKind::Join.key();
    if how != LEFT_JOIN {
        return Err(Error::InvalidArgument(format!(
            "{key}: unsupported join type \"{how}\", only \"{LEFT_JOIN}\" is supported"
        )));
    }
    if left.same_sampling(right) {
        return Err(Error::InvalidArgument(format!(
            "{key}: both inputs have the same sampling, their features can be used together \
             without a join"
        )));
    }
    left.schema().check_compatible_index(right.schema())?;

    if let Some(on) = on {
        for (side, node) in [("left", left), ("right", right)] {
            let position = node.schema().feature_index(on)?;
            let dtype = node.schema().features()[position].dtype;
            if dtype != DType::Int64 {
                return Err(Error::TypeMismatch(format!(
                    "{key}: \"on\" feature \"{on}\" of the {side} input is {dtype}, expected {}",
                    DType::Int64
                )));
            }
        }
    }

    let left_names: HashSet<&str> =
        left.schema().features().iter().map(|f| f.name.as_str()).collect();
    let mut features = left.schema().features().to_vec();
    for field in right.schema().features() {
        if Some(field.name.as_str()) == on {
            continue;
        }
        if left_names.contains(field.name.as_str()) {
            return Err(Error::InvalidArgument(format!(
                "{key}: feature \"{}\" is defined in both inputs",
                field.name
            )));
        }
        field.dtype.missing_value()?;
        features.push(field.clone());
    }
    let output_schema = Schema::new(left.schema().indexes().to_vec(), features)?;

    let mut builder = Operator::builder(OperatorKind::Join)
        .input("left", left)
        .input("right", right)
        .attribute("how", Attribute::String(how.to_string()));
    if let Some(on) = on {
        builder = builder.attribute("on", Attribute::String(on.to_string()));
    }
    let operator = builder
        .output("output", output_schema, OutputSampling::SameAs("left"))?
        .build()?;
    operator.output("output")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operators::prefix;

    fn left() -> EventSetNode {
        let features = [("a", DType::Float64), ("id", DType::Int64)];
        EventSetNode::source(Schema::from_pairs(&[("x", DType::String)], &features).unwrap())
    }

    fn right() -> EventSetNode {
        let features = [("b", DType::Int32), ("id", DType::Int64)];
        EventSetNode::source(Schema::from_pairs(&[("x", DType::String)], &features).unwrap())
    }

    #[test]
    fn test_join_schema() {
        let (left, right) = (left(), prefix(&right(), "r_").unwrap());
        let out = join(&left, &right, "left", None).unwrap();

        assert_eq!(out.schema().index_names(), vec!["x".to_string()]);
        assert_eq!(
            out.schema().feature_names(),
            vec!["a".to_string(), "id".to_string(), "r_b".to_string(), "r_id".to_string()]
        );
        assert!(out.same_sampling(&left));
        assert!(out.creator().unwrap().operator.attributes().get("on").is_none());
    }

    #[test]
    fn test_join_on_drops_right_key() {
        let (left, right) = (left(), right());
        let out = join(&left, &right, "left", Some("id")).unwrap();

        assert_eq!(
            out.schema().feature_names(),
            vec!["a".to_string(), "id".to_string(), "b".to_string()]
        );
        let operator = &out.creator().unwrap().operator;
        assert_eq!(operator.attribute("on").unwrap().as_str().unwrap(), "id");
    }

    #[test]
    fn test_join_errors() {
        let (left, right) = (left(), right());
        assert!(matches!(
            join(&left, &right, "inner", Some("id")).unwrap_err(),
            Error::InvalidArgument(_)
        ));
        assert!(join(&left, &left, "left", None).is_err());
        // "id" is on both sides and not the join key.
        assert!(join(&left, &right, "left", None).is_err());
        assert!(join(&left, &right, "left", Some("zzz")).is_err());

        let float_on = EventSetNode::source(
            Schema::from_pairs(&[("x", DType::String)], &[("a", DType::Float64)]).unwrap(),
        );
        assert!(matches!(
            join(&left, &float_on, "left", Some("a")).unwrap_err(),
            Error::TypeMismatch(_)
        ));

        let other_index = EventSetNode::source(
            Schema::from_pairs(&[("y", DType::String)], &[("b", DType::Int32)]).unwrap(),
        );
        assert!(matches!(
            join(&left, &other_index, "left", None).unwrap_err(),
            Error::SchemaMismatch(_)
        ));
    }

    #[test]
    fn test_join_rejects_boolean_right_features() {
        let flags = EventSetNode::source(
            Schema::from_pairs(&[("x", DType::String)], &[("flag", DType::Boolean)]).unwrap(),
        );
        assert!(matches!(
            join(&left(), &flags, "left", None).unwrap_err(),
            Error::Unsupported(_)
        ));
    }
}
