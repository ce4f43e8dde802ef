//! Index-changing operators

use std::collections::HashSet;

use crate::error::{Error, Result};
use crate::graph::{Attribute, EventSetNode, Operator, OutputSampling};
use crate::operators::OperatorKind;
use crate::schema::Schema;

/// Schema of `input` once the features in `names` are moved into the index
fn reindexed_schema(key: &str, input: &Schema, names: &[&str], append: bool) -> Result<Schema> {
    if names.is_empty() {
        return Err(Error::InvalidArgument(format!(
            "{key}: at least one feature is required"
        )));
    }

    let mut seen = HashSet::new();
    let mut new_indexes = if append {
        input.indexes().to_vec()
    } else {
        Vec::new()
    };
    for name in names {
        if !seen.insert(*name) {
            return Err(Error::InvalidArgument(format!(
                "{key}: feature \"{name}\" is listed twice"
            )));
        }
        let position = input.feature_index(name)?;
        new_indexes.push(input.features()[position].clone());
    }
    let features = input
        .features()
        .iter()
        .filter(|f| !seen.contains(f.name.as_str()))
        .cloned()
        .collect();

    Schema::new(new_indexes, features)
}

fn repeated(names: &[&str]) -> Attribute {
    Attribute::RepeatedString(names.iter().map(|s| (*s).to_string()).collect())
}

/// Move the features named in `indexes` to the end of the index.
///
/// Remaining features keep their order. Events are regrouped by the extended
/// key, so the output gets a new sampling.
pub fn add_index(input: &EventSetNode, indexes: &[&str]) -> Result<EventSetNode> {
    let kind = OperatorKind::AddIndex;
    let output_schema = reindexed_schema(kind.key(), input.schema(), indexes, true)?;
    let operator = Operator::builder(kind)
        .input("input", input)
        .attribute("indexes", repeated(indexes))
        .output("output", output_schema, OutputSampling::New)?
        .build()?;
    operator.output("output")
}

/// Index `input` by the features named in `feature_names`.
///
/// With `append` the features are added after the current index, as
/// [`add_index`] does. Without it they replace the current index, whose
/// columns are dropped, and events of different input keys may end up under
/// the same output key.
pub fn set_index(
    input: &EventSetNode,
    feature_names: &[&str],
    append: bool,
) -> Result<EventSetNode> {
    let kind = OperatorKind::SetIndex;
    let output_schema = reindexed_schema(kind.key(), input.schema(), feature_names, append)?;
    let operator = Operator::builder(kind)
        .input("input", input)
        .attribute("feature_names", repeated(feature_names))
        .attribute("append", Attribute::Bool(append))
        .output("output", output_schema, OutputSampling::New)?
        .build()?;
    operator.output("output")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dtype::DType;

    fn source() -> EventSetNode {
        EventSetNode::source(
            Schema::from_pairs(
                &[("b", DType::Int64)],
                &[("a", DType::String), ("c", DType::Int64), ("d", DType::Float64)],
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_add_index_moves_features() {
        let input = source();
        let out = add_index(&input, &["a"]).unwrap();

        assert_eq!(out.schema().index_names(), vec!["b".to_string(), "a".to_string()]);
        assert_eq!(out.schema().feature_names(), vec!["c".to_string(), "d".to_string()]);
        assert!(!out.same_sampling(&input));
    }

    #[test]
    fn test_add_index_errors() {
        let input = source();
        assert!(add_index(&input, &[]).is_err());
        assert!(add_index(&input, &["a", "a"]).is_err());
        assert!(add_index(&input, &["zzz"]).is_err());
        assert!(matches!(
            add_index(&input, &["d"]).unwrap_err(),
            Error::InvalidIndexDType { .. }
        ));
    }

    #[test]
    fn test_set_index_replaces_index() {
        let input = source();
        let out = set_index(&input, &["c", "a"], false).unwrap();

        assert_eq!(out.schema().index_names(), vec!["c".to_string(), "a".to_string()]);
        assert_eq!(out.schema().feature_names(), vec!["d".to_string()]);

        let operator = &out.creator().unwrap().operator;
        assert_eq!(operator.key(), "SET_INDEX");
        assert!(!operator.attribute("append").unwrap().as_bool().unwrap());
    }

    #[test]
    fn test_set_index_append() {
        let out = set_index(&source(), &["a"], true).unwrap();
        assert_eq!(out.schema().index_names(), vec!["b".to_string(), "a".to_string()]);
        assert!(out.creator().unwrap().operator.attribute("append").unwrap().as_bool().unwrap());
    }

    #[test]
    fn test_set_index_errors() {
        let input = source();
        assert!(set_index(&input, &[], false).is_err());
        assert!(set_index(&input, &["c", "c"], false).is_err());
        assert!(set_index(&input, &["b"], false).is_err());
        assert!(matches!(
            set_index(&input, &["d"], false).unwrap_err(),
            Error::InvalidIndexDType { .. }
        ));
    }
}
