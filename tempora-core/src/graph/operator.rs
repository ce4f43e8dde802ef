//! Operators: the vertices connecting graph nodes

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use uuid::Uuid;

use crate::error::{Error, Result};
use crate::graph::definition::Attribute;
use crate::graph::node::{Creator, EventSetNode, NodeId, SamplingId};
use crate::operators::OperatorKind;
use crate::schema::Schema;

/// Unique identifier of an operator instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OperatorId(Uuid);

/// Declared shape of one operator output
#[derive(Debug, Clone)]
pub struct OutputSpec {
    /// Id of the node standing for this output
    pub id: NodeId,

    /// Schema of the output
    pub schema: Arc<Schema>,

    /// Sampling of the output
    pub sampling: SamplingId,
}

/// Sampling of an output being declared
#[derive(Debug, Clone, Copy)]
pub enum OutputSampling {
    /// Reuse the sampling of the named input
    SameAs(&'static str),
    /// Allocate a fresh sampling
    New,
}

/// An operator instance in the graph
#[derive(Debug)]
pub struct Operator {
    id: OperatorId,
    kind: OperatorKind,
    attributes: BTreeMap<String, Attribute>,
    inputs: BTreeMap<String, EventSetNode>,
    outputs: BTreeMap<String, OutputSpec>,
    same_sampling: Vec<(String, String)>,
}

impl Operator {
    /// Start building an operator of `kind`
    pub fn builder(kind: OperatorKind) -> OperatorBuilder {
        OperatorBuilder {
            kind,
            attributes: BTreeMap::new(),
            inputs: BTreeMap::new(),
            outputs: BTreeMap::new(),
            same_sampling: Vec::new(),
        }
    }

    /// Get the operator id
    pub fn id(&self) -> OperatorId {
        self.id
    }

    /// Get the operator kind
    pub fn kind(&self) -> &OperatorKind {
        &self.kind
    }

    /// Get the registry key of this operator
    pub fn key(&self) -> &'static str {
        self.kind.key()
    }

    /// Get the attributes
    pub fn attributes(&self) -> &BTreeMap<String, Attribute> {
        &self.attributes
    }

    /// Get one attribute
    pub fn attribute(&self, key: &str) -> Result<&Attribute> {
        self.attributes.get(key).ok_or_else(|| {
            Error::InvalidArgument(format!("Operator {} has no attribute \"{key}\"", self.key()))
        })
    }

    /// Get the input nodes
    pub fn inputs(&self) -> &BTreeMap<String, EventSetNode> {
        &self.inputs
    }

    /// Get the declared outputs
    pub fn outputs(&self) -> &BTreeMap<String, OutputSpec> {
        &self.outputs
    }

    /// Get the schema of one output
    pub fn output_schema(&self, key: &str) -> Result<&Arc<Schema>> {
        self.outputs
            .get(key)
            .map(|spec| &spec.schema)
            .ok_or_else(|| self.no_output(key))
    }

    fn no_output(&self, key: &str) -> Error {
        Error::InvalidArgument(format!("Operator {} has no output \"{key}\"", self.key()))
    }

    /// The `(input, output)` pairs required to share a sampling
    pub fn matching_io_samplings(&self) -> &[(String, String)] {
        &self.same_sampling
    }

    /// Get the node standing for one output
    pub fn output(self: &Arc<Self>, key: &str) -> Result<EventSetNode> {
        let spec = self.outputs.get(key).ok_or_else(|| self.no_output(key))?;
        Ok(EventSetNode::from_output(
            spec.id,
            spec.schema.clone(),
            spec.sampling,
            Creator {
                operator: self.clone(),
                output: key.to_string(),
            },
        ))
    }

    /// Self-validation against the operator definition.
    ///
    /// Checks input/output keys, attribute presence and types, and that
    /// declared same-sampling pairs name existing inputs/outputs that indeed
    /// share a sampling.
    pub fn check(&self) -> Result<()> {
        let definition = self.kind.definition();
        let key = self.key();

        let expected_inputs: BTreeSet<&str> =
            definition.inputs.iter().map(String::as_str).collect();
        let actual_inputs: BTreeSet<&str> = self.inputs.keys().map(String::as_str).collect();
        if expected_inputs != actual_inputs {
            return Err(Error::contract(
                key,
                format!("Inputs {actual_inputs:?} do not match the definition {expected_inputs:?}"),
            ));
        }

        let expected_outputs: BTreeSet<&str> =
            definition.outputs.iter().map(String::as_str).collect();
        let actual_outputs: BTreeSet<&str> = self.outputs.keys().map(String::as_str).collect();
        if expected_outputs != actual_outputs {
            return Err(Error::contract(
                key,
                format!(
                    "Outputs {actual_outputs:?} do not match the definition {expected_outputs:?}"
                ),
            ));
        }

        for attribute_def in &definition.attributes {
            match self.attributes.get(&attribute_def.key) {
                Some(value) if value.attribute_type() != attribute_def.attribute_type => {
                    return Err(Error::contract(
                        key,
                        format!(
                            "Attribute \"{}\" has type {}, expected {}",
                            attribute_def.key,
                            value.attribute_type(),
                            attribute_def.attribute_type
                        ),
                    ));
                }
                None if !attribute_def.is_optional => {
                    return Err(Error::contract(
                        key,
                        format!("Missing attribute \"{}\"", attribute_def.key),
                    ));
                }
                _ => {}
            }
        }
        for attribute in self.attributes.keys() {
            if !definition.attributes.iter().any(|a| &a.key == attribute) {
                return Err(Error::contract(key, format!("Unexpected attribute \"{attribute}\"")));
            }
        }

        for (input, output) in &self.same_sampling {
            let input_node = self.inputs.get(input).ok_or_else(|| {
                Error::contract(key, format!("Same-sampling pair names unknown input \"{input}\""))
            })?;
            let output_spec = self.outputs.get(output).ok_or_else(|| {
                Error::contract(
                    key,
                    format!("Same-sampling pair names unknown output \"{output}\""),
                )
            })?;
            if input_node.sampling() != output_spec.sampling {
                return Err(Error::contract(
                    key,
                    format!(
                        "Input \"{input}\" and output \"{output}\" are declared with the same \
                         sampling but are not"
                    ),
                ));
            }
        }

        Ok(())
    }
}

/// Collects the inputs, attributes and outputs of an operator under
/// construction
#[derive(Debug)]
pub struct OperatorBuilder {
    kind: OperatorKind,
    attributes: BTreeMap<String, Attribute>,
    inputs: BTreeMap<String, EventSetNode>,
    outputs: BTreeMap<String, OutputSpec>,
    same_sampling: Vec<(String, String)>,
}

impl OperatorBuilder {
    /// Register a named input
    pub fn input(mut self, key: &str, node: &EventSetNode) -> Self {
        self.inputs.insert(key.to_string(), node.clone());
        self
    }

    /// Register a named attribute
    pub fn attribute(mut self, key: &str, value: Attribute) -> Self {
        self.attributes.insert(key.to_string(), value);
        self
    }

    /// Register a named output.
    ///
    /// With [`OutputSampling::SameAs`] the output reuses the input's sampling
    /// and the `(input, output)` pair is declared as same-sampling.
    pub fn output(mut self, key: &str, schema: Schema, sampling: OutputSampling) -> Result<Self> {
        let sampling = match sampling {
            OutputSampling::New => SamplingId::new(),
            OutputSampling::SameAs(input) => {
                let node = self.inputs.get(input).ok_or_else(|| {
                    Error::contract(
                        self.kind.key(),
                        format!("Output \"{key}\" refers to unknown input \"{input}\""),
                    )
                })?;
                self.same_sampling.push((input.to_string(), key.to_string()));
                node.sampling()
            }
        };
        self.outputs.insert(
            key.to_string(),
            OutputSpec {
                id: NodeId::new(),
                schema: Arc::new(schema),
                sampling,
            },
        );
        Ok(self)
    }

    /// Declare that `input` and `output` share a sampling
    pub fn same_sampling(mut self, input: &str, output: &str) -> Self {
        self.same_sampling.push((input.to_string(), output.to_string()));
        self
    }

    /// Finish the operator, running [`Operator::check`]
    pub fn build(self) -> Result<Arc<Operator>> {
        let operator = Operator {
            id: OperatorId(Uuid::new_v4()),
            kind: self.kind,
            attributes: self.attributes,
            inputs: self.inputs,
            outputs: self.outputs,
            same_sampling: self.same_sampling,
        };
        operator.check()?;
        Ok(Arc::new(operator))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dtype::DType;

    fn source() -> EventSetNode {
        EventSetNode::source(Schema::from_pairs(&[], &[("a", DType::Float64)]).unwrap())
    }

    fn prefix_operator(
        input_key: &str,
        attribute: Option<(&str, Attribute)>,
    ) -> Result<Arc<Operator>> {
        let input = source();
        let mut builder = Operator::builder(OperatorKind::Prefix).input(input_key, &input);
        if let Some((key, value)) = attribute {
            builder = builder.attribute(key, value);
        }
        builder
            .output("output", (**input.schema()).clone(), OutputSampling::New)?
            .build()
    }

    fn reason(result: Result<Arc<Operator>>) -> String {
        match result {
            Err(Error::ContractViolation { operator, reason }) => {
                assert_eq!(operator, "PREFIX");
                reason
            }
            other => panic!("expected a contract violation, got {other:?}"),
        }
    }

    #[test]
    fn test_check_accepts_valid_operator() {
        let operator =
            prefix_operator("input", Some(("prefix", Attribute::String("p_".into())))).unwrap();
        assert_eq!(operator.attribute("prefix").unwrap().as_str().unwrap(), "p_");
        assert!(operator.matching_io_samplings().is_empty());
    }

    #[test]
    fn test_check_rejects_missing_attribute() {
        assert!(reason(prefix_operator("input", None)).contains("Missing attribute \"prefix\""));
    }

    #[test]
    fn test_check_rejects_attribute_type() {
        let reason = reason(prefix_operator("input", Some(("prefix", Attribute::Float64(1.0)))));
        assert!(reason.contains("Attribute \"prefix\""));
    }

    #[test]
    fn test_check_rejects_unknown_input() {
        let prefix = Some(("prefix", Attribute::String("p_".into())));
        let reason = reason(prefix_operator("source", prefix));
        assert!(reason.contains("do not match the definition"));
    }

    #[test]
    fn test_output_refers_to_unknown_input() {
        let err = Operator::builder(OperatorKind::Prefix)
            .output(
                "output",
                Schema::from_pairs(&[], &[]).unwrap(),
                OutputSampling::SameAs("input"),
            )
            .unwrap_err();
        assert!(matches!(err, Error::ContractViolation { .. }));
    }
}
