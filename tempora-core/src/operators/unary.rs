//! Unary operators

use crate::dtype::DType;
use crate::error::{Error, Result};
use crate::graph::{EventSetNode, Operator, OutputSampling};
use crate::operators::{OperatorKind, UnaryOp};
use crate::schema::{Field, Schema};

/// Apply `op` to every feature of `input`.
///
/// Features keep their names; the output keeps the input sampling.
pub fn unary(op: UnaryOp, input: &EventSetNode) -> Result<EventSetNode> {
    let mut features = Vec::with_capacity(input.schema().num_features());
    for field in input.schema().features() {
        let (accepted, expected) = match op {
            UnaryOp::Abs => (field.dtype.is_numeric(), "numeric"),
            UnaryOp::Log | UnaryOp::IsNan | UnaryOp::NotNan => {
                (field.dtype.is_float(), "floating point")
            }
            UnaryOp::Invert => (field.dtype == DType::Boolean, "boolean"),
        };
        if !accepted {
            return Err(Error::TypeMismatch(format!(
                "{}: feature {} of type {} is not {expected}",
                op.key(),
                field.name,
                field.dtype
            )));
        }
        let dtype = match op {
            UnaryOp::IsNan | UnaryOp::NotNan => DType::Boolean,
            UnaryOp::Abs | UnaryOp::Log | UnaryOp::Invert => field.dtype,
        };
        features.push(Field::new(&field.name, dtype));
    }

    let schema = Schema::new(input.schema().indexes().to_vec(), features)?;
    let operator = Operator::builder(OperatorKind::Unary(op))
        .input("input", input)
        .output("output", schema, OutputSampling::SameAs("input"))?
        .build()?;
    operator.output("output")
}

/// Absolute value of numeric features
pub fn abs(input: &EventSetNode) -> Result<EventSetNode> {
    unary(UnaryOp::Abs, input)
}

/// Natural logarithm of float features
pub fn log(input: &EventSetNode) -> Result<EventSetNode> {
    unary(UnaryOp::Log, input)
}

/// Whether each value of float features is NaN
pub fn is_nan(input: &EventSetNode) -> Result<EventSetNode> {
    unary(UnaryOp::IsNan, input)
}

/// Whether each value of float features is not NaN
pub fn not_nan(input: &EventSetNode) -> Result<EventSetNode> {
    unary(UnaryOp::NotNan, input)
}

/// Logical negation of boolean features
pub fn invert(input: &EventSetNode) -> Result<EventSetNode> {
    unary(UnaryOp::Invert, input)
}
