//! Binary arithmetic and comparison operators

use crate::dtype::DType;
use crate::error::{Error, Result};
use crate::graph::{Attribute, EventSetNode, Operator, OutputSampling};
use crate::operators::{ArithmeticOp, ComparisonOp, OperatorKind, Resolution};
use crate::schema::{Field, Schema};

/// Build a binary operator of `kind` over two nodes sharing a sampling.
///
/// Both inputs need the same index, the same number of features and the
/// same dtype at each feature position. Output feature `i` is named
/// `{prefix}_{a}_{b}` after the paired input features.
fn binary(
    kind: OperatorKind,
    prefix: &str,
    input_1: &EventSetNode,
    input_2: &EventSetNode,
    resolution: Resolution,
    output_dtype: impl Fn(DType) -> DType,
) -> Result<EventSetNode> {
    let key = kind.key();
    if !input_1.same_sampling(input_2) {
        return Err(Error::contract(
            key,
            "Arguments \"input_1\" and \"input_2\" should have the same sampling",
        ));
    }

    let schema_1 = input_1.schema();
    let schema_2 = input_2.schema();
    schema_1.check_compatible_index(schema_2)?;

    if schema_1.num_features() != schema_2.num_features() {
        return Err(Error::TypeMismatch(format!(
            "{key}: \"input_1\" has {} features and \"input_2\" has {}; both must have the \
             same number of features",
            schema_1.num_features(),
            schema_2.num_features()
        )));
    }

    let mut features = Vec::with_capacity(schema_1.num_features());
    for (f1, f2) in schema_1.features().iter().zip(schema_2.features()) {
        if f1.dtype != f2.dtype {
            return Err(Error::TypeMismatch(format!(
                "{key}: feature \"{}\" is {} but feature \"{}\" at the same position is {}",
                f1.name, f1.dtype, f2.name, f2.dtype
            )));
        }
        let name = format!("{prefix}_{}_{}", f1.name, f2.name);
        features.push(Field::new(&name, output_dtype(f1.dtype)));
    }

    let schema = Schema::new(schema_1.indexes().to_vec(), features)?;
    let operator = Operator::builder(kind)
        .input("input_1", input_1)
        .input("input_2", input_2)
        .attribute("resolution", Attribute::String(resolution.as_str().to_string()))
        .output("output", schema, OutputSampling::SameAs("input_1"))?
        .same_sampling("input_2", "output")
        .build()?;
    operator.output("output")
}

/// Feature-wise arithmetic between two nodes
pub fn arithmetic(
    op: ArithmeticOp,
    input_1: &EventSetNode,
    input_2: &EventSetNode,
    resolution: Resolution,
) -> Result<EventSetNode> {
    for field in input_1.schema().features() {
        if !field.dtype.is_numeric() {
            return Err(Error::TypeMismatch(format!(
                "Cannot use the {} operator on feature {} of type {}",
                op.prefix(),
                field.name,
                field.dtype
            )));
        }
        if op == ArithmeticOp::Divide && field.dtype.is_integer() {
            return Err(Error::TypeMismatch(format!(
                "Cannot use the divide operator on feature {} of type {}. Cast to a floating \
                 point type or use floordiv operator (//) instead, on these integer types.",
                field.name, field.dtype
            )));
        }
    }
    binary(OperatorKind::Arithmetic(op), op.prefix(), input_1, input_2, resolution, |dtype| dtype)
}

/// Feature-wise comparison between two nodes; outputs are boolean
pub fn compare(
    op: ComparisonOp,
    input_1: &EventSetNode,
    input_2: &EventSetNode,
    resolution: Resolution,
) -> Result<EventSetNode> {
    binary(OperatorKind::Comparison(op), op.prefix(), input_1, input_2, resolution, |_| {
        DType::Boolean
    })
}

/// `input_1 + input_2`
pub fn add(input_1: &EventSetNode, input_2: &EventSetNode) -> Result<EventSetNode> {
    arithmetic(ArithmeticOp::Add, input_1, input_2, Resolution::default())
}

/// `input_1 - input_2`
pub fn subtract(input_1: &EventSetNode, input_2: &EventSetNode) -> Result<EventSetNode> {
    arithmetic(ArithmeticOp::Subtract, input_1, input_2, Resolution::default())
}

/// `input_1 * input_2`
pub fn multiply(input_1: &EventSetNode, input_2: &EventSetNode) -> Result<EventSetNode> {
    arithmetic(ArithmeticOp::Multiply, input_1, input_2, Resolution::default())
}

/// `input_1 / input_2`, float features only
pub fn divide(input_1: &EventSetNode, input_2: &EventSetNode) -> Result<EventSetNode> {
    arithmetic(ArithmeticOp::Divide, input_1, input_2, Resolution::default())
}

/// `floor(input_1 / input_2)`
pub fn floordiv(input_1: &EventSetNode, input_2: &EventSetNode) -> Result<EventSetNode> {
    arithmetic(ArithmeticOp::FloorDiv, input_1, input_2, Resolution::default())
}

/// `input_1 mod input_2`
pub fn modulo(input_1: &EventSetNode, input_2: &EventSetNode) -> Result<EventSetNode> {
    arithmetic(ArithmeticOp::Modulo, input_1, input_2, Resolution::default())
}

/// `input_1 ^ input_2`
pub fn power(input_1: &EventSetNode, input_2: &EventSetNode) -> Result<EventSetNode> {
    arithmetic(ArithmeticOp::Power, input_1, input_2, Resolution::default())
}

/// `input_1 == input_2`
pub fn equal(input_1: &EventSetNode, input_2: &EventSetNode) -> Result<EventSetNode> {
    compare(ComparisonOp::Equal, input_1, input_2, Resolution::default())
}

/// `input_1 != input_2`
pub fn not_equal(input_1: &EventSetNode, input_2: &EventSetNode) -> Result<EventSetNode> {
    compare(ComparisonOp::NotEqual, input_1, input_2, Resolution::default())
}

/// `input_1 > input_2`
pub fn greater(input_1: &EventSetNode, input_2: &EventSetNode) -> Result<EventSetNode> {
    compare(ComparisonOp::Greater, input_1, input_2, Resolution::default())
}

/// `input_1 >= input_2`
pub fn greater_equal(input_1: &EventSetNode, input_2: &EventSetNode) -> Result<EventSetNode> {
    compare(ComparisonOp::GreaterEqual, input_1, input_2, Resolution::default())
}

/// `input_1 < input_2`
pub fn less(input_1: &EventSetNode, input_2: &EventSetNode) -> Result<EventSetNode> {
    compare(ComparisonOp::Less, input_1, input_2, Resolution::default())
}

/// `input_1 <= input_2`
pub fn less_equal(input_1: &EventSetNode, input_2: &EventSetNode) -> Result<EventSetNode> {
    compare(ComparisonOp::LessEqual, input_1, input_2, Resolution::default())
}
