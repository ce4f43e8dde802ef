//! In-memory arithmetic and comparison

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::event_set::{EventSet, FeatureArray, IndexData};
use crate::graph::Operator;
use crate::implementation::{input, EventSets, OperatorImplementation};
use crate::operators::{ArithmeticOp, ComparisonOp, OperatorKind, Resolution};

/// Numeric element kernels, with Python-style floor division and modulo
pub(crate) trait Numeric: Copy + PartialOrd {
    fn apply(op: ArithmeticOp, a: Self, b: Self) -> Result<Self>;
}

macro_rules! impl_float {
    ($t:ty) => {
        impl Numeric for $t {
            fn apply(op: ArithmeticOp, a: Self, b: Self) -> Result<Self> {
                Ok(match op {
                    ArithmeticOp::Add => a + b,
                    ArithmeticOp::Subtract => a - b,
                    ArithmeticOp::Multiply => a * b,
                    ArithmeticOp::Divide => a / b,
                    ArithmeticOp::FloorDiv => (a / b).floor(),
                    ArithmeticOp::Modulo => {
                        let r = a % b;
                        if r != 0.0 && (r < 0.0) != (b < 0.0) {
                            r + b
                        } else {
                            r
                        }
                    }
                    ArithmeticOp::Power => a.powf(b),
                })
            }
        }
    };
}

macro_rules! impl_integer {
    ($t:ty) => {
        impl Numeric for $t {
            fn apply(op: ArithmeticOp, a: Self, b: Self) -> Result<Self> {
                Ok(match op {
                    ArithmeticOp::Add => a.wrapping_add(b),
                    ArithmeticOp::Subtract => a.wrapping_sub(b),
                    ArithmeticOp::Multiply => a.wrapping_mul(b),
                    ArithmeticOp::Divide => {
                        return Err(Error::TypeMismatch(format!(
                            "Cannot divide values of type {}",
                            stringify!($t)
                        )))
                    }
                    // Division by zero yields zero
                    ArithmeticOp::FloorDiv => {
                        if b == 0 {
                            0
                        } else {
                            let q = a.wrapping_div(b);
                            if a.wrapping_rem(b) != 0 && ((a < 0) != (b < 0)) {
                                q - 1
                            } else {
                                q
                            }
                        }
                    }
                    ArithmeticOp::Modulo => {
                        if b == 0 {
                            0
                        } else {
                            let r = a.wrapping_rem(b);
                            if r != 0 && ((r < 0) != (b < 0)) {
                                r + b
                            } else {
                                r
                            }
                        }
                    }
                    ArithmeticOp::Power => {
                        let exponent = u32::try_from(b).map_err(|_| {
                            Error::InvalidArgument(format!(
                                "Integers to negative integer powers are not allowed: {a}^{b}"
                            ))
                        })?;
                        a.wrapping_pow(exponent)
                    }
                })
            }
        }
    };
}

impl_float!(f64);
impl_float!(f32);
impl_integer!(i64);
impl_integer!(i32);

fn zip_apply<T: Numeric>(op: ArithmeticOp, a: &[T], b: &[T]) -> Result<Arc<[T]>> {
    a.iter().zip(b.iter()).map(|(x, y)| T::apply(op, *x, *y)).collect()
}

fn zip_compare<T: PartialOrd>(op: ComparisonOp, a: &[T], b: &[T]) -> Arc<[bool]> {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| match op {
            ComparisonOp::Equal => x == y,
            ComparisonOp::NotEqual => x != y,
            ComparisonOp::Greater => x > y,
            ComparisonOp::GreaterEqual => x >= y,
            ComparisonOp::Less => x < y,
            ComparisonOp::LessEqual => x <= y,
        })
        .collect()
}

/// Arithmetic between two feature arrays of the same dtype
pub fn arithmetic_arrays(
    op: ArithmeticOp,
    a: &FeatureArray,
    b: &FeatureArray,
) -> Result<FeatureArray> {
    Ok(match (a, b) {
        (FeatureArray::Float64(a), FeatureArray::Float64(b)) => {
            FeatureArray::Float64(zip_apply(op, a, b)?)
        }
        (FeatureArray::Float32(a), FeatureArray::Float32(b)) => {
            FeatureArray::Float32(zip_apply(op, a, b)?)
        }
        (FeatureArray::Int64(a), FeatureArray::Int64(b)) => {
            FeatureArray::Int64(zip_apply(op, a, b)?)
        }
        (FeatureArray::Int32(a), FeatureArray::Int32(b)) => {
            FeatureArray::Int32(zip_apply(op, a, b)?)
        }
        (a, b) => {
            return Err(Error::TypeMismatch(format!(
                "Cannot apply {} to {} and {} arrays",
                op.key(),
                a.dtype(),
                b.dtype()
            )))
        }
    })
}

/// Comparison between two feature arrays of the same dtype
pub fn compare_arrays(
    op: ComparisonOp,
    a: &FeatureArray,
    b: &FeatureArray,
) -> Result<FeatureArray> {
    let values = match (a, b) {
        (FeatureArray::Float64(a), FeatureArray::Float64(b)) => zip_compare(op, a, b),
        (FeatureArray::Float32(a), FeatureArray::Float32(b)) => zip_compare(op, a, b),
        (FeatureArray::Int64(a), FeatureArray::Int64(b)) => zip_compare(op, a, b),
        (FeatureArray::Int32(a), FeatureArray::Int32(b)) => zip_compare(op, a, b),
        (FeatureArray::String(a), FeatureArray::String(b)) => zip_compare(op, a, b),
        (FeatureArray::Boolean(a), FeatureArray::Boolean(b)) => zip_compare(op, a, b),
        (a, b) => {
            return Err(Error::TypeMismatch(format!(
                "Cannot apply {} to {} and {} arrays",
                op.key(),
                a.dtype(),
                b.dtype()
            )))
        }
    };
    Ok(FeatureArray::Boolean(values))
}

/// Resolution of a binary operator, failing for unimplemented modes
pub fn resolution(operator: &Operator) -> Result<Resolution> {
    let resolution: Resolution = operator.attribute("resolution")?.as_str()?.parse()?;
    if resolution == Resolution::PerFeatureName {
        return Err(Error::Unsupported(format!(
            "{}: resolution {resolution} is not implemented",
            operator.key()
        )));
    }
    Ok(resolution)
}

/// Apply `kernel` to the paired features of both inputs, key by key.
///
/// The output reuses the timestamps of `input_1`.
fn execute_binary(
    operator: &Operator,
    inputs: &EventSets,
    kernel: impl Fn(&FeatureArray, &FeatureArray) -> Result<FeatureArray>,
) -> Result<EventSets> {
    resolution(operator)?;
    let input_1 = input(operator, inputs, "input_1")?;
    let input_2 = input(operator, inputs, "input_2")?;
    let schema = operator.output_schema("output")?.clone();

    let mut output = EventSet::new(schema);
    for (key, data_1) in input_1.iter() {
        let data_2 = input_2.get(key).ok_or_else(|| {
            Error::contract(
                operator.key(),
                format!("Index key {key} of \"input_1\" is missing in \"input_2\""),
            )
        })?;
        let features = data_1
            .features
            .iter()
            .zip(data_2.features.iter())
            .map(|(a, b)| kernel(a, b))
            .collect::<Result<Vec<_>>>()?;
        output.set_index_value(key.clone(), IndexData::new(data_1.timestamps.clone(), features));
    }
    Ok(BTreeMap::from([("output".to_string(), output)]))
}

/// In-memory arithmetic operators
#[derive(Debug, Default)]
pub struct ArithmeticImplementation;

impl OperatorImplementation for ArithmeticImplementation {
    fn execute(&self, operator: &Operator, inputs: &EventSets) -> Result<EventSets> {
        let OperatorKind::Arithmetic(op) = *operator.kind() else {
            return Err(Error::contract(operator.key(), "not an arithmetic operator"));
        };
        execute_binary(operator, inputs, |a, b| arithmetic_arrays(op, a, b))
    }
}

/// In-memory comparison operators
#[derive(Debug, Default)]
pub struct ComparisonImplementation;

impl OperatorImplementation for ComparisonImplementation {
    fn execute(&self, operator: &Operator, inputs: &EventSets) -> Result<EventSets> {
        let OperatorKind::Comparison(op) = *operator.kind() else {
            return Err(Error::contract(operator.key(), "not a comparison operator"));
        };
        execute_binary(operator, inputs, |a, b| compare_arrays(op, a, b))
    }
}
