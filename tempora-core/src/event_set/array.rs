//! Reference-counted typed feature arrays

use std::sync::Arc;

use crate::dtype::DType;
use crate::error::{Error, Result};
use crate::value::ScalarValue;

/// A shared timestamp buffer.
///
/// Two event sets share a sampling when, for each index key, they hold the
/// *same* buffer (`Arc::ptr_eq`), not merely equal values.
pub type Timestamps = Arc<[f64]>;

/// The values of one feature for one index key.
///
/// Cloning is cheap: the underlying buffer is shared.
#[derive(Debug, Clone)]
pub enum FeatureArray {
    /// 64-bit floats
    Float64(Arc<[f64]>),
    /// 32-bit floats
    Float32(Arc<[f32]>),
    /// 64-bit integers
    Int64(Arc<[i64]>),
    /// 32-bit integers
    Int32(Arc<[i32]>),
    /// Strings
    String(Arc<[String]>),
    /// Booleans
    Boolean(Arc<[bool]>),
}

/// Apply `$body` to the buffer of any variant
macro_rules! with_buffer {
    ($array:expr, $buf:ident => $body:expr) => {
        match $array {
            FeatureArray::Float64($buf) => $body,
            FeatureArray::Float32($buf) => $body,
            FeatureArray::Int64($buf) => $body,
            FeatureArray::Int32($buf) => $body,
            FeatureArray::String($buf) => $body,
            FeatureArray::Boolean($buf) => $body,
        }
    };
}

impl FeatureArray {
    /// Infer the dtype from the array's storage
    pub fn dtype(&self) -> DType {
        match self {
            FeatureArray::Float64(_) => DType::Float64,
            FeatureArray::Float32(_) => DType::Float32,
            FeatureArray::Int64(_) => DType::Int64,
            FeatureArray::Int32(_) => DType::Int32,
            FeatureArray::String(_) => DType::String,
            FeatureArray::Boolean(_) => DType::Boolean,
        }
    }

    /// Number of values
    pub fn len(&self) -> usize {
        with_buffer!(self, buf => buf.len())
    }

    /// Check if the array is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the value at `i`, if in bounds
    pub fn value(&self, i: usize) -> Option<ScalarValue> {
        match self {
            FeatureArray::Float64(buf) => buf.get(i).map(|v| ScalarValue::Float64(*v)),
            FeatureArray::Float32(buf) => buf.get(i).map(|v| ScalarValue::Float32(*v)),
            FeatureArray::Int64(buf) => buf.get(i).map(|v| ScalarValue::Int64(*v)),
            FeatureArray::Int32(buf) => buf.get(i).map(|v| ScalarValue::Int32(*v)),
            FeatureArray::String(buf) => buf.get(i).map(|v| ScalarValue::String(v.clone())),
            FeatureArray::Boolean(buf) => buf.get(i).map(|v| ScalarValue::Boolean(*v)),
        }
    }

    /// Check whether both arrays are the same underlying buffer
    pub fn ptr_eq(&self, other: &FeatureArray) -> bool {
        match (self, other) {
            (FeatureArray::Float64(a), FeatureArray::Float64(b)) => Arc::ptr_eq(a, b),
            (FeatureArray::Float32(a), FeatureArray::Float32(b)) => Arc::ptr_eq(a, b),
            (FeatureArray::Int64(a), FeatureArray::Int64(b)) => Arc::ptr_eq(a, b),
            (FeatureArray::Int32(a), FeatureArray::Int32(b)) => Arc::ptr_eq(a, b),
            (FeatureArray::String(a), FeatureArray::String(b)) => Arc::ptr_eq(a, b),
            (FeatureArray::Boolean(a), FeatureArray::Boolean(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Build an array of `dtype` from scalar values, checking every value
    pub fn from_values(dtype: DType, values: Vec<ScalarValue>) -> Result<Self> {
        fn collect<T>(
            dtype: DType,
            values: Vec<ScalarValue>,
            extract: impl Fn(ScalarValue) -> std::result::Result<T, ScalarValue>,
        ) -> Result<Arc<[T]>> {
            values
                .into_iter()
                .map(|v| {
                    extract(v).map_err(|v| {
                        Error::TypeMismatch(format!(
                            "Value {v} of dtype {} in a {dtype} array",
                            v.dtype()
                        ))
                    })
                })
                .collect()
        }

        let array = match dtype {
            DType::Float64 => FeatureArray::Float64(collect(dtype, values, |v| match v {
                ScalarValue::Float64(x) => Ok(x),
                other => Err(other),
            })?),
            DType::Float32 => FeatureArray::Float32(collect(dtype, values, |v| match v {
                ScalarValue::Float32(x) => Ok(x),
                other => Err(other),
            })?),
            DType::Int64 => FeatureArray::Int64(collect(dtype, values, |v| match v {
                ScalarValue::Int64(x) => Ok(x),
                other => Err(other),
            })?),
            DType::Int32 => FeatureArray::Int32(collect(dtype, values, |v| match v {
                ScalarValue::Int32(x) => Ok(x),
                other => Err(other),
            })?),
            DType::String => FeatureArray::String(collect(dtype, values, |v| match v {
                ScalarValue::String(x) => Ok(x),
                other => Err(other),
            })?),
            DType::Boolean => FeatureArray::Boolean(collect(dtype, values, |v| match v {
                ScalarValue::Boolean(x) => Ok(x),
                other => Err(other),
            })?),
        };
        Ok(array)
    }

    /// Iterate over the values as scalars
    pub fn iter(&self) -> impl Iterator<Item = ScalarValue> + '_ {
        (0..self.len()).filter_map(move |i| self.value(i))
    }
}

/// Value equality; NaN compares equal to NaN so results with missing values
/// can be compared.
impl PartialEq for FeatureArray {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (FeatureArray::Float64(a), FeatureArray::Float64(b)) => {
                a.len() == b.len()
                    && a.iter().zip(b.iter()).all(|(x, y)| x == y || (x.is_nan() && y.is_nan()))
            }
            (FeatureArray::Float32(a), FeatureArray::Float32(b)) => {
                a.len() == b.len()
                    && a.iter().zip(b.iter()).all(|(x, y)| x == y || (x.is_nan() && y.is_nan()))
            }
            (FeatureArray::Int64(a), FeatureArray::Int64(b)) => a == b,
            (FeatureArray::Int32(a), FeatureArray::Int32(b)) => a == b,
            (FeatureArray::String(a), FeatureArray::String(b)) => a == b,
            (FeatureArray::Boolean(a), FeatureArray::Boolean(b)) => a == b,
            _ => false,
        }
    }
}

impl From<Vec<f64>> for FeatureArray {
    fn from(values: Vec<f64>) -> Self {
        FeatureArray::Float64(values.into())
    }
}

impl From<Vec<f32>> for FeatureArray {
    fn from(values: Vec<f32>) -> Self {
        FeatureArray::Float32(values.into())
    }
}

impl From<Vec<i64>> for FeatureArray {
    fn from(values: Vec<i64>) -> Self {
        FeatureArray::Int64(values.into())
    }
}

impl From<Vec<i32>> for FeatureArray {
    fn from(values: Vec<i32>) -> Self {
        FeatureArray::Int32(values.into())
    }
}

impl From<Vec<bool>> for FeatureArray {
    fn from(values: Vec<bool>) -> Self {
        FeatureArray::Boolean(values.into())
    }
}

impl From<Vec<String>> for FeatureArray {
    fn from(values: Vec<String>) -> Self {
        FeatureArray::String(values.into())
    }
}

impl From<Vec<&str>> for FeatureArray {
    fn from(values: Vec<&str>) -> Self {
        FeatureArray::String(values.into_iter().map(str::to_string).collect())
    }
}
