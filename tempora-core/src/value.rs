//! Scalar values and index keys

use std::fmt;
use std::ops::Deref;

use serde::{Deserialize, Serialize};

use crate::dtype::DType;
use crate::error::{Error, Result};

/// A single typed value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScalarValue {
    /// 64-bit float
    Float64(f64),
    /// 32-bit float
    Float32(f32),
    /// 64-bit integer
    Int64(i64),
    /// 32-bit integer
    Int32(i32),
    /// String
    String(String),
    /// Boolean
    Boolean(bool),
}

impl ScalarValue {
    /// Get the dtype of this value
    pub fn dtype(&self) -> DType {
        match self {
            ScalarValue::Float64(_) => DType::Float64,
            ScalarValue::Float32(_) => DType::Float32,
            ScalarValue::Int64(_) => DType::Int64,
            ScalarValue::Int32(_) => DType::Int32,
            ScalarValue::String(_) => DType::String,
            ScalarValue::Boolean(_) => DType::Boolean,
        }
    }

    /// Parse a raw text value into `dtype`.
    ///
    /// Numeric parsing is strict: text that is not a number of the requested
    /// kind fails instead of being coerced.
    pub fn cast(raw: &str, dtype: DType) -> Result<Self> {
        let cast_error = || Error::Cast {
            value: raw.to_string(),
            dtype,
        };
        let trimmed = raw.trim();

        let value = match dtype {
            DType::Float64 => ScalarValue::Float64(trimmed.parse().map_err(|_| cast_error())?),
            DType::Float32 => ScalarValue::Float32(trimmed.parse().map_err(|_| cast_error())?),
            DType::Int64 => ScalarValue::Int64(trimmed.parse().map_err(|_| cast_error())?),
            DType::Int32 => ScalarValue::Int32(trimmed.parse().map_err(|_| cast_error())?),
            DType::String => ScalarValue::String(raw.to_string()),
            DType::Boolean => match trimmed.to_ascii_lowercase().as_str() {
                "true" | "1" => ScalarValue::Boolean(true),
                "false" | "0" => ScalarValue::Boolean(false),
                _ => return Err(cast_error()),
            },
        };
        Ok(value)
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Float64(v) => write!(f, "{v}"),
            ScalarValue::Float32(v) => write!(f, "{v}"),
            ScalarValue::Int64(v) => write!(f, "{v}"),
            ScalarValue::Int32(v) => write!(f, "{v}"),
            ScalarValue::String(v) => f.write_str(v),
            ScalarValue::Boolean(v) => write!(f, "{v}"),
        }
    }
}

/// A single index value.
///
/// Only integer and string values can index an event set, so index values are
/// always hashable and totally ordered.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IndexValue {
    /// 32-bit integer
    Int32(i32),
    /// 64-bit integer
    Int64(i64),
    /// String
    String(String),
}

impl IndexValue {
    /// Get the dtype of this value
    pub fn dtype(&self) -> DType {
        match self {
            IndexValue::Int32(_) => DType::Int32,
            IndexValue::Int64(_) => DType::Int64,
            IndexValue::String(_) => DType::String,
        }
    }

    /// Parse a raw text value into an index value of `dtype`
    pub fn cast(raw: &str, dtype: DType) -> Result<Self> {
        Self::try_from(ScalarValue::cast(raw, dtype)?)
    }
}

impl TryFrom<ScalarValue> for IndexValue {
    type Error = Error;

    fn try_from(value: ScalarValue) -> Result<Self> {
        match value {
            ScalarValue::Int32(v) => Ok(IndexValue::Int32(v)),
            ScalarValue::Int64(v) => Ok(IndexValue::Int64(v)),
            ScalarValue::String(v) => Ok(IndexValue::String(v)),
            other => Err(Error::TypeMismatch(format!(
                "Value {other} of dtype {} cannot be used as an index value",
                other.dtype()
            ))),
        }
    }
}

impl From<IndexValue> for ScalarValue {
    fn from(value: IndexValue) -> Self {
        match value {
            IndexValue::Int32(v) => ScalarValue::Int32(v),
            IndexValue::Int64(v) => ScalarValue::Int64(v),
            IndexValue::String(v) => ScalarValue::String(v),
        }
    }
}

impl From<&str> for IndexValue {
    fn from(value: &str) -> Self {
        IndexValue::String(value.to_string())
    }
}

impl From<i64> for IndexValue {
    fn from(value: i64) -> Self {
        IndexValue::Int64(value)
    }
}

impl From<i32> for IndexValue {
    fn from(value: i32) -> Self {
        IndexValue::Int32(value)
    }
}

impl fmt::Display for IndexValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexValue::Int32(v) => write!(f, "{v}"),
            IndexValue::Int64(v) => write!(f, "{v}"),
            IndexValue::String(v) => f.write_str(v),
        }
    }
}

/// The tuple of index values identifying one partition of an event set
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IndexKey(Vec<IndexValue>);

impl IndexKey {
    /// Create a key from its values
    pub fn new(values: Vec<IndexValue>) -> Self {
        Self(values)
    }

    /// The key of an event set without indexes
    pub fn empty() -> Self {
        Self(Vec::new())
    }

    /// Get the index values
    pub fn values(&self) -> &[IndexValue] {
        &self.0
    }

    /// Consume the key, returning its values
    pub fn into_values(self) -> Vec<IndexValue> {
        self.0
    }

    /// Return a new key with `extra` appended
    pub fn extended(&self, extra: impl IntoIterator<Item = IndexValue>) -> Self {
        let mut values = self.0.clone();
        values.extend(extra);
        Self(values)
    }
}

impl Deref for IndexKey {
    type Target = [IndexValue];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<IndexValue>> for IndexKey {
    fn from(values: Vec<IndexValue>) -> Self {
        Self(values)
    }
}

impl FromIterator<IndexValue> for IndexKey {
    fn from_iter<I: IntoIterator<Item = IndexValue>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for IndexKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, value) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{value}")?;
        }
        write!(f, ")")
    }
}
