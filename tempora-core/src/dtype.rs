//! Primitive data types of features and indexes

use std::any::TypeId;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::value::ScalarValue;

/// The type of a feature or index column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DType {
    /// 64-bit floating point
    Float64,

    /// 32-bit floating point
    Float32,

    /// 64-bit signed integer
    Int64,

    /// 32-bit signed integer
    Int32,

    /// UTF-8 string
    String,

    /// Boolean
    Boolean,
}

impl DType {
    /// Every dtype, in declaration order
    pub const ALL: [DType; 6] = [
        DType::Float64,
        DType::Float32,
        DType::Int64,
        DType::Int32,
        DType::String,
        DType::Boolean,
    ];

    /// Check if this is a floating point type
    pub fn is_float(&self) -> bool {
        matches!(self, DType::Float64 | DType::Float32)
    }

    /// Check if this is an integer type
    pub fn is_integer(&self) -> bool {
        matches!(self, DType::Int64 | DType::Int32)
    }

    /// Check if this is a float or integer type
    pub fn is_numeric(&self) -> bool {
        self.is_float() || self.is_integer()
    }

    /// Missing value used when a feature has no value for an event.
    ///
    /// NaN for floats, zero for integers and the empty string for strings.
    /// Booleans have no missing value.
    pub fn missing_value(&self) -> Result<ScalarValue> {
        match self {
            DType::Float64 => Ok(ScalarValue::Float64(f64::NAN)),
            DType::Float32 => Ok(ScalarValue::Float32(f32::NAN)),
            DType::Int64 => Ok(ScalarValue::Int64(0)),
            DType::Int32 => Ok(ScalarValue::Int32(0)),
            DType::String => Ok(ScalarValue::String(String::new())),
            DType::Boolean => Err(Error::Unsupported(format!(
                "No missing value defined for dtype {self}"
            ))),
        }
    }

    /// Map a native Rust scalar type to its dtype.
    ///
    /// Only `f64`, `f32`, `i64`, `i32`, `String`, `&str` and `bool` have a
    /// dtype; everything else fails.
    pub fn from_native_type<T: ?Sized + 'static>() -> Result<DType> {
        let id = TypeId::of::<T>();
        let dtype = if id == TypeId::of::<f64>() {
            DType::Float64
        } else if id == TypeId::of::<f32>() {
            DType::Float32
        } else if id == TypeId::of::<i64>() {
            DType::Int64
        } else if id == TypeId::of::<i32>() {
            DType::Int32
        } else if id == TypeId::of::<String>()
            || id == TypeId::of::<&'static str>()
            || id == TypeId::of::<str>()
        {
            DType::String
        } else if id == TypeId::of::<bool>() {
            DType::Boolean
        } else {
            return Err(Error::Unsupported(format!(
                "Non-implemented type {}",
                std::any::type_name::<T>()
            )));
        };
        Ok(dtype)
    }

    /// Name used in schemas and error messages
    pub fn name(&self) -> &'static str {
        match self {
            DType::Float64 => "float64",
            DType::Float32 => "float32",
            DType::Int64 => "int64",
            DType::Int32 => "int32",
            DType::String => "str_",
            DType::Boolean => "bool_",
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "float64" => Ok(DType::Float64),
            "float32" => Ok(DType::Float32),
            "int64" => Ok(DType::Int64),
            "int32" => Ok(DType::Int32),
            "str_" | "string" => Ok(DType::String),
            "bool_" | "boolean" => Ok(DType::Boolean),
            other => Err(Error::InvalidArgument(format!("Unknown dtype: {other}"))),
        }
    }
}

/// Native Rust scalar types with a static dtype
pub trait NativeType: 'static {
    /// The dtype of this native type
    const DTYPE: DType;
}

impl NativeType for f64 {
    const DTYPE: DType = DType::Float64;
}

impl NativeType for f32 {
    const DTYPE: DType = DType::Float32;
}

impl NativeType for i64 {
    const DTYPE: DType = DType::Int64;
}

impl NativeType for i32 {
    const DTYPE: DType = DType::Int32;
}

impl NativeType for String {
    const DTYPE: DType = DType::String;
}

impl NativeType for bool {
    const DTYPE: DType = DType::Boolean;
}

/// Check that `dtype` may be used by the index column `name`
pub fn check_is_valid_index_dtype(name: &str, dtype: DType) -> Result<()> {
    match dtype {
        DType::Int32 | DType::Int64 | DType::String => Ok(()),
        _ => Err(Error::InvalidIndexDType {
            name: name.to_string(),
            dtype,
        }),
    }
}
