//! Declarative operator definitions and attribute values

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Type of an operator attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttributeType {
    /// A string
    String,
    /// A 64-bit float
    Float64,
    /// A 64-bit integer
    Int64,
    /// A boolean
    Bool,
    /// A list of strings
    RepeatedString,
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AttributeType::String => "STRING",
            AttributeType::Float64 => "FLOAT_64",
            AttributeType::Int64 => "INTEGER_64",
            AttributeType::Bool => "BOOL",
            AttributeType::RepeatedString => "REPEATED_STRING",
        };
        f.write_str(name)
    }
}

/// A typed scalar operator parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Attribute {
    /// A string
    String(String),
    /// A 64-bit float
    Float64(f64),
    /// A 64-bit integer
    Int64(i64),
    /// A boolean
    Bool(bool),
    /// A list of strings
    RepeatedString(Vec<String>),
}

impl Attribute {
    /// Get the type of this attribute
    pub fn attribute_type(&self) -> AttributeType {
        match self {
            Attribute::String(_) => AttributeType::String,
            Attribute::Float64(_) => AttributeType::Float64,
            Attribute::Int64(_) => AttributeType::Int64,
            Attribute::Bool(_) => AttributeType::Bool,
            Attribute::RepeatedString(_) => AttributeType::RepeatedString,
        }
    }

    /// Get the value as a string
    pub fn as_str(&self) -> Result<&str> {
        match self {
            Attribute::String(v) => Ok(v),
            other => Err(wrong_type(other, AttributeType::String)),
        }
    }

    /// Get the value as a 64-bit float
    pub fn as_f64(&self) -> Result<f64> {
        match self {
            Attribute::Float64(v) => Ok(*v),
            other => Err(wrong_type(other, AttributeType::Float64)),
        }
    }

    /// Get the value as a boolean
    pub fn as_bool(&self) -> Result<bool> {
        match self {
            Attribute::Bool(v) => Ok(*v),
            other => Err(wrong_type(other, AttributeType::Bool)),
        }
    }

    /// Get the value as a list of strings
    pub fn as_strings(&self) -> Result<&[String]> {
        match self {
            Attribute::RepeatedString(v) => Ok(v),
            other => Err(wrong_type(other, AttributeType::RepeatedString)),
        }
    }
}

fn wrong_type(attribute: &Attribute, expected: AttributeType) -> Error {
    Error::InvalidArgument(format!(
        "Attribute has type {}, expected {expected}",
        attribute.attribute_type()
    ))
}

/// Declaration of one attribute of an operator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeDef {
    /// Attribute key
    pub key: String,

    /// Expected type
    #[serde(rename = "type")]
    pub attribute_type: AttributeType,

    /// Whether the attribute may be omitted
    pub is_optional: bool,
}

/// Declarative interface of an operator, as registered under its key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorDef {
    /// Globally unique operator key
    pub key: String,

    /// Attributes
    pub attributes: Vec<AttributeDef>,

    /// Input keys
    pub inputs: Vec<String>,

    /// Output keys
    pub outputs: Vec<String>,
}

impl OperatorDef {
    /// Create a definition without attributes
    pub fn new(key: &str, inputs: &[&str], outputs: &[&str]) -> Self {
        Self {
            key: key.to_string(),
            attributes: Vec::new(),
            inputs: inputs.iter().map(|s| (*s).to_string()).collect(),
            outputs: outputs.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    /// Add a required attribute
    pub fn with_attribute(mut self, key: &str, attribute_type: AttributeType) -> Self {
        self.attributes.push(AttributeDef {
            key: key.to_string(),
            attribute_type,
            is_optional: false,
        });
        self
    }

    /// Add an optional attribute
    pub fn with_optional_attribute(mut self, key: &str, attribute_type: AttributeType) -> Self {
        self.attributes.push(AttributeDef {
            key: key.to_string(),
            attribute_type,
            is_optional: true,
        });
        self
    }

    /// Export this definition as JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| Error::InvalidArgument(format!("Cannot export definition: {e}")))
    }
}
