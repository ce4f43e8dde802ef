//! Error types for graph construction and evaluation

use std::io;
use thiserror::Error;

use crate::dtype::DType;

/// Result type for tempora operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for graph construction and evaluation
#[derive(Error, Debug)]
pub enum Error {
    /// IO error during file operations
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// A realized event set does not match its declared schema
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    /// An operator interface or sampling contract was broken
    #[error("Contract violation in operator {operator}: {reason}")]
    ContractViolation {
        /// Key of the offending operator
        operator: String,
        /// What was violated
        reason: String,
    },

    /// A dtype rule was violated while deriving an operator output
    #[error("Data type mismatch: {0}")]
    TypeMismatch(String),

    /// A raw value cannot be represented in the requested dtype
    #[error("Cannot cast {value:?} to {dtype}")]
    Cast {
        /// Raw value
        value: String,
        /// Target dtype
        dtype: DType,
    },

    /// An index column was declared with a dtype that cannot be an index
    #[error(
        "Trying to create an index \"{name}\" with dtype={dtype}. \
         The dtype of an index can only be int32, int64 or str_."
    )]
    InvalidIndexDType {
        /// Name of the index column
        name: String,
        /// Offending dtype
        dtype: DType,
    },

    /// A declared code path has no implementation
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// Invalid argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A source node required by the evaluation was not fed
    #[error("Missing input: {0}")]
    MissingInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),
}

impl Error {
    /// Build a contract violation attributed to `operator`
    pub fn contract(operator: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::ContractViolation {
            operator: operator.into(),
            reason: reason.into(),
        }
    }
}
