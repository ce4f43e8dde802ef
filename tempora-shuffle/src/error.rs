//! Error types for distributed execution

use thiserror::Error;

/// Error type for distributed execution
#[derive(Error, Debug)]
pub enum Error {
    /// Core library error
    #[error("Core error: {0}")]
    Core(#[from] tempora_core::Error),

    /// Import or export error
    #[error("Reader error: {0}")]
    Readers(#[from] tempora_readers::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A pipeline invariant does not hold on the data
    #[error("Contract violation: {0}")]
    ContractViolation(String),

    /// Invalid argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The worker pool could not be started
    #[error("Runtime error: {0}")]
    Runtime(String),
}

/// Result type for distributed execution
pub type Result<T> = std::result::Result<T, Error>;
