//! Graph model, schemas and in-memory execution engine for temporal event sets
//!
//! This crate defines the data model shared by every backend: dtypes and
//! schemas, the operator graph (nodes, operators, samplings), and the
//! operator catalog. It also provides the in-memory backend: columnar event
//! sets, per-operator implementations, the validating dispatcher and graph
//! evaluation.

#![warn(missing_docs)]

pub mod config;
pub mod dtype;
pub mod error;
pub mod evaluation;
pub mod event_set;
pub mod graph;
pub mod implementation;
pub mod operators;
pub mod registry;
pub mod schema;
pub mod value;

// Re-export key types for convenience
pub use config::{EvaluationConfig, ValidationMode};
pub use dtype::{DType, NativeType};
pub use error::{Error, Result};
pub use evaluation::evaluate;
pub use event_set::{event_set, EventSet, EventSetBuilder, FeatureArray, IndexData, Timestamps};
pub use graph::{EventSetNode, NodeId, Operator, OperatorDef, SamplingId};
pub use implementation::{call, default_registry, OperatorImplementation};
pub use operators::OperatorKind;
pub use registry::Registry;
pub use schema::{Field, Schema};
pub use value::{IndexKey, IndexValue, ScalarValue};
