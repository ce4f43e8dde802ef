//! Operator graph model
//!
//! Nodes are typed, immutable vertices; operators connect input nodes to the
//! output nodes they create. A node holds its creator, so the graph reachable
//! from a set of outputs is always acyclic.

pub mod definition;
pub mod node;
pub mod operator;
pub mod schedule;

pub use definition::{Attribute, AttributeDef, AttributeType, OperatorDef};
pub use node::{Creator, EventSetNode, NodeId, SamplingId};
pub use operator::{Operator, OperatorBuilder, OperatorId, OutputSampling, OutputSpec};
pub use schedule::{schedule, Schedule};
