//! Graph nodes

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::graph::operator::Operator;
use crate::schema::Schema;

/// Unique identifier of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(Uuid);

impl NodeId {
    /// Allocate a fresh identifier
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node-{}", self.0.simple())
    }
}

/// Identity of a sampling.
///
/// Nodes carrying the same sampling id must be realized by event sets that
/// share their timestamp buffers key by key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SamplingId(Uuid);

impl SamplingId {
    /// Allocate a fresh sampling
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SamplingId {
    fn default() -> Self {
        Self::new()
    }
}

/// The operator output a node stands for
#[derive(Debug, Clone)]
pub struct Creator {
    /// The operator that produces the node
    pub operator: Arc<Operator>,

    /// The operator output key
    pub output: String,
}

struct NodeInner {
    id: NodeId,
    schema: Arc<Schema>,
    sampling: SamplingId,
    creator: Option<Creator>,
    name: Option<String>,
}

/// An immutable, typed vertex of the operator graph.
///
/// Cloning shares the node. Equality and hashing use the node id.
#[derive(Clone)]
pub struct EventSetNode {
    inner: Arc<NodeInner>,
}

impl EventSetNode {
    /// Create a graph input with a fresh sampling
    pub fn source(schema: Schema) -> Self {
        Self::source_with_name(schema, None)
    }

    /// Create a named graph input with a fresh sampling
    pub fn source_with_name(schema: Schema, name: Option<String>) -> Self {
        Self {
            inner: Arc::new(NodeInner {
                id: NodeId::new(),
                schema: Arc::new(schema),
                sampling: SamplingId::new(),
                creator: None,
                name,
            }),
        }
    }

    pub(crate) fn from_output(
        id: NodeId,
        schema: Arc<Schema>,
        sampling: SamplingId,
        creator: Creator,
    ) -> Self {
        Self {
            inner: Arc::new(NodeInner {
                id,
                schema,
                sampling,
                creator: Some(creator),
                name: None,
            }),
        }
    }

    /// Get the node id
    pub fn id(&self) -> NodeId {
        self.inner.id
    }

    /// Get the schema
    pub fn schema(&self) -> &Arc<Schema> {
        &self.inner.schema
    }

    /// Get the sampling id
    pub fn sampling(&self) -> SamplingId {
        self.inner.sampling
    }

    /// Get the creator, or `None` for graph inputs
    pub fn creator(&self) -> Option<&Creator> {
        self.inner.creator.as_ref()
    }

    /// Get the user-facing name, if any
    pub fn name(&self) -> Option<&str> {
        self.inner.name.as_deref()
    }

    /// Check if this node is a graph input
    pub fn is_source(&self) -> bool {
        self.inner.creator.is_none()
    }

    /// Check if both nodes share a sampling
    pub fn same_sampling(&self, other: &EventSetNode) -> bool {
        self.inner.sampling == other.inner.sampling
    }
}

impl PartialEq for EventSetNode {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for EventSetNode {}

impl Hash for EventSetNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.id.hash(state);
    }
}

impl fmt::Debug for EventSetNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSetNode")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .field("schema", &self.inner.schema.to_string())
            .field("creator", &self.inner.creator.as_ref().map(|c| c.operator.key()))
            .finish()
    }
}
