//! Node records and the registry maintained by the engine scheduler

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Identifier of a content node
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Create a new node id
    pub fn new(id: impl Into<String>) -> Self {
        NodeId(id.into())
    }

    /// View the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        NodeId::new(s)
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        NodeId(s)
    }
}

/// The unit of published content under test.
///
/// Carries the page location and expected value used for convergence checks,
/// plus the visibility flags the scheduler's spawn policy reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Unique node identifier
    pub id: NodeId,

    /// Path of the page the node is published on
    #[serde(default)]
    pub page_path: String,

    /// Selector locating the node's value on the page
    #[serde(default)]
    pub selector: String,

    /// Expected published value
    #[serde(default)]
    pub value: serde_json::Value,

    /// Optional free-form context carried alongside the node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<serde_json::Value>,

    /// An operation currently targets this node
    #[serde(default)]
    pub in_flight: bool,

    /// The node exists in the content store
    #[serde(default)]
    pub exists_on_cms: bool,

    /// The node's value is visible on the live site
    #[serde(default)]
    pub published: bool,
}

impl Node {
    /// Create an empty node with the given id (all flags cleared)
    pub fn new(id: impl Into<NodeId>) -> Self {
        Self {
            id: id.into(),
            page_path: String::new(),
            selector: String::new(),
            value: serde_json::Value::Null,
            context: None,
            in_flight: false,
            exists_on_cms: false,
            published: false,
        }
    }

    /// Create a pool-seed node: pre-existing, published, not in flight
    pub fn seed(
        id: impl Into<NodeId>,
        page_path: impl Into<String>,
        selector: impl Into<String>,
        value: serde_json::Value,
    ) -> Self {
        Self {
            id: id.into(),
            page_path: page_path.into(),
            selector: selector.into(),
            value,
            context: None,
            in_flight: false,
            exists_on_cms: true,
            published: true,
        }
    }
}

/// Registry of all nodes the engine has seen, keyed by id.
///
/// Exclusively owned and mutated by the scheduler task. Iteration order is
/// stable (sorted by id), which the spawn policies rely on. Nodes are never
/// removed; a delete only clears their flags via worker reports.
#[derive(Debug, Default, Clone)]
pub struct NodeRegistry {
    nodes: BTreeMap<NodeId, Node>,
}

impl NodeRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a reported node snapshot, overwriting any prior record.
    ///
    /// Last-write-wins per id; no sequencing is applied, so a stale report
    /// arriving late can overwrite a newer one.
    pub fn merge(&mut self, node: Node) {
        self.nodes.insert(node.id.clone(), node);
    }

    /// Look up a node by id
    pub fn get(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Iterate nodes in stable (id) order
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Number of known nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True if no node has been seen yet
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// First node (stable order) not currently targeted by an operation
    pub fn first_idle(&self) -> Option<&Node> {
        self.iter().find(|n| !n.in_flight)
    }

    /// First node (stable order) that is published and not in flight
    pub fn first_deletable(&self) -> Option<&Node> {
        self.iter().find(|n| n.published && !n.in_flight)
    }

    /// Snapshot of all nodes, in stable order
    pub fn snapshot(&self) -> Vec<Node> {
        self.nodes.values().cloned().collect()
    }
}
