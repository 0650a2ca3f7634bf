//! In-memory topology: ordered nodes and edges.

use crate::coords::CanvasPosition;
use crate::descriptor::{EdgeDescriptor, NodeDescriptor};
use crate::error::{Error, Result};
use crate::ids::IdentifierAllocator;

/// Ordered collection of node and edge descriptors.
///
/// Insertion order is preserved; renderers and the persistence layer always
/// see the full list in the order nodes were placed.
#[derive(Debug, Clone, Default)]
pub struct TopologyStore {
    nodes: Vec<NodeDescriptor>,
    edges: Vec<EdgeDescriptor>,
}

impl TopologyStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store from previously persisted parts.
    pub fn from_parts(nodes: Vec<NodeDescriptor>, edges: Vec<EdgeDescriptor>) -> Self {
        Self { nodes, edges }
    }

    pub fn nodes(&self) -> &[NodeDescriptor] {
        &self.nodes
    }

    pub fn edges(&self) -> &[EdgeDescriptor] {
        &self.edges
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    /// Look up a node by id.
    pub fn node(&self, id: &str) -> Option<&NodeDescriptor> {
        self.nodes.iter().find(|n| n.id() == id)
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.node(id).is_some()
    }

    /// Append a node. Ids are assumed unique; see [`try_push_node`](Self::try_push_node).
    pub fn push_node(&mut self, node: NodeDescriptor) {
        self.nodes.push(node);
    }

    /// Append a node, refusing duplicates.
    pub fn try_push_node(&mut self, node: NodeDescriptor) -> Result<()> {
        if self.contains_node(node.id()) {
            return Err(Error::DuplicateNode(node.id().to_string()));
        }
        self.nodes.push(node);
        Ok(())
    }

    pub fn push_edge(&mut self, edge: EdgeDescriptor) {
        self.edges.push(edge);
    }

    /// Move an existing node.
    pub fn move_node(&mut self, id: &str, position: CanvasPosition) -> Result<()> {
        let node = self
            .nodes
            .iter_mut()
            .find(|n| n.id() == id)
            .ok_or_else(|| Error::NodeNotFound(id.to_string()))?;
        node.move_to(position);
        Ok(())
    }

    /// Allocator that continues numbering after every node in the store.
    pub fn resume_allocator(&self) -> IdentifierAllocator {
        IdentifierAllocator::resuming(self.nodes.iter().map(|n| n.id()))
    }
}
