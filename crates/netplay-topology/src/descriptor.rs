//! Node, edge and interface descriptors.
//!
//! The field layout mirrors the persisted network document, so a descriptor
//! serializes to exactly what the network store keeps:
//!
//! ```text
//! {"data": {"id": "host_1", "label": "host_1"},
//!  "position": {"x": 50.0, "y": 10.0},
//!  "classes": ["host"],
//!  "config": {"type": "host", "label": "host_1"},
//!  "interface": []}
//! ```

use crate::coords::CanvasPosition;
use crate::device::DeviceType;

/// Identity part of a node.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
struct NodeData {
    id: String,
    label: String,
}

/// Denormalized type/label copy kept for the persistence layer.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeConfig {
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub kind: DeviceType,
    pub label: String,
}

/// A network interface attached to a node.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InterfaceDescriptor {
    pub id: String,
    pub name: String,
    /// Id of the edge this interface is plugged into
    pub connect: String,
}

/// One device on the canvas.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeDescriptor {
    data: NodeData,
    position: CanvasPosition,
    classes: Vec<String>,
    config: NodeConfig,
    #[cfg_attr(feature = "serde", serde(rename = "interface", default))]
    interfaces: Vec<InterfaceDescriptor>,
}

impl NodeDescriptor {
    /// Create a freshly dropped node. The label starts out equal to the id
    /// and there are no interfaces yet.
    pub fn new(id: String, kind: DeviceType, position: CanvasPosition) -> Self {
        Self {
            data: NodeData {
                id: id.clone(),
                label: id.clone(),
            },
            position,
            classes: vec![kind.as_str().to_string()],
            config: NodeConfig { kind, label: id },
            interfaces: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.data.id
    }

    pub fn label(&self) -> &str {
        &self.data.label
    }

    pub fn position(&self) -> CanvasPosition {
        self.position
    }

    /// Device kind. Fixed at creation.
    pub fn type_tag(&self) -> DeviceType {
        self.config.kind
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn interfaces(&self) -> &[InterfaceDescriptor] {
        &self.interfaces
    }

    /// Move the node to a new canvas position.
    pub fn move_to(&mut self, position: CanvasPosition) {
        self.position = position;
    }

    /// Attach an interface. Called by edge-creation logic.
    pub fn add_interface(&mut self, interface: InterfaceDescriptor) {
        self.interfaces.push(interface);
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
struct EdgeData {
    id: String,
    source: String,
    target: String,
}

/// A link between two nodes.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EdgeDescriptor {
    data: EdgeData,
}

impl EdgeDescriptor {
    pub fn new(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            data: EdgeData {
                id: id.into(),
                source: source.into(),
                target: target.into(),
            },
        }
    }

    pub fn id(&self) -> &str {
        &self.data.id
    }

    pub fn source(&self) -> &str {
        &self.data.source
    }

    pub fn target(&self) -> &str {
        &self.data.target
    }

    /// Whether this edge touches the given node.
    pub fn touches(&self, node_id: &str) -> bool {
        self.data.source == node_id || self.data.target == node_id
    }
}
