//! Netplay Topology
//!
//! Building blocks for a hand-drawn network topology: the devices a user can
//! drop on the canvas, the identifiers they receive, and where they land.
//!
//! # Devices
//!
//! Three device kinds are supported:
//! - `host` - an end station that can run jobs
//! - `l2_switch` - a learning layer-2 switch
//! - `l1_hub` - a layer-1 repeater
//!
//! # Identifiers
//!
//! Every node id carries its device prefix (`host_1`, `l2sw1`, `l1hub1`) and
//! a per-kind counter. Counters only grow, so an id is never handed out twice
//! within a session.
//!
//! # Coordinates
//!
//! Drop events arrive in page coordinates. The canvas sits to the right of a
//! side panel, so the panel width is subtracted from `x` before the node is
//! stored.

mod coords;
mod descriptor;
mod device;
mod error;
mod ids;
mod store;

pub use coords::{CanvasPosition, CoordinateAdapter, PagePosition};
pub use descriptor::{EdgeDescriptor, InterfaceDescriptor, NodeConfig, NodeDescriptor};
pub use device::DeviceType;
pub use error::{Error, Result};
pub use ids::{IdentifierAllocator, ID_BASE};
pub use store::TopologyStore;
