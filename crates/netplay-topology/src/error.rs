//! Error types for netplay-topology.

use thiserror::Error;

use crate::device::DeviceType;

/// Result type for topology operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building a topology.
#[derive(Debug, Error)]
pub enum Error {
    /// The palette sent a device name we do not know.
    #[error("unknown device type: {0}")]
    UnknownDevice(String),

    /// A node with this id is already in the store.
    #[error("duplicate node id: {0}")]
    DuplicateNode(String),

    /// No node with this id.
    #[error("node not found: {0}")]
    NodeNotFound(String),

    /// The id counter of this device kind cannot advance any further.
    #[error("no {0} ids left")]
    IdsExhausted(DeviceType),
}
