//! Error types for netplay-vis.

use thiserror::Error;

use crate::playback::PlaybackState;

/// Result type for netplay-vis operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while driving a network view.
#[derive(Debug, Error)]
pub enum Error {
    /// A state change that the playback table does not allow.
    #[error("invalid playback transition: {from} -> {to}")]
    InvalidTransition {
        from: PlaybackState,
        to: PlaybackState,
    },

    /// Malformed configuration value.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The persistence layer refused a write.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// A job that cannot be queued.
    #[error("invalid job: {0}")]
    InvalidJob(String),

    /// No network with this guid.
    #[error("network not found: {0}")]
    NetworkNotFound(String),

    /// The network exists but is not open for shared viewing.
    #[error("network is not shared: {0}")]
    NotShared(String),

    /// Topology error
    #[error("topology error: {0}")]
    Topology(#[from] netplay_topology::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
