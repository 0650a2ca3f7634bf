//! Simulation backend hand-off.
//!
//! The backend is fire-and-forget: [`SimulationBackend::run_simulation`]
//! only asks for a run. When the run is done the result comes back as a
//! [`SimulationResult`] message, which moves the view from `Computing` to
//! `Ready`.

use serde::{Deserialize, Serialize};

use crate::events::PacketCollection;
use crate::playback::NetworkId;

/// Starts simulation runs.
pub trait SimulationBackend: Send {
    fn run_simulation(&mut self, network: &NetworkId);
}

/// Completion message delivered by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationResult {
    pub network: NetworkId,
    pub packets: PacketCollection,
}

impl SimulationResult {
    pub fn new(network: NetworkId, packets: PacketCollection) -> Self {
        Self { network, packets }
    }
}

/// What happened to a delivered result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Completion {
    /// The view moved to `Ready`
    Accepted,
    /// The view was not waiting for a run (edited or already done)
    Stale,
    /// The result belongs to another network
    WrongNetwork,
}
