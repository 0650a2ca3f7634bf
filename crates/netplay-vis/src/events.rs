//! Packets, jobs and the events streamed to the frontend.

use netplay_topology::{EdgeDescriptor, NodeDescriptor};
use serde::{Deserialize, Serialize};

use crate::playback::{NetworkId, PlaybackState};

/// One packet hop in an animation frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PacketMove {
    pub id: String,
    pub label: String,
    /// Node the packet leaves
    pub source: String,
    /// Node the packet arrives at
    pub target: String,
}

/// All packet hops that happen at the same animation step.
pub type PacketFrame = Vec<PacketMove>;

/// Computed simulation result, ordered by animation step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PacketCollection {
    frames: Vec<PacketFrame>,
}

impl PacketCollection {
    pub fn new(frames: Vec<PacketFrame>) -> Self {
        Self { frames }
    }

    /// No simulation result.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frames(&self) -> &[PacketFrame] {
        &self.frames
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Total packet hops across all frames.
    pub fn packet_count(&self) -> usize {
        self.frames.iter().map(Vec::len).sum()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }
}

/// A command queued on a host, executed by the simulation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    /// Host the job runs on
    pub host_id: String,
    /// Kind of job (ping, ip route, ...), as numbered by the backend
    pub job_id: u32,
    /// Human-readable command line
    pub print_cmd: String,
}

/// How the canvas is redrawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedrawMode {
    /// Editable topology
    Live,
    /// Paused topology with packet animation on top
    StaticWithPackets,
    /// Read-only topology for the shared view
    Shared,
}

/// Events pushed to frontends over the websocket.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ViewEvent {
    /// The canvas must be redrawn
    Redraw {
        mode: RedrawMode,
        nodes: Vec<NodeDescriptor>,
        edges: Vec<EdgeDescriptor>,
    },

    /// An animation timer fired
    PacketFrame { index: usize, packets: PacketFrame },

    /// Playback state changed
    StateChanged { state: PlaybackState },

    /// The backend should compute a run for this network
    SimulationRequested { network: NetworkId },

    /// Passive notice for the user
    Notice { message: String },
}
