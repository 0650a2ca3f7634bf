//! Playback state machine for a simulated network.
//!
//! ```text
//!   Idle ──click──▶ Computing ──backend done──▶ Ready ──click──▶ Playing
//!    ▲                  │                         ▲                 │
//!    │                  └──── topology edit ──────┤                 │
//!    └────────────── stop, no packets ────────────┴── stop ─────────┘
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};

/// Opaque identifier of the network being viewed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NetworkId(pub String);

impl NetworkId {
    pub fn new(guid: impl Into<String>) -> Self {
        Self(guid.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Current state of the simulation playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    /// No simulation; the topology is editable
    Idle,
    /// Waiting for the backend to compute a run
    Computing,
    /// A run is available and can be played
    Ready,
    /// Packets are being animated; edits are refused
    Playing,
}

impl PlaybackState {
    /// Whether the table allows moving from `self` to `next`.
    ///
    /// Re-entering the current state is always allowed and changes nothing.
    pub fn can_transition_to(self, next: PlaybackState) -> bool {
        use PlaybackState::*;
        matches!(
            (self, next),
            (Idle, Computing)
                | (Computing, Ready)
                | (Ready, Playing)
                | (Playing, Ready)
                | (Playing, Idle)
                // Topology edits discard a pending or computed run.
                | (Computing, Idle)
                | (Ready, Idle)
        ) || self == next
    }

    /// Whether the topology may be edited in this state.
    pub fn accepts_edits(self) -> bool {
        self != PlaybackState::Playing
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            PlaybackState::Idle => "idle",
            PlaybackState::Computing => "computing",
            PlaybackState::Ready => "ready",
            PlaybackState::Playing => "playing",
        }
    }
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single playback state of an open network view.
#[derive(Debug, Clone)]
pub struct PlaybackStateMachine {
    network: NetworkId,
    state: PlaybackState,
}

impl PlaybackStateMachine {
    /// Create a machine at `Idle`.
    pub fn new(network: NetworkId) -> Self {
        Self {
            network,
            state: PlaybackState::Idle,
        }
    }

    /// Re-open a view whose network is already computing or has a result.
    ///
    /// A view is never restored into `Playing`; that falls back to `Ready`.
    pub fn restore(network: NetworkId, state: PlaybackState) -> Self {
        let state = match state {
            PlaybackState::Playing => PlaybackState::Ready,
            other => other,
        };
        Self { network, state }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn network(&self) -> &NetworkId {
        &self.network
    }

    /// Move to `next`, returning the previous state.
    pub fn set_state(&mut self, next: PlaybackState) -> Result<PlaybackState> {
        let prev = self.state;
        if !prev.can_transition_to(next) {
            return Err(Error::InvalidTransition { from: prev, to: next });
        }
        if prev != next {
            info!(network = %self.network, from = %prev, to = %next, "playback transition");
            self.state = next;
        }
        Ok(prev)
    }

    /// Force the machine back to `Idle`, returning the previous state.
    pub fn reset(&mut self) -> PlaybackState {
        let prev = self.state;
        if prev != PlaybackState::Idle {
            info!(network = %self.network, from = %prev, "playback reset");
            self.state = PlaybackState::Idle;
        }
        prev
    }
}

/// Counts describing an open view: topology size, queued jobs, loaded
/// frames and live animation timers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackStatus {
    pub network: NetworkId,
    pub state: PlaybackState,
    pub node_count: usize,
    pub edge_count: usize,
    pub job_count: usize,
    pub frame_count: usize,
    pub pending_timers: usize,
}
