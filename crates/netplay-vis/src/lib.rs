//! Netplay Network View
//!
//! Playback and editing controller for a network topology canvas: devices
//! are dropped from a palette, a simulation backend computes packet
//! traffic, and the result is replayed as an animation.
//!
//! # Architecture
//!
//! - **Playback**: Four-state machine (idle, computing, ready, playing)
//! - **Controls**: One button controller type, used for the owner's view
//!   and the shared view
//! - **Placement**: Drops become nodes, discarding stale runs
//! - **Timers**: Animation timers tracked by handle and reaped on stop
//! - **Server**: REST API and a WebSocket stream of redraws and frames
//!
//! # Usage
//!
//! ```ignore
//! let store = NetworkStore::new();
//! let guid = store.create("lab");
//!
//! let server = VisServer::new(&ViewConfig::from_env()?, store, guid)?;
//! server.serve(3000).await?;
//! ```

mod broadcast;
mod collaborators;
mod config;
mod context;
mod controller;
mod error;
mod events;
mod network;
mod placement;
mod playback;
mod server;
mod simulation;
mod timers;
mod view;

#[cfg(test)]
mod testing;

pub use broadcast::{BroadcastBackend, BroadcastNotices, BroadcastRenderer};
pub use collaborators::{Collaborators, NoticeSurface, Persistence, Renderer};
pub use config::{ButtonLabels, ViewConfig};
pub use context::PlaybackContext;
pub use controller::{
    ButtonAffordance, ButtonStyle, ClickOutcome, PlaybackButtonController, RedrawStrategy,
};
pub use error::{Error, Result};
pub use events::{Job, PacketCollection, PacketFrame, PacketMove, RedrawMode, ViewEvent};
pub use network::{NetworkDocument, NetworkRecord, NetworkStore};
pub use placement::{DropController, DropOutcome};
pub use playback::{NetworkId, PlaybackState, PlaybackStateMachine, PlaybackStatus};
pub use server::VisServer;
pub use simulation::{Completion, SimulationBackend, SimulationResult};
pub use timers::{
    ManualScheduler, Scheduler, TimerCallback, TimerHandle, TimerReaper, TokioScheduler,
};
pub use view::{ControlId, NetworkView, ViewSnapshot};
