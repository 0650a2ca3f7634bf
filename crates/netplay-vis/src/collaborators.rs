//! Interfaces to the renderer, persistence and notice surfaces.

use netplay_topology::{EdgeDescriptor, NodeDescriptor};

use crate::error::Result;
use crate::events::PacketCollection;
use crate::playback::NetworkId;
use crate::simulation::SimulationBackend;
use crate::timers::TimerReaper;

/// Draws the topology.
pub trait Renderer: Send {
    /// Editable topology.
    fn draw_live(&mut self, nodes: &[NodeDescriptor], edges: &[EdgeDescriptor]);

    /// Paused topology with the packet animation.
    ///
    /// Animation timers must be scheduled through `timers` so that stopping
    /// playback can cancel them.
    fn draw_static_with_packets(
        &mut self,
        nodes: &[NodeDescriptor],
        edges: &[EdgeDescriptor],
        packets: &PacketCollection,
        timers: &mut TimerReaper,
    );

    /// Read-only topology for the shared view.
    fn draw_shared(&mut self, nodes: &[NodeDescriptor], edges: &[EdgeDescriptor]);
}

/// Stores the node list of a network.
pub trait Persistence: Send {
    fn post_nodes(&mut self, network: &NetworkId, nodes: &[NodeDescriptor]) -> Result<()>;
}

/// Passive notices for the user.
pub trait NoticeSurface: Send {
    /// The user asked to simulate but no host has a job queued.
    fn show_no_jobs(&mut self);
}

/// Everything a view talks to but does not own the logic of.
pub struct Collaborators {
    pub renderer: Box<dyn Renderer>,
    pub persistence: Box<dyn Persistence>,
    pub backend: Box<dyn SimulationBackend>,
    pub notices: Box<dyn NoticeSurface>,
}

impl Collaborators {
    pub fn new(
        renderer: impl Renderer + 'static,
        persistence: impl Persistence + 'static,
        backend: impl SimulationBackend + 'static,
        notices: impl NoticeSurface + 'static,
    ) -> Self {
        Self {
            renderer: Box::new(renderer),
            persistence: Box::new(persistence),
            backend: Box::new(backend),
            notices: Box::new(notices),
        }
    }
}
