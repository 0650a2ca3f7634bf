//! Collaborators that publish to a broadcast channel of [`ViewEvent`]s.
//!
//! The websocket handler forwards the channel to every connected frontend,
//! which does the actual drawing. Sends with no subscriber are dropped.

use std::time::Duration;

use netplay_topology::{EdgeDescriptor, NodeDescriptor};
use tokio::sync::broadcast;
use tracing::trace;

use crate::collaborators::{NoticeSurface, Renderer};
use crate::events::{PacketCollection, RedrawMode, ViewEvent};
use crate::playback::NetworkId;
use crate::simulation::SimulationBackend;
use crate::timers::TimerReaper;

fn publish(events: &broadcast::Sender<ViewEvent>, event: ViewEvent) {
    if events.send(event).is_err() {
        trace!("no frontend subscribed");
    }
}

/// Renderer that streams redraws and animation frames.
#[derive(Debug, Clone)]
pub struct BroadcastRenderer {
    events: broadcast::Sender<ViewEvent>,
    frame_interval: Duration,
}

impl BroadcastRenderer {
    pub fn new(events: broadcast::Sender<ViewEvent>, frame_interval: Duration) -> Self {
        Self {
            events,
            frame_interval,
        }
    }

    fn redraw(&self, mode: RedrawMode, nodes: &[NodeDescriptor], edges: &[EdgeDescriptor]) {
        publish(
            &self.events,
            ViewEvent::Redraw {
                mode,
                nodes: nodes.to_vec(),
                edges: edges.to_vec(),
            },
        );
    }
}

impl Renderer for BroadcastRenderer {
    fn draw_live(&mut self, nodes: &[NodeDescriptor], edges: &[EdgeDescriptor]) {
        self.redraw(RedrawMode::Live, nodes, edges);
    }

    fn draw_static_with_packets(
        &mut self,
        nodes: &[NodeDescriptor],
        edges: &[EdgeDescriptor],
        packets: &PacketCollection,
        timers: &mut TimerReaper,
    ) {
        self.redraw(RedrawMode::StaticWithPackets, nodes, edges);

        // Frame i is shown (i + 1) intervals after playback starts.
        let mut delay = Duration::ZERO;
        for (index, frame) in packets.frames().iter().enumerate() {
            delay += self.frame_interval;
            let events = self.events.clone();
            let packets = frame.clone();
            timers.schedule(
                delay,
                Box::new(move || publish(&events, ViewEvent::PacketFrame { index, packets })),
            );
        }
    }

    fn draw_shared(&mut self, nodes: &[NodeDescriptor], edges: &[EdgeDescriptor]) {
        self.redraw(RedrawMode::Shared, nodes, edges);
    }
}

/// Notices published as [`ViewEvent::Notice`].
#[derive(Debug, Clone)]
pub struct BroadcastNotices {
    events: broadcast::Sender<ViewEvent>,
}

impl BroadcastNotices {
    pub fn new(events: broadcast::Sender<ViewEvent>) -> Self {
        Self { events }
    }
}

impl NoticeSurface for BroadcastNotices {
    fn show_no_jobs(&mut self) {
        publish(
            &self.events,
            ViewEvent::Notice {
                message: "No jobs queued: add a job to a host before simulating".to_string(),
            },
        );
    }
}

/// Backend that announces run requests; an external engine picks them up
/// and posts the result back.
#[derive(Debug, Clone)]
pub struct BroadcastBackend {
    events: broadcast::Sender<ViewEvent>,
}

impl BroadcastBackend {
    pub fn new(events: broadcast::Sender<ViewEvent>) -> Self {
        Self { events }
    }
}

impl SimulationBackend for BroadcastBackend {
    fn run_simulation(&mut self, network: &NetworkId) {
        publish(
            &self.events,
            ViewEvent::SimulationRequested {
                network: network.clone(),
            },
        );
    }
}
