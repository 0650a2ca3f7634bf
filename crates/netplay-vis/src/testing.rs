//! Recording collaborators for unit tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use netplay_topology::{EdgeDescriptor, NodeDescriptor, TopologyStore};

use crate::collaborators::{Collaborators, NoticeSurface, Persistence, Renderer};
use crate::context::PlaybackContext;
use crate::error::{Error, Result};
use crate::events::{PacketCollection, PacketMove};
use crate::playback::{NetworkId, PlaybackState, PlaybackStateMachine};
use crate::simulation::SimulationBackend;
use crate::timers::{ManualScheduler, TimerReaper};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    DrawLive { nodes: usize },
    DrawStatic { nodes: usize, frames: usize },
    DrawShared { nodes: usize },
    PostNodes { nodes: usize },
    RunSimulation(String),
    NoJobsNotice,
}

#[derive(Clone, Default)]
pub(crate) struct Recorder {
    calls: Arc<Mutex<Vec<Call>>>,
    fail_persistence: bool,
}

impl Recorder {
    pub(crate) fn failing_persistence() -> Self {
        Self {
            fail_persistence: true,
            ..Self::default()
        }
    }

    fn push(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn collaborators(&self) -> Collaborators {
        Collaborators::new(self.clone(), self.clone(), self.clone(), self.clone())
    }
}

impl Renderer for Recorder {
    fn draw_live(&mut self, nodes: &[NodeDescriptor], _edges: &[EdgeDescriptor]) {
        self.push(Call::DrawLive { nodes: nodes.len() });
    }

    fn draw_static_with_packets(
        &mut self,
        nodes: &[NodeDescriptor],
        _edges: &[EdgeDescriptor],
        packets: &PacketCollection,
        timers: &mut TimerReaper,
    ) {
        for i in 0..packets.frame_count() {
            timers.schedule(Duration::from_millis(100 * (i as u64 + 1)), Box::new(|| {}));
        }
        self.push(Call::DrawStatic {
            nodes: nodes.len(),
            frames: packets.frame_count(),
        });
    }

    fn draw_shared(&mut self, nodes: &[NodeDescriptor], _edges: &[EdgeDescriptor]) {
        self.push(Call::DrawShared { nodes: nodes.len() });
    }
}

impl Persistence for Recorder {
    fn post_nodes(&mut self, _network: &NetworkId, nodes: &[NodeDescriptor]) -> Result<()> {
        self.push(Call::PostNodes { nodes: nodes.len() });
        if self.fail_persistence {
            return Err(Error::Persistence("server unavailable".to_string()));
        }
        Ok(())
    }
}

impl SimulationBackend for Recorder {
    fn run_simulation(&mut self, network: &NetworkId) {
        self.push(Call::RunSimulation(network.to_string()));
    }
}

impl NoticeSurface for Recorder {
    fn show_no_jobs(&mut self) {
        self.push(Call::NoJobsNotice);
    }
}

pub(crate) fn packets(frames: usize) -> PacketCollection {
    PacketCollection::new(
        (0..frames)
            .map(|i| {
                vec![PacketMove {
                    id: format!("pkt{i}"),
                    label: "ARP".to_string(),
                    source: "host_1".to_string(),
                    target: "host_2".to_string(),
                }]
            })
            .collect(),
    )
}

pub(crate) fn context_in(
    state: PlaybackState,
    recorder: &Recorder,
    clock: &ManualScheduler,
) -> PlaybackContext {
    let mut machine = PlaybackStateMachine::restore(NetworkId::new("net-1"), state);
    if state == PlaybackState::Playing {
        machine.set_state(PlaybackState::Playing).unwrap();
    }
    PlaybackContext::new(
        machine,
        TopologyStore::new(),
        TimerReaper::new(clock.clone()),
        recorder.collaborators(),
    )
}
