//! State shared by both playback controls and the drop handler.

use netplay_topology::TopologyStore;
use tracing::{debug, info};

use crate::collaborators::Collaborators;
use crate::error::Result;
use crate::events::{Job, PacketCollection};
use crate::playback::{PlaybackState, PlaybackStateMachine};
use crate::simulation::{Completion, SimulationResult};
use crate::timers::TimerReaper;

/// Everything a click or a drop may read or change.
///
/// There is exactly one per open network view. Controllers borrow it
/// mutably for the duration of one handler, so handlers never interleave.
pub struct PlaybackContext {
    pub(crate) machine: PlaybackStateMachine,
    pub(crate) topology: TopologyStore,
    pub(crate) packets: PacketCollection,
    pub(crate) jobs: Vec<Job>,
    pub(crate) timers: TimerReaper,
    pub(crate) collaborators: Collaborators,
}

impl PlaybackContext {
    pub fn new(
        machine: PlaybackStateMachine,
        topology: TopologyStore,
        timers: TimerReaper,
        collaborators: Collaborators,
    ) -> Self {
        Self {
            machine,
            topology,
            packets: PacketCollection::empty(),
            jobs: Vec::new(),
            timers,
            collaborators,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.machine.state()
    }

    pub fn machine(&self) -> &PlaybackStateMachine {
        &self.machine
    }

    pub fn topology(&self) -> &TopologyStore {
        &self.topology
    }

    pub fn packets(&self) -> &PacketCollection {
        &self.packets
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn timers(&self) -> &TimerReaper {
        &self.timers
    }

    /// Validated state setter.
    pub fn set_state(&mut self, next: PlaybackState) -> Result<PlaybackState> {
        self.machine.set_state(next)
    }

    /// Queue a job on a host.
    pub fn add_job(&mut self, job: Job) {
        debug!(host = %job.host_id, job = job.job_id, "job queued");
        self.jobs.push(job);
    }

    pub(crate) fn set_jobs(&mut self, jobs: Vec<Job>) {
        self.jobs = jobs;
    }

    pub(crate) fn set_packets(&mut self, packets: PacketCollection) {
        self.packets = packets;
    }

    /// Throw away a pending or computed run and go back to `Idle`.
    ///
    /// Returns the state the view was in.
    pub(crate) fn discard_run(&mut self) -> PlaybackState {
        if self.timers.pending_count() > 0 {
            self.timers.cancel_all_pending();
        }
        self.packets.clear();
        self.machine.reset()
    }

    /// Deliver a finished run from the simulation backend.
    pub fn complete_simulation(&mut self, result: SimulationResult) -> Result<Completion> {
        if &result.network != self.machine.network() {
            debug!(network = %result.network, "result for another network ignored");
            return Ok(Completion::WrongNetwork);
        }
        if self.machine.state() != PlaybackState::Computing {
            debug!(state = %self.machine.state(), "stale simulation result ignored");
            return Ok(Completion::Stale);
        }

        info!(
            network = %result.network,
            frames = result.packets.frame_count(),
            "simulation complete"
        );
        self.machine.set_state(PlaybackState::Ready)?;
        self.packets = result.packets;
        Ok(Completion::Accepted)
    }
}
