//! An open network view: shared playback context plus both controls.

use netplay_topology::{
    CoordinateAdapter, EdgeDescriptor, IdentifierAllocator, NodeDescriptor, PagePosition,
    TopologyStore,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::collaborators::Collaborators;
use crate::config::ViewConfig;
use crate::context::PlaybackContext;
use crate::controller::{
    ButtonAffordance, ClickOutcome, PlaybackButtonController, RedrawStrategy,
};
use crate::error::Result;
use crate::events::Job;
use crate::network::NetworkRecord;
use crate::placement::{DropController, DropOutcome};
use crate::playback::{NetworkId, PlaybackState, PlaybackStateMachine, PlaybackStatus};
use crate::simulation::{Completion, SimulationResult};
use crate::timers::{Scheduler, TimerReaper};

/// Which playback control was clicked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlId {
    /// The owner's run button
    Primary,
    /// The run button of the shared view
    Shared,
}

/// Everything a frontend needs to render the view.
#[derive(Debug, Clone, Serialize)]
pub struct ViewSnapshot {
    pub network: NetworkId,
    pub state: PlaybackState,
    pub nodes: Vec<NodeDescriptor>,
    pub edges: Vec<EdgeDescriptor>,
    pub jobs: Vec<Job>,
    pub frame_count: usize,
    pub primary: ButtonAffordance,
    pub shared: ButtonAffordance,
}

/// One open network view.
pub struct NetworkView {
    context: PlaybackContext,
    primary: PlaybackButtonController,
    shared: PlaybackButtonController,
    drops: DropController,
}

impl NetworkView {
    /// Open an empty view of `network`.
    pub fn new(
        network: NetworkId,
        config: &ViewConfig,
        scheduler: impl Scheduler + 'static,
        collaborators: Collaborators,
    ) -> Self {
        let context = PlaybackContext::new(
            PlaybackStateMachine::new(network),
            TopologyStore::new(),
            TimerReaper::new(scheduler),
            collaborators,
        );
        Self::assemble(context, IdentifierAllocator::new(), config)
    }

    /// Open a view of a stored network.
    ///
    /// A network with a pending simulation opens in `Computing`, one with a
    /// stored result in `Ready`, anything else in `Idle`. Id counters resume
    /// after the stored nodes.
    pub fn load(
        record: &NetworkRecord,
        config: &ViewConfig,
        scheduler: impl Scheduler + 'static,
        collaborators: Collaborators,
    ) -> Self {
        let doc = &record.document;
        let state = if record.simulating {
            PlaybackState::Computing
        } else if !doc.packets.is_empty() {
            PlaybackState::Ready
        } else {
            PlaybackState::Idle
        };

        let topology = TopologyStore::from_parts(doc.nodes.clone(), doc.edges.clone());
        let ids = topology.resume_allocator();
        let mut context = PlaybackContext::new(
            PlaybackStateMachine::restore(record.guid.clone(), state),
            topology,
            TimerReaper::new(scheduler),
            collaborators,
        );
        context.set_jobs(doc.jobs.clone());
        context.set_packets(doc.packets.clone());

        Self::assemble(context, ids, config)
    }

    fn assemble(context: PlaybackContext, ids: IdentifierAllocator, config: &ViewConfig) -> Self {
        let state = context.state();
        Self {
            primary: PlaybackButtonController::new(
                RedrawStrategy::Static,
                config.labels.clone(),
                state,
            ),
            shared: PlaybackButtonController::new(
                RedrawStrategy::Shared,
                config.labels.clone(),
                state,
            ),
            drops: DropController::new(ids, CoordinateAdapter::new(config.side_panel_width)),
            context,
        }
    }

    pub fn context(&self) -> &PlaybackContext {
        &self.context
    }

    pub fn state(&self) -> PlaybackState {
        self.context.state()
    }

    pub fn network(&self) -> &NetworkId {
        self.context.machine().network()
    }

    pub fn control(&self, id: ControlId) -> &PlaybackButtonController {
        match id {
            ControlId::Primary => &self.primary,
            ControlId::Shared => &self.shared,
        }
    }

    fn sync_controls(&mut self) {
        let state = self.context.state();
        self.primary.sync(state);
        self.shared.sync(state);
    }

    /// Click a playback control. The other control follows the new state.
    pub fn click(&mut self, id: ControlId) -> Result<ClickOutcome> {
        let (clicked, other) = match id {
            ControlId::Primary => (&mut self.primary, &mut self.shared),
            ControlId::Shared => (&mut self.shared, &mut self.primary),
        };
        let outcome = clicked.on_click(&mut self.context)?;
        other.sync(self.context.state());
        Ok(outcome)
    }

    /// Drop a palette element on the canvas.
    pub fn drop_device(&mut self, device: &str, page: PagePosition) -> DropOutcome {
        let before = self.state();
        let outcome = self.drops.on_drop(&mut self.context, device, page);
        if self.state() != before {
            self.sync_controls();
        }
        outcome
    }

    /// Deliver a finished run from the simulation backend.
    pub fn complete_simulation(&mut self, result: SimulationResult) -> Result<Completion> {
        let completion = self.context.complete_simulation(result)?;
        if completion == Completion::Accepted {
            self.sync_controls();
        }
        Ok(completion)
    }

    /// Queue a job on a host.
    pub fn add_job(&mut self, job: Job) {
        self.context.add_job(job);
    }

    /// Replace the whole topology, as the edge editor does.
    ///
    /// Follows the same rules as a drop: refused while playing, discards a
    /// pending or computed run otherwise. Returns whether it was applied.
    pub fn replace_topology(&mut self, nodes: Vec<NodeDescriptor>, edges: Vec<EdgeDescriptor>) -> bool {
        if !self.state().accepts_edits() {
            debug!("topology replace refused while playing");
            return false;
        }
        if self.state() != PlaybackState::Idle {
            self.context.discard_run();
            self.sync_controls();
        }

        let nodes_left: Vec<&str> = nodes.iter().map(|n| n.id()).collect();
        let jobs = self
            .context
            .jobs()
            .iter()
            .filter(|job| nodes_left.contains(&job.host_id.as_str()))
            .cloned()
            .collect();
        self.context.set_jobs(jobs);

        self.context.topology = TopologyStore::from_parts(nodes, edges);
        self.drops
            .observe_ids(self.context.topology.nodes().iter().map(|n| n.id()));
        self.context
            .collaborators
            .renderer
            .draw_live(self.context.topology.nodes(), self.context.topology.edges());
        true
    }

    /// Move nodes to the positions given, by id. Unknown ids are an error
    /// and leave earlier moves applied.
    pub fn move_nodes(&mut self, nodes: &[NodeDescriptor]) -> Result<()> {
        for node in nodes {
            self.context.topology.move_node(node.id(), node.position())?;
        }
        Ok(())
    }

    pub fn status(&self) -> PlaybackStatus {
        let ctx = &self.context;
        PlaybackStatus {
            network: self.network().clone(),
            state: ctx.state(),
            node_count: ctx.topology().node_count(),
            edge_count: ctx.topology().edge_count(),
            job_count: ctx.jobs().len(),
            frame_count: ctx.packets().frame_count(),
            pending_timers: ctx.timers().pending_count(),
        }
    }

    pub fn snapshot(&self) -> ViewSnapshot {
        let ctx = &self.context;
        ViewSnapshot {
            network: self.network().clone(),
            state: ctx.state(),
            nodes: ctx.topology().nodes().to_vec(),
            edges: ctx.topology().edges().to_vec(),
            jobs: ctx.jobs().to_vec(),
            frame_count: ctx.packets().frame_count(),
            primary: self.primary.affordance().clone(),
            shared: self.shared.affordance().clone(),
        }
    }
}
