//! Turning palette drops into new nodes.

use netplay_topology::{CoordinateAdapter, DeviceType, IdentifierAllocator, NodeDescriptor, PagePosition};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::context::PlaybackContext;
use crate::playback::PlaybackState;

/// What a drop did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DropOutcome {
    /// A node was added. `discarded` is the state the view left, if the
    /// drop threw away a pending or computed run.
    Added {
        id: String,
        discarded: Option<PlaybackState>,
    },
    /// Edits are refused while packets are playing
    RejectedWhilePlaying,
    /// The dragged element is not a device
    UnknownDevice { device: String },
    /// No id of this kind is left to hand out
    IdsExhausted { device: String },
}

/// Handles drops on the canvas.
#[derive(Debug, Clone)]
pub struct DropController {
    ids: IdentifierAllocator,
    coords: CoordinateAdapter,
}

impl DropController {
    pub fn new(ids: IdentifierAllocator, coords: CoordinateAdapter) -> Self {
        Self { ids, coords }
    }

    pub fn coords(&self) -> &CoordinateAdapter {
        &self.coords
    }

    /// Make later drops skip past ids that entered the topology some other
    /// way, such as a replaced node list.
    pub fn observe_ids<'a>(&mut self, ids: impl IntoIterator<Item = &'a str>) {
        for id in ids {
            self.ids.observe(id);
        }
    }

    /// Drop a `device` at `page` on the canvas.
    ///
    /// On success the node is appended, the full node list is posted and the
    /// topology is redrawn, in that order. A failed post is logged; the node
    /// stays and the redraw still happens.
    pub fn on_drop(
        &mut self,
        ctx: &mut PlaybackContext,
        device: &str,
        page: PagePosition,
    ) -> DropOutcome {
        if !ctx.machine.state().accepts_edits() {
            debug!(device, "drop refused while playing");
            return DropOutcome::RejectedWhilePlaying;
        }

        let Ok(kind) = device.parse::<DeviceType>() else {
            debug!(device, "ignoring drop of unknown element");
            return DropOutcome::UnknownDevice {
                device: device.to_string(),
            };
        };

        // Editing the topology invalidates any pending or computed run.
        let discarded = match ctx.machine.state() {
            PlaybackState::Idle => None,
            _ => Some(ctx.discard_run()),
        };

        let position = self.coords.translate(page);
        let id = loop {
            let id = match self.ids.next_id(kind) {
                Ok(id) => id,
                Err(e) => {
                    warn!(device, "cannot place device: {}", e);
                    return DropOutcome::IdsExhausted {
                        device: device.to_string(),
                    };
                }
            };
            match ctx
                .topology
                .try_push_node(NodeDescriptor::new(id.clone(), kind, position))
            {
                Ok(()) => break id,
                Err(_) => debug!(node = %id, "id already in the topology, skipping"),
            }
        };
        info!(node = %id, kind = %kind, x = position.x, y = position.y, "node added");

        if let Err(e) = ctx
            .collaborators
            .persistence
            .post_nodes(ctx.machine.network(), ctx.topology.nodes())
        {
            warn!(node = %id, "failed to persist nodes: {}", e);
        }
        ctx.collaborators
            .renderer
            .draw_live(ctx.topology.nodes(), ctx.topology.edges());

        DropOutcome::Added { id, discarded }
    }
}
