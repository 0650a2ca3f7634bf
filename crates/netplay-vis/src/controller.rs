//! Playback buttons.
//!
//! One controller type serves both the owner's view and the shared view. The
//! only differences are the redraw used when playback stops and whether a
//! click in `Idle` may start a simulation.
//!
//! | From    | Guard       | Action                                        | To        |
//! |---------|-------------|-----------------------------------------------|-----------|
//! | Idle    | no jobs     | "no jobs" notice                              | Idle      |
//! | Idle    | jobs        | disable, "Simulating", run backend            | Computing |
//! | Ready   | no packets  | log                                           | Ready     |
//! | Ready   | packets     | "Stop", danger, static redraw with packets    | Playing   |
//! | Playing | no packets  | cancel timers, "Simulate", primary            | Idle      |
//! | Playing | packets     | cancel timers, "Run", success, live/shared    | Ready     |

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::ButtonLabels;
use crate::context::PlaybackContext;
use crate::error::Result;
use crate::playback::PlaybackState;

/// Visual style of a control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonStyle {
    Primary,
    Secondary,
    Success,
    Danger,
}

impl ButtonStyle {
    /// CSS class of the style.
    pub const fn css_class(&self) -> &'static str {
        match self {
            ButtonStyle::Primary => "btn-primary",
            ButtonStyle::Secondary => "btn-secondary",
            ButtonStyle::Success => "btn-success",
            ButtonStyle::Danger => "btn-danger",
        }
    }
}

/// What a control currently looks like.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonAffordance {
    pub label: String,
    pub style: ButtonStyle,
    pub disabled: bool,
}

impl ButtonAffordance {
    /// The look a control has in `state`.
    pub fn for_state(state: PlaybackState, labels: &ButtonLabels) -> Self {
        let (label, style, disabled) = match state {
            PlaybackState::Idle => (&labels.simulate, ButtonStyle::Primary, false),
            PlaybackState::Computing => (&labels.simulating, ButtonStyle::Secondary, true),
            PlaybackState::Ready => (&labels.run, ButtonStyle::Success, false),
            PlaybackState::Playing => (&labels.stop, ButtonStyle::Danger, false),
        };
        Self {
            label: label.clone(),
            style,
            disabled,
        }
    }
}

/// Which redraw a controller uses when playback stops with a result left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedrawStrategy {
    /// Owner's view: editable live redraw; may start simulations
    Static,
    /// Shared view: read-only redraw; cannot start simulations
    Shared,
}

/// What a click did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClickOutcome {
    /// Idle with an empty job queue; notice shown
    NoJobs,
    /// Idle to Computing
    SimulationStarted,
    /// Ready without packets; nothing to play
    NoPackets,
    /// Ready to Playing
    PlaybackStarted,
    /// Playing to Ready or Idle
    PlaybackStopped { to: PlaybackState },
    /// The click has no meaning in the current state for this control
    Ignored,
}

/// A playback button bound to the shared [`PlaybackContext`].
#[derive(Debug, Clone)]
pub struct PlaybackButtonController {
    strategy: RedrawStrategy,
    labels: ButtonLabels,
    affordance: ButtonAffordance,
}

impl PlaybackButtonController {
    /// Create a controller showing the look of `state`.
    pub fn new(strategy: RedrawStrategy, labels: ButtonLabels, state: PlaybackState) -> Self {
        let affordance = ButtonAffordance::for_state(state, &labels);
        Self {
            strategy,
            labels,
            affordance,
        }
    }

    pub fn strategy(&self) -> RedrawStrategy {
        self.strategy
    }

    pub fn affordance(&self) -> &ButtonAffordance {
        &self.affordance
    }

    /// Match the control to a state changed elsewhere.
    pub fn sync(&mut self, state: PlaybackState) {
        self.affordance = ButtonAffordance::for_state(state, &self.labels);
    }

    /// Handle a click on this control.
    pub fn on_click(&mut self, ctx: &mut PlaybackContext) -> Result<ClickOutcome> {
        match ctx.machine.state() {
            PlaybackState::Idle => self.start_simulation(ctx),
            PlaybackState::Computing => {
                debug!("click while computing ignored");
                Ok(ClickOutcome::Ignored)
            }
            PlaybackState::Ready => self.start_playback(ctx),
            PlaybackState::Playing => self.stop_playback(ctx),
        }
    }

    fn start_simulation(&mut self, ctx: &mut PlaybackContext) -> Result<ClickOutcome> {
        if self.strategy == RedrawStrategy::Shared {
            debug!("shared view cannot start a simulation");
            return Ok(ClickOutcome::Ignored);
        }

        if ctx.jobs.is_empty() {
            ctx.collaborators.notices.show_no_jobs();
            return Ok(ClickOutcome::NoJobs);
        }

        ctx.collaborators.backend.run_simulation(ctx.machine.network());
        ctx.machine.set_state(PlaybackState::Computing)?;
        self.sync(PlaybackState::Computing);
        Ok(ClickOutcome::SimulationStarted)
    }

    fn start_playback(&mut self, ctx: &mut PlaybackContext) -> Result<ClickOutcome> {
        if ctx.packets.is_empty() {
            info!(network = %ctx.machine.network(), "no packets to play");
            return Ok(ClickOutcome::NoPackets);
        }

        ctx.machine.set_state(PlaybackState::Playing)?;
        self.sync(PlaybackState::Playing);
        ctx.collaborators.renderer.draw_static_with_packets(
            ctx.topology.nodes(),
            ctx.topology.edges(),
            &ctx.packets,
            &mut ctx.timers,
        );
        Ok(ClickOutcome::PlaybackStarted)
    }

    fn stop_playback(&mut self, ctx: &mut PlaybackContext) -> Result<ClickOutcome> {
        ctx.timers.cancel_all_pending();

        if ctx.packets.is_empty() {
            ctx.machine.set_state(PlaybackState::Idle)?;
            self.sync(PlaybackState::Idle);
            return Ok(ClickOutcome::PlaybackStopped {
                to: PlaybackState::Idle,
            });
        }

        let (nodes, edges) = (ctx.topology.nodes(), ctx.topology.edges());
        match self.strategy {
            RedrawStrategy::Static => ctx.collaborators.renderer.draw_live(nodes, edges),
            RedrawStrategy::Shared => ctx.collaborators.renderer.draw_shared(nodes, edges),
        }
        ctx.machine.set_state(PlaybackState::Ready)?;
        self.sync(PlaybackState::Ready);
        Ok(ClickOutcome::PlaybackStopped {
            to: PlaybackState::Ready,
        })
    }
}
