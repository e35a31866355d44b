use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::easing::EaseOut;
use crate::navigation::{resolve_target, Direction};
use crate::slides::{SlideIndex, SlideSet};
use crate::slots::Slot;
use crate::state::TransitionState;
use crate::TransitionError;

/// Wall-clock delay between the start of a transition and its commit.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(1700);

/// Rendering backend as seen by the state machine.
///
/// Implementations own the actual textures and uniforms; the machine only
/// tells them which slide goes into which slot, what the timer uniform reads
/// and whether per-frame drawing should run.
pub trait SlideSurface {
    /// Points `slot` at the image of `slide`. On failure the slot must keep
    /// its previous content.
    fn set_source(&mut self, slot: Slot, slide: SlideIndex) -> Result<(), TransitionError>;
    /// Writes the shared `uTransitionTimer` uniform.
    fn set_transition_timer(&mut self, value: f32);
    /// Enables or suspends per-frame drawing.
    fn set_drawing(&mut self, enabled: bool);
}

/// Tunables for a [`TransitionMachine`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransitionConfig {
    /// Delay from navigation to commit, independent of the easing curve.
    pub settle_delay: Duration,
    pub easing: EaseOut,
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            settle_delay: DEFAULT_SETTLE_DELAY,
            easing: EaseOut::default(),
        }
    }
}

/// Why a navigation request was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ignored {
    /// A transition is already in flight.
    Busy,
    /// There is only one slide, so there is nothing to transition to.
    SingleSlide,
}

#[derive(Debug)]
pub enum NavigationOutcome {
    Started {
        from: SlideIndex,
        to: SlideIndex,
        settle_at: Instant,
        /// Set when the incoming slide could not be loaded; the transition
        /// still runs against the slot's previous content.
        asset_error: Option<TransitionError>,
    },
    Ignored(Ignored),
}

impl NavigationOutcome {
    pub fn is_started(&self) -> bool {
        matches!(self, NavigationOutcome::Started { .. })
    }
}

#[derive(Debug)]
pub struct CommitOutcome {
    pub active: SlideIndex,
    pub asset_error: Option<TransitionError>,
}

/// Inputs accepted by [`TransitionMachine::dispatch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlideEvent {
    Navigate(Direction),
    /// One display refresh.
    Frame,
    /// Deadline check; commits the transition once the settle delay elapsed.
    Poll,
    ContextLost,
    ContextRestored,
}

/// Result of [`TransitionMachine::dispatch`], one variant per event kind.
#[derive(Debug)]
pub enum SlideResponse {
    Navigation(NavigationOutcome),
    Frame(f64),
    Commit(Option<CommitOutcome>),
    Lost(Option<SlideIndex>),
    Restored,
}

/// Slide navigation and transition state machine.
///
/// The machine is a plain owned value; every operation takes the current
/// time and the backend explicitly so it can be driven from any event loop
/// (or from tests with a synthetic clock).
#[derive(Debug)]
pub struct TransitionMachine {
    state: TransitionState,
    max_index: SlideIndex,
    config: TransitionConfig,
    settle_at: Option<Instant>,
    drawing: bool,
}

impl TransitionMachine {
    pub fn new<T>(slides: &SlideSet<T>, config: TransitionConfig) -> Self {
        Self {
            state: TransitionState::new(),
            max_index: slides.max_index(),
            config,
            settle_at: None,
            drawing: false,
        }
    }

    pub fn state(&self) -> &TransitionState {
        &self.state
    }

    pub fn config(&self) -> &TransitionConfig {
        &self.config
    }

    pub fn max_index(&self) -> SlideIndex {
        self.max_index
    }

    /// Whether the backend is currently asked to draw every frame.
    pub fn is_drawing(&self) -> bool {
        self.drawing
    }

    /// Pending commit deadline, if a transition is in flight.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.settle_at
    }

    /// Pushes the idle state into a freshly created or restored backend.
    pub fn sync(&mut self, surface: &mut impl SlideSurface) -> Result<(), TransitionError> {
        let active = self.state.active_index();
        surface.set_source(Slot::Active, active)?;
        surface.set_source(Slot::Next, active)?;
        surface.set_transition_timer(self.state.progress() as f32);
        self.set_drawing(surface, self.state.is_changing());
        Ok(())
    }

    /// Starts a transition in `direction` unless one is already running.
    pub fn navigate(
        &mut self,
        direction: Direction,
        now: Instant,
        surface: &mut impl SlideSurface,
    ) -> NavigationOutcome {
        if self.state.is_changing() {
            debug!(%direction, "navigation ignored; transition in flight");
            return NavigationOutcome::Ignored(Ignored::Busy);
        }

        let from = self.state.active_index();
        let to = resolve_target(direction, from, self.max_index);
        if to == from {
            debug!(%direction, slide = from, "navigation ignored; single slide");
            return NavigationOutcome::Ignored(Ignored::SingleSlide);
        }

        self.set_drawing(surface, true);
        self.state.begin(to);
        let asset_error = surface.set_source(Slot::Next, to).err();
        if let Some(err) = asset_error.as_ref() {
            warn!(slide = to, error = %err, "incoming slide unavailable; keeping previous texture");
        }

        let settle_at = now + self.config.settle_delay;
        self.settle_at = Some(settle_at);
        info!(
            from,
            to,
            %direction,
            frames = ?self.config.easing.frames_to_target(),
            "transition started"
        );

        NavigationOutcome::Started {
            from,
            to,
            settle_at,
            asset_error,
        }
    }

    /// Advances the easing timer for one frame and writes the uniform.
    pub fn frame(&mut self, surface: &mut impl SlideSurface) -> f64 {
        if self.state.is_changing() {
            let progress = self.config.easing.advance(self.state.progress());
            self.state.set_progress(progress);
        }
        let progress = self.state.progress();
        surface.set_transition_timer(progress as f32);
        progress
    }

    /// Commits the in-flight transition once its settle deadline passed.
    pub fn poll(
        &mut self,
        now: Instant,
        surface: &mut impl SlideSurface,
    ) -> Option<CommitOutcome> {
        match self.settle_at {
            Some(deadline) if now >= deadline => Some(self.commit(surface)),
            _ => None,
        }
    }

    fn commit(&mut self, surface: &mut impl SlideSurface) -> CommitOutcome {
        self.settle_at = None;
        self.set_drawing(surface, false);
        let previous = self.state.active_index();
        let active = self.state.commit().unwrap_or(previous);
        let asset_error = surface.set_source(Slot::Active, active).err();
        if let Some(err) = asset_error.as_ref() {
            warn!(slide = active, error = %err, "settled slide unavailable; keeping previous texture");
        }
        surface.set_transition_timer(0.0);
        info!(from = previous, active, "transition settled");
        CommitOutcome {
            active,
            asset_error,
        }
    }

    /// Drops the in-flight transition after the rendering context went away.
    ///
    /// The active slide survives; the pending commit is cancelled. Returns the
    /// slide that was being transitioned to, if any.
    pub fn context_lost(&mut self) -> Option<SlideIndex> {
        self.settle_at = None;
        self.drawing = false;
        let abandoned = self.state.abandon();
        warn!(
            active = self.state.active_index(),
            abandoned = ?abandoned,
            "rendering context lost; transition state reset"
        );
        abandoned
    }

    /// Re-establishes slot contents and uniforms on a restored backend.
    pub fn context_restored(
        &mut self,
        surface: &mut impl SlideSurface,
    ) -> Result<(), TransitionError> {
        self.sync(surface)?;
        info!(active = self.state.active_index(), "rendering context restored");
        Ok(())
    }

    /// Single entry point for hosts that model input as an event queue.
    pub fn dispatch(
        &mut self,
        event: SlideEvent,
        now: Instant,
        surface: &mut impl SlideSurface,
    ) -> Result<SlideResponse, TransitionError> {
        let response = match event {
            SlideEvent::Navigate(direction) => {
                SlideResponse::Navigation(self.navigate(direction, now, surface))
            }
            SlideEvent::Frame => SlideResponse::Frame(self.frame(surface)),
            SlideEvent::Poll => SlideResponse::Commit(self.poll(now, surface)),
            SlideEvent::ContextLost => SlideResponse::Lost(self.context_lost()),
            SlideEvent::ContextRestored => {
                self.context_restored(surface)?;
                SlideResponse::Restored
            }
        };
        Ok(response)
    }

    fn set_drawing(&mut self, surface: &mut impl SlideSurface, enabled: bool) {
        self.drawing = enabled;
        surface.set_drawing(enabled);
    }
}
