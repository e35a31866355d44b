//! Slide transition engine.
//!
//! The crate holds everything that has temporal or navigational logic and none
//! of the GPU plumbing. The flow for a single navigation request is:
//!
//! ```text
//!   navigate(Next) ──▶ TransitionMachine ──▶ SlideSurface::set_source(Next, i)
//!                            │
//!        frame() ×N ────────▶├─▶ EaseOut::advance ──▶ SlideSurface::set_transition_timer
//!                            │
//!   poll(now ≥ deadline) ───▶└─▶ SlideSurface::set_source(Active, i), drawing off
//! ```
//!
//! Visual progress is driven by frames while the commit is driven by a
//! wall-clock deadline; the two clocks are never merged. Hosts that fail to
//! bring up a GPU use [`DegradedSlides`] instead, which follows the same
//! navigation rule without animation.

mod easing;
mod fallback;
mod machine;
mod navigation;
mod slides;
mod slots;
mod state;

pub use easing::{EaseOut, DEFAULT_DECAY, DEFAULT_SNAP_THRESHOLD, TIMER_TARGET};
pub use fallback::{DegradedSlides, FallbackSink};
pub use machine::{
    CommitOutcome, Ignored, NavigationOutcome, SlideEvent, SlideResponse, SlideSurface,
    TransitionConfig, TransitionMachine, DEFAULT_SETTLE_DELAY,
};
pub use navigation::{resolve_target, Direction};
pub use slides::{SlideIndex, SlideSet, DISPLACEMENT_INDEX, FIRST_SLIDE};
pub use slots::{Slot, SlotTable, TextureSlot};
pub use state::{Phase, TransitionState};

/// Failures surfaced by the transition engine and its collaborators.
#[derive(Debug, thiserror::Error)]
pub enum TransitionError {
    #[error("GPU initialisation failed: {0}")]
    Initialization(String),
    #[error("rendering context lost")]
    ContextLost,
    #[error("failed to load image for {slot} slot (slide {slide}): {reason}")]
    AssetLoad {
        slot: Slot,
        slide: SlideIndex,
        reason: String,
    },
    #[error("invalid navigation direction '{0}' (expected 'next' or 'previous')")]
    InvalidNavigation(String),
    #[error("{0} slot has not been bound")]
    SlotNotBound(Slot),
    #[error("{0} slot is already bound to sampler '{1}'")]
    SlotAlreadyBound(Slot, &'static str),
    #[error("slide set needs a displacement map and at least one slide, got {0} image(s)")]
    EmptySlideSet(usize),
}
