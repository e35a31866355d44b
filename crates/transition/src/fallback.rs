use tracing::info;

use crate::machine::TransitionMachine;
use crate::navigation::{resolve_target, Direction};
use crate::slides::{SlideIndex, SlideSet, FIRST_SLIDE};

/// Output port for hosts running without a GPU.
///
/// The sink receives the slide that should be visible; how it is shown (a
/// static image, a title, a status line) is up to the host.
pub trait FallbackSink {
    fn show(&mut self, slide: SlideIndex, max_index: SlideIndex);
}

/// Navigation without animation, used when GPU initialisation fails.
///
/// Follows the same ring rule as [`TransitionMachine`] but switches slides
/// immediately, so there is never anything in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DegradedSlides {
    active: SlideIndex,
    max_index: SlideIndex,
}

impl DegradedSlides {
    pub fn new<T>(slides: &SlideSet<T>) -> Self {
        Self {
            active: FIRST_SLIDE,
            max_index: slides.max_index(),
        }
    }

    /// Continues from the machine's active slide; any in-flight transition is dropped.
    pub fn from_machine(machine: &TransitionMachine) -> Self {
        Self {
            active: machine.state().active_index(),
            max_index: machine.max_index(),
        }
    }

    pub fn active_index(&self) -> SlideIndex {
        self.active
    }

    pub fn max_index(&self) -> SlideIndex {
        self.max_index
    }

    /// Publishes the current slide to `sink`.
    pub fn present(&self, sink: &mut impl FallbackSink) {
        sink.show(self.active, self.max_index);
    }

    /// Switches straight to the neighbouring slide and publishes it.
    pub fn navigate(&mut self, direction: Direction, sink: &mut impl FallbackSink) -> SlideIndex {
        self.active = resolve_target(direction, self.active, self.max_index);
        info!(active = self.active, %direction, "degraded mode slide change");
        self.present(sink);
        self.active
    }
}
