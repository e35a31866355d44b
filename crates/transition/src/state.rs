use crate::slides::{SlideIndex, FIRST_SLIDE};

/// Coarse phase of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Transitioning,
}

/// Mutable slide state owned by a [`TransitionMachine`](crate::TransitionMachine).
///
/// Invariants kept by the machine:
/// - when not changing, `next` is `None` and `progress` is `0.0`;
/// - `active` never moves while a transition is in flight;
/// - `active` and `next` are distinct slide indices.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionState {
    active: SlideIndex,
    next: Option<SlideIndex>,
    changing: bool,
    progress: f64,
}

impl TransitionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_index(&self) -> SlideIndex {
        self.active
    }

    pub fn next_index(&self) -> Option<SlideIndex> {
        self.next
    }

    pub fn is_changing(&self) -> bool {
        self.changing
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn phase(&self) -> Phase {
        if self.changing {
            Phase::Transitioning
        } else {
            Phase::Idle
        }
    }

    pub(crate) fn begin(&mut self, next: SlideIndex) {
        debug_assert!(!self.changing, "transition started while another is in flight");
        debug_assert_ne!(next, self.active, "transition target equals active slide");
        self.changing = true;
        self.next = Some(next);
        self.progress = 0.0;
    }

    pub(crate) fn set_progress(&mut self, progress: f64) {
        debug_assert!(progress >= self.progress, "transition progress went backwards");
        self.progress = progress;
    }

    /// Promotes `next` into `active` and returns to idle.
    pub(crate) fn commit(&mut self) -> Option<SlideIndex> {
        let promoted = self.next.take()?;
        self.active = promoted;
        self.changing = false;
        self.progress = 0.0;
        Some(promoted)
    }

    /// Drops any in-flight transition, keeping the active slide.
    pub(crate) fn abandon(&mut self) -> Option<SlideIndex> {
        let dropped = self.next.take();
        self.changing = false;
        self.progress = 0.0;
        dropped
    }
}

impl Default for TransitionState {
    fn default() -> Self {
        Self {
            active: FIRST_SLIDE,
            next: None,
            changing: false,
            progress: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_idle_on_first_slide() {
        let state = TransitionState::new();
        assert_eq!(state.active_index(), 1);
        assert_eq!(state.next_index(), None);
        assert!(!state.is_changing());
        assert_eq!(state.progress(), 0.0);
        assert_eq!(state.phase(), Phase::Idle);
    }

    #[test]
    fn commit_promotes_next_and_resets_progress() {
        let mut state = TransitionState::new();
        state.begin(3);
        state.set_progress(45.0);
        assert_eq!(state.phase(), Phase::Transitioning);
        assert_eq!(state.commit(), Some(3));
        assert_eq!(state, TransitionState { active: 3, ..TransitionState::new() });
    }

    #[test]
    fn abandon_keeps_active_slide() {
        let mut state = TransitionState::new();
        state.begin(2);
        state.set_progress(12.0);
        assert_eq!(state.abandon(), Some(2));
        assert_eq!(state, TransitionState::new());
    }
}
