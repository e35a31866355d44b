use std::time::{Duration, Instant};

use transition::{
    Direction, Ignored, NavigationOutcome, Phase, SlideIndex, SlideSet, SlideSurface, Slot,
    TransitionConfig, TransitionError, TransitionMachine, DEFAULT_SETTLE_DELAY,
};

/// Backend double that records what the machine asked for.
#[derive(Default)]
struct RecordingSurface {
    active: Option<SlideIndex>,
    next: Option<SlideIndex>,
    timer_writes: Vec<f32>,
    drawing: bool,
}

impl SlideSurface for RecordingSurface {
    fn set_source(&mut self, slot: Slot, slide: SlideIndex) -> Result<(), TransitionError> {
        match slot {
            Slot::Active => self.active = Some(slide),
            Slot::Next => self.next = Some(slide),
            Slot::Displacement => unreachable!("displacement is never rebound"),
        }
        Ok(())
    }

    fn set_transition_timer(&mut self, value: f32) {
        self.timer_writes.push(value);
    }

    fn set_drawing(&mut self, enabled: bool) {
        self.drawing = enabled;
    }
}

struct Harness {
    machine: TransitionMachine,
    surface: RecordingSurface,
    clock: Instant,
}

impl Harness {
    fn new(max_index: usize) -> Self {
        let images: Vec<String> = (0..=max_index).map(|i| format!("image-{i}")).collect();
        let set = SlideSet::new(images).unwrap();
        let mut machine = TransitionMachine::new(&set, TransitionConfig::default());
        let mut surface = RecordingSurface::default();
        machine.sync(&mut surface).unwrap();
        Self {
            machine,
            surface,
            clock: Instant::now(),
        }
    }

    fn navigate(&mut self, direction: Direction) -> NavigationOutcome {
        self.machine
            .navigate(direction, self.clock, &mut self.surface)
    }

    /// Runs 60 FPS frames until the settle deadline fires.
    fn settle(&mut self) -> SlideIndex {
        let frame = Duration::from_micros(16_667);
        let mut last = self.machine.state().progress();
        loop {
            self.clock += frame;
            let progress = self.machine.frame(&mut self.surface);
            assert!(progress >= last, "progress went backwards");
            last = progress;
            if let Some(commit) = self.machine.poll(self.clock, &mut self.surface) {
                return commit.active;
            }
        }
    }

    fn active(&self) -> SlideIndex {
        self.machine.state().active_index()
    }
}

#[test]
fn ring_scenario_with_four_slides() {
    let mut harness = Harness::new(4);
    assert_eq!(harness.active(), 1);

    match harness.navigate(Direction::Next) {
        NavigationOutcome::Started { to, .. } => assert_eq!(to, 2),
        other => panic!("unexpected outcome {other:?}"),
    }
    assert_eq!(harness.machine.state().next_index(), Some(2));
    assert_eq!(harness.settle(), 2);

    let mut visited = Vec::new();
    for _ in 0..3 {
        harness.navigate(Direction::Next);
        visited.push(harness.settle());
    }
    assert_eq!(visited, vec![3, 4, 1]);

    harness.navigate(Direction::Next);
    assert_eq!(harness.settle(), 2);
}

#[test]
fn previous_from_first_slide_wraps_to_last() {
    let mut harness = Harness::new(4);
    match harness.navigate(Direction::Previous) {
        NavigationOutcome::Started { from, to, .. } => assert_eq!((from, to), (1, 4)),
        other => panic!("unexpected outcome {other:?}"),
    }
    assert_eq!(harness.surface.next, Some(4));
    assert_eq!(harness.settle(), 4);
    assert_eq!(harness.surface.active, Some(4));
}

#[test]
fn settled_index_matches_rule_for_every_sequence() {
    let directions = [Direction::Next, Direction::Previous];
    for max_index in 2..=5 {
        for pattern in 0u32..64 {
            let mut harness = Harness::new(max_index);
            let mut expected = 1;
            for step in 0..6 {
                let direction = directions[((pattern >> step) & 1) as usize];
                expected = transition::resolve_target(direction, expected, max_index);
                harness.navigate(direction);
                assert_eq!(harness.settle(), expected);
            }
        }
    }
}

#[test]
fn next_then_previous_round_trips() {
    for max_index in 2..=5 {
        for start in 1..=max_index {
            for (first, second) in [
                (Direction::Next, Direction::Previous),
                (Direction::Previous, Direction::Next),
            ] {
                let mut harness = Harness::new(max_index);
                while harness.active() != start {
                    harness.navigate(Direction::Next);
                    harness.settle();
                }
                harness.navigate(first);
                harness.settle();
                harness.navigate(second);
                assert_eq!(harness.settle(), start);
            }
        }
    }
}

#[test]
fn rapid_double_click_only_runs_first_transition() {
    let mut harness = Harness::new(4);
    assert!(harness.navigate(Direction::Next).is_started());
    for _ in 0..10 {
        harness.machine.frame(&mut harness.surface);
    }
    let progress = harness.machine.state().progress();
    assert!(matches!(
        harness.navigate(Direction::Next),
        NavigationOutcome::Ignored(Ignored::Busy)
    ));
    assert_eq!(harness.machine.state().next_index(), Some(2));
    assert_eq!(harness.machine.state().active_index(), 1);
    assert_eq!(harness.machine.state().progress(), progress);
    assert_eq!(harness.settle(), 2);
}

#[test]
fn progress_is_zero_between_transitions() {
    let mut harness = Harness::new(3);
    harness.navigate(Direction::Next);
    harness.settle();
    assert_eq!(harness.machine.state().progress(), 0.0);
    assert_eq!(harness.surface.timer_writes.last(), Some(&0.0));
    assert!(!harness.surface.drawing);

    harness.navigate(Direction::Next);
    assert_eq!(harness.machine.state().progress(), 0.0);
    assert!(harness.surface.drawing);
}

#[test]
fn uniform_reaches_target_before_commit() {
    let mut harness = Harness::new(3);
    harness.navigate(Direction::Next);
    harness.settle();
    let peak = harness
        .surface
        .timer_writes
        .iter()
        .copied()
        .fold(0.0f32, f32::max);
    assert_eq!(peak, 90.0);
    assert_eq!(
        harness.machine.config().easing.frames_to_target(),
        Some(101)
    );
}

#[test]
fn context_loss_mid_transition_returns_to_idle() {
    let mut harness = Harness::new(4);
    harness.navigate(Direction::Next);
    harness.settle();
    assert_eq!(harness.active(), 2);

    harness.navigate(Direction::Next);
    for _ in 0..20 {
        harness.machine.frame(&mut harness.surface);
    }
    assert_eq!(harness.machine.context_lost(), Some(3));

    let mut restored = RecordingSurface::default();
    harness.machine.context_restored(&mut restored).unwrap();
    let state = harness.machine.state();
    assert_eq!(state.phase(), Phase::Idle);
    assert!(!state.is_changing());
    assert_eq!(state.progress(), 0.0);
    assert_eq!(state.active_index(), 2);
    assert_eq!(state.next_index(), None);
    assert_eq!(restored.active, Some(2));

    // The cancelled commit must not fire later.
    let late = harness.clock + DEFAULT_SETTLE_DELAY * 2;
    assert!(harness.machine.poll(late, &mut restored).is_none());
    assert_eq!(harness.active(), 2);
}
