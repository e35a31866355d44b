use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use tracing::{debug, error, info, warn};
use transition::{
    DegradedSlides, Direction, FallbackSink, NavigationOutcome, SlideIndex, SlideSet,
    TransitionError, TransitionMachine,
};
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, Event, MouseButton, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop, EventLoopWindowTarget};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowBuilder};

use crate::gpu::{DeviceLost, GpuState};
use crate::types::RendererConfig;

/// Rebuild attempts after a device loss before giving up on the GPU.
const RESTORE_ATTEMPTS: u32 = 3;

/// What a key press asks the host to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum KeyAction {
    Navigate(Direction),
    CycleDisplacement,
    Close,
}

pub(crate) fn action_for_key(key: &Key) -> Option<KeyAction> {
    match key {
        Key::Named(NamedKey::ArrowRight) | Key::Named(NamedKey::Space) => {
            Some(KeyAction::Navigate(Direction::Next))
        }
        Key::Named(NamedKey::ArrowLeft) => Some(KeyAction::Navigate(Direction::Previous)),
        Key::Named(NamedKey::Escape) => Some(KeyAction::Close),
        Key::Character(value) if value.as_str() == " " => {
            Some(KeyAction::Navigate(Direction::Next))
        }
        Key::Character(value) if value.as_str().eq_ignore_ascii_case("d") => {
            Some(KeyAction::CycleDisplacement)
        }
        _ => None,
    }
}

/// Clicks on the left half go back, everything else goes forward.
pub(crate) fn direction_for_click(x: f64, width: u32) -> Direction {
    if x < f64::from(width) / 2.0 {
        Direction::Previous
    } else {
        Direction::Next
    }
}

struct Engine {
    gpu: GpuState,
    machine: TransitionMachine,
}

enum Presentation {
    Animated(Engine),
    Degraded(DegradedSlides),
}

/// Publishes the degraded-mode slide through the window title.
struct TitleSink<'a> {
    window: &'a Window,
    title: &'a str,
}

impl FallbackSink for TitleSink<'_> {
    fn show(&mut self, slide: SlideIndex, max_index: SlideIndex) {
        self.window
            .set_title(&format!("{} (slide {slide}/{max_index})", self.title));
        info!(slide, max_index, "showing slide without animation");
    }
}

/// Owns the window and whichever presentation path is currently live.
struct WindowHost {
    window: Arc<Window>,
    config: RendererConfig,
    displacement: usize,
    presentation: Presentation,
    cursor_x: f64,
}

impl WindowHost {
    fn new(window: Arc<Window>, config: RendererConfig) -> Result<Self> {
        let sources = slide_set(&config, 0)?;
        let mut host = Self {
            window,
            config,
            displacement: 0,
            presentation: Presentation::Degraded(DegradedSlides::new(&sources)),
            cursor_x: 0.0,
        };

        if host.config.force_degraded {
            info!("GPU disabled by configuration; slides change without animation");
            host.show_degraded();
            return Ok(host);
        }

        match host.start_engine() {
            Ok(engine) => host.presentation = Presentation::Animated(engine),
            Err(err) => {
                let failure = TransitionError::Initialization(format!("{err:#}"));
                error!(error = %failure, "continuing without animation");
                host.show_degraded();
            }
        }
        Ok(host)
    }

    fn sources(&self) -> Result<SlideSet<PathBuf>> {
        slide_set(&self.config, self.displacement)
    }

    fn create_gpu(&self, sources: SlideSet<PathBuf>) -> Result<GpuState> {
        GpuState::new(
            self.window.as_ref(),
            self.window.inner_size(),
            self.config.antialiasing,
            sources,
        )
    }

    fn start_engine(&self) -> Result<Engine> {
        let sources = self.sources()?;
        let mut machine = TransitionMachine::new(&sources, self.config.transition);
        let mut gpu = self.create_gpu(sources)?;
        if let Err(err) = machine.sync(&mut gpu) {
            warn!(error = %err, "initial slide could not be shown");
        }
        Ok(Engine { gpu, machine })
    }

    fn show_degraded(&mut self) {
        if let Presentation::Degraded(slides) = &self.presentation {
            slides.present(&mut TitleSink {
                window: self.window.as_ref(),
                title: &self.config.title,
            });
        }
    }

    fn navigate(&mut self, direction: Direction) {
        match &mut self.presentation {
            Presentation::Animated(engine) => {
                let outcome =
                    engine
                        .machine
                        .navigate(direction, Instant::now(), &mut engine.gpu);
                if let NavigationOutcome::Started { .. } = outcome {
                    self.window.request_redraw();
                }
            }
            Presentation::Degraded(slides) => {
                slides.navigate(
                    direction,
                    &mut TitleSink {
                        window: self.window.as_ref(),
                        title: &self.config.title,
                    },
                );
            }
        }
    }

    /// Recreates the engine around the next configured displacement map.
    ///
    /// The new engine starts over at the first slide.
    fn cycle_displacement(&mut self) {
        let count = self.config.displacements.len();
        if count < 2 {
            debug!("only one displacement map configured");
            return;
        }
        if let Presentation::Degraded(_) = self.presentation {
            debug!("displacement change ignored without a GPU");
            return;
        }

        self.displacement = (self.displacement + 1) % count;
        info!(
            path = %self.config.displacements[self.displacement].display(),
            "switching displacement map"
        );

        // Release the old surface before a new one is created on the same window.
        let fallback = match self.sources() {
            Ok(sources) => DegradedSlides::new(&sources),
            Err(err) => {
                error!(error = %format!("{err:#}"), "invalid slide set");
                return;
            }
        };
        drop(std::mem::replace(
            &mut self.presentation,
            Presentation::Degraded(fallback),
        ));

        match self.start_engine() {
            Ok(engine) => {
                self.presentation = Presentation::Animated(engine);
                self.window.request_redraw();
            }
            Err(err) => {
                let failure = TransitionError::Initialization(format!("{err:#}"));
                error!(error = %failure, "continuing without animation");
                self.show_degraded();
            }
        }
    }

    /// Rebuilds the GPU backend in place after the device went away.
    ///
    /// The active slide survives; an in-flight transition is dropped. After
    /// [`RESTORE_ATTEMPTS`] failures the host stays in degraded mode.
    fn recover(&mut self, lost: DeviceLost) {
        warn!(
            reason = ?lost.reason,
            message = %lost.message,
            "GPU device lost"
        );
        let fallback = match &mut self.presentation {
            Presentation::Animated(engine) => {
                engine.machine.context_lost();
                DegradedSlides::from_machine(&engine.machine)
            }
            Presentation::Degraded(_) => return,
        };
        let Presentation::Animated(Engine { gpu, mut machine }) = std::mem::replace(
            &mut self.presentation,
            Presentation::Degraded(fallback),
        ) else {
            return;
        };
        drop(gpu);

        let sources = match self.sources() {
            Ok(sources) => sources,
            Err(err) => {
                error!(error = %format!("{err:#}"), "invalid slide set");
                self.show_degraded();
                return;
            }
        };
        match restore_with_retries(RESTORE_ATTEMPTS, |_| self.create_gpu(sources.clone())) {
            Ok(mut gpu) => {
                if let Err(err) = machine.context_restored(&mut gpu) {
                    warn!(error = %err, "slide textures could not be refreshed");
                }
                self.presentation = Presentation::Animated(Engine { gpu, machine });
                self.window.request_redraw();
            }
            Err(err) => {
                error!(
                    error = %err,
                    attempts = RESTORE_ATTEMPTS,
                    "GPU could not be restored; continuing without animation"
                );
                self.show_degraded();
            }
        }
    }

    fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if let Presentation::Animated(engine) = &mut self.presentation {
            engine.gpu.resize(new_size);
            self.window.request_redraw();
        }
    }

    fn redraw(&mut self, elwt: &EventLoopWindowTarget<()>) {
        let Presentation::Animated(engine) = &mut self.presentation else {
            return;
        };
        if engine.machine.is_drawing() {
            engine.machine.frame(&mut engine.gpu);
        }
        match engine.gpu.render() {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                let size = engine.gpu.size();
                engine.gpu.resize(size);
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                error!("surface out of memory; exiting");
                elwt.exit();
            }
            Err(wgpu::SurfaceError::Timeout) => {
                warn!("surface timeout; retrying next frame");
            }
            Err(other) => {
                warn!("surface error: {other:?}; retrying next frame");
            }
        }
    }

    /// Runs between event batches: device-loss checks, settle deadlines and
    /// frame scheduling.
    fn about_to_wait(&mut self, elwt: &EventLoopWindowTarget<()>) {
        let lost = match &self.presentation {
            Presentation::Animated(engine) => engine.gpu.take_device_lost(),
            Presentation::Degraded(_) => None,
        };
        if let Some(lost) = lost {
            self.recover(lost);
        }

        let Presentation::Animated(engine) = &mut self.presentation else {
            elwt.set_control_flow(ControlFlow::Wait);
            return;
        };

        let now = Instant::now();
        if let Some(commit) = engine.machine.poll(now, &mut engine.gpu) {
            debug!(active = commit.active, "settled; drawing final frame");
            self.window.request_redraw();
        }

        if engine.gpu.is_drawing() {
            self.window.request_redraw();
        }
        match engine.machine.next_deadline() {
            Some(deadline) => elwt.set_control_flow(ControlFlow::WaitUntil(deadline)),
            None => elwt.set_control_flow(ControlFlow::Wait),
        }
    }
}

/// Runs `rebuild` up to `attempts` times, returning the first success.
///
/// Exhausting every attempt leaves the context lost.
fn restore_with_retries<T>(
    attempts: u32,
    mut rebuild: impl FnMut(u32) -> Result<T>,
) -> Result<T, TransitionError> {
    for attempt in 1..=attempts {
        match rebuild(attempt) {
            Ok(value) => return Ok(value),
            Err(err) => warn!(attempt, error = %format!("{err:#}"), "GPU restoration failed"),
        }
    }
    Err(TransitionError::ContextLost)
}

fn slide_set(config: &RendererConfig, displacement: usize) -> Result<SlideSet<PathBuf>> {
    let map = config
        .displacements
        .get(displacement)
        .cloned()
        .ok_or_else(|| anyhow!("no displacement map configured"))?;
    SlideSet::from_parts(map, config.slides.iter().cloned()).map_err(anyhow::Error::from)
}

/// Opens the slideshow window and drives the `winit` event loop until it closes.
pub(crate) fn run_window(config: RendererConfig) -> Result<()> {
    let event_loop = EventLoop::new().context("failed to initialize event loop")?;
    let window = WindowBuilder::new()
        .with_title(config.title.as_str())
        .with_inner_size(PhysicalSize::new(
            config.surface_size.0,
            config.surface_size.1,
        ))
        .build(&event_loop)
        .context("failed to create slideshow window")?;
    let window = Arc::new(window);

    let mut host = WindowHost::new(Arc::clone(&window), config)?;
    window.request_redraw();

    event_loop
        .run(move |event, elwt| match event {
            Event::WindowEvent { window_id, event } if window_id == host.window.id() => {
                match event {
                    WindowEvent::CloseRequested | WindowEvent::Destroyed => elwt.exit(),
                    WindowEvent::KeyboardInput { event, .. } => {
                        if event.state != ElementState::Pressed || event.repeat {
                            return;
                        }
                        match action_for_key(&event.logical_key) {
                            Some(KeyAction::Navigate(direction)) => host.navigate(direction),
                            Some(KeyAction::CycleDisplacement) => host.cycle_displacement(),
                            Some(KeyAction::Close) => elwt.exit(),
                            None => {}
                        }
                    }
                    WindowEvent::CursorMoved { position, .. } => host.cursor_x = position.x,
                    WindowEvent::MouseInput {
                        state: ElementState::Pressed,
                        button: MouseButton::Left,
                        ..
                    } => {
                        let width = host.window.inner_size().width;
                        host.navigate(direction_for_click(host.cursor_x, width));
                    }
                    WindowEvent::Resized(new_size) => host.resize(new_size),
                    WindowEvent::RedrawRequested => host.redraw(elwt),
                    _ => {}
                }
            }
            Event::AboutToWait => host.about_to_wait(elwt),
            _ => {}
        })
        .map_err(|err| anyhow!("window event loop error: {err}"))
}
