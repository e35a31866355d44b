//! Renderer crate for slidewall.
//!
//! Hosts the transition engine from the `transition` crate on a `winit`
//! window with a `wgpu` backend. The overall flow is:
//!
//! ```text
//!   CLI / slidewall
//!          │ RendererConfig
//!          ▼
//!   Renderer::run ──▶ WindowHost ──▶ winit event loop
//!                         │
//!                         ├─▶ TransitionMachine (navigation, easing, settle deadline)
//!                         └─▶ GpuState (SlideSurface: slot textures, SlideParams UBO)
//! ```
//!
//! When the GPU cannot be brought up, or is lost and cannot be restored, the
//! host switches to [`transition::DegradedSlides`] and reports the visible
//! slide through the window title. [`reference`] evaluates the transition
//! shader on the CPU for tests and still-frame export.

mod assets;
mod compile;
mod gpu;
pub mod reference;
mod types;
mod window;

use anyhow::Result;

pub use assets::{load_image, ImageCache};
pub use types::{Antialiasing, RendererConfig};

/// High-level entry point that owns the chosen configuration.
pub struct Renderer {
    config: RendererConfig,
}

impl Renderer {
    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Opens the slideshow window and blocks until it is closed.
    ///
    /// Fails when the event loop or window cannot be created or when the
    /// configuration holds no displacement map or no slides. GPU failures do
    /// not surface here; the window falls back to degraded mode instead.
    pub fn run(self) -> Result<()> {
        window::run_window(self.config)
    }
}
