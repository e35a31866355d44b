use std::path::PathBuf;

use transition::TransitionConfig;

/// Anti-aliasing policy for the render pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Antialiasing {
    /// Pick the highest sample count supported by the surface format.
    #[default]
    Auto,
    /// Disable MSAA and render directly into the swapchain.
    Off,
    /// Request a specific MSAA sample count (clamped to what the device supports).
    Samples(u32),
}

/// Immutable configuration passed to the renderer at start-up.
///
/// `RendererConfig` mirrors the merged CLI flags and configuration file: which
/// images to show, which displacement maps are available and how the window
/// and the transition should behave.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Window size in physical pixels.
    pub surface_size: (u32, u32),
    /// Base window title; degraded mode appends the slide counter.
    pub title: String,
    /// Navigable slides in display order.
    pub slides: Vec<PathBuf>,
    /// Displacement maps; the first one is used at start-up and `D` cycles
    /// through the rest.
    pub displacements: Vec<PathBuf>,
    /// Anti-aliasing mode requested by the caller.
    pub antialiasing: Antialiasing,
    /// Settle delay and easing curve for the transition machine.
    pub transition: TransitionConfig,
    /// Skip GPU initialisation and start in degraded mode.
    pub force_degraded: bool,
}

impl Default for RendererConfig {
    /// Provides a 720p window with no images selected.
    fn default() -> Self {
        Self {
            surface_size: (1280, 720),
            title: "slidewall".to_string(),
            slides: Vec::new(),
            displacements: Vec::new(),
            antialiasing: Antialiasing::default(),
            transition: TransitionConfig::default(),
            force_degraded: false,
        }
    }
}
