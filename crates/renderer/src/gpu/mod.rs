//! `wgpu` backend for the transition engine.
//!
//! - `context` owns the instance/device/surface wiring and reports device
//!   loss over a channel.
//! - `slots` turns decoded images into slot textures and samplers.
//! - `pipeline` compiles the GLSL pair and owns the bind group layouts.
//! - `uniforms` mirrors the `SlideParams` block and the cover-crop matrices.
//! - `state` glues everything together as the [`transition::SlideSurface`]
//!   driven by the window host.

mod context;
mod pipeline;
mod slots;
mod state;
pub(crate) mod uniforms;

pub(crate) use context::DeviceLost;
pub(crate) use state::GpuState;
