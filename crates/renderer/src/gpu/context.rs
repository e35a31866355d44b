use anyhow::{anyhow, bail, Context as AnyhowContext, Result};
use crossbeam_channel::Sender;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use tracing::{debug, warn};
use wgpu::TextureFormatFeatureFlags;
use winit::dpi::PhysicalSize;

use crate::types::Antialiasing;

/// Reported through the device-lost callback.
#[derive(Debug, Clone)]
pub(crate) struct DeviceLost {
    pub reason: wgpu::DeviceLostReason,
    pub message: String,
}

/// Surface, device and queue for one window.
pub(crate) struct GpuContext {
    pub _instance: wgpu::Instance,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub size: PhysicalSize<u32>,
    pub sample_count: u32,
    pub surface_format: wgpu::TextureFormat,
}

impl GpuContext {
    /// Creates a surface for `target` and a device able to present to it.
    ///
    /// Device loss is forwarded to `device_lost`; the receiver decides when to
    /// rebuild.
    pub(crate) fn new<T>(
        target: &T,
        initial_size: PhysicalSize<u32>,
        antialiasing: Antialiasing,
        device_lost: Sender<DeviceLost>,
    ) -> Result<Self>
    where
        T: HasDisplayHandle + HasWindowHandle,
    {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            flags: wgpu::InstanceFlags::default(),
            memory_budget_thresholds: wgpu::MemoryBudgetThresholds::default(),
            backend_options: wgpu::BackendOptions::default(),
        });

        let window_handle = target
            .window_handle()
            .map_err(|err| anyhow!("failed to acquire window handle: {err}"))?;
        let display_handle = target
            .display_handle()
            .map_err(|err| anyhow!("failed to acquire display handle: {err}"))?;
        let surface = unsafe {
            instance.create_surface_unsafe(wgpu::SurfaceTargetUnsafe::RawHandle {
                raw_display_handle: display_handle.as_raw(),
                raw_window_handle: window_handle.as_raw(),
            })
        }
        .context("failed to create rendering surface")?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("failed to find a suitable GPU adapter")?;
        let info = adapter.get_info();
        let limits = adapter.limits();
        let is_software = info.device_type == wgpu::DeviceType::Cpu;
        debug!(
            name = %info.name,
            backend = ?info.backend,
            device_type = ?info.device_type,
            "selected GPU adapter"
        );

        let size = PhysicalSize::new(initial_size.width.max(1), initial_size.height.max(1));
        let max_dimension = limits.max_texture_dimension_2d;
        if size.width > max_dimension || size.height > max_dimension {
            bail!(
                "window is {}x{} but the GPU supports at most {max_dimension} pixels per side",
                size.width,
                size.height
            );
        }

        let capabilities = surface.get_capabilities(&adapter);
        let surface_format = choose_surface_format(&capabilities.formats)
            .ok_or_else(|| anyhow!("surface reports no supported formats"))?;
        if surface_format.is_srgb() {
            warn!(?surface_format, "only sRGB surface formats available; colours will be re-encoded");
        }

        let format_features = adapter.get_texture_format_features(surface_format);
        let sample_count = choose_sample_count(
            antialiasing,
            &format_features.flags.supported_sample_counts(),
            format_features
                .flags
                .contains(TextureFormatFeatureFlags::MULTISAMPLE_RESOLVE),
            is_software,
        );

        let mut required_features = wgpu::Features::empty();
        if sample_count > 4 {
            required_features |= wgpu::Features::TEXTURE_ADAPTER_SPECIFIC_FORMAT_FEATURES;
        }
        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("slidewall device"),
            required_features,
            required_limits: limits,
            memory_hints: wgpu::MemoryHints::MemoryUsage,
            trace: wgpu::Trace::default(),
        }))
        .context("failed to create GPU device")?;

        device.set_device_lost_callback(move |reason, message| {
            let _ = device_lost.send(DeviceLost { reason, message });
        });

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: capabilities
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        debug!(?surface_format, sample_count, "surface configured");

        Ok(Self {
            _instance: instance,
            surface,
            device,
            queue,
            config,
            size,
            sample_count,
            surface_format,
        })
    }

    pub(crate) fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }

        self.size = new_size;
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
    }
}

/// Prefers a non-sRGB format so the shader's gamma-space blend reaches the
/// screen untouched.
fn choose_surface_format(formats: &[wgpu::TextureFormat]) -> Option<wgpu::TextureFormat> {
    formats
        .iter()
        .copied()
        .find(|format| !format.is_srgb())
        .or_else(|| formats.first().copied())
}

/// Resolves the MSAA sample count from the requested mode and what the
/// surface format supports.
fn choose_sample_count(
    antialiasing: Antialiasing,
    supported: &[u32],
    resolve_supported: bool,
    is_software: bool,
) -> u32 {
    let mut counts: Vec<u32> = supported.to_vec();
    counts.push(1);
    counts.sort_unstable();
    counts.dedup();

    let chosen = match antialiasing {
        Antialiasing::Off => 1,
        Antialiasing::Auto => counts.last().copied().unwrap_or(1),
        Antialiasing::Samples(requested) if counts.contains(&requested) => requested,
        Antialiasing::Samples(requested) => {
            let fallback = counts
                .iter()
                .copied()
                .filter(|&count| count <= requested)
                .max()
                .unwrap_or(1);
            warn!(requested, fallback, supported = ?counts, "MSAA sample count not supported");
            fallback
        }
    };

    if chosen > 1 && !resolve_supported {
        warn!("surface format cannot resolve multisampled targets; disabling MSAA");
        return 1;
    }
    if chosen > 1 && is_software {
        warn!(chosen, "software rasterizer detected; disabling MSAA");
        return 1;
    }
    chosen
}

#[cfg(test)]
mod tests {
    use super::*;
    use wgpu::TextureFormat;

    #[test]
    fn prefers_linear_surface_format() {
        let formats = [TextureFormat::Bgra8UnormSrgb, TextureFormat::Bgra8Unorm];
        assert_eq!(choose_surface_format(&formats), Some(TextureFormat::Bgra8Unorm));
        assert_eq!(
            choose_surface_format(&[TextureFormat::Rgba8UnormSrgb]),
            Some(TextureFormat::Rgba8UnormSrgb)
        );
        assert_eq!(choose_surface_format(&[]), None);
    }

    #[test]
    fn auto_takes_highest_supported_count() {
        assert_eq!(choose_sample_count(Antialiasing::Auto, &[1, 4, 2], true, false), 4);
        assert_eq!(choose_sample_count(Antialiasing::Auto, &[], true, false), 1);
        assert_eq!(choose_sample_count(Antialiasing::Off, &[1, 4], true, false), 1);
    }

    #[test]
    fn unsupported_request_falls_back_downwards() {
        assert_eq!(choose_sample_count(Antialiasing::Samples(8), &[1, 2, 4], true, false), 4);
        assert_eq!(choose_sample_count(Antialiasing::Samples(4), &[1, 4], true, false), 4);
        assert_eq!(choose_sample_count(Antialiasing::Samples(2), &[4], true, false), 1);
    }

    #[test]
    fn msaa_needs_resolve_and_hardware() {
        assert_eq!(choose_sample_count(Antialiasing::Auto, &[1, 4], false, false), 1);
        assert_eq!(choose_sample_count(Antialiasing::Samples(4), &[1, 4], true, true), 1);
    }
}
