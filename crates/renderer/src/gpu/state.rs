use std::path::PathBuf;

use anyhow::Result;
use crossbeam_channel::{unbounded, Receiver};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use tracing::{debug, warn};
use transition::{
    SlideIndex, SlideSet, SlideSurface, Slot, SlotTable, TransitionError, DISPLACEMENT_INDEX,
    FIRST_SLIDE,
};
use winit::dpi::PhysicalSize;

use crate::assets::ImageCache;
use crate::types::Antialiasing;

use super::context::{DeviceLost, GpuContext};
use super::pipeline::{SlidePipeline, QUAD_VERTEX_COUNT};
use super::slots::SlotTexture;
use super::uniforms::{cover_matrix, SlideUniforms};

struct MultisampleTarget {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl MultisampleTarget {
    fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        size: PhysicalSize<u32>,
        sample_count: u32,
    ) -> Self {
        let extent = wgpu::Extent3d {
            width: size.width.max(1),
            height: size.height.max(1),
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("msaa color target"),
            size: extent,
            mip_level_count: 1,
            sample_count,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            _texture: texture,
            view,
        }
    }

    fn for_context(context: &GpuContext) -> Option<Self> {
        (context.sample_count > 1).then(|| {
            Self::new(
                &context.device,
                context.surface_format,
                context.size,
                context.sample_count,
            )
        })
    }
}

/// Every GPU resource needed to present a slide frame.
///
/// ```text
///   Window ─▶ Surface ─▶ Device ─▶ Queue
///                          │
///                          ├─▶ SlidePipeline (quad, shaders, layouts)
///                          ├─▶ uniform buffer (SlideParams)
///                          └─▶ SlotTable<SlotTexture> ─▶ slot bind group
/// ```
///
/// `GpuState` is the [`SlideSurface`] the transition machine drives. Dropping
/// it releases every GPU handle.
pub(crate) struct GpuState {
    context: GpuContext,
    pipeline: SlidePipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    uniforms: SlideUniforms,
    slots: SlotTable<SlotTexture>,
    slot_bind_group: wgpu::BindGroup,
    images: ImageCache,
    multisample_target: Option<MultisampleTarget>,
    drawing: bool,
    device_lost: Receiver<DeviceLost>,
}

impl GpuState {
    pub(crate) fn new<T>(
        target: &T,
        initial_size: PhysicalSize<u32>,
        antialiasing: Antialiasing,
        sources: SlideSet<PathBuf>,
    ) -> Result<Self>
    where
        T: HasDisplayHandle + HasWindowHandle,
    {
        let (lost_tx, lost_rx) = unbounded();
        let context = GpuContext::new(target, initial_size, antialiasing, lost_tx)?;
        let pipeline = SlidePipeline::new(
            &context.device,
            context.surface_format,
            context.sample_count,
        )?;

        let uniform_buffer = context.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("slide uniform buffer"),
            size: std::mem::size_of::<SlideUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let uniform_bind_group = context
            .device
            .create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("slide uniform bind group"),
                layout: &pipeline.uniform_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                }],
            });

        let mut images = ImageCache::new(sources);
        let mut uniforms = SlideUniforms::new();
        let mut slots = SlotTable::new();
        let surface_size = (context.size.width, context.size.height);
        for (slot, slide) in [
            (Slot::Displacement, DISPLACEMENT_INDEX),
            (Slot::Active, FIRST_SLIDE),
            (Slot::Next, FIRST_SLIDE),
        ] {
            let uploaded = images.load(slide).and_then(|image| {
                SlotTexture::upload(&context.device, &context.queue, slot, &image)
            });
            let texture = match uploaded {
                Ok(texture) => texture,
                Err(error) => {
                    warn!(
                        %slot,
                        slide,
                        error = %error,
                        "failed to prepare slot image; using placeholder"
                    );
                    SlotTexture::placeholder(&context.device, &context.queue, slot)
                }
            };
            uniforms.set_texture_matrix(slot, cover_matrix(texture.size, surface_size));
            slots.bind(slot, slide, texture)?;
        }
        let slot_bind_group = pipeline.slot_bind_group(&context.device, &slots)?;
        Self::write_uniforms(&context.queue, &uniform_buffer, &uniforms);

        let multisample_target = MultisampleTarget::for_context(&context);

        Ok(Self {
            context,
            pipeline,
            uniform_buffer,
            uniform_bind_group,
            uniforms,
            slots,
            slot_bind_group,
            images,
            multisample_target,
            drawing: false,
            device_lost: lost_rx,
        })
    }

    pub(crate) fn size(&self) -> PhysicalSize<u32> {
        self.context.size
    }

    pub(crate) fn is_drawing(&self) -> bool {
        self.drawing
    }

    /// Returns a pending device-lost notification, if the driver sent one.
    pub(crate) fn take_device_lost(&self) -> Option<DeviceLost> {
        self.device_lost.try_recv().ok()
    }

    pub(crate) fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.context.resize(new_size);
        self.refresh_texture_matrices();
        self.multisample_target = MultisampleTarget::for_context(&self.context);
    }

    fn refresh_texture_matrices(&mut self) {
        let surface_size = (self.context.size.width, self.context.size.height);
        for slot in [Slot::Active, Slot::Next] {
            if let Some(bound) = self.slots.get(slot) {
                let matrix = cover_matrix(bound.source().size, surface_size);
                self.uniforms.set_texture_matrix(slot, matrix);
            }
        }
        Self::write_uniforms(&self.context.queue, &self.uniform_buffer, &self.uniforms);
    }

    pub(crate) fn render(&mut self) -> Result<(), wgpu::SurfaceError> {
        let frame = self.context.surface.get_current_texture()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("slide encoder"),
                });

        let (attachment_view, resolve_target) = match self.multisample_target.as_ref() {
            Some(msaa) => (&msaa.view, Some(&view)),
            None => (&view, None),
        };
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("slide pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: attachment_view,
                    depth_slice: None,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            render_pass.set_pipeline(&self.pipeline.pipeline);
            render_pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            render_pass.set_bind_group(1, &self.slot_bind_group, &[]);
            render_pass.set_vertex_buffer(0, self.pipeline.vertex_buffer.slice(..));
            render_pass.draw(0..QUAD_VERTEX_COUNT, 0..1);
        }

        self.context.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }

    fn write_uniforms(queue: &wgpu::Queue, buffer: &wgpu::Buffer, uniforms: &SlideUniforms) {
        queue.write_buffer(buffer, 0, bytemuck::bytes_of(uniforms));
    }
}

impl SlideSurface for GpuState {
    fn set_source(&mut self, slot: Slot, slide: SlideIndex) -> Result<(), TransitionError> {
        let device = &self.context.device;
        let queue = &self.context.queue;
        let images = &mut self.images;
        let mut replaced = false;

        let bound = self.slots.set_source(slot, slide, |current| {
            let image = images.load(slide)?;
            if current.write_in_place(queue, &image) {
                Ok::<_, anyhow::Error>(current.clone())
            } else {
                let texture = SlotTexture::upload(device, queue, slot, &image)?;
                replaced = true;
                Ok(texture)
            }
        })?;
        let texture_size = bound.source().size;

        let surface_size = (self.context.size.width, self.context.size.height);
        self.uniforms
            .set_texture_matrix(slot, cover_matrix(texture_size, surface_size));
        Self::write_uniforms(&self.context.queue, &self.uniform_buffer, &self.uniforms);

        if replaced {
            self.slot_bind_group = self
                .pipeline
                .slot_bind_group(&self.context.device, &self.slots)
                .map_err(|err| TransitionError::AssetLoad {
                    slot,
                    slide,
                    reason: format!("{err:#}"),
                })?;
            debug!(%slot, slide, ?texture_size, "slot texture reallocated");
        }
        Ok(())
    }

    fn set_transition_timer(&mut self, value: f32) {
        self.uniforms.set_timer(value);
        Self::write_uniforms(&self.context.queue, &self.uniform_buffer, &self.uniforms);
    }

    fn set_drawing(&mut self, enabled: bool) {
        self.drawing = enabled;
    }
}
