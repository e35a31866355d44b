use anyhow::Result;
use bytemuck::{Pod, Zeroable};
use transition::{Slot, SlotTable};
use wgpu::util::DeviceExt;

use crate::compile::{compile_fragment_shader, compile_vertex_shader};

use super::slots::SlotTexture;

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct QuadVertex {
    position: [f32; 3],
    texture_coord: [f32; 2],
}

/// Full-surface quad as a triangle strip; texture `(0, 0)` is bottom left.
const QUAD_VERTICES: [QuadVertex; 4] = [
    QuadVertex {
        position: [-1.0, -1.0, 0.0],
        texture_coord: [0.0, 0.0],
    },
    QuadVertex {
        position: [1.0, -1.0, 0.0],
        texture_coord: [1.0, 0.0],
    },
    QuadVertex {
        position: [-1.0, 1.0, 0.0],
        texture_coord: [0.0, 1.0],
    },
    QuadVertex {
        position: [1.0, 1.0, 0.0],
        texture_coord: [1.0, 1.0],
    },
];

pub(crate) const QUAD_VERTEX_COUNT: u32 = QUAD_VERTICES.len() as u32;

const QUAD_ATTRIBUTES: [wgpu::VertexAttribute; 2] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x2];

/// Render pipeline plus the layouts its bind groups are created against.
pub(crate) struct SlidePipeline {
    pub pipeline: wgpu::RenderPipeline,
    pub uniform_layout: wgpu::BindGroupLayout,
    pub slot_layout: wgpu::BindGroupLayout,
    pub vertex_buffer: wgpu::Buffer,
}

impl SlidePipeline {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        sample_count: u32,
    ) -> Result<Self> {
        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("slide uniform layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let slot_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("slide slot layout"),
            entries: &build_slot_layout_entries(),
        });

        let vertex_module = compile_vertex_shader(device);
        let fragment_module = compile_fragment_shader(device);

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("slide pipeline layout"),
            bind_group_layouts: &[&uniform_layout, &slot_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("slide pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &vertex_module,
                entry_point: Some("main"),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<QuadVertex>() as wgpu::BufferAddress,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &QUAD_ATTRIBUTES,
                }],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleStrip,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState {
                count: sample_count,
                mask: !0,
                alpha_to_coverage_enabled: false,
            },
            fragment: Some(wgpu::FragmentState {
                module: &fragment_module,
                entry_point: Some("main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multiview: None,
            cache: None,
        });

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("slide quad"),
            contents: bytemuck::cast_slice(&QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });

        Ok(Self {
            pipeline,
            uniform_layout,
            slot_layout,
            vertex_buffer,
        })
    }

    /// Builds the slot bind group; every slot must already be bound.
    pub fn slot_bind_group(
        &self,
        device: &wgpu::Device,
        slots: &SlotTable<SlotTexture>,
    ) -> Result<wgpu::BindGroup> {
        let mut resources = Vec::with_capacity(Slot::ALL.len());
        for slot in Slot::ALL {
            resources.push(slots.require(slot)?.source());
        }
        Ok(device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("slide slot bind group"),
            layout: &self.slot_layout,
            entries: &build_slot_entries(&resources),
        }))
    }
}

fn build_slot_entries<'a>(resources: &[&'a SlotTexture]) -> Vec<wgpu::BindGroupEntry<'a>> {
    let mut entries = Vec::with_capacity(resources.len() * 2);
    for (index, resource) in resources.iter().enumerate() {
        entries.push(wgpu::BindGroupEntry {
            binding: (index as u32) * 2,
            resource: wgpu::BindingResource::TextureView(&resource.view),
        });
        entries.push(wgpu::BindGroupEntry {
            binding: (index as u32) * 2 + 1,
            resource: wgpu::BindingResource::Sampler(&resource.sampler),
        });
    }
    entries
}

fn build_slot_layout_entries() -> Vec<wgpu::BindGroupLayoutEntry> {
    let mut entries = Vec::with_capacity(Slot::ALL.len() * 2);
    for slot in Slot::ALL {
        let index = slot.index() as u32;
        entries.push(wgpu::BindGroupLayoutEntry {
            binding: index * 2,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        });
        entries.push(wgpu::BindGroupLayoutEntry {
            binding: index * 2 + 1,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        });
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_layout_pairs_texture_and_sampler_per_slot() {
        let entries = build_slot_layout_entries();
        let bindings: Vec<u32> = entries.iter().map(|entry| entry.binding).collect();
        assert_eq!(bindings, vec![0, 1, 2, 3, 4, 5]);
        assert!(matches!(entries[2].ty, wgpu::BindingType::Texture { .. }));
        assert!(matches!(entries[3].ty, wgpu::BindingType::Sampler(_)));
    }

    #[test]
    fn quad_covers_clip_space_with_gl_texture_origin() {
        let strip: Vec<([f32; 2], [f32; 2])> = QUAD_VERTICES
            .iter()
            .map(|v| ([v.position[0], v.position[1]], v.texture_coord))
            .collect();
        for (position, coord) in strip {
            assert_eq!(coord, [(position[0] + 1.0) / 2.0, (position[1] + 1.0) / 2.0]);
        }
        assert_eq!(std::mem::size_of::<QuadVertex>(), 20);
    }
}
