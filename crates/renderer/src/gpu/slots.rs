use anyhow::{ensure, Result};
use image::imageops::flip_vertical;
use image::RgbaImage;
use transition::Slot;
use wgpu::util::{DeviceExt, TextureDataOrder};

/// Texture format used for every slot; shader math runs on gamma-encoded values.
const SLOT_TEXTURE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// GPU resources backing one texture slot.
#[derive(Clone)]
pub(crate) struct SlotTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
    pub size: (u32, u32),
}

impl SlotTexture {
    /// Uploads `image` into a fresh texture.
    ///
    /// Rows are flipped so texture coordinate `(0, 0)` addresses the bottom
    /// left of the image, like the quad's texture coordinates. Images the
    /// device cannot hold are rejected before any GPU call.
    pub(crate) fn upload(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        slot: Slot,
        image: &RgbaImage,
    ) -> Result<Self> {
        ensure_fits(image.dimensions(), device.limits().max_texture_dimension_2d)?;
        let flipped = flip_vertical(image);
        Ok(create_slot_texture(
            device,
            queue,
            &format!("{} slot texture", slot.sampler_name()),
            image.dimensions(),
            &flipped,
        ))
    }

    /// 1x1 opaque black stand-in for an image that failed to load.
    ///
    /// Black in the displacement slot disables distortion, leaving a plain
    /// crossfade.
    pub(crate) fn placeholder(device: &wgpu::Device, queue: &wgpu::Queue, slot: Slot) -> Self {
        create_slot_texture(
            device,
            queue,
            &format!("placeholder {} slot texture", slot.sampler_name()),
            (1, 1),
            &[0, 0, 0, 255],
        )
    }

    /// Writes `image` over the existing texture when dimensions match.
    ///
    /// Returns `false` without touching the texture when a new allocation is
    /// required.
    pub(crate) fn write_in_place(&self, queue: &wgpu::Queue, image: &RgbaImage) -> bool {
        let (width, height) = image.dimensions();
        if (width, height) != self.size {
            return false;
        }

        let flipped = flip_vertical(image);
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &flipped,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(width * 4),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        true
    }
}

/// Checks that an image fits in a 2D texture with sides of at most
/// `max_dimension` texels.
fn ensure_fits((width, height): (u32, u32), max_dimension: u32) -> Result<()> {
    ensure!(width > 0 && height > 0, "image {width}x{height} has no pixels");
    ensure!(
        width <= max_dimension && height <= max_dimension,
        "image {width}x{height} exceeds the GPU texture limit of {max_dimension} pixels per side"
    );
    Ok(())
}

fn create_slot_texture(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    label: &str,
    (width, height): (u32, u32),
    data: &[u8],
) -> SlotTexture {
    let texture = device.create_texture_with_data(
        queue,
        &wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: SLOT_TEXTURE_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        },
        TextureDataOrder::LayerMajor,
        data,
    );

    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some(label),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::FilterMode::Linear,
        ..Default::default()
    });

    SlotTexture {
        texture,
        view,
        sampler,
        size: (width, height),
    }
}
