//! CPU evaluation of the transition fragment shader.
//!
//! Mirrors `compile::FRAGMENT_BODY` over [`RgbaImage`]s so the blend can be
//! checked without a GPU and so `slidewall render` can export a still frame.
//! Coordinates follow the GL convention used on the GPU: texture `(0, 0)` is
//! the bottom-left texel.

use std::path::PathBuf;

use anyhow::{ensure, Result};
use image::{Rgba, RgbaImage};
use transition::{resolve_target, Direction, SlideSet, Slot, DISPLACEMENT_INDEX, FIRST_SLIDE};

use crate::assets::ImageCache;
use crate::gpu::uniforms::{cover_matrix, transform_coord, SlideUniforms};

const HALF_PERIOD: f32 = 90.0 / 3.141592;

/// Weight of the next slide in the final mix; 0 at timer 0, 1 at timer 90.
pub fn mix_weight(timer: f32) -> f32 {
    1.0 - (((timer / HALF_PERIOD).cos() + 1.0) / 2.0)
}

/// Vertical offset applied to the active slide per unit of displacement.
pub fn active_offset(timer: f32) -> f32 {
    (((timer + 90.0) / HALF_PERIOD).cos() + 1.0) / 1.25
}

/// Vertical offset subtracted from the next slide per unit of displacement.
pub fn next_offset(timer: f32) -> f32 {
    ((timer / HALF_PERIOD).cos() + 1.0) / 1.5
}

/// Renders one frame of the transition at `timer` into a `size` image.
///
/// `active` and `next` are cropped to cover the frame exactly as the GPU
/// texture matrices do; the displacement map is stretched.
pub fn render_frame(
    displacement: &RgbaImage,
    active: &RgbaImage,
    next: &RgbaImage,
    timer: f32,
    size: (u32, u32),
) -> RgbaImage {
    let mut uniforms = SlideUniforms::new();
    uniforms.set_timer(timer);
    uniforms.set_texture_matrix(Slot::Active, cover_matrix(active.dimensions(), size));
    uniforms.set_texture_matrix(Slot::Next, cover_matrix(next.dimensions(), size));

    let weight = mix_weight(timer);
    let active_shift = active_offset(timer);
    let next_shift = next_offset(timer);
    let (width, height) = (size.0.max(1), size.1.max(1));

    RgbaImage::from_fn(width, height, |x, y| {
        let coord = [
            (x as f32 + 0.5) / width as f32,
            1.0 - (y as f32 + 0.5) / height as f32,
        ];
        let active_coord = transform_coord(&uniforms.active_texture_matrix, coord);
        let next_coord = transform_coord(&uniforms.next_texture_matrix, coord);

        let d = sample(displacement, coord)[0];
        let first = sample(
            active,
            [active_coord[0], active_coord[1] + d * active_shift],
        );
        let second = sample(next, [next_coord[0], next_coord[1] - d * next_shift]);

        let mut color = [0.0f32; 4];
        for channel in 0..4 {
            color[channel] = first[channel] + (second[channel] - first[channel]) * weight;
        }
        let alpha = color[3];
        Rgba([
            to_byte(color[0] * alpha),
            to_byte(color[1] * alpha),
            to_byte(color[2] * alpha),
            to_byte(alpha),
        ])
    })
}

/// Renders the transition that `direction` starts from the first slide, at
/// `timer`.
pub fn render_still(
    sources: SlideSet<PathBuf>,
    direction: Direction,
    timer: f32,
    size: (u32, u32),
) -> Result<RgbaImage> {
    ensure!(
        (0.0..=90.0).contains(&timer),
        "transition timer must lie within 0..=90, got {timer}"
    );
    let target = resolve_target(direction, FIRST_SLIDE, sources.max_index());
    let mut images = ImageCache::new(sources);
    let displacement = images.load(DISPLACEMENT_INDEX)?;
    let active = images.load(FIRST_SLIDE)?;
    let next = images.load(target)?;
    Ok(render_frame(&displacement, &active, &next, timer, size))
}

/// Bilinear sample with clamp-to-edge addressing, channels in `0..=1`.
fn sample(image: &RgbaImage, coord: [f32; 2]) -> [f32; 4] {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return [0.0; 4];
    }
    let x = (coord[0] * width as f32 - 0.5).clamp(0.0, (width - 1) as f32);
    let y = ((1.0 - coord[1]) * height as f32 - 0.5).clamp(0.0, (height - 1) as f32);
    let (x0, y0) = (x.floor() as u32, y.floor() as u32);
    let (x1, y1) = ((x0 + 1).min(width - 1), (y0 + 1).min(height - 1));
    let (fx, fy) = (x - x0 as f32, y - y0 as f32);

    let texel = |px: u32, py: u32| image.get_pixel(px, py).0;
    let (a, b, c, d) = (texel(x0, y0), texel(x1, y0), texel(x0, y1), texel(x1, y1));
    let mut out = [0.0f32; 4];
    for channel in 0..4 {
        let top = a[channel] as f32 * (1.0 - fx) + b[channel] as f32 * fx;
        let bottom = c[channel] as f32 * (1.0 - fx) + d[channel] as f32 * fx;
        out[channel] = (top * (1.0 - fy) + bottom * fy) / 255.0;
    }
    out
}

fn to_byte(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}
