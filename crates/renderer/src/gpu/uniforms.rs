use bytemuck::{Pod, Zeroable};
use transition::Slot;

pub(crate) type Mat4 = [[f32; 4]; 4];

pub(crate) const IDENTITY: Mat4 = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

/// CPU mirror of the `SlideParams` std140 block.
#[repr(C, align(16))]
#[derive(Clone, Copy, Debug)]
pub(crate) struct SlideUniforms {
    pub mv_matrix: Mat4,
    pub p_matrix: Mat4,
    pub active_texture_matrix: Mat4,
    pub next_texture_matrix: Mat4,
    pub transition_timer: f32,
    pub _padding: [f32; 3],
}

unsafe impl Zeroable for SlideUniforms {}
unsafe impl Pod for SlideUniforms {}

impl SlideUniforms {
    pub fn new() -> Self {
        Self {
            mv_matrix: IDENTITY,
            p_matrix: IDENTITY,
            active_texture_matrix: IDENTITY,
            next_texture_matrix: IDENTITY,
            transition_timer: 0.0,
            _padding: [0.0; 3],
        }
    }

    pub fn set_timer(&mut self, value: f32) {
        self.transition_timer = value;
    }

    /// Stores the texture-coordinate matrix for a slide slot. The
    /// displacement map is sampled with raw coordinates and has none.
    pub fn set_texture_matrix(&mut self, slot: Slot, matrix: Mat4) {
        match slot {
            Slot::Active => self.active_texture_matrix = matrix,
            Slot::Next => self.next_texture_matrix = matrix,
            Slot::Displacement => {}
        }
    }
}

/// Scale factors that crop an image so it covers the surface.
///
/// The axis along which the image overflows is shrunk in texture space; the
/// other axis is left untouched.
pub(crate) fn cover_scale(image: (u32, u32), surface: (u32, u32)) -> (f32, f32) {
    let image_aspect = image.0.max(1) as f32 / image.1.max(1) as f32;
    let surface_aspect = surface.0.max(1) as f32 / surface.1.max(1) as f32;
    if image_aspect > surface_aspect {
        (surface_aspect / image_aspect, 1.0)
    } else {
        (1.0, image_aspect / surface_aspect)
    }
}

/// Column-major matrix scaling texture coordinates about the centre.
pub(crate) fn cover_matrix(image: (u32, u32), surface: (u32, u32)) -> Mat4 {
    let (scale_x, scale_y) = cover_scale(image, surface);
    [
        [scale_x, 0.0, 0.0, 0.0],
        [0.0, scale_y, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
        [0.5 - 0.5 * scale_x, 0.5 - 0.5 * scale_y, 0.0, 1.0],
    ]
}

/// Applies a texture matrix to `(u, v, 0, 1)`, keeping `xy`.
pub(crate) fn transform_coord(matrix: &Mat4, coord: [f32; 2]) -> [f32; 2] {
    let [u, v] = coord;
    [
        matrix[0][0] * u + matrix[1][0] * v + matrix[3][0],
        matrix[0][1] * u + matrix[1][1] * v + matrix[3][1],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::{align_of, size_of};

    /// The CPU mirror must match the std140 layout declared in the shaders.
    #[test]
    fn slide_uniforms_follow_std140_layout() {
        let uniforms = SlideUniforms::new();
        let base = &uniforms as *const _ as usize;

        assert_eq!(align_of::<SlideUniforms>(), 16);
        assert_eq!(size_of::<SlideUniforms>(), 272);
        assert_eq!((&uniforms.mv_matrix as *const _ as usize) - base, 0);
        assert_eq!((&uniforms.p_matrix as *const _ as usize) - base, 64);
        assert_eq!(
            (&uniforms.active_texture_matrix as *const _ as usize) - base,
            128
        );
        assert_eq!(
            (&uniforms.next_texture_matrix as *const _ as usize) - base,
            192
        );
        assert_eq!((&uniforms.transition_timer as *const _ as usize) - base, 256);
    }

    #[test]
    fn cover_crops_the_overflowing_axis() {
        // Square image on a 2:1 surface loses its top and bottom quarter.
        assert_eq!(cover_scale((100, 100), (200, 100)), (1.0, 0.5));
        // Wide image on a square surface loses its sides.
        assert_eq!(cover_scale((400, 100), (100, 100)), (0.25, 1.0));
        assert_eq!(cover_scale((640, 480), (1280, 960)), (1.0, 1.0));
    }

    #[test]
    fn cover_matrix_keeps_centre_fixed() {
        let matrix = cover_matrix((100, 100), (200, 100));
        assert_eq!(transform_coord(&matrix, [0.5, 0.5]), [0.5, 0.5]);
        assert_eq!(transform_coord(&matrix, [0.0, 0.0]), [0.0, 0.25]);
        assert_eq!(transform_coord(&matrix, [1.0, 1.0]), [1.0, 0.75]);
    }

    #[test]
    fn displacement_slot_has_no_matrix() {
        let mut uniforms = SlideUniforms::new();
        let matrix = cover_matrix((10, 20), (20, 10));
        uniforms.set_texture_matrix(Slot::Displacement, matrix);
        assert_eq!(uniforms.active_texture_matrix, IDENTITY);
        uniforms.set_texture_matrix(Slot::Next, matrix);
        assert_eq!(uniforms.next_texture_matrix, matrix);
    }
}
