// renderer/uniforms.rs
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2};

/// Per-draw-call uniform block shared by every pass (`COMMON_UNIFORMS` in
/// WGSL). Shadow passes get their own copy with the light's view substituted
/// for the camera.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct CommonUniform {
    pub camera: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub resolution: [i32; 2],
    pub sample_offset: [f32; 2],
    pub sample_count: i32,
    pub _padding: [i32; 3],
}

impl CommonUniform {
    pub fn new(
        camera: Mat4,
        projection: Mat4,
        resolution: (u32, u32),
        sample_offset: Vec2,
        sample_count: i32,
    ) -> Self {
        Self {
            camera: camera.to_cols_array_2d(),
            projection: projection.to_cols_array_2d(),
            resolution: [resolution.0 as i32, resolution.1 as i32],
            sample_offset: sample_offset.to_array(),
            sample_count,
            _padding: [0; 3],
        }
    }
}

impl Default for CommonUniform {
    fn default() -> Self {
        Self::new(Mat4::IDENTITY, Mat4::IDENTITY, (0, 0), Vec2::ZERO, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn common_uniform_is_160_bytes() {
        // 2 * mat4x4<f32> = 128, vec2<i32> + vec2<f32> = 16, i32 + 12 padding = 16
        assert_eq!(std::mem::size_of::<CommonUniform>(), 160);
    }
}
