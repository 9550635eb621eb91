use std::sync::Arc;

use glam::{Mat4, Vec3, Vec4};

use crate::renderer::mesh::Mesh;
use crate::renderer::shader::ObjectShader;

/// View and projection for a render. `camera_matrix` is world-to-view.
#[derive(Clone, Copy, Debug)]
pub struct CameraView {
    pub camera_matrix: Mat4,
    pub projection_matrix: Mat4,
}

impl CameraView {
    pub fn new(camera_matrix: Mat4, projection_matrix: Mat4) -> Self {
        Self {
            camera_matrix,
            projection_matrix,
        }
    }
}

impl Default for CameraView {
    fn default() -> Self {
        Self::new(Mat4::IDENTITY, Mat4::IDENTITY)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LightKind {
    Sun = 1,
    Point = 2,
    Spot = 3,
}

/// A light source. Not every field applies to every kind: `radius` bounds
/// point and spot falloff, the `spot_*` fields shape the cone, and `matrix`
/// (world-to-light view) drives shadow rendering for suns and spots.
#[derive(Clone, Copy, Debug)]
pub struct Light {
    pub color: Vec3,
    pub kind: LightKind,
    pub position: Vec3,
    pub radius: f32,
    pub direction: Vec3,
    pub spot_angle: f32,
    pub spot_blend: f32,
    pub matrix: Mat4,
}

impl Light {
    pub fn sun(color: Vec3, matrix: Mat4) -> Self {
        let direction = matrix
            .inverse()
            .transform_vector3(Vec3::NEG_Z)
            .normalize_or_zero();
        Self {
            color,
            kind: LightKind::Sun,
            position: Vec3::ZERO,
            radius: 0.0,
            direction,
            spot_angle: 0.0,
            spot_blend: 0.0,
            matrix,
        }
    }

    pub fn point(color: Vec3, position: Vec3, radius: f32) -> Self {
        Self {
            color,
            kind: LightKind::Point,
            position,
            radius,
            direction: Vec3::NEG_Z,
            spot_angle: 0.0,
            spot_blend: 0.0,
            matrix: Mat4::IDENTITY,
        }
    }

    pub fn spot(color: Vec3, matrix: Mat4, radius: f32, spot_angle: f32, spot_blend: f32) -> Self {
        let world_from_light = matrix.inverse();
        Self {
            color,
            kind: LightKind::Spot,
            position: world_from_light.transform_point3(Vec3::ZERO),
            radius,
            direction: world_from_light
                .transform_vector3(Vec3::NEG_Z)
                .normalize_or_zero(),
            spot_angle,
            spot_blend,
            matrix,
        }
    }
}

/// Shading configuration for one object. `None` falls back to the built-in
/// flat-color shader.
#[derive(Clone, Default)]
pub struct Material {
    pub shader: Option<Arc<ObjectShader>>,
}

pub struct SceneObject {
    pub mesh: Arc<Mesh>,
    pub matrix: Mat4,
    pub material: Material,
}

impl SceneObject {
    pub fn new(mesh: Arc<Mesh>, matrix: Mat4) -> Self {
        Self {
            mesh,
            matrix,
            material: Material::default(),
        }
    }

    pub fn with_shader(mut self, shader: Arc<ObjectShader>) -> Self {
        self.material.shader = Some(shader);
        self
    }
}

/// Environment settings that belong to the world rather than any object.
#[derive(Clone, Copy, Debug)]
pub struct WorldParameters {
    pub background_color: Vec4,
}

impl Default for WorldParameters {
    fn default() -> Self {
        Self {
            background_color: Vec4::new(0.5, 0.5, 0.5, 1.0),
        }
    }
}

/// Quality settings for a render. Preview renders use fewer samples so the
/// first frames arrive quickly; final renders accumulate more.
#[derive(Clone, Copy, Debug)]
pub struct SceneParameters {
    pub preview_samples: u32,
    pub render_samples: u32,
    pub cascades_distribution_exponent: f32,
}

impl Default for SceneParameters {
    fn default() -> Self {
        Self {
            preview_samples: 8,
            render_samples: 32,
            cascades_distribution_exponent: 3.0,
        }
    }
}

#[derive(Default)]
pub struct Scene {
    pub camera: CameraView,
    pub objects: Vec<SceneObject>,
    pub lights: Vec<Light>,
    pub world: WorldParameters,
    pub parameters: SceneParameters,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sample target for this scene in the given mode.
    pub fn sample_target(&self, is_final_render: bool) -> u32 {
        if is_final_render {
            self.parameters.render_samples
        } else {
            self.parameters.preview_samples
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_world_background_is_mid_grey() {
        let world = WorldParameters::default();
        assert_eq!(world.background_color, Vec4::new(0.5, 0.5, 0.5, 1.0));
    }

    #[test]
    fn sample_target_follows_render_mode() {
        let scene = Scene::new();
        assert_eq!(scene.sample_target(false), 8);
        assert_eq!(scene.sample_target(true), 32);
    }

    #[test]
    fn spot_light_derives_position_and_direction_from_its_matrix() {
        let eye = Vec3::new(0.0, 5.0, 0.0);
        let matrix = Mat4::look_at_rh(eye, Vec3::ZERO, Vec3::Z);
        let light = Light::spot(Vec3::ONE, matrix, 10.0, 0.8, 0.1);

        assert!((light.position - eye).length() < 1e-5);
        assert!((light.direction - Vec3::NEG_Y).length() < 1e-5);
    }
}
