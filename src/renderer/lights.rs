use bytemuck::{Pod, Zeroable};
use glam::Mat4;

use crate::renderer::cascades::get_sun_cascades;
use crate::scene::{CameraView, Light, LightKind};

pub const MAX_LIGHTS: usize = 128;
pub const MAX_SPOT_SHADOWS: usize = 8;
pub const MAX_SUNS: usize = 8;
pub const SUN_CASCADES: usize = 6;
pub const MAX_SUN_SHADOWS: usize = MAX_SUNS * SUN_CASCADES;

pub const SPOT_SHADOW_RESOLUTION: u32 = 2048;
pub const SUN_SHADOW_RESOLUTION: u32 = 2048;

/// One light record as the shaders see it (64-byte stride).
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct LightRaw {
    pub color: [f32; 3],
    pub kind: i32,
    pub position: [f32; 3],
    pub radius: f32,
    pub direction: [f32; 3],
    pub spot_angle: f32,
    pub spot_blend: f32,
    pub type_index: i32,
    pub _padding: [i32; 2],
}

/// The `SCENE_LIGHTS` uniform block, mirrored byte-for-byte between host
/// memory and the GPU buffer. `type_index` of each light indexes into
/// `spot_matrices` (spot lights) or `sun_matrices` in groups of
/// [`SUN_CASCADES`] (sun lights); -1 marks a light without a shadow slot
/// (point lights and lights truncated past capacity).
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct LightsUniform {
    pub lights: [LightRaw; MAX_LIGHTS],
    pub lights_count: i32,
    pub _padding: [i32; 3],
    pub spot_matrices: [[[f32; 4]; 4]; MAX_SPOT_SHADOWS],
    pub sun_matrices: [[[f32; 4]; 4]; MAX_SUN_SHADOWS],
}

/// Camera substitute for a shadow pass: the scene is drawn unchanged, only
/// the view is overridden. Scene state is never mutated for shadows.
#[derive(Clone, Copy, Debug)]
pub struct ViewOverride {
    pub camera_matrix: Mat4,
    pub projection_matrix: Mat4,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShadowTarget {
    /// Layer in the spot shadow array.
    Spot { slot: u32 },
    /// Layer in the sun shadow array (`sun_index * SUN_CASCADES + cascade`).
    SunCascade { slot: u32 },
}

/// One shadow-map render to perform: which array layer, seen from where.
#[derive(Clone, Copy, Debug)]
pub struct ShadowJob {
    pub target: ShadowTarget,
    pub view: ViewOverride,
}

/// Perspective projection used for spot shadow rendering and projection:
/// fov = the full cone angle, square aspect, far plane at the light radius.
pub fn spot_projection_matrix(spot_angle: f32, radius: f32) -> Mat4 {
    Mat4::perspective_rh(spot_angle, 1.0, 0.01, radius)
}

/// CPU side of the lighting subsystem: the uniform block contents plus the
/// per-frame list of shadow passes to render.
pub struct LightsData {
    pub(crate) uniform: LightsUniform,
}

impl LightsData {
    pub fn new() -> Self {
        Self {
            uniform: LightsUniform::zeroed(),
        }
    }

    pub fn lights_count(&self) -> i32 {
        self.uniform.lights_count
    }

    pub fn spot_matrix(&self, slot: usize) -> Mat4 {
        Mat4::from_cols_array_2d(&self.uniform.spot_matrices[slot])
    }

    pub fn sun_matrix(&self, slot: usize) -> Mat4 {
        Mat4::from_cols_array_2d(&self.uniform.sun_matrices[slot])
    }

    /// Populates the uniform block from the scene lights, in scene order, and
    /// returns the shadow passes to render: one per spot light,
    /// [`SUN_CASCADES`] per sun light. Must run once per frame before the
    /// main pass.
    ///
    /// Slot assignment is an incrementing counter per light type, so it is
    /// stable within a frame but follows scene light order across frames.
    /// Counts beyond any fixed capacity are truncated with a warning rather
    /// than overflowing the buffer.
    pub fn load(
        &mut self,
        lights: &[Light],
        camera: &CameraView,
        cascades_distribution_exponent: f32,
    ) -> Vec<ShadowJob> {
        if lights.len() > MAX_LIGHTS {
            log::warn!(
                "Scene has {} lights; only the first {} are rendered",
                lights.len(),
                MAX_LIGHTS
            );
        }

        let mut jobs = Vec::new();
        let mut spot_count = 0usize;
        let mut sun_count = 0usize;

        for (i, light) in lights.iter().take(MAX_LIGHTS).enumerate() {
            let mut record = LightRaw {
                color: light.color.to_array(),
                kind: light.kind as i32,
                position: light.position.to_array(),
                radius: light.radius,
                direction: light.direction.to_array(),
                spot_angle: light.spot_angle,
                spot_blend: light.spot_blend,
                // -1 means no shadow slot; shaders skip the lookup.
                type_index: -1,
                _padding: [0; 2],
            };

            match light.kind {
                LightKind::Spot => {
                    if spot_count >= MAX_SPOT_SHADOWS {
                        log::warn!(
                            "Spot shadow capacity ({}) exceeded; light {} casts no shadow",
                            MAX_SPOT_SHADOWS,
                            i
                        );
                    } else {
                        record.type_index = spot_count as i32;

                        let projection = spot_projection_matrix(light.spot_angle, light.radius);
                        let spot_matrix = projection * light.matrix;
                        self.uniform.spot_matrices[spot_count] = spot_matrix.to_cols_array_2d();

                        jobs.push(ShadowJob {
                            target: ShadowTarget::Spot {
                                slot: spot_count as u32,
                            },
                            view: ViewOverride {
                                camera_matrix: light.matrix,
                                projection_matrix: projection,
                            },
                        });
                        spot_count += 1;
                    }
                }
                LightKind::Sun => {
                    if sun_count >= MAX_SUNS {
                        log::warn!(
                            "Sun shadow capacity ({}) exceeded; light {} casts no shadow",
                            MAX_SUNS,
                            i
                        );
                    } else {
                        record.type_index = sun_count as i32;

                        let projection = camera.projection_matrix;
                        let clip_from_world = projection * camera.camera_matrix;
                        let cascades = get_sun_cascades(
                            light.matrix,
                            projection,
                            clip_from_world,
                            SUN_CASCADES,
                            cascades_distribution_exponent,
                        );

                        for (cascade, matrix) in cascades.into_iter().enumerate() {
                            let slot = sun_count * SUN_CASCADES + cascade;
                            self.uniform.sun_matrices[slot] = matrix.to_cols_array_2d();

                            // The cascade matrix already includes its projection.
                            jobs.push(ShadowJob {
                                target: ShadowTarget::SunCascade { slot: slot as u32 },
                                view: ViewOverride {
                                    camera_matrix: matrix,
                                    projection_matrix: Mat4::IDENTITY,
                                },
                            });
                        }
                        sun_count += 1;
                    }
                }
                LightKind::Point => {}
            }

            self.uniform.lights[i] = record;
        }

        self.uniform.lights_count = lights.len().min(MAX_LIGHTS) as i32;
        jobs
    }
}

impl Default for LightsData {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn camera() -> CameraView {
        CameraView {
            camera_matrix: Mat4::look_at_rh(Vec3::new(0.0, 2.0, 8.0), Vec3::ZERO, Vec3::Y),
            projection_matrix: Mat4::perspective_rh(60f32.to_radians(), 1.0, 0.1, 100.0),
        }
    }

    fn spot_light() -> Light {
        Light {
            color: Vec3::ONE,
            kind: LightKind::Spot,
            position: Vec3::new(0.0, 5.0, 0.0),
            radius: 10.0,
            direction: Vec3::NEG_Y,
            spot_angle: 45f32.to_radians(),
            spot_blend: 0.1,
            matrix: Mat4::look_at_rh(Vec3::new(0.0, 5.0, 0.0), Vec3::ZERO, Vec3::Z),
        }
    }

    fn sun_light() -> Light {
        Light {
            color: Vec3::ONE,
            kind: LightKind::Sun,
            position: Vec3::ZERO,
            radius: 0.0,
            direction: Vec3::new(0.3, -1.0, 0.2).normalize(),
            spot_angle: 0.0,
            spot_blend: 0.0,
            matrix: Mat4::look_at_rh(Vec3::new(-3.0, 10.0, -2.0), Vec3::ZERO, Vec3::Y),
        }
    }

    #[test]
    fn lights_uniform_layout_matches_the_shader_block() {
        assert_eq!(std::mem::size_of::<LightRaw>(), 64);
        // 128 * 64 + 16 + 8 * 64 + 48 * 64
        assert_eq!(std::mem::size_of::<LightsUniform>(), 11_792);
    }

    #[test]
    fn zero_lights_leaves_matrices_untouched() {
        let mut data = LightsData::new();
        data.uniform.spot_matrices[0] = Mat4::from_scale(Vec3::splat(2.0)).to_cols_array_2d();

        let jobs = data.load(&[], &camera(), 3.0);

        assert!(jobs.is_empty());
        assert_eq!(data.lights_count(), 0);
        assert_eq!(data.spot_matrix(0), Mat4::from_scale(Vec3::splat(2.0)));
    }

    #[test]
    fn type_slots_count_per_kind_in_scene_order() {
        let mut data = LightsData::new();
        let lights = vec![spot_light(), sun_light(), spot_light(), sun_light()];

        let jobs = data.load(&lights, &camera(), 3.0);

        assert_eq!(data.uniform.lights[0].type_index, 0);
        assert_eq!(data.uniform.lights[1].type_index, 0);
        assert_eq!(data.uniform.lights[2].type_index, 1);
        assert_eq!(data.uniform.lights[3].type_index, 1);
        // 2 spots + 2 suns * 6 cascades
        assert_eq!(jobs.len(), 2 + 2 * SUN_CASCADES);

        let sun_slots: Vec<u32> = jobs
            .iter()
            .filter_map(|job| match job.target {
                ShadowTarget::SunCascade { slot } => Some(slot),
                _ => None,
            })
            .collect();
        assert_eq!(sun_slots, (0..12).collect::<Vec<u32>>());
    }

    #[test]
    fn spot_overflow_truncates_instead_of_corrupting() {
        let mut data = LightsData::new();
        let lights = vec![spot_light(); MAX_SPOT_SHADOWS + 2];

        let jobs = data.load(&lights, &camera(), 3.0);

        assert_eq!(jobs.len(), MAX_SPOT_SHADOWS);
        assert_eq!(data.lights_count() as usize, MAX_SPOT_SHADOWS + 2);
    }

    #[test]
    fn over_capacity_lights_get_the_no_shadow_sentinel() {
        let mut data = LightsData::new();
        let lights = vec![spot_light(); MAX_SPOT_SHADOWS + 1];
        data.load(&lights, &camera(), 3.0);

        // The truncated light must not alias slot 0's shadow map.
        assert_eq!(data.uniform.lights[0].type_index, 0);
        assert_eq!(data.uniform.lights[MAX_SPOT_SHADOWS].type_index, -1);

        let mut data = LightsData::new();
        let suns = vec![sun_light(); MAX_SUNS + 1];
        data.load(&suns, &camera(), 3.0);
        assert_eq!(data.uniform.lights[MAX_SUNS].type_index, -1);
    }

    #[test]
    fn point_lights_carry_the_no_shadow_sentinel() {
        let mut data = LightsData::new();
        let point = Light {
            kind: LightKind::Point,
            ..spot_light()
        };
        data.load(&[point], &camera(), 3.0);

        assert_eq!(data.uniform.lights[0].type_index, -1);
    }

    #[test]
    fn spot_matrix_is_projection_times_view() {
        let mut data = LightsData::new();
        let light = spot_light();
        data.load(std::slice::from_ref(&light), &camera(), 3.0);

        let expected = spot_projection_matrix(light.spot_angle, light.radius) * light.matrix;
        assert_eq!(data.spot_matrix(0), expected);
        assert!(data
            .spot_matrix(0)
            .to_cols_array()
            .iter()
            .all(|e| e.is_finite()));
    }
}
