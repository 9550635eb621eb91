//! Cascaded shadow-map math for sun lights.
//!
//! Conventions used in this codebase:
//! - Right-handed view space (camera looks down -Z).
//! - Clip/NDC depth range is [0, 1] (wgpu/D3D). Near -> 0, Far -> 1.
//!
//! Everything here is pure matrix math; it runs once per sun light per
//! cascade per frame, so there is no caching.

use glam::{Mat4, Vec3, Vec4};

/// Device-depth split positions for `count` cascades, each in (0, 1].
///
/// Orthographic projections get linear splits. Perspective projections step
/// linearly in view-space distance out to the far plane, reproject each step
/// to device depth, and raise it to `distribution_exponent`; exponents above
/// 1 concentrate cascades near the camera where shadow detail matters most.
pub fn cascade_splits(projection: Mat4, count: usize, distribution_exponent: f32) -> Vec<f32> {
    let mut splits = Vec::with_capacity(count);

    if projection.w_axis.w == 1.0 {
        // Orthographic
        for i in 0..count {
            splits.push((i as f32 + 1.0) / count as f32);
        }
    } else {
        // Perspective: recover the far clip distance by unprojecting the
        // deepest NDC point.
        let far = projection.inverse() * Vec4::new(0.0, 0.0, 1.0, 1.0);
        let clip_end = -(far.z / far.w);

        let step_size = clip_end / count as f32;
        for i in 0..count {
            let distance = (i + 1) as f32 * step_size;
            let projected = projection * Vec4::new(0.0, 0.0, -distance, 1.0);
            let depth = projected.z / projected.w.abs();
            splits.push(depth.powf(distribution_exponent));
        }
    }

    splits
}

/// The 8 world-space corners of the view-frustum slice between device depths
/// `near` and `far`.
pub fn frustum_corners(clip_from_world: Mat4, near: f32, far: f32) -> [Vec3; 8] {
    let world_from_clip = clip_from_world.inverse();
    let mut corners = [Vec3::ZERO; 8];
    let mut index = 0;

    for x in [-1.0, 1.0] {
        for y in [-1.0, 1.0] {
            for z in [near, far] {
                let corner = world_from_clip * Vec4::new(x, y, z, 1.0);
                corners[index] = corner.truncate() / corner.w;
                index += 1;
            }
        }
    }

    corners
}

/// World-to-clip matrix for one sun cascade: an orthographic volume fitted to
/// the light-space AABB of the frustum slice.
pub fn sun_shadowmap_matrix(sun_from_world: Mat4, clip_from_world: Mat4, near: f32, far: f32) -> Mat4 {
    let mut aabb_min = Vec3::INFINITY;
    let mut aabb_max = Vec3::NEG_INFINITY;

    for corner in frustum_corners(clip_from_world, near, far) {
        let corner = (sun_from_world * corner.extend(1.0)).truncate();
        aabb_min = aabb_min.min(corner);
        aabb_max = aabb_max.max(corner);
    }

    // The light looks down -Z in its own space, so the AABB's far Z bound is
    // the near plane of the fitted volume.
    let projection = Mat4::orthographic_rh(
        aabb_min.x,
        aabb_max.x,
        aabb_min.y,
        aabb_max.y,
        -aabb_max.z,
        -aabb_min.z,
    );

    projection * sun_from_world
}

/// One fitted world-to-clip matrix per cascade, `cascades_count` in total.
pub fn get_sun_cascades(
    sun_from_world: Mat4,
    projection: Mat4,
    clip_from_world: Mat4,
    cascades_count: usize,
    distribution_exponent: f32,
) -> Vec<Mat4> {
    let splits = cascade_splits(projection, cascades_count, distribution_exponent);
    let mut cascades = Vec::with_capacity(splits.len());

    let mut near = 0.0;
    for &far in &splits {
        cascades.push(sun_shadowmap_matrix(sun_from_world, clip_from_world, near, far));
        near = far;
    }

    cascades
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orthographic_splits_are_linear() {
        let projection = Mat4::orthographic_rh(-10.0, 10.0, -10.0, 10.0, 0.1, 100.0);
        let splits = cascade_splits(projection, 4, 3.0);
        assert_eq!(splits, vec![0.25, 0.5, 0.75, 1.0]);
    }

    #[test]
    fn perspective_splits_reach_the_far_plane() {
        let projection = Mat4::perspective_rh(60f32.to_radians(), 1.0, 0.1, 100.0);
        let splits = cascade_splits(projection, 6, 3.0);
        assert_eq!(splits.len(), 6);
        assert!((splits[5] - 1.0).abs() < 1e-5, "last split {}", splits[5]);
    }

    #[test]
    fn exponent_pulls_splits_toward_the_camera() {
        let projection = Mat4::perspective_rh(60f32.to_radians(), 1.0, 0.1, 100.0);
        let linear = cascade_splits(projection, 6, 1.0);
        let biased = cascade_splits(projection, 6, 3.0);
        for (l, b) in linear.iter().zip(&biased).take(5) {
            assert!(b < l, "biased split {b} should sit before linear split {l}");
        }
    }
}
