use glam::{Mat4, Vec3};

use npr_renderer::renderer::cascades::{
    cascade_splits, frustum_corners, get_sun_cascades, sun_shadowmap_matrix,
};

fn camera_projection() -> Mat4 {
    Mat4::perspective_rh(60f32.to_radians(), 16.0 / 9.0, 0.1, 100.0)
}

fn camera_view() -> Mat4 {
    Mat4::look_at_rh(Vec3::new(0.0, 2.0, 10.0), Vec3::ZERO, Vec3::Y)
}

fn sun_view() -> Mat4 {
    Mat4::look_at_rh(Vec3::new(20.0, 30.0, 10.0), Vec3::ZERO, Vec3::Y)
}

#[test]
fn orthographic_splits_are_exactly_linear() {
    let projection = Mat4::orthographic_rh(-5.0, 5.0, -5.0, 5.0, 0.1, 50.0);
    assert_eq!(cascade_splits(projection, 6, 3.0), vec![
        1.0 / 6.0,
        2.0 / 6.0,
        3.0 / 6.0,
        4.0 / 6.0,
        5.0 / 6.0,
        1.0,
    ]);
}

#[test]
fn perspective_splits_are_strictly_increasing() {
    let splits = cascade_splits(camera_projection(), 6, 3.0);
    assert_eq!(splits.len(), 6);
    for pair in splits.windows(2) {
        assert!(pair[0] < pair[1], "splits not increasing: {:?}", splits);
    }
    assert!(splits.iter().all(|s| *s > 0.0 && *s <= 1.0 + 1e-5));
}

#[test]
fn get_sun_cascades_returns_one_matrix_per_cascade() {
    let projection = camera_projection();
    let clip_from_world = projection * camera_view();
    for count in [1, 4, 6] {
        let cascades = get_sun_cascades(sun_view(), projection, clip_from_world, count, 3.0);
        assert_eq!(cascades.len(), count);
        for matrix in &cascades {
            assert!(matrix.to_cols_array().iter().all(|e| e.is_finite()));
        }
    }
}

#[test]
fn frustum_slice_corners_land_inside_the_fitted_cascade() {
    let projection = camera_projection();
    let clip_from_world = projection * camera_view();
    let (near, far) = (0.2, 0.6);

    let cascade = sun_shadowmap_matrix(sun_view(), clip_from_world, near, far);

    for corner in frustum_corners(clip_from_world, near, far) {
        let clip = cascade * corner.extend(1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x >= -1.0 - 1e-3 && ndc.x <= 1.0 + 1e-3, "x = {}", ndc.x);
        assert!(ndc.y >= -1.0 - 1e-3 && ndc.y <= 1.0 + 1e-3, "y = {}", ndc.y);
        assert!(ndc.z >= -1e-3 && ndc.z <= 1.0 + 1e-3, "z = {}", ndc.z);
    }
}

#[test]
fn frustum_corners_unproject_the_full_clip_volume() {
    let projection = camera_projection();
    let clip_from_world = projection * camera_view();

    let corners = frustum_corners(clip_from_world, 0.0, 1.0);
    // Reprojecting each corner must land back on an NDC cube corner.
    for corner in corners {
        let clip = clip_from_world * corner.extend(1.0);
        let ndc = clip.truncate() / clip.w;
        assert!((ndc.x.abs() - 1.0).abs() < 1e-3);
        assert!((ndc.y.abs() - 1.0).abs() < 1e-3);
        assert!(ndc.z > -1e-3 && ndc.z < 1.0 + 1e-3);
    }
}
