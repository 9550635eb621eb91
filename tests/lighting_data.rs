use glam::{Mat4, Vec3};

use npr_renderer::renderer::lights::{LightsData, ShadowTarget, SUN_CASCADES};
use npr_renderer::scene::{CameraView, Light};

fn camera() -> CameraView {
    CameraView::new(
        Mat4::look_at_rh(Vec3::new(0.0, 3.0, 10.0), Vec3::ZERO, Vec3::Y),
        Mat4::perspective_rh(60f32.to_radians(), 16.0 / 9.0, 0.1, 100.0),
    )
}

fn mixed_lights() -> Vec<Light> {
    vec![
        Light::point(Vec3::new(0.2, 0.3, 1.0), Vec3::new(0.0, 2.5, 2.0), 12.0),
        Light::spot(
            Vec3::ONE,
            Mat4::look_at_rh(Vec3::new(-3.0, 5.0, 2.0), Vec3::ZERO, Vec3::Y),
            20.0,
            50f32.to_radians(),
            0.2,
        ),
        Light::sun(
            Vec3::splat(0.9),
            Mat4::look_at_rh(Vec3::new(5.0, 8.0, 3.0), Vec3::ZERO, Vec3::Y),
        ),
    ]
}

#[test]
fn mixed_scene_produces_one_spot_and_six_sun_jobs() {
    let mut data = LightsData::new();
    let jobs = data.load(&mixed_lights(), &camera(), 3.0);

    // Point lights cast no shadows here.
    assert_eq!(jobs.len(), 1 + SUN_CASCADES);
    assert_eq!(data.lights_count(), 3);

    let spot_jobs: Vec<_> = jobs
        .iter()
        .filter(|job| matches!(job.target, ShadowTarget::Spot { .. }))
        .collect();
    assert_eq!(spot_jobs.len(), 1);
    assert_eq!(spot_jobs[0].target, ShadowTarget::Spot { slot: 0 });

    let sun_slots: Vec<u32> = jobs
        .iter()
        .filter_map(|job| match job.target {
            ShadowTarget::SunCascade { slot } => Some(slot),
            _ => None,
        })
        .collect();
    assert_eq!(sun_slots, (0..SUN_CASCADES as u32).collect::<Vec<_>>());
}

#[test]
fn shadow_views_never_touch_scene_state() {
    let lights = mixed_lights();
    let spot_matrix = lights[1].matrix;

    let mut data = LightsData::new();
    let jobs = data.load(&lights, &camera(), 3.0);

    // The spot job carries the light's own view, and the input is unchanged.
    let spot_job = jobs
        .iter()
        .find(|job| matches!(job.target, ShadowTarget::Spot { .. }))
        .unwrap();
    assert_eq!(spot_job.view.camera_matrix, spot_matrix);
    assert_eq!(lights[1].matrix, spot_matrix);
}

#[test]
fn sun_jobs_bake_the_projection_into_the_view() {
    let mut data = LightsData::new();
    let jobs = data.load(&mixed_lights(), &camera(), 3.0);

    for job in jobs {
        if let ShadowTarget::SunCascade { slot } = job.target {
            assert_eq!(job.view.projection_matrix, Mat4::IDENTITY);
            assert_eq!(job.view.camera_matrix, data.sun_matrix(slot as usize));
            assert!(job
                .view
                .camera_matrix
                .to_cols_array()
                .iter()
                .all(|e| e.is_finite()));
        }
    }
}

#[test]
fn stored_matrices_are_finite_for_the_mixed_scene() {
    let mut data = LightsData::new();
    data.load(&mixed_lights(), &camera(), 3.0);

    assert!(data
        .spot_matrix(0)
        .to_cols_array()
        .iter()
        .all(|e| e.is_finite()));
    for slot in 0..SUN_CASCADES {
        assert!(data
            .sun_matrix(slot)
            .to_cols_array()
            .iter()
            .all(|e| e.is_finite()));
    }
}
