use std::sync::Arc;

use glam::{Mat4, Vec3};

use npr_renderer::renderer::primitives::cube_mesh;
use npr_renderer::scene::{CameraView, Light, Scene, SceneObject};
use npr_renderer::NprPipeline;

const RESOLUTION: (u32, u32) = (800, 600);

fn build_scene(pipeline: &NprPipeline) -> Scene {
    let (vertices, indices) = cube_mesh();
    let cube = pipeline.create_mesh(&vertices, &indices);
    let shader = Arc::new(pipeline.npr_diffuse_shader());

    let mut scene = Scene::new();
    scene.camera = CameraView::new(
        Mat4::look_at_rh(Vec3::new(4.0, 3.0, 6.0), Vec3::new(0.0, 0.5, 0.0), Vec3::Y),
        Mat4::perspective_rh(50f32.to_radians(), 800.0 / 600.0, 0.1, 100.0),
    );

    // Ground slab plus a few cubes to cast shadows on it.
    scene.objects.push(
        SceneObject::new(
            Arc::clone(&cube),
            Mat4::from_scale_rotation_translation(
                Vec3::new(12.0, 0.2, 12.0),
                glam::Quat::IDENTITY,
                Vec3::new(0.0, -0.1, 0.0),
            ),
        )
        .with_shader(Arc::clone(&shader)),
    );
    for (x, z, height) in [(-1.5, 0.0, 1.0), (0.5, -0.5, 1.6), (1.2, 1.0, 0.7)] {
        scene.objects.push(
            SceneObject::new(
                Arc::clone(&cube),
                Mat4::from_scale_rotation_translation(
                    Vec3::new(1.0, height, 1.0),
                    glam::Quat::IDENTITY,
                    Vec3::new(x, height / 2.0, z),
                ),
            )
            .with_shader(Arc::clone(&shader)),
        );
    }

    scene.lights.push(Light::sun(
        Vec3::splat(0.9),
        Mat4::look_at_rh(Vec3::new(5.0, 8.0, 3.0), Vec3::ZERO, Vec3::Y),
    ));
    scene.lights.push(Light::spot(
        Vec3::new(1.0, 0.8, 0.6),
        Mat4::look_at_rh(Vec3::new(-3.0, 5.0, 2.0), Vec3::ZERO, Vec3::Y),
        20.0,
        50f32.to_radians(),
        0.2,
    ));
    scene
        .lights
        .push(Light::point(Vec3::new(0.2, 0.3, 1.0), Vec3::new(0.0, 2.5, 2.0), 12.0));

    scene
}

fn main() {
    npr_renderer::init_logging();

    let mut pipeline = NprPipeline::new();
    let scene = build_scene(&pipeline);

    let mut accumulated: Vec<f32> = Vec::new();
    let mut samples = 0u32;
    let mut is_new_frame = true;

    loop {
        let output = pipeline.render(RESOLUTION, &scene, true, is_new_frame);
        is_new_frame = false;
        samples += 1;

        if accumulated.is_empty() {
            accumulated = output.color.pixels;
        } else {
            for (acc, value) in accumulated.iter_mut().zip(&output.color.pixels) {
                *acc += value;
            }
        }

        if !pipeline.needs_more_samples() {
            break;
        }
    }

    log::info!("Rendered {} samples", samples);

    let scale = 1.0 / samples as f32;
    let averaged = npr_renderer::RenderedImage {
        width: RESOLUTION.0,
        height: RESOLUTION.1,
        channels: 4,
        pixels: accumulated.iter().map(|value| value * scale).collect(),
    };

    let image = image::RgbaImage::from_raw(RESOLUTION.0, RESOLUTION.1, averaged.to_rgba8())
        .expect("Image dimensions match the pixel buffer");
    match image.save("render.png") {
        Ok(()) => log::info!("Wrote render.png"),
        Err(error) => log::error!("Failed to write render.png: {error}"),
    }
}
