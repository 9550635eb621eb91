use std::sync::Arc;

use crate::renderer::internal::{
    compile_main_pass_shader, read_texture, CommonBuffer, DynamicObjectsBuffer, LightingResources,
    PassPipelines, RenderContext, RenderTargets, MAIN_VIEW_SLOT,
};
use crate::renderer::mesh::Mesh;
use crate::renderer::sampling::sample_offset;
use crate::renderer::shader::{ObjectShader, ShaderInputs, NPR_DIFFUSE_SOURCE};
use crate::renderer::uniforms::CommonUniform;
use crate::renderer::vertex::Vertex;
use crate::scene::Scene;

const FLAT_COLOR_SOURCE: &str = include_str!("../shader/flat_color.wgsl");
const COMPOSITE_DEPTH_CLEAR: f64 = 1.0e33;

/// Progressive sampling state. Resets on resolution change and on
/// `is_new_frame`; nothing else touches it.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct SampleState {
    sample_count: u32,
    target_samples: u32,
}

impl SampleState {
    /// Starts the next sample and returns its 0-based index.
    pub(crate) fn begin_sample(&mut self, reset: bool, target_samples: u32) -> u32 {
        if reset {
            self.sample_count = 0;
        }
        self.target_samples = target_samples;
        let index = self.sample_count;
        self.sample_count += 1;
        index
    }

    pub(crate) fn needs_more_samples(&self) -> bool {
        self.sample_count < self.target_samples
    }
}

/// A CPU copy of a rendered target. `pixels` holds `channels` f32 values per
/// pixel, rows top to bottom.
pub struct RenderedImage {
    pub width: u32,
    pub height: u32,
    pub channels: u32,
    pub pixels: Vec<f32>,
}

impl RenderedImage {
    /// Clamped 8-bit RGBA conversion, for writing preview images.
    pub fn to_rgba8(&self) -> Vec<u8> {
        let channels = self.channels as usize;
        let mut out = Vec::with_capacity((self.width * self.height * 4) as usize);
        for pixel in self.pixels.chunks(channels) {
            for c in 0..4 {
                let value = if c < channels { pixel[c] } else { 1.0 };
                out.push((value.clamp(0.0, 1.0) * 255.0) as u8);
            }
        }
        out
    }
}

pub struct RenderOutput {
    pub color: RenderedImage,
    /// Linear view-space depth, only produced for final renders.
    pub depth: Option<RenderedImage>,
}

/// The deferred NPR pipeline: prepass, shadow maps, main pass and the
/// optional depth composite, rendered headless one sample at a time.
pub struct NprPipeline {
    context: RenderContext,
    common: CommonBuffer,
    objects: DynamicObjectsBuffer,
    lighting: LightingResources,
    pipelines: PassPipelines,
    targets: RenderTargets,
    default_shader: ObjectShader,
    samples: SampleState,
}

impl NprPipeline {
    pub fn new() -> Self {
        let context = pollster::block_on(RenderContext::new());
        let common = CommonBuffer::new(&context.device);
        let objects = DynamicObjectsBuffer::new(&context.device, 64);
        let lighting = LightingResources::new(&context.device);
        let pipelines = PassPipelines::new(
            &context.device,
            context.supports_depth_clamp,
            &common.bind_layout,
            &objects.bind_layout,
        );
        let targets = RenderTargets::new(&context.device, &pipelines.prepass_layout, 1, 1);
        let default_shader = compile_main_pass_shader(
            &context.device,
            FLAT_COLOR_SOURCE,
            "FlatColorShader",
            ShaderInputs::empty(),
            &common.bind_layout,
            &objects.bind_layout,
            &lighting.bind_layout,
            &pipelines.prepass_layout,
        );

        Self {
            context,
            common,
            objects,
            lighting,
            pipelines,
            targets,
            default_shader,
            samples: SampleState::default(),
        }
    }

    /// Compiles a WGSL main-pass shader against the pipeline's bind group
    /// ABI. `inputs` declares which optional groups the shader binds.
    pub fn compile_main_pass_shader(&self, source: &str, inputs: ShaderInputs) -> ObjectShader {
        compile_main_pass_shader(
            &self.context.device,
            source,
            "MainPassShader",
            inputs,
            &self.common.bind_layout,
            &self.objects.bind_layout,
            &self.lighting.bind_layout,
            &self.pipelines.prepass_layout,
        )
    }

    /// The built-in lit cel shader, compiled against this pipeline.
    pub fn npr_diffuse_shader(&self) -> ObjectShader {
        self.compile_main_pass_shader(
            NPR_DIFFUSE_SOURCE,
            ShaderInputs::SCENE_LIGHTS
                | ShaderInputs::SPOT_SHADOWMAPS
                | ShaderInputs::SUN_SHADOWMAPS,
        )
    }

    pub fn create_mesh(&self, vertices: &[Vertex], indices: &[u32]) -> Arc<Mesh> {
        Arc::new(Mesh::from_vertices(&self.context.device, vertices, indices))
    }

    /// Whether the scene rendered last frame still has samples to accumulate.
    pub fn needs_more_samples(&self) -> bool {
        self.samples.needs_more_samples()
    }

    /// Renders one progressive sample of the scene and reads the results
    /// back. `is_new_frame` restarts sampling; so does a resolution change.
    pub fn render(
        &mut self,
        resolution: (u32, u32),
        scene: &Scene,
        is_final_render: bool,
        is_new_frame: bool,
    ) -> RenderOutput {
        let (width, height) = resolution;
        let mut reset = is_new_frame;

        if !self.targets.matches(width, height) {
            log::info!("Creating render targets: {}x{}", width, height);
            self.targets = RenderTargets::new(
                &self.context.device,
                &self.pipelines.prepass_layout,
                width,
                height,
            );
            reset = true;
        }

        let sample = self
            .samples
            .begin_sample(reset, scene.sample_target(is_final_render));
        let offset = sample_offset(sample);

        let models: Vec<_> = scene.objects.iter().map(|object| object.matrix).collect();
        self.objects.update(&self.context, &models);

        let mut encoder =
            self.context
                .device
                .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                    label: Some("RenderEncoder"),
                });

        self.lighting.load(
            &self.context,
            &mut encoder,
            &scene.lights,
            &scene.camera,
            scene.parameters.cascades_distribution_exponent,
            &self.common,
            &self.objects,
            &scene.objects,
            &self.pipelines.shadow,
            self.pipelines.sun_shadow(),
            offset,
            sample as i32,
        );

        let camera_uniform = CommonUniform::new(
            scene.camera.camera_matrix,
            scene.camera.projection_matrix,
            resolution,
            offset,
            sample as i32,
        );
        self.common
            .stage_slot(&self.context.queue, MAIN_VIEW_SLOT, &camera_uniform);
        self.common.copy_slot(&mut encoder, MAIN_VIEW_SLOT);

        self.prepass(&mut encoder, scene);
        self.main_pass(&mut encoder, scene);
        if is_final_render {
            self.composite_depth_pass(&mut encoder, scene);
        }

        self.context.queue.submit(Some(encoder.finish()));

        let color = RenderedImage {
            width,
            height,
            channels: 4,
            pixels: read_pixels(&self.context, &self.targets.color, width, height, 16),
        };
        let depth = is_final_render.then(|| RenderedImage {
            width,
            height,
            channels: 1,
            pixels: read_pixels(&self.context, &self.targets.composite_depth, width, height, 4),
        });

        RenderOutput { color, depth }
    }

    /// Normal/depth + object ID prepass. The normal target clears to pure
    /// blue so background pixels are recognizable; the ID target clears to 0
    /// and objects write 1-based IDs.
    fn prepass(&self, encoder: &mut wgpu::CommandEncoder, scene: &Scene) {
        let targets = &self.targets;
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Prepass"),
            color_attachments: &[
                Some(wgpu::RenderPassColorAttachment {
                    view: &targets.normal_depth_view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.0,
                            g: 0.0,
                            b: 1.0,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                }),
                Some(wgpu::RenderPassColorAttachment {
                    view: &targets.id_view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                }),
            ],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &targets.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        pass.set_pipeline(&self.pipelines.prepass);
        pass.set_bind_group(0, &self.common.bind_group, &[]);
        pass.set_bind_group(1, &self.objects.bind_group, &[]);
        draw_objects(&mut pass, scene);
    }

    /// Shading pass. Depth is loaded from the prepass; per object, the
    /// material's shader if set, else the flat-color default.
    fn main_pass(&self, encoder: &mut wgpu::CommandEncoder, scene: &Scene) {
        let targets = &self.targets;
        let background = scene.world.background_color;
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("MainPass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &targets.color_view,
                depth_slice: None,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color {
                        r: background.x as f64,
                        g: background.y as f64,
                        b: background.z as f64,
                        a: background.w as f64,
                    }),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &targets.depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        pass.set_bind_group(0, &self.common.bind_group, &[]);
        pass.set_bind_group(1, &self.objects.bind_group, &[]);

        for (index, object) in scene.objects.iter().enumerate() {
            let shader = object
                .material
                .shader
                .as_deref()
                .unwrap_or(&self.default_shader);

            pass.set_pipeline(&shader.pipeline);
            if let Some(group) = shader.inputs.lights_group_index() {
                pass.set_bind_group(group, &self.lighting.bind_group, &[]);
            }
            if let Some(group) = shader.inputs.prepass_group_index() {
                pass.set_bind_group(group, &targets.prepass_bind_group, &[]);
            }

            let index = index as u32;
            pass.set_vertex_buffer(0, object.mesh.vertex_buffer().slice(..));
            pass.set_index_buffer(
                object.mesh.index_buffer().slice(..),
                wgpu::IndexFormat::Uint32,
            );
            pass.draw_indexed(0..object.mesh.index_count(), 0, index..index + 1);
        }
    }

    /// Writes linearized view-space depth for the final render output, with
    /// depth testing disabled. The clear value is a huge sentinel so empty
    /// pixels read as "infinitely far".
    fn composite_depth_pass(&self, encoder: &mut wgpu::CommandEncoder, scene: &Scene) {
        let targets = &self.targets;
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("CompositeDepthPass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &targets.composite_depth_view,
                depth_slice: None,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color {
                        r: COMPOSITE_DEPTH_CLEAR,
                        g: 0.0,
                        b: 0.0,
                        a: 0.0,
                    }),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        pass.set_pipeline(&self.pipelines.composite_depth);
        pass.set_bind_group(0, &self.common.bind_group, &[]);
        pass.set_bind_group(1, &self.objects.bind_group, &[]);
        draw_objects(&mut pass, scene);
    }
}

impl Default for NprPipeline {
    fn default() -> Self {
        Self::new()
    }
}

fn draw_objects(pass: &mut wgpu::RenderPass, scene: &Scene) {
    for (index, object) in scene.objects.iter().enumerate() {
        let index = index as u32;
        pass.set_vertex_buffer(0, object.mesh.vertex_buffer().slice(..));
        pass.set_index_buffer(
            object.mesh.index_buffer().slice(..),
            wgpu::IndexFormat::Uint32,
        );
        pass.draw_indexed(0..object.mesh.index_count(), 0, index..index + 1);
    }
}

fn read_pixels(
    context: &RenderContext,
    texture: &wgpu::Texture,
    width: u32,
    height: u32,
    bytes_per_pixel: u32,
) -> Vec<f32> {
    let bytes = read_texture(context, texture, width, height, bytes_per_pixel);
    // The readback buffer is only byte-aligned, so decode instead of casting.
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_state_counts_up_to_the_target() {
        let mut state = SampleState::default();
        assert!(!state.needs_more_samples());

        assert_eq!(state.begin_sample(true, 3), 0);
        assert!(state.needs_more_samples());
        assert_eq!(state.begin_sample(false, 3), 1);
        assert_eq!(state.begin_sample(false, 3), 2);
        assert!(!state.needs_more_samples());
    }

    #[test]
    fn sample_state_resets_on_demand() {
        let mut state = SampleState::default();
        state.begin_sample(true, 8);
        state.begin_sample(false, 8);
        assert_eq!(state.begin_sample(true, 8), 0);
    }

    #[test]
    fn rgba8_conversion_clamps_and_fills_alpha() {
        let image = RenderedImage {
            width: 1,
            height: 1,
            channels: 1,
            pixels: vec![2.0],
        };
        assert_eq!(image.to_rgba8(), vec![255, 255, 255, 255]);
    }
}
