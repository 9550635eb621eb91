use std::mem;
use std::num::NonZeroU64;

use glam::Vec2;

use crate::renderer::internal::{CommonBuffer, DynamicObjectsBuffer, RenderContext};
use crate::renderer::lights::{
    LightsData, LightsUniform, ShadowJob, ShadowTarget, MAX_SPOT_SHADOWS, MAX_SUN_SHADOWS,
    SPOT_SHADOW_RESOLUTION, SUN_SHADOW_RESOLUTION,
};
use crate::renderer::uniforms::CommonUniform;
use crate::scene::{CameraView, Light, SceneObject};

struct ShadowArray {
    _texture: wgpu::Texture,
    array_view: wgpu::TextureView,
    layer_views: Vec<wgpu::TextureView>,
}

impl ShadowArray {
    fn new(device: &wgpu::Device, label: &str, layers: u32, size: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: size,
                height: size,
                depth_or_array_layers: layers.max(1),
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Depth32Float,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });

        let array_view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some(&format!("{label}ArrayView")),
            format: Some(wgpu::TextureFormat::Depth32Float),
            dimension: Some(wgpu::TextureViewDimension::D2Array),
            aspect: wgpu::TextureAspect::All,
            base_mip_level: 0,
            mip_level_count: None,
            base_array_layer: 0,
            array_layer_count: Some(layers.max(1)),
            ..Default::default()
        });

        let mut layer_views = Vec::with_capacity(layers.max(1) as usize);
        for layer in 0..layers.max(1) {
            layer_views.push(texture.create_view(&wgpu::TextureViewDescriptor {
                label: Some(&format!("{label}Layer{layer}")),
                format: Some(wgpu::TextureFormat::Depth32Float),
                dimension: Some(wgpu::TextureViewDimension::D2),
                aspect: wgpu::TextureAspect::All,
                base_mip_level: 0,
                mip_level_count: None,
                base_array_layer: layer,
                array_layer_count: Some(1),
                ..Default::default()
            }));
        }

        Self {
            _texture: texture,
            array_view,
            layer_views,
        }
    }

    fn layer_view(&self, index: usize) -> &wgpu::TextureView {
        let clamped = index.min(self.layer_views.len().saturating_sub(1));
        if clamped != index {
            log::warn!(
                "Shadow layer index {} clamped to {} (max: {})",
                index,
                clamped,
                self.layer_views.len() - 1
            );
        }
        &self.layer_views[clamped]
    }
}

/// GPU side of the lighting subsystem: the lights uniform buffer, both
/// shadow-map arrays, and the bind group shaders see as the lighting group.
pub(crate) struct LightingResources {
    pub(crate) data: LightsData,
    buffer: wgpu::Buffer,
    spot_maps: ShadowArray,
    sun_maps: ShadowArray,
    _sampler: wgpu::Sampler,
    pub(crate) bind_layout: wgpu::BindGroupLayout,
    pub(crate) bind_group: wgpu::BindGroup,
}

impl LightingResources {
    pub(crate) fn new(device: &wgpu::Device) -> Self {
        let spot_maps = ShadowArray::new(
            device,
            "SpotShadowMap",
            MAX_SPOT_SHADOWS as u32,
            SPOT_SHADOW_RESOLUTION,
        );
        let sun_maps = ShadowArray::new(
            device,
            "SunShadowMap",
            MAX_SUN_SHADOWS as u32,
            SUN_SHADOW_RESOLUTION,
        );

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("ShadowSampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            compare: Some(wgpu::CompareFunction::LessEqual),
            lod_min_clamp: 0.0,
            lod_max_clamp: 1.0,
            ..Default::default()
        });

        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("LightsBuffer"),
            size: mem::size_of::<LightsUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("LightsBindLayout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: Some(
                            NonZeroU64::new(mem::size_of::<LightsUniform>() as u64).unwrap(),
                        ),
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Depth,
                        view_dimension: wgpu::TextureViewDimension::D2Array,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Depth,
                        view_dimension: wgpu::TextureViewDimension::D2Array,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                    count: None,
                },
            ],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("LightsBindGroup"),
            layout: &bind_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&spot_maps.array_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&sun_maps.array_view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        });

        Self {
            data: LightsData::new(),
            buffer,
            spot_maps,
            sun_maps,
            _sampler: sampler,
            bind_layout,
            bind_group,
        }
    }

    /// Rebuilds the lights uniform from the scene and renders every shadow
    /// map it calls for. Spot and sun cascade views go through staging slots
    /// so all passes share `encoder` (direct uniform writes would all land
    /// before the first pass runs).
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn load(
        &mut self,
        context: &RenderContext,
        encoder: &mut wgpu::CommandEncoder,
        lights: &[Light],
        camera: &CameraView,
        cascades_distribution_exponent: f32,
        common: &CommonBuffer,
        objects: &DynamicObjectsBuffer,
        scene_objects: &[SceneObject],
        shadow_pipeline: &wgpu::RenderPipeline,
        sun_shadow_pipeline: &wgpu::RenderPipeline,
        sample_offset: Vec2,
        sample_count: i32,
    ) {
        let jobs = self
            .data
            .load(lights, camera, cascades_distribution_exponent);

        context
            .queue
            .write_buffer(&self.buffer, 0, bytemuck::bytes_of(&self.data.uniform));

        for job in &jobs {
            let (slot, resolution) = staging_slot(job);
            let uniform = CommonUniform::new(
                job.view.camera_matrix,
                job.view.projection_matrix,
                (resolution, resolution),
                sample_offset,
                sample_count,
            );
            common.stage_slot(&context.queue, slot, &uniform);
        }

        for job in &jobs {
            let (slot, _) = staging_slot(job);
            common.copy_slot(encoder, slot);

            let (view, pipeline) = match job.target {
                ShadowTarget::Spot { slot } => {
                    (self.spot_maps.layer_view(slot as usize), shadow_pipeline)
                }
                ShadowTarget::SunCascade { slot } => (
                    self.sun_maps.layer_view(slot as usize),
                    sun_shadow_pipeline,
                ),
            };

            self.render_pass(encoder, view, pipeline, common, objects, scene_objects);
        }
    }

    fn render_pass(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        pipeline: &wgpu::RenderPipeline,
        common: &CommonBuffer,
        objects: &DynamicObjectsBuffer,
        scene_objects: &[SceneObject],
    ) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("ShadowPass"),
            color_attachments: &[],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, &common.bind_group, &[]);
        pass.set_bind_group(1, &objects.bind_group, &[]);

        for (index, object) in scene_objects.iter().enumerate() {
            let index = index as u32;
            pass.set_vertex_buffer(0, object.mesh.vertex_buffer().slice(..));
            pass.set_index_buffer(object.mesh.index_buffer().slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..object.mesh.index_count(), 0, index..index + 1);
        }
    }
}

/// Staging slot for a shadow view: spots first, sun cascades after.
fn staging_slot(job: &ShadowJob) -> (u64, u32) {
    match job.target {
        ShadowTarget::Spot { slot } => (slot as u64, SPOT_SHADOW_RESOLUTION),
        ShadowTarget::SunCascade { slot } => {
            (MAX_SPOT_SHADOWS as u64 + slot as u64, SUN_SHADOW_RESOLUTION)
        }
    }
}
