use crate::renderer::internal::targets::{
    COLOR_FORMAT, COMPOSITE_DEPTH_FORMAT, DEPTH_FORMAT, ID_FORMAT, NORMAL_DEPTH_FORMAT,
};
use crate::renderer::pipeline_builder::PipelineBuilder;
use crate::renderer::shader::{ObjectShader, ShaderInputs};
use crate::renderer::Vertex;

/// Bind group layout for the prepass outputs. Both textures are read with
/// `textureLoad`, so no sampler and no filterable requirement on the float
/// target.
pub(crate) fn prepass_bind_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("PrepassBindLayout"),
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: false },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Uint,
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            },
        ],
    })
}

/// The fixed-function pipelines plus the default main-pass shader. Main-pass
/// shaders for materials are compiled on demand through
/// [`compile_main_pass_shader`]; everything else is built once here.
pub(crate) struct PassPipelines {
    pub(crate) prepass: wgpu::RenderPipeline,
    pub(crate) composite_depth: wgpu::RenderPipeline,
    pub(crate) shadow: wgpu::RenderPipeline,
    shadow_clamped: Option<wgpu::RenderPipeline>,
    pub(crate) prepass_layout: wgpu::BindGroupLayout,
}

impl PassPipelines {
    pub(crate) fn new(
        device: &wgpu::Device,
        supports_depth_clamp: bool,
        common_layout: &wgpu::BindGroupLayout,
        objects_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let prepass_layout = prepass_bind_layout(device);

        let scene_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("ScenePipelineLayout"),
            bind_group_layouts: &[common_layout, objects_layout],
            push_constant_ranges: &[],
        });

        let prepass_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("PrepassShader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../../shader/prepass.wgsl").into()),
        });
        let prepass = PipelineBuilder::new(device, &scene_layout, &prepass_shader)
            .with_label("PrepassPipeline")
            .with_vertex_buffer(Vertex::layout())
            .with_color_target(NORMAL_DEPTH_FORMAT, None)
            .with_color_target(ID_FORMAT, None)
            .with_depth_stencil(DEPTH_FORMAT, true, wgpu::CompareFunction::LessEqual)
            .build();

        let composite_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("CompositeDepthShader"),
            source: wgpu::ShaderSource::Wgsl(
                include_str!("../../shader/composite_depth.wgsl").into(),
            ),
        });
        // No depth state at all: the composite draws with depth testing
        // disabled, so for overlapping geometry the last-drawn depth wins.
        let composite_depth = PipelineBuilder::new(device, &scene_layout, &composite_shader)
            .with_label("CompositeDepthPipeline")
            .with_vertex_buffer(Vertex::layout())
            .with_color_target(COMPOSITE_DEPTH_FORMAT, None)
            .build();

        let shadow_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("ShadowShader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("../../shader/shadow.wgsl").into()),
        });
        let shadow = PipelineBuilder::new(device, &scene_layout, &shadow_shader)
            .with_label("ShadowPipeline")
            .with_vertex_buffer(Vertex::layout())
            .depth_only()
            .with_depth_stencil_biased(DEPTH_FORMAT, true, wgpu::CompareFunction::LessEqual, 2, 2.0)
            .build();

        // Sun cascades fit tight orthographic volumes, so casters between the
        // volume and the light must clamp into range instead of clipping out.
        let shadow_clamped = supports_depth_clamp.then(|| {
            PipelineBuilder::new(device, &scene_layout, &shadow_shader)
                .with_label("SunShadowPipeline")
                .with_vertex_buffer(Vertex::layout())
                .depth_only()
                .with_depth_stencil_biased(
                    DEPTH_FORMAT,
                    true,
                    wgpu::CompareFunction::LessEqual,
                    2,
                    2.0,
                )
                .with_unclipped_depth()
                .build()
        });

        Self {
            prepass,
            composite_depth,
            shadow,
            shadow_clamped,
            prepass_layout,
        }
    }

    pub(crate) fn sun_shadow(&self) -> &wgpu::RenderPipeline {
        self.shadow_clamped.as_ref().unwrap_or(&self.shadow)
    }
}

/// Compiles WGSL source into a main-pass pipeline. The bind group layouts the
/// pipeline carries follow the shader's declared inputs, packed contiguously,
/// so a shader only pays for the resources it asked for.
pub(crate) fn compile_main_pass_shader(
    device: &wgpu::Device,
    source: &str,
    label: &str,
    inputs: ShaderInputs,
    common_layout: &wgpu::BindGroupLayout,
    objects_layout: &wgpu::BindGroupLayout,
    lights_layout: &wgpu::BindGroupLayout,
    prepass_layout: &wgpu::BindGroupLayout,
) -> ObjectShader {
    let mut layouts = vec![common_layout, objects_layout];
    if inputs.wants_lights_group() {
        layouts.push(lights_layout);
    }
    if inputs.wants_prepass_group() {
        layouts.push(prepass_layout);
    }

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(label),
        bind_group_layouts: &layouts,
        push_constant_ranges: &[],
    });

    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });

    let pipeline = PipelineBuilder::new(device, &pipeline_layout, &module)
        .with_label(label)
        .with_vertex_buffer(Vertex::layout())
        .with_color_target(COLOR_FORMAT, None)
        .with_depth_stencil(DEPTH_FORMAT, false, wgpu::CompareFunction::LessEqual)
        .build();

    ObjectShader { pipeline, inputs }
}
