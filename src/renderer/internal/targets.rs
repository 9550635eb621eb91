pub(crate) const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba32Float;
pub(crate) const NORMAL_DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba32Float;
pub(crate) const ID_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::R32Uint;
pub(crate) const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
pub(crate) const COMPOSITE_DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::R32Float;

fn color_target(
    device: &wgpu::Device,
    label: &str,
    width: u32,
    height: u32,
    format: wgpu::TextureFormat,
) -> (wgpu::Texture, wgpu::TextureView) {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT
            | wgpu::TextureUsages::TEXTURE_BINDING
            | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    (texture, view)
}

/// Every offscreen target the pipeline renders into, all sized to the
/// current resolution. Recreated whenever the requested resolution changes;
/// the whole set goes together so views and bind group never mix sizes.
pub(crate) struct RenderTargets {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) depth_view: wgpu::TextureView,
    pub(crate) normal_depth_view: wgpu::TextureView,
    pub(crate) id_view: wgpu::TextureView,
    pub(crate) color: wgpu::Texture,
    pub(crate) color_view: wgpu::TextureView,
    pub(crate) composite_depth: wgpu::Texture,
    pub(crate) composite_depth_view: wgpu::TextureView,
    pub(crate) prepass_bind_group: wgpu::BindGroup,
    _depth: wgpu::Texture,
    _normal_depth: wgpu::Texture,
    _id: wgpu::Texture,
}

impl RenderTargets {
    pub(crate) fn new(
        device: &wgpu::Device,
        prepass_layout: &wgpu::BindGroupLayout,
        width: u32,
        height: u32,
    ) -> Self {
        let (depth, depth_view) = color_target(device, "DepthTarget", width, height, DEPTH_FORMAT);
        let (normal_depth, normal_depth_view) = color_target(
            device,
            "NormalDepthTarget",
            width,
            height,
            NORMAL_DEPTH_FORMAT,
        );
        let (id, id_view) = color_target(device, "IdTarget", width, height, ID_FORMAT);
        let (color, color_view) = color_target(device, "ColorTarget", width, height, COLOR_FORMAT);
        let (composite_depth, composite_depth_view) = color_target(
            device,
            "CompositeDepthTarget",
            width,
            height,
            COMPOSITE_DEPTH_FORMAT,
        );

        let prepass_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("PrepassBindGroup"),
            layout: prepass_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&normal_depth_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&id_view),
                },
            ],
        });

        Self {
            width,
            height,
            depth_view,
            normal_depth_view,
            id_view,
            color,
            color_view,
            composite_depth,
            composite_depth_view,
            prepass_bind_group,
            _depth: depth,
            _normal_depth: normal_depth,
            _id: id,
        }
    }

    pub(crate) fn matches(&self, width: u32, height: u32) -> bool {
        self.width == width && self.height == height
    }
}
