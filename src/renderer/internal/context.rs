pub(crate) struct RenderContext {
    pub(crate) device: wgpu::Device,
    pub(crate) queue: wgpu::Queue,
    pub(crate) supports_depth_clamp: bool,
}

impl RenderContext {
    /// Creates a headless device. There is no surface; every render target is
    /// an offscreen texture and results leave the GPU through buffer readback.
    pub(crate) async fn new() -> Self {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .expect("Failed to find adapter");

        log::info!("Using adapter: {:?}", adapter.get_info());
        log::info!("Using backend: {:?}", adapter.get_info().backend);
        let adapter_features = adapter.features();

        let mut required_features = wgpu::Features::empty();
        let supports_depth_clamp =
            if adapter_features.contains(wgpu::Features::DEPTH_CLIP_CONTROL) {
                required_features |= wgpu::Features::DEPTH_CLIP_CONTROL;
                true
            } else {
                log::warn!("Depth clamping not supported; sun shadows may clip near casters");
                false
            };

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Device"),
                required_features,
                required_limits: wgpu::Limits::default(),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .expect("Failed to create device");

        Self {
            device,
            queue,
            supports_depth_clamp,
        }
    }
}
