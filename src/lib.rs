pub mod renderer;
pub mod scene;

pub use renderer::{NprPipeline, ObjectShader, RenderOutput, RenderedImage, ShaderInputs};
pub use scene::{
    CameraView, Light, LightKind, Material, Scene, SceneObject, SceneParameters, WorldParameters,
};

/// Logging setup for binaries: env_logger with info as the default level,
/// overridable through `RUST_LOG`.
pub fn init_logging() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();
}
