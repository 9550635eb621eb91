mod buffers;
mod context;
mod passes;
mod readback;
mod shadows;
mod targets;

pub(crate) use buffers::{CommonBuffer, DynamicObjectsBuffer, MAIN_VIEW_SLOT};
pub(crate) use context::RenderContext;
pub(crate) use passes::{compile_main_pass_shader, PassPipelines};
pub(crate) use readback::read_texture;
pub(crate) use shadows::LightingResources;
pub(crate) use targets::RenderTargets;
