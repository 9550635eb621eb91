pub mod cascades;
pub(crate) mod internal;
pub mod lights;
pub mod mesh;
pub mod pipeline;
pub mod pipeline_builder;
pub mod primitives;
pub mod sampling;
pub mod shader;
pub mod uniforms;
pub mod vertex;

pub use mesh::Mesh;
pub use pipeline::{NprPipeline, RenderOutput, RenderedImage};
pub use shader::{ObjectShader, ShaderInputs};
pub use vertex::{v, Vertex};
