pub mod camera;
pub mod canvas;
pub mod gpu_context;
pub mod mesh;
pub mod quad_pipeline;
pub mod renderer;
pub mod texture;
pub mod vertex;

pub use camera::{Camera2D, CameraUniform};
pub use canvas::{Canvas, DrawCommand, TextCommand};
pub use gpu_context::GpuContext;
pub use mesh::{build_mesh, DrawCall, Mesh};
pub use quad_pipeline::QuadPipeline;
pub use renderer::{RenderStats, Renderer};
pub use texture::Texture;
pub use vertex::QuadVertex;
