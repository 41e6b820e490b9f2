//! Rendering module
//!
//! Camera, drawable components, the backend seam, and the render pass that
//! draws the active scene through the current camera.

mod backend;
mod camera;
mod color;
mod material;
mod mesh;
mod module;

pub use backend::{BackendCall, DrawUniform, Drawable, HeadlessBackend, RenderBackend, RenderError};
pub use camera::{Camera, CameraSlot, ClearFlags};
pub use color::Color;
pub use material::{Material, ShaderHandle};
pub use mesh::{MeshFilter, MeshHandle, MeshRenderer};
pub use module::{RenderModule, RenderState, RenderStats, RendererRegistry};
