//! Rendering backend seam
//!
//! [`RenderBackend`] is everything the render pass needs from a graphics API.
//! [`HeadlessBackend`] implements it without a GPU by recording every call of
//! the current frame.

use std::fmt;

use bytemuck::{Pod, Zeroable};
use glam::Mat4;

use super::color::Color;
use super::material::Material;
use super::mesh::MeshHandle;
use crate::scene::{ComponentHandle, Node, NodeId};

/// Per-draw transform data
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct DrawUniform {
    mvp: [[f32; 4]; 4],
    model: [[f32; 4]; 4],
    normal_matrix: [[f32; 4]; 4],
}

impl DrawUniform {
    pub fn new(view_projection: Mat4, model: Mat4) -> Self {
        let normal_matrix = model.inverse().transpose();
        Self {
            mvp: (view_projection * model).to_cols_array_2d(),
            model: model.to_cols_array_2d(),
            normal_matrix: normal_matrix.to_cols_array_2d(),
        }
    }

    #[must_use]
    pub fn mvp(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.mvp)
    }

    #[must_use]
    pub fn model(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.model)
    }

    #[must_use]
    pub fn normal_matrix(&self) -> Mat4 {
        Mat4::from_cols_array_2d(&self.normal_matrix)
    }
}

impl Default for DrawUniform {
    fn default() -> Self {
        Self::new(Mat4::IDENTITY, Mat4::IDENTITY)
    }
}

/// Graphics API used by the render pass
pub trait RenderBackend {
    fn begin_frame(&mut self);

    /// Clear the color buffer to `color` if given, and the depth buffer if `depth`
    fn clear(&mut self, color: Option<Color>, depth: bool);

    fn bind_material(&mut self, material: &Material);

    fn set_draw_uniform(&mut self, uniform: &DrawUniform);

    fn draw_mesh(&mut self, mesh: MeshHandle);

    fn release_material(&mut self, material: &Material);

    fn end_frame(&mut self);
}

/// A component that issues draw calls
pub trait Drawable {
    /// Material bound around [`Drawable::draw`]
    fn material(&self) -> &Material;

    /// Issue the draw. The material is bound and the draw uniform set.
    fn draw(&self, node: &Node, backend: &mut dyn RenderBackend) -> Result<(), RenderError>;
}

/// One recorded backend call
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    Clear { color: Option<Color>, depth: bool },
    BindMaterial(String),
    SetDrawUniform(DrawUniform),
    DrawMesh(MeshHandle),
    ReleaseMaterial(String),
}

/// Backend that records calls instead of drawing
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    calls: Vec<BackendCall>,
    frames: u64,
    in_frame: bool,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls recorded since the last `begin_frame`
    #[must_use]
    pub fn calls(&self) -> &[BackendCall] {
        &self.calls
    }

    /// Completed frames
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    #[must_use]
    pub fn draw_calls(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, BackendCall::DrawMesh(_)))
            .count()
    }

    /// Uniforms in the order they were set
    pub fn uniforms(&self) -> impl Iterator<Item = &DrawUniform> + '_ {
        self.calls.iter().filter_map(|call| match call {
            BackendCall::SetDrawUniform(uniform) => Some(uniform),
            _ => None,
        })
    }

    fn record(&mut self, call: BackendCall) {
        if !self.in_frame {
            log::warn!("Backend call outside of a frame: {call:?}");
        }
        self.calls.push(call);
    }
}

impl RenderBackend for HeadlessBackend {
    fn begin_frame(&mut self) {
        self.calls.clear();
        self.in_frame = true;
    }

    fn clear(&mut self, color: Option<Color>, depth: bool) {
        self.record(BackendCall::Clear { color, depth });
    }

    fn bind_material(&mut self, material: &Material) {
        self.record(BackendCall::BindMaterial(material.name.clone()));
    }

    fn set_draw_uniform(&mut self, uniform: &DrawUniform) {
        self.record(BackendCall::SetDrawUniform(*uniform));
    }

    fn draw_mesh(&mut self, mesh: MeshHandle) {
        self.record(BackendCall::DrawMesh(mesh));
    }

    fn release_material(&mut self, material: &Material) {
        self.record(BackendCall::ReleaseMaterial(material.name.clone()));
    }

    fn end_frame(&mut self) {
        self.in_frame = false;
        self.frames += 1;
    }
}

/// Fatal render-pass failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// No camera has been made current
    NoCurrentCamera,
    /// The current camera handle does not name an attached camera
    CameraNotFound(ComponentHandle),
    /// A registered renderer is no longer attached to the scene
    RendererNotFound(ComponentHandle),
    /// A mesh renderer lost its sibling mesh filter
    MeshFilterMissing(NodeId),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCurrentCamera => write!(f, "No current camera"),
            Self::CameraNotFound(handle) => write!(f, "Current camera {handle} is not attached"),
            Self::RendererNotFound(handle) => {
                write!(f, "Illegal renderers state: {handle} is not attached")
            }
            Self::MeshFilterMissing(node) => write!(f, "No 'MeshFilter' on node {node}"),
        }
    }
}

impl std::error::Error for RenderError {}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_draw_uniform_is_pod() {
        let uniform = DrawUniform::default();
        let bytes: &[u8] = bytemuck::bytes_of(&uniform);
        assert_eq!(bytes.len(), 3 * 16 * 4);
    }

    #[test]
    fn test_draw_uniform_matrices() {
        let model = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        let view_projection = Mat4::from_scale(Vec3::splat(2.0));
        let uniform = DrawUniform::new(view_projection, model);

        assert_eq!(uniform.model(), model);
        assert_eq!(uniform.mvp(), view_projection * model);
        let point = uniform.mvp().transform_point3(Vec3::ZERO);
        assert!((point - Vec3::new(2.0, 4.0, 6.0)).length() < 1e-5);
    }

    #[test]
    fn test_headless_backend_records_current_frame() {
        let mut backend = HeadlessBackend::new();
        let mesh = MeshHandle::new(1, 3);

        backend.begin_frame();
        backend.draw_mesh(mesh);
        backend.end_frame();
        backend.begin_frame();
        backend.clear(None, true);
        backend.end_frame();

        assert_eq!(backend.frames(), 2);
        assert_eq!(backend.draw_calls(), 0);
        assert_eq!(
            backend.calls(),
            &[BackendCall::Clear {
                color: None,
                depth: true
            }]
        );
    }
}
