//! Mesh components
//!
//! [`MeshFilter`] holds the geometry of a node; [`MeshRenderer`] draws it.

use serde::{Deserialize, Serialize};

use super::backend::{Drawable, RenderBackend, RenderError};
use super::material::Material;
use crate::scene::{Component, ComponentError, ComponentId, Node};

/// Opaque geometry issued by the resource provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MeshHandle {
    id: u32,
    index_count: u32,
}

impl MeshHandle {
    #[must_use]
    pub const fn new(id: u32, index_count: u32) -> Self {
        Self { id, index_count }
    }

    #[must_use]
    pub const fn id(self) -> u32 {
        self.id
    }

    /// Number of indices drawn
    #[must_use]
    pub const fn index_count(self) -> u32 {
        self.index_count
    }
}

/// Geometry holder
#[derive(Debug, Clone, Default)]
pub struct MeshFilter {
    mesh: Option<MeshHandle>,
}

impl MeshFilter {
    pub fn new(mesh: MeshHandle) -> Self {
        Self { mesh: Some(mesh) }
    }

    #[must_use]
    pub fn mesh(&self) -> Option<MeshHandle> {
        self.mesh
    }

    pub fn set_mesh(&mut self, mesh: Option<MeshHandle>) {
        self.mesh = mesh;
    }
}

impl Component for MeshFilter {
    fn name(&self) -> &'static str {
        "MeshFilter"
    }
}

/// Draws the mesh of the sibling [`MeshFilter`] with a material.
///
/// The filter must be attached first; adding a renderer to a node without one
/// fails.
#[derive(Debug, Clone, Default)]
pub struct MeshRenderer {
    material: Material,
    filter: Option<ComponentId>,
}

impl MeshRenderer {
    pub fn new(material: Material) -> Self {
        Self {
            material,
            filter: None,
        }
    }

    pub fn set_material(&mut self, material: Material) {
        self.material = material;
    }
}

impl Component for MeshRenderer {
    fn name(&self) -> &'static str {
        "MeshRenderer"
    }

    fn on_add(&mut self, node: &Node) -> Result<(), ComponentError> {
        let handle = node
            .component_handle::<MeshFilter>()
            .ok_or(ComponentError::MissingDependency {
                component: "MeshRenderer",
                requires: "MeshFilter",
            })?;
        self.filter = Some(handle.id());
        Ok(())
    }

    fn on_remove(&mut self, _node: &Node) {
        self.filter = None;
    }

    fn as_drawable(&self) -> Option<&dyn Drawable> {
        Some(self)
    }
}

impl Drawable for MeshRenderer {
    fn material(&self) -> &Material {
        &self.material
    }

    fn draw(&self, node: &Node, backend: &mut dyn RenderBackend) -> Result<(), RenderError> {
        let filter = self
            .filter
            .and_then(|id| node.component(id))
            .and_then(|component| component.downcast_ref::<MeshFilter>())
            .ok_or(RenderError::MeshFilterMissing(node.id()))?;

        match filter.mesh() {
            Some(mesh) => backend.draw_mesh(mesh),
            None => log::debug!("Node {} has an empty MeshFilter", node.id()),
        }
        Ok(())
    }
}
