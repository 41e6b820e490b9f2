//! Materials and shader handles

use serde::{Deserialize, Serialize};

use super::color::Color;

/// Opaque shader program issued by the resource provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ShaderHandle(u32);

impl ShaderHandle {
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// Material definition, bound around every draw call of a renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Name shown in logs and backend traces
    pub name: String,
    /// Shader program
    pub shader: ShaderHandle,
    /// Base color
    pub color: Color,
}

impl Material {
    /// Create a new white material
    pub fn new(name: impl Into<String>, shader: ShaderHandle) -> Self {
        Self {
            name: name.into(),
            shader,
            color: Color::WHITE,
        }
    }

    /// Same material with another base color
    #[must_use]
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    /// Default shader with a solid color
    pub fn unlit(name: impl Into<String>, color: Color) -> Self {
        Self::new(name, ShaderHandle::default()).with_color(color)
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::unlit("default", Color::new(0.8, 0.8, 0.8, 1.0))
    }
}
