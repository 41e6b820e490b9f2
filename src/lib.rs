//! A small scene-graph runtime
//!
//! This crate provides:
//! - A node tree with transform composition and attachable components
//! - Structural-change observers that keep derived views in sync with the tree
//! - A depth-first update pass with deferred structural changes and polled
//!   key/mouse input
//! - A render pass drawing registered renderers through the current camera
//!   behind a pluggable backend

pub mod core;
pub mod input;
pub mod renderer;
pub mod scene;
pub mod update;

// Re-exports for convenience
pub use glam;

/// Prelude module for common imports
pub mod prelude {
    pub use crate::core::{Engine, EngineConfig, EngineError, FrameReport, FrameStats, Time};
    pub use crate::input::{ButtonState, Input, Key, MouseButton};
    pub use crate::renderer::{
        Camera, CameraSlot, ClearFlags, Color, Drawable, HeadlessBackend, Material, MeshFilter,
        MeshHandle, MeshRenderer, RenderBackend, RenderModule,
    };
    pub use crate::scene::{
        Component, ComponentError, ComponentHandle, Node, NodeId, Scene, SceneError, Space,
        Transform,
    };
    pub use crate::update::{UpdateContext, UpdateModule};
    pub use glam::{Mat4, Quat, Vec3, Vec4};
}
