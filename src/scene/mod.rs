//! Scene graph module
//!
//! Nodes, components, transforms, and the structural-change observers that keep
//! derived views (such as the renderer registry) in sync with the tree.

mod component;
mod events;
mod graph;
mod node;
mod transform;

pub use component::{AsAny, Component, ComponentError, ComponentHandle, ComponentId};
pub use events::{ComponentEvent, ComponentObserver, NodeObserver};
pub use graph::{Scene, SceneError};
pub use node::{Node, NodeId};
pub use transform::{GlobalTransform, Space, Transform};
