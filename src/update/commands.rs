//! Deferred structural changes
//!
//! Components cannot restructure the graph while the update pass is walking
//! it. They queue [`SceneCommand`]s instead, and the queue is applied in push
//! order once the traversal has finished.
//!
//! # Example
//!
//! ```ignore
//! fn update(&mut self, ctx: &mut UpdateContext<'_>) {
//!     if self.fired {
//!         let node = ctx.node_id();
//!         ctx.commands().add_component(node, Explosion::default());
//!         ctx.commands().remove_component(ctx.handle());
//!     }
//! }
//! ```

use std::collections::VecDeque;
use std::fmt;

use crate::scene::{Component, ComponentHandle, NodeId, Scene, SceneError};

/// A structural change waiting for the end of the update pass
#[non_exhaustive]
pub enum SceneCommand {
    /// Create a node, optionally tagged, and attach components to it in order
    MakeNode {
        parent: Option<NodeId>,
        tag: Option<String>,
        components: Vec<Box<dyn Component>>,
    },
    AddComponent {
        node: NodeId,
        component: Box<dyn Component>,
    },
    RemoveComponent(ComponentHandle),
    SetEnabled {
        component: ComponentHandle,
        enabled: bool,
    },
    DestroyNode(NodeId),
}

impl SceneCommand {
    /// Perform the change on `scene`
    pub fn apply(self, scene: &mut Scene) -> Result<(), SceneError> {
        match self {
            Self::MakeNode {
                parent,
                tag,
                components,
            } => {
                let id = match tag {
                    Some(tag) => scene.make_tagged_node(parent, tag)?,
                    None => scene.make_node(parent)?,
                };
                for component in components {
                    scene.add_boxed_component(id, component)?;
                }
            }
            Self::AddComponent { node, component } => {
                scene.add_boxed_component(node, component)?;
            }
            Self::RemoveComponent(handle) => {
                scene.remove_component(handle)?;
            }
            Self::SetEnabled { component, enabled } => scene.set_enabled(component, enabled)?,
            Self::DestroyNode(node) => scene.destroy_node(node)?,
        }
        Ok(())
    }
}

impl fmt::Debug for SceneCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MakeNode {
                parent,
                tag,
                components,
            } => {
                let names: Vec<&str> = components.iter().map(|c| c.name()).collect();
                f.debug_struct("MakeNode")
                    .field("parent", parent)
                    .field("tag", tag)
                    .field("components", &names)
                    .finish()
            }
            Self::AddComponent { node, component } => f
                .debug_struct("AddComponent")
                .field("node", node)
                .field("component", &component.name())
                .finish(),
            Self::RemoveComponent(handle) => f.debug_tuple("RemoveComponent").field(handle).finish(),
            Self::SetEnabled { component, enabled } => f
                .debug_struct("SetEnabled")
                .field("component", component)
                .field("enabled", enabled)
                .finish(),
            Self::DestroyNode(node) => f.debug_tuple("DestroyNode").field(node).finish(),
        }
    }
}

/// FIFO of pending scene commands
#[derive(Debug)]
pub struct CommandQueue {
    pending: VecDeque<SceneCommand>,
}

impl CommandQueue {
    /// Default initial capacity for the queue.
    const DEFAULT_CAPACITY: usize = 16;

    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            pending: VecDeque::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn push(&mut self, command: SceneCommand) {
        self.pending.push_back(command);
    }

    /// Queue a new node with the given components
    pub fn make_node(&mut self, parent: Option<NodeId>, components: Vec<Box<dyn Component>>) {
        self.push(SceneCommand::MakeNode {
            parent,
            tag: None,
            components,
        });
    }

    pub fn make_tagged_node(
        &mut self,
        parent: Option<NodeId>,
        tag: impl Into<String>,
        components: Vec<Box<dyn Component>>,
    ) {
        self.push(SceneCommand::MakeNode {
            parent,
            tag: Some(tag.into()),
            components,
        });
    }

    pub fn add_component<T: Component>(&mut self, node: NodeId, component: T) {
        self.push(SceneCommand::AddComponent {
            node,
            component: Box::new(component),
        });
    }

    pub fn remove_component(&mut self, handle: ComponentHandle) {
        self.push(SceneCommand::RemoveComponent(handle));
    }

    pub fn set_enabled(&mut self, handle: ComponentHandle, enabled: bool) {
        self.push(SceneCommand::SetEnabled {
            component: handle,
            enabled,
        });
    }

    pub fn destroy_node(&mut self, node: NodeId) {
        self.push(SceneCommand::DestroyNode(node));
    }

    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Apply every queued command in order.
    ///
    /// Stops at the first failure; the commands behind it are discarded.
    /// Returns the number of commands applied.
    pub fn apply(&mut self, scene: &mut Scene) -> Result<usize, SceneError> {
        let mut applied = 0;
        while let Some(command) = self.pending.pop_front() {
            if let Err(error) = command.apply(scene) {
                log::warn!(
                    "Scene command failed: {error}; discarding {} queued commands",
                    self.pending.len()
                );
                self.pending.clear();
                return Err(error);
            }
            applied += 1;
        }
        Ok(applied)
    }
}

impl Default for CommandQueue {
    fn default() -> Self {
        Self::new()
    }
}
