//! Component trait and handles
//!
//! Components are behavior units attached to exactly one [`Node`]. The scene
//! drives their hooks; a component never calls its own hooks.

use std::any::Any;
use std::fmt;

use super::node::{Node, NodeId};
use crate::renderer::Drawable;
use crate::update::UpdateContext;

/// Scene-unique component identifier, allocated in insertion order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(u64);

impl ComponentId {
    pub(crate) const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw id value.
    #[must_use]
    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Non-owning reference to an attached component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ComponentHandle {
    node: NodeId,
    id: ComponentId,
}

impl ComponentHandle {
    pub(crate) const fn new(node: NodeId, id: ComponentId) -> Self {
        Self { node, id }
    }

    /// Owning node
    #[must_use]
    #[inline]
    pub const fn node(self) -> NodeId {
        self.node
    }

    #[must_use]
    #[inline]
    pub const fn id(self) -> ComponentId {
        self.id
    }
}

impl fmt::Display for ComponentHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/c{}", self.node, self.id.0)
    }
}

/// Upcast helper so trait objects can be downcast to their concrete type
pub trait AsAny: Any + 'static {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Behavior attached to a node.
///
/// Every hook defaults to a no-op. `on_add` runs before the component is
/// stored on the node, so `node` only shows the siblings added earlier; an
/// error there aborts the add.
pub trait Component: AsAny + 'static {
    /// Human readable name used in logs and errors
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    fn on_add(&mut self, _node: &Node) -> Result<(), ComponentError> {
        Ok(())
    }

    fn on_remove(&mut self, _node: &Node) {}

    fn on_enable(&mut self, _node: &Node) {}

    fn on_disable(&mut self, _node: &Node) {}

    /// Per-frame logic, called only while the component is enabled and its
    /// node (and every ancestor) is active
    fn update(&mut self, _ctx: &mut UpdateContext<'_>) {}

    /// Drawable capability, if this component produces draw calls
    fn as_drawable(&self) -> Option<&dyn Drawable> {
        None
    }
}

impl dyn Component {
    /// Check the concrete type
    #[must_use]
    pub fn is<T: Component>(&self) -> bool {
        self.as_any().is::<T>()
    }

    #[must_use]
    pub fn downcast_ref<T: Component>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    #[must_use]
    pub fn downcast_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }

    /// Whether this component is a drawable
    #[must_use]
    pub fn is_drawable(&self) -> bool {
        self.as_drawable().is_some()
    }
}

/// Errors raised by component hooks
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComponentError {
    /// A required sibling component is not attached to the node
    MissingDependency {
        /// Component being added
        component: &'static str,
        /// Sibling it requires
        requires: &'static str,
    },
    /// Any other hook failure
    Custom(String),
}

impl fmt::Display for ComponentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingDependency {
                component,
                requires,
            } => write!(f, "{component} requires a {requires} on the same node"),
            Self::Custom(message) => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for ComponentError {}
