//! Scene graph nodes
//!
//! A node owns its transform and components and lists its children by id.
//! Structural changes (adding components, creating children) go through the
//! owning [`Scene`](super::Scene) so observers stay in sync.

use std::fmt;

use smallvec::SmallVec;

use super::component::{Component, ComponentHandle, ComponentId};
use super::transform::Transform;

/// Stable node identifier, unique within a scene and never reused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub(crate) const fn from_index(index: usize) -> Self {
        Self(index as u32)
    }

    /// Position of the node in the scene arena
    #[must_use]
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Storage for one attached component
pub(crate) struct ComponentSlot {
    pub(crate) id: ComponentId,
    pub(crate) enabled: bool,
    /// Empty only while the component's update hook is running
    pub(crate) inner: Option<Box<dyn Component>>,
}

impl ComponentSlot {
    pub(crate) fn new(id: ComponentId, component: Box<dyn Component>) -> Self {
        Self {
            id,
            enabled: true,
            inner: Some(component),
        }
    }

    pub(crate) fn get(&self) -> Option<&dyn Component> {
        self.inner.as_deref()
    }

    pub(crate) fn get_mut(&mut self) -> Option<&mut dyn Component> {
        self.inner.as_deref_mut()
    }
}

/// A placement in the scene graph
pub struct Node {
    id: NodeId,
    parent: Option<NodeId>,
    transform: Transform,
    tag: Option<String>,
    active: bool,
    destroyed: bool,
    pub(crate) components: Vec<ComponentSlot>,
    pub(crate) children: SmallVec<[NodeId; 8]>,
}

impl Node {
    pub(crate) fn new(id: NodeId, parent: Option<NodeId>) -> Self {
        Self {
            id,
            parent,
            transform: Transform::new(),
            tag: None,
            active: true,
            destroyed: false,
            components: Vec::new(),
            children: SmallVec::new(),
        }
    }

    #[must_use]
    #[inline]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Parent node, `None` only for the scene root
    #[must_use]
    #[inline]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub(crate) fn set_parent_link(&mut self, parent: NodeId) {
        self.parent = Some(parent);
    }

    #[must_use]
    #[inline]
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    #[inline]
    pub fn transform_mut(&mut self) -> &mut Transform {
        &mut self.transform
    }

    #[must_use]
    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub fn set_tag(&mut self, tag: impl Into<String>) {
        self.tag = Some(tag.into());
    }

    /// Whether this node (and so its subtree) takes part in the update pass
    #[must_use]
    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Activation only gates updates; drawables on inactive nodes still render
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    #[must_use]
    #[inline]
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub(crate) fn mark_destroyed(&mut self) {
        self.destroyed = true;
        self.active = false;
    }

    /// Child node ids in creation order
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    #[must_use]
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Attached components in insertion order
    pub fn components(&self) -> impl Iterator<Item = (ComponentHandle, &dyn Component)> + '_ {
        self.components.iter().filter_map(move |slot| {
            slot.get()
                .map(|component| (ComponentHandle::new(self.id, slot.id), component))
        })
    }

    /// Component by id
    #[must_use]
    pub fn component(&self, id: ComponentId) -> Option<&dyn Component> {
        self.slot(id).and_then(ComponentSlot::get)
    }

    pub fn component_mut(&mut self, id: ComponentId) -> Option<&mut dyn Component> {
        self.components
            .iter_mut()
            .find(|slot| slot.id == id)
            .and_then(ComponentSlot::get_mut)
    }

    /// Enabled flag of a component, `None` if it is not attached here
    #[must_use]
    pub fn is_enabled(&self, id: ComponentId) -> Option<bool> {
        self.slot(id).map(|slot| slot.enabled)
    }

    /// First component of type `T` in insertion order
    #[must_use]
    pub fn get_component<T: Component>(&self) -> Option<&T> {
        self.components
            .iter()
            .filter_map(ComponentSlot::get)
            .find_map(|component| component.downcast_ref::<T>())
    }

    pub fn get_component_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.components
            .iter_mut()
            .filter_map(ComponentSlot::get_mut)
            .find_map(|component| component.downcast_mut::<T>())
    }

    /// Handle of the first component of type `T`
    #[must_use]
    pub fn component_handle<T: Component>(&self) -> Option<ComponentHandle> {
        self.components
            .iter()
            .find(|slot| slot.get().is_some_and(|component| component.is::<T>()))
            .map(|slot| ComponentHandle::new(self.id, slot.id))
    }

    #[must_use]
    pub fn has_component<T: Component>(&self) -> bool {
        self.get_component::<T>().is_some()
    }

    pub(crate) fn slot(&self, id: ComponentId) -> Option<&ComponentSlot> {
        self.components.iter().find(|slot| slot.id == id)
    }

    pub(crate) fn slot_position(&self, id: ComponentId) -> Option<usize> {
        self.components.iter().position(|slot| slot.id == id)
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let components: Vec<&str> = self
            .components
            .iter()
            .filter_map(|slot| slot.get().map(Component::name))
            .collect();
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("tag", &self.tag)
            .field("active", &self.active)
            .field("transform", &self.transform)
            .field("components", &components)
            .field("children", &self.children)
            .finish()
    }
}
