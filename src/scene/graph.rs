//! Scene: node arena, root, and structural-change fan-out
//!
//! Nodes live in a growing arena indexed by [`NodeId`]. Slots are never
//! reclaimed, so ids stay valid (and unique) for the lifetime of the scene;
//! destroying a node only detaches and marks it.

use std::any::Any;
use std::fmt;
use std::rc::{Rc, Weak};

use glam::{Quat, Vec3};

use super::component::{Component, ComponentError, ComponentHandle, ComponentId};
use super::events::{
    ComponentEvent, ComponentObserver, NodeObserver, SceneObservers, Subscription,
    notify_component, notify_node,
};
use super::node::{ComponentSlot, Node, NodeId};
use super::transform::GlobalTransform;

/// A tree of nodes with a single root
pub struct Scene {
    name: String,
    nodes: Vec<Node>,
    root: NodeId,
    next_component_id: u64,
    observers: SceneObservers,
}

impl Scene {
    /// Create a scene containing only its root node
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let root = NodeId::from_index(0);
        Self {
            name: name.into(),
            nodes: vec![Node::new(root, None)],
            root,
            next_component_id: 1,
            observers: SceneObservers::default(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Node by id, including destroyed ones
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index())
    }

    /// All live nodes in creation order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.nodes.iter().filter(|node| !node.is_destroyed())
    }

    /// Number of live nodes, root included
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes().count()
    }

    /// First live node carrying `tag`
    #[must_use]
    pub fn find_by_tag(&self, tag: &str) -> Option<NodeId> {
        self.nodes()
            .find(|node| node.tag() == Some(tag))
            .map(Node::id)
    }

    /// Create a node under `parent` (the root when `None`).
    ///
    /// The node is linked before observers run. If an observer fails, the
    /// node stays in the tree as the newest child of `parent` and the error
    /// is returned.
    pub fn make_node(&mut self, parent: Option<NodeId>) -> Result<NodeId, SceneError> {
        let parent = parent.unwrap_or(self.root);
        self.live_node(parent)?;

        let id = NodeId::from_index(self.nodes.len());
        self.nodes.push(Node::new(id, Some(parent)));
        self.nodes[parent.index()].children.push(id);
        log::trace!("Scene '{}': created node {id} under {parent}", self.name);

        notify_node(&mut self.observers.node_created, &self.nodes[id.index()])?;
        Ok(id)
    }

    /// Create a node and tag it
    pub fn make_tagged_node(
        &mut self,
        parent: Option<NodeId>,
        tag: impl Into<String>,
    ) -> Result<NodeId, SceneError> {
        let id = self.make_node(parent)?;
        self.nodes[id.index()].set_tag(tag);
        Ok(id)
    }

    /// Attach `component` to `node`.
    ///
    /// `on_add` runs first; if it fails the component is dropped and no
    /// observer hears about it. An observer error, on the other hand, is
    /// returned after the component has been attached; it is then the newest
    /// component of `node`.
    pub fn add_component<T: Component>(
        &mut self,
        node: NodeId,
        component: T,
    ) -> Result<ComponentHandle, SceneError> {
        self.add_boxed_component(node, Box::new(component))
    }

    /// Attach a default-constructed `T`
    pub fn add_default_component<T: Component + Default>(
        &mut self,
        node: NodeId,
    ) -> Result<ComponentHandle, SceneError> {
        self.add_component(node, T::default())
    }

    pub fn add_boxed_component(
        &mut self,
        node: NodeId,
        mut component: Box<dyn Component>,
    ) -> Result<ComponentHandle, SceneError> {
        let target = self.live_node(node)?;
        if let Err(source) = component.on_add(target) {
            log::debug!("Rejected {} on node {node}: {source}", component.name());
            return Err(SceneError::ComponentRejected {
                node,
                component: component.name(),
                source,
            });
        }

        let id = ComponentId::new(self.next_component_id);
        self.next_component_id += 1;
        let name = component.name();
        self.nodes[node.index()]
            .components
            .push(ComponentSlot::new(id, component));

        let handle = ComponentHandle::new(node, id);
        log::trace!("Scene '{}': added {name} as {handle}", self.name);

        let target = &self.nodes[node.index()];
        if let Some(component) = target.component(id) {
            let event = ComponentEvent {
                handle,
                node: target,
                component,
            };
            notify_component(&mut self.observers.component_added, &event)?;
        }
        Ok(handle)
    }

    /// Detach a component: `on_remove`, then observers, then removal from the
    /// node. The detached component is handed back to the caller.
    ///
    /// An observer error is returned after the component has been detached.
    pub fn remove_component(
        &mut self,
        handle: ComponentHandle,
    ) -> Result<Box<dyn Component>, SceneError> {
        self.live_node(handle.node())?;
        let index = handle.node().index();
        let position = self.nodes[index]
            .slot_position(handle.id())
            .ok_or(SceneError::UnknownComponent(handle))?;

        let mut component = self.nodes[index].components[position]
            .inner
            .take()
            .ok_or(SceneError::ComponentBusy(handle))?;
        component.on_remove(&self.nodes[index]);
        self.nodes[index].components[position].inner = Some(component);

        let notified = {
            let node = &self.nodes[index];
            match node.components[position].get() {
                Some(component) => {
                    let event = ComponentEvent {
                        handle,
                        node,
                        component,
                    };
                    notify_component(&mut self.observers.component_removed, &event)
                }
                None => Ok(()),
            }
        };

        let slot = self.nodes[index].components.remove(position);
        log::trace!("Scene '{}': removed {handle}", self.name);
        notified?;

        slot.inner.ok_or(SceneError::ComponentBusy(handle))
    }

    /// Enable or disable a component, firing `on_enable`/`on_disable` on change
    pub fn set_enabled(&mut self, handle: ComponentHandle, enabled: bool) -> Result<(), SceneError> {
        self.live_node(handle.node())?;
        let index = handle.node().index();
        let position = self.nodes[index]
            .slot_position(handle.id())
            .ok_or(SceneError::UnknownComponent(handle))?;

        if self.nodes[index].components[position].enabled == enabled {
            return Ok(());
        }

        let mut component = self.nodes[index].components[position]
            .inner
            .take()
            .ok_or(SceneError::ComponentBusy(handle))?;
        self.nodes[index].components[position].enabled = enabled;
        if enabled {
            component.on_enable(&self.nodes[index]);
        } else {
            component.on_disable(&self.nodes[index]);
        }
        self.nodes[index].components[position].inner = Some(component);
        Ok(())
    }

    /// Typed access through a handle
    #[must_use]
    pub fn get<T: Component>(&self, handle: ComponentHandle) -> Option<&T> {
        self.nodes
            .get(handle.node().index())?
            .component(handle.id())?
            .downcast_ref::<T>()
    }

    pub fn get_mut<T: Component>(&mut self, handle: ComponentHandle) -> Option<&mut T> {
        self.nodes
            .get_mut(handle.node().index())?
            .component_mut(handle.id())?
            .downcast_mut::<T>()
    }

    /// World-space view of a live node's transform
    #[must_use]
    pub fn global_transform(&self, id: NodeId) -> Option<GlobalTransform<'_>> {
        self.global(id).ok()
    }

    /// Set the world position by inverting the parent's world matrix.
    ///
    /// Fails with [`SceneError::DegenerateParent`] if that matrix cannot be
    /// inverted (a zero scale somewhere up the chain).
    pub fn set_world_position(&mut self, id: NodeId, position: Vec3) -> Result<(), SceneError> {
        let global = self.global(id)?;
        if global.parent().is_some_and(|parent| is_degenerate(parent.scale())) {
            return Err(SceneError::DegenerateParent(id));
        }
        let parent_matrix = global.parent_matrix();
        let local = parent_matrix.inverse().transform_point3(position);
        self.nodes[id.index()]
            .transform_mut()
            .set_local_position(local);
        Ok(())
    }

    pub fn set_world_rotation(&mut self, id: NodeId, rotation: Quat) -> Result<(), SceneError> {
        let parent_rotation = self
            .global(id)?
            .parent()
            .map_or(Quat::IDENTITY, |parent| parent.rotation());
        self.nodes[id.index()]
            .transform_mut()
            .set_local_rotation(parent_rotation.inverse() * rotation);
        Ok(())
    }

    pub fn set_world_scale(&mut self, id: NodeId, scale: Vec3) -> Result<(), SceneError> {
        let parent_scale = self
            .global(id)?
            .parent()
            .map_or(Vec3::ONE, |parent| parent.scale());
        if is_degenerate(parent_scale) {
            return Err(SceneError::DegenerateParent(id));
        }
        self.nodes[id.index()]
            .transform_mut()
            .set_local_scale(scale / parent_scale);
        Ok(())
    }

    /// Move `node` under `parent`.
    ///
    /// With `keep_world` the node keeps its world position, rotation and
    /// scale; otherwise its local values are reinterpreted in the new parent.
    pub fn set_parent(
        &mut self,
        node: NodeId,
        parent: NodeId,
        keep_world: bool,
    ) -> Result<(), SceneError> {
        if node == self.root {
            return Err(SceneError::CannotModifyRoot);
        }
        self.live_node(node)?;
        self.live_node(parent)?;

        let mut cursor = Some(parent);
        while let Some(current) = cursor {
            if current == node {
                return Err(SceneError::HierarchyCycle { node, parent });
            }
            cursor = self.nodes[current.index()].parent();
        }

        let world = if keep_world {
            if is_degenerate(self.global(parent)?.scale()) {
                return Err(SceneError::DegenerateParent(node));
            }
            let global = self.global(node)?;
            Some((global.position(), global.rotation(), global.scale()))
        } else {
            None
        };

        if let Some(old) = self.nodes[node.index()].parent() {
            self.nodes[old.index()].children.retain(|child| *child != node);
        }
        self.nodes[parent.index()].children.push(node);
        self.nodes[node.index()].set_parent_link(parent);

        if let Some((position, rotation, scale)) = world {
            self.set_world_scale(node, scale)?;
            self.set_world_rotation(node, rotation)?;
            self.set_world_position(node, position)?;
        }
        log::trace!("Scene '{}': moved node {node} under {parent}", self.name);
        Ok(())
    }

    /// Destroy a node and its subtree.
    ///
    /// Children go first; each node's components are removed newest-first with
    /// the usual notifications. The arena slot stays behind, marked destroyed.
    pub fn destroy_node(&mut self, id: NodeId) -> Result<(), SceneError> {
        if id == self.root {
            return Err(SceneError::CannotModifyRoot);
        }
        self.live_node(id)?;

        for doomed in self.post_order(id) {
            let handles: Vec<ComponentHandle> = self.nodes[doomed.index()]
                .components
                .iter()
                .rev()
                .map(|slot| ComponentHandle::new(doomed, slot.id))
                .collect();
            for handle in handles {
                self.remove_component(handle)?;
            }

            if let Some(parent) = self.nodes[doomed.index()].parent() {
                self.nodes[parent.index()].children.retain(|child| *child != doomed);
            }
            self.nodes[doomed.index()].mark_destroyed();
            log::trace!("Scene '{}': destroyed node {doomed}", self.name);

            notify_node(&mut self.observers.node_destroyed, &self.nodes[doomed.index()])?;
        }
        Ok(())
    }

    /// Subtree of `id`, children before parents, siblings in creation order
    fn post_order(&self, id: NodeId) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            order.push(current);
            stack.extend_from_slice(&self.nodes[current.index()].children);
        }
        order.reverse();
        order
    }

    pub fn register_on_add_component(
        &mut self,
        observer: impl FnMut(&ComponentEvent<'_>) -> Result<(), SceneError> + 'static,
    ) {
        self.observers
            .component_added
            .push(Subscription::new(Box::new(observer) as ComponentObserver));
    }

    pub fn register_on_remove_component(
        &mut self,
        observer: impl FnMut(&ComponentEvent<'_>) -> Result<(), SceneError> + 'static,
    ) {
        self.observers
            .component_removed
            .push(Subscription::new(Box::new(observer) as ComponentObserver));
    }

    pub fn register_on_make_node(
        &mut self,
        observer: impl FnMut(&Node) -> Result<(), SceneError> + 'static,
    ) {
        self.observers
            .node_created
            .push(Subscription::new(Box::new(observer) as NodeObserver));
    }

    pub fn register_on_destroy_node(
        &mut self,
        observer: impl FnMut(&Node) -> Result<(), SceneError> + 'static,
    ) {
        self.observers
            .node_destroyed
            .push(Subscription::new(Box::new(observer) as NodeObserver));
    }

    /// Register add and remove observers that live only as long as `owner`.
    ///
    /// Observers of owners that have since been dropped are pruned first, so
    /// re-subscribing on every scene entry does not grow the lists.
    pub fn subscribe_components<T: Any>(
        &mut self,
        owner: &Rc<T>,
        on_add: impl FnMut(&ComponentEvent<'_>) -> Result<(), SceneError> + 'static,
        on_remove: impl FnMut(&ComponentEvent<'_>) -> Result<(), SceneError> + 'static,
    ) {
        self.observers.prune();
        let weak: Weak<T> = Rc::downgrade(owner);
        let weak: Weak<dyn Any> = weak;
        self.observers.component_added.push(Subscription::owned_by(
            weak.clone(),
            Box::new(on_add) as ComponentObserver,
        ));
        self.observers.component_removed.push(Subscription::owned_by(
            weak,
            Box::new(on_remove) as ComponentObserver,
        ));
    }

    /// Drop every registered observer
    pub fn clear_observers(&mut self) {
        self.observers.clear();
    }

    /// Registered observers, including any whose owner is gone but which
    /// have not been pruned yet
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Take an enabled component out of its slot for the duration of a hook
    pub(crate) fn checkout_component(
        &mut self,
        handle: ComponentHandle,
    ) -> Option<Box<dyn Component>> {
        let node = self.nodes.get_mut(handle.node().index())?;
        let slot = node
            .components
            .iter_mut()
            .find(|slot| slot.id == handle.id())?;
        if !slot.enabled {
            return None;
        }
        slot.inner.take()
    }

    pub(crate) fn restore_component(&mut self, handle: ComponentHandle, component: Box<dyn Component>) {
        let slot = self
            .nodes
            .get_mut(handle.node().index())
            .and_then(|node| node.components.iter_mut().find(|slot| slot.id == handle.id()));
        match slot {
            Some(slot) => slot.inner = Some(component),
            None => log::warn!("Dropping {handle}: detached while checked out"),
        }
    }

    /// Infallible lookup for ids the scene handed out itself
    pub(crate) fn node_ref(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub(crate) fn node_ref_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    pub(crate) fn global_ref(&self, id: NodeId) -> GlobalTransform<'_> {
        GlobalTransform::new(&self.nodes, id)
    }

    fn global(&self, id: NodeId) -> Result<GlobalTransform<'_>, SceneError> {
        self.live_node(id)?;
        Ok(GlobalTransform::new(&self.nodes, id))
    }

    fn live_node(&self, id: NodeId) -> Result<&Node, SceneError> {
        let node = self.nodes.get(id.index()).ok_or(SceneError::UnknownNode(id))?;
        if node.is_destroyed() {
            return Err(SceneError::NodeDestroyed(id));
        }
        Ok(node)
    }
}

/// A chain with a zero scale component has no inverse
fn is_degenerate(world_scale: Vec3) -> bool {
    world_scale.cmpeq(Vec3::ZERO).any()
}

impl fmt::Debug for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scene")
            .field("name", &self.name)
            .field("nodes", &self.nodes.len())
            .field("observers", &self.observers.len())
            .finish()
    }
}

/// Errors that can occur during scene operations
#[derive(Debug, Clone, PartialEq)]
pub enum SceneError {
    /// Id does not name a node of this scene
    UnknownNode(NodeId),
    /// Node has been destroyed
    NodeDestroyed(NodeId),
    /// Handle does not name an attached component
    UnknownComponent(ComponentHandle),
    /// Component is checked out by a running hook
    ComponentBusy(ComponentHandle),
    /// `on_add` refused the component
    ComponentRejected {
        node: NodeId,
        component: &'static str,
        source: ComponentError,
    },
    /// The root cannot be destroyed or re-parented
    CannotModifyRoot,
    /// Re-parenting would make a node its own ancestor
    HierarchyCycle { node: NodeId, parent: NodeId },
    /// A drawable was removed that the renderer registry never tracked
    RegistryDiverged(ComponentHandle),
    /// A world-space setter needs to invert a parent chain with zero scale
    DegenerateParent(NodeId),
}

impl fmt::Display for SceneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownNode(id) => write!(f, "Unknown node {id}"),
            Self::NodeDestroyed(id) => write!(f, "Node {id} has been destroyed"),
            Self::UnknownComponent(handle) => write!(f, "Unknown component {handle}"),
            Self::ComponentBusy(handle) => write!(f, "Component {handle} is running a hook"),
            Self::ComponentRejected {
                node,
                component,
                source,
            } => write!(f, "Cannot add {component} to node {node}: {source}"),
            Self::CannotModifyRoot => write!(f, "The scene root cannot be modified"),
            Self::HierarchyCycle { node, parent } => {
                write!(f, "Node {parent} is a descendant of node {node}")
            }
            Self::RegistryDiverged(handle) => {
                write!(f, "Illegal renderers state: {handle} is not registered")
            }
            Self::DegenerateParent(id) => {
                write!(f, "Parent chain of node {id} has zero scale and cannot be inverted")
            }
        }
    }
}

impl std::error::Error for SceneError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ComponentRejected { source, .. } => Some(source),
            _ => None,
        }
    }
}
