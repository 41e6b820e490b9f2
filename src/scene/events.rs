//! Structural-change notifications
//!
//! Observers are registered on a [`Scene`](super::Scene) and called
//! synchronously after the mutation they describe has completed (component
//! removal is the exception: observers see the component still attached, just
//! before it is detached). An observer registered with an owner is dropped
//! once that owner is gone.

use std::any::Any;
use std::rc::Weak;

use super::component::{Component, ComponentHandle};
use super::graph::SceneError;
use super::node::Node;

/// A component was attached to or is being detached from a node
pub struct ComponentEvent<'a> {
    /// Handle of the component
    pub handle: ComponentHandle,
    /// Owning node, in its post-add / pre-detach state
    pub node: &'a Node,
    /// The component itself
    pub component: &'a dyn Component,
}

impl ComponentEvent<'_> {
    /// Whether the component is a drawable
    #[must_use]
    pub fn is_drawable(&self) -> bool {
        self.component.is_drawable()
    }
}

/// Observer for component add/remove events
pub type ComponentObserver = Box<dyn FnMut(&ComponentEvent<'_>) -> Result<(), SceneError>>;

/// Observer for node create/destroy events
pub type NodeObserver = Box<dyn FnMut(&Node) -> Result<(), SceneError>>;

/// A registered observer, optionally scoped to the lifetime of an owner
pub(crate) struct Subscription<F> {
    owner: Option<Weak<dyn Any>>,
    callback: F,
}

impl<F> Subscription<F> {
    pub(crate) fn new(callback: F) -> Self {
        Self {
            owner: None,
            callback,
        }
    }

    pub(crate) fn owned_by(owner: Weak<dyn Any>, callback: F) -> Self {
        Self {
            owner: Some(owner),
            callback,
        }
    }

    fn is_live(&self) -> bool {
        self.owner
            .as_ref()
            .is_none_or(|owner| owner.strong_count() > 0)
    }
}

/// All observer lists of one scene
#[derive(Default)]
pub(crate) struct SceneObservers {
    pub(crate) component_added: Vec<Subscription<ComponentObserver>>,
    pub(crate) component_removed: Vec<Subscription<ComponentObserver>>,
    pub(crate) node_created: Vec<Subscription<NodeObserver>>,
    pub(crate) node_destroyed: Vec<Subscription<NodeObserver>>,
}

impl SceneObservers {
    pub(crate) fn clear(&mut self) {
        self.component_added.clear();
        self.component_removed.clear();
        self.node_created.clear();
        self.node_destroyed.clear();
    }

    /// Drop subscriptions whose owner is gone
    pub(crate) fn prune(&mut self) {
        self.component_added.retain(Subscription::is_live);
        self.component_removed.retain(Subscription::is_live);
        self.node_created.retain(Subscription::is_live);
        self.node_destroyed.retain(Subscription::is_live);
    }

    pub(crate) fn len(&self) -> usize {
        self.component_added.len()
            + self.component_removed.len()
            + self.node_created.len()
            + self.node_destroyed.len()
    }
}

/// Run every live observer in registration order, stopping at the first error
pub(crate) fn notify_component(
    observers: &mut Vec<Subscription<ComponentObserver>>,
    event: &ComponentEvent<'_>,
) -> Result<(), SceneError> {
    observers.retain(Subscription::is_live);
    for observer in observers.iter_mut() {
        (observer.callback)(event)?;
    }
    Ok(())
}

pub(crate) fn notify_node(
    observers: &mut Vec<Subscription<NodeObserver>>,
    node: &Node,
) -> Result<(), SceneError> {
    observers.retain(Subscription::is_live);
    for observer in observers.iter_mut() {
        (observer.callback)(node)?;
    }
    Ok(())
}
