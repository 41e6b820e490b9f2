//! What a component sees while its `update` hook runs

use glam::Vec3;

use super::commands::CommandQueue;
use crate::core::Time;
use crate::input::Input;
use crate::scene::{
    Component, ComponentHandle, GlobalTransform, Node, NodeId, Scene, SceneError, Transform,
};

/// Access handed to [`Component::update`].
///
/// The running component is checked out of its node for the duration of the
/// call, so sibling lookups never return it. Transforms and activation can be
/// changed directly; structural changes go through [`UpdateContext::commands`].
pub struct UpdateContext<'a> {
    scene: &'a mut Scene,
    handle: ComponentHandle,
    time: &'a Time,
    input: &'a mut Input,
    commands: &'a mut CommandQueue,
}

impl<'a> UpdateContext<'a> {
    pub(crate) fn new(
        scene: &'a mut Scene,
        handle: ComponentHandle,
        time: &'a Time,
        input: &'a mut Input,
        commands: &'a mut CommandQueue,
    ) -> Self {
        Self {
            scene,
            handle,
            time,
            input,
            commands,
        }
    }

    #[must_use]
    pub fn time(&self) -> &Time {
        self.time
    }

    /// Key and mouse state for this frame
    #[must_use]
    pub fn input(&self) -> &Input {
        self.input
    }

    /// Mutable input, for cursor locking
    pub fn input_mut(&mut self) -> &mut Input {
        &mut *self.input
    }

    /// Frame delta in seconds
    #[must_use]
    pub fn delta_seconds(&self) -> f32 {
        self.time.delta_seconds()
    }

    /// Handle of the running component
    #[must_use]
    pub fn handle(&self) -> ComponentHandle {
        self.handle
    }

    #[must_use]
    pub fn node_id(&self) -> NodeId {
        self.handle.node()
    }

    /// The owning node
    #[must_use]
    pub fn node(&self) -> &Node {
        self.scene.node_ref(self.handle.node())
    }

    /// Read-only view of the whole scene
    #[must_use]
    pub fn scene(&self) -> &Scene {
        &*self.scene
    }

    #[must_use]
    pub fn transform(&self) -> &Transform {
        self.node().transform()
    }

    pub fn transform_mut(&mut self) -> &mut Transform {
        self.scene.node_ref_mut(self.handle.node()).transform_mut()
    }

    /// World-space view of the owning node
    #[must_use]
    pub fn global_transform(&self) -> GlobalTransform<'_> {
        self.scene.global_ref(self.handle.node())
    }

    /// First sibling component of type `T`
    #[must_use]
    pub fn sibling<T: Component>(&self) -> Option<&T> {
        self.node().get_component::<T>()
    }

    pub fn sibling_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.scene
            .node_ref_mut(self.handle.node())
            .get_component_mut::<T>()
    }

    /// Transform of another node
    pub fn transform_of_mut(&mut self, node: NodeId) -> Option<&mut Transform> {
        self.scene.node_mut(node).map(Node::transform_mut)
    }

    /// Move any node to a world position
    pub fn set_world_position(&mut self, node: NodeId, position: Vec3) -> Result<(), SceneError> {
        self.scene.set_world_position(node, position)
    }

    /// Toggle a node's activation; takes effect for nodes not yet visited this pass
    pub fn set_active(&mut self, node: NodeId, active: bool) -> Result<(), SceneError> {
        let target = self
            .scene
            .node_mut(node)
            .ok_or(SceneError::UnknownNode(node))?;
        target.set_active(active);
        Ok(())
    }

    /// Queue for structural changes applied after the pass
    pub fn commands(&mut self) -> &mut CommandQueue {
        &mut *self.commands
    }
}
