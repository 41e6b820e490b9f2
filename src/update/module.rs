//! Per-frame update traversal

use smallvec::SmallVec;

use super::commands::CommandQueue;
use super::context::UpdateContext;
use crate::core::Time;
use crate::input::Input;
use crate::scene::{ComponentHandle, ComponentId, NodeId, Scene, SceneError};

/// Counters for one update pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateStats {
    /// Active nodes whose components were considered
    pub nodes_visited: usize,
    /// `update` calls made
    pub components_updated: usize,
    /// Deferred commands applied after the traversal
    pub commands_applied: usize,
}

/// Walks the scene tree pre-order, depth-first, calling `update` on every
/// enabled component of every active node.
///
/// An inactive node hides its whole subtree. Each node's component list and
/// child list are snapshotted when the node is visited; structural changes
/// queued during the pass are applied once it ends. The walk keeps its own
/// stack, so tree depth is not limited by the call stack.
#[derive(Debug, Default)]
pub struct UpdateModule {
    commands: CommandQueue,
    passes: u64,
}

impl UpdateModule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of completed passes
    pub fn passes(&self) -> u64 {
        self.passes
    }

    /// Run one update pass over `scene`
    pub fn update(
        &mut self,
        scene: &mut Scene,
        time: &Time,
        input: &mut Input,
    ) -> Result<UpdateStats, SceneError> {
        let mut stats = UpdateStats::default();
        let mut pending: Vec<NodeId> = vec![scene.root()];
        while let Some(id) = pending.pop() {
            if !scene.node_ref(id).is_active() {
                continue;
            }
            self.visit(scene, id, time, input, &mut stats);
            // Reversed so the first child is popped next
            pending.extend(scene.node_ref(id).children.iter().rev().copied());
        }

        stats.commands_applied = self.commands.apply(scene)?;
        self.passes += 1;
        log::trace!(
            "Update pass {}: {} nodes, {} components, {} commands",
            self.passes,
            stats.nodes_visited,
            stats.components_updated,
            stats.commands_applied
        );
        Ok(stats)
    }

    /// Update the components of one active node
    fn visit(
        &mut self,
        scene: &mut Scene,
        id: NodeId,
        time: &Time,
        input: &mut Input,
        stats: &mut UpdateStats,
    ) {
        stats.nodes_visited += 1;

        let components: SmallVec<[ComponentId; 8]> = scene
            .node_ref(id)
            .components
            .iter()
            .map(|slot| slot.id)
            .collect();
        for component_id in components {
            let handle = ComponentHandle::new(id, component_id);
            let Some(mut component) = scene.checkout_component(handle) else {
                continue;
            };
            let mut ctx = UpdateContext::new(scene, handle, time, input, &mut self.commands);
            component.update(&mut ctx);
            scene.restore_component(handle, component);
            stats.components_updated += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{ButtonState, Key, MouseButton};
    use crate::scene::{Component, Space};
    use glam::{Vec2, Vec3};
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    type Trace = Rc<RefCell<Vec<&'static str>>>;

    struct Tracer {
        label: &'static str,
        trace: Trace,
    }

    impl Component for Tracer {
        fn update(&mut self, _ctx: &mut UpdateContext<'_>) {
            self.trace.borrow_mut().push(self.label);
        }
    }

    fn tracer(label: &'static str, trace: &Trace) -> Tracer {
        Tracer {
            label,
            trace: Rc::clone(trace),
        }
    }

    fn frame_time() -> Time {
        let mut time = Time::new();
        time.advance(Duration::from_millis(500));
        time
    }

    #[test]
    fn test_pre_order_depth_first() {
        let mut scene = Scene::new("test");
        let trace = Trace::default();
        let a = scene.make_node(None).unwrap();
        let a1 = scene.make_node(Some(a)).unwrap();
        let b = scene.make_node(None).unwrap();
        let a2 = scene.make_node(Some(a)).unwrap();

        scene.add_component(a, tracer("a", &trace)).unwrap();
        scene.add_component(a, tracer("a'", &trace)).unwrap();
        scene.add_component(a1, tracer("a1", &trace)).unwrap();
        scene.add_component(a2, tracer("a2", &trace)).unwrap();
        scene.add_component(b, tracer("b", &trace)).unwrap();

        let stats = UpdateModule::new().update(&mut scene, &frame_time(), &mut Input::new()).unwrap();

        assert_eq!(*trace.borrow(), vec!["a", "a'", "a1", "a2", "b"]);
        assert_eq!(stats.nodes_visited, 5);
        assert_eq!(stats.components_updated, 5);
    }

    #[test]
    fn test_inactive_node_hides_subtree() {
        let mut scene = Scene::new("test");
        let trace = Trace::default();
        let parent = scene.make_node(None).unwrap();
        let child = scene.make_node(Some(parent)).unwrap();
        let sibling = scene.make_node(None).unwrap();

        scene.add_component(parent, tracer("parent", &trace)).unwrap();
        scene.add_component(child, tracer("child", &trace)).unwrap();
        scene.add_component(sibling, tracer("sibling", &trace)).unwrap();
        scene.node_mut(parent).unwrap().set_active(false);
        assert!(scene.node(child).unwrap().is_active());

        let mut module = UpdateModule::new();
        for _ in 0..3 {
            module.update(&mut scene, &frame_time(), &mut Input::new()).unwrap();
        }

        assert_eq!(*trace.borrow(), vec!["sibling", "sibling", "sibling"]);
        assert_eq!(module.passes(), 3);
    }

    #[test]
    fn test_disabled_components_are_skipped() {
        let mut scene = Scene::new("test");
        let trace = Trace::default();
        let node = scene.make_node(None).unwrap();
        let off = scene.add_component(node, tracer("off", &trace)).unwrap();
        scene.add_component(node, tracer("on", &trace)).unwrap();
        scene.set_enabled(off, false).unwrap();

        UpdateModule::new().update(&mut scene, &frame_time(), &mut Input::new()).unwrap();
        assert_eq!(*trace.borrow(), vec!["on"]);
    }

    struct Mover;

    impl Component for Mover {
        fn update(&mut self, ctx: &mut UpdateContext<'_>) {
            let step = ctx.delta_seconds();
            ctx.transform_mut().translate(Vec3::new(step, 0.0, 0.0), Space::World);
        }
    }

    #[test]
    fn test_update_moves_transform() {
        let mut scene = Scene::new("test");
        let node = scene.make_node(None).unwrap();
        scene.add_component(node, Mover).unwrap();

        let mut module = UpdateModule::new();
        module.update(&mut scene, &frame_time(), &mut Input::new()).unwrap();
        module.update(&mut scene, &frame_time(), &mut Input::new()).unwrap();

        let position = scene.node(node).unwrap().transform().local_position();
        assert!((position.x - 1.0).abs() < 1e-5);
    }

    struct Spawner {
        trace: Trace,
        spawned: bool,
    }

    impl Component for Spawner {
        fn update(&mut self, ctx: &mut UpdateContext<'_>) {
            self.trace.borrow_mut().push("spawner");
            assert!(ctx.sibling::<Spawner>().is_none());
            if !self.spawned {
                self.spawned = true;
                let node = ctx.node_id();
                let child = tracer("late", &self.trace);
                ctx.commands().add_component(node, child);
                ctx.commands()
                    .make_tagged_node(Some(node), "child", vec![Box::new(tracer("child", &self.trace))]);
            }
        }
    }

    #[test]
    fn test_structural_changes_apply_after_pass() {
        let mut scene = Scene::new("test");
        let trace = Trace::default();
        let node = scene.make_node(None).unwrap();
        scene
            .add_component(
                node,
                Spawner {
                    trace: Rc::clone(&trace),
                    spawned: false,
                },
            )
            .unwrap();

        let mut module = UpdateModule::new();
        let first = module.update(&mut scene, &frame_time(), &mut Input::new()).unwrap();
        assert_eq!(*trace.borrow(), vec!["spawner"]);
        assert_eq!(first.commands_applied, 2);
        assert_eq!(scene.node(node).unwrap().component_count(), 2);

        module.update(&mut scene, &frame_time(), &mut Input::new()).unwrap();
        assert_eq!(*trace.borrow(), vec!["spawner", "spawner", "late", "child"]);
    }

    struct SelfRemover;

    impl Component for SelfRemover {
        fn update(&mut self, ctx: &mut UpdateContext<'_>) {
            let handle = ctx.handle();
            ctx.commands().remove_component(handle);
        }
    }

    #[test]
    fn test_component_can_remove_itself() {
        let mut scene = Scene::new("test");
        let node = scene.make_node(None).unwrap();
        scene.add_component(node, SelfRemover).unwrap();

        UpdateModule::new().update(&mut scene, &frame_time(), &mut Input::new()).unwrap();
        assert_eq!(scene.node(node).unwrap().component_count(), 0);
    }

    struct Deactivator {
        target: NodeId,
    }

    impl Component for Deactivator {
        fn update(&mut self, ctx: &mut UpdateContext<'_>) {
            ctx.set_active(self.target, false).unwrap();
        }
    }

    #[test]
    fn test_deactivating_unvisited_node_takes_effect_immediately() {
        let mut scene = Scene::new("test");
        let trace = Trace::default();
        let first = scene.make_node(None).unwrap();
        let second = scene.make_node(None).unwrap();
        scene.add_component(first, Deactivator { target: second }).unwrap();
        scene.add_component(second, tracer("second", &trace)).unwrap();

        UpdateModule::new().update(&mut scene, &frame_time(), &mut Input::new()).unwrap();
        assert!(trace.borrow().is_empty());
    }

    /// Walks along its facing while W is held once the mouse is captured
    struct Walker {
        speed: f32,
    }

    impl Component for Walker {
        fn update(&mut self, ctx: &mut UpdateContext<'_>) {
            if !ctx.input().is_mouse_locked() {
                if ctx.input().is_mouse_button_just_pressed(MouseButton::Left) {
                    ctx.input_mut().set_mouse_locked(true);
                }
                return;
            }

            let yaw = ctx.input().mouse_delta().x * 0.01;
            let step = self.speed * ctx.delta_seconds();
            let forward = ctx.input().is_key_pressed(Key::W);
            let escape = ctx.input().is_key_just_pressed(Key::Escape);

            let transform = ctx.transform_mut();
            if yaw != 0.0 {
                transform.rotate_axis_angle(Vec3::Y, yaw, Space::World);
            }
            if forward {
                transform.translate(Vec3::new(0.0, 0.0, step), Space::Local);
            }
            if escape {
                ctx.input_mut().set_mouse_locked(false);
            }
        }
    }

    #[test]
    fn test_component_polls_input() {
        let mut scene = Scene::new("test");
        let node = scene.make_node(None).unwrap();
        scene.add_component(node, Walker { speed: 4.0 }).unwrap();

        let mut module = UpdateModule::new();
        let mut input = Input::new();
        let time = frame_time();

        input.process_keyboard(Key::W, ButtonState::Pressed);
        module.update(&mut scene, &time, &mut input).unwrap();
        let position = scene.node(node).unwrap().transform().local_position();
        assert_eq!(position, Vec3::ZERO);

        input.process_mouse_button(MouseButton::Left, ButtonState::Pressed);
        module.update(&mut scene, &time, &mut input).unwrap();
        assert!(input.is_mouse_locked());
        input.update();

        module.update(&mut scene, &time, &mut input).unwrap();
        let position = scene.node(node).unwrap().transform().local_position();
        assert!((position - Vec3::new(0.0, 0.0, 2.0)).length() < 1e-5);

        // Quarter turn, then forward is +X
        input.process_mouse_delta(Vec2::new(std::f32::consts::FRAC_PI_2 * 100.0, 0.0));
        module.update(&mut scene, &time, &mut input).unwrap();
        input.update();
        let position = scene.node(node).unwrap().transform().local_position();
        assert!((position - Vec3::new(2.0, 0.0, 2.0)).length() < 1e-4);

        input.process_keyboard(Key::Escape, ButtonState::Pressed);
        module.update(&mut scene, &time, &mut input).unwrap();
        assert!(!input.is_mouse_locked());
    }

    #[test]
    fn test_deep_tree_updates_without_recursion() {
        let mut scene = Scene::new("test");
        let trace = Trace::default();
        let mut parent = None;
        for _ in 0..10_000 {
            let node = scene.make_node(parent).unwrap();
            parent = Some(node);
        }
        let leaf = parent.unwrap();
        scene.add_component(leaf, tracer("leaf", &trace)).unwrap();

        let stats = UpdateModule::new()
            .update(&mut scene, &frame_time(), &mut Input::new())
            .unwrap();
        assert_eq!(stats.nodes_visited, 10_001);
        assert_eq!(*trace.borrow(), vec!["leaf"]);
    }
}
