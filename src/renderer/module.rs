//! Render pass
//!
//! The module keeps a flat registry of every drawable attached to the active
//! scene. The registry follows the tree through the scene's component
//! observers, so drawing never walks the tree.

use std::cell::{Ref, RefCell};
use std::rc::{Rc, Weak};

use glam::Mat4;

use super::backend::{DrawUniform, RenderBackend, RenderError};
use super::camera::{Camera, CameraSlot, ClearFlags};
use crate::scene::{ComponentEvent, ComponentHandle, Scene, SceneError};

/// Drawables of the active scene, in the order they were attached
#[derive(Debug, Default)]
pub struct RendererRegistry {
    renderers: Vec<ComponentHandle>,
}

impl RendererRegistry {
    #[must_use]
    pub fn len(&self) -> usize {
        self.renderers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.renderers.is_empty()
    }

    #[must_use]
    pub fn contains(&self, handle: ComponentHandle) -> bool {
        self.renderers.contains(&handle)
    }

    pub fn iter(&self) -> impl Iterator<Item = ComponentHandle> + '_ {
        self.renderers.iter().copied()
    }

    fn insert(&mut self, handle: ComponentHandle) {
        log::debug!("Registered renderer {handle}");
        self.renderers.push(handle);
    }

    fn remove(&mut self, handle: ComponentHandle) -> Result<(), SceneError> {
        let index = self
            .renderers
            .iter()
            .position(|registered| *registered == handle)
            .ok_or(SceneError::RegistryDiverged(handle))?;
        self.renderers.remove(index);
        log::debug!("Unregistered renderer {handle}");
        Ok(())
    }
}

/// Scratch state of the frame being drawn, reset by every `render`
#[derive(Debug, Clone, Copy)]
pub struct RenderState {
    /// Renderer currently (or last) drawn
    pub renderer: Option<ComponentHandle>,
    pub projection: Mat4,
    pub view_projection: Mat4,
}

impl RenderState {
    fn clear(&mut self) {
        *self = Self::default();
    }
}

impl Default for RenderState {
    fn default() -> Self {
        Self {
            renderer: None,
            projection: Mat4::IDENTITY,
            view_projection: Mat4::IDENTITY,
        }
    }
}

/// Counters for one render pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub draw_calls: usize,
    pub skipped_disabled: usize,
}

/// Draws every enabled registered renderer through the current camera
pub struct RenderModule<B: RenderBackend> {
    backend: B,
    camera: CameraSlot,
    registry: Rc<RefCell<RendererRegistry>>,
    state: RenderState,
}

impl<B: RenderBackend> RenderModule<B> {
    pub fn new(backend: B, camera: CameraSlot) -> Self {
        Self {
            backend,
            camera,
            registry: Rc::default(),
            state: RenderState::default(),
        }
    }

    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    #[must_use]
    pub fn camera_slot(&self) -> &CameraSlot {
        &self.camera
    }

    #[must_use]
    pub fn registry(&self) -> Ref<'_, RendererRegistry> {
        self.registry.borrow()
    }

    #[must_use]
    pub fn state(&self) -> &RenderState {
        &self.state
    }

    /// Start tracking `scene`.
    ///
    /// Drawables already attached are registered in attach order, then the
    /// registry subscribes to the scene's component events. Any previous
    /// registry is dropped, and its observers go with it.
    pub fn on_enter_scene(&mut self, scene: &mut Scene) {
        let mut seeded: Vec<ComponentHandle> = scene
            .nodes()
            .flat_map(|node| {
                node.components()
                    .filter(|(_, component)| component.is_drawable())
                    .map(|(handle, _)| handle)
            })
            .collect();
        seeded.sort_by_key(|handle| handle.id());

        // Replacing the registry drops the previous one, which retires the
        // observers it left on whichever scene it was tracking.
        self.registry = Rc::new(RefCell::new(RendererRegistry { renderers: seeded }));

        let added = Rc::downgrade(&self.registry);
        let removed = Rc::downgrade(&self.registry);
        scene.subscribe_components(
            &self.registry,
            move |event: &ComponentEvent<'_>| {
                if let Some(registry) = Weak::upgrade(&added).filter(|_| event.is_drawable()) {
                    registry.borrow_mut().insert(event.handle);
                }
                Ok(())
            },
            move |event: &ComponentEvent<'_>| {
                if let Some(registry) = Weak::upgrade(&removed).filter(|_| event.is_drawable()) {
                    registry.borrow_mut().remove(event.handle)?;
                }
                Ok(())
            },
        );

        log::info!(
            "Render module entered scene '{}' with {} renderers",
            scene.name(),
            self.registry.borrow().len()
        );
    }

    /// Draw one frame of `scene`
    pub fn render(&mut self, scene: &Scene) -> Result<RenderStats, RenderError> {
        self.state.clear();

        let camera_handle = self.camera.current().ok_or(RenderError::NoCurrentCamera)?;
        let camera = scene
            .get::<Camera>(camera_handle)
            .ok_or(RenderError::CameraNotFound(camera_handle))?;
        let camera_transform = scene
            .global_transform(camera_handle.node())
            .ok_or(RenderError::CameraNotFound(camera_handle))?;

        self.state.projection = camera.projection();
        self.state.view_projection = camera.view_projection(&camera_transform);

        self.backend.begin_frame();
        match camera.clear_flags() {
            ClearFlags::SolidColor => self.backend.clear(Some(camera.clear_color()), true),
            ClearFlags::Depth => self.backend.clear(None, true),
            ClearFlags::Nothing => {}
        }

        let mut stats = RenderStats::default();
        let drawn = self.draw_registered(scene, &mut stats);
        self.backend.end_frame();
        drawn?;

        log::trace!(
            "Rendered {} draw calls ({} disabled)",
            stats.draw_calls,
            stats.skipped_disabled
        );
        Ok(stats)
    }

    fn draw_registered(&mut self, scene: &Scene, stats: &mut RenderStats) -> Result<(), RenderError> {
        let registry = self.registry.borrow();
        for handle in registry.iter() {
            let node = scene
                .node(handle.node())
                .ok_or(RenderError::RendererNotFound(handle))?;
            if !node
                .is_enabled(handle.id())
                .ok_or(RenderError::RendererNotFound(handle))?
            {
                stats.skipped_disabled += 1;
                continue;
            }
            let drawable = node
                .component(handle.id())
                .and_then(|component| component.as_drawable())
                .ok_or(RenderError::RendererNotFound(handle))?;
            let model = scene
                .global_transform(handle.node())
                .ok_or(RenderError::RendererNotFound(handle))?
                .local_to_world();

            self.state.renderer = Some(handle);
            let material = drawable.material();
            self.backend.bind_material(material);
            self.backend
                .set_draw_uniform(&DrawUniform::new(self.state.view_projection, model));
            let drawn = drawable.draw(node, &mut self.backend);
            self.backend.release_material(material);
            drawn?;
            stats.draw_calls += 1;
        }
        Ok(())
    }
}
