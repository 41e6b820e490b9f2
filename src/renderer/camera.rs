//! Camera component and the current-camera slot

use std::cell::Cell;
use std::rc::Rc;

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use super::color::Color;
use crate::scene::{Component, ComponentHandle, GlobalTransform};

/// What the camera clears before drawing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ClearFlags {
    /// Color buffer to the clear color, plus depth
    #[default]
    SolidColor,
    /// Depth buffer only
    Depth,
    /// Nothing
    Nothing,
}

/// Camera for 3D rendering.
///
/// The camera looks along its node's forward axis (+Z). View and projection
/// are left-handed, with depth in `0.0..=1.0`.
#[derive(Debug, Clone)]
pub struct Camera {
    projection: Mat4,
    clear_flags: ClearFlags,
    clear_color: Color,
}

impl Camera {
    /// Camera with an explicit projection matrix
    pub fn new(projection: Mat4) -> Self {
        Self {
            projection,
            clear_flags: ClearFlags::default(),
            clear_color: Color::BLACK,
        }
    }

    /// Perspective camera; `fov_y` in radians
    pub fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self::new(Mat4::perspective_lh(fov_y, aspect, near, far))
    }

    pub fn orthographic(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Self {
        Self::new(Mat4::orthographic_lh(left, right, bottom, top, near, far))
    }

    #[must_use]
    pub fn with_clear_flags(mut self, flags: ClearFlags) -> Self {
        self.clear_flags = flags;
        self
    }

    #[must_use]
    pub fn with_clear_color(mut self, color: Color) -> Self {
        self.clear_color = color;
        self
    }

    #[must_use]
    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    pub fn set_projection(&mut self, projection: Mat4) {
        self.projection = projection;
    }

    #[must_use]
    pub fn clear_flags(&self) -> ClearFlags {
        self.clear_flags
    }

    pub fn set_clear_flags(&mut self, flags: ClearFlags) {
        self.clear_flags = flags;
    }

    #[must_use]
    pub fn clear_color(&self) -> Color {
        self.clear_color
    }

    pub fn set_clear_color(&mut self, color: Color) {
        self.clear_color = color;
    }

    /// View matrix of a camera placed at `transform`: inverse rotation after
    /// inverse translation
    #[must_use]
    pub fn view(transform: &GlobalTransform<'_>) -> Mat4 {
        Mat4::from_quat(transform.rotation().conjugate())
            * Mat4::from_translation(-transform.position())
    }

    #[must_use]
    pub fn view_projection(&self, transform: &GlobalTransform<'_>) -> Mat4 {
        self.projection * Self::view(transform)
    }

    /// Project a world point to viewport space: x and y in `0.0..=1.0` from the
    /// bottom-left corner, z is the clip-space depth
    #[must_use]
    pub fn world_to_viewport_point(&self, transform: &GlobalTransform<'_>, point: Vec3) -> Vec3 {
        let ndc = self.view_projection(transform).project_point3(point);
        Vec3::new((ndc.x + 1.0) / 2.0, (ndc.y + 1.0) / 2.0, ndc.z)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::perspective(std::f32::consts::FRAC_PI_4, 16.0 / 9.0, 0.1, 1000.0)
    }
}

impl Component for Camera {
    fn name(&self) -> &'static str {
        "Camera"
    }
}

/// The single current-camera slot.
///
/// Clones share the slot; the last `set_current` wins.
#[derive(Debug, Clone, Default)]
pub struct CameraSlot(Rc<Cell<Option<ComponentHandle>>>);

impl CameraSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_current(&self, camera: ComponentHandle) {
        self.0.set(Some(camera));
    }

    #[must_use]
    pub fn current(&self) -> Option<ComponentHandle> {
        self.0.get()
    }

    /// Swap in a new value, returning the previous one
    pub fn replace(&self, camera: Option<ComponentHandle>) -> Option<ComponentHandle> {
        self.0.replace(camera)
    }

    pub fn clear(&self) {
        self.0.set(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Scene;
    use glam::Quat;

    const EPS: f32 = 1e-4;

    #[test]
    fn test_view_moves_world_opposite_to_camera() {
        let mut scene = Scene::new("test");
        let node = scene.make_node(None).unwrap();
        scene
            .node_mut(node)
            .unwrap()
            .transform_mut()
            .set_local_position(Vec3::new(0.0, 0.0, -10.0));

        let global = scene.global_transform(node).unwrap();
        let view = Camera::view(&global);
        let origin = view.transform_point3(Vec3::ZERO);
        assert!((origin - Vec3::new(0.0, 0.0, 10.0)).length() < EPS);
    }

    #[test]
    fn test_view_undoes_rotation() {
        let mut scene = Scene::new("test");
        let node = scene.make_node(None).unwrap();
        scene
            .node_mut(node)
            .unwrap()
            .transform_mut()
            .set_local_rotation(Quat::from_rotation_y(std::f32::consts::FRAC_PI_2));

        let global = scene.global_transform(node).unwrap();
        let forward = global.forward();
        let in_view = Camera::view(&global).transform_vector3(forward);
        assert!((in_view - Vec3::Z).length() < EPS);
    }

    #[test]
    fn test_point_ahead_projects_to_viewport_center() {
        let mut scene = Scene::new("test");
        let node = scene.make_node(None).unwrap();
        let camera = Camera::default();

        let global = scene.global_transform(node).unwrap();
        let point = camera.world_to_viewport_point(&global, Vec3::new(0.0, 0.0, 10.0));
        assert!((point.x - 0.5).abs() < EPS);
        assert!((point.y - 0.5).abs() < EPS);
        assert!(point.z > 0.0 && point.z < 1.0);
    }

    #[test]
    fn test_orthographic_maps_bounds_to_viewport_edges() {
        let scene = Scene::new("test");
        let camera = Camera::orthographic(-5.0, 5.0, -5.0, 5.0, 0.1, 100.0);
        let global = scene.global_transform(scene.root()).unwrap();

        let corner = camera.world_to_viewport_point(&global, Vec3::new(5.0, -5.0, 1.0));
        assert!((corner.x - 1.0).abs() < EPS);
        assert!(corner.y.abs() < EPS);
    }

    #[test]
    fn test_camera_slot_is_shared() {
        let mut scene = Scene::new("test");
        let node = scene.make_node(None).unwrap();
        let first = scene.add_default_component::<Camera>(node).unwrap();
        let second = scene.add_default_component::<Camera>(node).unwrap();

        let slot = CameraSlot::new();
        let shared = slot.clone();
        assert_eq!(shared.current(), None);

        slot.set_current(first);
        assert_eq!(shared.current(), Some(first));
        assert_eq!(shared.replace(Some(second)), Some(first));
        assert_eq!(slot.current(), Some(second));

        slot.clear();
        assert_eq!(shared.current(), None);
    }
}
