//! Node placement and world-space resolution
//!
//! A [`Transform`] stores only local placement; the parent link lives on the
//! [`Node`]. World-space values are derived on demand through
//! [`GlobalTransform`], which walks the parent chain inside the scene's node
//! arena without recursing, so chains of any depth resolve.

use glam::{EulerRot, Mat4, Quat, Vec3};
use smallvec::SmallVec;

use super::node::{Node, NodeId};

/// Coordinate space for relative transform operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Space {
    /// The node's own frame, as given by its local rotation
    Local,
    /// Unrotated parent frame
    #[default]
    World,
}

/// Local placement of a node
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Position relative to the parent
    position: Vec3,
    /// Rotation relative to the parent, kept unit length
    rotation: Quat,
    /// Scale relative to the parent
    scale: Vec3,
}

impl Transform {
    /// Create a new transform at the origin
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a transform with just a position
    #[must_use]
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Create a transform from position, rotation, and scale
    #[must_use]
    pub fn from_parts(position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            position,
            rotation: rotation.normalize(),
            scale,
        }
    }

    /// Move by `delta`.
    ///
    /// In [`Space::Local`] the delta is rotated by the local rotation first, so
    /// +Z always means the node's current facing.
    pub fn translate(&mut self, delta: Vec3, space: Space) {
        match space {
            Space::World => self.position += delta,
            Space::Local => self.position += self.rotation * delta,
        }
    }

    /// Compose `rotation` with the local rotation.
    ///
    /// World space pre-multiplies, local space post-multiplies. The result is
    /// re-normalized every call.
    pub fn rotate(&mut self, rotation: Quat, space: Space) {
        self.rotation = match space {
            Space::World => rotation * self.rotation,
            Space::Local => self.rotation * rotation,
        };
        self.rotation = self.rotation.normalize();
    }

    /// Rotate by euler angles (in radians)
    pub fn rotate_euler(&mut self, euler: Vec3, space: Space) {
        self.rotate(
            Quat::from_euler(EulerRot::XYZ, euler.x, euler.y, euler.z),
            space,
        );
    }

    /// Rotate by `angle` radians around `axis`
    pub fn rotate_axis_angle(&mut self, axis: Vec3, angle: f32, space: Space) {
        self.rotate(Quat::from_axis_angle(axis.normalize(), angle), space);
    }

    #[must_use]
    #[inline]
    pub fn local_position(&self) -> Vec3 {
        self.position
    }

    #[inline]
    pub fn set_local_position(&mut self, position: Vec3) {
        self.position = position;
    }

    #[must_use]
    #[inline]
    pub fn local_rotation(&self) -> Quat {
        self.rotation
    }

    #[inline]
    pub fn set_local_rotation(&mut self, rotation: Quat) {
        self.rotation = rotation.normalize();
    }

    #[must_use]
    #[inline]
    pub fn local_scale(&self) -> Vec3 {
        self.scale
    }

    #[inline]
    pub fn set_local_scale(&mut self, scale: Vec3) {
        self.scale = scale;
    }

    /// Translation * rotation * scale of the local placement
    #[must_use]
    pub fn local_matrix(&self) -> Mat4 {
        Mat4::from_translation(self.position)
            * Mat4::from_quat(self.rotation)
            * Mat4::from_scale(self.scale)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

/// World-space view of a node's transform.
///
/// Borrowed from the scene arena; every accessor recomputes through the parent
/// chain, so the result is never stale.
#[derive(Clone, Copy)]
pub struct GlobalTransform<'a> {
    arena: &'a [Node],
    node: NodeId,
}

impl<'a> GlobalTransform<'a> {
    /// `node` must index into `arena`
    pub(crate) fn new(arena: &'a [Node], node: NodeId) -> Self {
        Self { arena, node }
    }

    /// Node this view resolves
    #[must_use]
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// The local transform this view resolves
    #[must_use]
    pub fn local(&self) -> &'a Transform {
        self.arena[self.node.index()].transform()
    }

    /// World-space view of the parent
    #[must_use]
    pub fn parent(&self) -> Option<GlobalTransform<'a>> {
        let parent = self.arena[self.node.index()].parent()?;
        (parent.index() < self.arena.len()).then(|| GlobalTransform::new(self.arena, parent))
    }

    /// Local transforms from the topmost ancestor down to this node
    fn chain(&self) -> SmallVec<[&'a Transform; 16]> {
        let mut chain: SmallVec<[&'a Transform; 16]> = SmallVec::new();
        let mut cursor = Some(self.node);
        while let Some(node) = cursor.and_then(|id| self.arena.get(id.index())) {
            chain.push(node.transform());
            cursor = node.parent();
        }
        chain.reverse();
        chain
    }

    /// Parent's world matrix, identity for a root transform
    #[must_use]
    pub fn parent_matrix(&self) -> Mat4 {
        self.parent()
            .map_or(Mat4::IDENTITY, |parent| parent.local_to_world())
    }

    /// Parent world matrix * T * R * S
    #[must_use]
    pub fn local_to_world(&self) -> Mat4 {
        self.chain()
            .iter()
            .fold(Mat4::IDENTITY, |world, local| world * local.local_matrix())
    }

    /// World position
    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.parent_matrix()
            .transform_point3(self.local().local_position())
    }

    /// World rotation (parent rotation applied after the local one)
    #[must_use]
    pub fn rotation(&self) -> Quat {
        self.chain()
            .iter()
            .fold(Quat::IDENTITY, |world, local| world * local.local_rotation())
    }

    /// World scale (component-wise product up the chain)
    #[must_use]
    pub fn scale(&self) -> Vec3 {
        self.chain()
            .iter()
            .fold(Vec3::ONE, |world, local| world * local.local_scale())
    }

    /// Forward direction (+Z)
    #[must_use]
    pub fn forward(&self) -> Vec3 {
        self.rotation() * Vec3::Z
    }

    #[must_use]
    pub fn back(&self) -> Vec3 {
        self.rotation() * Vec3::NEG_Z
    }

    #[must_use]
    pub fn left(&self) -> Vec3 {
        self.rotation() * Vec3::NEG_X
    }

    #[must_use]
    pub fn right(&self) -> Vec3 {
        self.rotation() * Vec3::X
    }

    #[must_use]
    pub fn up(&self) -> Vec3 {
        self.rotation() * Vec3::Y
    }

    #[must_use]
    pub fn down(&self) -> Vec3 {
        self.rotation() * Vec3::NEG_Y
    }

    /// Transform a point from local to world space
    #[must_use]
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.local_to_world().transform_point3(point)
    }
}

impl std::fmt::Debug for GlobalTransform<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlobalTransform")
            .field("position", &self.position())
            .field("rotation", &self.rotation())
            .field("scale", &self.scale())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const EPS: f32 = 1e-4;

    fn approx_vec(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < EPS
    }

    #[test]
    fn test_translate_world_ignores_rotation() {
        let mut transform = Transform::new();
        transform.rotate_axis_angle(Vec3::Y, std::f32::consts::FRAC_PI_2, Space::World);
        transform.translate(Vec3::Z, Space::World);
        assert!(approx_vec(transform.local_position(), Vec3::Z));
    }

    #[test]
    fn test_translate_local_follows_facing() {
        let mut transform = Transform::new();
        // Quarter turn around Y maps +Z onto +X
        transform.rotate_axis_angle(Vec3::Y, std::f32::consts::FRAC_PI_2, Space::World);
        transform.translate(Vec3::Z, Space::Local);
        assert!(approx_vec(transform.local_position(), Vec3::X));
    }

    #[test]
    fn test_rotate_order_by_space() {
        let a = Quat::from_rotation_x(0.3);
        let b = Quat::from_rotation_y(0.7);

        let mut world = Transform::new();
        world.set_local_rotation(a);
        world.rotate(b, Space::World);
        assert!(world.local_rotation().abs_diff_eq(b * a, EPS));

        let mut local = Transform::new();
        local.set_local_rotation(a);
        local.rotate(b, Space::Local);
        assert!(local.local_rotation().abs_diff_eq(a * b, EPS));
    }

    #[test]
    fn test_rotation_stays_normalized() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut transform = Transform::new();

        for i in 0..1000 {
            let axis = Vec3::new(
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
            );
            let axis = if axis.length_squared() < 1e-6 { Vec3::Y } else { axis };
            let delta = Quat::from_axis_angle(axis.normalize(), rng.gen_range(-0.05..0.05));
            let space = if i % 2 == 0 { Space::World } else { Space::Local };
            transform.rotate(delta, space);
        }

        assert!((transform.local_rotation().length() - 1.0).abs() < EPS);
    }

    #[test]
    fn test_local_matrix_is_trs() {
        let transform = Transform::from_parts(
            Vec3::new(1.0, 2.0, 3.0),
            Quat::from_rotation_z(0.5),
            Vec3::new(2.0, 1.0, 0.5),
        );
        let expected = Mat4::from_scale_rotation_translation(
            Vec3::new(2.0, 1.0, 0.5),
            Quat::from_rotation_z(0.5),
            Vec3::new(1.0, 2.0, 3.0),
        );
        assert!(transform.local_matrix().abs_diff_eq(expected, EPS));
    }

    #[test]
    fn test_unparented_matrix_is_translation() {
        let transform = Transform::from_position(Vec3::new(4.0, -2.0, 9.0));
        assert!(
            transform
                .local_matrix()
                .abs_diff_eq(Mat4::from_translation(Vec3::new(4.0, -2.0, 9.0)), EPS)
        );
    }
}
