use std::fmt;

use glam::{EulerRot, Mat4, Quat, Vec3};

/// Identifies an entity inside a [`crate::model::Scene`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Opaque handle returned by the renderer for a created entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderHandle(pub u32);

/// Shape handed to the renderer when an entity is created.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Geometry {
    /// Axis-aligned box centred on the entity origin.
    Cuboid { width: f32, height: f32, depth: f32 },
    /// Horizontal plane in the XZ plane, facing +Y.
    Plane { width: f32, depth: f32 },
}

impl Geometry {
    pub fn cube(size: f32) -> Self {
        Geometry::Cuboid { width: size, height: size, depth: size }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub color: [f32; 4],
}

impl Material {
    /// Opaque material from a `0xRRGGBB` colour.
    pub fn from_hex(rgb: u32) -> Self {
        let channel = |shift: u32| ((rgb >> shift) & 0xff) as f32 / 255.0;
        Self { color: [channel(16), channel(8), channel(0), 1.0] }
    }
}

/// Order in which the Euler angles of a [`Transform`] compose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RotationOrder {
    /// `Rx * Ry * Rz`.
    #[default]
    Xyz,
    /// `Ry * Rx * Rz`, so yaw stays about the world up axis.
    Yxz,
}

impl From<RotationOrder> for EulerRot {
    fn from(order: RotationOrder) -> Self {
        match order {
            RotationOrder::Xyz => EulerRot::XYZ,
            RotationOrder::Yxz => EulerRot::YXZ,
        }
    }
}

/// Position plus Euler rotation in radians.
///
/// Yaw is `rotation.y`, the only axis motion commands touch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Vec3,
    pub order: RotationOrder,
}

impl Default for Transform {
    fn default() -> Self {
        Self { position: Vec3::ZERO, rotation: Vec3::ZERO, order: RotationOrder::default() }
    }
}

impl Transform {
    pub fn at(position: Vec3) -> Self {
        Self { position, ..Default::default() }
    }

    pub fn with_order(self, order: RotationOrder) -> Self {
        Self { order, ..self }
    }

    pub fn yaw(&self) -> f32 {
        self.rotation.y
    }

    /// Unit vector the entity is facing on the ground plane.
    pub fn facing(&self) -> Vec3 {
        let yaw = self.yaw();
        Vec3::new(yaw.cos(), 0.0, -yaw.sin())
    }

    pub fn rotation_quat(&self) -> Quat {
        let Vec3 { x, y, z } = self.rotation;
        match self.order {
            RotationOrder::Xyz => Quat::from_euler(self.order.into(), x, y, z),
            RotationOrder::Yxz => Quat::from_euler(self.order.into(), y, x, z),
        }
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation_quat(), self.position)
    }

    pub fn move_forward(&mut self, speed: f32, step: f32) {
        check_speed(speed);
        self.position += self.facing() * step * speed;
    }

    pub fn move_backward(&mut self, speed: f32, step: f32) {
        check_speed(speed);
        self.position -= self.facing() * step * speed;
    }

    pub fn rotate_left(&mut self, speed: f32, turn: f32) {
        check_speed(speed);
        self.rotation.y += turn * speed;
    }

    pub fn rotate_right(&mut self, speed: f32, turn: f32) {
        check_speed(speed);
        self.rotation.y -= turn * speed;
    }
}

fn check_speed(speed: f32) {
    assert!(
        speed.is_finite() && speed >= 0.0,
        "speed multiplier must be finite and non-negative, got {speed}"
    );
}

/// Per-call increments of an input-driven entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionProfile {
    /// World units per unit of speed.
    pub step: f32,
    /// Radians per unit of speed.
    pub turn: f32,
}

impl Default for MotionProfile {
    fn default() -> Self {
        Self { step: 1.0, turn: 15f32.to_radians() }
    }
}

/// What an entity does every frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Behavior {
    Static,
    /// Adds `step` radians to every rotation axis each frame.
    Spin { step: f32 },
    /// Moves only when told to by the frame loop.
    Controlled(MotionProfile),
}

impl Behavior {
    pub fn spin() -> Self {
        Behavior::Spin { step: 0.01 }
    }

    pub fn controlled() -> Self {
        Behavior::Controlled(MotionProfile::default())
    }
}

#[derive(Debug, Clone)]
pub struct Entity {
    pub handle: RenderHandle,
    pub geometry: Geometry,
    pub material: Material,
    pub transform: Transform,
    pub behavior: Behavior,
}

impl Entity {
    pub fn new(
        handle: RenderHandle,
        geometry: Geometry,
        material: Material,
        transform: Transform,
        behavior: Behavior,
    ) -> Self {
        Self { handle, geometry, material, transform, behavior }
    }

    pub fn is_controllable(&self) -> bool {
        matches!(self.behavior, Behavior::Controlled(_))
    }

    fn profile(&self) -> MotionProfile {
        match self.behavior {
            Behavior::Controlled(profile) => profile,
            other => panic!("motion command issued to an entity with {other:?} behavior"),
        }
    }

    pub fn move_forward(&mut self, speed: f32) {
        let step = self.profile().step;
        self.transform.move_forward(speed, step);
    }

    pub fn move_backward(&mut self, speed: f32) {
        let step = self.profile().step;
        self.transform.move_backward(speed, step);
    }

    pub fn rotate_left(&mut self, speed: f32) {
        let turn = self.profile().turn;
        self.transform.rotate_left(speed, turn);
    }

    pub fn rotate_right(&mut self, speed: f32) {
        let turn = self.profile().turn;
        self.transform.rotate_right(speed, turn);
    }

    /// Self-contained per-frame update, independent of input.
    pub fn animate(&mut self) {
        if let Behavior::Spin { step } = self.behavior {
            self.transform.rotation += Vec3::splat(step);
        }
    }
}
