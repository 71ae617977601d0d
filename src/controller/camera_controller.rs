use glam::Vec3;
use tracing::{debug, info};

use crate::controller::input::{InputProcessor, InputState, MouseButton};
use crate::error::SceneError;
use crate::model::camera::MAX_PITCH;
use crate::model::{Camera, EntityId, Scene};

/// Which state the camera rig is in for the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraMode {
    /// Recomputed every frame from the target's transform.
    Following(EntityId),
    /// Oriented by manual pointer drags.
    Free,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigConfig {
    /// Horizontal distance behind the followed entity.
    pub follow_radius: f32,
    /// Height above the followed entity.
    pub follow_height: f32,
    /// Radians of rotation for a drag across the full viewport.
    pub orbit_speed: f32,
    pub drag_button: MouseButton,
    /// Free-camera translation per frame.
    pub fly_speed: f32,
    pub default_eye: Vec3,
    pub default_target: Vec3,
}

impl Default for RigConfig {
    fn default() -> Self {
        Self {
            follow_radius: 30.0,
            follow_height: 20.0,
            orbit_speed: std::f32::consts::PI,
            drag_button: MouseButton::Left,
            fly_speed: 0.5,
            default_eye: Vec3::new(-25.0, 50.0, -25.0),
            default_target: Vec3::ZERO,
        }
    }
}

/// Handles camera placement: trailing a target or free orbit.
#[derive(Debug, Clone)]
pub struct CameraRig {
    pub camera: Camera,
    pub config: RigConfig,
    mode: CameraMode,
    viewport: (u32, u32),
    last_pointer: Option<(f32, f32)>,
    pending_delta: (f32, f32),
}

impl CameraRig {
    pub fn new(config: RigConfig, width: u32, height: u32) -> Self {
        let mut rig = Self {
            camera: Camera::new(width, height),
            config,
            mode: CameraMode::Free,
            viewport: (width.max(1), height.max(1)),
            last_pointer: None,
            pending_delta: (0.0, 0.0),
        };
        rig.reset_view();
        rig
    }

    pub fn mode(&self) -> CameraMode {
        self.mode
    }

    pub fn followed(&self) -> Option<EntityId> {
        match self.mode {
            CameraMode::Following(id) => Some(id),
            CameraMode::Free => None,
        }
    }

    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    pub fn set_followed_object(&mut self, scene: &Scene, id: EntityId) -> Result<(), SceneError> {
        scene.check(id)?;
        self.mode = CameraMode::Following(id);
        info!(%id, "camera following entity");
        Ok(())
    }

    pub fn clear_followed_object(&mut self) {
        if let CameraMode::Following(id) = self.mode {
            info!(%id, "camera released entity");
        }
        self.mode = CameraMode::Free;
    }

    /// Return to the default pose and forget any drag in progress.
    pub fn reset_view(&mut self) {
        self.camera.eye = self.config.default_eye;
        self.camera.set_look_at(self.config.default_target);
        self.last_pointer = None;
        self.pending_delta = (0.0, 0.0);
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.viewport = (width, height);
        self.camera.set_aspect(width, height);
        debug!(width, height, "camera viewport resized");
    }

    /// Accumulate the drag delta since the last sample.
    pub fn sample_pointer(&mut self, input: &InputState) {
        if !input.is_button_down(self.config.drag_button) {
            self.last_pointer = None;
            return;
        }
        let Some(current) = input.pointer() else {
            return;
        };
        if let Some(last) = self.last_pointer {
            self.pending_delta.0 += current.0 - last.0;
            self.pending_delta.1 += current.1 - last.1;
        }
        self.last_pointer = Some(current);
    }

    /// Move the free camera along its own axes from held keys.
    pub fn fly(&mut self, input: &InputState, processor: &InputProcessor) {
        if self.mode != CameraMode::Free {
            return;
        }
        let mut cam_move = Vec3::ZERO;
        if processor.is_moving_forward(input) {
            cam_move += self.camera.forward();
        }
        if processor.is_moving_backward(input) {
            cam_move -= self.camera.forward();
        }
        let cam_right = self.camera.right();
        if processor.is_turning_left(input) {
            cam_move -= cam_right;
        }
        if processor.is_turning_right(input) {
            cam_move += cam_right;
        }
        if cam_move.length_squared() > 0.0 {
            self.camera.eye += cam_move.normalize() * self.config.fly_speed;
        }
    }

    /// Per-frame placement.
    pub fn update(&mut self, scene: &Scene) {
        let delta = std::mem::take(&mut self.pending_delta);
        match self.mode {
            CameraMode::Following(id) => {
                let target = scene.entity(id).transform;
                self.camera.eye = target.position + self.follow_offset(target.yaw());
                self.camera.set_look_at(target.position);
            }
            CameraMode::Free => self.apply_orbit(delta),
        }
    }

    fn follow_offset(&self, yaw: f32) -> Vec3 {
        let r = self.config.follow_radius;
        Vec3::new(-yaw.cos() * r, self.config.follow_height, yaw.sin() * r)
    }

    fn apply_orbit(&mut self, (dx, dy): (f32, f32)) {
        if dx == 0.0 && dy == 0.0 {
            return;
        }
        let (w, h) = self.viewport;
        self.camera.yaw += dx / w as f32 * self.config.orbit_speed;
        self.camera.pitch = (self.camera.pitch - dy / h as f32 * self.config.orbit_speed)
            .clamp(-MAX_PITCH, MAX_PITCH);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::input::InputEvent;
    use crate::model::{Behavior, Entity, Geometry, Material, RenderHandle, Transform};

    const EPS: f32 = 1e-4;

    fn scene_with_player() -> (Scene, EntityId) {
        let mut scene = Scene::new();
        let id = scene.add(Entity::new(
            RenderHandle(0),
            Geometry::cube(10.0),
            Material::from_hex(0xff00ff),
            Transform::at(Vec3::new(0.0, 10.0, 0.0)),
            Behavior::controlled(),
        ));
        (scene, id)
    }

    fn rig() -> CameraRig {
        CameraRig::new(RigConfig::default(), 800, 600)
    }

    fn assert_trailing(rig: &CameraRig, target: Vec3) {
        let offset = rig.camera.eye - target;
        let horizontal = Vec3::new(offset.x, 0.0, offset.z).length();
        assert!((horizontal - rig.config.follow_radius).abs() < EPS, "radius {horizontal}");
        assert!((offset.y - rig.config.follow_height).abs() < EPS, "height {}", offset.y);
        let to_target = (target - rig.camera.eye).normalize();
        assert!((rig.camera.forward() - to_target).length() < EPS);
    }

    #[test]
    fn follows_target_after_it_moves_and_turns() {
        let (mut scene, player) = scene_with_player();
        let mut rig = rig();
        rig.set_followed_object(&scene, player).unwrap();
        rig.update(&scene);
        assert_trailing(&rig, scene.entity(player).transform.position);

        let e = scene.entity_mut(player);
        e.rotate_left(2.0);
        e.move_forward(3.0);
        rig.update(&scene);
        assert_trailing(&rig, scene.entity(player).transform.position);
    }

    #[test]
    fn camera_sits_behind_facing_direction() {
        let (scene, player) = scene_with_player();
        let mut rig = rig();
        rig.set_followed_object(&scene, player).unwrap();
        rig.update(&scene);
        let facing = scene.entity(player).transform.facing();
        let back = rig.camera.eye - scene.entity(player).transform.position;
        assert!(Vec3::new(back.x, 0.0, back.z).dot(facing) < 0.0);
    }

    #[test]
    fn unknown_entity_is_rejected() {
        let (scene, _) = scene_with_player();
        let mut rig = rig();
        let err = rig.set_followed_object(&scene, EntityId(42)).unwrap_err();
        assert_eq!(err, SceneError::UnknownEntity(EntityId(42)));
        assert_eq!(rig.mode(), CameraMode::Free);
    }

    #[test]
    fn clear_then_reset_restores_default_pose() {
        let (scene, player) = scene_with_player();
        let mut rig = rig();
        let default = rig.camera.clone();

        rig.set_followed_object(&scene, player).unwrap();
        rig.update(&scene);
        assert_ne!(rig.camera.eye, default.eye);

        rig.clear_followed_object();
        rig.reset_view();
        rig.update(&scene);
        assert_eq!(rig.mode(), CameraMode::Free);
        assert_eq!(rig.camera.eye, default.eye);
        assert!((rig.camera.yaw - default.yaw).abs() < EPS);
        assert!((rig.camera.pitch - default.pitch).abs() < EPS);
    }

    fn drag(rig: &mut CameraRig, input: &mut InputState, scene: &Scene, from: (f32, f32), by: (f32, f32)) -> (f32, f32) {
        input.process_event(&InputEvent::PointerMove { x: from.0, y: from.1 });
        rig.sample_pointer(input);
        rig.update(scene);
        input.process_event(&InputEvent::PointerDown(MouseButton::Left));
        rig.sample_pointer(input);
        rig.update(scene);
        let before = (rig.camera.yaw, rig.camera.pitch);
        input.process_event(&InputEvent::PointerMove { x: from.0 + by.0, y: from.1 + by.1 });
        rig.sample_pointer(input);
        rig.update(scene);
        let after = (rig.camera.yaw, rig.camera.pitch);
        input.process_event(&InputEvent::PointerUp(MouseButton::Left));
        rig.sample_pointer(input);
        rig.update(scene);
        (after.0 - before.0, after.1 - before.1)
    }

    #[test]
    fn repeated_drags_rotate_equally() {
        let (scene, _) = scene_with_player();
        let mut rig = rig();
        let mut input = InputState::default();

        let first = drag(&mut rig, &mut input, &scene, (100.0, 100.0), (40.0, 10.0));
        let second = drag(&mut rig, &mut input, &scene, (500.0, 400.0), (40.0, 10.0));

        assert!(first.0 > 0.0);
        assert!((first.0 - second.0).abs() < EPS);
        assert!((first.1 - second.1).abs() < EPS);
        let expected_yaw = 40.0 / 800.0 * std::f32::consts::PI;
        assert!((first.0 - expected_yaw).abs() < EPS);
    }

    #[test]
    fn moves_without_button_do_not_rotate() {
        let (scene, _) = scene_with_player();
        let mut rig = rig();
        let before = rig.camera.clone();
        let mut input = InputState::default();
        for x in [10.0, 200.0, 350.0] {
            input.process_event(&InputEvent::PointerMove { x, y: x });
            rig.sample_pointer(&input);
            rig.update(&scene);
        }
        assert_eq!(rig.camera, before);
    }

    #[test]
    fn following_ignores_drags() {
        let (scene, player) = scene_with_player();
        let mut rig = rig();
        rig.set_followed_object(&scene, player).unwrap();
        rig.update(&scene);
        let pinned = rig.camera.clone();

        let mut input = InputState::default();
        drag(&mut rig, &mut input, &scene, (0.0, 0.0), (300.0, 200.0));
        assert_eq!(rig.camera, pinned);

        // the discarded delta must not leak into free mode
        rig.clear_followed_object();
        rig.update(&scene);
        assert_eq!(rig.camera, pinned);
    }

    #[test]
    fn fly_moves_free_camera_only() {
        let (scene, player) = scene_with_player();
        let mut rig = rig();
        let processor = InputProcessor::default();
        let mut input = InputState::default();
        input.process_event(&InputEvent::KeyDown("w".into()));

        let start = rig.camera.eye;
        rig.fly(&input, &processor);
        let moved = rig.camera.eye - start;
        assert!((moved.length() - rig.config.fly_speed).abs() < EPS);
        assert!(moved.dot(rig.camera.forward()) > 0.0);

        rig.set_followed_object(&scene, player).unwrap();
        let pinned = rig.camera.eye;
        rig.fly(&input, &processor);
        assert_eq!(rig.camera.eye, pinned);
    }

    #[test]
    fn zero_resize_is_ignored() {
        let mut rig = rig();
        rig.resize(0, 300);
        assert_eq!(rig.viewport(), (800, 600));
        rig.resize(1024, 512);
        assert_eq!(rig.viewport(), (1024, 512));
        assert!((rig.camera.aspect - 2.0).abs() < EPS);
    }
}
