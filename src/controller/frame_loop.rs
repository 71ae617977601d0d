use glam::Vec3;
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::controller::camera_controller::{CameraMode, CameraRig};
use crate::controller::input::{Command, InputProcessor, InputState};
use crate::model::{EntityId, Playground, Scene};
use crate::utils::FrameTimer;
use crate::view::RenderBackend;

/// Where held movement keys are routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlTarget {
    Entity(EntityId),
    Camera,
}

/// Per-frame snapshot handed to the renderer (debug overlay data).
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    pub frame: u64,
    pub dt: f32,
    pub fps: f32,
    pub debug: bool,
    pub camera_mode: CameraMode,
    pub control: ControlTarget,
    pub camera_eye: Vec3,
    pub camera_yaw: f32,
    pub camera_pitch: f32,
    pub player_position: Vec3,
    pub player_yaw: f32,
}

/// Main loop state and update logic
pub struct FrameDriver {
    scene: Scene,
    playground: Playground,
    rig: CameraRig,
    processor: InputProcessor,
    control: ControlTarget,
    timer: FrameTimer,
    move_speed: f32,
    turn_speed: f32,
    debug: bool,
    frame: u64,
}

impl FrameDriver {
    pub fn new(config: &AppConfig, scene: Scene, playground: Playground) -> Self {
        assert!(
            scene.entity(playground.player).is_controllable(),
            "player entity {} has no motion profile",
            playground.player
        );
        Self {
            rig: CameraRig::new(config.rig, config.width, config.height),
            processor: InputProcessor::new(config.bindings.clone()),
            control: ControlTarget::Entity(playground.player),
            timer: FrameTimer::new(),
            move_speed: config.move_speed,
            turn_speed: config.turn_speed,
            debug: config.debug,
            frame: 0,
            scene,
            playground,
        }
    }

    /// Build the toy scene through `renderer` and wrap it in a driver.
    pub fn with_playground<R: RenderBackend + ?Sized>(config: &AppConfig, renderer: &mut R) -> Self {
        let mut scene = Scene::new();
        let playground = Playground::build(&mut scene, renderer);
        info!(entities = scene.len(), "playground ready");
        Self::new(config, scene, playground)
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn playground(&self) -> &Playground {
        &self.playground
    }

    pub fn rig(&self) -> &CameraRig {
        &self.rig
    }

    pub fn control(&self) -> ControlTarget {
        self.control
    }

    pub fn debug(&self) -> bool {
        self.debug
    }

    /// Run one frame: commands, movement, animation, camera, redraw.
    pub fn frame<R: RenderBackend + ?Sized>(
        &mut self,
        input: &mut InputState,
        now_ms: f64,
        renderer: &mut R,
    ) -> FrameReport {
        let dt = self.timer.tick(now_ms);
        self.frame += 1;

        // 1. input
        if let Some((width, height)) = input.take_resize() {
            self.rig.resize(width, height);
            renderer.resize(width, height);
        }
        for key in input.take_pressed() {
            if let Some(command) = self.processor.command_for(&key) {
                self.apply_command(command);
            }
        }

        // 2. movement of the selected target
        self.steer(input);

        // 3. self-animated entities
        self.scene.animate();

        // 4. camera
        self.rig.sample_pointer(input);
        self.rig.update(&self.scene);

        // 5. redraw
        for (_, entity) in self.scene.iter() {
            renderer.set_transform(entity.handle, &entity.transform);
        }
        renderer.set_camera(&self.rig.camera);
        let report = self.report(dt);
        if let Err(e) = renderer.render_frame(&report) {
            warn!(frame = self.frame, "render failed: {e}");
        }
        report
    }

    pub fn apply_command(&mut self, command: Command) {
        debug!(?command, "applying command");
        match command {
            Command::FollowPlayer => self.follow(self.playground.player),
            Command::FollowCube(n) => match self.playground.cube(n) {
                Some(id) => self.follow(id),
                None => warn!(n, "no cube with that number"),
            },
            Command::Unfollow => {
                self.rig.clear_followed_object();
                self.rig.reset_view();
            }
            Command::ToggleControl => {
                self.control = match self.control {
                    ControlTarget::Entity(_) => {
                        // a following camera would override any manual flight
                        self.rig.clear_followed_object();
                        ControlTarget::Camera
                    }
                    ControlTarget::Camera => ControlTarget::Entity(self.playground.player),
                };
                info!(control = ?self.control, "control target switched");
            }
            Command::ToggleDebug => {
                self.debug = !self.debug;
                info!(debug = self.debug, "debug display toggled");
            }
            Command::LogState => self.log_state(),
        }
    }

    fn follow(&mut self, id: EntityId) {
        if let Err(e) = self.rig.set_followed_object(&self.scene, id) {
            warn!("cannot follow: {e}");
        }
    }

    /// Turn first, then translate along the new facing.
    fn steer(&mut self, input: &InputState) {
        match self.control {
            ControlTarget::Entity(id) => {
                let p = &self.processor;
                let entity = self.scene.entity_mut(id);
                if p.is_turning_left(input) {
                    entity.rotate_left(self.turn_speed);
                }
                if p.is_turning_right(input) {
                    entity.rotate_right(self.turn_speed);
                }
                if p.is_moving_forward(input) {
                    entity.move_forward(self.move_speed);
                }
                if p.is_moving_backward(input) {
                    entity.move_backward(self.move_speed);
                }
            }
            ControlTarget::Camera => self.rig.fly(input, &self.processor),
        }
    }

    fn log_state(&self) {
        let cam = &self.rig.camera;
        info!(
            "camera pos x: {:.2} y: {:.2} z: {:.2}; yaw: {:.1} pitch: {:.1}",
            cam.eye.x,
            cam.eye.y,
            cam.eye.z,
            cam.yaw.to_degrees(),
            cam.pitch.to_degrees()
        );
        let t = self.scene.entity(self.playground.player).transform;
        info!(
            "player pos x: {:.2} y: {:.2} z: {:.2}; rot x: {:.1} y: {:.1} z: {:.1}",
            t.position.x,
            t.position.y,
            t.position.z,
            t.rotation.x.to_degrees(),
            t.rotation.y.to_degrees(),
            t.rotation.z.to_degrees()
        );
    }

    fn report(&self, dt: f32) -> FrameReport {
        let cam = &self.rig.camera;
        let player = self.scene.entity(self.playground.player).transform;
        FrameReport {
            frame: self.frame,
            dt,
            fps: self.timer.fps(),
            debug: self.debug,
            camera_mode: self.rig.mode(),
            control: self.control,
            camera_eye: cam.eye,
            camera_yaw: cam.yaw,
            camera_pitch: cam.pitch,
            player_position: player.position,
            player_yaw: player.yaw(),
        }
    }
}
