use glam::Vec3;

use cubeyard::config::AppConfig;
use cubeyard::controller::{CameraMode, ControlTarget, FrameDriver, FrameReport, InputEvent, InputState, KeyMatch};
use cubeyard::error::RenderError;
use cubeyard::model::{Camera, EntityId, Geometry, Material, RenderHandle, RotationOrder, Transform};
use cubeyard::view::RenderBackend;

const EPS: f32 = 1e-4;

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Create(RenderHandle),
    Transform(RenderHandle),
    Camera,
    Resize(u32, u32),
    Render(u64),
}

/// Records every call; no GPU involved.
#[derive(Default)]
struct Recorder {
    calls: Vec<Call>,
    transforms: Vec<Transform>,
    last_camera: Option<Camera>,
    fail_render: bool,
}

impl Recorder {
    fn created(&self) -> usize {
        self.calls.iter().filter(|c| matches!(c, Call::Create(_))).count()
    }

    fn renders(&self) -> usize {
        self.calls.iter().filter(|c| matches!(c, Call::Render(_))).count()
    }
}

impl RenderBackend for Recorder {
    fn create_entity(&mut self, _geometry: &Geometry, _material: &Material) -> RenderHandle {
        let handle = RenderHandle(self.created() as u32);
        self.calls.push(Call::Create(handle));
        self.transforms.push(Transform::default());
        handle
    }

    fn set_transform(&mut self, handle: RenderHandle, transform: &Transform) {
        self.calls.push(Call::Transform(handle));
        self.transforms[handle.0 as usize] = *transform;
    }

    fn set_camera(&mut self, camera: &Camera) {
        self.calls.push(Call::Camera);
        self.last_camera = Some(camera.clone());
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.calls.push(Call::Resize(width, height));
    }

    fn render_frame(&mut self, report: &FrameReport) -> Result<(), RenderError> {
        self.calls.push(Call::Render(report.frame));
        if self.fail_render {
            Err(RenderError::Reconfigured)
        } else {
            Ok(())
        }
    }
}

struct Harness {
    driver: FrameDriver,
    input: InputState,
    renderer: Recorder,
    now_ms: f64,
}

impl Harness {
    fn new() -> Self {
        let config = AppConfig::default();
        let mut renderer = Recorder::default();
        let driver = FrameDriver::with_playground(&config, &mut renderer);
        Self {
            driver,
            input: InputState::new(config.key_match),
            renderer,
            now_ms: 0.0,
        }
    }

    fn send(&mut self, event: InputEvent) {
        self.input.process_event(&event);
    }

    fn hold(&mut self, key: &str) {
        self.send(InputEvent::KeyDown(key.to_string()));
    }

    fn release(&mut self, key: &str) {
        self.send(InputEvent::KeyUp(key.to_string()));
    }

    /// Press and release before the next frame: the command still fires once.
    fn tap(&mut self, key: &str) {
        self.hold(key);
        self.release(key);
    }

    fn frame(&mut self) -> FrameReport {
        self.now_ms += 1000.0 / 60.0;
        self.driver.frame(&mut self.input, self.now_ms, &mut self.renderer)
    }

    fn player(&self) -> Transform {
        self.driver.scene().entity(self.driver.playground().player).transform
    }

    fn eye(&self) -> Vec3 {
        self.driver.rig().camera.eye
    }
}

fn assert_vec_eq(actual: Vec3, expected: Vec3) {
    assert!(actual.abs_diff_eq(expected, EPS), "expected {expected:?}, got {actual:?}");
}

#[test]
fn playground_registers_every_entity_once() {
    let h = Harness::new();
    assert_eq!(h.renderer.created(), 5);
    assert_eq!(h.driver.scene().len(), 5);

    let pg = h.driver.playground();
    assert_eq!(pg.ground, EntityId(0));
    assert_eq!(pg.cubes, [EntityId(1), EntityId(2), EntityId(3)]);
    assert_eq!(pg.player, EntityId(4));
    assert_eq!(h.driver.control(), ControlTarget::Entity(pg.player));
    assert_eq!(h.driver.rig().mode(), CameraMode::Free);

    // only the player yaws about world up first
    assert_eq!(h.player().order, RotationOrder::Yxz);
    for cube in pg.cubes {
        assert_eq!(h.driver.scene().entity(cube).transform.order, RotationOrder::Xyz);
    }
}

#[test]
fn each_frame_pushes_transforms_then_camera_then_renders_once() {
    let mut h = Harness::new();
    h.renderer.calls.clear();

    h.frame();
    let calls = &h.renderer.calls;
    assert_eq!(calls.len(), 5 + 2);
    assert!(calls[..5].iter().all(|c| matches!(c, Call::Transform(_))));
    assert_eq!(calls[5], Call::Camera);
    assert_eq!(calls[6], Call::Render(1));

    h.frame();
    assert_eq!(h.renderer.renders(), 2);
    assert_eq!(h.renderer.calls.last(), Some(&Call::Render(2)));
}

#[test]
fn spinning_cubes_advance_every_frame() {
    let mut h = Harness::new();
    h.frame();
    h.frame();
    let cube = h.driver.playground().cubes[0];
    let rotation = h.driver.scene().entity(cube).transform.rotation;
    assert_vec_eq(rotation, Vec3::splat(0.02));
    // the renderer saw the same transform
    assert_vec_eq(h.renderer.transforms[1].rotation, Vec3::splat(0.02));
    // ground and player are not animated
    assert_eq!(h.player().rotation, Vec3::ZERO);
}

#[test]
fn held_forward_key_moves_the_player_every_frame() {
    let mut h = Harness::new();
    h.hold("w");
    for _ in 0..4 {
        h.frame();
    }
    h.release("w");
    h.frame();

    // 4 frames at move_speed 0.25, step 1, unrotated so along +X
    assert_vec_eq(h.player().position, Vec3::new(1.0, 10.0, 0.0));
}

#[test]
fn turning_applies_before_moving_in_the_same_frame() {
    let mut h = Harness::new();
    h.hold("d");
    h.hold("w");
    let report = h.frame();

    let expected_yaw = -(0.2 * 15.0f32).to_radians();
    assert!((report.player_yaw - expected_yaw).abs() < EPS);
    let position = h.player().position;
    assert!((position.x - expected_yaw.cos() * 0.25).abs() < EPS);
    // right turn: positive Z
    assert!(position.z > 0.0);
}

#[test]
fn follow_keys_attach_the_camera_and_trail_the_target() {
    let mut h = Harness::new();
    h.tap("m");
    h.frame();
    let player = h.driver.playground().player;
    assert_eq!(h.driver.rig().followed(), Some(player));
    assert_vec_eq(h.eye(), Vec3::new(-30.0, 30.0, 0.0));

    h.hold("w");
    h.hold("a");
    for _ in 0..10 {
        h.frame();
    }
    let target = h.player().position;
    let offset = h.eye() - target;
    assert!((Vec3::new(offset.x, 0.0, offset.z).length() - 30.0).abs() < EPS);
    assert!((offset.y - 20.0).abs() < EPS);
    let forward = h.driver.rig().camera.forward();
    assert!(forward.dot((target - h.eye()).normalize()) > 1.0 - EPS);

    // the renderer received the trailing camera
    let camera = h.renderer.last_camera.clone().expect("camera pushed");
    assert_vec_eq(camera.eye, h.eye());

    h.tap("2");
    h.frame();
    assert_eq!(h.driver.rig().followed(), Some(h.driver.playground().cubes[1]));
}

#[test]
fn unfollow_restores_the_default_pose() {
    let mut h = Harness::new();
    let initial = h.driver.rig().camera.clone();

    h.tap("m");
    h.hold("w");
    h.frame();
    h.frame();
    h.release("w");

    h.tap("0");
    h.frame();
    let rig = h.driver.rig();
    assert_eq!(rig.mode(), CameraMode::Free);
    assert_vec_eq(rig.camera.eye, Vec3::new(-25.0, 50.0, -25.0));
    assert!((rig.camera.yaw - initial.yaw).abs() < EPS);
    assert!((rig.camera.pitch - initial.pitch).abs() < EPS);
}

#[test]
fn toggle_control_routes_keys_to_the_camera() {
    let mut h = Harness::new();
    h.tap("m");
    h.frame();

    h.tap("c");
    h.frame();
    assert_eq!(h.driver.control(), ControlTarget::Camera);
    // steering the camera releases the follow
    assert_eq!(h.driver.rig().mode(), CameraMode::Free);

    let player_before = h.player().position;
    let eye_before = h.eye();
    let forward = h.driver.rig().camera.forward();
    h.hold("w");
    h.frame();
    assert_eq!(h.player().position, player_before);
    assert_vec_eq(h.eye(), eye_before + forward * 0.5);

    h.release("w");
    h.tap("c");
    h.frame();
    assert_eq!(h.driver.control(), ControlTarget::Entity(h.driver.playground().player));
}

#[test]
fn debug_toggle_reaches_the_report() {
    let mut h = Harness::new();
    assert!(!h.frame().debug);
    h.tap("`");
    assert!(h.frame().debug);
    h.tap("`");
    assert!(!h.frame().debug);
}

#[test]
fn resize_reaches_rig_and_renderer() {
    let mut h = Harness::new();
    h.send(InputEvent::Resize { width: 1024, height: 768 });
    h.frame();
    assert_eq!(h.driver.rig().viewport(), (1024, 768));
    assert!(h.renderer.calls.contains(&Call::Resize(1024, 768)));
    assert!((h.driver.rig().camera.aspect - 1024.0 / 768.0).abs() < EPS);
}

#[test]
fn render_failures_do_not_stop_the_loop() {
    let mut h = Harness::new();
    h.renderer.fail_render = true;
    h.hold("w");
    h.frame();
    let report = h.frame();
    assert_eq!(report.frame, 2);
    assert_eq!(h.renderer.renders(), 2);
    assert_vec_eq(h.player().position, Vec3::new(0.5, 10.0, 0.0));
}

#[test]
fn case_insensitive_matching_accepts_shifted_keys() {
    let config = AppConfig { key_match: KeyMatch::CaseInsensitive, ..AppConfig::default() };
    let mut renderer = Recorder::default();
    let mut driver = FrameDriver::with_playground(&config, &mut renderer);
    let mut input = InputState::new(config.key_match);

    input.process_event(&InputEvent::KeyDown("W".to_string()));
    driver.frame(&mut input, 0.0, &mut renderer);
    let player = driver.scene().entity(driver.playground().player).transform;
    assert_vec_eq(player.position, Vec3::new(0.25, 10.0, 0.0));

    // pressed lowercase, released while shift is down
    input.process_event(&InputEvent::KeyUp("W".to_string()));
    input.process_event(&InputEvent::KeyDown("w".to_string()));
    driver.frame(&mut input, 16.0, &mut renderer);
    input.process_event(&InputEvent::KeyDown("Shift".to_string()));
    input.process_event(&InputEvent::KeyUp("W".to_string()));
    input.process_event(&InputEvent::KeyUp("Shift".to_string()));
    driver.frame(&mut input, 32.0, &mut renderer);
    driver.frame(&mut input, 48.0, &mut renderer);
    let player = driver.scene().entity(driver.playground().player).transform;
    assert_vec_eq(player.position, Vec3::new(0.5, 10.0, 0.0));
}

#[test]
fn drag_orbits_the_free_camera() {
    let mut h = Harness::new();
    let yaw_before = h.driver.rig().camera.yaw;

    h.send(InputEvent::PointerMove { x: 100.0, y: 100.0 });
    h.send(InputEvent::PointerDown(cubeyard::controller::MouseButton::Left));
    h.frame();
    h.send(InputEvent::PointerMove { x: 180.0, y: 100.0 });
    h.frame();
    h.send(InputEvent::PointerUp(cubeyard::controller::MouseButton::Left));
    h.frame();

    let expected = yaw_before + 80.0 / 800.0 * std::f32::consts::PI;
    assert!((h.driver.rig().camera.yaw - expected).abs() < EPS);
}
