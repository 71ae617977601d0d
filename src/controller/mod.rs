// CONTROLLER: Input, camera rig, and the per-frame update
pub mod input;
pub mod camera_controller;
pub mod frame_loop;

pub use input::{Command, InputEvent, InputProcessor, InputState, KeyBindings, KeyMatch, MouseButton};
pub use camera_controller::{CameraMode, CameraRig, RigConfig};
pub use frame_loop::{ControlTarget, FrameDriver, FrameReport};
