// VIEW: Rendering and graphics
pub mod render;
pub mod gpu_init;

pub use render::WgpuRenderer;
pub use gpu_init::GpuContext;

use crate::controller::FrameReport;
use crate::error::RenderError;
use crate::model::{Camera, Geometry, Material, RenderHandle, Transform};

/// What the scene and frame driver need from a renderer.
///
/// Entities are registered once and then only have their transform pushed.
/// `render_frame` is called exactly once per frame, after every transform and
/// the camera for that frame have been set.
pub trait RenderBackend {
    fn create_entity(&mut self, geometry: &Geometry, material: &Material) -> RenderHandle;
    fn set_transform(&mut self, handle: RenderHandle, transform: &Transform);
    fn set_camera(&mut self, camera: &Camera);
    /// Zero-sized requests are ignored.
    fn resize(&mut self, width: u32, height: u32);
    fn render_frame(&mut self, report: &FrameReport) -> Result<(), RenderError>;
}
