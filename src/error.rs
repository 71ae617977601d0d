use thiserror::Error;

use crate::model::EntityId;

/// Misuse of the scene registry that callers are expected to handle.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SceneError {
    #[error("entity {0} is not part of the scene")]
    UnknownEntity(EntityId),
}

/// Failures while bringing up the GPU for a window or canvas.
#[derive(Debug, Error)]
pub enum GpuError {
    #[error("failed to create surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),
    #[error("no suitable GPU adapter found: {0}")]
    NoAdapter(#[from] wgpu::RequestAdapterError),
    #[error("failed to request device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
    #[error("surface reports no supported texture formats")]
    NoSurfaceFormat,
}

/// Per-frame render failures. None of these stop the frame loop.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),
    #[error("surface lost, reconfigured for next frame")]
    Reconfigured,
}
