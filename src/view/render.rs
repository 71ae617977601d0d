use glam::{Mat4, Vec3};
use tracing::{debug, warn};
use wgpu::util::DeviceExt;
use wgpu::*;

use crate::controller::FrameReport;
use crate::error::RenderError;
use crate::model::{Camera, Geometry, Material, RenderHandle, Transform};
use crate::ui;
use crate::utils::{create_axes_mesh, Mesh, MeshBuffer, Vertex};
use crate::view::gpu_init::GpuContext;
use crate::view::RenderBackend;

const DEPTH_FORMAT: TextureFormat = TextureFormat::Depth32Float;
const AXES_LENGTH: f32 = 100.0;
/// Directional light position; the sun shines from here toward the origin.
const SUN_POSITION: Vec3 = Vec3::new(-100.0, 100.0, 100.0);

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
}

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightingUniform {
    pub sun_dir: [f32; 3],
    pub sun_intensity: f32,
    pub ambient: f32,
    pub _pad: [f32; 3],
}

impl Default for LightingUniform {
    fn default() -> Self {
        Self {
            sun_dir: SUN_POSITION.normalize().to_array(),
            sun_intensity: 1.0,
            ambient: 0.25,
            _pad: [0.0; 3],
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ModelUniform {
    pub transform: [[f32; 4]; 4],
}

impl From<Mat4> for ModelUniform {
    fn from(m: Mat4) -> Self {
        Self { transform: m.to_cols_array_2d() }
    }
}

/// A mesh plus its own model-matrix uniform.
struct DrawItem {
    mesh: MeshBuffer,
    model_buffer: Buffer,
    bind_group: BindGroup,
}

struct CameraResources {
    camera_buffer: Buffer,
    bind_group_layout: BindGroupLayout,
    bind_group: BindGroup,
}

fn uniform_entry(binding: u32, visibility: ShaderStages) -> BindGroupLayoutEntry {
    BindGroupLayoutEntry {
        binding,
        visibility,
        ty: BindingType::Buffer {
            ty: BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

pub fn create_depth_texture(device: &Device, width: u32, height: u32) -> TextureView {
    let depth_texture = device.create_texture(&TextureDescriptor {
        label: Some("depth_texture"),
        size: Extent3d { width: width.max(1), height: height.max(1), depth_or_array_layers: 1 },
        mip_level_count: 1,
        sample_count: 1,
        dimension: TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    depth_texture.create_view(&TextureViewDescriptor::default())
}

fn create_camera_resources(device: &Device, camera: &Camera) -> CameraResources {
    let camera_buffer = device.create_buffer_init(&util::BufferInitDescriptor {
        label: Some("camera_buffer"),
        contents: bytemuck::bytes_of(&CameraUniform { view_proj: camera.view_proj().to_cols_array_2d() }),
        usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
    });
    let lighting_buffer = device.create_buffer_init(&util::BufferInitDescriptor {
        label: Some("lighting_buffer"),
        contents: bytemuck::bytes_of(&LightingUniform::default()),
        usage: BufferUsages::UNIFORM,
    });

    let bind_group_layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
        label: Some("camera_bind_group_layout"),
        entries: &[
            uniform_entry(0, ShaderStages::VERTEX),
            uniform_entry(1, ShaderStages::FRAGMENT),
        ],
    });

    let bind_group = device.create_bind_group(&BindGroupDescriptor {
        label: Some("camera_bind_group"),
        layout: &bind_group_layout,
        entries: &[
            BindGroupEntry { binding: 0, resource: camera_buffer.as_entire_binding() },
            BindGroupEntry { binding: 1, resource: lighting_buffer.as_entire_binding() },
        ],
    });

    CameraResources { camera_buffer, bind_group_layout, bind_group }
}

fn create_pipeline(
    device: &Device,
    layout: &PipelineLayout,
    shader: &ShaderModule,
    format: TextureFormat,
    topology: PrimitiveTopology,
) -> RenderPipeline {
    let (label, fragment_entry, cull_mode) = match topology {
        PrimitiveTopology::LineList => ("line_pipeline", "fs_unlit", None),
        _ => ("scene_pipeline", "fs_lit", Some(Face::Back)),
    };

    device.create_render_pipeline(&RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[VertexBufferLayout {
                array_stride: std::mem::size_of::<Vertex>() as BufferAddress,
                step_mode: VertexStepMode::Vertex,
                attributes: &[
                    VertexAttribute { offset: 0, shader_location: 0, format: VertexFormat::Float32x3 },
                    VertexAttribute { offset: 12, shader_location: 1, format: VertexFormat::Float32x3 },
                    VertexAttribute { offset: 24, shader_location: 2, format: VertexFormat::Float32x4 },
                ],
            }],
            compilation_options: Default::default(),
        },
        fragment: Some(FragmentState {
            module: shader,
            entry_point: Some(fragment_entry),
            targets: &[Some(ColorTargetState { format, blend: Some(BlendState::REPLACE), write_mask: ColorWrites::ALL })],
            compilation_options: Default::default(),
        }),
        primitive: PrimitiveState {
            topology,
            strip_index_format: None,
            front_face: FrontFace::Ccw,
            cull_mode,
            polygon_mode: PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: CompareFunction::Less,
            stencil: StencilState::default(),
            bias: DepthBiasState::default(),
        }),
        multisample: MultisampleState { count: 1, mask: !0, alpha_to_coverage_enabled: false },
        multiview: None,
        cache: None,
    })
}

/// wgpu implementation of [`RenderBackend`]: lit entities, debug axes, egui overlay.
pub struct WgpuRenderer {
    gpu: GpuContext,
    depth_view: TextureView,
    camera: CameraResources,
    model_layout: BindGroupLayout,
    scene_pipeline: RenderPipeline,
    line_pipeline: RenderPipeline,
    items: Vec<DrawItem>,
    axes: DrawItem,
    egui_ctx: egui::Context,
    egui_renderer: egui_wgpu::Renderer,
    pixels_per_point: f32,
}

impl WgpuRenderer {
    pub fn new(gpu: GpuContext) -> Self {
        let device = gpu.device.clone();
        let (width, height) = (gpu.config.width, gpu.config.height);

        let depth_view = create_depth_texture(&device, width, height);
        let camera = create_camera_resources(&device, &Camera::new(width, height));

        let model_layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("model_bind_group_layout"),
            entries: &[uniform_entry(0, ShaderStages::VERTEX)],
        });

        let shader = device.create_shader_module(ShaderModuleDescriptor {
            label: Some("scene_shader"),
            source: ShaderSource::Wgsl(include_str!("shaders/scene.wgsl").into()),
        });
        let pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some("scene_pipeline_layout"),
            bind_group_layouts: &[&camera.bind_group_layout, &model_layout],
            push_constant_ranges: &[],
        });
        let scene_pipeline =
            create_pipeline(&device, &pipeline_layout, &shader, gpu.format, PrimitiveTopology::TriangleList);
        let line_pipeline =
            create_pipeline(&device, &pipeline_layout, &shader, gpu.format, PrimitiveTopology::LineList);

        let egui_renderer = egui_wgpu::Renderer::new(&device, gpu.format, egui_wgpu::RendererOptions::default());

        Self {
            depth_view,
            camera,
            scene_pipeline,
            line_pipeline,
            items: Vec::new(),
            axes: Self::make_item(&device, &model_layout, &create_axes_mesh(AXES_LENGTH), "axes"),
            model_layout,
            egui_ctx: egui::Context::default(),
            egui_renderer,
            pixels_per_point: 1.0,
            gpu,
        }
    }

    /// Device pixel ratio for the overlay.
    pub fn set_pixels_per_point(&mut self, ppp: f32) {
        if ppp.is_finite() && ppp > 0.0 {
            self.pixels_per_point = ppp;
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.gpu.config.width, self.gpu.config.height)
    }

    fn make_item(device: &Device, layout: &BindGroupLayout, mesh: &Mesh, label: &str) -> DrawItem {
        let model_buffer = device.create_buffer_init(&util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::bytes_of(&ModelUniform::from(Mat4::IDENTITY)),
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
        });
        let bind_group = device.create_bind_group(&BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[BindGroupEntry { binding: 0, resource: model_buffer.as_entire_binding() }],
        });
        DrawItem { mesh: mesh.upload(device), model_buffer, bind_group }
    }

    fn acquire_frame(&mut self) -> Result<SurfaceTexture, RenderError> {
        match self.gpu.surface.get_current_texture() {
            Ok(frame) => Ok(frame),
            Err(SurfaceError::Lost | SurfaceError::Outdated) => {
                warn!("surface lost, reconfiguring");
                self.gpu.reconfigure();
                Err(RenderError::Reconfigured)
            }
            Err(e) => Err(RenderError::Surface(e)),
        }
    }

    fn draw(pass: &mut RenderPass<'_>, item: &DrawItem) {
        if item.mesh.index_count == 0 {
            return;
        }
        pass.set_bind_group(1, &item.bind_group, &[]);
        pass.set_vertex_buffer(0, item.mesh.vertex_buffer.slice(..));
        pass.set_index_buffer(item.mesh.index_buffer.slice(..), IndexFormat::Uint32);
        pass.draw_indexed(0..item.mesh.index_count, 0, 0..1);
    }

    fn overlay(&mut self, report: &FrameReport) -> (Vec<egui::ClippedPrimitive>, egui::FullOutput) {
        let (width, height) = self.size();
        let ppp = self.pixels_per_point;
        let mut raw_input = egui::RawInput::default();
        raw_input.screen_rect = Some(egui::Rect::from_min_size(
            egui::Pos2::ZERO,
            egui::vec2(width as f32 / ppp, height as f32 / ppp),
        ));
        self.egui_ctx.set_pixels_per_point(ppp);

        let mut full_output = ui::build_overlay(&self.egui_ctx, raw_input, report);
        let primitives = self.egui_ctx.tessellate(std::mem::take(&mut full_output.shapes), ppp);
        (primitives, full_output)
    }
}

impl RenderBackend for WgpuRenderer {
    fn create_entity(&mut self, geometry: &Geometry, material: &Material) -> RenderHandle {
        let handle = RenderHandle(self.items.len() as u32);
        let mesh = Mesh::from_geometry(geometry, material.color);
        let item = Self::make_item(&self.gpu.device, &self.model_layout, &mesh, "entity_model");
        self.items.push(item);
        debug!(?handle, ?geometry, "gpu mesh created");
        handle
    }

    fn set_transform(&mut self, handle: RenderHandle, transform: &Transform) {
        let Some(item) = self.items.get(handle.0 as usize) else {
            warn!(?handle, "transform for unknown render handle");
            return;
        };
        self.gpu
            .queue
            .write_buffer(&item.model_buffer, 0, bytemuck::bytes_of(&ModelUniform::from(transform.matrix())));
    }

    fn set_camera(&mut self, camera: &Camera) {
        let uniform = CameraUniform { view_proj: camera.view_proj().to_cols_array_2d() };
        self.gpu.queue.write_buffer(&self.camera.camera_buffer, 0, bytemuck::bytes_of(&uniform));
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.gpu.resize(width, height);
        self.depth_view = create_depth_texture(&self.gpu.device, width, height);
        debug!(width, height, "surface resized");
    }

    fn render_frame(&mut self, report: &FrameReport) -> Result<(), RenderError> {
        let frame = self.acquire_frame()?;
        let device = self.gpu.device.clone();
        let queue = self.gpu.queue.clone();

        let view = frame.texture.create_view(&TextureViewDescriptor::default());
        let mut encoder = device.create_command_encoder(&CommandEncoderDescriptor { label: Some("frame_encoder") });

        {
            let mut rp = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("scene_pass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: Operations { load: LoadOp::Clear(Color::WHITE), store: StoreOp::Store },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(Operations { load: LoadOp::Clear(1.0), store: StoreOp::Store }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            rp.set_bind_group(0, &self.camera.bind_group, &[]);
            rp.set_pipeline(&self.scene_pipeline);
            for item in &self.items {
                Self::draw(&mut rp, item);
            }

            if report.debug {
                rp.set_pipeline(&self.line_pipeline);
                Self::draw(&mut rp, &self.axes);
            }
        }

        if report.debug {
            let (primitives, full_output) = self.overlay(report);
            let (width, height) = self.size();
            let screen_descriptor = egui_wgpu::ScreenDescriptor {
                size_in_pixels: [width, height],
                pixels_per_point: self.pixels_per_point,
            };

            for (id, image_delta) in &full_output.textures_delta.set {
                self.egui_renderer.update_texture(&device, &queue, *id, image_delta);
            }
            self.egui_renderer
                .update_buffers(&device, &queue, &mut encoder, &primitives, &screen_descriptor);

            {
                let egui_pass = encoder.begin_render_pass(&RenderPassDescriptor {
                    label: Some("overlay_pass"),
                    color_attachments: &[Some(RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: Operations { load: LoadOp::Load, store: StoreOp::Store },
                        depth_slice: None,
                    })],
                    depth_stencil_attachment: None,
                    timestamp_writes: None,
                    occlusion_query_set: None,
                });
                self.egui_renderer
                    .render(&mut egui_pass.forget_lifetime(), &primitives, &screen_descriptor);
            }

            for id in &full_output.textures_delta.free {
                self.egui_renderer.free_texture(id);
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_sizes_match_shader_layout() {
        assert_eq!(std::mem::size_of::<CameraUniform>(), 64);
        assert_eq!(std::mem::size_of::<LightingUniform>(), 32);
        assert_eq!(std::mem::size_of::<ModelUniform>(), 64);
    }

    #[test]
    fn sun_points_toward_light_position() {
        let light = LightingUniform::default();
        let dir = Vec3::from(light.sun_dir);
        assert!((dir.length() - 1.0).abs() < 1e-5);
        assert!(dir.x < 0.0 && dir.y > 0.0 && dir.z > 0.0);
        assert_eq!(light.ambient, 0.25);
    }
}
