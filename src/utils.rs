use crate::model::Geometry;
use wgpu::util::DeviceExt;
use bytemuck::{NoUninit};

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, NoUninit)]
pub struct Vertex {
    pub pos: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 4],
}

pub struct MeshBuffer {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

#[derive(Debug, Clone)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn empty() -> Self {
        Self {
            vertices: Vec::new(),
            indices: Vec::new(),
        }
    }

    /// Triangle mesh for an entity's geometry, centred on the origin.
    pub fn from_geometry(geometry: &Geometry, color: [f32; 4]) -> Self {
        match *geometry {
            Geometry::Cuboid { width, height, depth } => cuboid(width, height, depth, color),
            Geometry::Plane { width, depth } => plane(width, depth, color),
        }
    }

    pub fn upload(&self, device: &wgpu::Device) -> MeshBuffer {

        let vertices = bytemuck::cast_slice(&self.vertices);
        let indices = bytemuck::cast_slice(&self.indices);

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Vertex Buffer"),
            contents: vertices,
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Mesh Index Buffer"),
            contents: indices,
            usage: wgpu::BufferUsages::INDEX,
        });

        MeshBuffer {
            vertex_buffer,
            index_buffer,
            index_count: self.indices.len() as u32,
        }
    }

    fn push_quad(&mut self, corners: [[f32; 3]; 4], normal: [f32; 3], color: [f32; 4]) {
        let base = self.vertices.len() as u32;
        for pos in corners {
            self.vertices.push(Vertex { pos, normal, color });
        }
        self.indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
}

/// Box with per-face normals; corners listed counter-clockwise seen from outside.
fn cuboid(width: f32, height: f32, depth: f32, color: [f32; 4]) -> Mesh {
    let (x, y, z) = (width / 2.0, height / 2.0, depth / 2.0);
    let mut mesh = Mesh::empty();
    // +X
    mesh.push_quad([[x, -y, z], [x, -y, -z], [x, y, -z], [x, y, z]], [1.0, 0.0, 0.0], color);
    // -X
    mesh.push_quad([[-x, -y, -z], [-x, -y, z], [-x, y, z], [-x, y, -z]], [-1.0, 0.0, 0.0], color);
    // +Y
    mesh.push_quad([[-x, y, z], [x, y, z], [x, y, -z], [-x, y, -z]], [0.0, 1.0, 0.0], color);
    // -Y
    mesh.push_quad([[-x, -y, -z], [x, -y, -z], [x, -y, z], [-x, -y, z]], [0.0, -1.0, 0.0], color);
    // +Z
    mesh.push_quad([[-x, -y, z], [x, -y, z], [x, y, z], [-x, y, z]], [0.0, 0.0, 1.0], color);
    // -Z
    mesh.push_quad([[x, -y, -z], [-x, -y, -z], [-x, y, -z], [x, y, -z]], [0.0, 0.0, -1.0], color);
    mesh
}

fn plane(width: f32, depth: f32, color: [f32; 4]) -> Mesh {
    let (x, z) = (width / 2.0, depth / 2.0);
    let mut mesh = Mesh::empty();
    mesh.push_quad([[-x, 0.0, z], [x, 0.0, z], [x, 0.0, -z], [-x, 0.0, -z]], [0.0, 1.0, 0.0], color);
    mesh
}

/// World axes as a line list: X red, Y green, Z blue.
pub fn create_axes_mesh(length: f32) -> Mesh {
    let axes = [
        ([length, 0.0, 0.0], [1.0, 0.0, 0.0, 1.0]),
        ([0.0, length, 0.0], [0.0, 1.0, 0.0, 1.0]),
        ([0.0, 0.0, length], [0.0, 0.0, 1.0, 1.0]),
    ];
    let mut mesh = Mesh::empty();
    for (tip, color) in axes {
        let base = mesh.vertices.len() as u32;
        mesh.vertices.push(Vertex { pos: [0.0, 0.0, 0.0], normal: [0.0, 1.0, 0.0], color });
        mesh.vertices.push(Vertex { pos: tip, normal: [0.0, 1.0, 0.0], color });
        mesh.indices.extend_from_slice(&[base, base + 1]);
    }
    mesh
}

/// Frame time and a once-per-second FPS average.
#[derive(Debug, Clone, Default)]
pub struct FrameTimer {
    last_ms: Option<f64>,
    frame_count: u32,
    fps_timer: f32,
    fps: f32,
}

impl FrameTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance to `now_ms` and return the clamped frame delta in seconds.
    pub fn tick(&mut self, now_ms: f64) -> f32 {
        let dt = match self.last_ms {
            Some(last) => ((now_ms - last) / 1000.0).clamp(0.0, 0.1) as f32,
            None => 0.0,
        };
        self.last_ms = Some(now_ms);

        self.frame_count += 1;
        self.fps_timer += dt;
        if self.fps_timer >= 1.0 {
            self.fps = self.frame_count as f32 / self.fps_timer;
            self.frame_count = 0;
            self.fps_timer = 0.0;
        }
        dt
    }

    pub fn fps(&self) -> f32 {
        self.fps
    }
}
