//! Static full-screen quad used by the rasterization pass.
//!
//! Drawn as a triangle strip in the order bottom-left, top-left, bottom-right,
//! top-right, which yields the triangles (BL, TL, BR) and (TL, BR, TR).

use wgpu::util::DeviceExt;

/// Clip-space positions (x, y, z, w).
pub const QUAD_POSITIONS: [[f32; 4]; 4] = [
    [-1.0, -1.0, 0.0, 1.0],
    [-1.0, 1.0, 0.0, 1.0],
    [1.0, -1.0, 0.0, 1.0],
    [1.0, 1.0, 0.0, 1.0],
];

/// Texture coordinates, origin top-left (+v down).
pub const QUAD_TEX_COORDS: [[f32; 2]; 4] = [
    [0.0, 1.0],
    [0.0, 0.0],
    [1.0, 1.0],
    [1.0, 0.0],
];

/// Per-vertex RGBA.
pub const QUAD_COLORS: [[f32; 4]; 4] = [
    [1.0, 0.0, 0.0, 1.0],
    [0.0, 1.0, 0.0, 1.0],
    [0.0, 0.0, 1.0, 1.0],
    [1.0, 0.0, 1.0, 1.0],
];

pub const QUAD_VERTEX_COUNT: u32 = 4;

/// Value-only quad data. No GPU interaction.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct QuadGeometry {
    pub positions: [[f32; 4]; 4],
    pub tex_coords: [[f32; 2]; 4],
    pub colors: [[f32; 4]; 4],
}

pub fn quad_geometry() -> QuadGeometry {
    QuadGeometry {
        positions: QUAD_POSITIONS,
        tex_coords: QUAD_TEX_COORDS,
        colors: QUAD_COLORS,
    }
}

/// Vertex index triples produced by a triangle strip of `vertex_count` vertices.
pub fn strip_triangles(vertex_count: u32) -> impl Iterator<Item = [u32; 3]> {
    (2..vertex_count).map(|i| [i - 2, i - 1, i])
}

const POSITION_ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x4];
const TEX_COORD_ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![1 => Float32x2];
const COLOR_ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![2 => Float32x4];

/// Layouts for the three parallel vertex buffers (slots 0, 1, 2).
pub fn vertex_layouts() -> [wgpu::VertexBufferLayout<'static>; 3] {
    [
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<[f32; 4]>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &POSITION_ATTRS,
        },
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<[f32; 2]>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &TEX_COORD_ATTRS,
        },
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<[f32; 4]>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &COLOR_ATTRS,
        },
    ]
}

/// Immutable GPU copies of the quad, uploaded once at initialization.
pub struct GeometryBuffers {
    pub positions: wgpu::Buffer,
    pub tex_coords: wgpu::Buffer,
    pub colors: wgpu::Buffer,
}

impl GeometryBuffers {
    pub fn upload(device: &wgpu::Device, quad: &QuadGeometry) -> Self {
        let buffer = |label: &str, contents: &[u8]| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(label),
                contents,
                usage: wgpu::BufferUsages::VERTEX,
            })
        };

        Self {
            positions: buffer("prism quad positions", bytemuck::cast_slice(&quad.positions)),
            tex_coords: buffer("prism quad tex coords", bytemuck::cast_slice(&quad.tex_coords)),
            colors: buffer("prism quad colors", bytemuck::cast_slice(&quad.colors)),
        }
    }

    /// Binds the buffers at vertex slots 0/1/2.
    pub fn bind(&self, rpass: &mut wgpu::RenderPass<'_>) {
        rpass.set_vertex_buffer(0, self.positions.slice(..));
        rpass.set_vertex_buffer(1, self.tex_coords.slice(..));
        rpass.set_vertex_buffer(2, self.colors.slice(..));
    }
}
