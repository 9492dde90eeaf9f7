use bytemuck::{Pod, Zeroable};

use crate::galaxy::GalaxyGeometry;

/// Per-particle instance data.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct PointVertex {
    pub position: [f32; 3],
    pub scale: f32,
    pub color: [f32; 3],
    pub _padding: f32,
}

impl PointVertex {
    pub const fn new(position: [f32; 3], color: [f32; 3], scale: f32) -> Self {
        Self { position, scale, color, _padding: 0.0 }
    }

    /// Layout for the instance buffer (slot 1, one entry per particle).
    pub fn desc<'a>() -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<PointVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                // position: vec3<f32>
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
                // scale: f32
                wgpu::VertexAttribute {
                    offset: 12,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32,
                },
                // color: vec3<f32>
                wgpu::VertexAttribute {
                    offset: 16,
                    shader_location: 3,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

/// Interleave generated attributes into instance data.
pub fn interleave(geometry: &GalaxyGeometry) -> Vec<PointVertex> {
    geometry
        .positions
        .iter()
        .zip(&geometry.colors)
        .zip(&geometry.scales)
        .map(|((position, color), scale)| PointVertex::new(*position, *color, *scale))
        .collect()
}

/// Corners of the billboard quad each particle is expanded into.
pub const QUAD_CORNERS: [[f32; 2]; 4] = [
    [-0.5, -0.5], // bottom-left
    [0.5, -0.5],  // bottom-right
    [0.5, 0.5],   // top-right
    [-0.5, 0.5],  // top-left
];

pub const QUAD_INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];

/// Layout for the shared quad corner buffer (slot 0).
pub fn quad_desc<'a>() -> wgpu::VertexBufferLayout<'a> {
    wgpu::VertexBufferLayout {
        array_stride: (std::mem::size_of::<f32>() * 2) as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[wgpu::VertexAttribute {
            offset: 0,
            shader_location: 0,
            format: wgpu::VertexFormat::Float32x2,
        }],
    }
}
