//! GPU-resident galaxy geometry.

use wgpu::util::DeviceExt;

use crate::galaxy::GalaxyGeometry;
use crate::gpu::mesh;

/// Instance buffer holding one [`mesh::PointVertex`] per particle.
pub struct GalaxyBuffers {
    instance_buffer: wgpu::Buffer,
    count: u32,
}

impl GalaxyBuffers {
    pub fn upload(device: &wgpu::Device, geometry: &GalaxyGeometry) -> Self {
        let vertices = mesh::interleave(geometry);
        let instance_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Galaxy Instance Buffer"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        Self {
            instance_buffer,
            count: vertices.len() as u32,
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn instance_buffer(&self) -> &wgpu::Buffer {
        &self.instance_buffer
    }

    /// Release the GPU memory now instead of waiting for the last reference to drop.
    pub fn dispose(self) {
        self.instance_buffer.destroy();
    }
}
