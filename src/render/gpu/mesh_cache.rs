use std::collections::HashMap;
use std::mem::offset_of;

use wgpu::util::DeviceExt;

use crate::assets::{Shape, ShapeId, Vertex};

pub const VERTEX_LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
    array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
    step_mode: wgpu::VertexStepMode::Vertex,
    attributes: &[
        wgpu::VertexAttribute {
            offset: offset_of!(Vertex, position) as wgpu::BufferAddress,
            shader_location: 0,
            format: wgpu::VertexFormat::Float32x3,
        },
        wgpu::VertexAttribute {
            offset: offset_of!(Vertex, normal) as wgpu::BufferAddress,
            shader_location: 1,
            format: wgpu::VertexFormat::Float32x3,
        },
        wgpu::VertexAttribute {
            offset: offset_of!(Vertex, uv) as wgpu::BufferAddress,
            shader_location: 2,
            format: wgpu::VertexFormat::Float32x2,
        },
    ],
};

pub struct GpuMesh {
    pub vertices: wgpu::Buffer,
    pub triangles: wgpu::Buffer,
    pub triangle_index_count: u32,
    pub edges: wgpu::Buffer,
    pub edge_index_count: u32,
}

impl GpuMesh {
    fn from_shape(device: &wgpu::Device, shape: &Shape) -> Self {
        let vertices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} vertices", shape.name())),
            contents: bytemuck::cast_slice(shape.vertices()),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let triangles = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} indices", shape.name())),
            contents: bytemuck::cast_slice(shape.indices()),
            usage: wgpu::BufferUsages::INDEX,
        });

        let edge_indices = shape.edge_indices();
        let edges = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{} edges", shape.name())),
            contents: bytemuck::cast_slice(&edge_indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            vertices,
            triangles,
            triangle_index_count: shape.indices().len() as u32,
            edges,
            edge_index_count: edge_indices.len() as u32,
        }
    }
}

/// Vertex and index buffers per shape, uploaded on first use.
#[derive(Default)]
pub struct MeshCache {
    meshes: HashMap<ShapeId, GpuMesh>,
}

impl MeshCache {
    pub fn prepare(&mut self, device: &wgpu::Device, id: ShapeId, shape: &Shape) {
        self.meshes.entry(id).or_insert_with(|| {
            log::debug!(
                "Uploading shape {} ({} triangles)",
                shape.name(),
                shape.triangle_count()
            );
            GpuMesh::from_shape(device, shape)
        });
    }

    pub fn get(&self, id: ShapeId) -> Option<&GpuMesh> {
        self.meshes.get(&id)
    }

    /// Drops buffers of shapes the scene has released.
    pub fn retain(&mut self, mut is_alive: impl FnMut(ShapeId) -> bool) {
        self.meshes.retain(|id, _| is_alive(*id));
    }
}
