use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};
use id_arena::Id;
use itertools::Itertools;

use crate::error::{SceneError, SceneResult};
use crate::math::bounds::BoundingSphere;

pub type ShapeId = Id<Shape>;

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable, PartialEq)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub uv: Vec2,
}

impl Vertex {
    pub fn new(position: Vec3, normal: Vec3, uv: Vec2) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }
}

/// Immutable triangle geometry. Only disposal (through the scene) drops the
/// vertex data.
#[derive(Debug, Clone)]
pub struct Shape {
    name: String,
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    bounds: BoundingSphere,
    released: bool,
}

impl Shape {
    pub fn new(name: impl Into<String>, vertices: Vec<Vertex>, indices: Vec<u32>) -> SceneResult<Shape> {
        let name = name.into();

        if indices.is_empty() || indices.len() % 3 != 0 {
            return Err(SceneError::invalid(format!(
                "shape {name:?} needs a non-empty triangle list, got {} indices",
                indices.len()
            )));
        }

        if let Some(&out_of_range) = indices.iter().find(|&&i| i as usize >= vertices.len()) {
            return Err(SceneError::invalid(format!(
                "shape {name:?} index {out_of_range} out of range for {} vertices",
                vertices.len()
            )));
        }

        let bounds = BoundingSphere::from_points(vertices.iter().map(|v| v.position));

        Ok(Shape {
            name,
            vertices,
            indices,
            bounds,
            released: false,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn bounds(&self) -> BoundingSphere {
        self.bounds
    }

    /// Unique undirected edges of the triangle list, as pairs of indices.
    pub fn edge_indices(&self) -> Vec<u32> {
        self.indices
            .chunks_exact(3)
            .flat_map(|tri| [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])])
            .map(|(a, b)| (a.min(b), a.max(b)))
            .unique()
            .flat_map(|(a, b)| [a, b])
            .collect()
    }

    pub(crate) fn release(&mut self) {
        self.vertices = Vec::new();
        self.indices = Vec::new();
        self.released = true;
    }

    pub fn is_released(&self) -> bool {
        self.released
    }
}
