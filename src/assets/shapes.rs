//! Procedural geometry generators.
//!
//! Conventions: counter-clockwise front faces, outward normals, UV origin in
//! the top-left corner of the image.

use std::f32::consts::{PI, TAU};

use glam::{vec2, Vec3};

use crate::assets::shape::{Shape, Vertex};
use crate::error::{SceneError, SceneResult};

fn require_positive(what: &str, value: f32) -> SceneResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SceneError::invalid(format!("{what} must be positive, got {value}")))
    }
}

fn require_segments(what: &str, value: u32, min: u32) -> SceneResult<()> {
    if value >= min {
        Ok(())
    } else {
        Err(SceneError::invalid(format!("{what} must be at least {min}, got {value}")))
    }
}

/// Appends a subdivided quad centred on `center` spanning `u` and `v`, facing
/// along `u × v`.
fn push_face(
    vertices: &mut Vec<Vertex>,
    indices: &mut Vec<u32>,
    center: Vec3,
    u: Vec3,
    v: Vec3,
    u_segments: u32,
    v_segments: u32,
) {
    let normal = u.cross(v).normalize();
    let base = vertices.len() as u32;
    let row = u_segments + 1;

    for j in 0..=v_segments {
        let fv = j as f32 / v_segments as f32;
        for i in 0..=u_segments {
            let fu = i as f32 / u_segments as f32;
            let position = center + (fu - 0.5) * u + (fv - 0.5) * v;
            vertices.push(Vertex::new(position, normal, vec2(fu, 1.0 - fv)));
        }
    }

    for j in 0..v_segments {
        for i in 0..u_segments {
            let a = base + j * row + i;
            let b = a + 1;
            let c = a + row + 1;
            let d = a + row;
            indices.extend_from_slice(&[a, b, c, a, c, d]);
        }
    }
}

/// Axis-aligned box centred on the origin.
pub fn box_shape(
    width: f32,
    height: f32,
    depth: f32,
    width_segments: u32,
    height_segments: u32,
    depth_segments: u32,
) -> SceneResult<Shape> {
    require_positive("box width", width)?;
    require_positive("box height", height)?;
    require_positive("box depth", depth)?;
    require_segments("box width segments", width_segments, 1)?;
    require_segments("box height segments", height_segments, 1)?;
    require_segments("box depth segments", depth_segments, 1)?;

    let (hw, hh, hd) = (width / 2.0, height / 2.0, depth / 2.0);
    let mut vertices = Vec::new();
    let mut indices = Vec::new();

    let faces = [
        (Vec3::X * hw, Vec3::NEG_Z * depth, Vec3::Y * height, depth_segments, height_segments),
        (Vec3::NEG_X * hw, Vec3::Z * depth, Vec3::Y * height, depth_segments, height_segments),
        (Vec3::Y * hh, Vec3::X * width, Vec3::NEG_Z * depth, width_segments, depth_segments),
        (Vec3::NEG_Y * hh, Vec3::X * width, Vec3::Z * depth, width_segments, depth_segments),
        (Vec3::Z * hd, Vec3::X * width, Vec3::Y * height, width_segments, height_segments),
        (Vec3::NEG_Z * hd, Vec3::NEG_X * width, Vec3::Y * height, width_segments, height_segments),
    ];

    for (center, u, v, us, vs) in faces {
        push_face(&mut vertices, &mut indices, center, u, v, us, vs);
    }

    Shape::new("Box", vertices, indices)
}

pub fn cube(size: f32) -> SceneResult<Shape> {
    box_shape(size, size, size, 1, 1, 1)
}

/// Rectangle in the XY plane facing +Z.
pub fn plane(width: f32, height: f32, width_segments: u32, height_segments: u32) -> SceneResult<Shape> {
    require_positive("plane width", width)?;
    require_positive("plane height", height)?;
    require_segments("plane width segments", width_segments, 1)?;
    require_segments("plane height segments", height_segments, 1)?;

    let mut vertices = Vec::new();
    let mut indices = Vec::new();
    push_face(
        &mut vertices,
        &mut indices,
        Vec3::ZERO,
        Vec3::X * width,
        Vec3::Y * height,
        width_segments,
        height_segments,
    );

    Shape::new("Plane", vertices, indices)
}

pub fn sphere(radius: f32, width_segments: u32, height_segments: u32) -> SceneResult<Shape> {
    require_positive("sphere radius", radius)?;
    require_segments("sphere width segments", width_segments, 3)?;
    require_segments("sphere height segments", height_segments, 2)?;

    let mut vertices = Vec::new();
    let mut indices = Vec::new();
    let row = width_segments + 1;

    for iy in 0..=height_segments {
        let v = iy as f32 / height_segments as f32;
        for ix in 0..=width_segments {
            let u = ix as f32 / width_segments as f32;
            let normal = Vec3::new(
                -(u * TAU).cos() * (v * PI).sin(),
                (v * PI).cos(),
                (u * TAU).sin() * (v * PI).sin(),
            );
            vertices.push(Vertex::new(normal * radius, normal.normalize_or_zero(), vec2(u, v)));
        }
    }

    for iy in 0..height_segments {
        for ix in 0..width_segments {
            let a = iy * row + ix + 1;
            let b = iy * row + ix;
            let c = (iy + 1) * row + ix;
            let d = (iy + 1) * row + ix + 1;

            if iy != 0 {
                indices.extend_from_slice(&[a, b, d]);
            }
            if iy != height_segments - 1 {
                indices.extend_from_slice(&[b, c, d]);
            }
        }
    }

    Shape::new("Sphere", vertices, indices)
}

/// Ring of radius `radius` around the Z axis with a circular tube.
pub fn torus(radius: f32, tube: f32, radial_segments: u32, tubular_segments: u32) -> SceneResult<Shape> {
    require_positive("torus radius", radius)?;
    require_positive("torus tube", tube)?;
    require_segments("torus radial segments", radial_segments, 3)?;
    require_segments("torus tubular segments", tubular_segments, 3)?;

    let mut vertices = Vec::new();
    let mut indices = Vec::new();
    let row = tubular_segments + 1;

    for j in 0..=radial_segments {
        let fv = j as f32 / radial_segments as f32;
        let v = fv * TAU;
        for i in 0..=tubular_segments {
            let fu = i as f32 / tubular_segments as f32;
            let u = fu * TAU;

            let position = Vec3::new(
                (radius + tube * v.cos()) * u.cos(),
                (radius + tube * v.cos()) * u.sin(),
                tube * v.sin(),
            );
            let center = Vec3::new(radius * u.cos(), radius * u.sin(), 0.0);
            let normal = (position - center).normalize_or_zero();
            vertices.push(Vertex::new(position, normal, vec2(fu, 1.0 - fv)));
        }
    }

    for j in 1..=radial_segments {
        for i in 1..=tubular_segments {
            let a = row * j + i - 1;
            let b = row * (j - 1) + i - 1;
            let c = row * (j - 1) + i;
            let d = row * j + i;
            indices.extend_from_slice(&[a, b, d, b, c, d]);
        }
    }

    Shape::new("Torus", vertices, indices)
}

/// Cone along Y centred on the origin, apex up, closed at the bottom.
pub fn cone(radius: f32, height: f32, radial_segments: u32) -> SceneResult<Shape> {
    require_positive("cone radius", radius)?;
    require_positive("cone height", height)?;
    require_segments("cone radial segments", radial_segments, 3)?;

    let mut vertices = Vec::new();
    let mut indices = Vec::new();
    let half_height = height / 2.0;
    let slope = radius / height;
    let row = radial_segments + 1;

    // Side: apex row then base row, one apex vertex per segment for smooth normals.
    for (y_index, ring_radius) in [(0u32, 0.0f32), (1, radius)] {
        let y = half_height - y_index as f32 * height;
        for x in 0..=radial_segments {
            let u = x as f32 / radial_segments as f32;
            let theta = u * TAU;
            let position = Vec3::new(ring_radius * theta.sin(), y, ring_radius * theta.cos());
            let normal = Vec3::new(theta.sin(), slope, theta.cos()).normalize();
            vertices.push(Vertex::new(position, normal, vec2(u, y_index as f32)));
        }
    }

    for x in 0..radial_segments {
        let b = row + x;
        let c = row + x + 1;
        let d = x + 1;
        indices.extend_from_slice(&[b, c, d]);
    }

    // Bottom cap.
    let center_index = vertices.len() as u32;
    vertices.push(Vertex::new(Vec3::new(0.0, -half_height, 0.0), Vec3::NEG_Y, vec2(0.5, 0.5)));
    let ring_start = vertices.len() as u32;
    for x in 0..=radial_segments {
        let theta = x as f32 / radial_segments as f32 * TAU;
        let (sin, cos) = theta.sin_cos();
        vertices.push(Vertex::new(
            Vec3::new(radius * sin, -half_height, radius * cos),
            Vec3::NEG_Y,
            vec2(cos * 0.5 + 0.5, sin * 0.5 + 0.5),
        ));
    }
    for x in 0..radial_segments {
        let i = ring_start + x;
        indices.extend_from_slice(&[i + 1, i, center_index]);
    }

    Shape::new("Cone", vertices, indices)
}

/// Unconnected triangles with flat normals, three positions per triangle.
pub fn triangle_soup(positions: &[Vec3]) -> SceneResult<Shape> {
    if positions.is_empty() || positions.len() % 3 != 0 {
        return Err(SceneError::invalid(format!(
            "triangle soup needs a multiple of three positions, got {}",
            positions.len()
        )));
    }

    let vertices = positions
        .chunks_exact(3)
        .flat_map(|tri| {
            let normal = (tri[1] - tri[0]).cross(tri[2] - tri[0]).normalize_or_zero();
            [
                Vertex::new(tri[0], normal, vec2(0.0, 1.0)),
                Vertex::new(tri[1], normal, vec2(1.0, 1.0)),
                Vertex::new(tri[2], normal, vec2(0.0, 0.0)),
            ]
        })
        .collect::<Vec<_>>();
    let indices = (0..vertices.len() as u32).collect();

    Shape::new("Triangles", vertices, indices)
}
