use glam::{Mat3, Mat4, Vec3};

use crate::math::{frustum::Frustum, plane::Plane};

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BoundingSphere {
    pub center: Vec3,
    pub radius: f32,
}

impl BoundingSphere {
    /// Sphere around the AABB centre of the points.
    pub fn from_points(points: impl IntoIterator<Item = Vec3> + Clone) -> BoundingSphere {
        let Some(aabb) = AABB::from_points(points.clone()) else {
            return BoundingSphere {
                center: Vec3::ZERO,
                radius: 0.0,
            };
        };

        let center = aabb.center();
        let radius = points
            .into_iter()
            .map(|point| point.distance(center))
            .fold(0.0, f32::max);

        BoundingSphere { center, radius }
    }

    fn signed_distance_to_plane(&self, plane: &Plane) -> f32 {
        plane.signed_distance_to_point(self.center) + self.radius
    }

    pub fn transform(&self, matrix: &Mat4) -> BoundingSphere {
        let center = matrix.transform_point3(self.center);
        let radius = self.radius * max_stretch(&Mat3::from_mat4(*matrix));
        BoundingSphere { center, radius }
    }

    pub fn intersects_frustum(&self, frustum: &Frustum) -> bool {
        frustum
            .planes
            .iter()
            .all(|plane| self.signed_distance_to_plane(plane) >= 0.0)
    }
}

/// Largest factor by which `matrix` lengthens any vector, i.e. its largest
/// singular value. Holds for sheared matrices too.
fn max_stretch(matrix: &Mat3) -> f32 {
    let columns = [matrix.x_axis, matrix.y_axis, matrix.z_axis];
    let longest_column = columns.iter().map(|c| c.length()).fold(0.0, f32::max);
    let frobenius = columns.iter().map(|c| c.length_squared()).sum::<f32>().sqrt();

    // Largest eigenvalue of the symmetric MᵀM, closed form.
    let gram = matrix.transpose() * *matrix;
    let [a00, a01, a02] = gram.x_axis.to_array();
    let [_, a11, a12] = gram.y_axis.to_array();
    let a22 = gram.z_axis.z;

    let off_diagonal = a01 * a01 + a02 * a02 + a12 * a12;
    let trace = a00 + a11 + a22;
    let stretch = if off_diagonal <= (f32::EPSILON * trace).powi(2) {
        a00.max(a11).max(a22).max(0.0).sqrt()
    } else {
        let q = trace / 3.0;
        let p2 = (a00 - q).powi(2) + (a11 - q).powi(2) + (a22 - q).powi(2) + 2.0 * off_diagonal;
        let p = (p2 / 6.0).sqrt();
        let b = (gram - Mat3::from_diagonal(Vec3::splat(q))) * (1.0 / p);
        let r = (b.determinant() * 0.5).clamp(-1.0, 1.0);
        let eigenvalue = q + 2.0 * p * (r.acos() / 3.0).cos();
        // Slack for f32 rounding in the closed form.
        eigenvalue.max(0.0).sqrt() * (1.0 + 1e-4)
    };

    // Never below the longest column, never above the Frobenius norm.
    stretch.clamp(longest_column, frobenius.max(longest_column))
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct AABB {
    pub min: Vec3,
    pub max: Vec3,
}

impl AABB {
    pub fn new(point1: Vec3, point2: Vec3) -> AABB {
        let min = point1.min(point2);
        let max = point1.max(point2);
        AABB { min, max }
    }

    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<AABB> {
        let mut points = points.into_iter();
        let first = points.next()?;

        Some(points.fold(AABB::new(first, first), |aabb, point| AABB {
            min: aabb.min.min(point),
            max: aabb.max.max(point),
        }))
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounding_sphere_encloses_points() {
        let points = [Vec3::new(-1.0, 0.0, 0.0), Vec3::new(3.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 0.0)];
        let sphere = BoundingSphere::from_points(points);
        assert!((sphere.center - Vec3::new(1.0, 0.5, 0.0)).length() < 1e-6);
        for point in points {
            assert!(point.distance(sphere.center) <= sphere.radius + 1e-6);
        }
    }

    #[test]
    fn test_transformed_sphere_uses_largest_scale() {
        let sphere = BoundingSphere {
            center: Vec3::X,
            radius: 1.0,
        };
        let matrix = Mat4::from_scale_rotation_translation(
            Vec3::new(1.0, 3.0, 2.0),
            glam::Quat::IDENTITY,
            Vec3::new(0.0, 0.0, 5.0),
        );
        let transformed = sphere.transform(&matrix);
        assert!((transformed.center - Vec3::new(1.0, 0.0, 5.0)).length() < 1e-6);
        assert!((transformed.radius - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_sheared_transform_still_encloses_shape() {
        let corners: Vec<Vec3> = (0..8)
            .map(|i| {
                Vec3::new(
                    if i & 1 == 0 { -0.5 } else { 0.5 },
                    if i & 2 == 0 { -0.5 } else { 0.5 },
                    if i & 4 == 0 { -0.5 } else { 0.5 },
                )
            })
            .collect();
        let sphere = BoundingSphere::from_points(corners.iter().copied());

        let parent = Mat4::from_scale(Vec3::new(1.0, 10.0, 1.0));
        let child = Mat4::from_rotation_z(std::f32::consts::FRAC_PI_4);
        let world = parent * child;

        let transformed = sphere.transform(&world);
        let farthest = corners
            .iter()
            .map(|corner| world.transform_point3(*corner).distance(transformed.center))
            .fold(0.0, f32::max);
        assert!(
            transformed.radius >= farthest,
            "radius {} vs farthest corner {}",
            transformed.radius,
            farthest
        );
        // Still tighter than the Frobenius bound.
        assert!(transformed.radius < sphere.radius * 10.1);
    }

    #[test]
    fn test_rotation_keeps_radius() {
        let sphere = BoundingSphere {
            center: Vec3::ZERO,
            radius: 2.0,
        };
        let matrix = Mat4::from_rotation_y(0.7) * Mat4::from_scale(Vec3::splat(1.5));
        assert!((sphere.transform(&matrix).radius - 3.0).abs() < 1e-3);
    }
}
