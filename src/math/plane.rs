use glam::{Vec3, Vec4};

/// A plane `normal · p + distance = 0`, normal pointing to the inside.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Plane {
    pub normal: Vec3,
    pub distance: f32,
}

impl Plane {
    /// Builds a plane from packed `(a, b, c, d)` coefficients, normalized.
    pub fn from_coefficients(coefficients: Vec4) -> Plane {
        let normal = coefficients.truncate();
        let length = normal.length();
        if length <= f32::EPSILON {
            return Plane {
                normal: Vec3::ZERO,
                distance: coefficients.w,
            };
        }

        Plane {
            normal: normal / length,
            distance: coefficients.w / length,
        }
    }

    pub fn signed_distance_to_point(&self, point: Vec3) -> f32 {
        self.normal.dot(point) + self.distance
    }
}
