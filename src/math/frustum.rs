use glam::Mat4;

use crate::math::plane::Plane;

#[derive(Debug, Copy, Clone)]
pub struct Frustum {
    // Planes are in the order: left, right, bottom, top, near, far
    pub planes: [Plane; 6],
}

impl Frustum {
    /// Extracts the clip planes of a view-projection matrix with a 0..1 depth
    /// range.
    pub fn from_view_projection(view_projection: Mat4) -> Frustum {
        let x = view_projection.row(0);
        let y = view_projection.row(1);
        let z = view_projection.row(2);
        let w = view_projection.row(3);

        Frustum {
            planes: [
                Plane::from_coefficients(w + x),
                Plane::from_coefficients(w - x),
                Plane::from_coefficients(w + y),
                Plane::from_coefficients(w - y),
                Plane::from_coefficients(z),
                Plane::from_coefficients(w - z),
            ],
        }
    }
}
