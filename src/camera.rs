use std::cell::Cell;

use glam::{Mat4, Vec3};

use crate::error::{SceneError, SceneResult};
use crate::scene_graph::{Node, NodeId, Scene};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    Perspective {
        /// Vertical field of view in degrees.
        fov_y: f32,
        near: f32,
        far: f32,
    },
    Orthographic {
        left: f32,
        right: f32,
        top: f32,
        bottom: f32,
        near: f32,
        far: f32,
    },
}

impl Projection {
    pub const DEFAULT_FOV: f32 = 50.0;
    pub const DEFAULT_NEAR: f32 = 0.1;
    pub const DEFAULT_FAR: f32 = 2000.0;

    pub fn near(&self) -> f32 {
        match *self {
            Projection::Perspective { near, .. } | Projection::Orthographic { near, .. } => near,
        }
    }

    pub fn far(&self) -> f32 {
        match *self {
            Projection::Perspective { far, .. } | Projection::Orthographic { far, .. } => far,
        }
    }

    fn validate(&self, aspect: f32) -> SceneResult<()> {
        if !aspect.is_finite() || aspect <= 0.0 {
            return Err(SceneError::invalid(format!("aspect must be positive, got {aspect}")));
        }

        match *self {
            Projection::Perspective { fov_y, near, far } => {
                if ![fov_y, near, far].iter().all(|v| v.is_finite()) {
                    return Err(SceneError::invalid("perspective parameters must be finite"));
                }
                if fov_y <= 0.0 || fov_y >= 180.0 {
                    return Err(SceneError::invalid(format!(
                        "field of view must be within (0, 180) degrees, got {fov_y}"
                    )));
                }
                if near <= 0.0 {
                    return Err(SceneError::invalid(format!("near must be positive, got {near}")));
                }
                if near >= far {
                    return Err(SceneError::invalid(format!(
                        "near ({near}) must be less than far ({far})"
                    )));
                }
            }
            Projection::Orthographic {
                left,
                right,
                top,
                bottom,
                near,
                far,
            } => {
                if ![left, right, top, bottom, near, far].iter().all(|v| v.is_finite()) {
                    return Err(SceneError::invalid("orthographic parameters must be finite"));
                }
                if left == right || top == bottom {
                    return Err(SceneError::invalid(format!(
                        "degenerate orthographic box [{left}, {right}] x [{bottom}, {top}]"
                    )));
                }
                if near >= far {
                    return Err(SceneError::invalid(format!(
                        "near ({near}) must be less than far ({far})"
                    )));
                }
            }
        }

        Ok(())
    }

    /// Right-handed, depth mapped to 0..1.
    fn matrix(&self, aspect: f32) -> Mat4 {
        match *self {
            Projection::Perspective { fov_y, near, far } => {
                Mat4::perspective_rh(fov_y.to_radians(), aspect, near, far)
            }
            Projection::Orthographic {
                left,
                right,
                top,
                bottom,
                near,
                far,
            } => Mat4::orthographic_rh(left, right, bottom, top, near, far),
        }
    }

    /// Keeps the vertical extent and refits left/right around their centre.
    fn refit(self, aspect: f32) -> Projection {
        match self {
            Projection::Orthographic {
                left,
                right,
                top,
                bottom,
                near,
                far,
            } => {
                let center = (left + right) * 0.5;
                let half_width = (top - bottom).abs() * 0.5 * aspect * (right - left).signum();
                Projection::Orthographic {
                    left: center - half_width,
                    right: center + half_width,
                    top,
                    bottom,
                    near,
                    far,
                }
            }
            perspective => perspective,
        }
    }
}

impl Default for Projection {
    fn default() -> Self {
        Projection::Perspective {
            fov_y: Self::DEFAULT_FOV,
            near: Self::DEFAULT_NEAR,
            far: Self::DEFAULT_FAR,
        }
    }
}

/// A projection attached to a scene node.
///
/// The node carries the camera's position and orientation; the projection
/// matrix is only rebuilt after a parameter or the aspect changed.
pub struct Camera {
    node: NodeId,
    projection: Projection,
    aspect: f32,
    projection_matrix: Cell<Mat4>,
    projection_dirty: Cell<bool>,
    recomputations: Cell<u64>,
}

impl Camera {
    /// Creates a detached camera node with the default perspective projection.
    pub fn new(scene: &mut Scene) -> Self {
        let node = scene.add_node(Node::new("Camera"));
        Self::with_node(node)
    }

    pub fn with_node(node: NodeId) -> Self {
        Self {
            node,
            projection: Projection::default(),
            aspect: 1.0,
            projection_matrix: Cell::new(Mat4::IDENTITY),
            projection_dirty: Cell::new(true),
            recomputations: Cell::new(0),
        }
    }

    pub fn perspective(scene: &mut Scene, fov_y: f32, aspect: f32, near: f32, far: f32) -> SceneResult<Self> {
        let mut camera = Self::new(scene);
        camera.set_perspective(fov_y, aspect, near, far)?;
        Ok(camera)
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn projection(&self) -> Projection {
        self.projection
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    /// How often the projection matrix has been rebuilt.
    pub fn recomputations(&self) -> u64 {
        self.recomputations.get()
    }

    fn apply(&mut self, projection: Projection, aspect: f32) -> SceneResult<()> {
        projection.validate(aspect)?;
        if projection != self.projection || aspect != self.aspect {
            self.projection = projection;
            self.aspect = aspect;
            self.projection_dirty.set(true);
        }
        Ok(())
    }

    pub fn set_perspective(&mut self, fov_y: f32, aspect: f32, near: f32, far: f32) -> SceneResult<()> {
        self.apply(Projection::Perspective { fov_y, near, far }, aspect)
    }

    pub fn set_orthographic(
        &mut self,
        left: f32,
        right: f32,
        top: f32,
        bottom: f32,
        near: f32,
        far: f32,
    ) -> SceneResult<()> {
        let projection = Projection::Orthographic {
            left,
            right,
            top,
            bottom,
            near,
            far,
        };
        // The box already encodes the aspect.
        let aspect = ((right - left) / (top - bottom)).abs();
        let aspect = if aspect.is_finite() && aspect > 0.0 {
            aspect
        } else {
            self.aspect
        };
        self.apply(projection, aspect)
    }

    pub fn set_aspect(&mut self, aspect: f32) -> SceneResult<()> {
        if !aspect.is_finite() || aspect <= 0.0 {
            return Err(SceneError::invalid(format!("aspect must be positive, got {aspect}")));
        }
        self.apply(self.projection.refit(aspect), aspect)
    }

    pub fn set_fov(&mut self, new_fov: f32) -> SceneResult<()> {
        match self.projection {
            Projection::Perspective { near, far, .. } => self.apply(
                Projection::Perspective {
                    fov_y: new_fov,
                    near,
                    far,
                },
                self.aspect,
            ),
            Projection::Orthographic { .. } => Err(SceneError::invalid(
                "orthographic cameras have no field of view",
            )),
        }
    }

    pub fn set_near(&mut self, new_near: f32) -> SceneResult<()> {
        let mut projection = self.projection;
        match &mut projection {
            Projection::Perspective { near, .. } | Projection::Orthographic { near, .. } => {
                *near = new_near
            }
        }
        self.apply(projection, self.aspect)
    }

    pub fn set_far(&mut self, new_far: f32) -> SceneResult<()> {
        let mut projection = self.projection;
        match &mut projection {
            Projection::Perspective { far, .. } | Projection::Orthographic { far, .. } => {
                *far = new_far
            }
        }
        self.apply(projection, self.aspect)
    }

    pub fn is_projection_dirty(&self) -> bool {
        self.projection_dirty.get()
    }

    pub fn projection_matrix(&self) -> Mat4 {
        if self.projection_dirty.get() {
            self.projection_matrix.set(self.projection.matrix(self.aspect));
            self.projection_dirty.set(false);
            self.recomputations.set(self.recomputations.get() + 1);
        }

        self.projection_matrix.get()
    }

    pub fn view_matrix(&self, scene: &Scene) -> SceneResult<Mat4> {
        Ok(scene.world_matrix(self.node)?.inverse())
    }

    pub fn view_projection(&self, scene: &Scene) -> SceneResult<Mat4> {
        Ok(self.projection_matrix() * self.view_matrix(scene)?)
    }

    pub fn position(&self, scene: &Scene) -> SceneResult<Vec3> {
        scene.world_position(self.node)
    }

    pub fn set_position(&self, scene: &mut Scene, position: Vec3) -> SceneResult<()> {
        scene.set_position(self.node, position)
    }

    /// Points the camera at `target` once; not a standing constraint.
    pub fn look_at(&self, scene: &mut Scene, target: Vec3) -> SceneResult<()> {
        scene.look_at(self.node, target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 1e-5;

    fn create_camera() -> (Scene, Camera) {
        let mut scene = Scene::new();
        let camera = Camera::new(&mut scene);
        scene.attach(scene.root(), camera.node()).unwrap();
        (scene, camera)
    }

    #[test]
    fn test_default_projection() {
        let (_, camera) = create_camera();
        assert_eq!(camera.projection(), Projection::default());
        assert_eq!(camera.aspect(), 1.0);
        let expected = Mat4::perspective_rh(50f32.to_radians(), 1.0, 0.1, 2000.0);
        assert!(camera.projection_matrix().abs_diff_eq(expected, EPSILON));
    }

    #[test]
    fn test_near_beyond_far_is_rejected() {
        let (_, mut camera) = create_camera();
        let before = camera.projection_matrix();

        let result = camera.set_perspective(75.0, 1.0, 5.0, 1.0);
        assert!(matches!(result, Err(SceneError::InvalidParameter(_))));
        assert_eq!(camera.projection(), Projection::default());
        assert_eq!(camera.projection_matrix(), before);

        let mut scene = Scene::new();
        assert!(Camera::perspective(&mut scene, 75.0, 1.0, 5.0, 1.0).is_err());
    }

    #[test]
    fn test_invalid_perspective_parameters() {
        let (_, mut camera) = create_camera();
        assert!(camera.set_perspective(75.0, 1.0, 0.0, 10.0).is_err());
        assert!(camera.set_perspective(0.0, 1.0, 0.1, 10.0).is_err());
        assert!(camera.set_perspective(180.0, 1.0, 0.1, 10.0).is_err());
        assert!(camera.set_perspective(75.0, 0.0, 0.1, 10.0).is_err());
        assert!(camera.set_perspective(f32::NAN, 1.0, 0.1, 10.0).is_err());
        assert_eq!(camera.projection(), Projection::default());
    }

    #[test]
    fn test_degenerate_orthographic_box() {
        let (_, mut camera) = create_camera();
        assert!(camera.set_orthographic(1.0, 1.0, 1.0, -1.0, 0.1, 100.0).is_err());
        assert!(camera.set_orthographic(-1.0, 1.0, 1.0, 1.0, 0.1, 100.0).is_err());
        assert!(camera.set_orthographic(-1.0, 1.0, 1.0, -1.0, 100.0, 0.1).is_err());
        assert_eq!(camera.projection(), Projection::default());
    }

    #[test]
    fn test_projection_recomputed_only_when_dirty() {
        let (_, mut camera) = create_camera();
        camera.projection_matrix();
        camera.projection_matrix();
        assert_eq!(camera.recomputations(), 1);

        camera.set_aspect(16.0 / 9.0).unwrap();
        assert!(camera.is_projection_dirty());
        camera.projection_matrix();
        assert_eq!(camera.recomputations(), 2);

        // Same value again does not dirty the matrix.
        camera.set_aspect(16.0 / 9.0).unwrap();
        assert!(!camera.is_projection_dirty());
    }

    #[test]
    fn test_orthographic_aspect_keeps_vertical_extent() {
        let (_, mut camera) = create_camera();
        camera
            .set_orthographic(-1.0, 1.0, 1.0, -1.0, 0.1, 100.0)
            .unwrap();
        camera.set_aspect(2.0).unwrap();

        match camera.projection() {
            Projection::Orthographic {
                left,
                right,
                top,
                bottom,
                ..
            } => {
                assert!((left + 2.0).abs() < EPSILON);
                assert!((right - 2.0).abs() < EPSILON);
                assert_eq!((top, bottom), (1.0, -1.0));
            }
            other => panic!("unexpected projection {other:?}"),
        }
    }

    #[test]
    fn test_view_matrix_is_inverse_world() {
        let (mut scene, camera) = create_camera();
        camera.set_position(&mut scene, Vec3::new(0.0, 0.0, 3.0)).unwrap();
        let view = camera.view_matrix(&scene).unwrap();
        let origin_in_view = view.transform_point3(Vec3::ZERO);
        assert!(origin_in_view.abs_diff_eq(Vec3::new(0.0, 0.0, -3.0), EPSILON));
    }

    #[test]
    fn test_look_at_faces_target() {
        let (mut scene, camera) = create_camera();
        camera.set_position(&mut scene, Vec3::new(1.0, 1.0, 3.0)).unwrap();
        let target = Vec3::new(0.0, 0.5, 0.0);
        camera.look_at(&mut scene, target).unwrap();

        let view = camera.view_matrix(&scene).unwrap();
        let target_in_view = view.transform_point3(target);
        // Directly ahead on the -Z axis.
        assert!(target_in_view.x.abs() < 1e-4);
        assert!(target_in_view.y.abs() < 1e-4);
        assert!(target_in_view.z < 0.0);

        // Position is unchanged.
        let position = camera.position(&scene).unwrap();
        assert!(position.abs_diff_eq(Vec3::new(1.0, 1.0, 3.0), EPSILON));
    }
}
