use std::f32::consts::{PI, TAU};

use glam::Vec3;

use crate::camera::Camera;
use crate::error::SceneResult;
use crate::scene_graph::Scene;
use crate::stage::Pointer;
use crate::viewport::Viewport;

const EPSILON: f32 = 1e-6;

/// Camera offset from the orbit target, y up.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Spherical {
    radius: f32,
    /// Azimuth around +y, measured from +z towards +x.
    theta: f32,
    /// Polar angle from +y.
    phi: f32,
}

impl Spherical {
    fn from_offset(offset: Vec3) -> Self {
        let radius = offset.length();
        if radius < EPSILON {
            return Self {
                radius: 0.0,
                theta: 0.0,
                phi: 0.0,
            };
        }

        Self {
            radius,
            theta: offset.x.atan2(offset.z),
            phi: (offset.y / radius).clamp(-1.0, 1.0).acos(),
        }
    }

    fn to_offset(self) -> Vec3 {
        let sin_phi = self.phi.sin();
        Vec3::new(
            self.radius * sin_phi * self.theta.sin(),
            self.radius * self.phi.cos(),
            self.radius * sin_phi * self.theta.cos(),
        )
    }
}

/// Orbits a camera around a target point. Dragging rotates, scrolling
/// dollies in and out.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub target: Vec3,
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,

    theta_delta: f32,
    phi_delta: f32,
    scale: f32,
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            enable_damping: false,
            damping_factor: 0.05,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            min_polar_angle: 0.0,
            max_polar_angle: PI,
            theta_delta: 0.0,
            phi_delta: 0.0,
            scale: 1.0,
        }
    }
}

impl OrbitControls {
    pub fn damped() -> Self {
        Self {
            enable_damping: true,
            ..Default::default()
        }
    }

    /// Turns the camera left around the target by `angle` radians.
    pub fn rotate_left(&mut self, angle: f32) {
        self.theta_delta -= angle;
    }

    pub fn rotate_up(&mut self, angle: f32) {
        self.phi_delta -= angle;
    }

    /// Moves the camera away from the target; `factor` > 1 zooms out.
    pub fn dolly(&mut self, factor: f32) {
        if factor > 0.0 {
            self.scale *= factor;
        }
    }

    fn zoom_scale(&self) -> f32 {
        0.95f32.powf(self.zoom_speed)
    }

    /// Turns pointer drag and scroll accumulated since the last call into
    /// pending rotation and zoom.
    pub fn consume_pointer(&mut self, pointer: &mut Pointer, viewport: &Viewport) {
        let drag = pointer.take_drag();
        if drag != glam::Vec2::ZERO {
            let height = viewport.height() as f32;
            self.rotate_left(TAU * drag.x / height * self.rotate_speed);
            self.rotate_up(TAU * drag.y / height * self.rotate_speed);
        }

        let scroll = pointer.take_scroll();
        if scroll > 0.0 {
            self.dolly(1.0 / self.zoom_scale());
        } else if scroll < 0.0 {
            self.dolly(self.zoom_scale());
        }
    }

    /// Applies pending rotation and zoom to the camera and aims it at the
    /// target. Returns true if the camera moved.
    pub fn update(&mut self, scene: &mut Scene, camera: &Camera) -> SceneResult<bool> {
        let position = camera.position(scene)?;
        let offset = position - self.target;
        let mut spherical = Spherical::from_offset(offset);

        let damping = if self.enable_damping {
            self.damping_factor
        } else {
            1.0
        };
        spherical.theta += self.theta_delta * damping;
        spherical.phi += self.phi_delta * damping;

        let min_phi = self.min_polar_angle.max(EPSILON);
        let max_phi = self.max_polar_angle.min(PI - EPSILON);
        spherical.phi = spherical.phi.clamp(min_phi, max_phi.max(min_phi));

        spherical.radius = (spherical.radius * self.scale).clamp(self.min_distance, self.max_distance);

        let new_position = self.target + spherical.to_offset();
        camera.set_position(scene, new_position)?;
        camera.look_at(scene, self.target)?;

        if self.enable_damping {
            self.theta_delta *= 1.0 - self.damping_factor;
            self.phi_delta *= 1.0 - self.damping_factor;
        } else {
            self.theta_delta = 0.0;
            self.phi_delta = 0.0;
        }
        self.scale = 1.0;

        Ok(new_position.distance_squared(position) > EPSILON)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup(position: Vec3) -> (Scene, Camera) {
        let mut scene = Scene::new();
        let camera = Camera::new(&mut scene);
        scene.attach(scene.root(), camera.node()).unwrap();
        camera.set_position(&mut scene, position).unwrap();
        (scene, camera)
    }

    #[test]
    fn test_undamped_rotation_is_applied_at_once() {
        let (mut scene, camera) = setup(Vec3::new(0.0, 0.0, 3.0));
        let mut controls = OrbitControls::default();

        controls.rotate_left(-PI / 2.0);
        assert!(controls.update(&mut scene, &camera).unwrap());

        let position = camera.position(&scene).unwrap();
        assert!(position.distance(Vec3::new(3.0, 0.0, 0.0)) < 1e-4, "{position}");
        assert!(!controls.update(&mut scene, &camera).unwrap());
    }

    #[test]
    fn test_damping_converges_towards_requested_rotation() {
        let (mut scene, camera) = setup(Vec3::new(0.0, 0.0, 3.0));
        let mut controls = OrbitControls::damped();

        controls.rotate_left(-PI / 2.0);
        controls.update(&mut scene, &camera).unwrap();
        let first = camera.position(&scene).unwrap();
        assert!(first.distance(Vec3::new(3.0, 0.0, 0.0)) > 1.0);

        for _ in 0..400 {
            controls.update(&mut scene, &camera).unwrap();
        }
        let settled = camera.position(&scene).unwrap();
        assert!(settled.distance(Vec3::new(3.0, 0.0, 0.0)) < 1e-2, "{settled}");
        assert!((settled.length() - 3.0).abs() < 1e-3);
    }

    #[test]
    fn test_polar_angle_and_distance_are_clamped() {
        let (mut scene, camera) = setup(Vec3::new(0.0, 0.0, 5.0));
        let mut controls = OrbitControls {
            min_distance: 2.0,
            max_distance: 6.0,
            max_polar_angle: PI / 2.0,
            ..Default::default()
        };

        controls.rotate_up(-PI);
        controls.dolly(10.0);
        controls.update(&mut scene, &camera).unwrap();

        let position = camera.position(&scene).unwrap();
        assert!(position.y >= -1e-4, "{position}");
        assert!((position.length() - 6.0).abs() < 1e-3);
    }

    #[test]
    fn test_camera_faces_target_after_update() {
        let (mut scene, camera) = setup(Vec3::new(1.0, 2.0, 3.0));
        let mut controls = OrbitControls::default();
        controls.update(&mut scene, &camera).unwrap();

        let view = camera.view_matrix(&scene).unwrap();
        let target_in_view = view.transform_point3(Vec3::ZERO);
        assert!(target_in_view.x.abs() < 1e-4 && target_in_view.y.abs() < 1e-4);
        assert!(target_in_view.z < 0.0);
    }

    #[test]
    fn test_pointer_scroll_zooms() {
        let (mut scene, camera) = setup(Vec3::new(0.0, 0.0, 4.0));
        let viewport = Viewport::new(800, 600, 1.0, 2.0).unwrap();
        let mut pointer = Pointer::default();
        let mut controls = OrbitControls::default();

        pointer.add_scroll(-1.0);
        controls.consume_pointer(&mut pointer, &viewport);
        controls.update(&mut scene, &camera).unwrap();

        let distance = camera.position(&scene).unwrap().length();
        assert!((distance - 3.8).abs() < 1e-4);
        assert_eq!(pointer.take_scroll(), 0.0);
    }
}
