use glam::Vec3;

use crate::assets::Color;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightKind {
    /// Uniform light from every direction.
    Ambient,
    /// Sky color from above blending into `ground_color` from below.
    Hemisphere { ground_color: Color },
    /// Parallel rays from the node position towards `target` (world space).
    Directional { target: Vec3 },
    /// Emits in every direction from the node position. A `distance` of zero
    /// means no cutoff.
    Point { distance: f32, decay: f32 },
    /// Cone from the node position towards `target`; `angle` is the half
    /// angle in radians and `penumbra` the fraction of it that fades out.
    Spot {
        distance: f32,
        angle: f32,
        penumbra: f32,
        decay: f32,
        target: Vec3,
    },
    /// `width`×`height` rectangle centred on the node, emitting from its
    /// front face towards `target`. Only lights standard-shaded surfaces.
    RectArea { width: f32, height: f32, target: Vec3 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    pub color: Color,
    pub intensity: f32,
    pub kind: LightKind,
}

impl Light {
    pub fn ambient(color: Color, intensity: f32) -> Self {
        Self {
            color,
            intensity,
            kind: LightKind::Ambient,
        }
    }

    pub fn hemisphere(sky: Color, ground: Color, intensity: f32) -> Self {
        Self {
            color: sky,
            intensity,
            kind: LightKind::Hemisphere {
                ground_color: ground,
            },
        }
    }

    pub fn directional(color: Color, intensity: f32) -> Self {
        Self {
            color,
            intensity,
            kind: LightKind::Directional { target: Vec3::ZERO },
        }
    }

    pub fn point(color: Color, intensity: f32, distance: f32, decay: f32) -> Self {
        Self {
            color,
            intensity,
            kind: LightKind::Point { distance, decay },
        }
    }

    pub fn spot(color: Color, intensity: f32, distance: f32, angle: f32, penumbra: f32) -> Self {
        Self {
            color,
            intensity,
            kind: LightKind::Spot {
                distance,
                angle,
                penumbra,
                decay: 2.0,
                target: Vec3::ZERO,
            },
        }
    }

    pub fn rect_area(color: Color, intensity: f32, width: f32, height: f32) -> Self {
        Self {
            color,
            intensity,
            kind: LightKind::RectArea {
                width,
                height,
                target: Vec3::ZERO,
            },
        }
    }

    pub fn set_target(&mut self, new_target: Vec3) {
        match &mut self.kind {
            LightKind::Directional { target }
            | LightKind::Spot { target, .. }
            | LightKind::RectArea { target, .. } => {
                *target = new_target;
            }
            _ => log::warn!("Light {:?} has no target", self.kind),
        }
    }
}
