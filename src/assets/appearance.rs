use id_arena::Id;

use crate::assets::color::Color;
use crate::assets::texture::TextureId;

pub type AppearanceId = Id<Appearance>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShadingModel {
    /// Unlit flat color.
    Basic,
    /// Diffuse only.
    Lambert,
    /// Physically based roughness/metalness.
    Standard,
    /// Visualizes view-space normals.
    Normal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Side {
    #[default]
    Front,
    Back,
    Double,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextureMaps {
    pub color: Option<TextureId>,
    pub alpha: Option<TextureId>,
    pub ambient_occlusion: Option<TextureId>,
    pub roughness: Option<TextureId>,
    pub metalness: Option<TextureId>,
    pub normal: Option<TextureId>,
    pub displacement: Option<TextureId>,
}

impl TextureMaps {
    pub fn iter(&self) -> impl Iterator<Item = TextureId> {
        [
            self.color,
            self.alpha,
            self.ambient_occlusion,
            self.roughness,
            self.metalness,
            self.normal,
            self.displacement,
        ]
        .into_iter()
        .flatten()
    }
}

/// Mutable shading parameters shared by any number of renderables.
#[derive(Debug, Clone)]
pub struct Appearance {
    pub name: String,
    pub shading: ShadingModel,
    pub color: Color,
    pub opacity: f32,
    pub transparent: bool,
    pub wireframe: bool,
    pub side: Side,
    pub roughness: f32,
    pub metalness: f32,
    pub maps: TextureMaps,
    pub displacement_scale: f32,
    pub displacement_bias: f32,
    pub(crate) disposed: bool,
}

impl Appearance {
    pub fn new(shading: ShadingModel, color: Color) -> Self {
        Self {
            name: String::new(),
            shading,
            color,
            opacity: 1.0,
            transparent: false,
            wireframe: false,
            side: Side::Front,
            roughness: 1.0,
            metalness: 0.0,
            maps: TextureMaps::default(),
            displacement_scale: 1.0,
            displacement_bias: 0.0,
            disposed: false,
        }
    }

    pub fn basic(color: Color) -> Self {
        Self::new(ShadingModel::Basic, color)
    }

    pub fn lambert(color: Color) -> Self {
        Self::new(ShadingModel::Lambert, color)
    }

    pub fn standard(color: Color) -> Self {
        Self::new(ShadingModel::Standard, color)
    }

    pub fn normal() -> Self {
        Self::new(ShadingModel::Normal, Color::WHITE)
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_color_map(mut self, texture: TextureId) -> Self {
        self.maps.color = Some(texture);
        self
    }

    pub fn with_maps(mut self, maps: TextureMaps) -> Self {
        self.maps = maps;
        self
    }

    pub fn with_wireframe(mut self, wireframe: bool) -> Self {
        self.wireframe = wireframe;
        self
    }

    pub fn with_side(mut self, side: Side) -> Self {
        self.side = side;
        self
    }

    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity.clamp(0.0, 1.0);
        self.transparent = true;
        self
    }

    pub fn with_roughness_metalness(mut self, roughness: f32, metalness: f32) -> Self {
        self.roughness = roughness.clamp(0.0, 1.0);
        self.metalness = metalness.clamp(0.0, 1.0);
        self
    }

    /// Whether the item has to be blended and drawn after opaque geometry.
    pub fn is_blended(&self) -> bool {
        self.transparent && (self.opacity < 1.0 || self.maps.alpha.is_some())
    }
}

impl Default for Appearance {
    fn default() -> Self {
        Self::basic(Color::WHITE)
    }
}
