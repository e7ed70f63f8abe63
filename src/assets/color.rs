use glam::Vec3;

use crate::error::{SceneError, SceneResult};

/// An sRGB color with components in `0..=1`, as written in hex notation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::new(0.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    pub fn from_hex(hex: u32) -> Self {
        Self::new(
            ((hex >> 16) & 0xff) as f32 / 255.0,
            ((hex >> 8) & 0xff) as f32 / 255.0,
            (hex & 0xff) as f32 / 255.0,
        )
    }

    /// Parses `#rrggbb` or `rrggbb`.
    pub fn from_css(css: &str) -> SceneResult<Self> {
        let digits = css.trim().trim_start_matches('#');
        if digits.len() != 6 {
            return Err(SceneError::invalid(format!("color {css:?} is not #rrggbb")));
        }

        u32::from_str_radix(digits, 16)
            .map(Self::from_hex)
            .map_err(|_| SceneError::invalid(format!("color {css:?} is not #rrggbb")))
    }

    pub fn to_hex(self) -> u32 {
        let channel = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u32;
        (channel(self.r) << 16) | (channel(self.g) << 8) | channel(self.b)
    }

    /// Linear-light components for shading.
    pub fn to_linear(self) -> Vec3 {
        fn decode(c: f32) -> f32 {
            if c <= 0.04045 {
                c / 12.92
            } else {
                ((c + 0.055) / 1.055).powf(2.4)
            }
        }

        Vec3::new(decode(self.r), decode(self.g), decode(self.b))
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }

    pub fn from_array([r, g, b]: [f32; 3]) -> Self {
        Self::new(r, g, b)
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::WHITE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_round_trip() {
        let color = Color::from_hex(0x3a63a6);
        assert_eq!(color.to_hex(), 0x3a63a6);
        assert!((color.r - 0x3a as f32 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn test_parses_css_notation() {
        assert_eq!(Color::from_css("#ff0000").unwrap(), Color::new(1.0, 0.0, 0.0));
        assert_eq!(Color::from_css("86cdff").unwrap().to_hex(), 0x86cdff);
        assert!(Color::from_css("#fff").is_err());
        assert!(Color::from_css("#gg0000").is_err());
    }

    #[test]
    fn test_linear_conversion_keeps_extremes() {
        assert_eq!(Color::WHITE.to_linear(), Vec3::ONE);
        assert_eq!(Color::BLACK.to_linear(), Vec3::ZERO);
        assert!(Color::new(0.5, 0.5, 0.5).to_linear().x < 0.25);
    }
}
