use crate::error::{SceneError, SceneResult};

/// Logical output size plus device pixel ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    width: u32,
    height: u32,
    device_pixel_ratio: f64,
    pixel_ratio_cap: f64,
}

impl Viewport {
    pub fn new(width: u32, height: u32, device_pixel_ratio: f64, pixel_ratio_cap: f64) -> SceneResult<Self> {
        if !pixel_ratio_cap.is_finite() || pixel_ratio_cap <= 0.0 {
            return Err(SceneError::invalid(format!(
                "pixel ratio cap must be positive, got {pixel_ratio_cap}"
            )));
        }

        let mut viewport = Self {
            width: 1,
            height: 1,
            device_pixel_ratio: 1.0,
            pixel_ratio_cap,
        };
        viewport.resize(width, height, device_pixel_ratio)?;
        Ok(viewport)
    }

    /// Rejects zero sizes and non-positive ratios, keeping the previous size.
    pub fn resize(&mut self, width: u32, height: u32, device_pixel_ratio: f64) -> SceneResult<()> {
        if width == 0 || height == 0 {
            return Err(SceneError::invalid(format!(
                "viewport size must be non-zero, got {width}x{height}"
            )));
        }
        if !device_pixel_ratio.is_finite() || device_pixel_ratio <= 0.0 {
            return Err(SceneError::invalid(format!(
                "device pixel ratio must be positive, got {device_pixel_ratio}"
            )));
        }

        self.width = width;
        self.height = height;
        self.device_pixel_ratio = device_pixel_ratio;
        Ok(())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn device_pixel_ratio(&self) -> f64 {
        self.device_pixel_ratio
    }

    pub fn pixel_ratio_cap(&self) -> f64 {
        self.pixel_ratio_cap
    }

    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    pub fn pixel_ratio(&self) -> f64 {
        self.device_pixel_ratio.min(self.pixel_ratio_cap)
    }

    /// Size of the render target in physical pixels.
    pub fn buffer_size(&self) -> (u32, u32) {
        let ratio = self.pixel_ratio();
        let scale = |logical: u32| ((logical as f64 * ratio).round() as u32).max(1);
        (scale(self.width), scale(self.height))
    }
}
