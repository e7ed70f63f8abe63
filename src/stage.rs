use glam::Vec2;

use crate::assets::{Color, TextureStore};
use crate::camera::Camera;
use crate::config::HarnessConfig;
use crate::error::SceneResult;
use crate::render::Renderer;
use crate::scene_graph::Scene;
use crate::viewport::Viewport;

/// Pointer state in window coordinates plus the input not yet consumed by
/// a controller.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Pointer {
    /// Position relative to the viewport centre, each axis in -0.5..0.5,
    /// y pointing up.
    pub cursor: Vec2,
    pub pressed: bool,
    drag: Vec2,
    scroll: f32,
}

impl Pointer {
    pub fn move_to(&mut self, x: f32, y: f32, viewport: &Viewport) {
        let cursor = Vec2::new(
            x / viewport.width() as f32 - 0.5,
            -(y / viewport.height() as f32 - 0.5),
        );

        if self.pressed {
            // Drag is measured in logical pixels, y down like the window.
            let size = Vec2::new(viewport.width() as f32, viewport.height() as f32);
            let delta = (cursor - self.cursor) * size;
            self.drag += Vec2::new(delta.x, -delta.y);
        }
        self.cursor = cursor;
    }

    pub fn add_drag(&mut self, delta: Vec2) {
        self.drag += delta;
    }

    pub fn add_scroll(&mut self, amount: f32) {
        self.scroll += amount;
    }

    pub fn take_drag(&mut self) -> Vec2 {
        std::mem::take(&mut self.drag)
    }

    pub fn take_scroll(&mut self) -> f32 {
        std::mem::take(&mut self.scroll)
    }
}

/// Everything a tick, a renderer and the debug panel work on.
pub struct Stage {
    pub scene: Scene,
    pub camera: Camera,
    pub viewport: Viewport,
    pub textures: TextureStore,
    pub pointer: Pointer,
    pub clear_color: Color,
}

impl Stage {
    /// Empty scene with a perspective camera attached to the root.
    pub fn new(config: &HarnessConfig) -> SceneResult<Self> {
        let viewport = Viewport::new(config.width, config.height, 1.0, config.pixel_ratio_cap)?;
        let mut scene = Scene::new();
        let mut camera = Camera::new(&mut scene);
        camera.set_aspect(viewport.aspect())?;
        scene.attach(scene.root(), camera.node())?;

        Ok(Self {
            scene,
            camera,
            viewport,
            textures: TextureStore::new(&config.asset_root),
            pointer: Pointer::default(),
            clear_color: config.clear_color,
        })
    }

    /// Applies a resize immediately: viewport, camera aspect and the
    /// renderer's output buffer all change before this returns.
    pub fn resize(
        &mut self,
        renderer: &mut dyn Renderer,
        width: u32,
        height: u32,
        device_pixel_ratio: f64,
    ) -> SceneResult<()> {
        let mut viewport = self.viewport;
        viewport.resize(width, height, device_pixel_ratio)?;
        self.camera.set_aspect(viewport.aspect())?;
        self.viewport = viewport;

        let (buffer_width, buffer_height) = viewport.buffer_size();
        log::debug!(
            "Resized to {}x{} (buffer {}x{}, pixel ratio {})",
            width,
            height,
            buffer_width,
            buffer_height,
            viewport.pixel_ratio()
        );
        renderer.set_size(buffer_width, buffer_height, viewport.pixel_ratio());
        Ok(())
    }

    /// Brings camera aspect and renderer output back in line with the
    /// viewport, in case something changed them since the last resize.
    pub fn sync_viewport(&mut self, renderer: &mut dyn Renderer) -> SceneResult<()> {
        if self.camera.aspect() != self.viewport.aspect() {
            self.camera.set_aspect(self.viewport.aspect())?;
        }

        let buffer_size = self.viewport.buffer_size();
        if renderer.output_size() != buffer_size {
            renderer.set_size(buffer_size.0, buffer_size.1, self.viewport.pixel_ratio());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RecordingRenderer;

    #[test]
    fn test_resize_updates_camera_and_renderer() {
        let mut stage = Stage::new(&HarnessConfig::default()).unwrap();
        let mut renderer = RecordingRenderer::default();
        stage.sync_viewport(&mut renderer).unwrap();
        assert_eq!(renderer.output_size(), (800, 600));

        stage.resize(&mut renderer, 1920, 1080, 1.0).unwrap();
        assert!((stage.camera.aspect() - 1920.0 / 1080.0).abs() < 1e-6);
        assert_eq!(renderer.output_size(), (1920, 1080));
    }

    #[test]
    fn test_rejected_resize_keeps_everything() {
        let mut stage = Stage::new(&HarnessConfig::default()).unwrap();
        let mut renderer = RecordingRenderer::default();
        stage.resize(&mut renderer, 1024, 768, 2.0).unwrap();

        assert!(stage.resize(&mut renderer, 0, 768, 2.0).is_err());
        assert_eq!(stage.viewport.width(), 1024);
        assert_eq!(renderer.output_size(), (2048, 1536));
        assert!((stage.camera.aspect() - 1024.0 / 768.0).abs() < 1e-6);
    }

    #[test]
    fn test_pointer_cursor_and_drag() {
        let viewport = Viewport::new(800, 600, 1.0, 2.0).unwrap();
        let mut pointer = Pointer::default();
        pointer.move_to(400.0, 300.0, &viewport);
        assert_eq!(pointer.cursor, Vec2::ZERO);

        pointer.pressed = true;
        pointer.move_to(480.0, 270.0, &viewport);
        assert!((pointer.cursor.x - 0.1).abs() < 1e-6);
        assert!((pointer.cursor.y - 0.05).abs() < 1e-6);

        let drag = pointer.take_drag();
        assert!((drag.x - 80.0).abs() < 1e-3);
        assert!((drag.y + 30.0).abs() < 1e-3);
        assert_eq!(pointer.take_drag(), Vec2::ZERO);
    }
}
