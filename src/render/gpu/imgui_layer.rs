use std::time::Instant;

use anyhow::Context;
use imgui::{FontConfig, FontSource};
use imgui_wgpu::RendererConfig;
use imgui_winit_support::WinitPlatform;
use winit::{event::Event, window::Window};

/// Dear ImGui context, its winit glue and its wgpu renderer.
///
/// A frame opened with [`ImguiLayer::frame`] is closed by the next
/// [`ImguiLayer::render`].
pub struct ImguiLayer {
    context: imgui::Context,
    platform: WinitPlatform,
    renderer: imgui_wgpu::Renderer,
    last_frame: Instant,
    frame_open: bool,
    pixel_ratio: f64,
}

/// imgui works in logical window units; the surface it draws to is sized by
/// the capped pixel ratio, not the window's scale factor.
fn framebuffer_scale(pixel_ratio: f64) -> [f32; 2] {
    let scale = pixel_ratio as f32;
    [scale, scale]
}

impl ImguiLayer {
    pub fn new(
        window: &Window,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        texture_format: wgpu::TextureFormat,
    ) -> Self {
        let mut context = imgui::Context::create();
        let mut platform = WinitPlatform::new(&mut context);
        platform.attach_window(
            context.io_mut(),
            window,
            imgui_winit_support::HiDpiMode::Default,
        );

        let font_size = 14.0;
        context.fonts().add_font(&[FontSource::DefaultFontData {
            config: Some(FontConfig {
                oversample_h: 1,
                pixel_snap_h: true,
                size_pixels: font_size,
                ..Default::default()
            }),
        }]);

        // Disable INI support because it's broken in the published version of imgui
        context.set_ini_filename(None);

        let renderer_config = RendererConfig {
            texture_format,
            ..Default::default()
        };
        let renderer = imgui_wgpu::Renderer::new(&mut context, device, queue, renderer_config);

        Self {
            context,
            platform,
            renderer,
            last_frame: Instant::now(),
            frame_open: false,
            pixel_ratio: window.scale_factor(),
        }
    }

    pub fn handle_event(&mut self, window: &Window, event: &Event<()>) {
        self.platform
            .handle_event::<()>(self.context.io_mut(), window, event);
    }

    /// Matches the overlay to a surface configured at `pixel_ratio`.
    pub fn set_pixel_ratio(&mut self, pixel_ratio: f64) {
        self.pixel_ratio = pixel_ratio;
    }

    pub fn wants_pointer(&self) -> bool {
        self.context.io().want_capture_mouse
    }

    pub fn wants_keyboard(&self) -> bool {
        self.context.io().want_capture_keyboard
    }

    pub fn frame(&mut self, window: &Window, build: impl FnOnce(&imgui::Ui)) -> anyhow::Result<()> {
        if self.frame_open {
            // The previous frame never got rendered; imgui requires it closed.
            self.context.render();
            self.frame_open = false;
        }

        let now = Instant::now();
        self.context
            .io_mut()
            .update_delta_time(now - self.last_frame);
        self.last_frame = now;

        self.platform
            .prepare_frame(self.context.io_mut(), window)
            .context("Failed to prepare imgui frame")?;
        // The platform keeps resetting this to the window scale factor.
        self.context.io_mut().display_framebuffer_scale = framebuffer_scale(self.pixel_ratio);

        let ui = self.context.new_frame();
        build(ui);
        self.platform.prepare_render(ui, window);
        self.frame_open = true;
        Ok(())
    }

    pub fn render(
        &mut self,
        view: &wgpu::TextureView,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
    ) -> anyhow::Result<()> {
        if !self.frame_open {
            return Ok(());
        }
        self.frame_open = false;

        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Imgui render pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        let draw_data = self.context.render();

        // Workaround for memory safety related crash in imgui-rs
        // https://github.com/imgui-rs/imgui-rs/issues/325
        if draw_data.draw_lists_count() == 0 {
            return Ok(());
        }

        self.renderer
            .render(draw_data, queue, device, &mut render_pass)
            .map_err(|e| anyhow::anyhow!("Rendering imgui failed: {:?}", e))
    }
}
