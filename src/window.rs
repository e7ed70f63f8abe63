use std::{sync::Arc, time::Instant};

use anyhow::Context;
use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalSize},
    event::{ElementState, Event, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{Key, NamedKey},
    window::{Window, WindowId},
};

use crate::{
    config::HarnessConfig,
    debug_panel::DebugPanel,
    frame_loop::{FrameLoop, LoopState, Scheduler, UpdateFn},
    lessons::{self, LessonKind},
    render::{gpu::GpuRenderer, Renderer},
    stage::Stage,
};

/// Ticks are delivered as redraws of the window.
#[derive(Default)]
struct WindowScheduler {
    window: Option<Arc<Window>>,
}

impl Scheduler for WindowScheduler {
    fn request_tick(&mut self) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

struct App {
    lesson: LessonKind,
    config: HarnessConfig,
    stage: Stage,
    panel: DebugPanel,
    frame_loop: FrameLoop<WindowScheduler>,
    update: Option<UpdateFn>,
    gpu: Option<GpuRenderer>,
    started: Instant,
}

impl App {
    fn new(lesson: LessonKind, config: HarnessConfig) -> anyhow::Result<Self> {
        let mut stage = Stage::new(&config).context("Failed to create stage")?;
        let run = lessons::build(lesson, &mut stage)?;

        let mut panel = run.panel;
        if !config.show_debug_panel {
            panel.set_visible(false);
        }

        Ok(Self {
            lesson,
            frame_loop: FrameLoop::new(WindowScheduler::default(), config.max_frame_delta),
            config,
            stage,
            panel,
            update: Some(run.update),
            gpu: None,
            started: Instant::now(),
        })
    }

    fn resize(&mut self, size: PhysicalSize<u32>, scale_factor: f64) {
        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };
        if size.width == 0 || size.height == 0 {
            log::debug!("Ignoring resize to {}x{}", size.width, size.height);
            return;
        }

        let logical: LogicalSize<f64> = size.to_logical(scale_factor);
        let width = logical.width.round().max(1.0) as u32;
        let height = logical.height.round().max(1.0) as u32;
        if let Err(e) = self.stage.resize(gpu, width, height, scale_factor) {
            log::error!("Resize to {}x{} rejected: {}", width, height, e);
        }
    }

    fn toggle_pause(&mut self) {
        match self.frame_loop.state() {
            LoopState::Running => {
                log::info!("Paused");
                self.frame_loop.stop();
            }
            _ => {
                log::info!("Resumed");
                if let Err(e) = self.frame_loop.resume() {
                    log::error!("Failed to resume: {}", e);
                }
            }
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };

        let applied = self.stage.textures.poll();
        if applied > 0 {
            let progress = self.stage.textures.progress();
            log::debug!(
                "Textures: {} applied, {}/{} done",
                applied,
                progress.loaded + progress.failed,
                progress.total
            );
        }

        let (panel, stage) = (&mut self.panel, &mut self.stage);
        if let Err(e) = gpu.ui_frame(|ui| panel.draw(ui, stage)) {
            log::error!("Failed to build debug panel: {:?}", e);
        }

        let now = self.started.elapsed();
        if !self.frame_loop.tick(&mut self.stage, gpu, now) {
            // Not ticking, but the overlay still has to be drawn.
            if let Err(e) = gpu.render(&self.stage) {
                log::error!("Render failed: {:?}", e);
            }
        }

        if gpu.is_out_of_memory() {
            log::error!("Out of memory");
            event_loop.exit();
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }

        let window_attributes = Window::default_attributes()
            .with_title(self.lesson.title())
            .with_inner_size(LogicalSize::new(self.config.width, self.config.height));
        let window = match event_loop.create_window(window_attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        match pollster::block_on(GpuRenderer::new(window.clone())) {
            Ok(gpu) => self.gpu = Some(gpu),
            Err(e) => {
                log::error!("Failed to create renderer: {:?}", e);
                event_loop.exit();
                return;
            }
        }

        self.resize(window.inner_size(), window.scale_factor());
        self.frame_loop.scheduler_mut().window = Some(window);

        if let Some(update) = self.update.take() {
            if let Err(e) = self.frame_loop.start(update) {
                log::error!("Failed to start frame loop: {}", e);
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let Some(gpu) = self.gpu.as_mut() else {
            return;
        };
        let window = gpu.window().clone();
        gpu.handle_event(&Event::WindowEvent {
            window_id,
            event: event.clone(),
        });
        let wants_pointer = gpu.wants_pointer();
        let wants_keyboard = gpu.wants_keyboard();

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                self.resize(new_size, window.scale_factor());
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                self.resize(window.inner_size(), scale_factor);
            }
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
                return;
            }
            WindowEvent::CursorMoved { position, .. } => {
                let logical = position.to_logical::<f32>(window.scale_factor());
                let viewport = self.stage.viewport;
                self.stage.pointer.move_to(logical.x, logical.y, &viewport);
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                self.stage.pointer.pressed = state == ElementState::Pressed && !wants_pointer;
            }
            WindowEvent::MouseWheel { delta, .. } if !wants_pointer => {
                let amount = match delta {
                    MouseScrollDelta::LineDelta(_, y) => -y,
                    MouseScrollDelta::PixelDelta(position) => -(position.y as f32) / 100.0,
                };
                self.stage.pointer.add_scroll(amount);
            }
            WindowEvent::KeyboardInput { event, .. }
                if event.state == ElementState::Pressed && !event.repeat && !wants_keyboard =>
            {
                match event.logical_key {
                    Key::Character(c) if c.eq_ignore_ascii_case("h") => self.panel.toggle_visible(),
                    Key::Named(NamedKey::Space) => self.toggle_pause(),
                    Key::Named(NamedKey::Escape) => event_loop.exit(),
                    _ => (),
                }
            }
            _ => (),
        }

        // A stopped loop does not redraw by itself; keep the panel responsive.
        if self.frame_loop.state() != LoopState::Running {
            window.request_redraw();
        }
    }
}

pub async fn run(lesson: LessonKind, config: HarnessConfig) -> anyhow::Result<()> {
    let event_loop = EventLoop::new().context("Failed to create event loop")?;
    let mut app = App::new(lesson, config)?;
    event_loop.run_app(&mut app)?;

    Ok(())
}
