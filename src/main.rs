use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;

use lessongine::config::HarnessConfig;
use lessongine::frame_loop::{FrameLoop, ManualScheduler};
use lessongine::lessons::{self, LessonKind};
use lessongine::render::RecordingRenderer;
use lessongine::stage::Stage;
use lessongine::window;

/// Runs one of the lesson scenes.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    #[arg(short, long, value_enum, default_value = "haunted-house")]
    lesson: LessonKind,

    /// Initial window width in logical pixels
    #[arg(long, default_value_t = 800)]
    width: u32,

    /// Initial window height in logical pixels
    #[arg(long, default_value_t = 600)]
    height: u32,

    #[arg(long, default_value_t = 2.0)]
    pixel_ratio_cap: f64,

    /// Longest frame delta an update gets to see
    #[arg(long, default_value_t = 100)]
    max_frame_delta_ms: u64,

    /// Directory the texture paths are resolved against
    #[arg(long, default_value = "assets")]
    assets: PathBuf,

    /// Start with the debug panel hidden; H toggles it
    #[arg(long)]
    hide_panel: bool,

    /// Run without a window or GPU, rendering into a recording renderer
    #[arg(long)]
    headless: bool,

    /// Number of ticks to run in headless mode
    #[arg(long, default_value_t = 120)]
    frames: u64,
}

impl Args {
    fn config(&self) -> HarnessConfig {
        HarnessConfig {
            width: self.width,
            height: self.height,
            pixel_ratio_cap: self.pixel_ratio_cap,
            max_frame_delta: Duration::from_millis(self.max_frame_delta_ms),
            asset_root: self.assets.clone(),
            show_debug_panel: !self.hide_panel,
            ..Default::default()
        }
    }
}

fn run_headless(lesson: LessonKind, config: HarnessConfig, frames: u64) -> Result<()> {
    let mut stage = Stage::new(&config)?;
    let run = lessons::build(lesson, &mut stage)?;
    let mut renderer = RecordingRenderer::default();
    let mut frame_loop = FrameLoop::new(ManualScheduler::default(), config.max_frame_delta);
    frame_loop.start(run.update)?;

    let frame_time = Duration::from_secs_f64(1.0 / 60.0);
    let mut now = Duration::ZERO;
    while frame_loop.ticks() < frames && frame_loop.scheduler_mut().take_request() {
        stage.textures.poll();
        frame_loop.tick(&mut stage, &mut renderer, now);
        now += frame_time;
    }

    let progress = stage.textures.progress();
    let last = renderer.last_frame();
    log::info!(
        "Ran {} ticks over {:.2}s: {} items, {} lights, {} culled, textures {}/{} ({} failed)",
        frame_loop.ticks(),
        frame_loop.clock().elapsed(),
        last.map_or(0, |list| list.items.len()),
        last.map_or(0, |list| list.lights.len()),
        last.map_or(0, |list| list.culled),
        progress.loaded,
        progress.total,
        progress.failed,
    );

    Ok(())
}

fn main() -> Result<()> {
    pretty_env_logger::init();

    let args = Args::parse();
    let config = args.config();

    if args.headless {
        run_headless(args.lesson, config, args.frames)
    } else {
        pollster::block_on(window::run(args.lesson, config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hide_panel_flag() {
        let args = Args::try_parse_from(["lessongine", "--lesson", "lights"]).unwrap();
        assert!(args.config().show_debug_panel);

        let args = Args::try_parse_from(["lessongine", "--hide-panel"]).unwrap();
        assert!(!args.config().show_debug_panel);
    }
}
