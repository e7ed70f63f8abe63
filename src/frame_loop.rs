use std::time::Duration;

use crate::clock::Clock;
use crate::error::{SceneError, SceneResult};
use crate::render::Renderer;
use crate::stage::Stage;

/// Host capability to have [`FrameLoop::tick`] called once more, typically
/// on the next display refresh.
pub trait Scheduler {
    fn request_tick(&mut self);
}

/// Scheduler for tests and headless runs: records requests, the caller
/// delivers the ticks.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    pending: bool,
    requests: u64,
}

impl ManualScheduler {
    /// Consumes the outstanding request, if any.
    pub fn take_request(&mut self) -> bool {
        std::mem::take(&mut self.pending)
    }

    pub fn requests(&self) -> u64 {
        self.requests
    }
}

impl Scheduler for ManualScheduler {
    fn request_tick(&mut self) {
        self.pending = true;
        self.requests += 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Running,
    Stopped,
}

/// What the update callback sees during one tick.
pub struct Tick<'a> {
    pub stage: &'a mut Stage,
    elapsed: f64,
    delta: f64,
    stop_requested: bool,
}

impl Tick<'_> {
    /// Seconds the loop has been running, pauses excluded.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Seconds since the previous tick, clamped.
    pub fn delta(&self) -> f64 {
        self.delta
    }

    /// Ends the loop once this tick has rendered.
    pub fn stop(&mut self) {
        self.stop_requested = true;
    }
}

pub type UpdateFn = Box<dyn FnMut(&mut Tick<'_>) -> anyhow::Result<()>>;

pub struct FrameLoop<S: Scheduler> {
    scheduler: S,
    clock: Clock,
    state: LoopState,
    update: Option<UpdateFn>,
    tick_pending: bool,
    ticks: u64,
}

impl<S: Scheduler> FrameLoop<S> {
    pub fn new(scheduler: S, max_frame_delta: Duration) -> Self {
        Self {
            scheduler,
            clock: Clock::new(max_frame_delta),
            state: LoopState::Idle,
            update: None,
            tick_pending: false,
            ticks: 0,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Number of ticks that ran since construction.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    pub fn start(&mut self, update: impl FnMut(&mut Tick<'_>) -> anyhow::Result<()> + 'static) -> SceneResult<()> {
        if self.state == LoopState::Running {
            return Err(SceneError::AlreadyRunning);
        }

        log::debug!("Frame loop starting from {:?}", self.state);
        self.update = Some(Box::new(update));
        self.clock.start();
        self.state = LoopState::Running;
        self.tick_pending = true;
        self.scheduler.request_tick();
        Ok(())
    }

    /// Continues a stopped loop with the update it ran before. Elapsed time
    /// carries on from where it stopped; the first delta is zero.
    pub fn resume(&mut self) -> SceneResult<()> {
        if self.state == LoopState::Running {
            return Err(SceneError::AlreadyRunning);
        }
        if self.update.is_none() {
            return Err(SceneError::invalid("frame loop was never started"));
        }

        log::debug!("Frame loop resuming at {:.3}s", self.clock.elapsed());
        self.clock.resume();
        self.state = LoopState::Running;
        self.tick_pending = true;
        self.scheduler.request_tick();
        Ok(())
    }

    /// No tick runs after this returns; one the host already queued is
    /// ignored when it arrives.
    pub fn stop(&mut self) {
        if self.state == LoopState::Running {
            log::debug!("Frame loop stopped after {} ticks", self.ticks);
            self.state = LoopState::Stopped;
        }
        self.tick_pending = false;
    }

    /// Runs one update + render if a tick is due. Returns whether it did.
    pub fn tick(&mut self, stage: &mut Stage, renderer: &mut dyn Renderer, now: Duration) -> bool {
        if self.state != LoopState::Running || !self.tick_pending {
            return false;
        }
        self.tick_pending = false;

        let delta = self.clock.sample(now);
        let mut tick = Tick {
            stage,
            elapsed: self.clock.elapsed(),
            delta,
            stop_requested: false,
        };

        if let Some(update) = self.update.as_mut() {
            if let Err(e) = update(&mut tick) {
                log::error!("Update failed: {:?}", e);
            }
        }

        let stop_requested = tick.stop_requested;
        let stage = tick.stage;

        if let Err(e) = stage.sync_viewport(renderer) {
            log::error!("Failed to sync viewport: {}", e);
        }
        if let Err(e) = renderer.render(stage) {
            log::error!("Render failed: {:?}", e);
        }
        self.ticks += 1;

        if stop_requested {
            self.stop();
        } else {
            self.tick_pending = true;
            self.scheduler.request_tick();
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::config::HarnessConfig;
    use crate::render::RecordingRenderer;

    fn create_loop() -> (FrameLoop<ManualScheduler>, Stage, RecordingRenderer) {
        let frame_loop = FrameLoop::new(ManualScheduler::default(), Duration::from_millis(100));
        let stage = Stage::new(&HarnessConfig::default()).unwrap();
        (frame_loop, stage, RecordingRenderer::default())
    }

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn test_tick_ignored_until_started() {
        let (mut frame_loop, mut stage, mut renderer) = create_loop();
        assert_eq!(frame_loop.state(), LoopState::Idle);
        assert!(!frame_loop.tick(&mut stage, &mut renderer, ms(0)));
        assert_eq!(renderer.frames(), 0);
    }

    #[test]
    fn test_start_twice_fails() {
        let (mut frame_loop, mut stage, mut renderer) = create_loop();
        frame_loop.start(|_| Ok(())).unwrap();
        assert_eq!(frame_loop.start(|_| Ok(())), Err(SceneError::AlreadyRunning));

        // The first loop keeps going.
        assert!(frame_loop.tick(&mut stage, &mut renderer, ms(0)));
        assert_eq!(frame_loop.state(), LoopState::Running);
    }

    #[test]
    fn test_update_then_render_then_reschedule() {
        let (mut frame_loop, mut stage, mut renderer) = create_loop();
        let deltas = Rc::new(RefCell::new(Vec::new()));
        let seen = deltas.clone();
        frame_loop
            .start(move |tick| {
                seen.borrow_mut().push(tick.delta());
                Ok(())
            })
            .unwrap();
        assert_eq!(frame_loop.scheduler().requests(), 1);

        for now in [1_000, 1_016, 1_032] {
            assert!(frame_loop.scheduler_mut().take_request());
            assert!(frame_loop.tick(&mut stage, &mut renderer, ms(now)));
        }

        assert_eq!(deltas.borrow()[0], 0.0);
        assert_eq!(renderer.frames(), 3);
        assert_eq!(frame_loop.ticks(), 3);
        assert_eq!(frame_loop.scheduler().requests(), 4);
        let sum: f64 = deltas.borrow().iter().sum();
        assert!((frame_loop.clock().elapsed() - sum).abs() < 1e-9);
    }

    #[test]
    fn test_stop_inside_update_ends_loop() {
        let (mut frame_loop, mut stage, mut renderer) = create_loop();
        frame_loop
            .start(|tick| {
                if tick.elapsed() >= 0.05 {
                    tick.stop();
                }
                Ok(())
            })
            .unwrap();

        let mut now = 0;
        while frame_loop.scheduler_mut().take_request() {
            frame_loop.tick(&mut stage, &mut renderer, ms(now));
            now += 16;
        }

        let ticks = frame_loop.ticks();
        assert_eq!(ticks, 5);
        assert_eq!(frame_loop.state(), LoopState::Stopped);
        // The tick that stopped still rendered.
        assert_eq!(renderer.frames(), 5);

        // A stray host callback does nothing.
        assert!(!frame_loop.tick(&mut stage, &mut renderer, ms(now)));
        assert_eq!(frame_loop.ticks(), ticks);
    }

    #[test]
    fn test_external_stop_cancels_pending_tick() {
        let (mut frame_loop, mut stage, mut renderer) = create_loop();
        frame_loop.start(|_| Ok(())).unwrap();
        frame_loop.stop();
        assert!(!frame_loop.tick(&mut stage, &mut renderer, ms(0)));
        assert_eq!(frame_loop.ticks(), 0);
    }

    #[test]
    fn test_restart_after_stop_resets_clock() {
        let (mut frame_loop, mut stage, mut renderer) = create_loop();
        frame_loop.start(|_| Ok(())).unwrap();
        frame_loop.tick(&mut stage, &mut renderer, ms(0));
        frame_loop.tick(&mut stage, &mut renderer, ms(50));
        frame_loop.stop();

        frame_loop.start(|_| Ok(())).unwrap();
        frame_loop.tick(&mut stage, &mut renderer, ms(10_000));
        assert_eq!(frame_loop.clock().delta(), 0.0);
        assert_eq!(frame_loop.clock().elapsed(), 0.0);
    }

    #[test]
    fn test_resume_keeps_update() {
        let (mut frame_loop, mut stage, mut renderer) = create_loop();
        assert!(frame_loop.resume().is_err());

        let counter = Rc::new(RefCell::new(0));
        let counted = counter.clone();
        frame_loop
            .start(move |_| {
                *counted.borrow_mut() += 1;
                Ok(())
            })
            .unwrap();
        let mut now = 0;
        while now <= 3_000 {
            frame_loop.tick(&mut stage, &mut renderer, ms(now));
            now += 50;
        }
        assert_eq!(frame_loop.resume(), Err(SceneError::AlreadyRunning));
        let paused_at = frame_loop.clock().elapsed();
        assert!((paused_at - 3.0).abs() < 1e-9);

        frame_loop.stop();
        frame_loop.resume().unwrap();
        frame_loop.tick(&mut stage, &mut renderer, ms(20_000));
        assert_eq!(*counter.borrow(), 62);
        assert_eq!(frame_loop.clock().delta(), 0.0);
        assert_eq!(frame_loop.clock().elapsed(), paused_at);

        frame_loop.tick(&mut stage, &mut renderer, ms(20_050));
        assert!((frame_loop.clock().elapsed() - 3.05).abs() < 1e-9);
    }

    #[test]
    fn test_update_error_keeps_loop_running() {
        let (mut frame_loop, mut stage, mut renderer) = create_loop();
        frame_loop
            .start(|_| Err(anyhow::anyhow!("broken update")))
            .unwrap();
        assert!(frame_loop.tick(&mut stage, &mut renderer, ms(0)));
        assert!(frame_loop.tick(&mut stage, &mut renderer, ms(16)));
        assert_eq!(frame_loop.state(), LoopState::Running);
        assert_eq!(renderer.frames(), 2);
    }
}
