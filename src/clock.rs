use std::time::Duration;

/// Frame-delta accumulator.
///
/// Elapsed time is the sum of the deltas handed out, each clamped to
/// `max_delta`, so a long stall in the host (minimized window, debugger
/// breakpoint) advances animations by at most one capped step.
#[derive(Debug, Clone)]
pub struct Clock {
    elapsed: f64,
    delta: f64,
    last_sample: Option<Duration>,
    max_delta: Duration,
}

impl Clock {
    pub fn new(max_delta: Duration) -> Self {
        Self {
            elapsed: 0.0,
            delta: 0.0,
            last_sample: None,
            max_delta,
        }
    }

    pub fn start(&mut self) {
        self.elapsed = 0.0;
        self.delta = 0.0;
        self.last_sample = None;
    }

    /// Continues after a pause: elapsed time is kept and the next sample
    /// yields zero, so the paused interval is not counted.
    pub fn resume(&mut self) {
        self.delta = 0.0;
        self.last_sample = None;
    }

    /// Advances the clock to the host timestamp `now` and returns the delta
    /// in seconds. The first sample after [`Clock::start`] yields zero.
    pub fn sample(&mut self, now: Duration) -> f64 {
        let delta = match self.last_sample {
            // A host clock going backwards counts as no time passing.
            Some(last) => now.saturating_sub(last).min(self.max_delta),
            None => Duration::ZERO,
        };

        self.last_sample = Some(now);
        self.delta = delta.as_secs_f64();
        self.elapsed += self.delta;
        self.delta
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn delta(&self) -> f64 {
        self.delta
    }

    pub fn max_delta(&self) -> Duration {
        self.max_delta
    }
}
