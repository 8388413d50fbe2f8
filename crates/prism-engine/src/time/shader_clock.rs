use std::time::Instant;

/// Wall-clock time since construction, as seen by shaders.
///
/// Measured from the instant the clock was created, so the first frame starts
/// at `t = 0` regardless of how long the process has been running. The value
/// returned by [`tick`](Self::tick) never decreases for a given clock.
#[derive(Debug, Clone)]
pub struct ShaderClock {
    start: Instant,
    elapsed: f32,
}

impl ShaderClock {
    /// Starts a new clock at `Instant::now()`.
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    /// Starts a clock with a caller-provided origin.
    pub fn starting_at(start: Instant) -> Self {
        Self { start, elapsed: 0.0 }
    }

    /// Seconds between the origin and `now`, saturating at zero.
    pub fn elapsed_at(&self, now: Instant) -> f32 {
        now.saturating_duration_since(self.start).as_secs_f32()
    }

    /// Advances the clock to `Instant::now()` and returns elapsed seconds.
    pub fn tick(&mut self) -> f32 {
        self.tick_at(Instant::now())
    }

    /// Advances the clock to `now`. A stale `now` leaves the value unchanged.
    pub fn tick_at(&mut self, now: Instant) -> f32 {
        self.elapsed = self.elapsed.max(self.elapsed_at(now));
        self.elapsed
    }
}

impl Default for ShaderClock {
    fn default() -> Self {
        Self::new()
    }
}
