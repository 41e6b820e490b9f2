//! Frame timing
//!
//! [`Time`] is what components read during the update pass. [`FixedTimestep`]
//! turns wall-clock time into a whole number of fixed-length frames.

use std::time::Duration;

/// Per-frame time information
#[derive(Debug, Clone)]
pub struct Time {
    /// Length of the current frame
    delta: Duration,
    /// Total simulated time
    elapsed: Duration,
    /// Frames advanced so far
    frame_count: u64,
    /// Frames counted in the last whole second of simulated time
    fps: u32,
    /// Frames since the fps counter was last reset
    frames_this_second: u32,
    /// Simulated time since the fps counter was last reset
    second_timer: Duration,
}

impl Time {
    pub fn new() -> Self {
        Self {
            delta: Duration::ZERO,
            elapsed: Duration::ZERO,
            frame_count: 0,
            fps: 0,
            frames_this_second: 0,
            second_timer: Duration::ZERO,
        }
    }

    /// Advance by one frame of length `delta`
    pub fn advance(&mut self, delta: Duration) {
        self.delta = delta;
        self.elapsed += delta;
        self.frame_count += 1;

        self.frames_this_second += 1;
        self.second_timer += delta;
        if self.second_timer >= Duration::from_secs(1) {
            self.fps = self.frames_this_second;
            self.frames_this_second = 0;
            self.second_timer = Duration::ZERO;
        }
    }

    /// Get the delta time of the current frame
    pub fn delta(&self) -> Duration {
        self.delta
    }

    /// Get delta time in seconds
    pub fn delta_seconds(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    /// Get total elapsed time in seconds
    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Frames per second over the last full second
    pub fn fps(&self) -> u32 {
        self.fps
    }
}

impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixed-step accumulator.
///
/// Real elapsed time is accumulated as lag; each [`FixedTimestep::step`]
/// consumes one step worth of lag.
#[derive(Debug, Clone)]
pub struct FixedTimestep {
    step: Duration,
    lag: Duration,
}

impl FixedTimestep {
    /// Create a timer running at `updates_per_second`
    pub fn new(updates_per_second: f64) -> Self {
        let step = if updates_per_second > 0.0 {
            Duration::from_secs_f64(1.0 / updates_per_second)
        } else {
            Duration::ZERO
        };
        Self {
            step,
            lag: Duration::ZERO,
        }
    }

    /// Length of one step
    pub fn step_duration(&self) -> Duration {
        self.step
    }

    /// Add real elapsed time to the lag
    pub fn accumulate(&mut self, elapsed: Duration) {
        self.lag += elapsed;
    }

    /// Consume one step if enough lag has built up
    pub fn step(&mut self) -> bool {
        if self.step.is_zero() || self.lag < self.step {
            return false;
        }
        self.lag -= self.step;
        true
    }

    /// Fraction of a step left over, for interpolation
    pub fn alpha(&self) -> f32 {
        if self.step.is_zero() {
            return 0.0;
        }
        (self.lag.as_secs_f64() / self.step.as_secs_f64()) as f32
    }

    /// Drop any accumulated lag
    pub fn reset(&mut self) {
        self.lag = Duration::ZERO;
    }
}
