//! Frame statistics

use std::collections::VecDeque;
use std::time::Duration;

use crate::renderer::RenderStats;
use crate::update::UpdateStats;

/// Rolling frame-time statistics plus pass totals
#[derive(Debug)]
pub struct FrameStats {
    /// Frame time history for averaging
    frame_times: VecDeque<Duration>,
    /// Maximum samples to keep
    max_samples: usize,
    fps: f32,
    avg_frame_time_ms: f32,
    min_frame_time_ms: f32,
    max_frame_time_ms: f32,
    total_frames: u64,
    total_draw_calls: u64,
    total_component_updates: u64,
    last_update: UpdateStats,
    last_render: RenderStats,
}

impl FrameStats {
    const DEFAULT_SAMPLES: usize = 120;

    pub fn new() -> Self {
        Self::with_samples(Self::DEFAULT_SAMPLES)
    }

    /// Tracker averaging over the last `samples` frames
    pub fn with_samples(samples: usize) -> Self {
        let max_samples = samples.max(1);
        Self {
            frame_times: VecDeque::with_capacity(max_samples),
            max_samples,
            fps: 0.0,
            avg_frame_time_ms: 0.0,
            min_frame_time_ms: 0.0,
            max_frame_time_ms: 0.0,
            total_frames: 0,
            total_draw_calls: 0,
            total_component_updates: 0,
            last_update: UpdateStats::default(),
            last_render: RenderStats::default(),
        }
    }

    /// Record one frame of length `delta` and what its passes did
    pub fn record(&mut self, delta: Duration, update: UpdateStats, render: RenderStats) {
        self.total_frames += 1;
        self.total_draw_calls += render.draw_calls as u64;
        self.total_component_updates += update.components_updated as u64;
        self.last_update = update;
        self.last_render = render;

        if self.frame_times.len() >= self.max_samples {
            self.frame_times.pop_front();
        }
        self.frame_times.push_back(delta);
        self.update_timing();
    }

    fn update_timing(&mut self) {
        let mut total = Duration::ZERO;
        let mut min = Duration::MAX;
        let mut max = Duration::ZERO;

        for &dt in &self.frame_times {
            total += dt;
            min = min.min(dt);
            max = max.max(dt);
        }

        let count = self.frame_times.len() as f32;
        let total_secs = total.as_secs_f32();

        // Zero-length frames (tests, paused clocks) have no meaningful rate
        if total_secs > 0.0 {
            self.avg_frame_time_ms = (total_secs / count) * 1000.0;
            self.fps = count / total_secs;
        } else {
            self.avg_frame_time_ms = 0.0;
            self.fps = 0.0;
        }

        self.min_frame_time_ms = min.as_secs_f32() * 1000.0;
        self.max_frame_time_ms = max.as_secs_f32() * 1000.0;
    }

    pub fn fps(&self) -> f32 {
        self.fps
    }

    pub fn avg_frame_time_ms(&self) -> f32 {
        self.avg_frame_time_ms
    }

    pub fn min_frame_time_ms(&self) -> f32 {
        self.min_frame_time_ms
    }

    pub fn max_frame_time_ms(&self) -> f32 {
        self.max_frame_time_ms
    }

    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    pub fn total_draw_calls(&self) -> u64 {
        self.total_draw_calls
    }

    pub fn total_component_updates(&self) -> u64 {
        self.total_component_updates
    }

    /// Update pass counters of the last frame
    pub fn last_update(&self) -> UpdateStats {
        self.last_update
    }

    /// Render pass counters of the last frame
    pub fn last_render(&self) -> RenderStats {
        self.last_render
    }

    /// One-line summary for logs
    pub fn format_stats(&self) -> String {
        format!(
            "FPS: {:.1} | Frame: {:.2}ms (min: {:.2}, max: {:.2}) | Draws: {} | Updates: {}",
            self.fps,
            self.avg_frame_time_ms,
            self.min_frame_time_ms,
            self.max_frame_time_ms,
            self.last_render.draw_calls,
            self.last_update.components_updated
        )
    }
}

impl Default for FrameStats {
    fn default() -> Self {
        Self::new()
    }
}
