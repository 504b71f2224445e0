//! Simulation clock.
//!
//! The frame clock itself belongs to the presentation layer, which calls
//! [`SimulationController::update`](crate::SimulationController::update) with
//! the frame's delta. [`Clock`] turns those deltas into the simulation's own
//! timeline: total elapsed time, frame count, pause state, time scale and an
//! FPS estimate.
//!
//! # Example
//!
//! ```
//! use springle::time::Clock;
//!
//! let mut clock = Clock::new();
//!
//! // In your frame loop:
//! let dt = clock.advance(1.0 / 60.0);
//!
//! assert!(dt > 0.0);
//! assert_eq!(clock.frame(), 1);
//! ```

/// Time tracking for the simulation.
///
/// Elapsed time is kept as `f64` so trail ages stay precise over long sessions;
/// per-frame deltas are `f32` like the rest of the geometry.
#[derive(Debug, Clone)]
pub struct Clock {
    /// Total simulated time in seconds.
    elapsed: f64,
    /// Effective delta of the last advance.
    delta: f32,
    /// Total frames advanced (paused frames are not counted).
    frame_count: u64,
    /// Calculated FPS (updated periodically).
    fps: f32,
    /// Frames counted since the last FPS update.
    fps_frames: u32,
    /// Real time accumulated since the last FPS update.
    fps_accum: f32,
    /// How often to update the FPS calculation, in seconds.
    fps_update_interval: f32,
    /// Whether time is paused.
    paused: bool,
    /// Fixed delta time for deterministic updates (optional).
    fixed_delta: Option<f32>,
    /// Time scale multiplier (1.0 = normal speed).
    time_scale: f32,
}

impl Clock {
    /// Create a new clock at time zero.
    pub fn new() -> Self {
        Self {
            elapsed: 0.0,
            delta: 0.0,
            frame_count: 0,
            fps: 0.0,
            fps_frames: 0,
            fps_accum: 0.0,
            fps_update_interval: 0.5,
            paused: false,
            fixed_delta: None,
            time_scale: 1.0,
        }
    }

    /// Advance by a frame's real delta. Call once per frame.
    ///
    /// Returns the effective simulation delta: zero while paused, otherwise the
    /// fixed delta (if set) or `real_dt`, multiplied by the time scale.
    /// Negative or non-finite deltas are treated as zero.
    pub fn advance(&mut self, real_dt: f32) -> f32 {
        let real_dt = if real_dt.is_finite() { real_dt.max(0.0) } else { 0.0 };

        // FPS tracks the presentation rate, so it runs even while paused
        self.fps_frames += 1;
        self.fps_accum += real_dt;
        if self.fps_accum >= self.fps_update_interval {
            self.fps = self.fps_frames as f32 / self.fps_accum;
            self.fps_frames = 0;
            self.fps_accum = 0.0;
        }

        if self.paused {
            self.delta = 0.0;
            return 0.0;
        }

        self.delta = self.fixed_delta.unwrap_or(real_dt) * self.time_scale;
        self.elapsed += self.delta as f64;
        self.frame_count += 1;
        self.delta
    }

    /// Total simulated time in seconds.
    #[inline]
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Effective delta of the last frame.
    #[inline]
    pub fn delta(&self) -> f32 {
        self.delta
    }

    /// Total frames advanced.
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    /// Calculated frames per second.
    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }

    /// Whether time is currently paused.
    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Current time scale multiplier.
    #[inline]
    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// Pause time progression.
    ///
    /// While paused, `advance()` returns 0 and `elapsed()` stops increasing.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Resume time progression after pausing.
    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Toggle pause state.
    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    /// Set a fixed delta time for deterministic updates.
    ///
    /// Pass `None` to use the deltas handed to `advance`.
    pub fn set_fixed_delta(&mut self, delta: Option<f32>) {
        self.fixed_delta = delta.filter(|d| d.is_finite() && *d >= 0.0);
    }

    /// Set time scale multiplier.
    ///
    /// - `1.0` = normal speed
    /// - `0.5` = half speed (slow motion)
    /// - `2.0` = double speed
    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = if scale.is_finite() { scale.max(0.0) } else { 1.0 };
    }

    /// Reset the clock to time zero, keeping scale and fixed delta.
    pub fn reset(&mut self) {
        self.elapsed = 0.0;
        self.delta = 0.0;
        self.frame_count = 0;
        self.fps = 0.0;
        self.fps_frames = 0;
        self.fps_accum = 0.0;
        self.paused = false;
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}
