//! Time management utilities
//!
//! [`Timer`] measures wall-clock frame deltas, [`Time`] is the read-only view
//! of the current frame that hooks consult, and [`FixedTimestep`] turns a
//! stream of variable frame deltas into a whole number of fixed steps.

use std::time::Instant;

/// Default fixed simulation step (120 Hz)
pub const DEFAULT_FIXED_DELTA: f64 = 1.0 / 120.0;

/// High-precision timer for frame timing
pub struct Timer {
    last_frame: Instant,
    delta_time: f64,
    total_time: f64,
    frame_count: u64,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    /// Create a new timer
    pub fn new() -> Self {
        Self {
            last_frame: Instant::now(),
            delta_time: 0.0,
            total_time: 0.0,
            frame_count: 0,
        }
    }
    
    /// Update the timer (should be called once per frame) and return the new delta
    pub fn update(&mut self) -> f64 {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_frame);
        self.delta_time = elapsed.as_secs_f64();
        self.total_time += self.delta_time;
        self.last_frame = now;
        self.frame_count += 1;
        self.delta_time
    }
    
    /// Get the time since the last frame in seconds
    pub fn delta_time(&self) -> f64 {
        self.delta_time
    }
    
    /// Get the total elapsed time since timer creation
    pub fn total_time(&self) -> f64 {
        self.total_time
    }
    
    /// Get the current frame count
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
    
    /// Get the average FPS since timer creation
    #[allow(clippy::cast_precision_loss)]
    pub fn average_fps(&self) -> f64 {
        if self.total_time > 0.0 {
            self.frame_count as f64 / self.total_time
        } else {
            0.0
        }
    }
}

/// Per-frame timing values visible to entity and component hooks
#[derive(Debug, Clone, PartialEq)]
pub struct Time {
    scale: f64,
    unscaled_delta: f64,
    delta: f64,
    fixed_delta: f64,
    elapsed: f64,
    frame_count: u64,
}

impl Default for Time {
    fn default() -> Self {
        Self::new(DEFAULT_FIXED_DELTA)
    }
}

impl Time {
    /// Create a time record with the given fixed step
    pub fn new(fixed_delta: f64) -> Self {
        Self {
            scale: 1.0,
            unscaled_delta: 0.0,
            delta: 0.0,
            fixed_delta,
            elapsed: 0.0,
            frame_count: 0,
        }
    }

    /// Record a new frame. Returns the scaled delta.
    ///
    /// Negative or non-finite deltas are recorded as an empty frame.
    pub(crate) fn advance(&mut self, unscaled_delta: f64) -> f64 {
        let unscaled_delta = if unscaled_delta.is_finite() {
            unscaled_delta.max(0.0)
        } else {
            log::warn!("Ignoring non-finite frame delta {unscaled_delta}");
            0.0
        };
        self.unscaled_delta = unscaled_delta;
        self.delta = unscaled_delta * self.scale;
        self.elapsed += self.delta;
        self.frame_count += 1;
        self.delta
    }

    /// Time scale applied to frame deltas (1.0 = real time)
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Set the time scale. Negative values are clamped to zero; non-finite
    /// values are ignored.
    pub fn set_scale(&mut self, scale: f64) {
        if scale.is_finite() {
            self.scale = scale.max(0.0);
        } else {
            log::warn!("Ignoring non-finite time scale {scale}");
        }
    }

    /// Wall-clock delta of the current frame in seconds
    pub fn unscaled_delta(&self) -> f64 {
        self.unscaled_delta
    }

    /// Scaled delta of the current frame in seconds
    pub fn delta(&self) -> f64 {
        self.delta
    }

    /// Scaled delta as `f32`, convenient for gameplay math
    #[allow(clippy::cast_possible_truncation)]
    pub fn delta_f32(&self) -> f32 {
        self.delta as f32
    }

    /// Fixed simulation step in seconds
    pub fn fixed_delta(&self) -> f64 {
        self.fixed_delta
    }

    /// Set the fixed simulation step. Non-positive and non-finite values are ignored.
    pub fn set_fixed_delta(&mut self, fixed_delta: f64) {
        if fixed_delta > 0.0 && fixed_delta.is_finite() {
            self.fixed_delta = fixed_delta;
        } else {
            log::warn!("Ignoring invalid fixed delta {fixed_delta}");
        }
    }

    /// Total scaled time since the first frame
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    /// Number of frames recorded so far
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

/// Lag accumulator for fixed-step simulation
///
/// Frame deltas are added to the lag and whole steps are drained from it, so
/// the number of steps depends only on the summed time and never on how that
/// time was split into frames.
#[derive(Debug, Clone, Default)]
pub struct FixedTimestep {
    lag: f64,
}

impl FixedTimestep {
    /// Slack absorbing the rounding error of summed `f64` deltas
    pub const TOLERANCE: f64 = 1e-9;

    /// Create an empty accumulator
    pub fn new() -> Self {
        Self::default()
    }

    /// Add elapsed (scaled) time to the lag
    ///
    /// Negative deltas count as zero. Non-finite deltas are dropped, since
    /// an infinite lag could never be drained.
    pub fn accumulate(&mut self, delta: f64) {
        if delta.is_finite() {
            self.lag += delta.max(0.0);
        } else {
            log::warn!("Ignoring non-finite fixed-step delta {delta}");
        }
    }

    /// Consume one step of `step` seconds if enough lag is available
    pub fn consume_step(&mut self, step: f64) -> bool {
        if step > 0.0 && self.lag + Self::TOLERANCE >= step {
            self.lag = (self.lag - step).max(0.0);
            true
        } else {
            false
        }
    }

    /// Time not yet consumed by a step
    pub fn lag(&self) -> f64 {
        self.lag
    }

    /// Drop any accumulated lag
    pub fn reset(&mut self) {
        self.lag = 0.0;
    }
}
