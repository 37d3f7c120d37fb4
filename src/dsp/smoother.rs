//! # Linear Parameter Smoother
//!
//! When the user moves the "Delay Time" knob from 500 ms to 1000 ms, the
//! read head of the delay line should not teleport 22050 samples backwards
//! in a single step. That jump is a discontinuity in the output waveform and
//! is heard as a click. Instead, the smoother walks the value from where it
//! currently is to the new target in equal steps over a fixed window.
//!
//! ```text
//! value
//!   ▲           target ─────────────
//!   │                 ╱
//!   │               ╱   one `step` per sample,
//!   │             ╱     `steps_per_ramp` samples in total
//!   │ current ──╱
//!   └─────────────────────────────────► samples
//! ```
//!
//! The ramp is linear rather than exponential: it reaches the target in a
//! known, finite number of samples and lands on it exactly. On the final step
//! the value is *set* to the target instead of adding one more increment, so
//! accumulated float error can never overshoot.
//!
//! A retarget in the middle of a ramp starts a fresh ramp from wherever the
//! value currently is, so the output stays continuous.

use crate::config::seconds_to_samples;

/// Per-sample linear ramp towards a target value.
///
/// The state is a handful of numbers and is `Copy`, which lets the block
/// processor hand every channel its own copy of the block-start state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearSmoother {
    current: f32,
    target: f32,
    /// Increment added to `current` on every sample of the active ramp.
    step: f32,
    /// Samples left until `current` reaches `target`. Zero when idle.
    steps_remaining: u32,
    /// Ramp length in samples, fixed by [`reset()`](Self::reset).
    steps_per_ramp: u32,
}

impl Default for LinearSmoother {
    fn default() -> Self {
        Self::new()
    }
}

impl LinearSmoother {
    /// An idle smoother sitting at 0.0 with no ramp length. Until
    /// [`reset()`](Self::reset) gives it a ramp, targets apply instantly.
    pub const fn new() -> Self {
        Self {
            current: 0.0,
            target: 0.0,
            step: 0.0,
            steps_remaining: 0,
            steps_per_ramp: 0,
        }
    }

    /// Set the ramp length from a sample rate and a duration, and finish
    /// any ramp in progress by snapping to its target.
    ///
    /// The ramp length is `floor(sample_rate * seconds)` samples, after
    /// snapping products that only miss a whole number through `f32`
    /// rounding. A zero length disables smoothing entirely.
    pub fn reset(&mut self, sample_rate: f32, smoothing_seconds: f32) {
        let steps = seconds_to_samples(sample_rate, smoothing_seconds).floor();
        self.steps_per_ramp = steps.clamp(0.0, f64::from(u32::MAX)) as u32;
        self.current = self.target;
        self.step = 0.0;
        self.steps_remaining = 0;
    }

    /// Jump straight to `value` with no ramp.
    pub fn set_current_and_target(&mut self, value: f32) {
        self.current = value;
        self.target = value;
        self.step = 0.0;
        self.steps_remaining = 0;
    }

    /// Start ramping towards `value` from the current value.
    ///
    /// Setting the same target again is a no-op, so calling this once per
    /// block with an unchanged parameter doesn't restart the ramp.
    pub fn set_target(&mut self, value: f32) {
        if value == self.target {
            return;
        }

        if self.steps_per_ramp == 0 {
            self.set_current_and_target(value);
            return;
        }

        self.target = value;
        self.steps_remaining = self.steps_per_ramp;
        self.step = (self.target - self.current) / self.steps_per_ramp as f32;
    }

    /// Advance one sample and return the new value.
    #[inline]
    pub fn next_value(&mut self) -> f32 {
        if self.steps_remaining == 0 {
            return self.target;
        }

        self.steps_remaining -= 1;
        if self.steps_remaining == 0 {
            self.current = self.target;
        } else {
            self.current += self.step;
        }
        self.current
    }

    /// Advance `num_samples` samples at once, as if `next_value()` had been
    /// called that many times. Returns the value after the last step.
    pub fn skip(&mut self, num_samples: usize) -> f32 {
        if num_samples >= self.steps_remaining as usize {
            self.current = self.target;
            self.steps_remaining = 0;
            return self.target;
        }

        // `num_samples < steps_remaining <= u32::MAX` so this can't truncate.
        self.current += self.step * num_samples as f32;
        self.steps_remaining -= num_samples as u32;
        self.current
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn is_smoothing(&self) -> bool {
        self.steps_remaining > 0
    }

    /// Ramp length in samples.
    pub fn ramp_length(&self) -> u32 {
        self.steps_per_ramp
    }
}
