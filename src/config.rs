//! # Processing Configuration
//!
//! Everything the delay core needs to know *before* audio starts flowing:
//! the sample rate, the largest block the host will ever hand us, and how
//! many channels to keep history for. The host negotiates these once (and
//! again whenever they change); the processor turns them into a buffer size
//! and allocates exactly once.
//!
//! ## Sizing the Ring Buffer
//!
//! ```text
//! capacity = ceil(sample_rate * max_delay_seconds) + max_block_size
//! ```
//!
//! The first term is enough history for the longest delay. The extra block
//! of headroom guarantees that the samples written during the current block
//! never overtake the oldest sample a read in the same block may still need.
//!
//! At 48 kHz with a 2 second maximum and 1024-sample blocks that's
//! 97,024 samples per channel, about 380 KB of `f32`s.

use crate::error::ConfigError;

/// Longest delay the plugin's "Delay Time" parameter can reach.
pub const DEFAULT_MAX_DELAY_SECONDS: f32 = 2.0;

/// How long a delay time change takes to ramp to its new value.
///
/// 50 ms is short enough to feel immediate when turning the knob, and long
/// enough that the read head glides instead of jumping (a jump is heard as a
/// click).
pub const DEFAULT_SMOOTHING_SECONDS: f32 = 0.05;

/// Host-negotiated settings for one processing session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DelayConfig {
    /// Audio sample rate in Hz.
    pub sample_rate: f32,
    /// The largest number of samples a single `process_block()` call may carry.
    pub max_block_size: usize,
    /// Number of independent delay lines to allocate.
    pub num_channels: usize,
    /// Upper bound for the delay time, in seconds.
    pub max_delay_seconds: f32,
    /// Ramp length for delay time changes, in seconds. Zero disables smoothing.
    pub smoothing_seconds: f32,
}

impl DelayConfig {
    /// A configuration with the default 2 second maximum delay and 50 ms
    /// smoothing window.
    pub fn new(sample_rate: f32, max_block_size: usize, num_channels: usize) -> Self {
        Self {
            sample_rate,
            max_block_size,
            num_channels,
            max_delay_seconds: DEFAULT_MAX_DELAY_SECONDS,
            smoothing_seconds: DEFAULT_SMOOTHING_SECONDS,
        }
    }

    pub fn with_max_delay_seconds(mut self, seconds: f32) -> Self {
        self.max_delay_seconds = seconds;
        self
    }

    pub fn with_smoothing_seconds(mut self, seconds: f32) -> Self {
        self.smoothing_seconds = seconds;
        self
    }

    /// Check every field, returning the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.sample_rate.is_finite() || self.sample_rate <= 0.0 {
            return Err(ConfigError::InvalidSampleRate(self.sample_rate));
        }
        if self.max_block_size == 0 {
            return Err(ConfigError::ZeroBlockSize);
        }
        if self.num_channels == 0 {
            return Err(ConfigError::NoChannels);
        }
        if !self.max_delay_seconds.is_finite() || self.max_delay_seconds <= 0.0 {
            return Err(ConfigError::InvalidMaxDelay(self.max_delay_seconds));
        }
        if !self.smoothing_seconds.is_finite() || self.smoothing_seconds < 0.0 {
            return Err(ConfigError::InvalidSmoothingTime(self.smoothing_seconds));
        }
        Ok(())
    }

    /// The maximum delay expressed in whole samples, rounded up.
    pub fn max_delay_samples(&self) -> usize {
        seconds_to_samples(self.sample_rate, self.max_delay_seconds).ceil() as usize
    }

    /// Ring buffer length per channel: the maximum delay plus one block.
    pub fn capacity(&self) -> usize {
        self.max_delay_samples() + self.max_block_size
    }
}

/// Convert a duration to a (possibly fractional) number of samples.
///
/// Most decimal durations aren't exact in `f32`: `0.05_f32` is really
/// 0.0500000007 and `0.01_f32` is 0.0099999998. Multiplied out, these land
/// a hair above or below a whole number of samples, and a following
/// `ceil()` or `floor()` would be off by one. A product within a relative
/// `1e-6` of an integer is therefore snapped to that integer first.
pub(crate) fn seconds_to_samples(sample_rate: f32, seconds: f32) -> f64 {
    let samples = f64::from(sample_rate) * f64::from(seconds);
    let nearest = samples.round();
    if (samples - nearest).abs() <= 1e-6 * nearest.abs().max(1.0) {
        nearest
    } else {
        samples
    }
}
