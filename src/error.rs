//! Errors raised while configuring the delay core.
//!
//! Only configuration can fail. Once a [`DelayProcessor`](crate::dsp::processor::DelayProcessor)
//! exists, processing a block has no failure modes: out-of-range parameters
//! are clamped and host contract violations are debug assertions.

use thiserror::Error;

/// A [`DelayConfig`](crate::config::DelayConfig) field holds a value the
/// delay line can't be built from.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ConfigError {
    #[error("sample rate must be a positive, finite number of Hz (got {0})")]
    InvalidSampleRate(f32),

    #[error("maximum block size must be at least one sample")]
    ZeroBlockSize,

    #[error("at least one audio channel is required")]
    NoChannels,

    #[error("maximum delay must be a positive, finite number of seconds (got {0})")]
    InvalidMaxDelay(f32),

    #[error("smoothing time must be a finite, non-negative number of seconds (got {0})")]
    InvalidSmoothingTime(f32),
}
