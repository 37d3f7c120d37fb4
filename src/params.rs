//! # Plugin Parameters
//!
//! Three knobs, all owned outside the delay core:
//!
//! | ID          | Name       | Range        | Default |
//! |-------------|------------|--------------|---------|
//! | `delayTime` | Delay Time | 1 – 2000 ms  | 500 ms  |
//! | `feedback`  | Feedback   | 0 – 95 %     | 40 %    |
//! | `mix`       | Mix        | 0 – 100 %    | 50 %    |
//!
//! The core never talks to a parameter store directly. It asks a
//! [`ParameterSource`] for the current values once per block and works from
//! that [`ParamSnapshot`]. Three sources exist:
//!
//! - [`PluginParams`], the nih-plug parameter struct the host automates and
//!   saves with the project.
//! - [`AtomicParams`], a standalone lock-free store for driving the core
//!   without a plugin host (tests, offline rendering, other frontends).
//! - [`ParamSnapshot`] itself, for fixed values.
//!
//! All of them are read with plain atomic loads (or no loads at all), so
//! reading parameters on the audio thread never blocks.
//!
//! ## Why no nih-plug smoothing here?
//!
//! The delay core smooths delay time itself, per sample, in delay *samples*
//! rather than milliseconds. Feedback and mix are read once per block; a
//! block-sized step in a gain doesn't produce the discontinuity that jumping
//! the read head does.

use std::sync::atomic::{AtomicU32, Ordering};

use nih_plug::prelude::*;

pub const DELAY_TIME_MIN_MS: f32 = 1.0;
pub const DELAY_TIME_MAX_MS: f32 = 2000.0;
pub const DELAY_TIME_DEFAULT_MS: f32 = 500.0;

/// Capped below 1.0: at 1.0 the repeats never decay, above it they grow
/// until they clip.
pub const FEEDBACK_MAX: f32 = 0.95;
pub const FEEDBACK_DEFAULT: f32 = 0.4;

pub const MIX_DEFAULT: f32 = 0.5;

/// The values the block processor works from for one block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSnapshot {
    pub delay_time_ms: f32,
    pub feedback: f32,
    pub mix: f32,
}

impl Default for ParamSnapshot {
    fn default() -> Self {
        Self {
            delay_time_ms: DELAY_TIME_DEFAULT_MS,
            feedback: FEEDBACK_DEFAULT,
            mix: MIX_DEFAULT,
        }
    }
}

impl ParamSnapshot {
    /// Force every value into its documented range.
    ///
    /// Clamping is cheaper than rejecting and a clamped knob is far better
    /// than a dropped block. NaN (which `clamp()` would pass through) is
    /// replaced by the parameter's default.
    pub fn clamped(self) -> Self {
        Self {
            delay_time_ms: clamp_or(
                self.delay_time_ms,
                DELAY_TIME_MIN_MS,
                DELAY_TIME_MAX_MS,
                DELAY_TIME_DEFAULT_MS,
            ),
            feedback: clamp_or(self.feedback, 0.0, FEEDBACK_MAX, FEEDBACK_DEFAULT),
            mix: clamp_or(self.mix, 0.0, 1.0, MIX_DEFAULT),
        }
    }
}

fn clamp_or(value: f32, min: f32, max: f32, fallback: f32) -> f32 {
    if value.is_nan() {
        fallback
    } else {
        value.clamp(min, max)
    }
}

/// Anything the block processor can read the three effect parameters from.
///
/// Implementations must be safe to call on the audio thread: no locks, no
/// allocation.
pub trait ParameterSource {
    fn snapshot(&self) -> ParamSnapshot;
}

impl ParameterSource for ParamSnapshot {
    fn snapshot(&self) -> ParamSnapshot {
        *self
    }
}

// ─────────────────────────────────────────────────────────────────────
// nih-plug parameters
// ─────────────────────────────────────────────────────────────────────

/// All user-facing parameters, registered with the host by
/// `#[derive(Params)]`. The host also persists them by ID, which is the
/// plugin's entire saved state.
///
/// The `#[id]` strings are part of every saved project and preset. Never
/// change them.
#[derive(Params)]
pub struct PluginParams {
    /// **Delay Time**: the gap between the original and the first echo.
    #[id = "delayTime"]
    pub delay_time: FloatParam,

    /// **Feedback**: how much of each echo goes back into the line,
    /// i.e. how many repeats you hear.
    #[id = "feedback"]
    pub feedback: FloatParam,

    /// **Mix**: 0 % is the dry signal only, 100 % the echoes only.
    #[id = "mix"]
    pub mix: FloatParam,
}

impl Default for PluginParams {
    fn default() -> Self {
        Self {
            delay_time: FloatParam::new(
                "Delay Time",
                DELAY_TIME_DEFAULT_MS,
                FloatRange::Skewed {
                    min: DELAY_TIME_MIN_MS,
                    max: DELAY_TIME_MAX_MS,
                    // More knob travel for short delays, where a few ms
                    // are clearly audible.
                    factor: FloatRange::skew_factor(-1.0),
                },
            )
            .with_unit(" ms")
            .with_step_size(1.0),

            feedback: FloatParam::new(
                "Feedback",
                FEEDBACK_DEFAULT,
                FloatRange::Linear {
                    min: 0.0,
                    max: FEEDBACK_MAX,
                },
            )
            .with_unit("%")
            .with_step_size(0.01)
            .with_value_to_string(formatters::v2s_f32_percentage(0))
            .with_string_to_value(formatters::s2v_f32_percentage()),

            mix: FloatParam::new(
                "Mix",
                MIX_DEFAULT,
                FloatRange::Linear { min: 0.0, max: 1.0 },
            )
            .with_unit("%")
            .with_step_size(0.01)
            .with_value_to_string(formatters::v2s_f32_percentage(0))
            .with_string_to_value(formatters::s2v_f32_percentage()),
        }
    }
}

impl ParameterSource for PluginParams {
    fn snapshot(&self) -> ParamSnapshot {
        // `value()` is an atomic load of the (modulated) plain value.
        ParamSnapshot {
            delay_time_ms: self.delay_time.value(),
            feedback: self.feedback.value(),
            mix: self.mix.value(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────
// Standalone lock-free store
// ─────────────────────────────────────────────────────────────────────

/// An `f32` stored as its bit pattern in an `AtomicU32`.
#[derive(Debug)]
struct AtomicF32(AtomicU32);

impl AtomicF32 {
    fn new(value: f32) -> Self {
        Self(AtomicU32::new(value.to_bits()))
    }

    fn load(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }

    fn store(&self, value: f32) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }
}

/// Parameter values shared between a control thread (writer) and the audio
/// thread (reader) without a plugin host.
///
/// Each value is published independently with relaxed ordering. The reader
/// may see a new delay time together with an old mix for one block, which
/// is harmless: the next block picks up the rest.
#[derive(Debug)]
pub struct AtomicParams {
    delay_time_ms: AtomicF32,
    feedback: AtomicF32,
    mix: AtomicF32,
}

impl Default for AtomicParams {
    fn default() -> Self {
        Self::new(ParamSnapshot::default())
    }
}

impl AtomicParams {
    pub fn new(initial: ParamSnapshot) -> Self {
        Self {
            delay_time_ms: AtomicF32::new(initial.delay_time_ms),
            feedback: AtomicF32::new(initial.feedback),
            mix: AtomicF32::new(initial.mix),
        }
    }

    pub fn set_delay_time_ms(&self, value: f32) {
        self.delay_time_ms.store(value);
    }

    pub fn set_feedback(&self, value: f32) {
        self.feedback.store(value);
    }

    pub fn set_mix(&self, value: f32) {
        self.mix.store(value);
    }

    pub fn set(&self, values: ParamSnapshot) {
        self.set_delay_time_ms(values.delay_time_ms);
        self.set_feedback(values.feedback);
        self.set_mix(values.mix);
    }
}

impl ParameterSource for AtomicParams {
    fn snapshot(&self) -> ParamSnapshot {
        ParamSnapshot {
            delay_time_ms: self.delay_time_ms.load(),
            feedback: self.feedback.load(),
            mix: self.mix.load(),
        }
    }
}
