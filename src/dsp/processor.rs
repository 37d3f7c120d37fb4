//! # Block Processor
//!
//! Ties the [`DelayBuffer`], the [`LinearSmoother`] and the parameters
//! together into the echo effect. One call to
//! [`process_block()`](DelayProcessor::process_block) transforms one block
//! of audio in place.
//!
//! ## Per-Sample Algorithm
//!
//! ```text
//! delay_samples = smoother.next_value()
//! read_pos      = wrap(cursor - delay_samples)
//! delayed       = line.read_fractional(read_pos)
//! output        = input * (1 - mix) + delayed * mix
//! line[cursor]  = input + delayed * feedback      (the *original* input)
//! cursor        = (cursor + 1) mod capacity
//! ```
//!
//! ## Two-Phase Cursor
//!
//! Channels are processed one after another, each over the whole block.
//! Every channel starts from the same write cursor and the same smoother
//! state, advancing *local copies* of both. Only after the last channel do
//! the shared cursor and smoother move forward, by exactly one block:
//!
//! ```text
//!             block start                block end
//! channel 0:  cursor c, smoother s  ──►  c + N, s + N   (discarded)
//! channel 1:  cursor c, smoother s  ──►  c + N, s + N   (discarded)
//! shared:     cursor c, smoother s  ─────────────────►  c + N, s + N
//! ```
//!
//! So at a given offset within the block every channel reads with the same
//! delay time, and the block always ends at `(c + N) mod capacity` however
//! many channels there are.

use std::num::NonZeroUsize;

use nih_plug::prelude::*;
use no_denormals::no_denormals;

use super::delay_line::{wrap_position, DelayBuffer};
use super::smoother::LinearSmoother;
use crate::config::DelayConfig;
use crate::error::ConfigError;
use crate::params::{ParamSnapshot, ParameterSource};

/// A feedback level below this counts as "no feedback" for tail reporting.
const TAIL_FEEDBACK_THRESHOLD: f32 = 0.001;

/// The host-agnostic delay effect: one ring buffer per channel, a shared
/// write cursor and a shared delay-time smoother.
///
/// A `DelayProcessor` is always configured: the only way to get one is
/// [`new()`](Self::new), which allocates the buffer. There is no
/// "unconfigured" state for `process_block()` to trip over.
pub struct DelayProcessor {
    config: DelayConfig,
    buffer: DelayBuffer,
    /// Next slot to write, shared by all channels. Only moves between blocks.
    write_cursor: usize,
    /// Delay time in samples, ramping towards the latest parameter value.
    smoother: LinearSmoother,
    /// Upper bound for the smoother's target, in samples.
    max_delay_samples: f32,
}

impl DelayProcessor {
    /// Validate `config` and allocate silent delay lines for it.
    pub fn new(config: DelayConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut smoother = LinearSmoother::new();
        smoother.reset(config.sample_rate, config.smoothing_seconds);

        Ok(Self {
            buffer: DelayBuffer::new(config.num_channels, capacity_for(&config)?),
            write_cursor: 0,
            smoother,
            max_delay_samples: config.max_delay_samples() as f32,
            config,
        })
    }

    /// Re-run the configuration step: size and clear the delay lines, rewind
    /// the write cursor and reset the smoother.
    ///
    /// Calling this twice with the same `config` leaves a processor
    /// indistinguishable from a freshly constructed one. When the buffer
    /// geometry is unchanged the existing allocation is reused.
    ///
    /// On error the processor is left untouched.
    pub fn configure(&mut self, config: DelayConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let capacity = capacity_for(&config)?;

        if self.buffer.capacity() == capacity.get()
            && self.buffer.num_channels() == config.num_channels
        {
            self.buffer.clear();
        } else {
            nih_log!(
                "Allocating delay lines: {} channel(s) x {} samples",
                config.num_channels,
                capacity
            );
            self.buffer = DelayBuffer::new(config.num_channels, capacity);
        }

        self.write_cursor = 0;
        self.smoother = LinearSmoother::new();
        self.smoother.reset(config.sample_rate, config.smoothing_seconds);
        self.max_delay_samples = config.max_delay_samples() as f32;
        self.config = config;

        Ok(())
    }

    /// Silence the delay lines, e.g. when playback stops, so stale echoes
    /// don't play when it resumes. Keeps the allocation, the cursor and the
    /// smoother.
    ///
    /// Doesn't allocate, so it's safe to call from the audio thread.
    pub fn release(&mut self) {
        self.buffer.clear();
    }

    /// Process one block in place.
    ///
    /// `block` holds one slice per channel, all the same length. Parameters
    /// are read from `params` once, at the start of the block.
    ///
    /// The host contract says a block never has more channels or samples
    /// than were configured. That's checked in debug builds only; in release
    /// builds extra channels pass through untouched.
    pub fn process_block(&mut self, block: &mut [&mut [f32]], params: &impl ParameterSource) {
        let num_samples = block.first().map_or(0, |channel| channel.len());
        nih_debug_assert!(
            num_samples <= self.config.max_block_size,
            "block of {} samples exceeds the configured maximum of {}",
            num_samples,
            self.config.max_block_size
        );
        nih_debug_assert!(
            block.len() <= self.buffer.num_channels(),
            "block has {} channels, only {} were configured",
            block.len(),
            self.buffer.num_channels()
        );

        let ParamSnapshot {
            delay_time_ms,
            feedback,
            mix,
        } = params.snapshot().clamped();

        let target_samples = self
            .delay_ms_to_samples(delay_time_ms)
            .min(self.max_delay_samples);
        self.smoother.set_target(target_samples);

        let dry_mix = 1.0 - mix;
        let wet_mix = mix;

        let mut block_end_smoother = None;
        no_denormals(|| {
            block_end_smoother = self.process_channels(block, dry_mix, wet_mix, feedback);
        });

        // Phase two: move the shared state forward by one block, once.
        match block_end_smoother {
            Some(smoother) => self.smoother = smoother,
            None => {
                self.smoother.skip(num_samples);
            }
        }
        self.write_cursor = (self.write_cursor + num_samples) % self.buffer.capacity();
    }

    /// Phase one: every channel runs the full block from the shared
    /// block-start state. Returns the smoother state a channel ended in, or
    /// `None` if there were no channels to process.
    fn process_channels(
        &mut self,
        block: &mut [&mut [f32]],
        dry_mix: f32,
        wet_mix: f32,
        feedback: f32,
    ) -> Option<LinearSmoother> {
        let capacity = self.buffer.capacity();
        let num_channels = self.buffer.num_channels();
        let mut block_end_smoother = None;

        for (channel, samples) in block.iter_mut().enumerate().take(num_channels) {
            // Local copies, seeded from the shared block-start state.
            let mut cursor = self.write_cursor;
            let mut smoother = self.smoother;

            for sample in samples.iter_mut() {
                // Step 1: GLIDE the delay time one sample closer to its
                // target. A knob move becomes a smooth read-head sweep
                // instead of a jump.
                let delay_samples = smoother.next_value();

                // Step 2: LOCATE the read head `delay_samples` behind the
                // write head, wrapped back into the ring.
                let read_position = wrap_position(cursor as f32 - delay_samples, capacity);

                // Step 3: READ the delayed sample, interpolating between
                // the two nearest stored samples.
                let delayed = self.buffer.read_fractional(channel, read_position);

                // Step 4: MIX dry and wet into the output, in place.
                //
                //   mix = 0.0 → input only (bypass)
                //   mix = 1.0 → echoes only
                let input = *sample;
                *sample = input * dry_mix + delayed * wet_mix;

                // Step 5: WRITE the input plus the scaled echo back into the
                // line. With feedback 0.4 each repeat is 40% of the last.
                // `input` is the value from before step 4 overwrote it.
                self.buffer
                    .write_sample(channel, cursor, input + delayed * feedback);

                // Step 6: ADVANCE this channel's copy of the write head.
                cursor += 1;
                if cursor == capacity {
                    cursor = 0;
                }
            }

            block_end_smoother = Some(smoother);
        }

        block_end_smoother
    }

    /// How many samples the effect keeps ringing after the input goes
    /// silent, for the given parameters.
    ///
    /// Each repeat is the previous one times `feedback`, so after `n`
    /// repeats the level is `feedback^n`. Solving `feedback^n = 0.001`
    /// (-60 dB) gives `n = -3 / log10(feedback)` repeats of one delay each.
    /// Without feedback there's a single echo, one delay period long.
    pub fn tail_samples(&self, params: &impl ParameterSource) -> u32 {
        let ParamSnapshot {
            delay_time_ms,
            feedback,
            ..
        } = params.snapshot().clamped();
        let delay_samples = self
            .delay_ms_to_samples(delay_time_ms)
            .min(self.max_delay_samples);

        if feedback > TAIL_FEEDBACK_THRESHOLD {
            let repeats = -3.0 / feedback.log10();
            (repeats * delay_samples).ceil() as u32
        } else {
            delay_samples.ceil() as u32
        }
    }

    fn delay_ms_to_samples(&self, delay_ms: f32) -> f32 {
        self.config.sample_rate * delay_ms / 1000.0
    }

    pub fn config(&self) -> &DelayConfig {
        &self.config
    }

    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    pub fn num_channels(&self) -> usize {
        self.buffer.num_channels()
    }

    pub fn write_cursor(&self) -> usize {
        self.write_cursor
    }

    /// The smoothed delay time in samples as of the end of the last block.
    pub fn current_delay_samples(&self) -> f32 {
        self.smoother.current()
    }

    pub fn delay_buffer(&self) -> &DelayBuffer {
        &self.buffer
    }
}

fn capacity_for(config: &DelayConfig) -> Result<NonZeroUsize, ConfigError> {
    // `validate()` guarantees a non-zero block size, so this only fails if
    // that check is ever removed.
    NonZeroUsize::new(config.capacity()).ok_or(ConfigError::ZeroBlockSize)
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────
