//! # Delay Line (Multi-Channel Ring Buffer)
//!
//! A delay line stores audio samples and lets you read them back after a
//! specified time delay. It's the fundamental building block of every
//! delay, chorus, flanger and reverb.
//!
//! ## How a Ring Buffer Works
//!
//! Picture a circular tape loop. A "write head" records incoming audio onto
//! the tape, and a "read head" plays it back from a point further behind.
//! The distance between the two heads is the delay time.
//!
//! In code, each channel's "tape" is a `Vec<f32>` of fixed length (the
//! *capacity*), and the heads are positions into it. The write head is an
//! integer index owned by the [block processor](super::processor); the read
//! head is a real number, because delay times rarely land on whole samples:
//!
//! ```text
//! read_position = write_cursor - delay_samples      (then wrapped)
//! ```
//!
//! This type only stores samples. It doesn't know where the heads are, which
//! keeps the two-phase cursor handling in one place (the processor).
//!
//! ## Wrapping Without `%`
//!
//! `write_cursor - delay_samples` is usually negative near the start of the
//! buffer. Rust's `%` on a negative float keeps the sign of the dividend
//! (`-3.5 % 10.0 == -3.5`), which is not an index. [`wrap_position()`]
//! instead adds the capacity until the value is non-negative. Since the delay
//! is never longer than the buffer, that's at most one addition.
//!
//! ## Linear Interpolation
//!
//! For a read position of 441.3:
//!
//! ```text
//! a = buffer[441], b = buffer[442]
//! result = a + 0.3 * (b - a)
//! ```
//!
//! When the read position sits in the last slot, `b` is slot 0: the slot
//! after the end of a ring is its start.

use std::num::NonZeroUsize;

/// Normalize a read position into `[0, capacity)`.
///
/// Adds `capacity` until the position is non-negative. A position that
/// lands on exactly `capacity` after float rounding (e.g. `-0.00001 +
/// 88712.0` in `f32`) is folded back to the start so the caller can never
/// index one past the end.
///
/// The position is expected to be within one capacity of the valid range,
/// which holds whenever the delay is no longer than the buffer.
#[inline]
pub fn wrap_position(position: f32, capacity: usize) -> f32 {
    let capacity = capacity as f32;
    let mut position = position;
    while position < 0.0 {
        position += capacity;
    }
    while position >= capacity {
        position -= capacity;
    }
    position
}

/// One fixed-size ring buffer per audio channel, all the same length.
///
/// Allocated once by the processor's `configure()` so nothing is ever
/// allocated on the audio thread.
pub struct DelayBuffer {
    /// One `Vec` per channel, each exactly `capacity` samples long.
    channels: Vec<Vec<f32>>,
    capacity: NonZeroUsize,
}

impl DelayBuffer {
    /// Allocate `num_channels` silent lines of `capacity` samples each.
    ///
    /// `NonZeroUsize` makes an empty ring (where every index computation
    /// would divide by zero) impossible to construct.
    pub fn new(num_channels: usize, capacity: NonZeroUsize) -> Self {
        Self {
            channels: vec![vec![0.0; capacity.get()]; num_channels],
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Read `channel` at a fractional `position` in `[0, capacity)`, using
    /// linear interpolation between the two neighbouring slots.
    #[inline]
    pub fn read_fractional(&self, channel: usize, position: f32) -> f32 {
        let line = &self.channels[channel];
        let capacity = line.len();
        debug_assert!(
            (0.0..capacity as f32).contains(&position),
            "read position {position} outside [0, {capacity})"
        );

        // The `min()` is a no-op for in-range positions; it only keeps the
        // index in bounds if a caller skipped `wrap_position()`.
        let index_a = (position as usize).min(capacity - 1);
        let index_b = if index_a + 1 == capacity { 0 } else { index_a + 1 };
        let fraction = position - index_a as f32;

        let sample_a = line[index_a];
        let sample_b = line[index_b];
        sample_a + fraction * (sample_b - sample_a)
    }

    /// Overwrite the slot at `index`. This is where both new input and the
    /// feedback signal enter the line.
    #[inline]
    pub fn write_sample(&mut self, channel: usize, index: usize, value: f32) {
        self.channels[channel][index] = value;
    }

    /// The raw contents of one channel, oldest-to-newest order not implied.
    pub fn channel(&self, channel: usize) -> &[f32] {
        &self.channels[channel]
    }

    /// Zero every channel. The allocation is kept.
    pub fn clear(&mut self) {
        for line in &mut self.channels {
            line.fill(0.0);
        }
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer(num_channels: usize, capacity: usize) -> DelayBuffer {
        DelayBuffer::new(num_channels, NonZeroUsize::new(capacity).unwrap())
    }

    /// Write a ramp `1, 2, 3, ...` into channel 0 starting at slot 0.
    fn fill_ramp(dl: &mut DelayBuffer, count: usize) {
        for i in 0..count {
            let index = i % dl.capacity();
            dl.write_sample(0, index, (i + 1) as f32);
        }
    }

    #[test]
    fn test_wrap_position_negative() {
        // 5 - 10 on a ring of 100 is slot 95.
        assert_eq!(wrap_position(5.0 - 10.0, 100), 95.0);
        assert_eq!(wrap_position(-0.5, 100), 99.5);
        assert_eq!(wrap_position(42.25, 100), 42.25);
    }

    /// A value that rounds up to exactly `capacity` in `f32` must come back
    /// as a valid index.
    #[test]
    fn test_wrap_position_never_returns_capacity() {
        let capacity = 88_712;
        let wrapped = wrap_position(-0.000_01, capacity);
        assert!(
            wrapped < capacity as f32,
            "Expected a position below {capacity}, got {wrapped}"
        );
    }

    #[test]
    fn test_write_and_read_exact() {
        let mut dl = buffer(1, 100);
        dl.write_sample(0, 0, 0.75);

        // With the write cursor now at 1, one sample back is slot 0.
        let position = wrap_position(1.0 - 1.0, dl.capacity());
        let result = dl.read_fractional(0, position);
        assert!((result - 0.75).abs() < 1e-6, "Expected 0.75, got {result}");
    }

    #[test]
    fn test_interpolation() {
        let mut dl = buffer(1, 100);
        dl.write_sample(0, 0, 0.0);
        dl.write_sample(0, 1, 1.0);

        // Halfway between slot 0 (0.0) and slot 1 (1.0).
        let result = dl.read_fractional(0, 0.5);
        assert!((result - 0.5).abs() < 1e-6, "Expected 0.5, got {result}");

        // A quarter of the way.
        let result = dl.read_fractional(0, 0.25);
        assert!((result - 0.25).abs() < 1e-6, "Expected 0.25, got {result}");
    }

    /// Reading between the last slot and slot 0 interpolates across the seam.
    #[test]
    fn test_second_tap_wraps_to_start() {
        let mut dl = buffer(1, 4);
        dl.write_sample(0, 3, 2.0);
        dl.write_sample(0, 0, 4.0);

        let result = dl.read_fractional(0, 3.5);
        assert!((result - 3.0).abs() < 1e-6, "Expected 3.0, got {result}");
    }

    /// After more writes than slots, the buffer holds the most recent values.
    #[test]
    fn test_wrapping() {
        let mut dl = buffer(1, 4);

        // Values 1..=6 into 4 slots: [5, 6, 3, 4], write cursor ends at 2.
        fill_ramp(&mut dl, 6);
        assert_eq!(dl.channel(0), &[5.0, 6.0, 3.0, 4.0]);

        // One sample behind cursor 2 is slot 1, the last value written.
        let result = dl.read_fractional(0, wrap_position(2.0 - 1.0, 4));
        assert!((result - 6.0).abs() < 1e-6, "Expected 6.0, got {result}");

        // Three behind cursor 2 wraps to slot 3.
        let result = dl.read_fractional(0, wrap_position(2.0 - 3.0, 4));
        assert!((result - 4.0).abs() < 1e-6, "Expected 4.0, got {result}");
    }

    /// Reading back N samples behind the cursor returns values in FIFO order.
    #[test]
    fn test_fifo_sequence() {
        let mut dl = buffer(1, 10);
        fill_ramp(&mut dl, 5);
        let cursor = 5.0;

        for (delay, expected) in [(1.0, 5.0), (2.0, 4.0), (3.0, 3.0), (5.0, 1.0)] {
            let result = dl.read_fractional(0, wrap_position(cursor - delay, 10));
            assert!(
                (result - expected).abs() < 1e-6,
                "Delay {delay}: expected {expected}, got {result}"
            );
        }
    }

    #[test]
    fn test_channels_are_independent() {
        let mut dl = buffer(2, 8);
        dl.write_sample(0, 3, 1.0);

        assert_eq!(dl.read_fractional(0, 3.0), 1.0);
        assert_eq!(dl.read_fractional(1, 3.0), 0.0);
    }

    #[test]
    fn test_clear() {
        let mut dl = buffer(2, 10);
        dl.write_sample(0, 0, 0.5);
        dl.write_sample(1, 9, -0.5);
        dl.clear();

        assert!(dl.channel(0).iter().all(|&s| s == 0.0));
        assert!(dl.channel(1).iter().all(|&s| s == 0.0));
        assert_eq!(dl.capacity(), 10);
        assert_eq!(dl.num_channels(), 2);
    }

    /// A fresh buffer is silent everywhere, including fractional positions.
    #[test]
    fn test_silence_in_silence_out() {
        let dl = buffer(1, 100);

        for position in [0.0, 10.5, 50.0, 99.9] {
            let result = dl.read_fractional(0, position);
            assert!(
                result.abs() < 1e-6,
                "Expected silence at {position}, got {result}"
            );
        }
    }
}
