//! # DSP (Digital Signal Processing) Core
//!
//! Everything that touches audio samples, with no dependency on a plugin
//! host:
//!
//! - **`smoother`**: a linear ramp that glides the delay time to new values
//!   instead of jumping, so knob moves don't click.
//!
//! - **`delay_line`**: one ring buffer per channel, with fractional reads
//!   via linear interpolation.
//!
//! - **`processor`**: the echo itself. Reads the delayed signal, mixes it
//!   with the dry input, feeds it back into the line, and owns the buffer's
//!   lifecycle (configure, release).

pub mod delay_line;
pub mod processor;
pub mod smoother;
