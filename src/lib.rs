//! # Loveless Echo: An AU/VST3/CLAP Feedback Delay
//!
//! A clean digital echo with three controls (delay time, feedback, mix),
//! built with [nih-plug](https://github.com/robbert-vdh/nih-plug) and
//! exported as CLAP, VST3 and (through clap-wrapper) AUv2.
//!
//! The DSP lives in [`dsp`] and doesn't depend on the plugin host at all:
//! [`DelayProcessor`] takes a [`DelayConfig`], a block of samples and a
//! [`ParameterSource`], which makes it usable (and testable) on its own.
//! This file is only the adapter that plugs that core into nih-plug.
//!
//! ## Signal Flow
//!
//! ```text
//! Input ──┬─────────────────────────────────── × (1 - mix) ───┐
//!         │                                                   │
//!         │    ┌─────────────────────────────────────┐        │
//!         │    │            FEEDBACK LOOP            │        │
//!         │    │                                     │        │
//!         └──►(+)──► [Ring Buffer / Delay Line] ─────┤        │
//!              ▲      (read `delay` samples back,    │        │
//!              │       linearly interpolated)        │        │
//!              │                                     ▼        │
//!              └─────────── × feedback ◄──── delayed_sample   │
//!                                                    │        │
//!                                                    └─ × mix ─►(+)──► Output
//! ```

pub mod config;
pub mod dsp;
pub mod error;
pub mod params;

use std::num::NonZeroU32;
use std::sync::Arc;

use nih_plug::prelude::*;

pub use config::DelayConfig;
pub use dsp::processor::DelayProcessor;
pub use error::ConfigError;
pub use params::{AtomicParams, ParamSnapshot, ParameterSource, PluginParams};

/// The plugin: shared parameters plus the audio-thread-only delay core.
///
/// Parameters are shared with the host through an `Arc` and read with
/// atomic loads from any thread. The processor is touched only by the
/// audio thread (and by `initialize()`, which the host never runs
/// concurrently with `process()`), so no locking is needed.
struct LovelessEcho {
    params: Arc<PluginParams>,

    /// `None` until the host calls `initialize()` and tells us the sample
    /// rate, block size and channel count.
    processor: Option<DelayProcessor>,
}

impl Default for LovelessEcho {
    fn default() -> Self {
        Self {
            params: Arc::new(PluginParams::default()),
            processor: None,
        }
    }
}

impl Plugin for LovelessEcho {
    const NAME: &'static str = "Loveless Echo";
    const VENDOR: &'static str = "Loveless Audio";
    const URL: &'static str = "";
    const EMAIL: &'static str = "steve.loveless@gmail.com";
    const VERSION: &'static str = env!("CARGO_PKG_VERSION");

    // Stereo first, since that's what most DAW tracks are, then mono.
    const AUDIO_IO_LAYOUTS: &'static [AudioIOLayout] = &[
        AudioIOLayout {
            main_input_channels: NonZeroU32::new(2),
            main_output_channels: NonZeroU32::new(2),
            aux_input_ports: &[],
            aux_output_ports: &[],
            names: PortNames::const_default(),
        },
        AudioIOLayout {
            main_input_channels: NonZeroU32::new(1),
            main_output_channels: NonZeroU32::new(1),
            aux_input_ports: &[],
            aux_output_ports: &[],
            names: PortNames::const_default(),
        },
    ];

    const MIDI_INPUT: MidiConfig = MidiConfig::None;

    // Parameters are read once per block and delay time is smoothed by the
    // core, so splitting blocks at automation points would buy nothing.
    const SAMPLE_ACCURATE_AUTOMATION: bool = false;

    type SysExMessage = ();
    type BackgroundTask = ();

    fn params(&self) -> Arc<dyn Params> {
        self.params.clone()
    }

    /// Called when the plugin is loaded and whenever the sample rate, block
    /// size or channel layout changes. The delay lines are (re)allocated
    /// here and nowhere else.
    ///
    /// Returning `false` tells the host we can't run with this configuration.
    fn initialize(
        &mut self,
        audio_io_layout: &AudioIOLayout,
        buffer_config: &BufferConfig,
        _context: &mut impl InitContext<Self>,
    ) -> bool {
        let num_channels = audio_io_layout
            .main_input_channels
            .map(|c| c.get() as usize)
            .unwrap_or(2);

        let config = DelayConfig::new(
            buffer_config.sample_rate,
            buffer_config.max_buffer_size as usize,
            num_channels,
        );

        let result = match self.processor.as_mut() {
            Some(processor) => processor.configure(config),
            None => DelayProcessor::new(config).map(|processor| {
                self.processor = Some(processor);
            }),
        };

        match result {
            Ok(()) => {
                nih_log!(
                    "Initialized at {} Hz, {} channel(s), blocks up to {} samples",
                    config.sample_rate,
                    config.num_channels,
                    config.max_block_size
                );
                true
            }
            Err(err) => {
                nih_error!("Rejected audio configuration: {}", err);
                false
            }
        }
    }

    /// Called when playback stops or the plugin is re-activated. Clearing
    /// the delay lines keeps old echoes from bursting out on the next play.
    fn reset(&mut self) {
        if let Some(processor) = self.processor.as_mut() {
            processor.release();
        }
    }

    fn process(
        &mut self,
        buffer: &mut Buffer,
        _aux: &mut AuxiliaryBuffers,
        _context: &mut impl ProcessContext<Self>,
    ) -> ProcessStatus {
        // nih-plug always initializes before processing; this only guards
        // against a host that ignores the failed `initialize()`.
        let Some(processor) = self.processor.as_mut() else {
            return ProcessStatus::Normal;
        };

        processor.process_block(buffer.as_slice(), self.params.as_ref());

        // Keep the host calling `process()` after the input ends so the
        // echoes ring out instead of being cut off.
        ProcessStatus::Tail(processor.tail_samples(self.params.as_ref()))
    }
}

// ─────────────────────────────────────────────────────────────────────
// Plugin format trait implementations
// ─────────────────────────────────────────────────────────────────────

impl ClapPlugin for LovelessEcho {
    const CLAP_ID: &'static str = "com.loveless-audio.loveless-echo";
    const CLAP_DESCRIPTION: Option<&'static str> = Some("A clean feedback echo");
    const CLAP_MANUAL_URL: Option<&'static str> = None;
    const CLAP_SUPPORT_URL: Option<&'static str> = None;
    const CLAP_FEATURES: &'static [ClapFeature] = &[
        ClapFeature::AudioEffect,
        ClapFeature::Stereo,
        ClapFeature::Mono,
        ClapFeature::Delay,
    ];
}

impl Vst3Plugin for LovelessEcho {
    // Must be globally unique across all VST3 plugins.
    const VST3_CLASS_ID: [u8; 16] = *b"LvlssEcho___v001";

    const VST3_SUBCATEGORIES: &'static [Vst3SubCategory] =
        &[Vst3SubCategory::Fx, Vst3SubCategory::Delay];
}

// ─────────────────────────────────────────────────────────────────────
// Export macros
// ─────────────────────────────────────────────────────────────────────
//
// nih_export_clap! exports the `clap_entry` symbol for CLAP hosts.
// nih_export_vst3! exports `GetPluginFactory` for VST3 hosts.
// export_auv2! re-exports the CLAP entry point as an Audio Unit so Logic
// Pro can find it.

nih_export_clap!(LovelessEcho);
nih_export_vst3!(LovelessEcho);
clap_wrapper::export_auv2!();
