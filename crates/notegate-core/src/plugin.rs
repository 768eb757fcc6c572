//! Core plugin trait definitions.
//!
//! Plugins go through a two-phase lifecycle:
//!
//! - **[`Plugin`]** (unprepared): holds parameters and anything else that
//!   doesn't depend on the audio configuration. [`Plugin::prepare()`] consumes
//!   it once the sample rate and block size are known.
//! - **[`AudioProcessor`]** (prepared): runs on the audio thread.
//!   [`AudioProcessor::unprepare()`] turns it back into the plugin, e.g. for a
//!   sample rate change.
//!
//! ```text
//! Plugin::default() -> Plugin (unprepared, holds parameters)
//!                      |  Plugin::prepare(config)
//!                      v
//!                AudioProcessor (prepared, ready for audio)
//!                      |  AudioProcessor::unprepare()
//!                      v
//!                 Plugin (unprepared, parameters preserved)
//! ```
//!
//! A processor can't exist without a valid configuration, so there are no
//! placeholder sample rates to guard against.

use crate::buffer::Buffer;
use crate::error::PluginResult;
use crate::midi::{MidiBuffer, MidiEvent};
use crate::parameter_store::ParameterStore;
use crate::parameter_types::Parameters;
use crate::process_context::ProcessContext;

// =============================================================================
// HasParameters Trait
// =============================================================================

/// Types that hold a parameter collection.
///
/// Shared by [`Plugin`] and [`AudioProcessor`]. Parameters use atomic storage,
/// so shared access is enough for reads and writes; plugins that hand
/// parameters to an editor keep them in an `Arc`.
///
/// ```ignore
/// #[derive(Default, HasParameters)]
/// pub struct GatePlugin {
///     #[parameters]
///     parameters: Arc<GateParameters>,
/// }
/// ```
pub trait HasParameters: Send + 'static {
    type Parameters: Parameters + ParameterStore;

    fn parameters(&self) -> &Self::Parameters;
}

// =============================================================================
// Processor Configuration Types
// =============================================================================

/// Marker trait for the configuration handed to [`Plugin::prepare()`].
///
/// - [`NoConfig`]: stateless plugins
/// - [`AudioSetup`]: sample rate and maximum block size
/// - [`FullAudioSetup`]: additionally the negotiated bus layout
pub trait ProcessorConfig: Clone + Send + 'static {}

/// For plugins without sample-rate-dependent state.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct NoConfig;
impl ProcessorConfig for NoConfig {}

/// Sample rate and maximum block size.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioSetup {
    /// Sample rate in Hz (e.g., 44100.0, 48000.0).
    pub sample_rate: f64,
    /// Maximum number of samples per process() call.
    pub max_buffer_size: usize,
}
impl ProcessorConfig for AudioSetup {}

/// [`AudioSetup`] plus the negotiated bus layout.
#[derive(Clone, Debug, PartialEq)]
pub struct FullAudioSetup {
    pub sample_rate: f64,
    pub max_buffer_size: usize,
    pub layout: BusLayout,
}
impl ProcessorConfig for FullAudioSetup {}

/// Channel layout of the main buses.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BusLayout {
    pub main_input_channels: u32,
    pub main_output_channels: u32,
    pub aux_input_count: usize,
    pub aux_output_count: usize,
}

impl BusLayout {
    /// 2 in, 2 out, no aux buses.
    pub const fn stereo() -> Self {
        Self {
            main_input_channels: 2,
            main_output_channels: 2,
            aux_input_count: 0,
            aux_output_count: 0,
        }
    }

    /// Layout declared by a plugin's bus info.
    pub fn from_plugin<P: Plugin>(plugin: &P) -> Self {
        Self {
            main_input_channels: plugin.input_bus_info(0).map(|b| b.channel_count).unwrap_or(0),
            main_output_channels: plugin.output_bus_info(0).map(|b| b.channel_count).unwrap_or(0),
            aux_input_count: plugin.input_bus_count().saturating_sub(1),
            aux_output_count: plugin.output_bus_count().saturating_sub(1),
        }
    }

    #[inline]
    pub fn is_stereo(&self) -> bool {
        self.main_input_channels == 2 && self.main_output_channels == 2
    }
}

// =============================================================================
// Bus Configuration
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BusType {
    #[default]
    Main,
    /// Auxiliary bus (e.g., sidechain input).
    Aux,
}

/// Information about an audio bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusInfo {
    /// Display name for the bus (e.g., "Input", "Sidechain").
    pub name: &'static str,
    pub bus_type: BusType,
    pub channel_count: u32,
    pub is_default_active: bool,
}

impl BusInfo {
    pub const fn stereo(name: &'static str) -> Self {
        Self {
            name,
            bus_type: BusType::Main,
            channel_count: 2,
            is_default_active: true,
        }
    }

    pub const fn mono(name: &'static str) -> Self {
        Self {
            name,
            bus_type: BusType::Main,
            channel_count: 1,
            is_default_active: true,
        }
    }
}

// =============================================================================
// AudioProcessor Trait
// =============================================================================

/// The prepared processor.
///
/// `process()` and `process_midi()` run on the audio thread and must be
/// real-time safe: no allocation, no locks that can block, no syscalls,
/// no unbounded loops.
///
/// Per block the host adapter calls [`process_midi`](Self::process_midi)
/// first and then [`process`](Self::process) (or
/// [`process_f64`](Self::process_f64)).
pub trait AudioProcessor: HasParameters {
    /// The unprepared plugin type that created this processor.
    type Plugin: Plugin<Processor = Self, Parameters = Self::Parameters>;

    /// Process one block of audio.
    fn process(&mut self, buffer: &mut Buffer, context: &ProcessContext);

    /// Return to the unprepared state, keeping parameters.
    fn unprepare(self) -> Self::Plugin
    where
        Self: Sized;

    /// Called when processing starts or stops.
    fn set_active(&mut self, _active: bool) {}

    fn tail_samples(&self) -> u32 {
        0
    }

    fn latency_samples(&self) -> u32 {
        0
    }

    // =========================================================================
    // 64-bit Processing Support
    // =========================================================================

    /// True if [`process_f64`](Self::process_f64) is implemented natively.
    ///
    /// When false the host adapter converts to f32 with pre-allocated
    /// buffers and calls [`process`](Self::process).
    fn supports_double_precision(&self) -> bool {
        false
    }

    /// Process one block at double precision.
    ///
    /// The default converts f64 -> f32, calls `process()` and converts back.
    /// It allocates, so host adapters only rely on it as a last resort.
    fn process_f64(&mut self, buffer: &mut Buffer<f64>, context: &ProcessContext) {
        let num_samples = buffer.num_samples();

        let input_f32: Vec<Vec<f32>> = buffer
            .inputs()
            .map(|ch| ch.iter().map(|&s| s as f32).collect())
            .collect();
        let mut output_f32: Vec<Vec<f32>> = (0..buffer.num_output_channels())
            .map(|_| vec![0.0f32; num_samples])
            .collect();

        {
            let mut buffer_f32 = Buffer::new(
                input_f32.iter().map(|v| v.as_slice()),
                output_f32.iter_mut().map(|v| v.as_mut_slice()),
                num_samples,
            );
            self.process(&mut buffer_f32, context);
        }

        for (output, converted) in buffer.outputs_mut().zip(output_f32.iter()) {
            for (o, s) in output.iter_mut().zip(converted.iter()) {
                *o = *s as f64;
            }
        }
    }

    // =========================================================================
    // State
    // =========================================================================

    /// Serialize state (called when the host saves a session or preset).
    fn save_state(&self) -> PluginResult<Vec<u8>> {
        Ok(self.parameters().save_state())
    }

    /// Restore state produced by [`save_state`](Self::save_state).
    fn load_state(&mut self, data: &[u8]) -> PluginResult<()> {
        self.parameters().load_state(data)
    }

    // =========================================================================
    // MIDI Processing
    // =========================================================================

    /// Process this block's MIDI events.
    ///
    /// `input` is sorted by `sample_offset`. The default passes everything
    /// through unchanged.
    fn process_midi(&mut self, input: &[MidiEvent], output: &mut MidiBuffer) {
        for event in input {
            output.push(*event);
        }
    }

    /// Whether this plugin consumes or produces MIDI.
    fn wants_midi(&self) -> bool {
        false
    }
}

// =============================================================================
// Plugin Trait
// =============================================================================

/// The unprepared plugin.
///
/// ```ignore
/// #[derive(Default, HasParameters)]
/// pub struct GatePlugin {
///     #[parameters]
///     parameters: Arc<GateParameters>,
/// }
///
/// impl Plugin for GatePlugin {
///     type Config = AudioSetup;
///     type Processor = GateProcessor;
///
///     fn prepare(self, config: AudioSetup) -> GateProcessor {
///         GateProcessor::new(self.parameters, config)
///     }
/// }
/// ```
pub trait Plugin: HasParameters + Default {
    type Config: ProcessorConfig;

    type Processor: AudioProcessor<Plugin = Self, Parameters = Self::Parameters>;

    /// Consume the plugin and build a processor for `config`.
    fn prepare(self, config: Self::Config) -> Self::Processor;

    // =========================================================================
    // Bus Configuration (static, known before prepare)
    // =========================================================================

    fn input_bus_count(&self) -> usize {
        1
    }

    fn output_bus_count(&self) -> usize {
        1
    }

    /// Default: a stereo main bus at index 0.
    fn input_bus_info(&self, index: usize) -> Option<BusInfo> {
        (index == 0).then_some(BusInfo::stereo("Input"))
    }

    /// Default: a stereo main bus at index 0.
    fn output_bus_info(&self, index: usize) -> Option<BusInfo> {
        (index == 0).then_some(BusInfo::stereo("Output"))
    }

    /// Whether the plugin can run with `layout`.
    ///
    /// Default accepts exactly the declared bus configuration.
    fn supports_layout(&self, layout: &BusLayout) -> bool {
        *layout == BusLayout::from_plugin(self)
    }

    /// Whether the plugin consumes or produces MIDI.
    ///
    /// Known before prepare, so hosts can declare event buses up front.
    fn wants_midi(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameter_store::NoParameters;

    #[derive(Default)]
    struct Thru {
        parameters: NoParameters,
    }

    struct ThruProcessor {
        parameters: NoParameters,
        gain: f32,
    }

    impl HasParameters for Thru {
        type Parameters = NoParameters;
        fn parameters(&self) -> &NoParameters {
            &self.parameters
        }
    }

    impl HasParameters for ThruProcessor {
        type Parameters = NoParameters;
        fn parameters(&self) -> &NoParameters {
            &self.parameters
        }
    }

    impl Plugin for Thru {
        type Config = NoConfig;
        type Processor = ThruProcessor;

        fn prepare(self, _: NoConfig) -> ThruProcessor {
            ThruProcessor {
                parameters: self.parameters,
                gain: 0.5,
            }
        }
    }

    impl AudioProcessor for ThruProcessor {
        type Plugin = Thru;

        fn process(&mut self, buffer: &mut Buffer, _context: &ProcessContext) {
            buffer.copy_to_output();
            buffer.apply_output_gain(self.gain);
        }

        fn unprepare(self) -> Thru {
            Thru {
                parameters: self.parameters,
            }
        }
    }

    #[test]
    fn default_layout_is_stereo() {
        let plugin = Thru::default();
        assert_eq!(BusLayout::from_plugin(&plugin), BusLayout::stereo());
        assert!(plugin.supports_layout(&BusLayout::stereo()));

        let mono = BusLayout {
            main_input_channels: 1,
            main_output_channels: 1,
            ..BusLayout::stereo()
        };
        assert!(!plugin.supports_layout(&mono));
    }

    #[test]
    fn default_midi_is_pass_through() {
        let mut processor = Thru::default().prepare(NoConfig);
        let input = [
            MidiEvent::note_on(0, 0, 60, 1.0),
            MidiEvent::control_change(3, 0, 7, 0.5),
        ];
        let mut output = MidiBuffer::new();
        processor.process_midi(&input, &mut output);
        assert_eq!(output.as_slice(), &input);
    }

    #[test]
    fn f64_fallback_goes_through_f32_process() {
        let mut processor = Thru::default().prepare(NoConfig);
        let input = [1.0f64, -2.0, 4.0];
        let mut output = [0.0f64; 3];
        {
            let mut buffer = Buffer::new([&input[..]], [&mut output[..]], 3);
            processor.process_f64(&mut buffer, &ProcessContext::with_empty_transport(48000.0, 3));
        }
        assert_eq!(output, [0.5, -1.0, 2.0]);
    }

    #[test]
    fn unprepare_returns_plugin() {
        let processor = Thru::default().prepare(NoConfig);
        assert!(processor.save_state().unwrap().is_empty());
        let _plugin: Thru = processor.unprepare();
    }
}
