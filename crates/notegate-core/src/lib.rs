//! # notegate-core
//!
//! Format-agnostic traits and types for real-time audio/MIDI plugins.
//! No external dependencies.
//!
//! ## Main Traits
//!
//! - [`Plugin`] - unprepared plugin, holds parameters
//! - [`AudioProcessor`] - prepared processor, runs on the audio thread
//! - [`Parameters`] / [`ParameterStore`] - parameter collection and host view
//!
//! ## Types
//!
//! - [`Buffer`] - main audio I/O
//! - [`MidiEvent`] / [`MidiBuffer`] - MIDI events and fixed-capacity storage
//! - [`IntParameter`] - atomic integer parameter
//! - [`ProcessContext`] / [`Transport`] - timing for one block
//! - [`PluginConfig`] - plugin metadata
//! - [`PluginError`] - error types

pub mod buffer;
pub mod config;
pub mod error;
pub mod midi;
pub mod parameter_format;
pub mod parameter_info;
pub mod parameter_store;
pub mod parameter_types;
pub mod plugin;
pub mod process_context;
pub mod sample;
pub mod types;

// Re-exports for convenience
pub use buffer::Buffer;
pub use config::PluginConfig;
pub use error::{PluginError, PluginResult};
pub use midi::{
    ChannelPressure, ControlChange, MidiBuffer, MidiChannel, MidiEvent, MidiEventKind, MidiNote,
    NoteOff, NoteOn, PitchBend, PolyPressure, ProgramChange, RawMidi, MAX_MIDI_EVENTS,
};
pub use parameter_format::{note_name, parse_note_name, Formatter};
pub use parameter_info::{ParameterFlags, ParameterInfo};
pub use parameter_store::{NoParameters, ParameterStore};
pub use parameter_types::{IntParameter, ParameterRef, Parameters};
pub use plugin::{
    AudioProcessor, AudioSetup, BusInfo, BusLayout, BusType, FullAudioSetup, HasParameters,
    NoConfig, Plugin, ProcessorConfig,
};
pub use process_context::{ProcessContext, Transport};
pub use sample::Sample;
pub use types::{ParameterId, ParameterValue, MAX_CHANNELS};
