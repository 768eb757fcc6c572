//! # NoteGate
//!
//! Framework for real-time audio plugins driven by MIDI.
//!
//! ## Architecture
//!
//! ```text
//! Your Plugin (implements Plugin + AudioProcessor)
//!        ↓
//! PluginHost<P> (lifecycle, MIDI routing, sample format conversion)
//!        ↓
//! Host audio callback
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use notegate::prelude::*;
//!
//! #[derive(Parameters)]
//! pub struct GateParameters {
//!     #[parameter(id = "triggerNote", name = "Trigger Note", default = 60, range = 0..=127, kind = "note")]
//!     pub trigger_note: IntParameter,
//! }
//!
//! #[derive(Default, HasParameters)]
//! pub struct GatePlugin {
//!     #[parameters]
//!     parameters: Arc<GateParameters>,
//! }
//!
//! impl Plugin for GatePlugin {
//!     type Config = AudioSetup;
//!     type Processor = GateProcessor;
//!     fn prepare(self, setup: AudioSetup) -> GateProcessor { /* ... */ }
//! }
//!
//! let mut host = PluginHost::<GatePlugin>::new(&CONFIG);
//! host.setup_processing(&ProcessSetup::new(48000.0, 512))?;
//! ```

// Re-export sub-crates
pub use notegate_core as core;
pub use notegate_host as host;

// Derive macros share names with the traits they implement; macros and
// traits live in different namespaces.
#[cfg(feature = "derive")]
pub use notegate_macros::{HasParameters, Parameters};

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use notegate::prelude::*;
/// ```
pub mod prelude {
    pub use notegate_core::{
        // Buffer types
        Buffer, Sample,
        // Traits
        AudioProcessor, HasParameters, ParameterRef, ParameterStore, Parameters, Plugin,
        // Processor configuration types
        AudioSetup, BusInfo, BusLayout, BusType, FullAudioSetup, NoConfig, ProcessorConfig,
        // Parameter types
        Formatter, IntParameter, NoParameters, ParameterFlags, ParameterInfo,
        // Metadata and errors
        PluginConfig, PluginError, PluginResult,
        // MIDI types
        ChannelPressure, ControlChange, MidiBuffer, MidiChannel, MidiEvent, MidiEventKind,
        MidiNote, NoteOff, NoteOn, PitchBend, PolyPressure, ProgramChange, RawMidi,
        // Process context and transport
        ProcessContext, Transport,
    };

    pub use notegate_host::{PluginHost, Precision, ProcessSetup};

    #[cfg(feature = "derive")]
    pub use notegate_macros::{HasParameters, Parameters};
}
