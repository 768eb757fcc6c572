//! # notegate-host
//!
//! In-process host adapter for the NoteGate framework.
//!
//! [`PluginHost`] drives any [`notegate_core::Plugin`] through the same
//! lifecycle a plugin-format wrapper would:
//!
//! ```text
//! PluginHost::new(&CONFIG)        Unprepared { plugin }
//!        ↓ set_bus_arrangements()  (layout negotiation)
//!        ↓ setup_processing()     Prepared { processor }
//!        ↓ process() / process_f64(), repeatedly
//!        ↓ release()              Unprepared { plugin }
//! ```
//!
//! It owns every buffer the audio path needs, so after `setup_processing()`
//! a `process()` call does not allocate.

pub mod host;

pub use host::{PluginHost, Precision, ProcessSetup, PARAMETER_QUEUE_CAPACITY};
