//! Gate parameters.

use notegate::prelude::*;

/// Parameters shared by the processor, the host and the editor handle.
///
/// The trigger note is read once per block with a relaxed atomic load, so
/// automation and editor writes never block the audio thread.
#[derive(Parameters)]
pub struct GateParameters {
    /// MIDI note that opens and closes the gate. Middle C by default.
    #[parameter(id = "triggerNote", name = "Trigger Note", default = 60, range = 0..=127, kind = "note")]
    pub trigger_note: IntParameter,
}

impl GateParameters {
    /// Current trigger note as a MIDI note number.
    #[inline]
    pub fn trigger(&self) -> MidiNote {
        self.trigger_note.get().clamp(0, 127) as MidiNote
    }

    /// Set the trigger note. Values above 127 are clamped.
    pub fn set_trigger(&self, note: MidiNote) {
        self.trigger_note.set(i64::from(note));
    }
}
