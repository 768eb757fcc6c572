//! Gate state machine.
//!
//! The gate is either closed (level 0.0) or open at the velocity of the
//! note that opened it. There is no ramp: the level resolved at the end of
//! a block's MIDI scan applies to the whole block.

use notegate::prelude::*;

/// Gate level and the metadata of the last transition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GateState {
    level: f32,
    last_note: Option<MidiNote>,
    was_note_on: bool,
    last_event_time: u64,
}

impl Default for GateState {
    fn default() -> Self {
        Self::new()
    }
}

impl GateState {
    /// A closed gate.
    pub const fn new() -> Self {
        Self {
            level: 0.0,
            last_note: None,
            was_note_on: false,
            last_event_time: 0,
        }
    }

    /// Current gain, 0.0 when closed.
    #[inline]
    pub fn level(&self) -> f32 {
        self.level
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.level > 0.0
    }

    /// Note of the last note-on that opened the gate.
    pub fn last_note(&self) -> Option<MidiNote> {
        self.last_note
    }

    /// Whether the last transition was a note-on.
    pub fn was_note_on(&self) -> bool {
        self.was_note_on
    }

    /// Sample clock value of the last transition.
    pub fn last_event_time(&self) -> u64 {
        self.last_event_time
    }

    /// Feed one event. Returns `true` if it moved the gate.
    ///
    /// Only note events on `trigger` count; every other event is ignored.
    /// A note-on with zero velocity closes the gate like a note-off.
    pub fn observe(&mut self, event: &MidiEvent, trigger: MidiNote, timestamp: u64) -> bool {
        match event.event {
            MidiEventKind::NoteOn(note) if note.pitch == trigger && note.velocity > 0.0 => {
                self.level = note.velocity.min(1.0);
                self.last_note = Some(note.pitch);
                self.was_note_on = true;
                self.last_event_time = timestamp;
                true
            }
            MidiEventKind::NoteOn(NoteOn { pitch, .. })
            | MidiEventKind::NoteOff(NoteOff { pitch, .. })
                if pitch == trigger =>
            {
                self.level = 0.0;
                self.was_note_on = false;
                self.last_event_time = timestamp;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn on(pitch: MidiNote, velocity: u8) -> MidiEvent {
        MidiEvent::note_on(0, 0, pitch, velocity as f32 / 127.0)
    }

    fn off(pitch: MidiNote) -> MidiEvent {
        MidiEvent::note_off(0, 0, pitch, 0.0)
    }

    #[test]
    fn starts_closed() {
        let gate = GateState::new();
        assert_eq!(gate.level(), 0.0);
        assert!(!gate.is_open());
        assert_eq!(gate.last_note(), None);
    }

    #[test]
    fn trigger_note_on_opens_at_velocity() {
        let mut gate = GateState::new();
        assert!(gate.observe(&on(60, 100), 60, 42));
        assert_eq!(gate.level(), 100.0 / 127.0);
        assert_eq!(gate.last_note(), Some(60));
        assert!(gate.was_note_on());
        assert_eq!(gate.last_event_time(), 42);
    }

    #[test]
    fn trigger_note_off_closes() {
        let mut gate = GateState::new();
        gate.observe(&on(60, 127), 60, 0);
        assert!(gate.observe(&off(60), 60, 10));
        assert_eq!(gate.level(), 0.0);
        assert!(!gate.was_note_on());
        assert_eq!(gate.last_event_time(), 10);
        // The opening note is kept for display
        assert_eq!(gate.last_note(), Some(60));
    }

    #[test]
    fn zero_velocity_note_on_closes() {
        let mut gate = GateState::new();
        gate.observe(&on(60, 127), 60, 0);
        assert!(gate.observe(&on(60, 0), 60, 5));
        assert!(!gate.is_open());
    }

    #[test]
    fn other_notes_and_kinds_are_ignored() {
        let mut gate = GateState::new();
        gate.observe(&on(60, 64), 60, 0);
        let before = gate;

        assert!(!gate.observe(&on(72, 100), 60, 1));
        assert!(!gate.observe(&off(61), 60, 2));
        assert!(!gate.observe(&MidiEvent::control_change(0, 0, 7, 1.0), 60, 3));
        assert!(!gate.observe(&MidiEvent::poly_pressure(0, 0, 60, 1.0), 60, 4));
        assert_eq!(gate, before);
    }

    #[test]
    fn last_qualifying_event_wins() {
        let mut gate = GateState::new();
        for event in [on(60, 127), off(60), on(60, 32)] {
            gate.observe(&event, 60, 0);
        }
        assert_eq!(gate.level(), 32.0 / 127.0);

        gate.observe(&off(60), 60, 0);
        assert_eq!(gate.level(), 0.0);
    }

    #[test]
    fn any_channel_triggers() {
        let mut gate = GateState::new();
        gate.observe(&MidiEvent::note_on(0, 9, 60, 1.0), 60, 0);
        assert_eq!(gate.level(), 1.0);
    }
}
