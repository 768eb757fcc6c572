//! Editor-facing side of the gate.
//!
//! The on-screen editor talks to the processor only through a
//! [`GateHandle`]: it reads diagnostic snapshots, reads and writes the
//! trigger note, injects note events from an on-screen keyboard and drains
//! the MIDI the processor forwarded. [`GateMonitor`] wraps a handle with the
//! state a 30 Hz editor timer keeps between polls.

use std::ops::RangeInclusive;
use std::sync::Arc;

use notegate::prelude::*;

use crate::diagnostics::{AudioSetupInfo, DiagnosticSnapshot, SnapshotExchange};
use crate::parameters::GateParameters;
use crate::queue::{MidiQueue, INJECTION_CAPACITY, MONITOR_CAPACITY};

/// Keys shown by the editor's keyboard (C1 to C6).
pub const KEYBOARD_RANGE: RangeInclusive<MidiNote> = 36..=96;

// =============================================================================
// Shared State
// =============================================================================

/// Channels between the processor and every editor handle.
///
/// Lives in an `Arc` that survives prepare/unprepare cycles, so handles
/// taken before processing starts stay connected.
pub(crate) struct GateChannels {
    /// Editor -> processor synthetic note events.
    pub(crate) injection: MidiQueue,
    /// Processor -> editor forwarded MIDI.
    pub(crate) monitor: MidiQueue,
    pub(crate) diagnostics: SnapshotExchange,
}

impl Default for GateChannels {
    fn default() -> Self {
        Self {
            injection: MidiQueue::new(INJECTION_CAPACITY),
            monitor: MidiQueue::new(MONITOR_CAPACITY),
            diagnostics: SnapshotExchange::new(),
        }
    }
}

// =============================================================================
// GateHandle
// =============================================================================

/// Cloneable handle for an editor or any other non-real-time observer.
#[derive(Clone)]
pub struct GateHandle {
    parameters: Arc<GateParameters>,
    channels: Arc<GateChannels>,
}

impl GateHandle {
    pub(crate) fn new(parameters: Arc<GateParameters>, channels: Arc<GateChannels>) -> Self {
        Self {
            parameters,
            channels,
        }
    }

    /// Latest per-block snapshot, `None` before the first block after
    /// prepare.
    pub fn snapshot(&self) -> Option<DiagnosticSnapshot> {
        self.channels.diagnostics.snapshot()
    }

    /// Audio setup of the last prepare.
    pub fn setup_info(&self) -> Option<AudioSetupInfo> {
        self.channels.diagnostics.setup()
    }

    /// Text for the debug view.
    pub fn debug_text(&self) -> String {
        self.channels.diagnostics.debug_text()
    }

    pub fn parameters(&self) -> &GateParameters {
        &self.parameters
    }

    pub fn trigger_note(&self) -> MidiNote {
        self.parameters.trigger()
    }

    /// Change the trigger note. Takes effect on the next block.
    pub fn set_trigger_note(&self, note: MidiNote) {
        self.parameters.set_trigger(note);
    }

    /// Inject a note-on. `velocity` is normalized (0.0 to 1.0).
    ///
    /// The event enters the next block at offset 0, ahead of host MIDI.
    /// Returns `false` if the injection queue is full.
    pub fn note_on(&self, channel: MidiChannel, note: MidiNote, velocity: f32) -> bool {
        let velocity = if velocity.is_nan() { 0.0 } else { velocity.clamp(0.0, 1.0) };
        self.channels
            .injection
            .push(MidiEvent::note_on(0, channel & 0x0F, note.min(127), velocity))
    }

    /// Inject a note-off. Returns `false` if the injection queue is full.
    pub fn note_off(&self, channel: MidiChannel, note: MidiNote) -> bool {
        self.channels
            .injection
            .push(MidiEvent::note_off(0, channel & 0x0F, note.min(127), 0.0))
    }

    /// Inject a raw MIDI 1.0 channel message, e.g. from a hardware port the
    /// editor listens to.
    ///
    /// Returns `false` if the bytes don't decode or the queue is full.
    pub fn send_raw(&self, bytes: &[u8]) -> bool {
        match MidiEvent::from_bytes(0, bytes) {
            Some(event) => self.channels.injection.push(event),
            None => false,
        }
    }

    /// Take every event the processor forwarded since the last drain.
    pub fn drain_midi(&self, sink: impl FnMut(MidiEvent)) -> usize {
        self.channels.monitor.drain(sink)
    }

    /// Forwarded events lost because the editor did not drain in time.
    pub fn dropped_midi(&self) -> usize {
        self.channels.monitor.dropped()
    }
}

// =============================================================================
// KeyboardState
// =============================================================================

/// Held keys of the on-screen keyboard, across all channels.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyboardState {
    held: [bool; 128],
}

impl Default for KeyboardState {
    fn default() -> Self {
        Self { held: [false; 128] }
    }
}

impl std::fmt::Debug for KeyboardState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.held_notes()).finish()
    }
}

impl KeyboardState {
    /// Track note events; everything else is ignored.
    pub fn apply(&mut self, event: &MidiEvent) {
        match event.event {
            MidiEventKind::NoteOn(note) => {
                self.held[note.pitch as usize & 0x7F] = note.velocity > 0.0;
            }
            MidiEventKind::NoteOff(note) => {
                self.held[note.pitch as usize & 0x7F] = false;
            }
            _ => {}
        }
    }

    pub fn is_held(&self, note: MidiNote) -> bool {
        self.held.get(note as usize).copied().unwrap_or(false)
    }

    /// All held notes, lowest first.
    pub fn held_notes(&self) -> impl Iterator<Item = MidiNote> + '_ {
        (0..=127u8).filter(|&note| self.held[note as usize])
    }

    /// Held notes within [`KEYBOARD_RANGE`].
    pub fn visible_notes(&self) -> impl Iterator<Item = MidiNote> + '_ {
        self.held_notes().filter(|note| KEYBOARD_RANGE.contains(note))
    }

    pub fn release_all(&mut self) {
        self.held = [false; 128];
    }
}

// =============================================================================
// GateMonitor
// =============================================================================

/// One poll's worth of editor status.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusReport {
    pub gate_open: bool,
    /// A block was processed since the previous poll.
    pub audio_running: bool,
    pub midi_events: usize,
    pub trigger_note: MidiNote,
    /// Trigger note as a note name, e.g. `C3`.
    pub trigger_label: String,
    pub debug_text: String,
    /// Held keys within [`KEYBOARD_RANGE`].
    pub held_keys: Vec<MidiNote>,
}

impl StatusReport {
    pub fn gate_label(&self) -> &'static str {
        if self.gate_open {
            "Gate: OPEN"
        } else {
            "Gate: CLOSED"
        }
    }

    pub fn audio_label(&self) -> &'static str {
        if self.audio_running {
            "Audio: RUNNING"
        } else {
            "Audio: STOPPED"
        }
    }

    pub fn midi_label(&self) -> String {
        format!("MIDI Events: {}", self.midi_events)
    }
}

/// Polling state of an editor.
pub struct GateMonitor {
    handle: GateHandle,
    keyboard: KeyboardState,
    last_block: Option<u64>,
}

impl GateMonitor {
    pub fn new(handle: GateHandle) -> Self {
        Self {
            handle,
            keyboard: KeyboardState::default(),
            last_block: None,
        }
    }

    pub fn handle(&self) -> &GateHandle {
        &self.handle
    }

    pub fn keyboard(&self) -> &KeyboardState {
        &self.keyboard
    }

    /// Press a key on the on-screen keyboard.
    pub fn press_key(&self, note: MidiNote, velocity: f32) -> bool {
        self.handle.note_on(0, note, velocity)
    }

    pub fn release_key(&self, note: MidiNote) -> bool {
        self.handle.note_off(0, note)
    }

    /// Drain forwarded MIDI into the keyboard and build a status report.
    pub fn poll(&mut self) -> StatusReport {
        let keyboard = &mut self.keyboard;
        self.handle.drain_midi(|event| keyboard.apply(&event));

        let snapshot = self.handle.snapshot();
        let block = snapshot.filter(|s| s.is_running).map(|s| s.block);
        let audio_running = block.is_some() && block != self.last_block;
        self.last_block = block;

        let trigger_note = self.handle.trigger_note();

        StatusReport {
            gate_open: snapshot.is_some_and(|s| s.is_running && s.gate_level > 0.0),
            audio_running,
            midi_events: snapshot.map(|s| s.midi_events).unwrap_or(0),
            trigger_note,
            trigger_label: self.handle.parameters().trigger_note.display(),
            debug_text: self.handle.debug_text(),
            held_keys: self.keyboard.visible_notes().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle() -> GateHandle {
        GateHandle::new(Arc::default(), Arc::default())
    }

    fn snapshot(block: u64, gate_level: f32) -> DiagnosticSnapshot {
        let mut snapshot = DiagnosticSnapshot::default();
        snapshot.block = block;
        snapshot.gate_level = gate_level;
        snapshot.channels = 2;
        snapshot.block_size = 64;
        snapshot.trigger_note = 60;
        snapshot.is_running = true;
        snapshot
    }

    #[test]
    fn injected_notes_reach_the_injection_queue() {
        let handle = handle();
        assert!(handle.note_on(17, 60, 2.0));
        assert!(handle.note_off(0, 60));

        let mut events = Vec::new();
        handle.channels.injection.drain(|event| events.push(event));
        assert_eq!(
            events,
            vec![
                MidiEvent::note_on(0, 1, 60, 1.0),
                MidiEvent::note_off(0, 0, 60, 0.0),
            ]
        );
    }

    #[test]
    fn raw_messages_are_decoded_before_injection() {
        let handle = handle();
        assert!(handle.send_raw(&[0x91, 60, 127]));
        assert!(handle.send_raw(&[0x91, 60, 0]));
        assert!(!handle.send_raw(&[0xF8]));
        assert!(!handle.send_raw(&[0x90, 60]));

        let mut events = Vec::new();
        handle.channels.injection.drain(|event| events.push(event));
        assert_eq!(
            events,
            vec![
                MidiEvent::note_on(0, 1, 60, 1.0),
                MidiEvent::note_off(0, 1, 60, 0.0),
            ]
        );
    }

    #[test]
    fn injection_queue_is_bounded() {
        let handle = handle();
        for _ in 0..INJECTION_CAPACITY {
            assert!(handle.note_on(0, 60, 1.0));
        }
        assert!(!handle.note_off(0, 60));
    }

    #[test]
    fn trigger_note_round_trip() {
        let handle = handle();
        let other = handle.clone();
        handle.set_trigger_note(48);
        assert_eq!(other.trigger_note(), 48);
    }

    #[test]
    fn keyboard_tracks_note_events() {
        let mut keyboard = KeyboardState::default();
        keyboard.apply(&MidiEvent::note_on(0, 0, 60, 0.8));
        keyboard.apply(&MidiEvent::note_on(0, 3, 20, 0.8));
        keyboard.apply(&MidiEvent::control_change(0, 0, 64, 1.0));
        assert!(keyboard.is_held(60));
        assert_eq!(keyboard.held_notes().collect::<Vec<_>>(), vec![20, 60]);
        assert_eq!(keyboard.visible_notes().collect::<Vec<_>>(), vec![60]);

        keyboard.apply(&MidiEvent::note_on(0, 0, 60, 0.0));
        assert!(!keyboard.is_held(60));
        keyboard.apply(&MidiEvent::note_off(0, 3, 20, 0.0));
        assert_eq!(keyboard.held_notes().count(), 0);

        keyboard.apply(&MidiEvent::note_on(0, 0, 40, 1.0));
        keyboard.release_all();
        assert_eq!(keyboard, KeyboardState::default());
    }

    #[test]
    fn poll_before_processing_shows_setup() {
        let handle = handle();
        handle.channels.diagnostics.publish_setup(AudioSetupInfo {
            sample_rate: 44100.0,
            block_size: 512,
            channels: 2,
        });

        let mut monitor = GateMonitor::new(handle);
        let report = monitor.poll();
        assert!(!report.gate_open);
        assert!(!report.audio_running);
        assert_eq!(report.gate_label(), "Gate: CLOSED");
        assert_eq!(report.audio_label(), "Audio: STOPPED");
        assert_eq!(report.midi_label(), "MIDI Events: 0");
        assert_eq!(report.trigger_label, "C3");
        assert!(report.debug_text.starts_with("Audio Setup:"));
    }

    #[test]
    fn running_means_block_counter_moved() {
        let handle = handle();
        let mut monitor = GateMonitor::new(handle.clone());

        handle.channels.diagnostics.publish(&snapshot(0, 1.0));
        let first = monitor.poll();
        assert!(first.audio_running);
        assert!(first.gate_open);

        // No new block between polls
        assert!(!monitor.poll().audio_running);

        handle.channels.diagnostics.publish(&snapshot(1, 0.0));
        let third = monitor.poll();
        assert!(third.audio_running);
        assert!(!third.gate_open);
    }

    #[test]
    fn released_processor_reports_stopped() {
        let handle = handle();
        let mut monitor = GateMonitor::new(handle.clone());

        let mut last = snapshot(7, 1.0);
        last.is_running = false;
        handle.channels.diagnostics.publish(&last);

        let report = monitor.poll();
        assert!(!report.audio_running);
        assert!(!report.gate_open);
    }

    #[test]
    fn poll_feeds_forwarded_midi_into_keyboard() {
        let handle = handle();
        let mut monitor = GateMonitor::new(handle.clone());

        handle.channels.monitor.try_push(MidiEvent::note_on(0, 0, 64, 1.0));
        handle.channels.monitor.try_push(MidiEvent::note_on(0, 0, 100, 1.0));
        let report = monitor.poll();
        assert_eq!(report.held_keys, vec![64]);
        assert!(monitor.keyboard().is_held(100));

        handle.channels.monitor.try_push(MidiEvent::note_off(0, 0, 64, 0.0));
        assert!(monitor.poll().held_keys.is_empty());
    }
}
