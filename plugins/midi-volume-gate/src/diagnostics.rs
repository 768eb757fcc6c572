//! Diagnostic snapshots published by the processor.
//!
//! The processor fills a [`DiagnosticSnapshot`] in place every block and
//! copies it into a [`SnapshotExchange`]. Readers always get a complete
//! copy; the audio thread publishes with `try_lock` and simply skips a
//! block if a reader holds the lock at that moment.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use notegate::prelude::*;
use parking_lot::Mutex;

/// Raw events kept per snapshot. Further events are only counted.
pub const EVENT_LOG_CAPACITY: usize = 64;

/// Processing status for one block.
#[derive(Clone, Copy, PartialEq)]
pub struct DiagnosticSnapshot {
    /// Blocks processed before this one (starts at 0).
    pub block: u64,
    /// MIDI events forwarded this block.
    pub midi_events: usize,
    pub channels: usize,
    pub block_size: usize,
    pub gate_level: f32,
    pub trigger_note: MidiNote,
    /// False once the processor has been released.
    pub is_running: bool,
    /// Events past [`EVENT_LOG_CAPACITY`] that were not logged.
    pub dropped_log_entries: usize,
    log: [RawMidi; EVENT_LOG_CAPACITY],
    log_len: usize,
}

impl Default for DiagnosticSnapshot {
    fn default() -> Self {
        Self {
            block: 0,
            midi_events: 0,
            channels: 0,
            block_size: 0,
            gate_level: 0.0,
            trigger_note: 0,
            is_running: false,
            dropped_log_entries: 0,
            log: [RawMidi::default(); EVENT_LOG_CAPACITY],
            log_len: 0,
        }
    }
}

impl DiagnosticSnapshot {
    /// Logged events, in processing order.
    pub fn events(&self) -> &[RawMidi] {
        &self.log[..self.log_len]
    }

    /// Append an encoded event to the log.
    #[inline]
    pub fn log_event(&mut self, event: &MidiEvent) {
        if self.log_len < EVENT_LOG_CAPACITY {
            self.log[self.log_len] = event.to_bytes();
            self.log_len += 1;
        } else {
            self.dropped_log_entries += 1;
        }
    }

    #[inline]
    pub fn clear_log(&mut self) {
        self.log_len = 0;
        self.dropped_log_entries = 0;
    }
}

impl fmt::Debug for DiagnosticSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiagnosticSnapshot")
            .field("block", &self.block)
            .field("midi_events", &self.midi_events)
            .field("channels", &self.channels)
            .field("block_size", &self.block_size)
            .field("gate_level", &self.gate_level)
            .field("trigger_note", &self.trigger_note)
            .field("is_running", &self.is_running)
            .field("events", &self.events())
            .field("dropped_log_entries", &self.dropped_log_entries)
            .finish()
    }
}

impl fmt::Display for DiagnosticSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Block: {}", self.block)?;
        writeln!(f, "MIDI Events: {}", self.midi_events)?;
        writeln!(f, "Audio Channels: {}", self.channels)?;
        writeln!(f, "Buffer Size: {}", self.block_size)?;
        writeln!(f, "Gate Level: {:.2}", self.gate_level)?;
        writeln!(f, "Trigger Note: {}", self.trigger_note)?;
        for event in self.events() {
            write!(f, "\nMIDI: [{}]", event)?;
        }
        if self.dropped_log_entries > 0 {
            write!(f, "\n({} more)", self.dropped_log_entries)?;
        }
        Ok(())
    }
}

/// Audio configuration captured at prepare time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioSetupInfo {
    pub sample_rate: f64,
    pub block_size: usize,
    pub channels: usize,
}

impl fmt::Display for AudioSetupInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Audio Setup:")?;
        writeln!(f, "Sample Rate: {:.1} Hz", self.sample_rate)?;
        writeln!(f, "Block Size: {} samples", self.block_size)?;
        writeln!(f, "Channels: {}", self.channels)
    }
}

#[derive(Default)]
struct Published {
    snapshot: Option<DiagnosticSnapshot>,
    setup: Option<AudioSetupInfo>,
}

/// Latest snapshot and setup info, shared with the editor.
#[derive(Default)]
pub struct SnapshotExchange {
    latest: Mutex<Published>,
    skipped: AtomicU64,
}

impl SnapshotExchange {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish from the audio thread.
    ///
    /// Returns `false` if a reader held the lock; the next block publishes
    /// again.
    #[inline]
    pub fn try_publish(&self, snapshot: &DiagnosticSnapshot) -> bool {
        match self.latest.try_lock() {
            Some(mut latest) => {
                latest.snapshot = Some(*snapshot);
                true
            }
            None => {
                self.skipped.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    /// Publish from a non-real-time thread, waiting for readers.
    pub fn publish(&self, snapshot: &DiagnosticSnapshot) {
        self.latest.lock().snapshot = Some(*snapshot);
    }

    /// Record a new audio setup. Clears the previous snapshot, so readers
    /// show the setup until the first block is processed.
    pub fn publish_setup(&self, setup: AudioSetupInfo) {
        let mut latest = self.latest.lock();
        latest.setup = Some(setup);
        latest.snapshot = None;
    }

    /// Snapshots the audio thread skipped because a reader held the lock.
    pub fn skipped(&self) -> u64 {
        self.skipped.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> Option<DiagnosticSnapshot> {
        self.latest.lock().snapshot
    }

    pub fn setup(&self) -> Option<AudioSetupInfo> {
        self.latest.lock().setup
    }

    /// Text for the editor's debug view: the last snapshot, or the audio
    /// setup before the first block.
    pub fn debug_text(&self) -> String {
        let latest = self.latest.lock();
        match (&latest.snapshot, &latest.setup) {
            (Some(snapshot), _) => snapshot.to_string(),
            (None, Some(setup)) => setup.to_string(),
            (None, None) => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_snapshot() -> DiagnosticSnapshot {
        DiagnosticSnapshot {
            block: 3,
            midi_events: 1,
            channels: 2,
            block_size: 512,
            gate_level: 1.0,
            trigger_note: 60,
            is_running: true,
            ..DiagnosticSnapshot::default()
        }
    }

    #[test]
    fn display_matches_debug_view_format() {
        let mut snapshot = sample_snapshot();
        snapshot.log_event(&MidiEvent::note_on(0, 0, 60, 1.0));

        assert_eq!(
            snapshot.to_string(),
            "Block: 3\n\
             MIDI Events: 1\n\
             Audio Channels: 2\n\
             Buffer Size: 512\n\
             Gate Level: 1.00\n\
             Trigger Note: 60\n\
             \nMIDI: [90 3C 7F]"
        );
    }

    #[test]
    fn two_byte_events_are_logged_in_full() {
        let mut snapshot = sample_snapshot();
        snapshot.log_event(&MidiEvent::program_change(0, 1, 5));
        assert!(snapshot.to_string().ends_with("\nMIDI: [C1 05]"));
    }

    #[test]
    fn log_is_bounded() {
        let mut snapshot = DiagnosticSnapshot::default();
        for _ in 0..EVENT_LOG_CAPACITY + 3 {
            snapshot.log_event(&MidiEvent::note_off(0, 0, 60, 0.0));
        }
        assert_eq!(snapshot.events().len(), EVENT_LOG_CAPACITY);
        assert_eq!(snapshot.dropped_log_entries, 3);
        assert!(snapshot.to_string().ends_with("(3 more)"));

        snapshot.clear_log();
        assert!(snapshot.events().is_empty());
        assert_eq!(snapshot.dropped_log_entries, 0);
    }

    #[test]
    fn setup_info_display() {
        let setup = AudioSetupInfo {
            sample_rate: 44100.0,
            block_size: 512,
            channels: 2,
        };
        assert_eq!(
            setup.to_string(),
            "Audio Setup:\nSample Rate: 44100.0 Hz\nBlock Size: 512 samples\nChannels: 2\n"
        );
    }

    #[test]
    fn debug_text_shows_setup_until_first_snapshot() {
        let exchange = SnapshotExchange::new();
        assert_eq!(exchange.debug_text(), "");

        exchange.publish_setup(AudioSetupInfo {
            sample_rate: 48000.0,
            block_size: 256,
            channels: 2,
        });
        assert!(exchange.debug_text().starts_with("Audio Setup:"));

        assert!(exchange.try_publish(&sample_snapshot()));
        assert!(exchange.debug_text().starts_with("Block: 3"));
        assert_eq!(exchange.snapshot(), Some(sample_snapshot()));
    }

    #[test]
    fn try_publish_skips_while_reader_holds_lock() {
        let exchange = SnapshotExchange::new();
        let guard = exchange.latest.lock();
        assert!(!exchange.try_publish(&sample_snapshot()));
        drop(guard);
        assert_eq!(exchange.snapshot(), None);
        assert_eq!(exchange.skipped(), 1);
    }

    #[test]
    fn new_setup_clears_stale_snapshot() {
        let exchange = SnapshotExchange::new();
        exchange.publish(&sample_snapshot());
        exchange.publish_setup(AudioSetupInfo {
            sample_rate: 96000.0,
            block_size: 64,
            channels: 2,
        });
        assert_eq!(exchange.snapshot(), None);
        assert_eq!(exchange.setup().map(|s| s.sample_rate), Some(96000.0));
    }
}
