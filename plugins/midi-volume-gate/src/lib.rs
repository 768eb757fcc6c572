//! MIDI Volume Gate - a volume gate opened and closed by a trigger note.
//!
//! Note-on events on the trigger note open the gate at the note's velocity,
//! note-off events close it. All MIDI passes through unchanged.
//!
//! # Features
//!
//! - **Whole-block gating**: the level resolved at the end of a block's MIDI
//!   scan applies to every sample of the block. There is no ramp.
//! - **MIDI pass-through**: every event is forwarded with its offset and
//!   position in the batch intact.
//! - **Diagnostics**: a snapshot of each block is published for the editor
//!   without ever blocking the audio thread.
//! - **Editor handle**: [`GateHandle`] reads the snapshot, changes the
//!   trigger note and injects notes from an on-screen keyboard.
//!
//! # Example
//!
//! ```ignore
//! use midi_volume_gate::{GatePlugin, CONFIG};
//! use notegate::prelude::*;
//!
//! let mut host = PluginHost::<GatePlugin>::new(&CONFIG);
//! host.setup_processing(&ProcessSetup::new(48000.0, 512))?;
//!
//! let mut left = [1.0f32; 512];
//! let mut right = [1.0f32; 512];
//! let note = [MidiEvent::note_on(0, 0, 60, 1.0)];
//! host.process(&mut [&mut left, &mut right], &note)?;
//! ```

use std::sync::Arc;

use log::{debug, warn};
use notegate::prelude::*;

pub mod diagnostics;
pub mod editor;
pub mod gate;
pub mod parameters;
pub mod queue;

pub use diagnostics::{AudioSetupInfo, DiagnosticSnapshot, EVENT_LOG_CAPACITY};
pub use editor::{GateHandle, GateMonitor, KeyboardState, StatusReport, KEYBOARD_RANGE};
pub use gate::GateState;
pub use parameters::GateParameters;

use editor::GateChannels;

// =============================================================================
// Plugin Configuration
// =============================================================================

/// Plugin metadata.
pub static CONFIG: PluginConfig = PluginConfig::new("MIDI Volume Gate")
    .with_vendor("NoteGate")
    .with_url("https://github.com/helpermedia/notegate")
    .with_version(env!("CARGO_PKG_VERSION"))
    .with_category("Fx")
    .with_sub_categories("Fx|Dynamics")
    .with_editor();

// =============================================================================
// Plugin (Unprepared State)
// =============================================================================

/// The gate in its unprepared state.
///
/// Holds the parameters and the editor channels. Both are shared through
/// `Arc`s and handed to the processor on prepare, so editor handles stay
/// valid across sample rate changes.
#[derive(Default, HasParameters)]
pub struct GatePlugin {
    #[parameters]
    parameters: Arc<GateParameters>,
    channels: Arc<GateChannels>,
    /// Block counter, kept across prepares so it never goes backwards.
    blocks: u64,
}

impl GatePlugin {
    /// Handle for an editor.
    pub fn handle(&self) -> GateHandle {
        GateHandle::new(Arc::clone(&self.parameters), Arc::clone(&self.channels))
    }
}

impl Plugin for GatePlugin {
    type Config = FullAudioSetup;
    type Processor = GateProcessor;

    // Bus info keeps the default stereo in / stereo out, and the default
    // supports_layout() accepts nothing else.

    fn prepare(self, config: FullAudioSetup) -> GateProcessor {
        let setup = AudioSetupInfo {
            sample_rate: config.sample_rate,
            block_size: config.max_buffer_size,
            channels: config.layout.main_output_channels as usize,
        };
        debug!(
            "{}: {:.1} Hz, {} samples per block, {} channels",
            CONFIG.name, setup.sample_rate, setup.block_size, setup.channels
        );
        self.channels.diagnostics.publish_setup(setup);

        GateProcessor {
            parameters: self.parameters,
            channels: self.channels,
            gate: GateState::new(),
            clock: 0,
            blocks: self.blocks,
            snapshot: DiagnosticSnapshot::default(),
        }
    }

    fn wants_midi(&self) -> bool {
        true
    }
}

// =============================================================================
// Audio Processor (Prepared State)
// =============================================================================

/// The gate, ready for audio.
///
/// Per block the host calls [`process_midi`](AudioProcessor::process_midi)
/// first, which forwards MIDI and resolves the gate level, then
/// [`process`](AudioProcessor::process), which applies that level and
/// publishes the block's snapshot.
#[derive(HasParameters)]
pub struct GateProcessor {
    #[parameters]
    parameters: Arc<GateParameters>,
    channels: Arc<GateChannels>,
    gate: GateState,
    /// Sample clock at the start of the current block.
    clock: u64,
    blocks: u64,
    /// Snapshot under construction for the current block.
    snapshot: DiagnosticSnapshot,
}

impl GateProcessor {
    /// Handle for an editor.
    pub fn handle(&self) -> GateHandle {
        GateHandle::new(Arc::clone(&self.parameters), Arc::clone(&self.channels))
    }

    pub fn gate(&self) -> &GateState {
        &self.gate
    }

    /// Samples processed since prepare.
    pub fn sample_clock(&self) -> u64 {
        self.clock
    }

    /// Apply the resolved level to the block and publish diagnostics.
    fn process_block<S: Sample>(&mut self, buffer: &mut Buffer<S>, context: &ProcessContext) {
        let level = self.gate.level();

        buffer.copy_to_output();
        if level > 0.0 {
            buffer.apply_output_gain(S::from_f32(level));
        } else {
            buffer.clear_outputs();
        }

        let num_samples = buffer.num_samples();
        self.snapshot.block = self.blocks;
        self.snapshot.channels = buffer.num_output_channels();
        self.snapshot.block_size = num_samples;
        self.snapshot.gate_level = level;
        self.snapshot.trigger_note = self.parameters.trigger();
        self.snapshot.is_running = true;
        self.channels.diagnostics.try_publish(&self.snapshot);

        self.blocks += 1;
        self.clock = context
            .transport
            .continuous_time_at(num_samples as u32)
            .unwrap_or(self.clock + num_samples as u64);
    }
}

impl AudioProcessor for GateProcessor {
    type Plugin = GatePlugin;

    /// Publishes the last block's snapshot once more, marked stopped and
    /// with the gate closed.
    fn unprepare(self) -> GatePlugin {
        let mut last = self.snapshot;
        last.block = self.blocks.saturating_sub(1);
        last.gate_level = 0.0;
        last.is_running = false;
        self.channels.diagnostics.publish(&last);
        debug!("{}: released after {} blocks", CONFIG.name, self.blocks);

        GatePlugin {
            parameters: self.parameters,
            channels: self.channels,
            blocks: self.blocks,
        }
    }

    fn process_midi(&mut self, input: &[MidiEvent], output: &mut MidiBuffer) {
        let trigger = self.parameters.trigger();
        let Self {
            channels,
            gate,
            snapshot,
            clock,
            ..
        } = self;
        snapshot.midi_events = 0;
        snapshot.clear_log();

        // Every host event is observed, forwarded or not. Editor notes only
        // take the output space host events leave free.
        let spare = output.remaining().saturating_sub(input.len());
        let mut forward = |event: MidiEvent| {
            gate.observe(&event, trigger, *clock + u64::from(event.sample_offset));
            if !output.push(event) {
                return false;
            }
            snapshot.midi_events += 1;
            snapshot.log_event(&event);
            channels.monitor.try_push(event);
            true
        };

        // Editor notes first, at offset 0, so the batch stays sorted.
        channels.injection.try_drain(spare, |event| forward(event.at(0)));
        for event in input {
            forward(*event);
        }
    }

    fn wants_midi(&self) -> bool {
        true
    }

    fn process(&mut self, buffer: &mut Buffer, context: &ProcessContext) {
        self.process_block(buffer, context);
    }

    fn supports_double_precision(&self) -> bool {
        true
    }

    fn process_f64(&mut self, buffer: &mut Buffer<f64>, context: &ProcessContext) {
        self.process_block(buffer, context);
    }

    fn load_state(&mut self, data: &[u8]) -> PluginResult<()> {
        self.parameters.load_state(data).inspect_err(|err| {
            warn!(
                "{}: state rejected, keeping trigger note {}: {}",
                CONFIG.name,
                self.parameters.trigger(),
                err
            );
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notegate::core::MAX_MIDI_EVENTS;

    fn prepared() -> GateProcessor {
        GatePlugin::default().prepare(FullAudioSetup {
            sample_rate: 48000.0,
            max_buffer_size: 4,
            layout: BusLayout::stereo(),
        })
    }

    /// Run one block through the processor the way the host does.
    fn run(
        processor: &mut GateProcessor,
        events: &[MidiEvent],
        input: [f32; 4],
    ) -> (Vec<MidiEvent>, [[f32; 4]; 2]) {
        let mut midi = MidiBuffer::new();
        processor.process_midi(events, &mut midi);

        let mut left = [0.0f32; 4];
        let mut right = [0.0f32; 4];
        {
            let mut buffer = Buffer::new([&input[..], &input[..]], [&mut left[..], &mut right[..]], 4);
            processor.process(&mut buffer, &ProcessContext::with_empty_transport(48000.0, 4));
        }
        (midi.as_slice().to_vec(), [left, right])
    }

    #[test]
    fn config_describes_a_midi_effect() {
        assert_eq!(CONFIG.name, "MIDI Volume Gate");
        assert_eq!(CONFIG.category, "Fx");
        assert!(CONFIG.has_editor);

        let plugin = GatePlugin::default();
        assert!(plugin.wants_midi());
        assert_eq!(BusLayout::from_plugin(&plugin), BusLayout::stereo());
    }

    #[test]
    fn opens_at_full_velocity() {
        let mut processor = prepared();
        let events = [MidiEvent::note_on(0, 0, 60, 1.0)];
        let (midi, audio) = run(&mut processor, &events, [1.0; 4]);

        assert_eq!(processor.gate().level(), 1.0);
        assert_eq!(audio, [[1.0; 4]; 2]);
        assert_eq!(midi, events);
    }

    #[test]
    fn closed_gate_silences_block() {
        let mut processor = prepared();
        let (_, audio) = run(&mut processor, &[], [0.5; 4]);
        assert_eq!(audio, [[0.0; 4]; 2]);
    }

    #[test]
    fn timestamps_follow_the_sample_clock() {
        let mut processor = prepared();
        run(&mut processor, &[], [0.0; 4]);
        assert_eq!(processor.sample_clock(), 4);

        run(&mut processor, &[MidiEvent::note_on(3, 0, 60, 1.0)], [0.0; 4]);
        assert_eq!(processor.gate().last_event_time(), 7);
    }

    #[test]
    fn injected_notes_are_forwarded_first() {
        let mut processor = prepared();
        let handle = processor.handle();
        assert!(handle.note_on(0, 60, 0.5));

        let host_event = MidiEvent::control_change(2, 0, 1, 0.25);
        let (midi, audio) = run(&mut processor, &[host_event], [1.0; 4]);

        assert_eq!(midi, vec![MidiEvent::note_on(0, 0, 60, 0.5), host_event]);
        assert_eq!(audio, [[0.5; 4]; 2]);
    }

    #[test]
    fn editor_notes_never_displace_host_events() {
        let mut processor = prepared();
        let handle = processor.handle();
        run(&mut processor, &[MidiEvent::note_on(0, 0, 60, 1.0)], [1.0; 4]);

        // A full host batch ending in the trigger note-off
        assert!(handle.note_on(0, 64, 1.0));
        let mut events = vec![MidiEvent::control_change(0, 0, 1, 0.5); MAX_MIDI_EVENTS - 1];
        events.push(MidiEvent::note_off(3, 0, 60, 0.0));
        let (midi, audio) = run(&mut processor, &events, [1.0; 4]);

        assert_eq!(midi, events);
        assert_eq!(processor.gate().level(), 0.0);
        assert_eq!(audio, [[0.0; 4]; 2]);
        assert_eq!(processor.channels.injection.len(), 1);

        // The held-back note goes out with the next block
        let (midi, _) = run(&mut processor, &[], [1.0; 4]);
        assert_eq!(midi, vec![MidiEvent::note_on(0, 0, 64, 1.0)]);
        assert_eq!(processor.gate().level(), 0.0);
    }

    #[test]
    fn events_past_output_capacity_still_reach_the_gate() {
        let mut processor = prepared();
        let mut events = vec![MidiEvent::control_change(0, 0, 1, 0.5); MAX_MIDI_EVENTS];
        events.push(MidiEvent::note_on(3, 0, 60, 1.0));
        let (midi, audio) = run(&mut processor, &events, [1.0; 4]);

        assert_eq!(midi.len(), MAX_MIDI_EVENTS);
        assert_eq!(processor.gate().level(), 1.0);
        assert_eq!(audio, [[1.0; 4]; 2]);
        assert_eq!(processor.handle().snapshot().unwrap().midi_events, MAX_MIDI_EVENTS);
    }

    #[test]
    fn snapshot_describes_the_block() {
        let mut processor = prepared();
        let handle = processor.handle();
        assert!(handle.snapshot().is_none());
        assert!(handle.debug_text().starts_with("Audio Setup:\nSample Rate: 48000.0 Hz"));

        run(&mut processor, &[MidiEvent::note_on(1, 0, 60, 1.0)], [1.0; 4]);
        let first = handle.snapshot().unwrap();
        assert_eq!(first.block, 0);
        assert_eq!(first.midi_events, 1);
        assert_eq!(first.channels, 2);
        assert_eq!(first.block_size, 4);
        assert_eq!(first.gate_level, 1.0);
        assert_eq!(first.trigger_note, 60);
        assert!(first.is_running);
        assert_eq!(first.events()[0].to_string(), "90 3C 7F");

        run(&mut processor, &[], [1.0; 4]);
        let second = handle.snapshot().unwrap();
        assert_eq!(second.block, 1);
        assert_eq!(second.midi_events, 0);
        assert!(second.events().is_empty());
    }

    #[test]
    fn forwarded_midi_reaches_the_monitor() {
        let mut processor = prepared();
        let handle = processor.handle();
        run(&mut processor, &[MidiEvent::note_on(0, 0, 64, 1.0)], [0.0; 4]);

        let mut seen = Vec::new();
        handle.drain_midi(|event| seen.push(event));
        assert_eq!(seen, vec![MidiEvent::note_on(0, 0, 64, 1.0)]);
    }

    #[test]
    fn unprepare_keeps_parameters_and_reports_stopped() {
        let mut processor = prepared();
        let handle = processor.handle();
        handle.set_trigger_note(72);
        run(&mut processor, &[], [0.0; 4]);
        run(&mut processor, &[MidiEvent::note_on(0, 0, 72, 1.0)], [0.0; 4]);

        let plugin = processor.unprepare();
        assert_eq!(plugin.parameters().trigger(), 72);

        let last = handle.snapshot().unwrap();
        assert!(!last.is_running);
        assert_eq!(last.block, 1);
        assert_eq!(last.gate_level, 0.0);
        assert_eq!(last.midi_events, 1);
        assert_eq!(last.events()[0].to_string(), "90 48 7F");

        // Handles taken before prepare stay connected
        let processor = plugin.prepare(FullAudioSetup {
            sample_rate: 44100.0,
            max_buffer_size: 4,
            layout: BusLayout::stereo(),
        });
        assert_eq!(handle.setup_info().map(|s| s.sample_rate), Some(44100.0));
        assert_eq!(processor.blocks, 2);
    }

    #[test]
    fn double_precision_applies_the_same_level() {
        let mut processor = prepared();
        let mut midi = MidiBuffer::new();
        processor.process_midi(&[MidiEvent::note_on(0, 0, 60, 0.5)], &mut midi);

        let input = [2.0f64; 4];
        let mut left = [0.0f64; 4];
        let mut right = [0.0f64; 4];
        {
            let mut buffer = Buffer::new([&input[..], &input[..]], [&mut left[..], &mut right[..]], 4);
            processor.process_f64(&mut buffer, &ProcessContext::with_empty_transport(48000.0, 4));
        }
        assert!(processor.supports_double_precision());
        assert_eq!(left, [1.0; 4]);
        assert_eq!(right, [1.0; 4]);
    }

    #[test]
    fn rejected_state_keeps_trigger_note() {
        let mut processor = prepared();
        processor.parameters().set_trigger(50);
        assert!(processor.load_state(&[200]).is_err());
        assert_eq!(processor.parameters().trigger(), 50);

        let mut restored = prepared();
        let blob = processor.save_state().unwrap();
        restored.load_state(&blob).unwrap();
        assert_eq!(restored.parameters().trigger(), 50);
    }
}
