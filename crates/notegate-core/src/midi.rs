//! MIDI event types for audio plugins.
//!
//! Format-agnostic channel-voice events designed for real-time processing.
//! Every type here is `Copy`, so events move through fixed-size buffers
//! without heap allocation.
//!
//! Values are normalized the way plugin formats deliver them: velocities,
//! pressures and controller values are `0.0..=1.0` (raw value / 127) and
//! pitch bend is `-1.0..=1.0`. [`MidiEvent::from_bytes`] and
//! [`MidiEvent::to_bytes`] convert to and from MIDI 1.0 wire bytes.

use std::fmt;

// =============================================================================
// Basic MIDI Types
// =============================================================================

/// MIDI channel (0-15).
pub type MidiChannel = u8;

/// MIDI note number (0-127, where 60 = middle C).
pub type MidiNote = u8;

/// A MIDI note-on event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteOn {
    /// MIDI channel (0-15).
    pub channel: MidiChannel,
    /// Note number (0-127).
    pub pitch: MidiNote,
    /// Velocity (0.0 to 1.0). A velocity of 0.0 is a note-off in MIDI 1.0.
    pub velocity: f32,
}

/// A MIDI note-off event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoteOff {
    /// MIDI channel (0-15).
    pub channel: MidiChannel,
    /// Note number (0-127).
    pub pitch: MidiNote,
    /// Release velocity (0.0 to 1.0).
    pub velocity: f32,
}

/// Polyphonic key pressure (aftertouch per note).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolyPressure {
    pub channel: MidiChannel,
    pub pitch: MidiNote,
    /// Pressure amount (0.0 to 1.0).
    pub pressure: f32,
}

/// Control Change (CC) message.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlChange {
    pub channel: MidiChannel,
    /// Controller number (0-127).
    pub controller: u8,
    /// Controller value (0.0 to 1.0, normalized from 0-127).
    pub value: f32,
}

/// Pitch bend message.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PitchBend {
    pub channel: MidiChannel,
    /// Pitch bend value (-1.0 to 1.0, where 0.0 is center).
    pub value: f32,
}

/// Channel pressure (channel aftertouch).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelPressure {
    pub channel: MidiChannel,
    /// Pressure amount (0.0 to 1.0).
    pub pressure: f32,
}

/// Program change message.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgramChange {
    pub channel: MidiChannel,
    /// Program number (0-127).
    pub program: u8,
}

// =============================================================================
// MIDI Event Enum
// =============================================================================

/// MIDI event types.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MidiEventKind {
    NoteOn(NoteOn),
    NoteOff(NoteOff),
    PolyPressure(PolyPressure),
    ControlChange(ControlChange),
    PitchBend(PitchBend),
    ChannelPressure(ChannelPressure),
    ProgramChange(ProgramChange),
}

impl MidiEventKind {
    /// Channel the event is addressed to.
    pub const fn channel(&self) -> MidiChannel {
        match self {
            Self::NoteOn(e) => e.channel,
            Self::NoteOff(e) => e.channel,
            Self::PolyPressure(e) => e.channel,
            Self::ControlChange(e) => e.channel,
            Self::PitchBend(e) => e.channel,
            Self::ChannelPressure(e) => e.channel,
            Self::ProgramChange(e) => e.channel,
        }
    }
}

/// A sample-accurate MIDI event.
///
/// `sample_offset` is the position within the current block (0 = first
/// sample). Events in a batch are ordered by offset; events sharing an
/// offset keep their delivery order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MidiEvent {
    /// Sample offset within the current buffer (0 = start of buffer).
    pub sample_offset: u32,
    /// The MIDI event data.
    pub event: MidiEventKind,
}

impl Default for MidiEvent {
    /// A zeroed note-off, used to fill fixed-size buffers.
    fn default() -> Self {
        Self::EMPTY
    }
}

impl MidiEvent {
    const EMPTY: Self = Self::note_off(0, 0, 0, 0.0);

    /// Create a new note-on event.
    pub const fn note_on(
        sample_offset: u32,
        channel: MidiChannel,
        pitch: MidiNote,
        velocity: f32,
    ) -> Self {
        Self {
            sample_offset,
            event: MidiEventKind::NoteOn(NoteOn {
                channel,
                pitch,
                velocity,
            }),
        }
    }

    /// Create a new note-off event.
    pub const fn note_off(
        sample_offset: u32,
        channel: MidiChannel,
        pitch: MidiNote,
        velocity: f32,
    ) -> Self {
        Self {
            sample_offset,
            event: MidiEventKind::NoteOff(NoteOff {
                channel,
                pitch,
                velocity,
            }),
        }
    }

    pub const fn poly_pressure(
        sample_offset: u32,
        channel: MidiChannel,
        pitch: MidiNote,
        pressure: f32,
    ) -> Self {
        Self {
            sample_offset,
            event: MidiEventKind::PolyPressure(PolyPressure {
                channel,
                pitch,
                pressure,
            }),
        }
    }

    pub const fn control_change(
        sample_offset: u32,
        channel: MidiChannel,
        controller: u8,
        value: f32,
    ) -> Self {
        Self {
            sample_offset,
            event: MidiEventKind::ControlChange(ControlChange {
                channel,
                controller,
                value,
            }),
        }
    }

    pub const fn pitch_bend(sample_offset: u32, channel: MidiChannel, value: f32) -> Self {
        Self {
            sample_offset,
            event: MidiEventKind::PitchBend(PitchBend { channel, value }),
        }
    }

    pub const fn channel_pressure(
        sample_offset: u32,
        channel: MidiChannel,
        pressure: f32,
    ) -> Self {
        Self {
            sample_offset,
            event: MidiEventKind::ChannelPressure(ChannelPressure { channel, pressure }),
        }
    }

    pub const fn program_change(sample_offset: u32, channel: MidiChannel, program: u8) -> Self {
        Self {
            sample_offset,
            event: MidiEventKind::ProgramChange(ProgramChange { channel, program }),
        }
    }

    /// Same timing, different payload.
    ///
    /// ```ignore
    /// MidiEventKind::NoteOn(note_on) => {
    ///     output.push(event.with(MidiEventKind::NoteOn(NoteOn {
    ///         pitch: note_on.pitch + 12,
    ///         ..note_on
    ///     })));
    /// }
    /// ```
    pub const fn with(self, kind: MidiEventKind) -> Self {
        MidiEvent {
            sample_offset: self.sample_offset,
            event: kind,
        }
    }

    /// Same payload, different timing.
    pub const fn at(self, sample_offset: u32) -> Self {
        MidiEvent {
            sample_offset,
            event: self.event,
        }
    }

    // =========================================================================
    // MIDI 1.0 Wire Format
    // =========================================================================

    /// Decode a MIDI 1.0 channel-voice message.
    ///
    /// Running status is not supported: `bytes[0]` must be a status byte.
    /// A note-on with velocity 0 decodes to a note-off. Returns `None` for
    /// system messages and truncated input.
    pub fn from_bytes(sample_offset: u32, bytes: &[u8]) -> Option<Self> {
        let (&status_byte, data) = bytes.split_first()?;
        if status_byte & 0x80 == 0 {
            return None;
        }

        let status = status_byte & 0xF0;
        let channel = status_byte & 0x0F;
        let data1 = data.first().map(|b| b & 0x7F);
        let data2 = data.get(1).map(|b| b & 0x7F);

        let kind = match (status, data1, data2) {
            (0x80, Some(pitch), Some(velocity)) => MidiEventKind::NoteOff(NoteOff {
                channel,
                pitch,
                velocity: velocity as f32 / 127.0,
            }),
            (0x90, Some(pitch), Some(0)) => MidiEventKind::NoteOff(NoteOff {
                channel,
                pitch,
                velocity: 0.0,
            }),
            (0x90, Some(pitch), Some(velocity)) => MidiEventKind::NoteOn(NoteOn {
                channel,
                pitch,
                velocity: velocity as f32 / 127.0,
            }),
            (0xA0, Some(pitch), Some(pressure)) => MidiEventKind::PolyPressure(PolyPressure {
                channel,
                pitch,
                pressure: pressure as f32 / 127.0,
            }),
            (0xB0, Some(controller), Some(value)) => MidiEventKind::ControlChange(ControlChange {
                channel,
                controller,
                value: value as f32 / 127.0,
            }),
            (0xC0, Some(program), _) => {
                MidiEventKind::ProgramChange(ProgramChange { channel, program })
            }
            (0xD0, Some(pressure), _) => MidiEventKind::ChannelPressure(ChannelPressure {
                channel,
                pressure: pressure as f32 / 127.0,
            }),
            (0xE0, Some(lsb), Some(msb)) => {
                let raw = ((msb as u16) << 7) | lsb as u16;
                MidiEventKind::PitchBend(PitchBend {
                    channel,
                    value: (raw as f32 - 8192.0) / 8192.0,
                })
            }
            _ => return None,
        };

        Some(Self {
            sample_offset,
            event: kind,
        })
    }

    /// Encode as a MIDI 1.0 channel-voice message.
    pub fn to_bytes(&self) -> RawMidi {
        match self.event {
            MidiEventKind::NoteOn(e) => {
                RawMidi::three(0x90 | channel_bits(e.channel), e.pitch, to_7bit(e.velocity))
            }
            MidiEventKind::NoteOff(e) => {
                RawMidi::three(0x80 | channel_bits(e.channel), e.pitch, to_7bit(e.velocity))
            }
            MidiEventKind::PolyPressure(e) => {
                RawMidi::three(0xA0 | channel_bits(e.channel), e.pitch, to_7bit(e.pressure))
            }
            MidiEventKind::ControlChange(e) => {
                RawMidi::three(0xB0 | channel_bits(e.channel), e.controller, to_7bit(e.value))
            }
            MidiEventKind::ProgramChange(e) => {
                RawMidi::two(0xC0 | channel_bits(e.channel), e.program)
            }
            MidiEventKind::ChannelPressure(e) => {
                RawMidi::two(0xD0 | channel_bits(e.channel), to_7bit(e.pressure))
            }
            MidiEventKind::PitchBend(e) => {
                let raw = ((e.value.clamp(-1.0, 1.0) * 8192.0 + 8192.0).round() as u16).min(16383);
                RawMidi::three(
                    0xE0 | channel_bits(e.channel),
                    (raw & 0x7F) as u8,
                    ((raw >> 7) & 0x7F) as u8,
                )
            }
        }
    }
}

#[inline]
fn channel_bits(channel: MidiChannel) -> u8 {
    channel & 0x0F
}

#[inline]
fn to_7bit(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 127.0).round() as u8
}

// =============================================================================
// Raw Bytes
// =============================================================================

/// Encoded MIDI 1.0 message (at most 3 bytes, stored inline).
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct RawMidi {
    data: [u8; 3],
    len: u8,
}

impl RawMidi {
    const fn two(status: u8, data1: u8) -> Self {
        Self {
            data: [status, data1 & 0x7F, 0],
            len: 2,
        }
    }

    const fn three(status: u8, data1: u8, data2: u8) -> Self {
        Self {
            data: [status, data1 & 0x7F, data2 & 0x7F],
            len: 3,
        }
    }

    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.len as usize]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl fmt::Debug for RawMidi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RawMidi[{}]", self)
    }
}

/// Space-separated uppercase hex, e.g. `90 3C 7F`.
impl fmt::Display for RawMidi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, byte) in self.as_slice().iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{:02X}", byte)?;
        }
        Ok(())
    }
}

// =============================================================================
// MidiBuffer
// =============================================================================

/// Maximum number of MIDI events per buffer.
pub const MAX_MIDI_EVENTS: usize = 1024;

/// A buffer for collecting MIDI events during processing.
///
/// Fixed-size storage, so pushing never allocates. Events should be added
/// in chronological order (by `sample_offset`).
#[derive(Debug)]
pub struct MidiBuffer {
    events: [MidiEvent; MAX_MIDI_EVENTS],
    len: usize,
    overflowed: bool,
}

impl MidiBuffer {
    pub fn new() -> Self {
        Self {
            events: [MidiEvent::EMPTY; MAX_MIDI_EVENTS],
            len: 0,
            overflowed: false,
        }
    }

    /// Clear all events and the overflow flag.
    #[inline]
    pub fn clear(&mut self) {
        self.len = 0;
        self.overflowed = false;
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Events that still fit before the buffer overflows.
    #[inline]
    pub fn remaining(&self) -> usize {
        MAX_MIDI_EVENTS - self.len
    }

    /// Returns true if any push failed since the last clear.
    #[inline]
    pub fn has_overflowed(&self) -> bool {
        self.overflowed
    }

    /// Push an event to the buffer.
    ///
    /// Returns `false` and sets the overflow flag when the buffer is full.
    #[inline]
    pub fn push(&mut self, event: MidiEvent) -> bool {
        if self.len < MAX_MIDI_EVENTS {
            self.events[self.len] = event;
            self.len += 1;
            true
        } else {
            self.overflowed = true;
            false
        }
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &MidiEvent> {
        self.events[..self.len].iter()
    }

    #[inline]
    pub fn as_slice(&self) -> &[MidiEvent] {
        &self.events[..self.len]
    }
}

impl Default for MidiBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_note_on() {
        let event = MidiEvent::from_bytes(12, &[0x91, 60, 127]).unwrap();
        assert_eq!(event.sample_offset, 12);
        match event.event {
            MidiEventKind::NoteOn(on) => {
                assert_eq!(on.channel, 1);
                assert_eq!(on.pitch, 60);
                assert_eq!(on.velocity, 1.0);
            }
            other => panic!("expected NoteOn, got {:?}", other),
        }
    }

    #[test]
    fn note_on_velocity_zero_is_note_off() {
        let event = MidiEvent::from_bytes(0, &[0x90, 60, 0]).unwrap();
        assert!(matches!(
            event.event,
            MidiEventKind::NoteOff(NoteOff { pitch: 60, velocity, .. }) if velocity == 0.0
        ));
    }

    #[test]
    fn pitch_bend_center_and_extremes() {
        let center = MidiEvent::from_bytes(0, &[0xE0, 0x00, 0x40]).unwrap();
        assert_eq!(center.event, MidiEventKind::PitchBend(PitchBend { channel: 0, value: 0.0 }));

        let low = MidiEvent::from_bytes(0, &[0xE0, 0x00, 0x00]).unwrap();
        assert_eq!(low.event, MidiEventKind::PitchBend(PitchBend { channel: 0, value: -1.0 }));

        assert_eq!(center.to_bytes().as_slice(), &[0xE0, 0x00, 0x40]);
        assert_eq!(low.to_bytes().as_slice(), &[0xE0, 0x00, 0x00]);
    }

    #[test]
    fn rejects_system_and_truncated_messages() {
        assert!(MidiEvent::from_bytes(0, &[]).is_none());
        assert!(MidiEvent::from_bytes(0, &[0x3C, 0x7F]).is_none());
        assert!(MidiEvent::from_bytes(0, &[0x90, 60]).is_none());
        assert!(MidiEvent::from_bytes(0, &[0xF8]).is_none());
    }

    #[test]
    fn encodes_note_events() {
        let on = MidiEvent::note_on(0, 0, 60, 1.0);
        assert_eq!(on.to_bytes().as_slice(), &[0x90, 0x3C, 0x7F]);

        let off = MidiEvent::note_off(3, 2, 72, 0.0);
        assert_eq!(off.to_bytes().as_slice(), &[0x82, 0x48, 0x00]);

        // 100/127 must survive the float round trip
        let soft = MidiEvent::note_on(0, 0, 60, 100.0 / 127.0);
        assert_eq!(soft.to_bytes().as_slice(), &[0x90, 0x3C, 100]);
    }

    #[test]
    fn two_byte_messages() {
        let program = MidiEvent::program_change(0, 4, 9);
        assert_eq!(program.to_bytes().as_slice(), &[0xC4, 0x09]);
        assert_eq!(MidiEvent::from_bytes(0, &[0xC4, 0x09]), Some(program));
    }

    #[test]
    fn raw_display_is_uppercase_hex() {
        let raw = MidiEvent::note_on(0, 0, 60, 1.0).to_bytes();
        assert_eq!(raw.to_string(), "90 3C 7F");
        assert_eq!(RawMidi::default().to_string(), "");
    }

    #[test]
    fn buffer_push_until_overflow() {
        let mut buffer = MidiBuffer::new();
        assert_eq!(buffer.remaining(), MAX_MIDI_EVENTS);
        for i in 0..MAX_MIDI_EVENTS {
            assert!(buffer.push(MidiEvent::note_on(i as u32, 0, 60, 0.5)));
        }
        assert_eq!(buffer.remaining(), 0);
        assert!(!buffer.has_overflowed());
        assert!(!buffer.push(MidiEvent::note_off(0, 0, 60, 0.0)));
        assert!(buffer.has_overflowed());
        assert_eq!(buffer.len(), MAX_MIDI_EVENTS);

        buffer.clear();
        assert!(buffer.is_empty());
        assert!(!buffer.has_overflowed());
    }

    #[test]
    fn with_and_at_keep_the_other_half() {
        let event = MidiEvent::note_on(7, 0, 60, 0.5);
        let moved = event.at(0);
        assert_eq!(moved.sample_offset, 0);
        assert_eq!(moved.event, event.event);

        let retuned = event.with(MidiEventKind::NoteOn(NoteOn { pitch: 72, channel: 0, velocity: 0.5 }));
        assert_eq!(retuned.sample_offset, 7);
        assert_eq!(retuned.event.channel(), 0);
    }
}
