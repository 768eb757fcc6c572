//! Parameter value formatting and parsing.
//!
//! [`Formatter`] converts plain parameter values to display strings and
//! parses user input back.
//!
//! ```ignore
//! use notegate_core::parameter_format::Formatter;
//!
//! assert_eq!(Formatter::Float { precision: 2 }.format(0.5), "0.50");
//! assert_eq!(Formatter::MidiNote.format(60.0), "C3");
//! assert_eq!(Formatter::MidiNote.parse("C#3"), Some(61.0));
//! ```

use crate::midi::MidiNote;

const NOTE_NAMES: [&str; 12] = ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"];

/// Octave number of MIDI note 0. With this offset note 60 is `C3`.
const LOWEST_OCTAVE: i32 = -2;

/// Parameter value formatter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Formatter {
    /// Generic float with configurable precision (e.g., "1.23").
    Float {
        /// Number of decimal places.
        precision: usize,
    },

    /// MIDI note number displayed as a note name.
    ///
    /// Display: "C3" (60), "A#-1" (22). Accepts a note name or a plain
    /// number when parsing.
    MidiNote,
}

impl Formatter {
    /// Format a plain value to a display string.
    pub fn format(&self, value: f64) -> String {
        match self {
            Formatter::Float { precision } => format!("{:.prec$}", value, prec = *precision),
            Formatter::MidiNote => note_name(value.round().clamp(0.0, 127.0) as MidiNote),
        }
    }

    /// Parse a display string to a plain value.
    ///
    /// Surrounding whitespace is ignored. Returns `None` for unparseable
    /// input.
    pub fn parse(&self, s: &str) -> Option<f64> {
        let s = s.trim();
        match self {
            Formatter::Float { .. } => s.parse().ok(),
            Formatter::MidiNote => parse_note_name(s)
                .map(f64::from)
                .or_else(|| s.parse::<f64>().ok().filter(|v| v.is_finite())),
        }
    }

    /// Unit label for hosts that show one next to the value.
    pub fn units(&self) -> &'static str {
        match self {
            Formatter::Float { .. } | Formatter::MidiNote => "",
        }
    }
}

impl Default for Formatter {
    fn default() -> Self {
        Formatter::Float { precision: 2 }
    }
}

/// Note name with octave, e.g. `C3` for note 60 and `C-2` for note 0.
pub fn note_name(note: MidiNote) -> String {
    let note = note.min(127);
    let octave = (note / 12) as i32 + LOWEST_OCTAVE;
    format!("{}{}", NOTE_NAMES[(note % 12) as usize], octave)
}

/// Parse a note name like `C3`, `f#4`, `Eb-1` into a MIDI note number.
///
/// Returns `None` for malformed names and notes outside 0..=127.
pub fn parse_note_name(s: &str) -> Option<MidiNote> {
    let mut chars = s.chars();
    let letter = chars.next()?.to_ascii_uppercase();
    let pitch_class: i32 = match letter {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return None,
    };

    let rest = chars.as_str();
    let (accidental, octave_str) = match rest.as_bytes().first() {
        Some(b'#') => (1, &rest[1..]),
        Some(b'b') => (-1, &rest[1..]),
        _ => (0, rest),
    };

    let octave: i32 = octave_str.parse().ok()?;
    let note = (octave - LOWEST_OCTAVE) * 12 + pitch_class + accidental;
    u8::try_from(note).ok().filter(|n| *n <= 127)
}
