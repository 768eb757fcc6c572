//! Parameter types with encapsulated atomic storage.
//!
//! Declare parameters with `#[derive(Parameters)]`:
//!
//! ```ignore
//! use notegate::prelude::*;
//!
//! #[derive(Parameters)]
//! pub struct GateParameters {
//!     #[parameter(id = "triggerNote", name = "Trigger Note", default = 60, range = 0..=127, kind = "note")]
//!     pub trigger_note: IntParameter,
//! }
//! ```
//!
//! The derive implements [`Parameters`] and
//! [`ParameterStore`](crate::parameter_store::ParameterStore), assigns every
//! field its FNV-1a id and string key, and generates `Default`.

use std::ops::RangeInclusive;
use std::sync::atomic::{AtomicI64, Ordering};

use crate::error::{PluginError, PluginResult};
use crate::parameter_format::Formatter;
use crate::parameter_info::{ParameterFlags, ParameterInfo};
use crate::types::{ParameterId, ParameterValue};

// =============================================================================
// ParameterRef Trait - Type-erased parameter access
// =============================================================================

/// Type-erased access to a single parameter.
///
/// Lets host adapters and state code walk a heterogeneous collection
/// without knowing the concrete parameter types.
pub trait ParameterRef: Send + Sync {
    fn id(&self) -> ParameterId;

    /// Stable string identifier used in saved state.
    fn key(&self) -> &'static str;

    fn name(&self) -> &'static str;

    fn short_name(&self) -> &'static str;

    fn units(&self) -> &'static str;

    fn flags(&self) -> &ParameterFlags;

    fn default_normalized(&self) -> ParameterValue;

    /// 0 = continuous, 1 = toggle, >1 = discrete.
    fn step_count(&self) -> i32;

    /// Current normalized value (0.0-1.0). Lock-free; safe on the audio thread.
    fn get_normalized(&self) -> ParameterValue;

    /// Set the normalized value, clamped to [0.0, 1.0]. Lock-free.
    fn set_normalized(&self, value: ParameterValue);

    /// Current value in natural units.
    fn get_plain(&self) -> ParameterValue;

    fn set_plain(&self, value: ParameterValue);

    /// Format the current value for display.
    fn display(&self) -> String {
        self.display_normalized(self.get_normalized())
    }

    fn display_normalized(&self, normalized: ParameterValue) -> String;

    /// Parse a display string to a normalized value.
    fn parse(&self, s: &str) -> Option<ParameterValue>;

    fn normalized_to_plain(&self, normalized: ParameterValue) -> ParameterValue;

    fn plain_to_normalized(&self, plain: ParameterValue) -> ParameterValue;

    fn info(&self) -> &ParameterInfo;
}

// =============================================================================
// Parameters Trait - Parameter collection
// =============================================================================

/// A plugin's parameter collection.
///
/// Provides type-erased iteration plus state serialization. The state blob
/// is a sequence of entries:
///
/// ```text
/// [key_len: u8][key: utf8 bytes][normalized value: f64 little-endian]
/// ```
///
/// Keys are the stable string ids (`"triggerNote"`), so reordering fields
/// or adding parameters keeps old sessions loadable.
pub trait Parameters: Send + Sync {
    fn count(&self) -> usize;

    /// Iterate over all parameters (type-erased).
    fn iter(&self) -> Box<dyn Iterator<Item = &dyn ParameterRef> + '_>;

    fn by_id(&self, id: ParameterId) -> Option<&dyn ParameterRef>;

    /// Look up a parameter by its string key.
    fn by_key(&self, key: &str) -> Option<&dyn ParameterRef> {
        self.iter().find(|parameter| parameter.key() == key)
    }

    /// Reset every parameter to its default value.
    fn reset_to_defaults(&self) {
        for parameter in self.iter() {
            parameter.set_normalized(parameter.default_normalized());
        }
    }

    // =========================================================================
    // State Serialization
    // =========================================================================

    /// Serialize all parameters to bytes.
    fn save_state(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(self.count() * 24);
        for parameter in self.iter() {
            encode_state_entry(&mut data, parameter.key(), parameter.get_normalized());
        }
        data
    }

    /// Restore parameters from bytes.
    ///
    /// The blob is validated as a whole before anything is applied: a
    /// truncated entry, a key that isn't UTF-8 or a non-finite value rejects
    /// it with [`PluginError::StateError`] and leaves every parameter
    /// untouched. Unknown keys are skipped for forward compatibility. An
    /// empty blob means "no saved state" and succeeds without changes.
    fn load_state(&self, data: &[u8]) -> PluginResult<()> {
        let entries = decode_state(data)?;
        for (key, value) in entries {
            if let Some(parameter) = self.by_key(key) {
                parameter.set_normalized(value);
            }
        }
        Ok(())
    }
}

/// Size of the value field in a state entry.
const STATE_VALUE_SIZE: usize = std::mem::size_of::<f64>();

/// Append one `[key_len][key][value]` entry.
///
/// Keys longer than 255 bytes are truncated; the derive macro rejects
/// such ids at compile time.
pub fn encode_state_entry(data: &mut Vec<u8>, key: &str, value: ParameterValue) {
    let key_bytes = &key.as_bytes()[..key.len().min(u8::MAX as usize)];
    data.push(key_bytes.len() as u8);
    data.extend_from_slice(key_bytes);
    data.extend_from_slice(&value.to_le_bytes());
}

/// Parse and validate a complete state blob.
pub fn decode_state(data: &[u8]) -> PluginResult<Vec<(&str, ParameterValue)>> {
    let mut entries = Vec::new();
    let mut cursor = 0;

    while cursor < data.len() {
        let key_len = data[cursor] as usize;
        cursor += 1;

        let key_end = cursor + key_len;
        let value_end = key_end + STATE_VALUE_SIZE;
        if value_end > data.len() {
            return Err(PluginError::StateError(format!(
                "entry at byte {} is truncated ({} bytes left, {} needed)",
                cursor - 1,
                data.len() - cursor,
                key_len + STATE_VALUE_SIZE
            )));
        }

        let key = std::str::from_utf8(&data[cursor..key_end]).map_err(|_| {
            PluginError::StateError(format!("entry at byte {} has a non UTF-8 key", cursor - 1))
        })?;

        let mut value_bytes = [0u8; STATE_VALUE_SIZE];
        value_bytes.copy_from_slice(&data[key_end..value_end]);
        let value = f64::from_le_bytes(value_bytes);
        if !value.is_finite() {
            return Err(PluginError::StateError(format!(
                "value for '{}' is not finite",
                key
            )));
        }

        entries.push((key, value.clamp(0.0, 1.0)));
        cursor = value_end;
    }

    Ok(entries)
}

// =============================================================================
// IntParameter - Integer parameter
// =============================================================================

/// Discrete integer parameter.
///
/// - [`IntParameter::new`]: generic integer, displayed as a plain number
/// - [`IntParameter::note`]: MIDI note number, displayed as a note name
///
/// ```ignore
/// let note = IntParameter::note("Trigger Note", 60, 0..=127).with_key("triggerNote");
/// assert_eq!(note.display(), "C3");
/// ```
pub struct IntParameter {
    info: ParameterInfo,
    value: AtomicI64,
    min: i64,
    max: i64,
    formatter: Formatter,
}

impl IntParameter {
    /// Generic integer parameter.
    ///
    /// The id and key are empty until set via [`with_key`](Self::with_key)
    /// or the `#[derive(Parameters)]` macro.
    pub fn new(name: &'static str, default: i64, range: RangeInclusive<i64>) -> Self {
        let min = *range.start();
        let max = *range.end();
        // i128 keeps extreme ranges like i64::MIN..=i64::MAX from overflowing
        let range_size = (max as i128) - (min as i128);
        let default_offset = (default as i128) - (min as i128);
        let default_normalized = if range_size == 0 {
            0.5
        } else {
            ((default_offset as f64) / (range_size as f64)).clamp(0.0, 1.0)
        };
        let step_count = range_size.min(i32::MAX as i128) as i32;

        Self {
            info: ParameterInfo::new(0, name)
                .with_default(default_normalized)
                .with_steps(step_count),
            value: AtomicI64::new(default.clamp(min, max)),
            min,
            max,
            formatter: Formatter::Float { precision: 0 },
        }
    }

    /// MIDI note parameter displayed as a note name ("C3" for 60).
    ///
    /// The range is clamped to 0..=127.
    pub fn note(name: &'static str, default: i64, range: RangeInclusive<i64>) -> Self {
        let min = (*range.start()).clamp(0, 127);
        let max = (*range.end()).clamp(min, 127);
        let mut parameter = Self::new(name, default, min..=max);
        parameter.formatter = Formatter::MidiNote;
        parameter
    }

    // === Builder methods ===

    pub fn with_id(mut self, id: ParameterId) -> Self {
        self.info.id = id;
        self
    }

    /// Set the string key and derive the numeric id from it.
    pub fn with_key(mut self, key: &'static str) -> Self {
        self.info.key = key;
        self.info.id = notegate_utils::fnv1a_32(key);
        self
    }

    pub fn with_short_name(mut self, short: &'static str) -> Self {
        self.info.short_name = short;
        self
    }

    pub fn readonly(mut self) -> Self {
        self.info.flags.is_readonly = true;
        self.info.flags.can_automate = false;
        self
    }

    pub fn non_automatable(mut self) -> Self {
        self.info.flags.can_automate = false;
        self
    }

    pub fn info(&self) -> &ParameterInfo {
        &self.info
    }

    pub fn range(&self) -> RangeInclusive<i64> {
        self.min..=self.max
    }

    // === Value access ===

    /// Current value. A single relaxed atomic load.
    #[inline]
    pub fn get(&self) -> i64 {
        self.value.load(Ordering::Relaxed)
    }

    /// Set the value, clamped to the parameter range.
    #[inline]
    pub fn set(&self, value: i64) {
        self.value.store(value.clamp(self.min, self.max), Ordering::Relaxed);
    }
}

impl ParameterRef for IntParameter {
    fn id(&self) -> ParameterId {
        self.info.id
    }

    fn key(&self) -> &'static str {
        self.info.key
    }

    fn name(&self) -> &'static str {
        self.info.name
    }

    fn short_name(&self) -> &'static str {
        self.info.short_name
    }

    fn units(&self) -> &'static str {
        self.formatter.units()
    }

    fn flags(&self) -> &ParameterFlags {
        &self.info.flags
    }

    fn default_normalized(&self) -> ParameterValue {
        self.info.default_normalized
    }

    fn step_count(&self) -> i32 {
        self.info.step_count
    }

    fn get_normalized(&self) -> ParameterValue {
        self.plain_to_normalized(self.get() as f64)
    }

    fn set_normalized(&self, value: ParameterValue) {
        let plain = self.normalized_to_plain(value).round() as i64;
        self.set(plain);
    }

    fn get_plain(&self) -> ParameterValue {
        self.get() as f64
    }

    fn set_plain(&self, value: ParameterValue) {
        if value.is_finite() {
            self.set(value.round() as i64);
        }
    }

    fn display_normalized(&self, normalized: ParameterValue) -> String {
        let plain = self.normalized_to_plain(normalized).round();
        self.formatter.format(plain)
    }

    fn parse(&self, s: &str) -> Option<ParameterValue> {
        let plain = self.formatter.parse(s)?;
        Some(self.plain_to_normalized(plain.round()))
    }

    fn normalized_to_plain(&self, normalized: ParameterValue) -> ParameterValue {
        let normalized = if normalized.is_nan() { 0.0 } else { normalized.clamp(0.0, 1.0) };
        (self.min as f64) + normalized * ((self.max as f64) - (self.min as f64))
    }

    fn plain_to_normalized(&self, plain: ParameterValue) -> ParameterValue {
        if self.max == self.min {
            return 0.5;
        }
        ((plain - self.min as f64) / ((self.max as f64) - (self.min as f64))).clamp(0.0, 1.0)
    }

    fn info(&self) -> &ParameterInfo {
        &self.info
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Pair {
        note: IntParameter,
        steps: IntParameter,
    }

    impl Pair {
        fn new() -> Self {
            Self {
                note: IntParameter::note("Trigger Note", 60, 0..=127).with_key("triggerNote"),
                steps: IntParameter::new("Steps", 4, 1..=16).with_key("steps"),
            }
        }
    }

    impl Parameters for Pair {
        fn count(&self) -> usize {
            2
        }

        fn iter(&self) -> Box<dyn Iterator<Item = &dyn ParameterRef> + '_> {
            Box::new([&self.note as &dyn ParameterRef, &self.steps].into_iter())
        }

        fn by_id(&self, id: ParameterId) -> Option<&dyn ParameterRef> {
            self.iter().find(|p| p.id() == id)
        }
    }

    #[test]
    fn int_parameter_defaults() {
        let note = IntParameter::note("Trigger Note", 60, 0..=127).with_key("triggerNote");
        assert_eq!(note.get(), 60);
        assert_eq!(note.info().step_count, 127);
        assert!((note.default_normalized() - 60.0 / 127.0).abs() < 1e-12);
        assert_eq!(note.id(), notegate_utils::fnv1a_32("triggerNote"));
        assert_eq!(note.display(), "C3");
    }

    #[test]
    fn int_parameter_clamps() {
        let note = IntParameter::note("Trigger Note", 60, 0..=127);
        note.set(200);
        assert_eq!(note.get(), 127);
        note.set(-5);
        assert_eq!(note.get(), 0);
        note.set_normalized(2.0);
        assert_eq!(note.get(), 127);
        note.set_plain(f64::NAN);
        assert_eq!(note.get(), 127);
    }

    #[test]
    fn normalized_mapping_hits_every_step() {
        let note = IntParameter::note("Trigger Note", 60, 0..=127);
        for value in 0..=127i64 {
            note.set(value);
            let normalized = note.get_normalized();
            note.set(0);
            note.set_normalized(normalized);
            assert_eq!(note.get(), value);
        }
    }

    #[test]
    fn parse_note_name_or_number() {
        let note = IntParameter::note("Trigger Note", 60, 0..=127);
        assert_eq!(note.parse("C4"), Some(72.0 / 127.0));
        assert_eq!(note.parse("60"), Some(60.0 / 127.0));
        assert_eq!(note.parse("X"), None);
    }

    #[test]
    fn save_then_load_restores_values() {
        let source = Pair::new();
        source.note.set(72);
        source.steps.set(9);
        let blob = source.save_state();

        let target = Pair::new();
        target.load_state(&blob).unwrap();
        assert_eq!(target.note.get(), 72);
        assert_eq!(target.steps.get(), 9);
    }

    #[test]
    fn empty_blob_is_no_state() {
        let parameters = Pair::new();
        parameters.note.set(10);
        parameters.load_state(&[]).unwrap();
        assert_eq!(parameters.note.get(), 10);
    }

    #[test]
    fn truncated_blob_changes_nothing() {
        let source = Pair::new();
        source.note.set(72);
        source.steps.set(9);
        let mut blob = source.save_state();
        blob.pop();

        let target = Pair::new();
        let err = target.load_state(&blob).unwrap_err();
        assert!(matches!(err, PluginError::StateError(_)));
        // First entry was intact but must not have been applied
        assert_eq!(target.note.get(), 60);
        assert_eq!(target.steps.get(), 4);
    }

    #[test]
    fn garbage_blob_is_rejected() {
        let target = Pair::new();
        assert!(target.load_state(b"not a state blob").is_err());
        assert_eq!(target.note.get(), 60);
    }

    #[test]
    fn non_finite_value_is_rejected() {
        let mut blob = Vec::new();
        encode_state_entry(&mut blob, "triggerNote", f64::NAN);
        let target = Pair::new();
        assert!(target.load_state(&blob).is_err());
        assert_eq!(target.note.get(), 60);
    }

    #[test]
    fn unknown_keys_are_skipped() {
        let mut blob = Vec::new();
        encode_state_entry(&mut blob, "mix", 0.25);
        encode_state_entry(&mut blob, "triggerNote", 36.0 / 127.0);

        let target = Pair::new();
        target.load_state(&blob).unwrap();
        assert_eq!(target.note.get(), 36);
    }

    #[test]
    fn reset_restores_defaults() {
        let parameters = Pair::new();
        parameters.note.set(1);
        parameters.steps.set(1);
        parameters.reset_to_defaults();
        assert_eq!(parameters.note.get(), 60);
        assert_eq!(parameters.steps.get(), 4);
    }
}
