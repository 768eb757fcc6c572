//! Host-facing parameter interface.
//!
//! [`ParameterStore`] is the raw normalized-value view a host adapter talks
//! to. Plugin authors normally write `#[derive(Parameters)]`, which
//! implements both this trait and
//! [`Parameters`](crate::parameter_types::Parameters).
//!
//! Parameters are touched from the audio thread, the editor and host
//! automation at the same time, so implementations are `Send + Sync` and
//! store values in atomics.

use crate::parameter_info::ParameterInfo;
use crate::types::{ParameterId, ParameterValue};

/// Low-level trait for plugin parameter collections (host interface).
pub trait ParameterStore: Send + Sync {
    /// Returns the number of parameters.
    fn count(&self) -> usize;

    /// Parameter info by index (0 to count-1).
    fn info(&self, index: usize) -> Option<&ParameterInfo>;

    /// Current normalized value. Lock-free; safe on the audio thread.
    ///
    /// Unknown ids read as 0.0.
    fn get_normalized(&self, id: ParameterId) -> ParameterValue;

    /// Set the normalized value, clamped to [0.0, 1.0]. Lock-free.
    ///
    /// Unknown ids are ignored.
    fn set_normalized(&self, id: ParameterId, value: ParameterValue);

    /// Display string for a normalized value (automation lanes, tooltips).
    fn normalized_to_string(&self, id: ParameterId, normalized: ParameterValue) -> String;

    /// Parse user input into a normalized value.
    fn string_to_normalized(&self, id: ParameterId, string: &str) -> Option<ParameterValue>;

    fn normalized_to_plain(&self, id: ParameterId, normalized: ParameterValue) -> ParameterValue;

    fn plain_to_normalized(&self, id: ParameterId, plain: ParameterValue) -> ParameterValue;

    /// Find parameter info by ID (linear search).
    fn info_by_id(&self, id: ParameterId) -> Option<&ParameterInfo> {
        (0..self.count()).find_map(|i| self.info(i).filter(|info| info.id == id))
    }
}

/// Empty parameter collection for plugins with no parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoParameters;

impl ParameterStore for NoParameters {
    fn count(&self) -> usize {
        0
    }

    fn info(&self, _index: usize) -> Option<&ParameterInfo> {
        None
    }

    fn get_normalized(&self, _id: ParameterId) -> ParameterValue {
        0.0
    }

    fn set_normalized(&self, _id: ParameterId, _value: ParameterValue) {}

    fn normalized_to_string(&self, _id: ParameterId, _normalized: ParameterValue) -> String {
        String::new()
    }

    fn string_to_normalized(&self, _id: ParameterId, _string: &str) -> Option<ParameterValue> {
        None
    }

    fn normalized_to_plain(&self, _id: ParameterId, normalized: ParameterValue) -> ParameterValue {
        normalized
    }

    fn plain_to_normalized(&self, _id: ParameterId, plain: ParameterValue) -> ParameterValue {
        plain
    }
}

impl crate::parameter_types::Parameters for NoParameters {
    fn count(&self) -> usize {
        0
    }

    fn iter(&self) -> Box<dyn Iterator<Item = &dyn crate::parameter_types::ParameterRef> + '_> {
        Box::new(std::iter::empty())
    }

    fn by_id(&self, _id: ParameterId) -> Option<&dyn crate::parameter_types::ParameterRef> {
        None
    }
}
