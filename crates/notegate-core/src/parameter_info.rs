//! Parameter metadata types.

use crate::types::{ParameterId, ParameterValue};

/// Flags controlling parameter behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterFlags {
    /// Parameter can be automated by the host.
    pub can_automate: bool,
    /// Parameter is read-only (display only).
    pub is_readonly: bool,
    /// Parameter is hidden from the host's parameter list.
    pub is_hidden: bool,
}

impl ParameterFlags {
    const DEFAULT: Self = Self {
        can_automate: true,
        is_readonly: false,
        is_hidden: false,
    };
}

impl Default for ParameterFlags {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Metadata describing a single parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterInfo {
    /// Numeric identifier (FNV-1a hash of `key`).
    pub id: ParameterId,
    /// Stable string identifier used in saved state (e.g., "triggerNote").
    pub key: &'static str,
    /// Full parameter name (e.g., "Trigger Note").
    pub name: &'static str,
    /// Short parameter name for constrained UIs (e.g., "Note").
    pub short_name: &'static str,
    /// Unit label (e.g., "dB", "%", "Hz").
    pub units: &'static str,
    /// Default value in normalized form (0.0 to 1.0).
    pub default_normalized: ParameterValue,
    /// Number of discrete steps. 0 = continuous, 1 = toggle, >1 = discrete.
    pub step_count: i32,
    pub flags: ParameterFlags,
}

impl ParameterInfo {
    /// Continuous parameter with default flags and an empty key.
    pub const fn new(id: ParameterId, name: &'static str) -> Self {
        Self {
            id,
            key: "",
            name,
            short_name: name,
            units: "",
            default_normalized: 0.5,
            step_count: 0,
            flags: ParameterFlags::DEFAULT,
        }
    }

    pub const fn with_key(mut self, key: &'static str) -> Self {
        self.key = key;
        self
    }

    pub const fn with_short_name(mut self, short_name: &'static str) -> Self {
        self.short_name = short_name;
        self
    }

    pub const fn with_units(mut self, units: &'static str) -> Self {
        self.units = units;
        self
    }

    pub const fn with_default(mut self, default: ParameterValue) -> Self {
        self.default_normalized = default;
        self
    }

    /// Set the step count (0 = continuous).
    pub const fn with_steps(mut self, steps: i32) -> Self {
        self.step_count = steps;
        self
    }

    pub const fn with_flags(mut self, flags: ParameterFlags) -> Self {
        self.flags = flags;
        self
    }
}
