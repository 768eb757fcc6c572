//! Common types used throughout the framework.

/// Maximum number of audio channels per bus.
///
/// Buffers store channel slices in fixed arrays of this size so building one
/// inside the audio callback never allocates. Layouts declaring more channels
/// are rejected during bus negotiation.
pub const MAX_CHANNELS: usize = 32;

/// Parameter identifier (FNV-1a hash of the string id).
pub type ParameterId = u32;

/// Parameter value (normalized 0.0 to 1.0).
pub type ParameterValue = f64;
