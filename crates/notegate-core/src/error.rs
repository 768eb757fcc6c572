//! Error types for NoteGate plugins and hosts.
//!
//! Errors only cross non-real-time boundaries (setup, state I/O, host
//! misuse). The audio path itself is infallible.

use std::fmt;

/// Errors that can occur while configuring or driving a plugin.
#[derive(Debug, Clone, PartialEq)]
pub enum PluginError {
    /// Plugin preparation failed.
    InitializationFailed(String),
    /// The requested bus layout is not supported.
    UnsupportedLayout(String),
    /// Processing was requested before `setup_processing()`.
    NotPrepared,
    /// Audio processing was called with unusable arguments.
    ProcessingError(String),
    /// State serialization/deserialization error.
    StateError(String),
}

impl fmt::Display for PluginError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Self::UnsupportedLayout(msg) => write!(f, "Unsupported layout: {}", msg),
            Self::NotPrepared => write!(f, "Plugin is not prepared for processing"),
            Self::ProcessingError(msg) => write!(f, "Processing error: {}", msg),
            Self::StateError(msg) => write!(f, "State error: {}", msg),
        }
    }
}

impl std::error::Error for PluginError {}

/// Result type for NoteGate operations.
pub type PluginResult<T> = Result<T, PluginError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_message() {
        let err = PluginError::StateError("truncated entry".to_string());
        assert_eq!(err.to_string(), "State error: truncated entry");
        assert_eq!(
            PluginError::NotPrepared.to_string(),
            "Plugin is not prepared for processing"
        );
    }
}
