//! Transport and process context for audio plugins.
//!
//! [`ProcessContext`] bundles the sample rate, block length and host
//! [`Transport`] for one `process()` call.

// =============================================================================
// Transport
// =============================================================================

/// Host transport and timing information.
///
/// `None` when the host doesn't report it.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Transport {
    /// Continuous time in samples since processing started.
    ///
    /// Never jumps during cycle playback; it always increments monotonically.
    pub continuous_time_samples: Option<i64>,
}

impl Transport {
    /// Monotonic position of sample `offset` within the current block.
    ///
    /// `None` when the host doesn't provide continuous time.
    #[inline]
    pub fn continuous_time_at(&self, offset: u32) -> Option<u64> {
        self.continuous_time_samples
            .map(|start| start.max(0) as u64 + offset as u64)
    }
}

// =============================================================================
// ProcessContext
// =============================================================================

/// Processing context for a single `process()` call.
///
/// `Copy` and only meaningful for the call it was passed to.
#[derive(Debug, Clone, Copy)]
pub struct ProcessContext {
    /// Current sample rate in Hz.
    pub sample_rate: f64,

    /// Number of samples in this block, same as
    /// [`Buffer::num_samples()`](crate::Buffer::num_samples).
    pub num_samples: usize,

    pub transport: Transport,
}

impl ProcessContext {
    /// Called by the host adapter, not by plugin code.
    #[inline]
    pub fn new(sample_rate: f64, num_samples: usize, transport: Transport) -> Self {
        Self {
            sample_rate,
            num_samples,
            transport,
        }
    }

    /// Context for hosts that don't report transport.
    #[inline]
    pub fn with_empty_transport(sample_rate: f64, num_samples: usize) -> Self {
        Self {
            sample_rate,
            num_samples,
            transport: Transport::default(),
        }
    }
}

impl Default for ProcessContext {
    fn default() -> Self {
        Self {
            sample_rate: 44100.0,
            num_samples: 0,
            transport: Transport::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn continuous_time_adds_offset() {
        let transport = Transport {
            continuous_time_samples: Some(1024),
        };
        assert_eq!(transport.continuous_time_at(16), Some(1040));
        assert_eq!(Transport::default().continuous_time_at(16), None);
    }
}
