//! Audio buffer handed to [`AudioProcessor::process`](crate::AudioProcessor::process).
//!
//! [`Buffer`] borrows the host's channel slices for the duration of one
//! processing call. Storage is a fixed-size array of optional slices sized by
//! [`MAX_CHANNELS`], so building a buffer never touches the heap.
//!
//! ```ignore
//! fn process(&mut self, buffer: &mut Buffer, _context: &ProcessContext) {
//!     buffer.copy_to_output();
//!     buffer.apply_output_gain(self.level);
//! }
//! ```

use crate::sample::Sample;
use crate::types::MAX_CHANNELS;

// =============================================================================
// Buffer
// =============================================================================

/// Main audio I/O for one processing block.
///
/// `S` defaults to `f32`; `Buffer<f64>` is used for double precision
/// processing. Channel 0 is left and channel 1 is right for stereo layouts.
pub struct Buffer<'a, S: Sample = f32> {
    inputs: [Option<&'a [S]>; MAX_CHANNELS],
    // &mut is not Copy, so this one is built with array::from_fn
    outputs: [Option<&'a mut [S]>; MAX_CHANNELS],
    num_input_channels: usize,
    num_output_channels: usize,
    num_samples: usize,
}

impl<'a, S: Sample> Buffer<'a, S> {
    /// Wrap host channel slices.
    ///
    /// Called by the host adapter. Channels beyond [`MAX_CHANNELS`] are
    /// ignored. Every slice must hold at least `num_samples` samples.
    #[inline]
    pub fn new(
        inputs: impl IntoIterator<Item = &'a [S]>,
        outputs: impl IntoIterator<Item = &'a mut [S]>,
        num_samples: usize,
    ) -> Self {
        let mut input_arr: [Option<&'a [S]>; MAX_CHANNELS] = [None; MAX_CHANNELS];
        let mut num_input_channels = 0;
        for (i, slice) in inputs.into_iter().take(MAX_CHANNELS).enumerate() {
            input_arr[i] = Some(slice);
            num_input_channels = i + 1;
        }

        let mut output_arr: [Option<&'a mut [S]>; MAX_CHANNELS] = std::array::from_fn(|_| None);
        let mut num_output_channels = 0;
        for (i, slice) in outputs.into_iter().take(MAX_CHANNELS).enumerate() {
            output_arr[i] = Some(slice);
            num_output_channels = i + 1;
        }

        Self {
            inputs: input_arr,
            outputs: output_arr,
            num_input_channels,
            num_output_channels,
            num_samples,
        }
    }

    // =========================================================================
    // Info
    // =========================================================================

    /// Number of samples in this block.
    #[inline]
    pub fn num_samples(&self) -> usize {
        self.num_samples
    }

    #[inline]
    pub fn num_input_channels(&self) -> usize {
        self.num_input_channels
    }

    #[inline]
    pub fn num_output_channels(&self) -> usize {
        self.num_output_channels
    }

    /// Reported channel count: the wider of the two sides.
    #[inline]
    pub fn num_channels(&self) -> usize {
        self.num_input_channels.max(self.num_output_channels)
    }

    /// True for 2 in / 2 out.
    #[inline]
    pub fn is_stereo(&self) -> bool {
        self.num_input_channels == 2 && self.num_output_channels == 2
    }

    // =========================================================================
    // Channel Access
    // =========================================================================

    /// Input channel by index, or an empty slice if it doesn't exist.
    #[inline]
    pub fn input(&self, channel: usize) -> &[S] {
        self.inputs
            .get(channel)
            .and_then(|opt| opt.as_ref())
            .map(|ch| &ch[..self.num_samples])
            .unwrap_or(&[])
    }

    /// Output channel by index, or `None` if it doesn't exist.
    #[inline]
    pub fn output(&mut self, channel: usize) -> Option<&mut [S]> {
        let n = self.num_samples;
        self.outputs
            .get_mut(channel)
            .and_then(|opt| opt.as_mut())
            .map(|ch| &mut ch[..n])
    }

    #[inline]
    pub fn inputs(&self) -> impl Iterator<Item = &[S]> + '_ {
        let n = self.num_samples;
        self.inputs[..self.num_input_channels]
            .iter()
            .filter_map(move |opt| opt.as_ref().map(|ch| &ch[..n]))
    }

    #[inline]
    pub fn outputs_mut(&mut self) -> impl Iterator<Item = &mut [S]> + use<'_, 'a, S> {
        let n = self.num_samples;
        self.outputs[..self.num_output_channels]
            .iter_mut()
            .filter_map(move |opt| opt.as_mut().map(|ch| &mut ch[..n]))
    }

    // =========================================================================
    // Bulk Operations
    // =========================================================================

    /// Copy every input channel to the matching output channel.
    pub fn copy_to_output(&mut self) {
        let pairs = self.num_input_channels.min(self.num_output_channels);
        let n = self.num_samples;
        for ch in 0..pairs {
            if let (Some(input), Some(output)) = (self.inputs[ch].as_ref(), self.outputs[ch].as_mut()) {
                output[..n].copy_from_slice(&input[..n]);
            }
        }
    }

    /// Silence every output channel.
    pub fn clear_outputs(&mut self) {
        for output in self.outputs_mut() {
            output.fill(S::ZERO);
        }
    }

    /// Multiply every output sample by `gain`.
    pub fn apply_output_gain(&mut self, gain: S) {
        for output in self.outputs_mut() {
            for sample in output.iter_mut() {
                *sample = *sample * gain;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_channels_and_samples() {
        let left = [0.5f32; 8];
        let right = [0.25f32; 8];
        let mut out_l = [0.0f32; 8];
        let mut out_r = [0.0f32; 8];
        let buffer = Buffer::new(
            [&left[..], &right[..]],
            [&mut out_l[..], &mut out_r[..]],
            4,
        );

        assert_eq!(buffer.num_samples(), 4);
        assert_eq!(buffer.num_channels(), 2);
        assert!(buffer.is_stereo());
        assert_eq!(buffer.input(0).len(), 4);
        assert!(buffer.input(5).is_empty());
    }

    #[test]
    fn copy_then_gain() {
        let left = [1.0f32, 2.0, 3.0, 4.0];
        let right = [-1.0f32; 4];
        let mut out_l = [0.0f32; 4];
        let mut out_r = [0.0f32; 4];
        {
            let mut buffer = Buffer::new(
                [&left[..], &right[..]],
                [&mut out_l[..], &mut out_r[..]],
                4,
            );
            buffer.copy_to_output();
            buffer.apply_output_gain(0.5);
        }
        assert_eq!(out_l, [0.5, 1.0, 1.5, 2.0]);
        assert_eq!(out_r, [-0.5; 4]);
    }

    #[test]
    fn clear_only_touches_active_samples() {
        let input = [1.0f64; 6];
        let mut output = [9.0f64; 6];
        {
            let mut buffer = Buffer::new([&input[..]], [&mut output[..]], 3);
            buffer.clear_outputs();
        }
        assert_eq!(output, [0.0, 0.0, 0.0, 9.0, 9.0, 9.0]);
    }

    #[test]
    fn missing_output_is_none() {
        let input = [0.0f32; 2];
        let mut output = [0.0f32; 2];
        let mut buffer = Buffer::new([&input[..]], [&mut output[..]], 2);
        assert!(buffer.output(0).is_some());
        assert!(buffer.output(1).is_none());
    }
}
