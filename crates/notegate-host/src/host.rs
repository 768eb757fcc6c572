//! Generic in-process host wrapping any [`Plugin`] implementation.
//!
//! ```text
//! Host audio callback
//!        ↓
//! PluginHost<P> (this wrapper)
//!        ↓
//! Plugin / AudioProcessor
//! ```

use log::{debug, error, info, warn};

use notegate_core::{
    AudioProcessor, AudioSetup, Buffer, BusLayout, FullAudioSetup, HasParameters, MidiBuffer,
    MidiEvent, NoConfig, ParameterId, ParameterStore, ParameterValue, Parameters, Plugin,
    PluginConfig, PluginError, PluginResult, ProcessContext, ProcessorConfig, Transport,
    MAX_CHANNELS, MAX_MIDI_EVENTS,
};

/// Parameter changes that can be queued between two blocks.
pub const PARAMETER_QUEUE_CAPACITY: usize = 64;

// =============================================================================
// Process Setup
// =============================================================================

/// Sample format the host delivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Precision {
    /// 32-bit float, delivered through [`PluginHost::process`].
    #[default]
    Single,
    /// 64-bit float, delivered through [`PluginHost::process_f64`].
    Double,
}

/// Audio configuration handed to [`PluginHost::setup_processing`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessSetup {
    pub sample_rate: f64,
    /// Largest block the host will ever pass to `process()`.
    pub max_block_size: usize,
    pub precision: Precision,
}

impl ProcessSetup {
    /// Single precision setup.
    pub fn new(sample_rate: f64, max_block_size: usize) -> Self {
        Self {
            sample_rate,
            max_block_size,
            precision: Precision::Single,
        }
    }

    pub fn with_precision(mut self, precision: Precision) -> Self {
        self.precision = precision;
        self
    }

    fn validate(&self) -> PluginResult<()> {
        if !self.sample_rate.is_finite() || self.sample_rate <= 0.0 {
            return Err(PluginError::InitializationFailed(format!(
                "invalid sample rate {}",
                self.sample_rate
            )));
        }
        if self.max_block_size == 0 {
            return Err(PluginError::InitializationFailed(
                "max block size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Config Building
// =============================================================================

/// Builds a plugin's [`ProcessorConfig`] from the host setup.
///
/// `pub(crate)` to keep the set of config types closed: every standard
/// config (NoConfig, AudioSetup, FullAudioSetup) has an implementation here.
pub(crate) trait BuildConfig: ProcessorConfig {
    fn build<P: Plugin>(setup: &ProcessSetup, plugin: &P, layout: &BusLayout) -> Self;
}

impl BuildConfig for NoConfig {
    fn build<P: Plugin>(_setup: &ProcessSetup, _plugin: &P, _layout: &BusLayout) -> Self {
        NoConfig
    }
}

impl BuildConfig for AudioSetup {
    fn build<P: Plugin>(setup: &ProcessSetup, _plugin: &P, _layout: &BusLayout) -> Self {
        AudioSetup {
            sample_rate: setup.sample_rate,
            max_buffer_size: setup.max_block_size,
        }
    }
}

impl BuildConfig for FullAudioSetup {
    fn build<P: Plugin>(setup: &ProcessSetup, _plugin: &P, layout: &BusLayout) -> Self {
        FullAudioSetup {
            sample_rate: setup.sample_rate,
            max_buffer_size: setup.max_block_size,
            layout: layout.clone(),
        }
    }
}

// =============================================================================
// Scratch Storage
// =============================================================================

/// Pre-allocated sample storage for the audio path.
///
/// Host channels are processed in place, so inputs are copied aside first
/// and the host slices become the outputs.
struct ScratchBuffers {
    input_f32: Vec<Vec<f32>>,
    input_f64: Vec<Vec<f64>>,
    /// f64 -> f32 conversion for processors without native double precision.
    conversion_input_f32: Vec<Vec<f32>>,
    conversion_output_f32: Vec<Vec<f32>>,
}

impl ScratchBuffers {
    fn new() -> Self {
        Self {
            input_f32: Vec::new(),
            input_f64: Vec::new(),
            conversion_input_f32: Vec::new(),
            conversion_output_f32: Vec::new(),
        }
    }

    fn allocate(layout: &BusLayout, setup: &ProcessSetup, native_f64: bool) -> Self {
        let inputs = layout.main_input_channels as usize;
        let outputs = layout.main_output_channels as usize;
        let frames = setup.max_block_size;
        let channels = |count: usize| -> Vec<Vec<f32>> { (0..count).map(|_| vec![0.0; frames]).collect() };

        let mut scratch = Self::new();
        match setup.precision {
            Precision::Single => scratch.input_f32 = channels(inputs),
            Precision::Double if native_f64 => {
                scratch.input_f64 = (0..inputs).map(|_| vec![0.0; frames]).collect();
            }
            Precision::Double => {
                scratch.conversion_input_f32 = channels(inputs);
                scratch.conversion_output_f32 = channels(outputs);
            }
        }
        scratch
    }
}

// =============================================================================
// Plugin State Machine
// =============================================================================

/// Lifecycle state.
///
/// - **Unprepared**: plugin exists, audio configuration unknown
/// - **Prepared**: processor exists with a valid configuration
enum PluginState<P: Plugin> {
    Unprepared {
        plugin: P,
        /// State received before prepare (deferred loading)
        pending_state: Option<Vec<u8>>,
    },
    Prepared {
        processor: P::Processor,
        setup: ProcessSetup,
    },
}

// =============================================================================
// PluginHost
// =============================================================================

/// Generic host driving a [`Plugin`] through its two-phase lifecycle.
///
/// ```text
/// PluginHost::new()
///     ↓ creates Plugin::default()
/// PluginState::Unprepared { plugin }
///     ↓ setup_processing() calls plugin.prepare(config)
/// PluginState::Prepared { processor }
///     ↓ sample rate change: processor.unprepare(), then prepare again
/// PluginState::Prepared { processor }
///     ↓ release()
/// PluginState::Unprepared { plugin }
/// ```
///
/// `process()` must be called from one thread at a time; `&mut self`
/// enforces that.
pub struct PluginHost<P: Plugin> {
    state: PluginState<P>,
    config: &'static PluginConfig,
    /// Negotiated layout (the plugin's declared layout until renegotiated)
    layout: BusLayout,
    input_bus_count: usize,
    output_bus_count: usize,
    /// Samples processed since the last prepare
    sample_clock: u64,
    /// Boxed to keep the 1024-event arrays off the stack
    midi_input: Box<MidiBuffer>,
    midi_output: Box<MidiBuffer>,
    scratch: ScratchBuffers,
    parameter_changes: Vec<(ParameterId, ParameterValue)>,
}

// Allow private_bounds: BuildConfig is sealed. Plugins use the standard
// ProcessorConfig types, which all implement it.
#[allow(private_bounds)]
impl<P: Plugin> PluginHost<P>
where
    P::Config: BuildConfig,
{
    /// Create a host in the Unprepared state with a default plugin instance.
    pub fn new(config: &'static PluginConfig) -> Self {
        let plugin = P::default();
        let layout = BusLayout::from_plugin(&plugin);
        let input_bus_count = plugin.input_bus_count();
        let output_bus_count = plugin.output_bus_count();

        Self {
            state: PluginState::Unprepared {
                plugin,
                pending_state: None,
            },
            config,
            layout,
            input_bus_count,
            output_bus_count,
            sample_clock: 0,
            midi_input: Box::new(MidiBuffer::new()),
            midi_output: Box::new(MidiBuffer::new()),
            scratch: ScratchBuffers::new(),
            parameter_changes: Vec::with_capacity(PARAMETER_QUEUE_CAPACITY),
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn config(&self) -> &'static PluginConfig {
        self.config
    }

    pub fn is_prepared(&self) -> bool {
        matches!(self.state, PluginState::Prepared { .. })
    }

    /// Current bus layout.
    pub fn layout(&self) -> &BusLayout {
        &self.layout
    }

    /// Host-facing parameter view, available in both states.
    pub fn parameters(&self) -> &P::Parameters {
        match &self.state {
            PluginState::Unprepared { plugin, .. } => plugin.parameters(),
            PluginState::Prepared { processor, .. } => processor.parameters(),
        }
    }

    /// The prepared processor, e.g. for inspection in tests.
    pub fn processor(&self) -> Option<&P::Processor> {
        match &self.state {
            PluginState::Prepared { processor, .. } => Some(processor),
            PluginState::Unprepared { .. } => None,
        }
    }

    /// The unprepared plugin.
    pub fn plugin(&self) -> Option<&P> {
        match &self.state {
            PluginState::Unprepared { plugin, .. } => Some(plugin),
            PluginState::Prepared { .. } => None,
        }
    }

    pub fn latency_samples(&self) -> u32 {
        self.processor().map(|p| p.latency_samples()).unwrap_or(0)
    }

    pub fn tail_samples(&self) -> u32 {
        self.processor().map(|p| p.tail_samples()).unwrap_or(0)
    }

    // =========================================================================
    // Layout Negotiation
    // =========================================================================

    /// Negotiate the bus layout. Channel counts are given per bus.
    ///
    /// Returns `false` (and keeps the current layout) when the bus count
    /// differs from the plugin's declaration, a bus exceeds
    /// [`MAX_CHANNELS`], or the plugin rejects the layout. Renegotiating
    /// while prepared only succeeds for the current layout.
    pub fn set_bus_arrangements(&mut self, inputs: &[u32], outputs: &[u32]) -> bool {
        match self.negotiate(inputs, outputs) {
            Ok(layout) => {
                self.layout = layout;
                true
            }
            Err(err) => {
                if self.is_prepared() {
                    warn!("{}; release() first", err);
                } else {
                    debug!("{}", err);
                }
                false
            }
        }
    }

    /// Check a requested arrangement without applying it.
    fn negotiate(&self, inputs: &[u32], outputs: &[u32]) -> PluginResult<BusLayout> {
        if inputs.len() != self.input_bus_count || outputs.len() != self.output_bus_count {
            return Err(PluginError::UnsupportedLayout(format!(
                "{} in / {} out buses, plugin declares {} / {}",
                inputs.len(),
                outputs.len(),
                self.input_bus_count,
                self.output_bus_count
            )));
        }

        if inputs
            .iter()
            .chain(outputs)
            .any(|&channels| channels as usize > MAX_CHANNELS)
        {
            return Err(PluginError::UnsupportedLayout(format!(
                "more than {} channels on a bus",
                MAX_CHANNELS
            )));
        }

        let requested = BusLayout {
            main_input_channels: inputs.first().copied().unwrap_or(0),
            main_output_channels: outputs.first().copied().unwrap_or(0),
            aux_input_count: inputs.len().saturating_sub(1),
            aux_output_count: outputs.len().saturating_sub(1),
        };

        match &self.state {
            PluginState::Unprepared { plugin, .. } if !plugin.supports_layout(&requested) => Err(
                PluginError::UnsupportedLayout(format!("plugin rejected {:?}", requested)),
            ),
            PluginState::Prepared { .. } if requested != self.layout => {
                Err(PluginError::UnsupportedLayout(format!(
                    "cannot change to {:?} while prepared",
                    requested
                )))
            }
            _ => Ok(requested),
        }
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Prepare the plugin for processing.
    ///
    /// From Unprepared this builds the processor and applies any state set
    /// before. When already prepared, a changed setup unprepares and
    /// prepares again; an identical setup is a no-op.
    pub fn setup_processing(&mut self, setup: &ProcessSetup) -> PluginResult<()> {
        if let Err(err) = setup.validate() {
            error!("Rejected process setup: {}", err);
            return Err(err);
        }

        if let PluginState::Prepared { setup: current, .. } = &self.state {
            if current == setup {
                return Ok(());
            }
        }

        let previous = std::mem::replace(
            &mut self.state,
            PluginState::Unprepared {
                plugin: P::default(),
                pending_state: None,
            },
        );

        let (plugin, pending_state) = match previous {
            PluginState::Unprepared {
                plugin,
                pending_state,
            } => (plugin, pending_state),
            PluginState::Prepared { processor, .. } => {
                info!("{}: setup changed, preparing again", self.config.name);
                (processor.unprepare(), None)
            }
        };

        let config = P::Config::build(setup, &plugin, &self.layout);
        let mut processor = plugin.prepare(config);

        if let Some(data) = pending_state {
            if let Err(err) = processor.load_state(&data) {
                warn!("{}: ignoring saved state: {}", self.config.name, err);
            }
        }

        self.scratch =
            ScratchBuffers::allocate(&self.layout, setup, processor.supports_double_precision());
        self.sample_clock = 0;
        self.state = PluginState::Prepared {
            processor,
            setup: *setup,
        };

        info!(
            "{}: prepared at {} Hz, max block {} ({:?} precision)",
            self.config.name, setup.sample_rate, setup.max_block_size, setup.precision
        );
        Ok(())
    }

    /// Start or stop processing. Ignored while unprepared.
    pub fn set_active(&mut self, active: bool) {
        if let PluginState::Prepared { processor, .. } = &mut self.state {
            processor.set_active(active);
        }
    }

    /// Return to the unprepared state, keeping parameters.
    pub fn release(&mut self) {
        if !self.is_prepared() {
            return;
        }

        let previous = std::mem::replace(
            &mut self.state,
            PluginState::Unprepared {
                plugin: P::default(),
                pending_state: None,
            },
        );
        if let PluginState::Prepared { processor, .. } = previous {
            self.state = PluginState::Unprepared {
                plugin: processor.unprepare(),
                pending_state: None,
            };
            info!("{}: released", self.config.name);
        }
    }

    // =========================================================================
    // State
    // =========================================================================

    /// Serialize plugin state.
    ///
    /// While unprepared this returns state still waiting to be applied, or
    /// the plugin's current parameters.
    pub fn get_state(&self) -> PluginResult<Vec<u8>> {
        match &self.state {
            PluginState::Unprepared {
                plugin,
                pending_state,
            } => Ok(pending_state
                .clone()
                .unwrap_or_else(|| plugin.parameters().save_state())),
            PluginState::Prepared { processor, .. } => processor.save_state(),
        }
    }

    /// Restore plugin state.
    ///
    /// While unprepared the blob is stored and applied by the next
    /// `setup_processing()`. A blob the processor rejects is logged and
    /// leaves the current values in place. An empty blob is a no-op.
    pub fn set_state(&mut self, data: &[u8]) -> PluginResult<()> {
        if data.is_empty() {
            return Ok(());
        }

        match &mut self.state {
            PluginState::Unprepared { pending_state, .. } => {
                *pending_state = Some(data.to_vec());
                Ok(())
            }
            PluginState::Prepared { processor, .. } => processor.load_state(data).inspect_err(|err| {
                warn!("{}: ignoring state: {}", self.config.name, err);
            }),
        }
    }

    /// Queue a host parameter change, applied at the start of the next block.
    ///
    /// Returns `false` for an unknown id or when the queue is full.
    pub fn queue_parameter_change(&mut self, id: ParameterId, normalized: ParameterValue) -> bool {
        if ParameterStore::info_by_id(self.parameters(), id).is_none() {
            debug!("Ignoring change for unknown parameter id {:#010x}", id);
            return false;
        }
        if self.parameter_changes.len() >= PARAMETER_QUEUE_CAPACITY {
            warn!("Parameter change queue full, dropping change for id {:#010x}", id);
            return false;
        }
        self.parameter_changes.push((id, normalized));
        true
    }

    // =========================================================================
    // Processing
    // =========================================================================

    /// Process one single precision block in place.
    ///
    /// `channels` holds one slice per main output channel, all the same
    /// length. Returns the MIDI the plugin emitted for this block.
    pub fn process(
        &mut self,
        channels: &mut [&mut [f32]],
        events: &[MidiEvent],
    ) -> PluginResult<&[MidiEvent]> {
        let num_samples =
            self.check_block(channels.iter().map(|c| c.len()), channels.len(), Precision::Single)?;
        if num_samples == 0 {
            return Ok(&[]);
        }
        let context = self.begin_block(num_samples, events)?;

        let Self { state, scratch, .. } = self;
        let PluginState::Prepared { processor, .. } = state else {
            return Err(PluginError::NotPrepared);
        };

        for (input, channel) in scratch.input_f32.iter_mut().zip(channels.iter()) {
            input[..num_samples].copy_from_slice(&channel[..num_samples]);
        }
        {
            let mut buffer = Buffer::new(
                scratch.input_f32.iter().map(|c| &c[..num_samples]),
                channels.iter_mut().map(|c| &mut c[..num_samples]),
                num_samples,
            );
            processor.process(&mut buffer, &context);
        }

        self.sample_clock += num_samples as u64;
        Ok(self.midi_output.as_slice())
    }

    /// Process one double precision block in place.
    ///
    /// Processors without native f64 support run on pre-allocated f32
    /// conversion buffers.
    pub fn process_f64(
        &mut self,
        channels: &mut [&mut [f64]],
        events: &[MidiEvent],
    ) -> PluginResult<&[MidiEvent]> {
        let num_samples =
            self.check_block(channels.iter().map(|c| c.len()), channels.len(), Precision::Double)?;
        if num_samples == 0 {
            return Ok(&[]);
        }
        let context = self.begin_block(num_samples, events)?;

        let Self { state, scratch, .. } = self;
        let PluginState::Prepared { processor, .. } = state else {
            return Err(PluginError::NotPrepared);
        };

        if processor.supports_double_precision() {
            for (input, channel) in scratch.input_f64.iter_mut().zip(channels.iter()) {
                input[..num_samples].copy_from_slice(&channel[..num_samples]);
            }
            let mut buffer = Buffer::new(
                scratch.input_f64.iter().map(|c| &c[..num_samples]),
                channels.iter_mut().map(|c| &mut c[..num_samples]),
                num_samples,
            );
            processor.process_f64(&mut buffer, &context);
        } else {
            for (input, channel) in scratch.conversion_input_f32.iter_mut().zip(channels.iter()) {
                for (dst, src) in input[..num_samples].iter_mut().zip(channel.iter()) {
                    *dst = *src as f32;
                }
            }
            {
                let mut buffer = Buffer::new(
                    scratch.conversion_input_f32.iter().map(|c| &c[..num_samples]),
                    scratch
                        .conversion_output_f32
                        .iter_mut()
                        .map(|c| &mut c[..num_samples]),
                    num_samples,
                );
                processor.process(&mut buffer, &context);
            }
            for (channel, output) in channels.iter_mut().zip(scratch.conversion_output_f32.iter()) {
                for (dst, src) in channel[..num_samples].iter_mut().zip(output.iter()) {
                    *dst = *src as f64;
                }
            }
        }

        self.sample_clock += num_samples as u64;
        Ok(self.midi_output.as_slice())
    }

    /// Validate a block against the prepared setup and layout.
    ///
    /// Returns the block length.
    fn check_block(
        &self,
        mut lengths: impl Iterator<Item = usize>,
        num_channels: usize,
        precision: Precision,
    ) -> PluginResult<usize> {
        let PluginState::Prepared { setup, .. } = &self.state else {
            return Err(PluginError::NotPrepared);
        };

        if setup.precision != precision {
            return Err(PluginError::ProcessingError(format!(
                "host was set up for {:?} precision",
                setup.precision
            )));
        }

        let expected_channels = self.layout.main_output_channels as usize;
        if num_channels != expected_channels {
            return Err(PluginError::ProcessingError(format!(
                "expected {} channels, got {}",
                expected_channels, num_channels
            )));
        }

        let num_samples = lengths.next().unwrap_or(0);
        if lengths.any(|len| len != num_samples) {
            return Err(PluginError::ProcessingError(
                "channel slices differ in length".to_string(),
            ));
        }

        if num_samples > setup.max_block_size {
            return Err(PluginError::ProcessingError(format!(
                "block of {} samples exceeds max block size {}",
                num_samples, setup.max_block_size
            )));
        }

        Ok(num_samples)
    }

    /// Apply queued parameter changes, run the MIDI stage and build the
    /// process context for the block.
    fn begin_block(
        &mut self,
        num_samples: usize,
        events: &[MidiEvent],
    ) -> PluginResult<ProcessContext> {
        let Self {
            state,
            midi_input,
            midi_output,
            parameter_changes,
            sample_clock,
            ..
        } = self;
        let PluginState::Prepared { processor, setup } = state else {
            return Err(PluginError::NotPrepared);
        };

        // 1. Parameter changes from the host
        for (id, value) in parameter_changes.drain(..) {
            ParameterStore::set_normalized(processor.parameters(), id, value);
        }

        // 2. MIDI input
        midi_input.clear();
        for event in events {
            midi_input.push(*event);
        }
        if midi_input.has_overflowed() {
            warn!(
                "MIDI input buffer overflow: {} events max, some events were dropped",
                MAX_MIDI_EVENTS
            );
        }

        // 3. Plugin MIDI stage
        midi_output.clear();
        processor.process_midi(midi_input.as_slice(), midi_output);
        if midi_output.has_overflowed() {
            warn!(
                "MIDI output buffer overflow: {} events reached capacity, some events were dropped",
                midi_output.len()
            );
        }

        let transport = Transport {
            continuous_time_samples: Some(*sample_clock as i64),
        };
        Ok(ProcessContext::new(setup.sample_rate, num_samples, transport))
    }
}
