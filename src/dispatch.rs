//! Block dispatcher - turns a per-sample stream into per-block callbacks.
//!
//! Timing model for frame divider D and buffer size N:
//!
//! ```text
//!   tick:     1 2 3 4 5 6 7 8 ...        (D = 2, N = 2)
//!   capture:    ^   ^   ^   ^            every D-th tick
//!   process:        *       *            every N-th capture
//! ```
//!
//! Exactly one callback runs per N·D ticks. Each tick returns one output
//! frame: the sample of the most recent block at the current buffer position,
//! held between captures. Because the write position and the playback
//! position are the same index, every sample a processor writes is emitted
//! exactly once.
//!
//! Reconfiguration (staged from another thread, requested by the processor,
//! or passed to `configure` while running) waits for a boundary: the tick at
//! which no frame of the next block has been captured yet.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use crate::{
    block::{Block, Frame, Panel},
    config::{ConfigStaging, DispatchConfig, UnderrunPolicy},
    diagnostics::{Diagnostic, DiagnosticSender, DisplayText},
    error::ConfigurationError,
    processor::Processor,
    NUM_CHANNELS,
};

const SILENT_FRAME: Frame = [0.0; NUM_CHANNELS];

/// Dispatcher lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    /// Nothing configured; ticks return silence
    Uninitialized,
    /// Configured but no tick seen yet
    Configured,
    /// Ticking
    Running,
}

/// Counters for host display
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Ticks that carried an input frame
    pub ticks: u64,
    /// Completed blocks
    pub cycles: u64,
    /// Blocks whose processor failed
    pub faults: u64,
    /// Contiguous runs of missing input
    pub underruns: u64,
    /// Frame slots with no input
    pub missing_frames: u64,
    /// Diagnostics lost to a full queue
    pub dropped_diagnostics: u64,
}

/// Fixed-rate block dispatcher
///
/// A panicking processor is caught and reported as `CallbackFault`, but the
/// process panic hook still runs on the ticking thread first. Realtime hosts
/// should install a hook that stays quiet on that thread.
pub struct Dispatcher {
    state: DispatchState,
    processor: Option<Box<dyn Processor>>,
    config: DispatchConfig,
    /// Applied at the next boundary
    pending: Option<DispatchConfig>,
    staging: Option<ConfigStaging>,
    block: Block,
    panel: Panel,
    sample_rate: f32,
    /// Ticks since the last capture
    frame: u32,
    /// Capture and playback position inside the block
    index: usize,
    last_output: Frame,
    in_underrun: bool,
    diagnostics: DiagnosticSender,
    stats: DispatchStats,
}

impl Dispatcher {
    pub fn new(sample_rate: f32, diagnostics: DiagnosticSender) -> Self {
        let config = DispatchConfig::default();
        Self {
            state: DispatchState::Uninitialized,
            processor: None,
            config,
            pending: None,
            staging: None,
            block: Block::new(&config, sample_rate),
            panel: Panel::default(),
            sample_rate,
            frame: 0,
            index: 0,
            last_output: SILENT_FRAME,
            in_underrun: false,
            diagnostics,
            stats: DispatchStats::default(),
        }
    }

    /// Accept configuration staged through a `ConfigHandle`
    pub fn with_staging(mut self, staging: ConfigStaging) -> Self {
        self.staging = Some(staging);
        self
    }

    pub fn state(&self) -> DispatchState {
        self.state
    }

    /// Configuration currently in effect
    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    pub fn processor_name(&self) -> Option<&str> {
        self.processor.as_deref().map(|p| p.name())
    }

    pub fn panel(&self) -> &Panel {
        &self.panel
    }

    /// Host-side knob move, clamped to 0-1. NaN is ignored.
    pub fn set_knob(&mut self, index: usize, value: f32) {
        if !value.is_nan() {
            self.panel.knobs[index] = value.clamp(0.0, 1.0);
        }
    }

    pub fn set_switch(&mut self, index: usize, pressed: bool) {
        self.panel.switches[index] = pressed;
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Record a new hardware rate. The block picks it up at its next call.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
    }

    pub fn stats(&self) -> DispatchStats {
        DispatchStats {
            dropped_diagnostics: self.diagnostics.dropped(),
            ..self.stats
        }
    }

    /// Install a processor and adopt the configuration it asks for.
    ///
    /// Any running processor is dropped first, as if `reset` had been called.
    pub fn load<P: Processor + 'static>(&mut self, processor: P) -> Result<(), ConfigurationError> {
        let config = processor.config();
        config.validate()?;

        if self.state != DispatchState::Uninitialized {
            self.reset();
        }
        log::info!(
            "loading {} (frame divider {}, buffer size {})",
            processor.name(),
            config.frame_divider,
            config.buffer_size
        );
        self.processor = Some(Box::new(processor));
        self.configure(config)
    }

    /// Validate and apply a configuration.
    ///
    /// Takes effect immediately unless the dispatcher is running, in which
    /// case it is held until the next block boundary.
    pub fn configure(&mut self, config: DispatchConfig) -> Result<(), ConfigurationError> {
        config.validate()?;
        match self.state {
            DispatchState::Running => {
                log::debug!("staging {config:?} for next block boundary");
                self.pending = Some(config);
            }
            DispatchState::Uninitialized | DispatchState::Configured => {
                self.apply_config(config);
                self.state = DispatchState::Configured;
            }
        }
        Ok(())
    }

    /// Drop the processor and return to `Uninitialized`.
    ///
    /// Outputs and lights are zeroed so nothing stale is held.
    pub fn reset(&mut self) {
        if let Some(name) = self.processor_name() {
            log::info!("unloading {name}");
        }
        self.processor = None;
        self.state = DispatchState::Uninitialized;
        self.pending = None;
        self.block.clear();
        self.apply_config(DispatchConfig::default());
        self.panel.clear_lights();
        self.last_output = SILENT_FRAME;
        self.in_underrun = false;
        self.stats = DispatchStats::default();
    }

    /// Feed one input frame at the hardware rate and get one output frame.
    pub fn tick(&mut self, input: &Frame) -> Frame {
        match self.state {
            DispatchState::Uninitialized => return SILENT_FRAME,
            DispatchState::Configured => self.state = DispatchState::Running,
            DispatchState::Running => {}
        }
        self.stats.ticks += 1;
        self.in_underrun = false;

        if self.at_boundary() {
            self.apply_pending();
        }

        self.frame += 1;
        if self.frame >= self.config.frame_divider {
            self.frame = 0;
            self.block.capture(self.index, input);
            self.index += 1;
            if self.index >= self.config.buffer_size {
                self.index = 0;
                self.run_cycle();
            }
        }

        self.last_output = self.block.output_frame(self.index);
        self.last_output
    }

    /// A frame slot passed with no input available.
    ///
    /// Accumulation does not advance, so no frame is invented. The output
    /// follows the configured `UnderrunPolicy`.
    pub fn tick_missing(&mut self) -> Frame {
        if self.state == DispatchState::Uninitialized {
            return SILENT_FRAME;
        }
        self.stats.missing_frames += 1;
        if !self.in_underrun {
            self.in_underrun = true;
            self.stats.underruns += 1;
            self.diagnostics.send(Diagnostic::Underrun {
                tick: self.stats.ticks,
            });
        }
        match self.config.underrun_policy {
            UnderrunPolicy::HoldLast => self.last_output,
            UnderrunPolicy::Silence => SILENT_FRAME,
        }
    }

    /// Tick every frame of `inputs`, writing into the matching `outputs` slot
    pub fn process_frames(&mut self, inputs: &[Frame], outputs: &mut [Frame]) {
        for (input, output) in inputs.iter().zip(outputs.iter_mut()) {
            *output = self.tick(input);
        }
    }

    fn at_boundary(&self) -> bool {
        self.frame == 0 && self.index == 0
    }

    fn apply_pending(&mut self) {
        // Staged values from the control thread win over older pending ones
        if let Some(staged) = self.staging.as_mut().and_then(ConfigStaging::latest) {
            self.pending = Some(staged);
        }
        if let Some(config) = self.pending.take() {
            if config != self.config {
                self.apply_config(config);
                self.diagnostics.send(Diagnostic::ConfigApplied(config));
            }
        }
    }

    fn apply_config(&mut self, config: DispatchConfig) {
        self.config = config;
        self.block.apply_config(&config);
        self.frame = 0;
        self.index = 0;
    }

    fn run_cycle(&mut self) {
        let cycle = self.stats.cycles;
        self.stats.cycles += 1;

        let Some(processor) = self.processor.as_mut() else {
            self.block.silence_outputs();
            return;
        };

        self.block.prepare(&self.panel, self.sample_rate);
        let block = &mut self.block;
        let result = panic::catch_unwind(AssertUnwindSafe(|| processor.process(block)));

        let fault = match result {
            Ok(Ok(())) => None,
            Ok(Err(err)) => Some(DisplayText::from_display(&err)),
            Err(payload) => Some(panic_message(payload.as_ref())),
        };

        if let Some(text) = self.block.take_display() {
            self.diagnostics.send(Diagnostic::Display { cycle, text });
        }

        if let Some(message) = fault {
            // Nothing from a failed call survives into the next block
            self.stats.faults += 1;
            self.block.silence_outputs();
            self.block.take_requested_config();
            self.diagnostics
                .send(Diagnostic::CallbackFault { cycle, message });
            return;
        }

        self.block.publish(&mut self.panel);
        if let Some(requested) = self.block.take_requested_config() {
            match requested.validate() {
                Ok(()) => self.pending = Some(requested),
                Err(err) => {
                    self.diagnostics.send(Diagnostic::ConfigRejected(err));
                }
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> DisplayText {
    if let Some(message) = payload.downcast_ref::<&str>() {
        DisplayText::from_display(message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        DisplayText::from_display(message)
    } else {
        DisplayText::from_display("process() panicked")
    }
}
