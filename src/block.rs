//! The per-cycle view handed to a processor.
//!
//! A `Block` owns preallocated channel storage sized for `MAX_BUFFER_SIZE`, so
//! changing the buffer size at a boundary only changes the visible length.
//! Processors get `&mut Block` for one call and cannot keep it.
//!
//! Two addressing conventions coexist on every block:
//!
//! - scalar: `input(ch)` reads the first sample, `set_output(ch, v)` fills the
//!   whole output buffer
//! - buffered: `input_buffer(ch)` / `output_buffer_mut(ch)` address each sample
//!
//! With `buffer_size == 1` both are the same thing.

use std::fmt;
use std::ops::{Index, IndexMut};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{config::DispatchConfig, diagnostics::DisplayText, MAX_BUFFER_SIZE, NUM_CHANNELS};

/// One sample across all six channels
pub type Frame = [f32; NUM_CHANNELS];

/// RGB light value. Components are nominally 0.0-1.0; the host clamps.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const OFF: Rgb = Rgb::new(0.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Copy with every component clamped to 0.0-1.0
    pub fn clamped(self) -> Self {
        Self {
            r: self.r.clamp(0.0, 1.0),
            g: self.g.clamp(0.0, 1.0),
            b: self.b.clamp(0.0, 1.0),
        }
    }
}

impl From<[f32; 3]> for Rgb {
    fn from([r, g, b]: [f32; 3]) -> Self {
        Self { r, g, b }
    }
}

impl From<Rgb> for [f32; 3] {
    fn from(rgb: Rgb) -> Self {
        [rgb.r, rgb.g, rgb.b]
    }
}

/// Color index addressing: 0 = red, 1 = green, 2 = blue
impl Index<usize> for Rgb {
    type Output = f32;

    fn index(&self, color: usize) -> &f32 {
        match color {
            0 => &self.r,
            1 => &self.g,
            2 => &self.b,
            _ => panic!("color index {color} out of range (0-2)"),
        }
    }
}

impl IndexMut<usize> for Rgb {
    fn index_mut(&mut self, color: usize) -> &mut f32 {
        match color {
            0 => &mut self.r,
            1 => &mut self.g,
            2 => &mut self.b,
            _ => panic!("color index {color} out of range (0-2)"),
        }
    }
}

/// Six sample buffers with a shared visible length.
pub struct Channels {
    buffers: [Vec<f32>; NUM_CHANNELS],
    len: usize,
}

impl Channels {
    fn new(len: usize) -> Self {
        Self {
            buffers: std::array::from_fn(|_| vec![0.0; MAX_BUFFER_SIZE]),
            len: len.min(MAX_BUFFER_SIZE),
        }
    }

    /// Visible samples per channel
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn channel(&self, index: usize) -> &[f32] {
        &self.buffers[index][..self.len]
    }

    pub fn channel_mut(&mut self, index: usize) -> &mut [f32] {
        &mut self.buffers[index][..self.len]
    }

    /// Sample `index` of every channel
    pub fn frame(&self, index: usize) -> Frame {
        std::array::from_fn(|ch| self.buffers[ch][index])
    }

    pub(crate) fn write_frame(&mut self, index: usize, frame: &Frame) {
        for (buffer, &sample) in self.buffers.iter_mut().zip(frame) {
            buffer[index] = sample;
        }
    }

    /// Change the visible length, zeroing samples that become visible
    pub(crate) fn resize(&mut self, len: usize) {
        if len > self.len {
            for buffer in &mut self.buffers {
                buffer[self.len..len].fill(0.0);
            }
        }
        self.len = len;
    }

    pub(crate) fn silence(&mut self) {
        for buffer in &mut self.buffers {
            buffer.fill(0.0);
        }
    }
}

impl fmt::Debug for Channels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries((0..NUM_CHANNELS).map(|ch| self.channel(ch)))
            .finish()
    }
}

/// Host-facing controls and indicators that persist across blocks.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Panel {
    pub knobs: [f32; NUM_CHANNELS],
    pub switches: [bool; NUM_CHANNELS],
    pub lights: [Rgb; NUM_CHANNELS],
    pub switch_lights: [Rgb; NUM_CHANNELS],
}

impl Panel {
    /// Knob rest position
    pub const DEFAULT_KNOB: f32 = 0.5;

    pub fn clear_lights(&mut self) {
        self.lights = [Rgb::OFF; NUM_CHANNELS];
        self.switch_lights = [Rgb::OFF; NUM_CHANNELS];
    }
}

impl Default for Panel {
    fn default() -> Self {
        Self {
            knobs: [Self::DEFAULT_KNOB; NUM_CHANNELS],
            switches: [false; NUM_CHANNELS],
            lights: [Rgb::OFF; NUM_CHANNELS],
            switch_lights: [Rgb::OFF; NUM_CHANNELS],
        }
    }
}

/// One dispatch cycle's worth of data
pub struct Block {
    sample_rate: f32,
    sample_time: f32,
    frame_divider: u32,
    inputs: Channels,
    outputs: Channels,
    knobs: [f32; NUM_CHANNELS],
    switches: [bool; NUM_CHANNELS],
    lights: [Rgb; NUM_CHANNELS],
    switch_lights: [Rgb; NUM_CHANNELS],
    display: DisplayText,
    display_written: bool,
    requested_config: Option<DispatchConfig>,
}

impl Block {
    /// Create a block for the given configuration.
    ///
    /// The dispatcher owns one of these; it is public so processors can be
    /// driven directly in tests and benchmarks.
    pub fn new(config: &DispatchConfig, sample_rate: f32) -> Self {
        Self {
            sample_rate,
            sample_time: 1.0 / sample_rate,
            frame_divider: config.frame_divider,
            inputs: Channels::new(config.buffer_size),
            outputs: Channels::new(config.buffer_size),
            knobs: [Panel::DEFAULT_KNOB; NUM_CHANNELS],
            switches: [false; NUM_CHANNELS],
            lights: [Rgb::OFF; NUM_CHANNELS],
            switch_lights: [Rgb::OFF; NUM_CHANNELS],
            display: DisplayText::new(),
            display_written: false,
            requested_config: None,
        }
    }

    // -- timing --

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Seconds per raw sample
    pub fn sample_time(&self) -> f32 {
        self.sample_time
    }

    pub fn frame_divider(&self) -> u32 {
        self.frame_divider
    }

    /// Samples per channel in this block
    pub fn buffer_size(&self) -> usize {
        self.inputs.len()
    }

    // -- inputs / outputs --

    /// First sample of an input channel
    pub fn input(&self, channel: usize) -> f32 {
        self.inputs.channel(channel)[0]
    }

    pub fn input_buffer(&self, channel: usize) -> &[f32] {
        self.inputs.channel(channel)
    }

    /// First sample of an output channel
    pub fn output(&self, channel: usize) -> f32 {
        self.outputs.channel(channel)[0]
    }

    pub fn output_buffer(&self, channel: usize) -> &[f32] {
        self.outputs.channel(channel)
    }

    pub fn output_buffer_mut(&mut self, channel: usize) -> &mut [f32] {
        self.outputs.channel_mut(channel)
    }

    /// Scalar write: hold `value` for the whole block
    pub fn set_output(&mut self, channel: usize, value: f32) {
        self.outputs.channel_mut(channel).fill(value);
    }

    /// Read inputs while writing outputs
    pub fn io_mut(&mut self) -> (&Channels, &mut Channels) {
        (&self.inputs, &mut self.outputs)
    }

    // -- controls --

    pub fn knob(&self, index: usize) -> f32 {
        self.knobs[index]
    }

    pub fn knobs(&self) -> &[f32; NUM_CHANNELS] {
        &self.knobs
    }

    /// Move a knob. The host adopts the new value after the call.
    ///
    /// Values are clamped to 0-1; NaN leaves the knob where it was.
    pub fn set_knob(&mut self, index: usize, value: f32) {
        if !value.is_nan() {
            self.knobs[index] = value.clamp(0.0, 1.0);
        }
    }

    pub fn switch(&self, index: usize) -> bool {
        self.switches[index]
    }

    pub fn switches(&self) -> &[bool; NUM_CHANNELS] {
        &self.switches
    }

    // -- lights --

    pub fn light(&self, index: usize) -> Rgb {
        self.lights[index]
    }

    pub fn set_light(&mut self, index: usize, rgb: impl Into<Rgb>) {
        self.lights[index] = rgb.into();
    }

    pub fn light_mut(&mut self, index: usize) -> &mut Rgb {
        &mut self.lights[index]
    }

    pub fn switch_light(&self, index: usize) -> Rgb {
        self.switch_lights[index]
    }

    pub fn set_switch_light(&mut self, index: usize, rgb: impl Into<Rgb>) {
        self.switch_lights[index] = rgb.into();
    }

    pub fn switch_light_mut(&mut self, index: usize) -> &mut Rgb {
        &mut self.switch_lights[index]
    }

    // -- side channels --

    /// Show text on the host display. Last write in a cycle wins.
    pub fn display(&mut self, text: impl fmt::Display) {
        self.display = DisplayText::from_display(text);
        self.display_written = true;
    }

    /// Ask the dispatcher to switch configuration at the next boundary
    pub fn request_config(&mut self, config: DispatchConfig) {
        self.requested_config = Some(config);
    }

    // -- dispatcher plumbing --

    /// Load controls, last published lights and timing ahead of a call
    pub(crate) fn prepare(&mut self, panel: &Panel, sample_rate: f32) {
        if sample_rate != self.sample_rate {
            self.sample_rate = sample_rate;
            self.sample_time = 1.0 / sample_rate;
        }
        self.knobs = panel.knobs;
        self.switches = panel.switches;
        self.lights = panel.lights;
        self.switch_lights = panel.switch_lights;
        self.display_written = false;
        self.requested_config = None;
    }

    /// Copy knob edits and lights back to the panel after a call
    pub(crate) fn publish(&self, panel: &mut Panel) {
        panel.knobs = self.knobs;
        panel.lights = self.lights;
        panel.switch_lights = self.switch_lights;
    }

    pub(crate) fn take_display(&mut self) -> Option<DisplayText> {
        if self.display_written {
            self.display_written = false;
            Some(self.display)
        } else {
            None
        }
    }

    pub(crate) fn take_requested_config(&mut self) -> Option<DispatchConfig> {
        self.requested_config.take()
    }

    pub(crate) fn apply_config(&mut self, config: &DispatchConfig) {
        self.frame_divider = config.frame_divider;
        self.inputs.resize(config.buffer_size);
        self.outputs.resize(config.buffer_size);
    }

    pub(crate) fn capture(&mut self, index: usize, frame: &Frame) {
        self.inputs.write_frame(index, frame);
    }

    pub(crate) fn output_frame(&self, index: usize) -> Frame {
        self.outputs.frame(index)
    }

    pub(crate) fn silence_outputs(&mut self) {
        self.outputs.silence();
    }

    pub(crate) fn clear(&mut self) {
        self.inputs.silence();
        self.outputs.silence();
        self.lights = [Rgb::OFF; NUM_CHANNELS];
        self.switch_lights = [Rgb::OFF; NUM_CHANNELS];
        self.display.clear();
        self.display_written = false;
        self.requested_config = None;
    }
}

impl fmt::Debug for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Block")
            .field("sample_rate", &self.sample_rate)
            .field("frame_divider", &self.frame_divider)
            .field("buffer_size", &self.buffer_size())
            .field("knobs", &self.knobs)
            .field("switches", &self.switches)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(buffer_size: usize) -> Block {
        let config = DispatchConfig::default().with_buffer_size(buffer_size);
        Block::new(&config, 48_000.0)
    }

    #[test]
    fn rgb_index_and_triple_agree() {
        let mut light = Rgb::from([0.1, 0.2, 0.3]);
        assert_eq!(light[0], 0.1);
        assert_eq!(light[2], 0.3);
        light[1] = 0.9;
        assert_eq!(<[f32; 3]>::from(light), [0.1, 0.9, 0.3]);
    }

    #[test]
    fn rgb_clamps() {
        let light = Rgb::new(-1.0, 0.5, 3.0).clamped();
        assert_eq!(light, Rgb::new(0.0, 0.5, 1.0));
    }

    #[test]
    fn scalar_and_buffer_addressing_agree_for_single_sample() {
        let mut block = block(1);
        block.capture(0, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(block.input(2), 3.0);
        assert_eq!(block.input_buffer(2), &[3.0]);

        block.set_output(4, 7.5);
        assert_eq!(block.output_buffer(4), &[7.5]);
        block.output_buffer_mut(4)[0] = -2.0;
        assert_eq!(block.output(4), -2.0);
    }

    #[test]
    fn scalar_output_fills_buffer() {
        let mut block = block(8);
        block.set_output(0, 5.0);
        assert_eq!(block.output_buffer(0), &[5.0; 8]);
    }

    #[test]
    fn resize_zeroes_newly_visible_samples() {
        let mut block = block(4);
        block.set_output(0, 1.0);
        block.apply_config(&DispatchConfig::default().with_buffer_size(2));
        block.apply_config(&DispatchConfig::default().with_buffer_size(4));
        assert_eq!(block.output_buffer(0), &[1.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn display_last_write_wins() {
        let mut block = block(1);
        block.display("first");
        block.display(format_args!("second {}", 2));
        assert_eq!(block.take_display().unwrap().as_str(), "second 2");
        assert!(block.take_display().is_none());
    }

    #[test]
    fn prepare_refreshes_sample_time_lazily() {
        let mut block = block(1);
        assert!((block.sample_time() - 1.0 / 48_000.0).abs() < 1e-12);
        block.prepare(&Panel::default(), 96_000.0);
        assert!((block.sample_time() - 1.0 / 96_000.0).abs() < 1e-12);
    }

    #[test]
    fn publish_copies_knob_edits() {
        let mut block = block(1);
        let mut panel = Panel::default();
        block.prepare(&panel, 48_000.0);
        block.set_knob(3, 0.25);
        block.set_light(1, [1.0, 0.0, 0.0]);
        block.publish(&mut panel);
        assert_eq!(panel.knobs[3], 0.25);
        assert_eq!(panel.lights[1], Rgb::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn set_knob_clamps_and_ignores_nan() {
        let mut block = block(1);
        block.prepare(&Panel::default(), 48_000.0);
        block.set_knob(0, 1.5);
        block.set_knob(1, -0.5);
        block.set_knob(2, f32::NAN);
        assert_eq!(block.knob(0), 1.0);
        assert_eq!(block.knob(1), 0.0);
        assert_eq!(block.knob(2), Panel::DEFAULT_KNOB);
    }
}
