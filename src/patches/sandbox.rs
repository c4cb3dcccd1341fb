//! Knob preset sandbox.
//!
//! Six presets of six knob values each. The knobs always write through to
//! the selected preset; pressing switch `i` selects preset `i` and moves the
//! knobs to its stored values. Exactly one switch light is lit: the selected
//! preset's.
//!
//! When several switches are held at once the highest row wins. Selection is
//! resolved before any light is written, so two lights are never on together.

use crate::{
    block::{Block, Rgb},
    config::DispatchConfig,
    error::ProcessResult,
    processor::Processor,
    NUM_CHANNELS,
};

pub struct Sandbox {
    presets: [[f32; NUM_CHANNELS]; NUM_CHANNELS],
    selected: usize,
}

impl Sandbox {
    pub fn new() -> Self {
        Self {
            presets: [[0.0; NUM_CHANNELS]; NUM_CHANNELS],
            selected: 0,
        }
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn preset(&self, index: usize) -> &[f32; NUM_CHANNELS] {
        &self.presets[index]
    }
}

impl Default for Sandbox {
    fn default() -> Self {
        Self::new()
    }
}

impl Processor for Sandbox {
    fn process(&mut self, block: &mut Block) -> ProcessResult {
        // Store the live knobs into the current preset
        let knobs = *block.knobs();
        self.presets[self.selected] = knobs;
        for (row, &value) in knobs.iter().enumerate() {
            block.light_mut(row)[0] = value;
        }

        if let Some(pressed) = (0..NUM_CHANNELS).rev().find(|&i| block.switch(i)) {
            self.selected = pressed;
            for (knob, &value) in self.presets[pressed].iter().enumerate() {
                block.set_knob(knob, value);
            }
        }

        for row in 0..NUM_CHANNELS {
            let lit = if row == self.selected { 1.0 } else { 0.0 };
            block.set_switch_light(row, Rgb::new(lit, 0.0, 0.0));
        }
        Ok(())
    }

    fn config(&self) -> DispatchConfig {
        DispatchConfig::default().with_frame_divider(256)
    }

    fn name(&self) -> &str {
        "sandbox"
    }
}
