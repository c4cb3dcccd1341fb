//! Six-channel gain stage with mute switches.
//!
//! Each row multiplies its input by its knob. The row light shows the gain
//! in red; pressing the row switch mutes the output and lights the switch.

use crate::{
    block::Block,
    error::ProcessResult,
    processor::Processor,
    NUM_CHANNELS,
};

#[derive(Debug, Default)]
pub struct Gain;

impl Gain {
    pub fn new() -> Self {
        Self
    }
}

impl Processor for Gain {
    fn process(&mut self, block: &mut Block) -> ProcessResult {
        for row in 0..NUM_CHANNELS {
            let gain = block.knob(row);
            let muted = block.switch(row);

            block.light_mut(row)[0] = gain;
            block.switch_light_mut(row)[0] = if muted { 1.0 } else { 0.0 };

            let (inputs, outputs) = block.io_mut();
            let out = outputs.channel_mut(row);
            if muted {
                out.fill(0.0);
            } else {
                for (y, &x) in out.iter_mut().zip(inputs.channel(row)) {
                    *y = x * gain;
                }
            }
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "gain"
    }
}
