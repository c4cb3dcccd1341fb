//! Voltage-controlled sine oscillator.
//!
//! Pitch follows the 1 V/octave convention: knob 1 sweeps -5..+5 octaves
//! around the base frequency and input 1 adds to it. Output 1 carries a
//! ±5 V sine.
//!
//! The phase increment is derived from the block's timing on every call,
//! so a sample-rate change takes effect at the next block:
//!
//! ```text
//! delta_phase = frame_divider * sample_time * freq
//! ```

use std::f32::consts::TAU;

use crate::{
    block::Block,
    config::DispatchConfig,
    error::ProcessResult,
    processor::Processor,
};

/// Middle C (C4), the 0 V reference pitch
pub const C4_HZ: f32 = 261.6256;

/// Peak output voltage
const AMPLITUDE: f32 = 5.0;

pub struct Vco {
    /// Phase in cycles, kept in [0, 1)
    phase: f32,
    base_frequency: f32,
    config: DispatchConfig,
}

impl Vco {
    pub fn new() -> Self {
        Self {
            phase: 0.0,
            base_frequency: C4_HZ,
            config: DispatchConfig {
                frame_divider: 1,
                buffer_size: 16,
                ..DispatchConfig::default()
            },
        }
    }

    /// Frequency produced at 0 V (knob centred, input unpatched)
    pub fn with_base_frequency(mut self, freq: f32) -> Self {
        self.base_frequency = freq;
        self
    }

    pub fn with_config(mut self, config: DispatchConfig) -> Self {
        self.config = config;
        self
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Frequency for a pitch in volts
    pub fn frequency(&self, pitch: f32) -> f32 {
        self.base_frequency * 2.0_f32.powf(pitch)
    }
}

impl Default for Vco {
    fn default() -> Self {
        Self::new()
    }
}

impl Processor for Vco {
    fn process(&mut self, block: &mut Block) -> ProcessResult {
        // Knob spans -5..+5 octaves, input 1 follows 1 V/oct
        let pitch = block.knob(0) * 10.0 - 5.0 + block.input(0);
        let freq = self.frequency(pitch);
        block.display(format_args!("Freq: {freq:.3} Hz"));

        let delta_phase = block.frame_divider() as f32 * block.sample_time() * freq;
        for sample in block.output_buffer_mut(0) {
            self.phase += delta_phase;
            self.phase -= self.phase.floor();
            *sample = (TAU * self.phase).sin() * AMPLITUDE;
        }
        Ok(())
    }

    fn config(&self) -> DispatchConfig {
        self.config
    }

    fn name(&self) -> &str {
        "vco"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::Panel;

    #[test]
    fn centred_knob_plays_base_frequency() {
        let vco = Vco::new();
        assert!((vco.frequency(0.5 * 10.0 - 5.0) - C4_HZ).abs() < 1e-3);
        assert!((vco.frequency(1.0) - 2.0 * C4_HZ).abs() < 1e-3);
    }

    #[test]
    fn phase_completes_whole_cycles() {
        // 44 kHz / 440 Hz = 100 samples per cycle, 16 samples per block
        let sample_rate = 44_000.0;
        let mut vco = Vco::new().with_base_frequency(440.0);
        let config = vco.config();
        let mut block = Block::new(&config, sample_rate);
        block.prepare(&Panel::default(), sample_rate);

        for _ in 0..100 {
            vco.process(&mut block).unwrap();
        }
        let phase = vco.phase();
        let error = phase.min(1.0 - phase);
        assert!(error < 1e-3, "phase drifted to {phase}");
    }

    #[test]
    fn output_is_bounded_sine() {
        let mut vco = Vco::new();
        let mut block = Block::new(&vco.config(), 48_000.0);
        block.prepare(&Panel::default(), 48_000.0);
        vco.process(&mut block).unwrap();
        assert!(block.output_buffer(0).iter().all(|s| s.abs() <= AMPLITUDE));
        assert!(block.output_buffer(0).iter().any(|s| s.abs() > 0.0));
    }
}
