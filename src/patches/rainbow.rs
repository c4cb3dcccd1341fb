//! Rainbow light animation.
//!
//! Runs at control rate (one call every 256 samples) and rotates a hue wheel
//! across the six rows at half a turn per second. Lights and switch lights
//! get the row's color; outputs get a 0-10 V sine of the hue.

use std::f32::consts::TAU;

use crate::{
    block::{Block, Rgb},
    config::DispatchConfig,
    error::ProcessResult,
    processor::Processor,
    NUM_CHANNELS,
};

/// Hue wheel turns per second
const TURNS_PER_SECOND: f32 = 0.5;

/// Convert HSV (all components 0-1) to RGB.
///
/// Hue is split into six sectors; `c` is chroma and `x` the intermediate
/// component for the sector.
pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> Rgb {
    let h = h * 6.0;
    let c = v * s;
    let x = c * (1.0 - (h % 2.0 - 1.0).abs());
    let [r, g, b] = if h < 1.0 {
        [c, x, 0.0]
    } else if h < 2.0 {
        [x, c, 0.0]
    } else if h < 3.0 {
        [0.0, c, x]
    } else if h < 4.0 {
        [0.0, x, c]
    } else if h < 5.0 {
        [x, 0.0, c]
    } else {
        [c, 0.0, x]
    };
    let m = v - c;
    Rgb::new(r + m, g + m, b + m)
}

pub struct Rainbow {
    /// Wheel rotation in turns, kept in [0, 1)
    phase: f32,
}

impl Rainbow {
    pub fn new() -> Self {
        Self { phase: 0.0 }
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }
}

impl Default for Rainbow {
    fn default() -> Self {
        Self::new()
    }
}

impl Processor for Rainbow {
    fn process(&mut self, block: &mut Block) -> ProcessResult {
        let elapsed =
            block.sample_time() * block.frame_divider() as f32 * block.buffer_size() as f32;
        self.phase = (self.phase + elapsed * TURNS_PER_SECOND) % 1.0;

        for row in 0..NUM_CHANNELS {
            let hue = (1.0 - row as f32 / NUM_CHANNELS as f32 + self.phase) % 1.0;
            let rgb = hsv_to_rgb(hue, 1.0, 1.0);
            block.set_light(row, rgb);
            block.set_switch_light(row, rgb);
            block.set_output(row, (TAU * hue).sin() * 5.0 + 5.0);
        }
        Ok(())
    }

    fn config(&self) -> DispatchConfig {
        DispatchConfig::default().with_frame_divider(256)
    }

    fn name(&self) -> &str {
        "rainbow"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::Panel;

    fn close(a: Rgb, b: Rgb) -> bool {
        (a.r - b.r).abs() < 1e-5 && (a.g - b.g).abs() < 1e-5 && (a.b - b.b).abs() < 1e-5
    }

    #[test]
    fn primary_hues() {
        assert!(close(hsv_to_rgb(0.0, 1.0, 1.0), Rgb::new(1.0, 0.0, 0.0)));
        assert!(close(hsv_to_rgb(1.0 / 3.0, 1.0, 1.0), Rgb::new(0.0, 1.0, 0.0)));
        assert!(close(hsv_to_rgb(2.0 / 3.0, 1.0, 1.0), Rgb::new(0.0, 0.0, 1.0)));
    }

    #[test]
    fn zero_saturation_is_grey() {
        assert!(close(hsv_to_rgb(0.4, 0.0, 0.5), Rgb::new(0.5, 0.5, 0.5)));
    }

    #[test]
    fn wheel_turns_at_half_hertz() {
        let sample_rate = 48_000.0;
        let mut rainbow = Rainbow::new();
        let mut block = Block::new(&rainbow.config(), sample_rate);
        block.prepare(&Panel::default(), sample_rate);

        // 0.5 s of audio at 256 samples per call
        let calls = (sample_rate * 0.5 / 256.0) as usize;
        for _ in 0..calls {
            rainbow.process(&mut block).unwrap();
        }
        let expected = calls as f32 * 256.0 / sample_rate * TURNS_PER_SECOND;
        assert!((rainbow.phase() - expected).abs() < 1e-3);
    }

    #[test]
    fn outputs_stay_in_unipolar_range() {
        let mut rainbow = Rainbow::new();
        let mut block = Block::new(&rainbow.config(), 48_000.0);
        block.prepare(&Panel::default(), 48_000.0);
        rainbow.process(&mut block).unwrap();
        for row in 0..NUM_CHANNELS {
            let v = block.output(row);
            assert!((0.0..=10.0).contains(&v), "row {row} output {v}");
            assert_eq!(block.light(row), block.switch_light(row));
        }
    }
}
