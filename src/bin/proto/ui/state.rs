//! Messages between the UI thread and the audio thread
//!
//! Both directions are Copy so they can cross rtrb rings without
//! allocating on the audio thread.

use saavy_proto::{DispatchConfig, DispatchState, DispatchStats, Frame, Panel};

/// Commands sent from UI thread to audio thread
#[derive(Clone, Copy, Debug)]
pub enum ControlMessage {
    /// Move knob `row` to `value` (0-1)
    SetKnob { row: usize, value: f32 },
    /// Press or release switch `row`
    SetSwitch { row: usize, pressed: bool },
}

/// Snapshot pushed by the audio thread once per device buffer
#[derive(Clone, Copy, Debug)]
pub struct PanelUpdate {
    pub panel: Panel,
    /// Last output frame, in volts
    pub outputs: Frame,
    pub state: DispatchState,
    pub config: DispatchConfig,
    pub stats: DispatchStats,
}

impl PanelUpdate {
    /// Placeholder shown until the first audio callback
    pub fn new(config: DispatchConfig) -> Self {
        Self {
            panel: Panel::default(),
            outputs: [0.0; saavy_proto::NUM_CHANNELS],
            state: DispatchState::Configured,
            config,
            stats: DispatchStats::default(),
        }
    }
}
