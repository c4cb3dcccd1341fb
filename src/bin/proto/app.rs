//! Proto - audio host that drives a Dispatcher from the device callback

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use rtrb::{Consumer, RingBuffer};
use std::cell::Cell;
use std::panic;

use saavy_proto::{config, diagnostics, Dispatcher, Frame, Processor, NUM_CHANNELS};

use super::ui::{ControlMessage, PanelUpdate, UiApp, UiLinks};

/// Volts that map to a full-scale device sample
pub const VOLTS_FULL_SCALE: f32 = 10.0;

const CONTROL_RING: usize = 64;
const PANEL_RING: usize = 16;
const SCOPE_RING: usize = 8192;
const DIAGNOSTIC_RING: usize = 256;
/// About a fifth of a second at 48 kHz
const INPUT_RING: usize = 8192;

thread_local! {
    /// Set inside the output callback
    static AUDIO_THREAD: Cell<bool> = const { Cell::new(false) };
}

/// Application builder
pub struct Proto {
    processor: Box<dyn Processor>,
    frame_divider: Option<u32>,
    buffer_size: Option<usize>,
    capture_input: bool,
}

impl Proto {
    pub fn new(processor: Box<dyn Processor>) -> Self {
        Self {
            processor,
            frame_divider: None,
            buffer_size: None,
            capture_input: false,
        }
    }

    /// Override the patch's preferred frame divider
    pub fn frame_divider(mut self, frame_divider: Option<u32>) -> Self {
        self.frame_divider = frame_divider;
        self
    }

    /// Override the patch's preferred buffer size
    pub fn buffer_size(mut self, buffer_size: Option<usize>) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    /// Read inputs from the default capture device instead of silence
    pub fn capture_input(mut self, capture_input: bool) -> Self {
        self.capture_input = capture_input;
        self
    }

    /// Open the device, start dispatching, and run the TUI until quit
    pub fn run(self) -> EyreResult<()> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| eyre!("no default output device available"))?;
        let stream_config = device
            .default_output_config()
            .wrap_err("failed to fetch default output config")?;

        let sample_rate = stream_config.sample_rate().0 as f32;
        let channels = stream_config.channels() as usize;

        let mut dispatch_config = self.processor.config();
        if let Some(frame_divider) = self.frame_divider {
            dispatch_config = dispatch_config.with_frame_divider(frame_divider);
        }
        if let Some(buffer_size) = self.buffer_size {
            dispatch_config = dispatch_config.with_buffer_size(buffer_size);
        }

        let (diagnostic_tx, diagnostics) = diagnostics::channel(DIAGNOSTIC_RING);
        let (config_handle, staging) = config::staging();
        let mut dispatcher = Dispatcher::new(sample_rate, diagnostic_tx).with_staging(staging);

        let patch = self.processor.name().to_string();
        dispatcher
            .load(self.processor)
            .wrap_err_with(|| format!("failed to load patch '{patch}'"))?;
        dispatcher
            .configure(dispatch_config)
            .wrap_err("invalid frame divider or buffer size")?;
        log::info!(
            "loaded {patch}: {sample_rate} Hz, {channels} device channels, D={} N={}",
            dispatch_config.frame_divider,
            dispatch_config.buffer_size
        );

        let (_input_stream, mut input_rx) = if self.capture_input {
            let (stream, rx) = open_input(&host, sample_rate)?;
            (Some(stream), Some(rx))
        } else {
            (None, None)
        };

        let (control_tx, mut control_rx) = RingBuffer::<ControlMessage>::new(CONTROL_RING);
        let (mut panel_tx, panel_rx) = RingBuffer::<PanelUpdate>::new(PANEL_RING);
        let (mut scope_tx, scope_rx) = RingBuffer::<f32>::new(SCOPE_RING);
        let silent: Frame = [0.0; NUM_CHANNELS];

        let stream = device.build_output_stream(
            &stream_config.into(),
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                AUDIO_THREAD.with(|flag| flag.set(true));
                while let Ok(message) = control_rx.pop() {
                    match message {
                        ControlMessage::SetKnob { row, value } => dispatcher.set_knob(row, value),
                        ControlMessage::SetSwitch { row, pressed } => {
                            dispatcher.set_switch(row, pressed)
                        }
                    }
                }

                let mut out = silent;
                for samples in data.chunks_mut(channels) {
                    out = match input_rx.as_mut() {
                        Some(rx) => match rx.pop() {
                            Ok(frame) => dispatcher.tick(&frame),
                            Err(_) => dispatcher.tick_missing(),
                        },
                        None => dispatcher.tick(&silent),
                    };

                    // Rows past the device's channel count are not played
                    for (ch, sample) in samples.iter_mut().enumerate() {
                        *sample = out
                            .get(ch)
                            .map_or(0.0, |v| (v / VOLTS_FULL_SCALE).clamp(-1.0, 1.0));
                    }
                    let _ = scope_tx.push(out[0]);
                }

                let _ = panel_tx.push(PanelUpdate {
                    panel: *dispatcher.panel(),
                    outputs: out,
                    state: dispatcher.state(),
                    config: *dispatcher.config(),
                    stats: dispatcher.stats(),
                });
            },
            |err| log::error!("output stream error: {err}"),
            None,
        )?;

        let mut ui = UiApp::new(
            patch,
            sample_rate,
            UiLinks {
                control_tx,
                panel_rx,
                scope_rx,
                diagnostics,
                config_handle,
            },
            PanelUpdate::new(dispatch_config),
        );

        // The hook has to wrap ratatui's before the first callback runs
        let mut terminal = ratatui::init();
        silence_audio_panics();
        if let Err(err) = stream.play() {
            ratatui::restore();
            return Err(err).wrap_err("failed to start output stream");
        }
        let result = ui.run(&mut terminal);
        ratatui::restore();
        result
    }
}

/// Processor panics are caught by the dispatcher and reported as
/// `CallbackFault`, which the UI logs. On the audio thread the hook does
/// nothing so a fault never does I/O there. Anywhere else the previous hook
/// (terminal restore, then the error report) runs as usual.
fn silence_audio_panics() {
    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        if !AUDIO_THREAD.with(Cell::get) {
            previous(info);
        }
    }));
}

/// Start the capture stream. Device samples are scaled to volts and pushed
/// one frame per device frame; extra device channels are ignored.
fn open_input(host: &cpal::Host, sample_rate: f32) -> EyreResult<(cpal::Stream, Consumer<Frame>)> {
    let device = host
        .default_input_device()
        .ok_or_else(|| eyre!("no default input device available"))?;
    let stream_config = device
        .default_input_config()
        .wrap_err("failed to fetch default input config")?;

    let input_rate = stream_config.sample_rate().0 as f32;
    if input_rate != sample_rate {
        log::warn!("input runs at {input_rate} Hz but output at {sample_rate} Hz");
    }
    let channels = stream_config.channels() as usize;

    let (mut tx, rx) = RingBuffer::<Frame>::new(INPUT_RING);
    let stream = device.build_input_stream(
        &stream_config.into(),
        move |data: &[f32], _: &cpal::InputCallbackInfo| {
            for samples in data.chunks(channels) {
                let mut frame = [0.0; NUM_CHANNELS];
                for (slot, &sample) in frame.iter_mut().zip(samples) {
                    *slot = sample * VOLTS_FULL_SCALE;
                }
                // Full means the output side stalled; newest frames are lost
                let _ = tx.push(frame);
            }
        },
        |err| log::error!("input stream error: {err}"),
        None,
    )?;
    stream.play()?;

    Ok((stream, rx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn audio_thread_panics_skip_the_previous_hook() {
        static CALLS: AtomicUsize = AtomicUsize::new(0);
        panic::set_hook(Box::new(|_| {
            CALLS.fetch_add(1, Ordering::SeqCst);
        }));
        silence_audio_panics();

        std::thread::spawn(|| {
            AUDIO_THREAD.with(|flag| flag.set(true));
            let _ = panic::catch_unwind(|| {
                panic!("processor fault");
            });
        })
        .join()
        .unwrap();
        assert_eq!(CALLS.load(Ordering::SeqCst), 0);

        let _ = panic::catch_unwind(|| {
            panic!("ui fault");
        });
        assert_eq!(CALLS.load(Ordering::SeqCst), 1);

        drop(panic::take_hook());
    }
}
