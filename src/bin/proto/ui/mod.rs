//! TUI for proto
//!
//! Shows the six rows (knob, switch, lights, output voltage), the last
//! display text, and a scope of output 1. Keys drive the panel.

mod rows;
mod scope;
pub mod state;
mod status;

use color_eyre::eyre::Result as EyreResult;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::{Block, Borders, Paragraph},
    DefaultTerminal, Frame,
};
use rtrb::{Consumer, Producer};
use saavy_proto::{
    config::ConfigHandle, diagnostics::Diagnostics, DispatchConfig, NUM_CHANNELS,
};
use std::time::Duration;

pub use state::{ControlMessage, PanelUpdate};

use rows::render_rows;
use scope::render_scope;
use status::render_status;

/// Scope history length in samples
const SCOPE_BUFFER_SIZE: usize = 1024;
/// Knob change per key press
const KNOB_STEP: f32 = 0.05;

/// Ring ends owned by the UI thread
pub struct UiLinks {
    pub control_tx: Producer<ControlMessage>,
    pub panel_rx: Consumer<PanelUpdate>,
    pub scope_rx: Consumer<f32>,
    pub diagnostics: Diagnostics,
    pub config_handle: ConfigHandle,
}

/// UI application state
pub struct UiApp {
    patch: String,
    sample_rate: f32,
    links: UiLinks,
    /// Latest snapshot from the audio thread
    current: PanelUpdate,
    scope_buffer: Vec<f32>,
    /// Row the keys act on
    selected: usize,
    /// Host-side notice (staging results, full queues)
    notice: String,
    should_quit: bool,
}

impl UiApp {
    pub fn new(patch: String, sample_rate: f32, links: UiLinks, initial: PanelUpdate) -> Self {
        Self {
            patch,
            sample_rate,
            links,
            current: initial,
            scope_buffer: vec![0.0; SCOPE_BUFFER_SIZE],
            selected: 0,
            notice: String::new(),
            should_quit: false,
        }
    }

    /// Run the UI event loop
    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> EyreResult<()> {
        while !self.should_quit {
            self.poll_scope();
            self.poll_panel();
            self.links.diagnostics.drain_logged();

            terminal.draw(|frame| self.render(frame))?;

            // ~60fps
            if event::poll(Duration::from_millis(16))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code);
                    }
                }
            }
        }

        Ok(())
    }

    fn poll_scope(&mut self) {
        while let Ok(sample) = self.links.scope_rx.pop() {
            self.scope_buffer.push(sample);
        }
        if self.scope_buffer.len() > SCOPE_BUFFER_SIZE {
            let excess = self.scope_buffer.len() - SCOPE_BUFFER_SIZE;
            self.scope_buffer.drain(0..excess);
        }
    }

    fn poll_panel(&mut self) {
        // Keep only the latest snapshot
        while let Ok(update) = self.links.panel_rx.pop() {
            self.current = update;
        }
    }

    fn handle_key(&mut self, key: KeyCode) {
        let row = self.selected;
        match key {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Char(c @ '1'..='6') => {
                self.selected = c as usize - '1' as usize;
            }
            KeyCode::Left => {
                self.selected = (row + NUM_CHANNELS - 1) % NUM_CHANNELS;
            }
            KeyCode::Right => {
                self.selected = (row + 1) % NUM_CHANNELS;
            }
            KeyCode::Up => self.nudge_knob(KNOB_STEP),
            KeyCode::Down => self.nudge_knob(-KNOB_STEP),
            KeyCode::Char(' ') => {
                let pressed = !self.current.panel.switches[row];
                if self.send(ControlMessage::SetSwitch { row, pressed }) {
                    self.current.panel.switches[row] = pressed;
                }
            }
            KeyCode::Char('[') => {
                let size = (self.current.config.buffer_size / 2).max(1);
                self.stage(self.current.config.with_buffer_size(size));
            }
            KeyCode::Char(']') => {
                let size = self.current.config.buffer_size * 2;
                self.stage(self.current.config.with_buffer_size(size));
            }
            KeyCode::Char('-') => {
                let divider = (self.current.config.frame_divider / 2).max(1);
                self.stage(self.current.config.with_frame_divider(divider));
            }
            KeyCode::Char('=') | KeyCode::Char('+') => {
                let divider = self.current.config.frame_divider.saturating_mul(2);
                self.stage(self.current.config.with_frame_divider(divider));
            }
            _ => {}
        }
    }

    fn nudge_knob(&mut self, delta: f32) {
        let row = self.selected;
        let value = (self.current.panel.knobs[row] + delta).clamp(0.0, 1.0);
        // Optimistic so held keys accumulate before the next snapshot
        if self.send(ControlMessage::SetKnob { row, value }) {
            self.current.panel.knobs[row] = value;
        }
    }

    fn send(&mut self, message: ControlMessage) -> bool {
        match self.links.control_tx.push(message) {
            Ok(()) => true,
            Err(_) => {
                self.notice = "control queue full".to_string();
                false
            }
        }
    }

    fn stage(&mut self, config: DispatchConfig) {
        self.notice = match self.links.config_handle.stage(config) {
            Ok(()) => format!(
                "staged D={} N={}",
                config.frame_divider, config.buffer_size
            ),
            Err(err) => err.to_string(),
        };
    }

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Status bar
                Constraint::Min(7),    // Rows
                Constraint::Length(3), // Display text
                Constraint::Length(8), // Scope
                Constraint::Length(1), // Help bar
            ])
            .split(area);

        render_status(frame, chunks[0], &self.patch, self.sample_rate, &self.current);
        render_rows(frame, chunks[1], &self.current, self.selected);

        let display = Paragraph::new(self.links.diagnostics.last_message())
            .block(
                Block::default()
                    .title(" Display ")
                    .title_bottom(self.notice.as_str())
                    .borders(Borders::ALL),
            )
            .style(Style::default().fg(Color::White));
        frame.render_widget(display, chunks[2]);

        render_scope(frame, chunks[3], &self.scope_buffer);

        let help = Paragraph::new(
            " [Q] Quit  [1-6/←→] Row  [↑↓] Knob  [Space] Switch  [ [ ] ] Buffer  [-/=] Divider",
        )
        .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(help, chunks[4]);
    }
}
