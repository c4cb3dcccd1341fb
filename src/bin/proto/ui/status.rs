//! Status bar - patch, dispatch state, block shape, and counters

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use saavy_proto::DispatchState;

use super::PanelUpdate;

pub fn render_status(frame: &mut Frame, area: Rect, patch: &str, sample_rate: f32, update: &PanelUpdate) {
    let block = Block::default().title(" proto ").borders(Borders::ALL);

    let (symbol, state, state_color) = match update.state {
        DispatchState::Running => ("▶", "Running", Color::Green),
        DispatchState::Configured => ("⏸", "Configured", Color::Yellow),
        DispatchState::Uninitialized => ("■", "Idle", Color::DarkGray),
    };
    let stats = &update.stats;
    let fault_color = if stats.faults > 0 { Color::Red } else { Color::DarkGray };

    let line = Line::from(vec![
        Span::styled(format!(" {patch}  "), Style::default().fg(Color::Cyan)),
        Span::styled(format!("{symbol} {state}  "), Style::default().fg(state_color)),
        Span::styled(
            format!(
                "D={} N={}  ",
                update.config.frame_divider, update.config.buffer_size
            ),
            Style::default().fg(Color::White),
        ),
        Span::styled(
            format!("{:.1}kHz  ", sample_rate / 1000.0),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(
            format!("cycles {}  ", stats.cycles),
            Style::default().fg(Color::DarkGray),
        ),
        Span::styled(format!("faults {}  ", stats.faults), Style::default().fg(fault_color)),
        Span::styled(
            format!(
                "underruns {}  dropped {}",
                stats.underruns, stats.dropped_diagnostics
            ),
            Style::default().fg(Color::Magenta),
        ),
    ]);

    frame.render_widget(Paragraph::new(line).block(block), area);
}
