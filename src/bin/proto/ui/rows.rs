//! One column per row: knob, switch, lights, output voltage

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use saavy_proto::{Rgb, NUM_CHANNELS};

use super::PanelUpdate;

/// Cells in the knob bar
const KNOB_WIDTH: usize = 8;

pub fn render_rows(frame: &mut Frame, area: Rect, update: &PanelUpdate, selected: usize) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, NUM_CHANNELS as u32); NUM_CHANNELS])
        .split(area);

    let panel = &update.panel;
    for (row, &column) in columns.iter().enumerate() {
        let border = if row == selected {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let block = Block::default()
            .title(format!(" {} ", row + 1))
            .borders(Borders::ALL)
            .border_style(border);

        let knob = panel.knobs[row];
        let filled = ((knob * KNOB_WIDTH as f32).round() as usize).min(KNOB_WIDTH);
        let switch = if panel.switches[row] { "●" } else { "○" };

        let lines = vec![
            Line::from(vec![
                Span::raw("knob "),
                Span::styled("█".repeat(filled), Style::default().fg(Color::Cyan)),
                Span::styled("░".repeat(KNOB_WIDTH - filled), Style::default().fg(Color::DarkGray)),
            ]),
            Line::from(format!("     {knob:.2}")),
            Line::from(vec![
                Span::raw("sw   "),
                Span::styled(switch, Style::default().fg(light_color(panel.switch_lights[row]))),
            ]),
            Line::from(vec![
                Span::raw("led  "),
                Span::styled("██", Style::default().fg(light_color(panel.lights[row]))),
            ]),
            Line::from(format!("out {:+6.2}V", update.outputs[row])),
        ];

        frame.render_widget(Paragraph::new(lines).block(block), column);
    }
}

/// Unlit lights still show as a dim cell
fn light_color(rgb: Rgb) -> Color {
    let rgb = rgb.clamped();
    let level = |c: f32| (c * 255.0).round() as u8;
    let (r, g, b) = (level(rgb.r), level(rgb.g), level(rgb.b));
    if r == 0 && g == 0 && b == 0 {
        Color::DarkGray
    } else {
        Color::Rgb(r, g, b)
    }
}
