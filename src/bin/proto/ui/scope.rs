//! Scope widget for output 1

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    symbols,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType},
    Frame,
};

use crate::app::VOLTS_FULL_SCALE;

pub fn render_scope(frame: &mut Frame, area: Rect, samples: &[f32]) {
    let block = Block::default().title(" Out 1 ").borders(Borders::ALL);

    let data: Vec<(f64, f64)> = samples
        .iter()
        .enumerate()
        .map(|(i, &volts)| (i as f64 / samples.len() as f64, volts as f64))
        .collect();

    let dataset = Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(Color::Cyan))
        .data(&data);

    let limit = VOLTS_FULL_SCALE as f64;
    let chart = Chart::new(vec![dataset])
        .block(block)
        .x_axis(
            Axis::default()
                .bounds([0.0, 1.0])
                .style(Style::default().fg(Color::DarkGray)),
        )
        .y_axis(
            Axis::default()
                .bounds([-limit, limit])
                .style(Style::default().fg(Color::DarkGray)),
        );

    frame.render_widget(chart, area);
}
