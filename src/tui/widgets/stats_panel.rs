use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Gauge, Paragraph};

use crate::stats::{ChartSlice, CompletionStats};
use crate::tui::app::StatsState;
use crate::tui::widgets::color::Palette;

const BAR_WIDTH: usize = 40;

/// Proportional bar: one run of blocks per slice, widths summing to `width`
pub fn bar_segments(slices: &[ChartSlice], width: usize) -> Vec<usize> {
    let total = slices.iter().fold(0u64, |sum, s| sum.saturating_add(s.value));
    if total == 0 {
        return vec![0; slices.len()];
    }
    let mut segments: Vec<usize> = slices
        .iter()
        .map(|s| (s.value as f64 * width as f64 / total as f64).round() as usize)
        .collect();
    // rounding can overshoot or fall short by one
    let sum: usize = segments.iter().sum();
    if let Some(last) = segments.iter_mut().rev().find(|n| **n > 0) {
        *last = (*last + width).saturating_sub(sum);
    }
    segments
}

/// Legend line: `Completed: 3 (75.0%)`
pub fn legend_text(slice: &ChartSlice) -> String {
    format!("{}: {} ({:.1}%)", slice.label, slice.value, slice.percent)
}

pub fn render_stats_panel(f: &mut Frame, area: Rect, state: &StatsState, palette: &Palette) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Completion")
        .style(palette.base());
    let inner = block.inner(area);
    f.render_widget(block, area);

    let data = match (&state.data, &state.error, state.loading) {
        (Some(data), _, _) => *data,
        (None, Some(error), _) => {
            let text = Line::styled(format!("Could not load statistics: {}", error), palette.warning());
            f.render_widget(Paragraph::new(text), inner);
            return;
        }
        (None, None, _) => {
            f.render_widget(Paragraph::new(Line::styled("Loading...", palette.muted())), inner);
            return;
        }
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // total
            Constraint::Length(1),
            Constraint::Length(1), // bar
            Constraint::Length(1),
            Constraint::Length(2), // legend
            Constraint::Length(1),
            Constraint::Length(1), // gauge
            Constraint::Min(0),    // state notes
        ])
        .split(inner);

    f.render_widget(Paragraph::new(format!("Total tasks: {}", data.total())), chunks[0]);

    if data.total() == 0 {
        f.render_widget(Paragraph::new(Line::styled("No tasks yet", palette.muted())), chunks[2]);
    } else {
        f.render_widget(Paragraph::new(chart_bar(&data, palette)), chunks[2]);
    }

    let colors = slice_styles(palette);
    let legend: Vec<Line> = data
        .slices()
        .iter()
        .zip(colors)
        .map(|(slice, style)| Line::from(vec![Span::styled("■ ", style), Span::raw(legend_text(slice))]))
        .collect();
    f.render_widget(Paragraph::new(legend), chunks[4]);

    let ratio = data.completion_ratio().clamp(0.0, 1.0);
    let gauge = Gauge::default()
        .gauge_style(palette.accent())
        .ratio(ratio)
        .label(format!("{:.0}% done", ratio * 100.0));
    f.render_widget(gauge, chunks[6]);

    let note = match (state.loading, &state.error) {
        (true, _) => Some(Line::styled("Refreshing...", palette.muted())),
        (false, Some(error)) => Some(Line::styled(format!("Refresh failed: {}", error), palette.warning())),
        (false, None) => None,
    };
    if let Some(note) = note {
        f.render_widget(Paragraph::new(note), chunks[7]);
    }
}

fn slice_styles(palette: &Palette) -> [Style; 2] {
    [Style::default().fg(palette.accent), Style::default().fg(palette.warning)]
}

fn chart_bar(data: &CompletionStats, palette: &Palette) -> Line<'static> {
    let slices = data.slices();
    let spans: Vec<Span> = bar_segments(&slices, BAR_WIDTH)
        .into_iter()
        .zip(slice_styles(palette))
        .filter(|(width, _)| *width > 0)
        .map(|(width, style)| Span::styled("█".repeat(width), style.add_modifier(Modifier::BOLD)))
        .collect();
    Line::from(spans)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(completed: u64, uncompleted: u64) -> CompletionStats {
        CompletionStats { completed, uncompleted }
    }

    #[test]
    fn segments_fill_the_bar() {
        assert_eq!(bar_segments(&stats(1, 2).slices(), 40), vec![13, 27]);
        assert_eq!(bar_segments(&stats(3, 0).slices(), 40), vec![40, 0]);
        assert_eq!(bar_segments(&stats(0, 0).slices(), 40), vec![0, 0]);
    }

    #[test]
    fn legend_shows_count_and_share() {
        let slices = stats(3, 1).slices();
        assert_eq!(legend_text(&slices[0]), "Completed: 3 (75.0%)");
        assert_eq!(legend_text(&slices[1]), "Uncompleted: 1 (25.0%)");
    }
}
