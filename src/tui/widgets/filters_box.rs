use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

use crate::tui::widgets::color::Palette;

/// One-line box under the content: active filters, sort and paging
pub fn render_filters_box(f: &mut Frame, area: Rect, title: &str, summary: &str, palette: &Palette) {
    let paragraph = Paragraph::new(summary)
        .block(Block::default().borders(Borders::ALL).title(title).style(palette.base()))
        .style(palette.base())
        .wrap(Wrap { trim: true });

    f.render_widget(paragraph, area);
}
