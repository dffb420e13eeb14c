use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use crate::tui::app::ConfirmState;
use crate::tui::widgets::color::Palette;
use crate::tui::widgets::popup_area_fixed;

const OPTIONS: [&str; 2] = ["Confirm", "Cancel"];

pub fn render_confirm(f: &mut Frame, area: Rect, state: &ConfirmState, palette: &Palette) {
    let popup = popup_area_fixed(area, 50, 7);
    f.render_widget(Clear, popup);

    let mut options = Vec::new();
    for (index, label) in OPTIONS.iter().enumerate() {
        if index > 0 {
            options.push(Span::raw("    "));
        }
        let style = if index == state.selection {
            palette.highlight()
        } else {
            palette.base()
        };
        options.push(Span::styled(format!("[ {} ]", label), style));
    }

    let text = vec![
        Line::from(state.prompt.clone()),
        Line::from(""),
        Line::from(options),
        Line::styled("y: confirm  n/Esc: cancel", palette.muted()),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .title("Confirm")
        .title_alignment(Alignment::Center)
        .border_style(palette.warning())
        .style(palette.base());
    f.render_widget(
        Paragraph::new(text)
            .block(block)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        popup,
    );
}
