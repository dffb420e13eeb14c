use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::widgets::Paragraph;

use crate::tui::app::{NoticeLevel, StatusState};
use crate::tui::widgets::color::{Palette, get_contrast_text_color};
use crate::tui::widgets::truncate;

const SEPARATOR: &str = " • ";
const ELLIPSIS: &str = "...";

pub fn render_status_bar(f: &mut Frame, area: Rect, status: &StatusState, key_hints: &[String], palette: &Palette) {
    let width = area.width as usize;
    let (content, style) = match status.message.as_deref() {
        Some(message) => {
            let bg = match status.level {
                NoticeLevel::Info => palette.highlight_bg,
                NoticeLevel::Error => palette.warning,
            };
            let style = Style::default()
                .fg(get_contrast_text_color(bg))
                .bg(bg)
                .add_modifier(Modifier::BOLD);
            (truncate(message, width), style)
        }
        None => (fit_hints(key_hints, width), palette.base()),
    };

    f.render_widget(Paragraph::new(content).style(style), area);
}

/// Join as many hints as fit in `max_width`, ending with "..." when some are dropped
pub fn fit_hints(hints: &[String], max_width: usize) -> String {
    let mut text = String::new();
    for (i, hint) in hints.iter().enumerate() {
        let current = text.chars().count();
        let needed = if i == 0 {
            hint.chars().count()
        } else {
            current + SEPARATOR.chars().count() + hint.chars().count()
        };

        if needed > max_width {
            if i == 0 {
                return truncate(hint, max_width);
            }
            if current + ELLIPSIS.len() <= max_width {
                text.push_str(ELLIPSIS);
            } else {
                text = truncate(&text, max_width);
            }
            return text;
        }

        if i > 0 {
            text.push_str(SEPARATOR);
        }
        text.push_str(hint);
    }
    text
}
