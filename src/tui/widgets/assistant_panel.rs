use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Modifier;
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

use crate::assistant::{SuggestionLine, format_suggestion};
use crate::tui::app::AssistantState;
use crate::tui::widgets::color::Palette;

/// Styled lines for a suggestion: numbered headings stand out, sub-items are indented
pub fn suggestion_lines(text: &str, palette: &Palette) -> Vec<Line<'static>> {
    format_suggestion(text)
        .into_iter()
        .map(|line| match line {
            SuggestionLine::Heading(text) => Line::styled(text, palette.accent().add_modifier(Modifier::BOLD)),
            SuggestionLine::SubItem(text) => Line::from(format!("  {}", text)),
            SuggestionLine::Paragraph(text) => Line::from(text),
            SuggestionLine::Blank => Line::from(""),
        })
        .collect()
}

/// Text shown while there is no suggestion to display
pub fn placeholder(state: &AssistantState, generate_key: &str) -> String {
    match (state.generating, state.retry) {
        (true, Some(attempt)) => format!("Retrying (attempt {} failed)...", attempt),
        (true, None) => "Generating a plan...".to_string(),
        (false, _) => format!("Press {} to plan today's tasks", generate_key),
    }
}

pub fn render_assistant_panel(
    f: &mut Frame,
    area: Rect,
    state: &AssistantState,
    generate_key: &str,
    palette: &Palette,
) {
    let title = if state.generating { "AI plan - working" } else { "AI plan" };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .style(palette.base());

    let mut lines = Vec::new();
    if let Some(error) = &state.error {
        lines.push(Line::styled(error.clone(), palette.warning()));
        lines.push(Line::from(""));
    }
    match &state.suggestion {
        Some(text) if !state.generating => lines.extend(suggestion_lines(text, palette)),
        _ => lines.push(Line::styled(placeholder(state, generate_key), palette.muted())),
    }

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((state.scroll, 0));
    f.render_widget(paragraph, area);
}
