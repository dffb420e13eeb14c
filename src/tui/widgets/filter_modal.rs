use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::tui::forms::{FilterField, FilterForm};
use crate::tui::widgets::color::Palette;
use crate::tui::widgets::form::{render_choice_field, render_text_field};
use crate::tui::widgets::popup_area_fixed;

const BUTTONS: [(FilterField, &str); 3] = [
    (FilterField::Apply, "Apply"),
    (FilterField::Clear, "Clear"),
    (FilterField::Cancel, "Cancel"),
];

/// Filter popup for the full task list
pub fn render_filter_modal(f: &mut Frame, area: Rect, form: &mut FilterForm, palette: &Palette) {
    // five fields, button row, error line, border
    let popup = popup_area_fixed(area, 60, 5 * 3 + 1 + 1 + 2);
    f.render_widget(Clear, popup);

    let outer = Block::default()
        .borders(Borders::ALL)
        .title("Filters")
        .title_alignment(Alignment::Center)
        .style(palette.base());
    let inner = outer.inner(popup);
    f.render_widget(outer, popup);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Min(1),
        ])
        .split(inner);

    let current = form.current_field;
    render_text_field(
        f,
        chunks[0],
        "Title contains",
        &mut form.title,
        current == FilterField::Title,
        None,
        palette,
    );
    render_choice_field(
        f,
        chunks[1],
        "Category",
        form.category_text(),
        current == FilterField::Category,
        None,
        palette,
    );
    render_choice_field(
        f,
        chunks[2],
        "Status",
        form.status_text(),
        current == FilterField::Status,
        None,
        palette,
    );
    render_text_field(
        f,
        chunks[3],
        "Due from (YYYY-MM-DD)",
        &mut form.due_from,
        current == FilterField::DueFrom,
        None,
        palette,
    );
    render_text_field(
        f,
        chunks[4],
        "Due to (YYYY-MM-DD)",
        &mut form.due_to,
        current == FilterField::DueTo,
        None,
        palette,
    );

    f.render_widget(Paragraph::new(button_row(current, palette)).alignment(Alignment::Center), chunks[5]);

    if let Some(error) = &form.error {
        f.render_widget(Paragraph::new(Line::styled(error.clone(), palette.warning())), chunks[6]);
    }
}

fn button_row(current: FilterField, palette: &Palette) -> Line<'static> {
    let mut spans = Vec::new();
    for (index, (field, label)) in BUTTONS.into_iter().enumerate() {
        if index > 0 {
            spans.push(Span::raw("   "));
        }
        let style = if field == current {
            palette.highlight()
        } else {
            palette.base()
        };
        spans.push(Span::styled(format!("[ {} ]", label), style));
    }
    Line::from(spans)
}
