use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::tui::forms::{TaskField, TaskForm};
use crate::tui::widgets::color::Palette;
use crate::tui::widgets::editor::Editor;
use crate::tui::widgets::popup_area_fixed;

const DESCRIPTION_LINES: u16 = 3;

fn field_block<'a>(label: &'a str, focused: bool, error: Option<&'a str>, palette: &Palette) -> Block<'a> {
    let border_style = if error.is_some() {
        palette.warning()
    } else if focused {
        palette.accent().add_modifier(Modifier::BOLD)
    } else {
        palette.base()
    };
    let mut title = vec![Span::raw(label)];
    if let Some(error) = error {
        title.push(Span::styled(format!(" - {}", error), palette.warning()));
    }
    Block::default()
        .borders(Borders::ALL)
        .title(Line::from(title))
        .border_style(border_style)
        .style(palette.base())
}

/// Bordered text input; places the terminal cursor when focused
pub fn render_text_field(
    f: &mut Frame,
    area: Rect,
    label: &str,
    editor: &mut Editor,
    focused: bool,
    error: Option<&str>,
    palette: &Palette,
) {
    let block = field_block(label, focused, error, palette);
    let inner = block.inner(area);
    editor.update_scroll(inner.height as usize, inner.width as usize);

    let lines: Vec<Line> = editor
        .visible_lines(inner.height as usize, inner.width as usize)
        .into_iter()
        .map(Line::from)
        .collect();
    f.render_widget(Paragraph::new(lines).block(block).style(palette.base()), area);

    if focused {
        if let Some(position) = editor.cursor_screen_pos(inner) {
            f.set_cursor_position(position);
        }
    }
}

/// Bordered field cycling through fixed values with ←/→
pub fn render_choice_field(
    f: &mut Frame,
    area: Rect,
    label: &str,
    value: &str,
    focused: bool,
    error: Option<&str>,
    palette: &Palette,
) {
    let text = if focused {
        Line::from(vec![
            Span::styled("< ", palette.accent()),
            Span::styled(value.to_string(), palette.highlight()),
            Span::styled(" >", palette.accent()),
        ])
    } else {
        Line::from(value.to_string())
    };
    let block = field_block(label, focused, error, palette);
    f.render_widget(Paragraph::new(text).block(block).style(palette.base()), area);
}

pub fn render_task_form(f: &mut Frame, area: Rect, form: &mut TaskForm, palette: &Palette) {
    let field_heights: Vec<u16> = TaskField::ORDER
        .iter()
        .map(|field| match field {
            TaskField::Description => DESCRIPTION_LINES + 2,
            _ => 3,
        })
        .collect();
    // fields + footer + outer border
    let height = field_heights.iter().sum::<u16>() + 2 + 2;
    let popup = popup_area_fixed(area, 70, height);
    f.render_widget(Clear, popup);

    let outer = Block::default()
        .borders(Borders::ALL)
        .title(form.title_text())
        .title_alignment(ratatui::layout::Alignment::Center)
        .style(palette.base());
    let inner = outer.inner(popup);
    f.render_widget(outer, popup);

    let mut constraints: Vec<Constraint> = field_heights.iter().map(|h| Constraint::Length(*h)).collect();
    constraints.push(Constraint::Min(1));
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(inner);

    for (index, field) in TaskField::ORDER.into_iter().enumerate() {
        let focused = form.current_field == field;
        let error = form.error_for(field).map(str::to_string);
        if field.is_text() {
            let label = field.label();
            if let Some(editor) = form.editor_mut(field) {
                render_text_field(f, chunks[index], label, editor, focused, error.as_deref(), palette);
            }
        } else {
            let value = form.choice_text(field);
            render_choice_field(f, chunks[index], field.label(), &value, focused, error.as_deref(), palette);
        }
    }

    let footer = match (&form.submit_error, form.submitting) {
        (_, true) => Line::styled("Saving...", palette.muted()),
        (Some(error), false) => Line::styled(error.clone(), palette.warning()),
        (None, false) => Line::styled(
            "Tab: next field  ←/→: change choice  Ctrl+s: save  Esc: cancel",
            Style::default().fg(palette.fg),
        ),
    };
    if let Some(area) = chunks.last() {
        f.render_widget(Paragraph::new(footer), *area);
    }
}
