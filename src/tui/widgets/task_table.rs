use chrono::NaiveDateTime;
use ratatui::Frame;
use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState};

use crate::models::Task;
use crate::table::{ListScope, LoadState, TaskTable};
use crate::tui::widgets::color::Palette;
use crate::utils::format_date;

/// Cells of one row: marker, title, category, due, today, status
pub fn row_cells(task: &Task, selected: bool, overdue: bool) -> [String; 6] {
    let marker = match (selected, task.is_completed()) {
        (true, _) => "[x]",
        (false, true) => " ✓ ",
        (false, false) => " ○ ",
    };
    let due = match (format_date(task.due_day()), overdue) {
        (due, true) => format!("{} !", due),
        (due, false) => due,
    };
    [
        marker.to_string(),
        task.title.clone(),
        task.category.map(|c| c.label().to_string()).unwrap_or_default(),
        due,
        if task.is_today_task { "★" } else { "" }.to_string(),
        task.status.label().to_string(),
    ]
}

/// Block title: list name, total, page and load state
pub fn table_title(table: &TaskTable) -> String {
    let name = match table.scope {
        ListScope::All => "All tasks",
        ListScope::Today => "Today's tasks",
    };
    let mut title = format!(
        "{} ({}) - page {} of {}",
        name,
        table.total,
        table.current,
        table.total_pages()
    );
    if table.selection_len() > 0 {
        title.push_str(&format!(" - {} selected", table.selection_len()));
    }
    if table.is_loading() {
        title.push_str(" - loading...");
    }
    title
}

pub fn render_task_table(
    f: &mut Frame,
    area: Rect,
    table: &TaskTable,
    view: &mut TableState,
    palette: &Palette,
    now: NaiveDateTime,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(table_title(table))
        .style(palette.base());

    if table.rows.is_empty() {
        let (text, style) = match &table.load {
            LoadState::Failed(message) => (format!("Could not load tasks: {}", message), palette.warning()),
            LoadState::Loading | LoadState::Idle => ("Loading...".to_string(), palette.muted()),
            LoadState::Loaded => ("No tasks".to_string(), palette.muted()),
        };
        f.render_widget(Paragraph::new(Line::styled(text, style)).block(block), area);
        return;
    }

    // only the today list flags overdue rows
    let flag_overdue = table.scope == ListScope::Today;
    let rows: Vec<Row> = table
        .rows
        .iter()
        .map(|task| {
            let selected = task.id.is_some_and(|id| table.is_selected(id));
            let overdue = flag_overdue && task.is_overdue(now);
            let style = if overdue {
                palette.warning()
            } else if task.is_completed() {
                palette.muted()
            } else {
                palette.base()
            };
            Row::new(row_cells(task, selected, overdue).map(Cell::from)).style(style)
        })
        .collect();

    let header = Row::new(["", "Title", "Category", "Due", "Today", "Status"])
        .style(palette.accent().add_modifier(Modifier::BOLD));
    let widths = [
        Constraint::Length(3),
        Constraint::Min(12),
        Constraint::Length(9),
        Constraint::Length(12),
        Constraint::Length(5),
        Constraint::Length(13),
    ];

    let widget = Table::new(rows, widths)
        .header(header)
        .block(block)
        .style(palette.base())
        .row_highlight_style(palette.highlight())
        .highlight_symbol("> ");

    view.select(Some(table.cursor.min(table.rows.len() - 1)));
    f.render_stateful_widget(widget, area, view);

    // failures after a successful load keep the rows, so say so in the border
    if let LoadState::Failed(_) = table.load {
        let hint = Line::styled(" stale: reload failed ", Style::default().fg(palette.warning));
        let y = area.bottom().saturating_sub(1);
        let width = (hint.width() as u16).min(area.width.saturating_sub(2));
        f.render_widget(Paragraph::new(hint), Rect::new(area.x + 1, y, width, 1));
    }
}
