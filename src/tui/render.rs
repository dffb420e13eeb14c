use ratatui::Frame;
use ratatui::layout::Alignment;
use ratatui::widgets::{Block, Borders};

use crate::models::{Sort, SortOrder};
use crate::table::{LoadState, TaskTable};
use crate::tui::app::{App, Mode, Tab};
use crate::tui::layout::Layout;
use crate::tui::widgets::assistant_panel::render_assistant_panel;
use crate::tui::widgets::color::Palette;
use crate::tui::widgets::confirm::render_confirm;
use crate::tui::widgets::filter_modal::render_filter_modal;
use crate::tui::widgets::filters_box::render_filters_box;
use crate::tui::widgets::form::render_task_form;
use crate::tui::widgets::help::render_help;
use crate::tui::widgets::stats_panel::render_stats_panel;
use crate::tui::widgets::status_bar::render_status_bar;
use crate::tui::widgets::tabs::render_tabs;
use crate::tui::widgets::task_table::render_task_table;
use crate::tui::widgets::timer_modal::render_timer_modal;
use crate::utils::{self, format_key_binding_for_display as show};

pub fn render(f: &mut Frame, app: &mut App, layout: &Layout) {
    let palette = Palette::from_config(&app.config);
    let now = utils::now();

    let outer_block = Block::default()
        .borders(Borders::ALL)
        .title("TaskFocus")
        .title_alignment(Alignment::Center)
        .style(palette.base());
    f.render_widget(outer_block, f.area());

    let badges = [badge(&app.tasks), badge(&app.today), None];
    render_tabs(f, layout.tabs_area, app.ui.current_tab, badges, &palette);

    match app.ui.current_tab {
        Tab::Tasks => {
            render_task_table(f, layout.main_area, &app.tasks, &mut app.ui.tasks_view, &palette, now);
            let summary = format!("{} | {}", app.tasks.filters.summary(), sort_text(app.tasks.sort));
            render_filters_box(f, layout.filters_area, "Filters", &summary, &palette);
        }
        Tab::Today => {
            render_task_table(f, layout.main_area, &app.today, &mut app.ui.today_view, &palette, now);
            if layout.side_area.width > 0 {
                let generate_key = show(&app.config.key_bindings.generate_suggestion);
                render_assistant_panel(f, layout.side_area, &app.assistant, &generate_key, &palette);
            }
            let overdue = app.today.rows.iter().filter(|task| task.is_overdue(now)).count();
            let summary = format!(
                "{} planned for today | {} overdue on this page",
                app.today.total, overdue
            );
            render_filters_box(f, layout.filters_area, "Today", &summary, &palette);
        }
        Tab::Stats => {
            render_stats_panel(f, layout.main_area, &app.stats, &palette);
            let summary = format!(
                "Counts across all tasks | {}: refresh",
                show(&app.config.key_bindings.reload)
            );
            render_filters_box(f, layout.filters_area, "Statistics", &summary, &palette);
        }
    }

    let key_hints = get_key_hints(app);
    render_status_bar(f, layout.status_area, &app.status, &key_hints, &palette);

    let area = f.area();
    if app.ui.mode == Mode::Help {
        render_help(f, area, &app.config.key_bindings, &palette);
    }
    if let Some(form) = app.task_form.as_mut() {
        render_task_form(f, area, form, &palette);
    }
    if let Some(form) = app.filter_form.as_mut() {
        render_filter_modal(f, area, form, &palette);
    }
    if let Some(session) = app.focus.as_ref() {
        let reset_key = show(&app.config.key_bindings.timer_reset);
        render_timer_modal(f, area, session, &reset_key, &palette);
    }
    // confirmation always sits on top of whatever asked for it
    if let Some(confirm) = app.confirm.as_ref() {
        render_confirm(f, area, confirm, &palette);
    }
}

fn badge(table: &TaskTable) -> Option<u64> {
    matches!(table.load, LoadState::Loaded).then_some(table.total)
}

fn sort_text(sort: Option<Sort>) -> String {
    match sort {
        None => "Sort: server default".to_string(),
        Some(sort) => {
            let order = match sort.order {
                SortOrder::Asc => "ascending",
                SortOrder::Desc => "descending",
            };
            format!("Sort: {} {}", sort.field.label(), order)
        }
    }
}

fn get_key_hints(app: &App) -> Vec<String> {
    let keys = &app.config.key_bindings;
    let hint = |key: &str, action: &str| format!("{}: {}", show(key), action);
    match app.ui.mode {
        Mode::Help => vec!["Esc: Close help".to_string()],
        Mode::Edit => vec![
            "Tab: Next field".to_string(),
            hint(&keys.save, "Save"),
            "Esc: Cancel".to_string(),
        ],
        Mode::Filter => vec![
            "Tab: Next field".to_string(),
            "Enter: Apply".to_string(),
            "Esc: Cancel".to_string(),
        ],
        Mode::Confirm => vec!["y/Enter: Confirm".to_string(), "n/Esc: Cancel".to_string()],
        Mode::Focus => vec![
            "Space: Start/Pause".to_string(),
            hint(&keys.timer_reset, "Reset"),
            "Esc: Close".to_string(),
        ],
        Mode::View => {
            let mut hints = match app.ui.current_tab {
                Tab::Tasks => vec![
                    hint(&keys.new, "New"),
                    hint(&keys.edit, "Edit"),
                    hint(&keys.delete, "Delete"),
                    hint(&keys.toggle_task_status, "Done"),
                    hint(&keys.select, "Select"),
                    hint(&keys.add_to_today, "To today"),
                    hint(&keys.filter, "Filter"),
                    hint(&keys.sort_due, "Sort"),
                    hint(&keys.focus_timer, "Focus"),
                ],
                Tab::Today => vec![
                    hint(&keys.new, "New"),
                    hint(&keys.toggle_task_status, "Done"),
                    hint(&keys.select, "Select"),
                    hint(&keys.remove_from_today, "Remove"),
                    hint(&keys.generate_suggestion, "Plan"),
                    hint(&keys.copy_suggestion, "Copy"),
                    hint(&keys.focus_timer, "Focus"),
                ],
                Tab::Stats => vec![hint(&keys.reload, "Refresh")],
            };
            hints.push(hint(&keys.help, "Help"));
            hints.push(hint(&keys.quit, "Quit"));
            hints
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SortField;

    #[test]
    fn sort_text_names_field_and_direction() {
        assert_eq!(sort_text(None), "Sort: server default");
        let sort = Sort {
            field: SortField::DueDate,
            order: SortOrder::Desc,
        };
        assert_eq!(sort_text(Some(sort)), "Sort: Due date descending");
    }
}
