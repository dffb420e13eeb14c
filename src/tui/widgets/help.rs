use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::Modifier;
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use crate::config::KeyBindings;
use crate::tui::widgets::color::Palette;
use crate::tui::widgets::popup_area;
use crate::utils::format_key_binding_for_display as show;

pub fn render_help(f: &mut Frame, area: Rect, keys: &KeyBindings, palette: &Palette) {
    let popup = popup_area(area, 60, 80);
    f.render_widget(Clear, popup);

    let lines: Vec<Line> = help_sections(keys)
        .into_iter()
        .flat_map(|(heading, entries)| {
            let mut lines = vec![Line::styled(heading, palette.accent().add_modifier(Modifier::BOLD))];
            lines.extend(entries.into_iter().map(|(key, action)| Line::from(format!("  {}: {}", key, action))));
            lines.push(Line::from(""));
            lines
        })
        .collect();

    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Help - Key Bindings")
                .title_alignment(Alignment::Center)
                .style(palette.base()),
        )
        .style(palette.base())
        .wrap(Wrap { trim: false });
    f.render_widget(paragraph, popup);
}

type Section = (&'static str, Vec<(String, &'static str)>);

/// Help sections built from the configured bindings
pub fn help_sections(keys: &KeyBindings) -> Vec<Section> {
    let pair = |a: &str, b: &str| format!("{} / {}", show(a), show(b));
    vec![
        (
            "Navigation",
            vec![
                (pair(&keys.tab_left, &keys.tab_right), "Switch tabs"),
                (
                    format!("{} / {} / {}", show(&keys.tab_1), show(&keys.tab_2), show(&keys.tab_3)),
                    "Jump to tab",
                ),
                (pair(&keys.list_up, &keys.list_down), "Move up/down"),
                (pair(&keys.prev_page, &keys.next_page), "Previous/next page"),
                (show(&keys.reload), "Reload"),
            ],
        ),
        (
            "Tasks",
            vec![
                (show(&keys.new), "New task"),
                (format!("{} / Enter", show(&keys.edit)), "Edit task"),
                (show(&keys.delete), "Delete selected tasks (or the current one)"),
                (show(&keys.toggle_task_status), "Toggle completed"),
                (show(&keys.toggle_today), "Toggle today's list"),
                (show(&keys.select), "Select row"),
                (show(&keys.clear_selection), "Clear selection"),
                (show(&keys.focus_timer), "Focus timer"),
            ],
        ),
        (
            "All tasks tab",
            vec![
                (show(&keys.add_to_today), "Add selected to today"),
                (show(&keys.delete_completed), "Delete completed tasks"),
                (show(&keys.filter), "Filters"),
                (show(&keys.sort_due), "Sort by due date"),
                (show(&keys.sort_created), "Sort by creation date"),
            ],
        ),
        (
            "Today tab",
            vec![
                (show(&keys.remove_from_today), "Remove selected from today"),
                (show(&keys.generate_suggestion), "Generate plan"),
                (show(&keys.copy_suggestion), "Copy plan"),
                ("PgUp / PgDn".to_string(), "Scroll plan"),
            ],
        ),
        (
            "Forms",
            vec![
                ("Tab / Shift+Tab".to_string(), "Next/previous field"),
                (show(&keys.save), "Save"),
                ("←/→".to_string(), "Change choice"),
                ("Esc".to_string(), "Cancel"),
            ],
        ),
        (
            "Focus timer",
            vec![
                ("Space".to_string(), "Start/pause"),
                (show(&keys.timer_reset), "Reset"),
                ("Esc".to_string(), "Close"),
            ],
        ),
        (
            "General",
            vec![
                (show(&keys.cycle_theme), "Next theme"),
                (show(&keys.help), "Toggle help"),
                (show(&keys.quit), "Quit"),
            ],
        ),
    ]
}
