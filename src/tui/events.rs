use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode, size as terminal_size,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use tracing::info;

use crate::models::SortField;
use crate::table::BulkAction;
use crate::tui::app::{App, Mode, Tab};
use crate::tui::error::TuiError;
use crate::tui::layout::Layout;
use crate::tui::widgets::editor::Editor;
use crate::utils::{ParsedKeyBinding, has_primary_modifier, parse_key_binding};

/// Restores the terminal on drop, including during a panic; a terminal left
/// in raw mode or on the alternate screen is unusable.
struct TerminalGuard {
    raw_mode_enabled: bool,
    alternate_screen_enabled: bool,
}

impl TerminalGuard {
    fn new() -> Result<Self, TuiError> {
        enable_raw_mode()?;
        execute!(io::stdout(), EnterAlternateScreen)?;
        Ok(Self {
            raw_mode_enabled: true,
            alternate_screen_enabled: true,
        })
    }

    /// Restore on normal exit; the guard does nothing afterwards
    fn restore(&mut self) -> Result<(), TuiError> {
        if self.raw_mode_enabled {
            disable_raw_mode()?;
            self.raw_mode_enabled = false;
        }
        if self.alternate_screen_enabled {
            execute!(io::stdout(), LeaveAlternateScreen)?;
            self.alternate_screen_enabled = false;
        }
        Ok(())
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        // already cleaning up, errors have nowhere to go
        if self.raw_mode_enabled {
            let _ = disable_raw_mode();
        }
        if self.alternate_screen_enabled {
            let _ = execute!(io::stdout(), LeaveAlternateScreen);
        }
    }
}

pub fn run_event_loop(mut app: App) -> Result<(), TuiError> {
    // Check before entering the alternate screen so the message stays visible
    let (width, height) = terminal_size()?;
    let min_width = Layout::MIN_WIDTH + 2;
    let min_height = Layout::MIN_HEIGHT + 2;
    if width < min_width || height < min_height {
        return Err(TuiError::RenderError(format!(
            "Terminal size too small. Current: {}x{}, Minimum required: {}x{}. Please resize your terminal window.",
            width, height, min_width, min_height
        )));
    }

    let mut guard = TerminalGuard::new()?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;
    info!("tui started");

    loop {
        app.update();

        let size = terminal.size()?;
        let terminal_rect = Rect::new(0, 0, size.width, size.height);
        terminal.draw(|f| {
            let layout = Layout::calculate(terminal_rect, app.ui.current_tab == Tab::Today);
            crate::tui::render::render(f, &mut app, &layout);
        })?;

        // Only Press events; Windows also reports Release
        if event::poll(Duration::from_millis(16))? {
            if let Event::Key(key_event) = event::read()? {
                if key_event.kind == KeyEventKind::Press && handle_key_event(&mut app, key_event)? {
                    break;
                }
            }
        }
    }

    guard.restore()?;
    info!("tui stopped");
    Ok(())
}

/// Dispatch a key press by mode. Returns true when the user quits.
pub fn handle_key_event(app: &mut App, key_event: KeyEvent) -> Result<bool, TuiError> {
    match app.ui.mode {
        Mode::Confirm => handle_confirm_mode(app, key_event),
        Mode::Help => handle_help_mode(app, key_event),
        Mode::Edit => handle_edit_mode(app, key_event),
        Mode::Filter => handle_filter_mode(app, key_event),
        Mode::Focus => handle_focus_mode(app, key_event),
        Mode::View => handle_view_mode(app, key_event),
    }
}

fn binding(key: &str) -> Result<ParsedKeyBinding, TuiError> {
    parse_key_binding(key).map_err(TuiError::KeyBindingError)
}

/// Whether `key_event` is the configured binding `key`
fn pressed(key_event: KeyEvent, key: &str) -> Result<bool, TuiError> {
    Ok(matches_key_event(key_event, &binding(key)?))
}

fn handle_view_mode(app: &mut App, key_event: KeyEvent) -> Result<bool, TuiError> {
    let keys = app.config.key_bindings.clone();

    if pressed(key_event, &keys.quit)? {
        return Ok(true);
    }
    if pressed(key_event, &keys.help)? {
        app.ui.mode = Mode::Help;
        return Ok(false);
    }
    if pressed(key_event, &keys.tab_right)? {
        app.next_tab();
        return Ok(false);
    }
    if pressed(key_event, &keys.tab_left)? {
        app.prev_tab();
        return Ok(false);
    }
    for (key, tab) in [(&keys.tab_1, Tab::Tasks), (&keys.tab_2, Tab::Today), (&keys.tab_3, Tab::Stats)] {
        if pressed(key_event, key)? {
            app.switch_tab(tab);
            return Ok(false);
        }
    }
    if pressed(key_event, &keys.reload)? {
        app.reload();
        return Ok(false);
    }
    if pressed(key_event, &keys.cycle_theme)? {
        app.cycle_theme();
        return Ok(false);
    }

    let tab = app.ui.current_tab;
    if tab == Tab::Stats {
        return Ok(false);
    }

    if key_event.code == KeyCode::Up || pressed(key_event, &keys.list_up)? {
        app.move_up();
    } else if key_event.code == KeyCode::Down || pressed(key_event, &keys.list_down)? {
        app.move_down();
    } else if pressed(key_event, &keys.new)? {
        app.open_create_form();
    } else if pressed(key_event, &keys.edit)? || key_event.code == KeyCode::Enter {
        app.open_edit_form();
    } else if pressed(key_event, &keys.delete)? {
        app.request_delete();
    } else if pressed(key_event, &keys.toggle_task_status)? {
        app.toggle_status();
    } else if pressed(key_event, &keys.select)? {
        app.toggle_selection();
    } else if pressed(key_event, &keys.clear_selection)? {
        app.clear_selection();
    } else if pressed(key_event, &keys.toggle_today)? {
        app.toggle_today();
    } else if pressed(key_event, &keys.remove_from_today)? {
        app.request_bulk(BulkAction::RemoveFromToday);
    } else if pressed(key_event, &keys.next_page)? {
        app.next_page();
    } else if pressed(key_event, &keys.prev_page)? {
        app.prev_page();
    } else if pressed(key_event, &keys.focus_timer)? {
        app.open_focus();
    } else if tab == Tab::Tasks {
        handle_task_list_keys(app, key_event, &keys)?;
    } else {
        handle_today_keys(app, key_event, &keys)?;
    }
    Ok(false)
}

/// Keys only the full task list understands
fn handle_task_list_keys(
    app: &mut App,
    key_event: KeyEvent,
    keys: &crate::config::KeyBindings,
) -> Result<(), TuiError> {
    if pressed(key_event, &keys.add_to_today)? {
        app.request_bulk(BulkAction::AddToToday);
    } else if pressed(key_event, &keys.delete_completed)? {
        app.request_bulk(BulkAction::DeleteCompleted);
    } else if pressed(key_event, &keys.filter)? {
        app.open_filter();
    } else if pressed(key_event, &keys.sort_due)? {
        app.sort_by(SortField::DueDate);
    } else if pressed(key_event, &keys.sort_created)? {
        app.sort_by(SortField::CreatedAt);
    }
    Ok(())
}

/// Assistant panel keys on the Today tab
fn handle_today_keys(app: &mut App, key_event: KeyEvent, keys: &crate::config::KeyBindings) -> Result<(), TuiError> {
    if pressed(key_event, &keys.generate_suggestion)? {
        app.generate_suggestion();
    } else if pressed(key_event, &keys.copy_suggestion)? {
        app.copy_suggestion();
    } else if key_event.code == KeyCode::PageDown {
        app.scroll_suggestion(true);
    } else if key_event.code == KeyCode::PageUp {
        app.scroll_suggestion(false);
    }
    Ok(())
}

fn handle_help_mode(app: &mut App, key_event: KeyEvent) -> Result<bool, TuiError> {
    if key_event.code == KeyCode::Esc || pressed(key_event, &app.config.key_bindings.help)? {
        app.ui.mode = Mode::View;
    }
    Ok(false)
}

fn handle_confirm_mode(app: &mut App, key_event: KeyEvent) -> Result<bool, TuiError> {
    match key_event.code {
        KeyCode::Up | KeyCode::Down | KeyCode::Left | KeyCode::Right | KeyCode::Tab | KeyCode::BackTab => {
            app.confirm_toggle_selection();
        }
        KeyCode::Enter => app.confirm_accept(),
        KeyCode::Char('y') | KeyCode::Char('Y') => {
            if let Some(confirm) = app.confirm.as_mut() {
                confirm.selection = 0;
            }
            app.confirm_accept();
        }
        KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => app.confirm_cancel(),
        _ => {}
    }
    Ok(false)
}

fn handle_focus_mode(app: &mut App, key_event: KeyEvent) -> Result<bool, TuiError> {
    if key_event.code == KeyCode::Esc {
        app.request_close_focus();
    } else if key_event.code == KeyCode::Char(' ') || key_event.code == KeyCode::Enter {
        app.toggle_focus();
    } else if pressed(key_event, &app.config.key_bindings.timer_reset)? {
        app.reset_focus();
    }
    Ok(false)
}

fn handle_edit_mode(app: &mut App, key_event: KeyEvent) -> Result<bool, TuiError> {
    let keys = app.config.key_bindings.clone();
    if pressed(key_event, &keys.save)? {
        app.submit_form();
        return Ok(false);
    }

    let Some(form) = app.task_form.as_mut() else {
        app.ui.mode = Mode::View;
        return Ok(false);
    };
    if form.submitting {
        // only cancelling is possible while a save is in flight
        if key_event.code == KeyCode::Esc {
            app.cancel_form();
        }
        return Ok(false);
    }

    match key_event.code {
        KeyCode::Esc => app.cancel_form(),
        KeyCode::Tab => form.next_field(),
        KeyCode::BackTab => form.prev_field(),
        KeyCode::Enter if form.current_field != crate::tui::forms::TaskField::Description => {
            form.next_field();
        }
        _ => {
            if form.current_field.is_text() {
                if let Some(editor) = form.current_editor_mut() {
                    edit_text(editor, key_event, &keys)?;
                }
                let field = form.current_field;
                form.clear_error(field);
            } else {
                match key_event.code {
                    KeyCode::Left | KeyCode::Up => form.cycle_choice(false),
                    KeyCode::Right | KeyCode::Down | KeyCode::Char(' ') => form.cycle_choice(true),
                    _ => {}
                }
            }
        }
    }
    Ok(false)
}

fn handle_filter_mode(app: &mut App, key_event: KeyEvent) -> Result<bool, TuiError> {
    use crate::tui::forms::{FilterField, FilterOutcome};

    let keys = app.config.key_bindings.clone();
    let Some(form) = app.filter_form.as_mut() else {
        app.ui.mode = Mode::View;
        return Ok(false);
    };

    let outcome = match key_event.code {
        KeyCode::Esc => Some(FilterOutcome::Cancel),
        KeyCode::Tab => {
            form.next_field();
            None
        }
        KeyCode::BackTab => {
            form.prev_field();
            None
        }
        KeyCode::Enter => form.activate(),
        _ => {
            match form.current_field {
                FilterField::Category | FilterField::Status => match key_event.code {
                    KeyCode::Left | KeyCode::Up => form.cycle_choice(false),
                    KeyCode::Right | KeyCode::Down | KeyCode::Char(' ') => form.cycle_choice(true),
                    _ => {}
                },
                FilterField::Apply | FilterField::Clear | FilterField::Cancel => match key_event.code {
                    KeyCode::Left | KeyCode::Up => form.prev_field(),
                    KeyCode::Right | KeyCode::Down => form.next_field(),
                    _ => {}
                },
                _ => {
                    if let Some(editor) = form.current_editor_mut() {
                        edit_text(editor, key_event, &keys)?;
                    }
                }
            }
            form.error = None;
            None
        }
    };

    if let Some(outcome) = outcome {
        app.finish_filter(outcome);
    }
    Ok(false)
}

/// Cursor motion and text entry shared by every text field
fn edit_text(editor: &mut Editor, key_event: KeyEvent, keys: &crate::config::KeyBindings) -> Result<(), TuiError> {
    if pressed(key_event, &keys.word_left)? {
        editor.move_cursor_word_left();
        return Ok(());
    }
    if pressed(key_event, &keys.word_right)? {
        editor.move_cursor_word_right();
        return Ok(());
    }
    if has_primary_modifier(key_event.modifiers) {
        if key_event.code == KeyCode::Char('z') {
            editor.undo();
        }
        return Ok(());
    }
    match key_event.code {
        KeyCode::Char(c) => editor.insert_char(c),
        KeyCode::Enter => editor.insert_newline(),
        KeyCode::Backspace => editor.delete_char(),
        KeyCode::Delete => editor.delete_forward(),
        KeyCode::Left => editor.move_cursor_left(),
        KeyCode::Right => editor.move_cursor_right(),
        KeyCode::Up => editor.move_cursor_up(),
        KeyCode::Down => editor.move_cursor_down(),
        KeyCode::Home => editor.move_cursor_home(),
        KeyCode::End => editor.move_cursor_end(),
        _ => {}
    }
    Ok(())
}

fn matches_key_event(key_event: KeyEvent, binding: &ParsedKeyBinding) -> bool {
    // Ctrl on Windows/Linux, Option/Alt on macOS
    if binding.requires_ctrl != has_primary_modifier(key_event.modifiers) {
        return false;
    }
    // Shift is already part of the character ("D"), so it is not compared
    binding.key_code == key_event.code
}
