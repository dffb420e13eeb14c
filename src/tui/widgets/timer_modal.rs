use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::Modifier;
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Clear, Gauge, Paragraph};

use crate::timer::{FocusSession, Phase};
use crate::tui::widgets::color::Palette;
use crate::tui::widgets::{popup_area_fixed, truncate};

pub fn render_timer_modal(f: &mut Frame, area: Rect, session: &FocusSession, reset_key: &str, palette: &Palette) {
    let popup = popup_area_fixed(area, 50, 11);
    f.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .title("Focus")
        .title_alignment(Alignment::Center)
        .style(palette.base());
    let inner = block.inner(popup);
    f.render_widget(block, popup);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // task
            Constraint::Length(1),
            Constraint::Length(1), // phase
            Constraint::Length(1), // clock
            Constraint::Length(1), // gauge
            Constraint::Length(1), // cycles
            Constraint::Min(1),    // hints
        ])
        .split(inner);

    let timer = &session.timer;
    let title = truncate(&session.task_title, inner.width as usize);
    f.render_widget(
        Paragraph::new(Line::styled(title, palette.accent().add_modifier(Modifier::BOLD))).alignment(Alignment::Center),
        chunks[0],
    );

    let phase_style = match timer.phase() {
        Phase::Work => palette.accent(),
        Phase::ShortBreak | Phase::LongBreak => palette.base().add_modifier(Modifier::ITALIC),
    };
    let state = if timer.is_running() { "" } else { " (paused)" };
    f.render_widget(
        Paragraph::new(Line::styled(format!("{}{}", timer.phase().label(), state), phase_style))
            .alignment(Alignment::Center),
        chunks[2],
    );
    f.render_widget(
        Paragraph::new(Line::styled(timer.display(), palette.base().add_modifier(Modifier::BOLD)))
            .alignment(Alignment::Center),
        chunks[3],
    );

    let gauge = Gauge::default()
        .gauge_style(palette.accent())
        .ratio(timer.progress().clamp(0.0, 1.0))
        .label("");
    f.render_widget(gauge, chunks[4]);

    f.render_widget(
        Paragraph::new(Line::from(format!("Completed sessions: {}", timer.completed_cycles())))
            .alignment(Alignment::Center),
        chunks[5],
    );

    let action = if timer.is_running() { "pause" } else { "start" };
    f.render_widget(
        Paragraph::new(Line::styled(format!("Space: {}  {}: reset  Esc: close", action, reset_key), palette.muted()))
            .alignment(Alignment::Center),
        chunks[6],
    );
}
