use ratatui::layout::{Constraint, Direction, Layout as RatLayout, Rect};

pub struct Layout {
    pub inner_area: Rect, // inside the outer border
    pub tabs_area: Rect,
    pub main_area: Rect,
    /// Right-hand assistant panel; zero-width unless requested
    pub side_area: Rect,
    pub filters_area: Rect,
    pub status_area: Rect,
}

impl Layout {
    /// Smallest usable terminal, without the outer border.
    /// Height: tabs 1 + content 3 + info box 3 + status 1 + 2 spare.
    pub const MIN_WIDTH: u16 = 60;
    pub const MIN_HEIGHT: u16 = 10;

    /// Share of the content width given to the assistant panel
    pub const SIDE_PERCENT: u16 = 40;

    pub fn calculate(size: Rect, with_side_panel: bool) -> Self {
        let width = size.width.max(Self::MIN_WIDTH + 2);
        let height = size.height.max(Self::MIN_HEIGHT + 2);
        let size = Rect::new(size.x, size.y, width, height);

        let inner_area = Rect::new(
            size.x + 1,
            size.y + 1,
            size.width.saturating_sub(2),
            size.height.saturating_sub(2),
        );

        let vertical = RatLayout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // tabs
                Constraint::Min(3),    // content
                Constraint::Length(3), // filter / info box
                Constraint::Length(1), // status
            ])
            .split(inner_area);

        let side_percent = if with_side_panel { Self::SIDE_PERCENT } else { 0 };
        let horizontal = RatLayout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(100 - side_percent),
                Constraint::Percentage(side_percent),
            ])
            .split(vertical[1]);

        Self {
            inner_area,
            tabs_area: vertical[0],
            main_area: horizontal[0],
            side_area: horizontal[1],
            filters_area: vertical[2],
            status_area: vertical[3],
        }
    }
}
