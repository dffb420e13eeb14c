use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::Tabs;

use crate::tui::app::Tab;
use crate::tui::widgets::color::{Palette, get_contrast_text_color};

/// Tab bar; `badges` holds the row total shown next to each list tab
pub fn render_tabs(f: &mut Frame, area: Rect, current_tab: Tab, badges: [Option<u64>; 3], palette: &Palette) {
    // non-selected tabs read on tab_bg whatever the terminal does with gray
    let tab_fg = get_contrast_text_color(palette.tab_bg);
    let box_style = Style::default().bg(palette.tab_bg);

    let titles: Vec<Line> = Tab::ALL
        .iter()
        .zip(badges)
        .map(|(tab, badge)| {
            let label = match badge {
                Some(count) => format!("{} ({})", tab.title(), count),
                None => tab.title().to_string(),
            };
            Line::from(vec![
                Span::styled("  ", box_style),
                Span::styled(label, Style::default().fg(tab_fg).bg(palette.tab_bg)),
                Span::styled("  ", box_style),
            ])
        })
        .collect();

    let tabs = Tabs::new(titles)
        .select(current_tab.index())
        .style(palette.base())
        .highlight_style(palette.highlight())
        .divider("  ")
        .padding("", "");

    f.render_widget(tabs, area);
}
