//! Scrolling activity feed (spec §4.9): the last
//! [`ACTIVITY_FEED_VISIBLE`](crate::dashboard::state::ACTIVITY_FEED_VISIBLE)
//! events, newest at the bottom, each timestamped `HH:MM:SS` local time.

use crate::dashboard::state::{DashboardState, EventKind};
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem};
use ratatui::Frame;

fn color_for(kind: EventKind) -> Color {
    match kind {
        EventKind::Info => Color::Gray,
        EventKind::UserSpeech => Color::Cyan,
        EventKind::AssistantSpeech => Color::Green,
        EventKind::Warning => Color::Yellow,
        EventKind::Error => Color::Red,
    }
}

pub fn render(frame: &mut Frame, area: Rect, state: &DashboardState) {
    let items: Vec<ListItem> = state
        .visible_events()
        .map(|event| {
            let line = Line::from(vec![
                Span::styled(format!("[{}] ", event.time_label()), Style::default().fg(Color::DarkGray)),
                Span::styled(event.message.clone(), Style::default().fg(color_for(event.kind))),
            ]);
            ListItem::new(line)
        })
        .collect();

    let list = List::new(items).block(Block::default().borders(Borders::ALL).title("Activity"));
    frame.render_widget(list, area);
}
