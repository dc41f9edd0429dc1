//! The `chat` panel (spec §4.9): a scroll of recent conversation turns,
//! fed from `ConversationMemory` by the processing task via
//! `DashboardUpdate::ConversationUpdated`.

use crate::dashboard::state::DashboardState;
use ratatui::layout::Rect;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

pub fn render(frame: &mut Frame, area: Rect, state: &DashboardState) {
    let text = state
        .chat_lines
        .iter()
        .cloned()
        .collect::<Vec<_>>()
        .join("\n");

    let paragraph = Paragraph::new(text)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("Chat"));
    frame.render_widget(paragraph, area);
}
