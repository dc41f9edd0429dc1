//! Stand-in renderer for named panels the panel-base abstraction
//! supports but this core doesn't implement content for yet
//! (`documents`, `todo`, `projects`, `calendar`, `notifications` —
//! spec §4.9).

use crate::dashboard::panel::PanelKind;
use ratatui::layout::Rect;
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

pub fn render(frame: &mut Frame, area: Rect, panel: PanelKind) {
    let paragraph = Paragraph::new("not yet implemented")
        .block(Block::default().borders(Borders::ALL).title(panel.config_name()));
    frame.render_widget(paragraph, area);
}
