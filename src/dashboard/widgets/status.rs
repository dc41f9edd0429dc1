//! Status widget (spec §4.9): device label, color-coded mode, active
//! persona, and the last detected wake word — plus the error banner when
//! `DashboardState::error_banner` is set (spec §7: category + remediation,
//! never a raw platform error string).

use crate::dashboard::state::DashboardState;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

pub fn render(frame: &mut Frame, area: Rect, state: &DashboardState) {
    let mut lines = vec![
        Line::from(vec![
            Span::raw("Device: "),
            Span::raw(state.status.device_label.clone()),
        ]),
        Line::from(vec![
            Span::raw("Mode: "),
            Span::styled(
                state.mode.label(),
                Style::default().fg(state.mode.color()).add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![
            Span::raw("Persona: "),
            Span::raw(state.status.active_persona_name.clone()),
        ]),
    ];

    if let Some(word) = state.status.last_wake_word() {
        lines.push(Line::from(format!("Wake Word: '{word}'")));
    }

    if let Some((category, remediation)) = state.error_banner {
        lines.push(Line::from(Span::styled(
            format!("{category} — {remediation}"),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )));
    }

    if state.dev_mode {
        lines.push(Line::from(Span::styled(
            "DEV MODE",
            Style::default().fg(Color::Black).bg(Color::Yellow),
        )));
    }

    let paragraph = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Status"));
    frame.render_widget(paragraph, area);
}
