//! Layout composition and key handling (spec §4.9 Controls, Responsive
//! layout). Grounded on ColdVox's `draw_ui`/`run_app` split: one function
//! builds the `Layout` and delegates to per-widget render functions,
//! another turns crossterm key events into typed commands the caller
//! (the [`super::Dashboard`] run loop) applies.

use super::panel::{visible_panels, PanelKind};
use super::state::{DashboardState, Mode};
use super::widgets::{activity_feed, chat, placeholder, settings, status, visualizer};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::Frame;
use std::time::Instant;

/// A command produced by a key event for the Supervisor/UI task to act on
/// (spec §4.9 Controls table).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DashboardCommand {
    StartVoice,
    ToggleSettings,
    SelectPersona(String),
    SettingsCursorUp,
    SettingsCursorDown,
    CycleMode,
    CopyStateDump,
    Shutdown,
}

/// Translate one crossterm key event into a command, given the current
/// state (the settings view changes what `Up`/`Down`/`Enter` mean).
pub fn handle_key(key: KeyEvent, state: &DashboardState) -> Option<DashboardCommand> {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Some(DashboardCommand::Shutdown);
    }

    if state.settings.open {
        return match key.code {
            KeyCode::Up => Some(DashboardCommand::SettingsCursorUp),
            KeyCode::Down => Some(DashboardCommand::SettingsCursorDown),
            KeyCode::Enter => state
                .settings
                .selected_label()
                .map(|label| DashboardCommand::SelectPersona(label.to_owned())),
            KeyCode::Esc | KeyCode::Char('s') | KeyCode::Char('S') => {
                Some(DashboardCommand::ToggleSettings)
            }
            _ => None,
        };
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Some(DashboardCommand::Shutdown),
        KeyCode::Char('v') | KeyCode::Char('V') => Some(DashboardCommand::StartVoice),
        KeyCode::Char('s') => Some(DashboardCommand::ToggleSettings),
        KeyCode::Char('S') => Some(DashboardCommand::CopyStateDump),
        KeyCode::Char(' ') if state.dev_mode => Some(DashboardCommand::CycleMode),
        _ => None,
    }
}

/// Apply a cycle-mode command (dev mode only, spec §4.9: "SPACE — cycle
/// mode (dev: idle -> listening -> speaking -> thinking -> idle)").
pub fn apply_dev_cycle(state: &mut DashboardState) {
    state.mode = state.mode.cycle();
}

/// `"<header>\n<user>\n<status>\n<stats>\n<recent events>"` (spec §4.9
/// `Shift-S`: "copy a formatted state dump ... to the system clipboard").
pub fn format_state_dump(state: &DashboardState) -> String {
    let mut out = String::new();
    out.push_str("xswarm state dump\n");
    out.push_str(&format!("persona: {}\n", state.status.active_persona_name));
    out.push_str(&format!("mode: {}\n", state.mode.label()));
    out.push_str(&format!("stats: {}\n", state.stats_summary));
    out.push_str("recent events:\n");
    for event in state.visible_events() {
        out.push_str(&format!("  [{}] {}\n", event.time_label(), event.message));
    }
    out
}

fn enabled_panels(state: &DashboardState) -> Vec<PanelKind> {
    // Core panels are always enabled; the grid panels named in config
    // would be threaded in here by the binary once a real config layer
    // resolves `layout.enabled_panels` (spec §6.3).
    let _ = state;
    vec![PanelKind::Visualizer, PanelKind::Status, PanelKind::ActivityFeed, PanelKind::Chat]
}

pub fn draw(
    frame: &mut Frame,
    state: &DashboardState,
    breakpoints: &[u16; 4],
    started_at: Instant,
) {
    let area = frame.area();

    if state.settings.open {
        settings::render(frame, area, state);
        return;
    }

    let panels = visible_panels(area.width, &enabled_panels(state), breakpoints);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(5)])
        .split(area);

    render_panel_in(frame, rows[0], PanelKind::Status, state, started_at, &panels);

    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(30), Constraint::Percentage(30)])
        .split(rows[1]);

    render_panel_in(frame, bottom[0], PanelKind::Visualizer, state, started_at, &panels);
    render_panel_in(frame, bottom[1], PanelKind::ActivityFeed, state, started_at, &panels);
    render_panel_in(frame, bottom[2], PanelKind::Chat, state, started_at, &panels);
}

fn render_panel_in(
    frame: &mut Frame,
    area: Rect,
    panel: PanelKind,
    state: &DashboardState,
    started_at: Instant,
    visible: &[PanelKind],
) {
    if !visible.contains(&panel) {
        return;
    }
    match panel {
        PanelKind::Status => status::render(frame, area, state),
        PanelKind::Visualizer => visualizer::render(frame, area, state, started_at),
        PanelKind::ActivityFeed => activity_feed::render(frame, area, state),
        PanelKind::Chat => chat::render(frame, area, state),
        other => placeholder::render(frame, area, other),
    }
}
