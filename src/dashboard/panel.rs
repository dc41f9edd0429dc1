//! Declarative responsive panel layout (spec §4.9): six named panels with
//! breakpoints at 40/60/80/120 columns, hiding in a fixed order as the
//! terminal narrows. The core ships four real panels (`chat`, `status`,
//! `activity_feed`, `visualizer`); the other two named panels
//! (`documents`, `todo`, `projects`, `calendar`, `notifications`) use the
//! same [`PanelKind`]/breakpoint machinery as placeholders for panels a
//! future layer can fill in — the abstraction, not their content, is in
//! scope here.

/// One named panel slot (spec §4.9: "six named panels").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PanelKind {
    Chat,
    Documents,
    Todo,
    Projects,
    Calendar,
    Notifications,
    Status,
    ActivityFeed,
    Visualizer,
}

impl PanelKind {
    pub fn config_name(self) -> &'static str {
        match self {
            PanelKind::Chat => "chat",
            PanelKind::Documents => "documents",
            PanelKind::Todo => "todo",
            PanelKind::Projects => "projects",
            PanelKind::Calendar => "calendar",
            PanelKind::Notifications => "notifications",
            PanelKind::Status => "status",
            PanelKind::ActivityFeed => "activity_feed",
            PanelKind::Visualizer => "visualizer",
        }
    }

    pub fn from_config_name(name: &str) -> Option<Self> {
        match name {
            "chat" => Some(PanelKind::Chat),
            "documents" => Some(PanelKind::Documents),
            "todo" => Some(PanelKind::Todo),
            "projects" => Some(PanelKind::Projects),
            "calendar" => Some(PanelKind::Calendar),
            "notifications" => Some(PanelKind::Notifications),
            "status" => Some(PanelKind::Status),
            "activity_feed" => Some(PanelKind::ActivityFeed),
            "visualizer" => Some(PanelKind::Visualizer),
            _ => None,
        }
    }

    /// Minimum terminal width (columns) at which this panel stays visible.
    /// Core panels (status/activity feed/visualizer) are always shown;
    /// the six named grid panels hide in the order spec §4.9 lists them
    /// as the terminal narrows past the 40/60/80/120 breakpoints.
    pub fn min_width(self, breakpoints: &[u16; 4]) -> u16 {
        match self {
            PanelKind::Status | PanelKind::ActivityFeed | PanelKind::Visualizer => 0,
            PanelKind::Chat => breakpoints[0],
            PanelKind::Documents | PanelKind::Todo => breakpoints[1],
            PanelKind::Projects | PanelKind::Calendar => breakpoints[2],
            PanelKind::Notifications => breakpoints[3],
        }
    }
}

/// Which of `enabled` panels fit at `width` columns, in their original
/// order (spec §4.9: "panels hide according to width in that order").
pub fn visible_panels(width: u16, enabled: &[PanelKind], breakpoints: &[u16; 4]) -> Vec<PanelKind> {
    enabled
        .iter()
        .copied()
        .filter(|panel| width >= panel.min_width(breakpoints))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const BP: [u16; 4] = [40, 60, 80, 120];

    #[test]
    fn narrow_terminal_hides_wide_panels_first() {
        let enabled = [PanelKind::Chat, PanelKind::Documents, PanelKind::Notifications];
        let visible = visible_panels(50, &enabled, &BP);
        assert_eq!(visible, vec![PanelKind::Chat]);
    }

    #[test]
    fn wide_terminal_shows_everything_enabled() {
        let enabled = [PanelKind::Chat, PanelKind::Documents, PanelKind::Notifications];
        let visible = visible_panels(200, &enabled, &BP);
        assert_eq!(visible.len(), 3);
    }

    #[test]
    fn core_panels_always_visible_regardless_of_width() {
        let enabled = [PanelKind::Status, PanelKind::ActivityFeed, PanelKind::Visualizer];
        assert_eq!(visible_panels(10, &enabled, &BP).len(), 3);
    }

    #[test]
    fn config_name_round_trips() {
        for panel in [PanelKind::Chat, PanelKind::Todo, PanelKind::Notifications] {
            assert_eq!(PanelKind::from_config_name(panel.config_name()), Some(panel));
        }
    }
}
