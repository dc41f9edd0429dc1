//! Dashboard reactive state (spec §3 `DashboardState`, §4.9).
//!
//! The processing task posts typed updates; the UI task folds them into
//! this struct between renders (spec §4.10: "a reactive store"). Grounded
//! on the shape of ColdVox's `DashboardState` (mode flags, ring-buffered
//! log/event history, a `metrics` snapshot) but generalized to the five
//! modes and moving-average amplitude smoothing this spec requires.

use crate::persona::PersonaDescriptor;
use chrono::{DateTime, Local};
use ratatui::style::Color;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Ring-buffer capacity for the activity feed (spec §3: "cap ≈ 100").
pub const ACTIVITY_FEED_CAPACITY: usize = 100;
/// How many of the most recent events the feed widget renders (spec §4.9).
pub const ACTIVITY_FEED_VISIBLE: usize = 20;
/// Moving-average window for amplitude smoothing (spec §4.9).
pub const AMPLITUDE_WINDOW: usize = 10;
/// How long a detected wake word stays in the status widget (spec §4.9).
pub const WAKE_WORD_DEBOUNCE: Duration = Duration::from_secs(3);

/// Dashboard operating mode (spec §4.9 state machine table).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Idle,
    Listening,
    Speaking,
    Thinking,
    Error,
}

impl Mode {
    pub fn color(self) -> Color {
        match self {
            Mode::Idle => Color::Cyan,
            Mode::Listening => Color::Green,
            Mode::Speaking => Color::Yellow,
            Mode::Thinking => Color::Magenta,
            Mode::Error => Color::Red,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Mode::Idle => "Idle",
            Mode::Listening => "Listening",
            Mode::Speaking => "Speaking",
            Mode::Thinking => "Thinking",
            Mode::Error => "Error",
        }
    }

    /// Base visualizer radius before amplitude scaling, in terminal cells.
    pub fn base_radius(self) -> f32 {
        match self {
            Mode::Idle | Mode::Error => 4.0,
            Mode::Listening | Mode::Thinking => 6.0,
            Mode::Speaking => 9.0,
        }
    }

    /// `Idle -> Listening -> Speaking -> Thinking -> Idle`, used by the
    /// dev-mode `SPACE` cycle control (spec §4.9).
    pub fn cycle(self) -> Mode {
        match self {
            Mode::Idle => Mode::Listening,
            Mode::Listening => Mode::Speaking,
            Mode::Speaking => Mode::Thinking,
            Mode::Thinking | Mode::Error => Mode::Idle,
        }
    }
}

/// Severity/category of an [`EventItem`], used for activity feed coloring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Info,
    UserSpeech,
    AssistantSpeech,
    Warning,
    Error,
}

/// One activity feed entry (spec §3 `Event`).
#[derive(Debug, Clone)]
pub struct EventItem {
    pub timestamp: DateTime<Local>,
    pub kind: EventKind,
    pub message: String,
}

impl EventItem {
    /// `HH:MM:SS` local time, per spec §4.9.
    pub fn time_label(&self) -> String {
        self.timestamp.format("%H:%M:%S").to_string()
    }
}

/// Always-visible fields in the status widget (spec §4.9).
#[derive(Debug, Clone, Default)]
pub struct StatusFields {
    pub device_label: String,
    pub active_persona_name: String,
    last_wake_word: Option<(String, Instant)>,
}

impl StatusFields {
    pub fn record_wake_word(&mut self, word: impl Into<String>) {
        self.last_wake_word = Some((word.into(), Instant::now()));
    }

    /// `None` once [`WAKE_WORD_DEBOUNCE`] has elapsed since detection.
    pub fn last_wake_word(&self) -> Option<&str> {
        self.last_wake_word
            .as_ref()
            .filter(|(_, at)| at.elapsed() < WAKE_WORD_DEBOUNCE)
            .map(|(word, _)| word.as_str())
    }
}

/// Settings view state: a radio group over discovered personas (spec
/// §4.9: "the dashboard must read the human-readable persona name from
/// the widget's *label text*, never from the widget's boolean 'selected'
/// flag").
#[derive(Debug, Clone, Default)]
pub struct SettingsView {
    pub open: bool,
    pub available: Vec<PersonaDescriptor>,
    pub cursor: usize,
}

impl SettingsView {
    /// The label text of the currently highlighted entry — this, not a
    /// selected-index comparison, is what gets sent to `PersonaRuntime`.
    pub fn selected_label(&self) -> Option<&str> {
        self.available.get(self.cursor).map(|d| d.name.as_str())
    }

    pub fn move_cursor(&mut self, delta: i32) {
        if self.available.is_empty() {
            return;
        }
        let len = self.available.len() as i32;
        let next = (self.cursor as i32 + delta).rem_euclid(len);
        self.cursor = next as usize;
    }
}

/// The full reactive state the UI task renders from (spec §3).
pub struct DashboardState {
    pub mode: Mode,
    pub input_amplitude: f32,
    pub output_amplitude: f32,
    amplitude_history: VecDeque<f32>,
    pub activity_feed: VecDeque<EventItem>,
    pub status: StatusFields,
    pub error_banner: Option<(&'static str, &'static str)>,
    pub settings: SettingsView,
    pub dev_mode: bool,
    pub chat_lines: VecDeque<String>,
    pub stats_summary: String,
}

/// How many formatted `"Speaker: text"` lines the chat panel keeps
/// (spec §4.9 `chat` panel — independent of `ConversationMemory`'s own
/// eviction policy, since this is purely a display cache).
pub const CHAT_PANEL_CAPACITY: usize = 50;

impl Default for DashboardState {
    fn default() -> Self {
        Self {
            mode: Mode::Idle,
            input_amplitude: 0.0,
            output_amplitude: 0.0,
            amplitude_history: VecDeque::with_capacity(AMPLITUDE_WINDOW),
            activity_feed: VecDeque::with_capacity(ACTIVITY_FEED_CAPACITY),
            status: StatusFields::default(),
            error_banner: None,
            settings: SettingsView::default(),
            dev_mode: false,
            chat_lines: VecDeque::with_capacity(CHAT_PANEL_CAPACITY),
            stats_summary: String::new(),
        }
    }
}

impl DashboardState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_event(&mut self, kind: EventKind, message: impl Into<String>) {
        self.activity_feed.push_back(EventItem {
            timestamp: Local::now(),
            kind,
            message: message.into(),
        });
        while self.activity_feed.len() > ACTIVITY_FEED_CAPACITY {
            self.activity_feed.pop_front();
        }
    }

    /// The newest [`ACTIVITY_FEED_VISIBLE`] events, oldest first (spec
    /// §4.9: "newest at bottom").
    pub fn visible_events(&self) -> impl Iterator<Item = &EventItem> {
        let len = self.activity_feed.len();
        let skip = len.saturating_sub(ACTIVITY_FEED_VISIBLE);
        self.activity_feed.iter().skip(skip)
    }

    /// Fold one input-side RMS sample into the moving average (spec §4.9:
    /// "10-sample moving average of RMS").
    pub fn push_input_amplitude(&mut self, rms: f32) {
        self.amplitude_history.push_back(rms);
        while self.amplitude_history.len() > AMPLITUDE_WINDOW {
            self.amplitude_history.pop_front();
        }
        self.input_amplitude =
            self.amplitude_history.iter().sum::<f32>() / self.amplitude_history.len() as f32;
    }

    /// Low-pass the output amplitude to prevent visual jitter (spec §4.9).
    pub fn set_output_amplitude(&mut self, rms: f32) {
        const ALPHA: f32 = 0.7;
        self.output_amplitude = (1.0 - ALPHA) * self.output_amplitude + ALPHA * rms;
    }

    /// Visualizer circle radius for the current mode/amplitude (spec
    /// §4.9: `base_radius * (0.6 + 0.8 * smooth_amplitude)` while Speaking).
    pub fn visualizer_radius(&self) -> f32 {
        let base = self.mode.base_radius();
        match self.mode {
            Mode::Speaking => base * (0.6 + 0.8 * self.output_amplitude.clamp(0.0, 1.0)),
            _ => base,
        }
    }

    pub fn push_chat_line(&mut self, line: impl Into<String>) {
        self.chat_lines.push_back(line.into());
        while self.chat_lines.len() > CHAT_PANEL_CAPACITY {
            self.chat_lines.pop_front();
        }
    }
}
