//! Terminal dashboard (spec §4.9).
//!
//! Grounded on the ColdVox `tui_dashboard.rs` reference: `crossterm`
//! raw-mode + alternate screen, a `ratatui::Terminal` driven by a
//! `tokio::select!` loop over terminal events and an internal `mpsc` of
//! typed updates, panic-safe teardown. Generalized from ColdVox's single
//! audio-level gauge to the full widget set spec.md §4.9 names.

pub mod app;
pub mod panel;
pub mod state;
pub mod widgets;

use app::{apply_dev_cycle, draw, format_state_dump, handle_key, DashboardCommand};
use state::{DashboardState, EventKind, Mode};

use crate::error::{Result, VoiceError};
use crate::persona::PersonaDescriptor;
use crossterm::event::{self, Event};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io::{self, Stdout};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::warn;

pub type DashTerminal = Terminal<CrosstermBackend<Stdout>>;

/// Messages posted by the processing/supervisor tasks, folded into
/// [`DashboardState`] between renders (spec §4.10: "a reactive store").
#[derive(Debug, Clone)]
pub enum DashboardUpdate {
    SetMode(Mode),
    InputAmplitude(f32),
    OutputAmplitude(f32),
    Event(EventKind, String),
    WakeWordDetected(String),
    PersonaChanged(String),
    AvailablePersonas(Vec<PersonaDescriptor>),
    ChatLine(String),
    StatsSummary(String),
    ErrorBanner(&'static str, &'static str),
    ClearError,
    DeviceLabel(String),
}

/// Enter raw mode and the alternate screen (spec §4.9).
///
/// # Errors
///
/// Returns [`VoiceError::Pipeline`] if the terminal can't be put into raw
/// mode or the backend can't be constructed.
pub fn init_terminal() -> Result<DashTerminal> {
    enable_raw_mode().map_err(|e| VoiceError::Pipeline(format!("failed to enable raw mode: {e}")))?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)
        .map_err(|e| VoiceError::Pipeline(format!("failed to enter alternate screen: {e}")))?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(|e| VoiceError::Pipeline(format!("failed to create terminal: {e}")))
}

/// Restore canonical terminal mode and show the cursor on every exit path
/// (spec §4.9: "including panics"). Never panics itself — errors here are
/// logged, not propagated, because this runs during unwind/shutdown.
pub fn restore_terminal(terminal: &mut DashTerminal) {
    if let Err(e) = disable_raw_mode() {
        warn!("failed to disable raw mode during teardown: {e}");
    }
    if let Err(e) = execute!(terminal.backend_mut(), LeaveAlternateScreen) {
        warn!("failed to leave alternate screen during teardown: {e}");
    }
    let _ = terminal.show_cursor();
}

/// Install a panic hook that restores the terminal before the default
/// hook prints, so a panicking UI task never leaves raw mode / the
/// alternate screen active (spec §8 scenario 6).
pub fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        default_hook(info);
    }));
}

/// Owns [`DashboardState`] and the 30 Hz render loop.
pub struct Dashboard {
    state: DashboardState,
    breakpoints: [u16; 4],
    started_at: Instant,
}

impl Dashboard {
    pub fn new(breakpoints: [u16; 4]) -> Self {
        Self {
            state: DashboardState::new(),
            breakpoints,
            started_at: Instant::now(),
        }
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    /// Mark the dashboard as running in `--dev` mode (spec §6.1: "shows a
    /// clearly-marked 'DEV MODE' dashboard"; also enables the `SPACE`
    /// mode-cycle control, spec §4.9).
    pub fn set_dev_mode(&mut self, enabled: bool) {
        self.state.dev_mode = enabled;
    }

    fn apply_update(&mut self, update: DashboardUpdate) {
        match update {
            DashboardUpdate::SetMode(mode) => self.state.mode = mode,
            DashboardUpdate::InputAmplitude(rms) => self.state.push_input_amplitude(rms),
            DashboardUpdate::OutputAmplitude(rms) => self.state.set_output_amplitude(rms),
            DashboardUpdate::Event(kind, message) => self.state.push_event(kind, message),
            DashboardUpdate::WakeWordDetected(word) => self.state.status.record_wake_word(word),
            DashboardUpdate::PersonaChanged(name) => self.state.status.active_persona_name = name,
            DashboardUpdate::AvailablePersonas(list) => self.state.settings.available = list,
            DashboardUpdate::ChatLine(line) => self.state.push_chat_line(line),
            DashboardUpdate::StatsSummary(summary) => self.state.stats_summary = summary,
            DashboardUpdate::ErrorBanner(category, remediation) => {
                self.state.error_banner = Some((category, remediation));
                self.state.mode = Mode::Error;
            }
            DashboardUpdate::ClearError => self.state.error_banner = None,
            DashboardUpdate::DeviceLabel(label) => self.state.status.device_label = label,
        }
    }

    fn copy_state_dump_to_clipboard(&self) {
        match arboard::Clipboard::new() {
            Ok(mut clipboard) => {
                if let Err(e) = clipboard.set_text(format_state_dump(&self.state)) {
                    warn!("failed to copy state dump to clipboard: {e}");
                }
            }
            Err(e) => warn!("failed to open system clipboard: {e}"),
        }
    }

    /// Drive the UI at a fixed 30 Hz refresh (spec §4.9) until `cancel`
    /// fires or the user requests shutdown via `Q`/`Esc`/`Ctrl-C`.
    ///
    /// # Errors
    ///
    /// Returns [`VoiceError::Pipeline`] if a render call fails.
    pub async fn run(
        &mut self,
        terminal: &mut DashTerminal,
        mut updates: mpsc::Receiver<DashboardUpdate>,
        commands: mpsc::Sender<DashboardCommand>,
        cancel: CancellationToken,
    ) -> Result<()> {
        const FRAME_INTERVAL: Duration = Duration::from_millis(33);
        let mut tick = tokio::time::interval(FRAME_INTERVAL);

        loop {
            terminal
                .draw(|f| draw(f, &self.state, &self.breakpoints, self.started_at))
                .map_err(|e| VoiceError::Pipeline(format!("render failed: {e}")))?;

            tokio::select! {
                () = cancel.cancelled() => return Ok(()),
                _ = tick.tick() => {}
                Some(update) = updates.recv() => self.apply_update(update),
                maybe_key = poll_key() => {
                    if let Some(key) = maybe_key {
                        self.handle_key_event(key, &commands).await;
                    }
                }
            }
        }
    }

    async fn handle_key_event(&mut self, key: crossterm::event::KeyEvent, commands: &mpsc::Sender<DashboardCommand>) {
        let Some(command) = handle_key(key, &self.state) else {
            return;
        };

        match &command {
            DashboardCommand::ToggleSettings => self.state.settings.open = !self.state.settings.open,
            DashboardCommand::SettingsCursorUp => self.state.settings.move_cursor(-1),
            DashboardCommand::SettingsCursorDown => self.state.settings.move_cursor(1),
            DashboardCommand::CycleMode => apply_dev_cycle(&mut self.state),
            DashboardCommand::CopyStateDump => self.copy_state_dump_to_clipboard(),
            DashboardCommand::StartVoice | DashboardCommand::SelectPersona(_) | DashboardCommand::Shutdown => {}
        }

        let _ = commands.send(command).await;
    }
}

async fn poll_key() -> Option<crossterm::event::KeyEvent> {
    tokio::task::spawn_blocking(|| {
        if event::poll(Duration::from_millis(10)).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                return Some(key);
            }
        }
        None
    })
    .await
    .unwrap_or(None)
}
