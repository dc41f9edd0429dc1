//! Wake-word detection over the engine's streaming transcript (spec §4.8).
//!
//! Structurally grounded on `fae::vad::SileroVad`'s energy-gated windowing
//! (pre-roll buffer, running RMS, threshold) but retargeted per the
//! wake-word Open Question (spec §9): instead of a dedicated
//! keyword-spotting model, this detector matches configured wake phrases
//! against the rolling transcript the `NeuralEngine` already emits via
//! `text_piece`. That needs no extra model and keeps the detector's
//! dependency surface inside the engine already loaded for the main
//! speech path. `feed` still takes the raw frame (mirroring the VAD's
//! per-frame call site in the processing loop) and tracks energy so a
//! dashboard visualizer can show input activity even before any word
//! fires; `observe_text` is where matching actually happens.

use crate::audio::{rms, AudioFrame};
use std::collections::HashSet;
use std::time::{Duration, Instant};

/// How long a detected word stays visible before the status widget should
/// clear it (spec §8 scenario 3: "until 3 s elapse without new detection").
pub const DETECTION_DEBOUNCE: Duration = Duration::from_secs(3);

/// Fires when a configured wake word is recognized. Called from the
/// processing task; must not block (spec §4.8).
pub type DetectCallback = Box<dyn Fn(&str) + Send + Sync>;

fn fuzzy_contains(word: &str, text: &str, sensitivity: f32) -> bool {
    if text.contains(word) {
        return true;
    }
    if sensitivity > 0.5 {
        let prefix_len = ((word.len() as f32) * 0.6).ceil() as usize;
        let prefix_len = prefix_len.clamp(1, word.len());
        let prefix = &word[..prefix_len];
        if text.contains(prefix) {
            return true;
        }
    }
    false
}

/// Detects configured wake phrases in the engine's emitted transcript.
pub struct WakeWordDetector {
    words: HashSet<String>,
    sensitivity: f32,
    on_detect: Option<DetectCallback>,
    last_detected: Option<(String, Instant)>,
    last_rms: f32,
}

impl Default for WakeWordDetector {
    fn default() -> Self {
        Self {
            words: HashSet::new(),
            sensitivity: 0.5,
            on_detect: None,
            last_detected: None,
            last_rms: 0.0,
        }
    }
}

impl WakeWordDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the active wake-word set and sensitivity (spec §4.8).
    /// Called on startup and again whenever `PersonaRuntime` swaps a
    /// persona (spec §7.?: "reconfigures its active keyword set on swap").
    pub fn configure(&mut self, words: impl IntoIterator<Item = String>, sensitivity: f32) {
        self.words = words.into_iter().map(|w| w.to_lowercase()).collect();
        self.sensitivity = sensitivity.clamp(0.0, 1.0);
    }

    pub fn set_on_detect(&mut self, callback: DetectCallback) {
        self.on_detect = Some(callback);
    }

    /// Called by the Supervisor for every input frame. Tracks input
    /// energy only; word matching happens in [`Self::observe_text`].
    pub fn feed(&mut self, frame: &AudioFrame) {
        self.last_rms = rms(&frame.samples);
    }

    /// Called whenever the engine emits a `text_piece`. Performs the
    /// actual wake-word match against the accumulated piece.
    pub fn observe_text(&mut self, text_piece: &str) {
        let lowered = text_piece.to_lowercase();
        for word in &self.words {
            if fuzzy_contains(word, &lowered, self.sensitivity) {
                self.last_detected = Some((word.clone(), Instant::now()));
                if let Some(callback) = &self.on_detect {
                    callback(word);
                }
                return;
            }
        }
    }

    pub fn last_rms(&self) -> f32 {
        self.last_rms
    }

    /// The most recently detected word, or `None` if it has fallen outside
    /// [`DETECTION_DEBOUNCE`]. Intended for the status widget.
    pub fn last_detected(&self) -> Option<&str> {
        self.last_detected
            .as_ref()
            .filter(|(_, at)| at.elapsed() < DETECTION_DEBOUNCE)
            .map(|(word, _)| word.as_str())
    }

    pub fn sensitivity(&self) -> f32 {
        self.sensitivity
    }

    pub fn configured_words(&self) -> &HashSet<String> {
        &self.words
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn configured_word_fires_exactly_once_per_piece() {
        let mut detector = WakeWordDetector::new();
        detector.configure(["computer".to_owned(), "assistant".to_owned()], 0.5);
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = Arc::clone(&calls);
        detector.set_on_detect(Box::new(move |_| {
            calls_clone.fetch_add(1, Ordering::Relaxed);
        }));

        detector.observe_text("hey computer turn on the lights");
        assert_eq!(calls.load(Ordering::Relaxed), 1);
        assert_eq!(detector.last_detected(), Some("computer"));
    }

    #[test]
    fn unconfigured_word_never_fires() {
        let mut detector = WakeWordDetector::new();
        detector.configure(["computer".to_owned()], 0.5);
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = Arc::clone(&calls);
        detector.set_on_detect(Box::new(move |_| {
            calls_clone.fetch_add(1, Ordering::Relaxed);
        }));
        detector.observe_text("hello there, nothing relevant");
        assert_eq!(calls.load(Ordering::Relaxed), 0);
        assert!(detector.last_detected().is_none());
    }

    #[test]
    fn higher_sensitivity_accepts_a_truncated_prefix() {
        let mut low = WakeWordDetector::new();
        low.configure(["computer".to_owned()], 0.0);
        assert!(!fuzzy_contains("computer", "comp", 0.0));

        let mut high = WakeWordDetector::new();
        high.configure(["computer".to_owned()], 1.0);
        high.observe_text("comp");
        assert_eq!(high.last_detected(), Some("computer"));
        let _ = low;
    }

    #[test]
    fn persona_swap_reconfigures_word_set() {
        let mut detector = WakeWordDetector::new();
        detector.configure(["computer".to_owned()], 0.5);
        assert!(detector.configured_words().contains("computer"));
        detector.configure(["jarvis".to_owned()], 0.5);
        assert!(!detector.configured_words().contains("computer"));
        assert!(detector.configured_words().contains("jarvis"));
    }
}
