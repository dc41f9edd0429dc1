//! The streaming speech-to-speech engine contract (spec §4.4).
//!
//! The teacher's speech path is a cascade — VAD routes to STT
//! (`fae::asr`/parakeet), a chat model replies (`fae_llm`), and Kokoro TTS
//! (`fae::tts::kokoro`) speaks the answer. This core instead wraps a single
//! streaming model that consumes one 80 ms input frame and emits one 80 ms
//! output frame per call, full duplex. The `step_frame` contract is new;
//! the model-loading *idiom* (`ort::Session` loading, phased progress
//! callback mirroring `fae::progress::ProgressEvent`) is grounded on
//! `fae::tts::kokoro::engine::KokoroTts::new`.

#[cfg(feature = "onnx")]
pub mod onnx;
pub mod stub;

use crate::audio::{AudioFrame, OutputFrame, FRAME_SIZE};
use crate::error::Result;
use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;

/// One frame period at the engine-native rate: 1920 samples / 24 kHz.
pub const FRAME_PERIOD: Duration = Duration::from_millis(80);

/// Quality tag resolved from [`crate::config::Quality`] into the value the
/// engine's model descriptor carries (spec §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelQuality {
    Bf16,
    Q8,
    Q4,
}

/// Phases reported through [`ProgressCallback`] while a model loads
/// (spec §4.4: "progress is reported via a callback ... so the dashboard
/// can show a progress bar"). Named after `fae::progress::ProgressEvent`'s
/// `LoadStarted`/`LoadComplete` pair, narrowed to the phases this engine
/// actually has.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    ResolvingWeights,
    LoadingSession,
    WarmingUp,
    Ready,
}

/// `on_load_progress(phase, percent)`.
pub type ProgressCallback<'a> = &'a dyn Fn(LoadPhase, u8);

/// Identifies which weights to load and at what quality (spec §4.4).
#[derive(Debug, Clone)]
pub struct ModelDescriptor {
    pub quality: ModelQuality,
    pub weights_path: PathBuf,
}

/// Opaque engine conditioning built by
/// [`crate::condition::ConditionBuilder`]. The spec calls this "an opaque
/// handle + shape metadata"; this crate never inspects a real tensor (no
/// production model ships), so the handle is the formatted prompt text the
/// stub/ONNX engines both treat as their conditioning payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    text: String,
}

impl Condition {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn as_text(&self) -> &str {
        &self.text
    }
}

/// Handle to one streaming session opened by [`SpeechEngine::begin_session`].
/// Callers can only obtain one by calling that method; there is no way to
/// construct a handle for a session that doesn't exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionHandle(Uuid);

impl SessionHandle {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// A forced output token sequence, used only for the fixed-greeting path
/// (spec §9: "forced-text output (used only for a fixed greeting)"). MUST
/// be `None` during normal operation — forcing text while expecting
/// natural audio corrupts generation.
pub type TokenSequence = Vec<u32>;

/// Result of one [`SpeechEngine::step_frame`] call.
#[derive(Debug, Clone)]
pub struct StepOutput {
    pub output: OutputFrame,
    pub text_piece: Option<String>,
    pub tokens_emitted: u32,
}

/// The streaming speech-to-speech model contract.
///
/// Single-owner: every implementation wraps state (an accelerator context,
/// a model session) that is not `Sync`, so the trait requires only `Send`
/// and the spec's "only one designated task may call into it" rule is
/// enforced by construction in [`crate::supervisor`] rather than by the
/// type system.
pub trait SpeechEngine: Send {
    /// Reset streaming state and seed a new session with `conditions`.
    fn begin_session(&mut self, conditions: &Condition) -> Result<SessionHandle>;

    /// Consume one input frame, producing exactly one output frame.
    ///
    /// `force_text` MUST be `None` during normal operation (spec §9); it
    /// exists only for the fixed-greeting path, which is expected to open
    /// a dedicated session and pass it on the first step only.
    fn step_frame(
        &mut self,
        session: SessionHandle,
        input: &AudioFrame,
        force_text: Option<&TokenSequence>,
    ) -> Result<StepOutput>;

    /// Replace the conditioning used by `session`, effective on the next
    /// `step_frame` call (spec §4.4: "must be atomic from the caller's
    /// perspective").
    fn update_conditions(&mut self, session: SessionHandle, new_conditions: &Condition) -> Result<()>;
}

fn silent_step(produced_seq: u64) -> StepOutput {
    StepOutput {
        output: OutputFrame::silence(produced_seq),
        text_piece: None,
        tokens_emitted: 0,
    }
}

const _: () = assert!(FRAME_SIZE == 1920);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_handles_are_distinct_per_begin_session_call() {
        let a = SessionHandle::new();
        let b = SessionHandle::new();
        assert_ne!(a, b);
    }

    #[test]
    fn silent_step_carries_no_text() {
        let step = silent_step(7);
        assert!(step.text_piece.is_none());
        assert_eq!(step.output.produced_seq, 7);
        assert_eq!(step.tokens_emitted, 0);
    }
}
