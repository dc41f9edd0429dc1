//! A deterministic [`SpeechEngine`] double for tests.
//!
//! Spec §8 scenario 4 (persona hot-swap under load) requires "a stub
//! `NeuralEngine` used in tests that echoes persona id" so the test can
//! observe which persona's conditioning a step used without a real model.
//! Grounded on `fae::test_utils`'s fixture style: small, deterministic,
//! no I/O, no randomness.

use super::{Condition, SessionHandle, SpeechEngine, StepOutput, TokenSequence};
use crate::audio::{AudioFrame, OutputFrame};
use crate::error::{Result, VoiceError};
use std::collections::HashMap;

/// Echoes the active condition's text back as `text_piece` on every step
/// and writes a single sample (the running step index, scaled into
/// `[-1, 1]`) into the output frame so tests can also assert on audio
/// content deterministically.
#[derive(Debug, Default)]
pub struct StubEngine {
    sessions: HashMap<SessionHandle, String>,
    step_counter: u64,
}

impl StubEngine {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SpeechEngine for StubEngine {
    fn begin_session(&mut self, conditions: &Condition) -> Result<SessionHandle> {
        let handle = SessionHandle::new();
        self.sessions.insert(handle, conditions.as_text().to_owned());
        Ok(handle)
    }

    fn step_frame(
        &mut self,
        session: SessionHandle,
        input: &AudioFrame,
        force_text: Option<&TokenSequence>,
    ) -> Result<StepOutput> {
        let condition_text = self
            .sessions
            .get(&session)
            .ok_or_else(|| VoiceError::EngineStep("unknown session handle".to_owned()))?
            .clone();

        self.step_counter += 1;

        let text_piece = match force_text {
            Some(tokens) => Some(format!("forced:{}", tokens.len())),
            None => Some(condition_text),
        };

        let mut samples = input.samples.clone();
        let marker = (self.step_counter % 1000) as f32 / 1000.0;
        if let Some(first) = samples.first_mut() {
            *first = marker;
        }

        Ok(StepOutput {
            output: OutputFrame {
                samples,
                produced_seq: self.step_counter,
                text_piece: text_piece.clone(),
            },
            text_piece,
            tokens_emitted: 1,
        })
    }

    fn update_conditions(&mut self, session: SessionHandle, new_conditions: &Condition) -> Result<()> {
        self.sessions
            .get_mut(&session)
            .map(|slot| *slot = new_conditions.as_text().to_owned())
            .ok_or_else(|| VoiceError::EngineStep("unknown session handle".to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::FRAME_SIZE;
    use std::time::Instant;

    fn frame() -> AudioFrame {
        AudioFrame::new(vec![0.0; FRAME_SIZE], 0, Instant::now())
    }

    #[test]
    fn step_echoes_active_condition_text() {
        let mut engine = StubEngine::new();
        let session = engine
            .begin_session(&Condition::from_text("persona-a"))
            .unwrap();
        let step = engine.step_frame(session, &frame(), None).unwrap();
        assert_eq!(step.text_piece.as_deref(), Some("persona-a"));
    }

    #[test]
    fn update_conditions_changes_subsequent_steps_within_three_frames() {
        let mut engine = StubEngine::new();
        let session = engine
            .begin_session(&Condition::from_text("persona-a"))
            .unwrap();
        engine.step_frame(session, &frame(), None).unwrap();

        engine
            .update_conditions(session, &Condition::from_text("persona-b"))
            .unwrap();

        let mut saw_b = false;
        for _ in 0..3 {
            let step = engine.step_frame(session, &frame(), None).unwrap();
            if step.text_piece.as_deref() == Some("persona-b") {
                saw_b = true;
            }
        }
        assert!(saw_b);
    }

    #[test]
    fn step_on_unknown_session_is_an_engine_step_error() {
        let mut engine = StubEngine::new();
        let bogus = engine
            .begin_session(&Condition::from_text("x"))
            .unwrap();
        // Consume and drop the session's only reference by constructing a
        // second engine instance that never registered this handle.
        let mut other = StubEngine::new();
        assert!(other.step_frame(bogus, &frame(), None).is_err());
    }

    #[test]
    fn force_text_path_never_echoes_condition_text() {
        let mut engine = StubEngine::new();
        let session = engine
            .begin_session(&Condition::from_text("persona-a"))
            .unwrap();
        let forced: TokenSequence = vec![1, 2, 3];
        let step = engine.step_frame(session, &frame(), Some(&forced)).unwrap();
        assert_eq!(step.text_piece.as_deref(), Some("forced:3"));
    }
}
