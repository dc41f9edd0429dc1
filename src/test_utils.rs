//! Deterministic fixtures shared by tests across the crate (spec §2
//! AMBIENT Test tooling). Grounded on `fae::test_utils`'s fixture style:
//! small, synchronous, no I/O, no randomness.

use crate::audio::{AudioFrame, FRAME_SIZE};
use std::time::Instant;

/// A silent frame with the given `capture_seq`.
pub fn silence_frame(capture_seq: u64) -> AudioFrame {
    AudioFrame::new(vec![0.0; FRAME_SIZE], capture_seq, Instant::now())
}

/// A pure sine tone at `freq_hz` sampled at [`crate::audio::ENGINE_SAMPLE_RATE`],
/// one frame long.
pub fn sine_frame(capture_seq: u64, freq_hz: f32) -> AudioFrame {
    let sample_rate = crate::audio::ENGINE_SAMPLE_RATE as f32;
    let samples = (0..FRAME_SIZE)
        .map(|i| (2.0 * std::f32::consts::PI * freq_hz * i as f32 / sample_rate).sin())
        .collect();
    AudioFrame::new(samples, capture_seq, Instant::now())
}

/// A sequence of `count` sine frames with consecutive `capture_seq` values,
/// for tests that feed several frames through a queue or the engine.
pub fn sine_frames(count: u64, freq_hz: f32) -> Vec<AudioFrame> {
    (0..count).map(|seq| sine_frame(seq, freq_hz)).collect()
}
