//! Audio device I/O, resampling, and the frame queue between them and the
//! neural engine.

pub mod device;
pub mod frame_queue;
pub mod resampler;

use std::time::Instant;

/// Engine-native sample rate (Hz). Fixed contract value (spec §6.5).
pub const ENGINE_SAMPLE_RATE: u32 = 24_000;

/// Engine-native frame size in samples: 80 ms at [`ENGINE_SAMPLE_RATE`].
pub const FRAME_SIZE: usize = 1920;

/// Why a frame was dropped instead of processed.
///
/// Exists to satisfy the invariant that every frame is either processed or
/// explicitly dropped with a recorded reason (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// The downstream queue was full.
    QueueFull,
    /// The engine/session was not ready to accept frames yet.
    EngineNotReady,
    /// The pipeline is shutting down.
    ShuttingDown,
}

/// An immutable block of PCM at the engine-native rate.
#[derive(Debug, Clone)]
pub struct AudioFrame {
    pub samples: Vec<f32>,
    /// Monotonically increasing sequence number assigned at capture time.
    pub capture_seq: u64,
    pub capture_instant: Instant,
}

impl AudioFrame {
    /// Construct a frame, asserting the fixed-size invariant.
    ///
    /// # Panics
    ///
    /// Panics (the spec's "programming invariant violation" category) if
    /// `samples.len() != FRAME_SIZE`. Callers are expected to buffer partial
    /// tails upstream rather than ever calling this with a short slice.
    pub fn new(samples: Vec<f32>, capture_seq: u64, capture_instant: Instant) -> Self {
        assert_eq!(
            samples.len(),
            FRAME_SIZE,
            "AudioFrame must be exactly FRAME_SIZE samples"
        );
        Self {
            samples,
            capture_seq,
            capture_instant,
        }
    }
}

/// A generated PCM block plus optional emitted text.
#[derive(Debug, Clone)]
pub struct OutputFrame {
    pub samples: Vec<f32>,
    pub produced_seq: u64,
    pub text_piece: Option<String>,
}

impl OutputFrame {
    pub fn silence(produced_seq: u64) -> Self {
        Self {
            samples: vec![0.0; FRAME_SIZE],
            produced_seq,
            text_piece: None,
        }
    }
}

/// Root-mean-square energy of a sample buffer.
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f32 = samples.iter().map(|s| s * s).sum();
    (sum_sq / samples.len() as f32).sqrt()
}
