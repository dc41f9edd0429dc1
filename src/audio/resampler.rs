//! Sinc resampling between device-native rate and the engine-native rate.
//!
//! The teacher (`fae::audio::capture::downsample`) uses plain linear
//! interpolation, which is fine for its STT-only 48kHz→16kHz path but
//! produces audible artifacts on a full-duplex round trip. Per spec §4.2
//! the contract requires a fixed-quality sinc filter; this is enrichment
//! from `SinergaOptima-Dictum`, whose workspace depends on `rubato = "0.15"`
//! for exactly this reason ("captures at device rate, model needs 16 kHz").

use crate::error::{Result, VoiceError};
use rubato::{
    Resampler as _, SincFixedIn, SincInterpolationParameters, SincInterpolationType,
    WindowFunction,
};

/// Configuration values required by the contract (spec §4.2). These are
/// part of the interface, not tuning knobs: empirical testing in the
/// reference design showed lower-quality settings produce audible
/// artifacts downstream.
pub struct SincConfig;

impl SincConfig {
    pub const SINC_LEN: usize = 512;
    pub const F_CUTOFF: f64 = 0.99;
    pub const OVERSAMPLING: usize = 512;
    pub const INTERPOLATION: SincInterpolationType = SincInterpolationType::Linear;
    pub const WINDOW: WindowFunction = WindowFunction::Blackman;
}

/// Converts between a source rate and a target rate in one direction.
/// Not thread-safe; one instance per direction (input or output).
pub struct Resampler {
    inner: SincFixedIn<f32>,
    ratio: f64,
    /// Samples carried over from the previous `process` call because
    /// `rubato` consumes fixed-size chunks internally.
    tail: Vec<f32>,
    chunk_size: usize,
}

impl Resampler {
    /// Build a resampler from `source_rate` to `target_rate`.
    ///
    /// # Errors
    ///
    /// Returns [`VoiceError::Resample`] if `rubato` rejects the
    /// configuration (e.g. a degenerate rate ratio).
    pub fn new(source_rate: u32, target_rate: u32) -> Result<Self> {
        let ratio = target_rate as f64 / source_rate as f64;
        let params = SincInterpolationParameters {
            sinc_len: SincConfig::SINC_LEN,
            f_cutoff: SincConfig::F_CUTOFF as f32,
            interpolation: SincConfig::INTERPOLATION,
            oversampling_factor: SincConfig::OVERSAMPLING,
            window: SincConfig::WINDOW,
        };
        let chunk_size = 1024;
        let inner = SincFixedIn::<f32>::new(ratio, 2.0, params, chunk_size, 1)
            .map_err(|e| VoiceError::Resample(e.to_string()))?;

        Ok(Self {
            inner,
            ratio,
            tail: Vec::new(),
            chunk_size,
        })
    }

    /// Resample `input`, maintaining internal tail state across calls so
    /// callers may feed arbitrarily-sized blocks (e.g. whatever the device
    /// callback handed us) and still get monotonically ordered output.
    ///
    /// # Errors
    ///
    /// Returns [`VoiceError::Resample`] if the underlying resampler fails.
    pub fn process(&mut self, input: &[f32]) -> Result<Vec<f32>> {
        self.tail.extend_from_slice(input);

        let mut output = Vec::new();
        while self.tail.len() >= self.chunk_size {
            let chunk: Vec<f32> = self.tail.drain(..self.chunk_size).collect();
            let processed = self
                .inner
                .process(&[chunk], None)
                .map_err(|e| VoiceError::Resample(e.to_string()))?;
            output.extend_from_slice(&processed[0]);
        }
        Ok(output)
    }

    /// The configured rate ratio (target/source), exposed for property
    /// tests against spec §8 invariant 1.
    pub fn ratio(&self) -> f64 {
        self.ratio
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_monotonic_output_length_bound() {
        let mut resampler = Resampler::new(48_000, 24_000).unwrap();
        let input = vec![0.0f32; 48_000]; // 1 second of silence at 48kHz
        let out = resampler.process(&input).unwrap();
        // ~1 second at 24kHz, modulo the fixed-chunk internal buffering.
        assert!(out.len() > 20_000 && out.len() < 26_000);
    }

    #[test]
    fn ratio_matches_requested_rates() {
        let resampler = Resampler::new(16_000, 24_000).unwrap();
        assert!((resampler.ratio() - 1.5).abs() < 1e-9);
    }

    #[test]
    fn same_rate_is_near_identity_length() {
        let mut resampler = Resampler::new(24_000, 24_000).unwrap();
        let input: Vec<f32> = (0..24_000).map(|i| (i as f32 * 0.001).sin()).collect();
        let out = resampler.process(&input).unwrap();
        assert!((out.len() as i64 - input.len() as i64).unsigned_abs() < 2048);
    }
}
