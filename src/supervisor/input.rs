//! Input forwarding task (spec §4.10 task 1): resamples device-native
//! blocks to engine rate, slices them into fixed-size frames, and
//! non-blockingly hands each to the processing task's input queue.

use crate::audio::device::DeviceBlock;
use crate::audio::frame_queue::FrameProducer;
use crate::audio::resampler::Resampler;
use crate::audio::{AudioFrame, ENGINE_SAMPLE_RATE, FRAME_SIZE};
use crate::stats::Stats;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::warn;

fn downmix(samples: &[f32], channels: u16) -> Vec<f32> {
    let channels = channels.max(1) as usize;
    if channels == 1 {
        return samples.to_vec();
    }
    samples
        .chunks(channels)
        .map(|chunk| chunk.iter().sum::<f32>() / chunk.len() as f32)
        .collect()
}

pub async fn run(
    mut raw_rx: mpsc::Receiver<DeviceBlock>,
    producer: FrameProducer<AudioFrame>,
    native_rate: u32,
    stats: Arc<Stats>,
    cancel: CancellationToken,
) {
    let mut resampler = match Resampler::new(native_rate, ENGINE_SAMPLE_RATE) {
        Ok(r) => r,
        Err(e) => {
            warn!("input forwarding task failed to build resampler: {e}");
            return;
        }
    };

    let mut pending: Vec<f32> = Vec::new();
    let mut capture_seq: u64 = 0;

    loop {
        let block = tokio::select! {
            () = cancel.cancelled() => break,
            block = raw_rx.recv() => match block {
                Some(block) => block,
                None => break,
            },
        };

        let mono = downmix(&block.samples, block.channels);
        let resampled = match resampler.process(&mono) {
            Ok(samples) => samples,
            Err(e) => {
                warn!("resample failed on input block: {e}");
                continue;
            }
        };
        pending.extend(resampled);

        while pending.len() >= FRAME_SIZE {
            let frame_samples: Vec<f32> = pending.drain(..FRAME_SIZE).collect();
            let frame = AudioFrame::new(frame_samples, capture_seq, Instant::now());
            capture_seq += 1;

            if producer.try_push(frame).is_err() {
                stats.record_input_full_drop();
                warn!("input queue full, dropping frame {capture_seq}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downmix_averages_interleaved_channels() {
        let stereo = vec![1.0, -1.0, 0.5, 0.5];
        let mono = downmix(&stereo, 2);
        assert_eq!(mono, vec![0.0, 0.5]);
    }

    #[test]
    fn downmix_is_identity_for_mono_input() {
        let samples = vec![0.1, 0.2, 0.3];
        assert_eq!(downmix(&samples, 1), samples);
    }
}
