//! Output playback task (spec §4.10 task 3): pops engine output frames,
//! resamples to device rate, and hands samples to the realtime output
//! callback through a lock-free spsc channel.

use crate::audio::frame_queue::FrameQueue;
use crate::audio::resampler::Resampler;
use crate::audio::{OutputFrame, ENGINE_SAMPLE_RATE};
use crossbeam_channel::{Receiver, Sender};
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// Called from the realtime output callback ([`crate::audio::device::OutputSource::pull`]):
/// drain up to `frames` samples, padding with silence on underflow.
pub fn pull_samples(rx: &Receiver<f32>, frames: usize) -> Vec<f32> {
    let mut out = Vec::with_capacity(frames);
    for _ in 0..frames {
        out.push(rx.try_recv().unwrap_or(0.0));
    }
    out
}

pub async fn run(
    mut output_queue: FrameQueue<OutputFrame>,
    sample_tx: Sender<f32>,
    native_rate: u32,
    cancel: CancellationToken,
) {
    let mut resampler = match Resampler::new(ENGINE_SAMPLE_RATE, native_rate) {
        Ok(r) => r,
        Err(e) => {
            warn!("output playback task failed to build resampler: {e}");
            return;
        }
    };

    loop {
        let frame = tokio::select! {
            () = cancel.cancelled() => break,
            frame = output_queue.pop() => match frame {
                Some(frame) => frame,
                None => break,
            },
        };

        let resampled = match resampler.process(&frame.samples) {
            Ok(samples) => samples,
            Err(e) => {
                warn!("resample failed on output frame {}: {e}", frame.produced_seq);
                continue;
            }
        };

        for sample in resampled {
            // The device is the consumer on the other end; if it has fallen
            // behind enough to fill this buffer, drop the newest samples
            // rather than block the pipeline feeding us.
            if sample_tx.try_send(sample).is_err() {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pull_samples_pads_with_silence_on_underflow() {
        let (tx, rx) = crossbeam_channel::bounded(4);
        tx.send(1.0).unwrap();
        tx.send(2.0).unwrap();
        let out = pull_samples(&rx, 4);
        assert_eq!(out, vec![1.0, 2.0, 0.0, 0.0]);
    }

    #[test]
    fn pull_samples_returns_exactly_the_requested_count() {
        let (tx, rx) = crossbeam_channel::bounded(8);
        for i in 0..8 {
            tx.send(i as f32).unwrap();
        }
        assert_eq!(pull_samples(&rx, 5).len(), 5);
    }
}
