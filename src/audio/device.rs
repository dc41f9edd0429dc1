//! Platform microphone input / speaker output via `cpal`.
//!
//! Grounded on `fae::audio::capture::CpalCapture` and
//! `fae::audio::playback::CpalPlayback`: device enumeration through the
//! default `cpal` host, falling back to the system default device when a
//! configured name isn't found, and a non-blocking realtime callback that
//! only enqueues. Generalized here into a single `AudioDevice` that owns
//! both directions and exposes the spec's `open/start/stop/set_input_sink/
//! set_output_source` surface (spec §4.1) instead of the teacher's
//! capture-only / playback-only split.

use crate::error::{Result, VoiceError};
use crate::stats::Stats;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::StreamConfig;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{error, info, warn};

/// A raw block of samples delivered from/to the device at its native rate.
#[derive(Debug, Clone)]
pub struct DeviceBlock {
    pub samples: Vec<f32>,
    pub channels: u16,
    pub native_rate: u32,
}

/// Receives raw device blocks on the realtime input thread.
///
/// Implementations must not block: enqueue-and-return only.
pub trait InputSink: Send + 'static {
    fn on_block(&mut self, block: DeviceBlock);
}

impl<F: FnMut(DeviceBlock) + Send + 'static> InputSink for F {
    fn on_block(&mut self, block: DeviceBlock) {
        self(block)
    }
}

/// Pulled on the realtime output thread for exact block sizes.
///
/// Implementations must not block and must return exactly `frames` mono
/// samples; return silence if no data is ready.
pub trait OutputSource: Send + 'static {
    fn pull(&mut self, frames: usize) -> Vec<f32>;
}

impl<F: FnMut(usize) -> Vec<f32> + Send + 'static> OutputSource for F {
    fn pull(&mut self, frames: usize) -> Vec<f32> {
        self(frames)
    }
}

/// Device configuration requested at `open` time.
#[derive(Debug, Clone, Default)]
pub struct DeviceConfig {
    /// `None` selects the system default device.
    pub device_name: Option<String>,
}

/// Owns the platform input and output audio streams.
pub struct AudioDevice {
    input_device: cpal::Device,
    input_stream_config: StreamConfig,
    output_device: cpal::Device,
    output_stream_config: StreamConfig,
    input_stream: Option<cpal::Stream>,
    output_stream: Option<cpal::Stream>,
    pub stats: Arc<Stats>,
}

impl AudioDevice {
    /// Open platform input and output streams at device-native rate/block
    /// size, sharing `stats` with the rest of the pipeline for backpressure
    /// accounting (spec §7: "Backpressure ... not errors; counted in
    /// metrics").
    ///
    /// # Errors
    ///
    /// Returns [`VoiceError::NoDevice`], [`VoiceError::PermissionDenied`], or
    /// [`VoiceError::UnsupportedFormat`] per spec §4.1.
    pub fn open(input_cfg: &DeviceConfig, output_cfg: &DeviceConfig, stats: Arc<Stats>) -> Result<Self> {
        let host = cpal::default_host();

        let input_device = resolve_input_device(&host, input_cfg.device_name.as_deref())?;
        let output_device = resolve_output_device(&host, output_cfg.device_name.as_deref())?;

        let input_default = input_device
            .default_input_config()
            .map_err(permission_or_unsupported)?;
        let output_default = output_device
            .default_output_config()
            .map_err(permission_or_unsupported)?;

        let input_stream_config = StreamConfig {
            channels: input_default.channels(),
            sample_rate: input_default.sample_rate(),
            buffer_size: cpal::BufferSize::Default,
        };
        let output_stream_config = StreamConfig {
            channels: output_default.channels(),
            sample_rate: output_default.sample_rate(),
            buffer_size: cpal::BufferSize::Default,
        };

        info!(
            "audio device opened: input {}Hz/{}ch, output {}Hz/{}ch",
            input_stream_config.sample_rate,
            input_stream_config.channels,
            output_stream_config.sample_rate,
            output_stream_config.channels,
        );

        Ok(Self {
            input_device,
            input_stream_config,
            output_device,
            output_stream_config,
            input_stream: None,
            output_stream: None,
            stats,
        })
    }

    pub fn input_native_rate(&self) -> u32 {
        self.input_stream_config.sample_rate
    }

    pub fn output_native_rate(&self) -> u32 {
        self.output_stream_config.sample_rate
    }

    /// Register the sink that receives raw blocks on the input callback
    /// thread, and build (but do not yet play) the input stream.
    ///
    /// # Errors
    ///
    /// Returns [`VoiceError::Audio`] if the stream cannot be built.
    pub fn set_input_sink(&mut self, mut sink: impl InputSink) -> Result<()> {
        let channels = self.input_stream_config.channels;
        let native_rate = self.input_stream_config.sample_rate;

        let err_stats = Arc::clone(&self.stats);
        let stream = self
            .input_device
            .build_input_stream(
                &self.input_stream_config,
                move |data: &[f32], _info: &cpal::InputCallbackInfo| {
                    // Never blocks: hands the block to the sink and returns.
                    // The sink itself is required (by contract) to
                    // enqueue-and-return; it is the sink's job (the input
                    // forwarding task's `FrameQueue`) to count overflow.
                    sink.on_block(DeviceBlock {
                        samples: data.to_vec(),
                        channels,
                        native_rate,
                    });
                },
                move |err| {
                    error!("audio input stream error: {err}");
                    err_stats.record_device_lost();
                },
                None,
            )
            .map_err(|e| VoiceError::Audio(format!("failed to build input stream: {e}")))?;

        self.input_stream = Some(stream);
        Ok(())
    }

    /// Register the source pulled for output on the realtime output thread.
    ///
    /// # Errors
    ///
    /// Returns [`VoiceError::Audio`] if the stream cannot be built.
    pub fn set_output_source(&mut self, source: impl OutputSource) -> Result<()> {
        let channels = self.output_stream_config.channels as usize;
        let source = Arc::new(Mutex::new(source));
        let stats = Arc::clone(&self.stats);
        let err_stats = Arc::clone(&self.stats);

        let stream = self
            .output_device
            .build_output_stream(
                &self.output_stream_config,
                move |data: &mut [f32], _info: &cpal::OutputCallbackInfo| {
                    let frames = data.len() / channels.max(1);
                    let samples = match source.lock() {
                        Ok(mut src) => src.pull(frames),
                        Err(_) => {
                            stats.record_output_underflow();
                            Vec::new()
                        }
                    };

                    if samples.len() < frames {
                        stats.record_output_underflow();
                    }

                    for (i, chunk) in data.chunks_mut(channels).enumerate() {
                        let s = samples.get(i).copied().unwrap_or(0.0);
                        for out in chunk {
                            *out = s;
                        }
                    }
                },
                move |err| {
                    error!("audio output stream error: {err}");
                    err_stats.record_device_lost();
                },
                None,
            )
            .map_err(|e| VoiceError::Audio(format!("failed to build output stream: {e}")))?;

        self.output_stream = Some(stream);
        Ok(())
    }

    /// Start playing both streams. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`VoiceError::Audio`] if a stream fails to start.
    pub fn start(&mut self) -> Result<()> {
        if let Some(s) = &self.input_stream {
            s.play()
                .map_err(|e| VoiceError::Audio(format!("failed to start input stream: {e}")))?;
        }
        if let Some(s) = &self.output_stream {
            s.play()
                .map_err(|e| VoiceError::Audio(format!("failed to start output stream: {e}")))?;
        }
        Ok(())
    }

    /// Stop both streams. Idempotent.
    pub fn stop(&mut self) {
        if let Some(s) = self.input_stream.take() {
            if let Err(e) = s.pause() {
                warn!("error pausing input stream: {e}");
            }
        }
        if let Some(s) = self.output_stream.take() {
            if let Err(e) = s.pause() {
                warn!("error pausing output stream: {e}");
            }
        }
    }

    pub fn list_input_devices() -> Result<Vec<String>> {
        let host = cpal::default_host();
        let devices = host
            .input_devices()
            .map_err(|e| VoiceError::Audio(format!("cannot enumerate devices: {e}")))?;
        Ok(devices.filter_map(|d| d.name().ok()).collect())
    }

    pub fn list_output_devices() -> Result<Vec<String>> {
        let host = cpal::default_host();
        let devices = host
            .output_devices()
            .map_err(|e| VoiceError::Audio(format!("cannot enumerate devices: {e}")))?;
        Ok(devices.filter_map(|d| d.name().ok()).collect())
    }
}

fn permission_or_unsupported(err: cpal::DefaultStreamConfigError) -> VoiceError {
    use cpal::DefaultStreamConfigError as E;
    match err {
        E::DeviceNotAvailable => VoiceError::PermissionDenied(err.to_string()),
        other => VoiceError::UnsupportedFormat(other.to_string()),
    }
}

fn resolve_input_device(host: &cpal::Host, name: Option<&str>) -> Result<cpal::Device> {
    if let Some(name) = name {
        let found = host
            .input_devices()
            .map_err(|e| VoiceError::Audio(format!("cannot enumerate devices: {e}")))?
            .find(|d| d.name().map(|n| n == name).unwrap_or(false));
        if let Some(d) = found {
            return Ok(d);
        }
        warn!("configured input device '{name}' not found, falling back to default");
    }
    host.default_input_device()
        .ok_or_else(|| VoiceError::NoDevice("no default input device".into()))
}

fn resolve_output_device(host: &cpal::Host, name: Option<&str>) -> Result<cpal::Device> {
    if let Some(name) = name {
        let found = host
            .output_devices()
            .map_err(|e| VoiceError::Audio(format!("cannot enumerate devices: {e}")))?
            .find(|d| d.name().map(|n| n == name).unwrap_or(false));
        if let Some(d) = found {
            return Ok(d);
        }
        warn!("configured output device '{name}' not found, falling back to default");
    }
    host.default_output_device()
        .ok_or_else(|| VoiceError::NoDevice("no default output device".into()))
}

/// Retry policy for device loss: at most `max_attempts`, spaced
/// `interval` apart (spec §4.1 failure model: 1/s, up to 10 attempts).
#[derive(Debug, Clone, Copy)]
pub struct ReopenPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for ReopenPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            interval: Duration::from_secs(1),
        }
    }
}

/// Attempts to reopen and fully rewire a lost device, per `policy`.
/// `make_sink`/`make_source` are called once per attempt so the caller can
/// hand back a fresh closure over its (cloneable) channel ends each time —
/// the previous attempt's sink/source was already consumed by the failed
/// `build_*_stream` call.
///
/// Returns the reopened, started device on success, or
/// [`VoiceError::DeviceLost`] once `max_attempts` is exhausted (spec
/// §4.1/§7: "re-open, 1/s, up to 10 attempts, then enter Error mode").
pub async fn reopen_after_loss<S, O>(
    input_cfg: &DeviceConfig,
    output_cfg: &DeviceConfig,
    stats: Arc<Stats>,
    policy: ReopenPolicy,
    mut make_sink: impl FnMut() -> S,
    mut make_source: impl FnMut() -> O,
) -> Result<AudioDevice>
where
    S: InputSink,
    O: OutputSource,
{
    let mut last_err = None;
    for attempt in 1..=policy.max_attempts {
        let outcome = AudioDevice::open(input_cfg, output_cfg, Arc::clone(&stats)).and_then(|mut device| {
            device.set_input_sink(make_sink())?;
            device.set_output_source(make_source())?;
            device.start()?;
            Ok(device)
        });

        match outcome {
            Ok(device) => {
                info!("audio device reopened on attempt {attempt}/{}", policy.max_attempts);
                return Ok(device);
            }
            Err(e) => {
                warn!("device reopen attempt {attempt}/{} failed: {e}", policy.max_attempts);
                last_err = Some(e);
            }
        }

        if attempt < policy.max_attempts {
            tokio::time::sleep(policy.interval).await;
        }
    }

    Err(VoiceError::DeviceLost(format!(
        "device could not be reopened after {} attempts: {}",
        policy.max_attempts,
        last_err.map(|e| e.to_string()).unwrap_or_default(),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reopen_policy_default_matches_spec() {
        let policy = ReopenPolicy::default();
        assert_eq!(policy.max_attempts, 10);
        assert_eq!(policy.interval, std::time::Duration::from_secs(1));
    }
}
