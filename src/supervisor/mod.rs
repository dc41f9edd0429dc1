//! Process-wide coordinator (spec §4.10): owns the four long-lived tasks,
//! wires the shared objects together, and mediates cross-thread messaging.
//!
//! Grounded on `fae::pipeline::coordinator::PipelineCoordinator`'s task
//! topology: per-stage bounded channels sized as named constants, a
//! `CancellationToken` for cooperative shutdown, and `tokio::spawn` per
//! stage. Generalized from the teacher's five cascade stages
//! (capture/AEC/VAD/LLM/TTS) down to this crate's four tasks (input
//! forwarding, processing, output playback, UI) with the engine confined
//! to the processing task only (spec §5: "calling it from a device-callback
//! thread is forbidden"). The fourth task, UI, is the
//! [`crate::dashboard::Dashboard`] run loop; it is driven by the binary
//! rather than spawned here, since it also owns the terminal.

pub mod input;
pub mod playback;
pub mod processing;

use crate::audio::device::{self, AudioDevice, DeviceBlock, DeviceConfig, ReopenPolicy};
use crate::audio::frame_queue::FrameQueue;
use crate::audio::{AudioFrame, OutputFrame, FRAME_SIZE};
use crate::condition::ConditionBuilder;
use crate::config::VoiceConfig;
use crate::dashboard::state::Mode;
use crate::dashboard::DashboardUpdate;
use crate::error::Result;
use crate::memory::ConversationMemory;
use crate::neural::SpeechEngine;
use crate::persona::runtime::PersonaRuntime;
use crate::stats::Stats;
use parking_lot::Mutex as SyncMutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// How often the device watchdog task checks for a loss signal raised by a
/// stream error callback.
const DEVICE_WATCH_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Capacity of the bridge between the realtime input callback and the
/// input forwarding task (spec §4.10 task 1: "via a lock-free mpsc").
const RAW_BLOCK_CHANNEL_CAPACITY: usize = 32;
/// Capacity of the bridge between the output playback task and the
/// realtime output callback (spec §4.10 task 3: "via a lock-free spsc").
const OUTPUT_SAMPLE_CHANNEL_CAPACITY: usize = FRAME_SIZE * 8;
/// Hard deadline for `stop()` to drain tasks before giving up on them
/// (spec §5: "A hard deadline (default 2 s) triggers abort of remaining
/// tasks").
const SHUTDOWN_DEADLINE: Duration = Duration::from_secs(2);

/// Shared objects and the engine instance the Supervisor wires into its
/// four tasks. Constructed by the caller so tests can inject a
/// [`crate::neural::stub::StubEngine`] and an in-memory persona loader
/// (spec §8 scenario 4).
pub struct SupervisorDeps {
    pub config: VoiceConfig,
    pub engine: Box<dyn SpeechEngine>,
    pub persona_runtime: Arc<PersonaRuntime>,
    pub memory: Arc<ConversationMemory>,
    pub condition_builder: Arc<ConditionBuilder>,
    pub dashboard_updates: mpsc::Sender<DashboardUpdate>,
}

/// Owns the running voice pipeline. [`Self::start`] opens the device and
/// spawns the input/processing/playback tasks; [`Self::stop`] tears them
/// down (spec §4.10 Lifecycle).
pub struct Supervisor {
    config: VoiceConfig,
    persona_runtime: Arc<PersonaRuntime>,
    memory: Arc<ConversationMemory>,
    condition_builder: Arc<ConditionBuilder>,
    dashboard_updates: mpsc::Sender<DashboardUpdate>,
    stats: Arc<Stats>,
    cancel: CancellationToken,
    device: Arc<SyncMutex<Option<AudioDevice>>>,
    handles: Vec<JoinHandle<()>>,
    engine: Option<Box<dyn SpeechEngine>>,
}

impl Supervisor {
    pub fn new(deps: SupervisorDeps) -> Self {
        Self {
            config: deps.config,
            persona_runtime: deps.persona_runtime,
            memory: deps.memory,
            condition_builder: deps.condition_builder,
            dashboard_updates: deps.dashboard_updates,
            stats: Arc::new(Stats::new()),
            cancel: CancellationToken::new(),
            device: Arc::new(SyncMutex::new(None)),
            handles: Vec::new(),
            engine: Some(deps.engine),
        }
    }

    pub fn stats(&self) -> Arc<Stats> {
        Arc::clone(&self.stats)
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_running(&self) -> bool {
        self.device.lock().is_some()
    }

    /// Load the persona, open the device, and start the input forwarding,
    /// processing, and output playback tasks (spec §4.10 Lifecycle: "If any
    /// step fails, it cleanly tears down earlier steps").
    ///
    /// # Errors
    ///
    /// Returns whatever [`AudioDevice::open`] or `set_input_sink`/
    /// `set_output_source`/`start` returns; the engine's own session start
    /// happens inside the processing task and is reported there instead,
    /// since its errors arrive after this call has already returned.
    pub async fn start(&mut self, input_cfg: DeviceConfig, output_cfg: DeviceConfig) -> Result<()> {
        let engine = self
            .engine
            .take()
            .expect("Supervisor::start called twice without an intervening stop");

        let mut device = match AudioDevice::open(&input_cfg, &output_cfg, Arc::clone(&self.stats)) {
            Ok(device) => device,
            Err(e) => {
                error!("failed to open audio device: {e}");
                self.engine = Some(engine);
                return Err(e);
            }
        };

        let (raw_tx, raw_rx) = mpsc::channel::<DeviceBlock>(RAW_BLOCK_CHANNEL_CAPACITY);
        let raw_tx_for_reopen = raw_tx.clone();
        if let Err(e) = device.set_input_sink(move |block| {
            let _ = raw_tx.try_send(block);
        }) {
            self.engine = Some(engine);
            return Err(e);
        }

        let (sample_tx, sample_rx) = crossbeam_channel::bounded::<f32>(OUTPUT_SAMPLE_CHANNEL_CAPACITY);
        let sample_rx_for_reopen = sample_rx.clone();
        if let Err(e) = device.set_output_source(move |frames| playback::pull_samples(&sample_rx, frames)) {
            self.engine = Some(engine);
            return Err(e);
        }

        if let Err(e) = device.start() {
            self.engine = Some(engine);
            return Err(e);
        }

        let (input_queue, input_producer): (FrameQueue<AudioFrame>, _) =
            FrameQueue::new(self.config.audio.input_queue_capacity);
        let (output_queue, output_producer): (FrameQueue<OutputFrame>, _) =
            FrameQueue::new(self.config.audio.output_queue_capacity);

        let input_handle = tokio::spawn(input::run(
            raw_rx,
            input_producer,
            device.input_native_rate(),
            Arc::clone(&self.stats),
            self.cancel.clone(),
        ));

        let playback_handle = tokio::spawn(playback::run(
            output_queue,
            sample_tx,
            device.output_native_rate(),
            self.cancel.clone(),
        ));

        let processing_handle = tokio::spawn(processing::run(processing::ProcessingContext {
            engine,
            input_queue,
            output_producer,
            persona_runtime: Arc::clone(&self.persona_runtime),
            condition_builder: Arc::clone(&self.condition_builder),
            memory: Arc::clone(&self.memory),
            stats: Arc::clone(&self.stats),
            dashboard_updates: self.dashboard_updates.clone(),
            cancel: self.cancel.clone(),
        }));

        *self.device.lock() = Some(device);

        let watchdog_handle = tokio::spawn(watch_device(
            Arc::clone(&self.device),
            Arc::clone(&self.stats),
            ReopenPolicy::default(),
            input_cfg,
            output_cfg,
            raw_tx_for_reopen,
            sample_rx_for_reopen,
            self.dashboard_updates.clone(),
            self.cancel.clone(),
        ));

        self.handles = vec![input_handle, playback_handle, processing_handle, watchdog_handle];
        info!("voice runtime started");
        Ok(())
    }

    /// Cooperative shutdown: signal cancellation, wait up to
    /// [`SHUTDOWN_DEADLINE`] for tasks to drain, then give up on stragglers
    /// (spec §4.10/§5). Idempotent; safe to call when never started.
    pub async fn stop(&mut self) {
        self.cancel.cancel();
        if let Some(mut device) = self.device.lock().take() {
            device.stop();
        }

        let handles = std::mem::take(&mut self.handles);
        if handles.is_empty() {
            return;
        }

        let drain = async {
            for handle in handles {
                if let Err(e) = handle.await {
                    warn!("pipeline task did not shut down cleanly: {e}");
                }
            }
        };

        if tokio::time::timeout(SHUTDOWN_DEADLINE, drain).await.is_err() {
            warn!("shutdown deadline exceeded; remaining pipeline tasks were abandoned");
        }

        self.cancel = CancellationToken::new();
    }
}

/// Watches for the device-loss signal a stream error callback raises in
/// [`Stats`] and drives [`device::reopen_after_loss`] when it fires,
/// swapping the recovered device into `device_slot` on success (spec
/// §4.1/§7: "re-open, 1/s, up to 10 attempts, then enter Error mode").
/// Exits when `cancel` fires, same as the other three pipeline tasks.
async fn watch_device(
    device_slot: Arc<SyncMutex<Option<AudioDevice>>>,
    stats: Arc<Stats>,
    policy: ReopenPolicy,
    input_cfg: DeviceConfig,
    output_cfg: DeviceConfig,
    raw_tx: mpsc::Sender<DeviceBlock>,
    sample_rx: crossbeam_channel::Receiver<f32>,
    dashboard_updates: mpsc::Sender<DashboardUpdate>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            () = cancel.cancelled() => return,
            () = tokio::time::sleep(DEVICE_WATCH_POLL_INTERVAL) => {}
        }

        if !stats.take_device_lost() {
            continue;
        }

        warn!("audio device lost; attempting to reopen");
        if let Some(mut device) = device_slot.lock().take() {
            device.stop();
        }
        let _ = dashboard_updates.send(DashboardUpdate::SetMode(Mode::Thinking)).await;

        let make_sink = {
            let raw_tx = raw_tx.clone();
            move || {
                let raw_tx = raw_tx.clone();
                move |block: DeviceBlock| {
                    let _ = raw_tx.try_send(block);
                }
            }
        };
        let make_source = {
            let sample_rx = sample_rx.clone();
            move || {
                let sample_rx = sample_rx.clone();
                move |frames: usize| playback::pull_samples(&sample_rx, frames)
            }
        };

        match device::reopen_after_loss(
            &input_cfg,
            &output_cfg,
            Arc::clone(&stats),
            policy,
            make_sink,
            make_source,
        )
        .await
        {
            Ok(mut reopened) => {
                if cancel.is_cancelled() {
                    reopened.stop();
                    return;
                }
                *device_slot.lock() = Some(reopened);
                info!("voice runtime recovered after device loss");
                let _ = dashboard_updates.send(DashboardUpdate::SetMode(Mode::Listening)).await;
            }
            Err(e) => {
                error!("giving up on device reopen: {e}");
                let (category, remediation) = e.user_message();
                let _ = dashboard_updates
                    .send(DashboardUpdate::ErrorBanner(category, remediation))
                    .await;
                let _ = dashboard_updates.send(DashboardUpdate::SetMode(Mode::Error)).await;
                return;
            }
        }
    }
}
