//! Scenario 1 (spec §8): microphone access denied.
//!
//! `AudioDevice::open` needs real hardware, so this exercises the part of
//! the scenario that doesn't: an engine session that fails to start
//! surfaces an error banner instead of a crash, and the processing loop
//! returns cleanly rather than panicking.

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use xswarm_voice::audio::frame_queue::FrameQueue;
use xswarm_voice::audio::{AudioFrame, OutputFrame};
use xswarm_voice::condition::ConditionBuilder;
use xswarm_voice::dashboard::DashboardUpdate;
use xswarm_voice::error::VoiceError;
use xswarm_voice::memory::ConversationMemory;
use xswarm_voice::neural::{Condition, SessionHandle, SpeechEngine, StepOutput, TokenSequence};
use xswarm_voice::persona::loader::InMemoryPersonaLoader;
use xswarm_voice::persona::runtime::PersonaRuntime;
use xswarm_voice::persona::Persona;
use xswarm_voice::stats::Stats;
use xswarm_voice::supervisor::processing::{run, ProcessingContext};

/// An engine whose `begin_session` always fails, standing in for a denied
/// microphone / unopenable device.
#[derive(Default)]
struct PermissionDeniedEngine;

impl SpeechEngine for PermissionDeniedEngine {
    fn begin_session(&mut self, _conditions: &Condition) -> xswarm_voice::Result<SessionHandle> {
        Err(VoiceError::PermissionDenied("microphone access denied".to_owned()))
    }

    fn step_frame(
        &mut self,
        _session: SessionHandle,
        _input: &AudioFrame,
        _force_text: Option<&TokenSequence>,
    ) -> xswarm_voice::Result<StepOutput> {
        unreachable!("begin_session always fails first")
    }

    fn update_conditions(&mut self, _session: SessionHandle, _new_conditions: &Condition) -> xswarm_voice::Result<()> {
        unreachable!("begin_session always fails first")
    }
}

#[tokio::test]
async fn denied_session_start_sends_a_banner_and_returns_without_panicking() {
    let persona_runtime = Arc::new(PersonaRuntime::new(
        Persona::fallback(),
        Box::new(InMemoryPersonaLoader::new(vec![])),
    ));
    let memory = Arc::new(ConversationMemory::new(50, 10));
    let condition_builder = Arc::new(ConditionBuilder::new());
    let stats = Arc::new(Stats::new());
    let (dash_tx, mut dash_rx) = mpsc::channel::<DashboardUpdate>(16);

    let (input_queue, _input_producer): (FrameQueue<AudioFrame>, _) = FrameQueue::new(4);
    let (output_queue, output_producer): (FrameQueue<OutputFrame>, _) = FrameQueue::new(4);
    drop(output_queue);

    run(ProcessingContext {
        engine: Box::new(PermissionDeniedEngine),
        input_queue,
        output_producer,
        persona_runtime,
        condition_builder,
        memory,
        stats,
        dashboard_updates: dash_tx,
        cancel: CancellationToken::new(),
    })
    .await;

    let mut saw_banner = false;
    while let Ok(update) = dash_rx.try_recv() {
        if let DashboardUpdate::ErrorBanner(category, _) = update {
            assert_eq!(category, "Microphone permission required");
            saw_banner = true;
        }
    }
    assert!(saw_banner, "expected an ErrorBanner update after a denied session start");
}
