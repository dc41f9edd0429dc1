//! Processing task (spec §4.10 task 2): the sole owner of the
//! [`SpeechEngine`] session. Pops input frames, steps the engine, updates
//! conditioning on persona swap, and forwards output frames and events to
//! the rest of the pipeline.

use crate::audio::frame_queue::{FrameProducer, FrameQueue};
use crate::audio::AudioFrame;
use crate::condition::ConditionBuilder;
use crate::dashboard::state::{EventKind, Mode};
use crate::dashboard::DashboardUpdate;
use crate::memory::ConversationMemory;
use crate::neural::{SpeechEngine, FRAME_PERIOD};
use crate::persona::runtime::PersonaRuntime;
use crate::persona::Persona;
use crate::stats::Stats;
use crate::wakeword::WakeWordDetector;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

pub struct ProcessingContext {
    pub engine: Box<dyn SpeechEngine>,
    pub input_queue: FrameQueue<AudioFrame>,
    pub output_producer: FrameProducer<crate::audio::OutputFrame>,
    pub persona_runtime: Arc<PersonaRuntime>,
    pub condition_builder: Arc<ConditionBuilder>,
    pub memory: Arc<ConversationMemory>,
    pub stats: Arc<Stats>,
    pub dashboard_updates: mpsc::Sender<DashboardUpdate>,
    pub cancel: CancellationToken,
}

pub async fn run(ctx: ProcessingContext) {
    let ProcessingContext {
        mut engine,
        mut input_queue,
        output_producer,
        persona_runtime,
        condition_builder,
        memory,
        stats,
        dashboard_updates,
        cancel,
    } = ctx;

    let mut active_persona: Arc<Persona> = persona_runtime.active();
    let mut detector = WakeWordDetector::new();
    detector.configure(active_persona.wake_words.iter().cloned(), 0.5);

    let condition = condition_builder.build(&active_persona, None);
    let session = match engine.begin_session(&condition) {
        Ok(session) => session,
        Err(e) => {
            error!("failed to start engine session: {e}");
            let (category, remediation) = e.user_message();
            let _ = dashboard_updates
                .send(DashboardUpdate::ErrorBanner(category, remediation))
                .await;
            return;
        }
    };

    let _ = dashboard_updates
        .send(DashboardUpdate::PersonaChanged(active_persona.name.clone()))
        .await;
    let _ = dashboard_updates.send(DashboardUpdate::SetMode(Mode::Listening)).await;

    loop {
        let frame = tokio::select! {
            () = cancel.cancelled() => break,
            frame = input_queue.pop() => match frame {
                Some(frame) => frame,
                None => break,
            },
        };

        let current = persona_runtime.active();
        if !Arc::ptr_eq(&current, &active_persona) {
            active_persona = current;
            detector.configure(active_persona.wake_words.iter().cloned(), detector.sensitivity());
            let condition = condition_builder.build(&active_persona, None);
            if let Err(e) = engine.update_conditions(session, &condition) {
                warn!("failed to update conditions after persona swap: {e}");
            }
            let _ = dashboard_updates
                .send(DashboardUpdate::PersonaChanged(active_persona.name.clone()))
                .await;
        }

        detector.feed(&frame);
        let _ = dashboard_updates
            .send(DashboardUpdate::InputAmplitude(detector.last_rms()))
            .await;

        let started = Instant::now();
        let step = match engine.step_frame(session, &frame, None) {
            Ok(step) => step,
            Err(e) => {
                error!("engine step failed: {e}");
                let (category, remediation) = e.user_message();
                let _ = dashboard_updates
                    .send(DashboardUpdate::ErrorBanner(category, remediation))
                    .await;
                if e.is_fatal_for_runtime() {
                    break;
                }
                continue;
            }
        };
        let over_budget = started.elapsed() > FRAME_PERIOD;
        stats.record_step(over_budget);

        if let Some(text) = &step.text_piece {
            detector.observe_text(text);
            if let Some(word) = detector.last_detected() {
                let _ = dashboard_updates
                    .send(DashboardUpdate::WakeWordDetected(word.to_owned()))
                    .await;
            }
            memory.add_assistant_message(text.clone());
            let _ = dashboard_updates
                .send(DashboardUpdate::ChatLine(format!("Assistant: {text}")))
                .await;
            let _ = dashboard_updates
                .send(DashboardUpdate::Event(EventKind::AssistantSpeech, text.clone()))
                .await;
        }

        let _ = dashboard_updates
            .send(DashboardUpdate::OutputAmplitude(crate::audio::rms(&step.output.samples)))
            .await;
        let _ = dashboard_updates
            .send(DashboardUpdate::StatsSummary(stats.budget_summary()))
            .await;

        // The processing task is the one producer spec §5 singles out as a
        // deliberate backpressure point: wait for room in the output queue
        // instead of dropping, since a full output queue means playback is
        // falling behind, not that this frame is disposable.
        if output_producer.push(step.output).await.is_err() {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VoiceConfig;
    use crate::neural::stub::StubEngine;
    use crate::persona::loader::InMemoryPersonaLoader;
    use std::time::Instant as StdInstant;

    fn audio_frame(seq: u64) -> AudioFrame {
        AudioFrame::new(vec![0.0; crate::audio::FRAME_SIZE], seq, StdInstant::now())
    }

    #[tokio::test]
    async fn processes_frames_and_forwards_output_until_cancelled() {
        let _ = VoiceConfig::default();
        let loader = InMemoryPersonaLoader::new(vec![]);
        let persona_runtime = Arc::new(PersonaRuntime::new(Persona::fallback(), Box::new(loader)));
        let memory = Arc::new(ConversationMemory::new(50, 10));
        let condition_builder = Arc::new(ConditionBuilder::new());
        let stats = Arc::new(Stats::new());
        let (dash_tx, mut dash_rx) = mpsc::channel(64);
        let cancel = CancellationToken::new();

        let (input_queue, input_producer): (FrameQueue<AudioFrame>, _) = FrameQueue::new(4);
        let (mut output_queue, output_producer): (FrameQueue<crate::audio::OutputFrame>, _) =
            FrameQueue::new(4);

        input_producer.try_push(audio_frame(0)).unwrap();
        input_producer.try_push(audio_frame(1)).unwrap();

        let cancel_clone = cancel.clone();
        let handle = tokio::spawn(run(ProcessingContext {
            engine: Box::new(StubEngine::new()),
            input_queue,
            output_producer,
            persona_runtime,
            condition_builder,
            memory,
            stats,
            dashboard_updates: dash_tx,
            cancel: cancel_clone,
        }));

        let first = output_queue.pop().await;
        assert!(first.is_some());
        let second = output_queue.pop().await;
        assert!(second.is_some());

        cancel.cancel();
        let _ = handle.await;
        drop(output_queue);
        while dash_rx.try_recv().is_ok() {}
    }
}
