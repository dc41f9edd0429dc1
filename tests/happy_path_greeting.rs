//! Scenario 2 (spec §8): persona "demo" greets the user once over near-silence.

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use xswarm_voice::audio::frame_queue::FrameQueue;
use xswarm_voice::audio::{rms, AudioFrame, OutputFrame};
use xswarm_voice::condition::ConditionBuilder;
use xswarm_voice::dashboard::DashboardUpdate;
use xswarm_voice::memory::ConversationMemory;
use xswarm_voice::neural::stub::StubEngine;
use xswarm_voice::persona::loader::InMemoryPersonaLoader;
use xswarm_voice::persona::runtime::PersonaRuntime;
use xswarm_voice::persona::Persona;
use xswarm_voice::stats::Stats;
use xswarm_voice::supervisor::processing::{run, ProcessingContext};
use xswarm_voice::test_utils::silence_frame;

#[tokio::test]
async fn greeting_plays_and_is_recorded_in_memory_and_the_activity_feed() {
    let mut persona = Persona::fallback();
    persona.name = "demo".to_owned();
    persona.system_prompt = "You are a helpful voice assistant. Greet the user once.".to_owned();

    let persona_runtime = Arc::new(PersonaRuntime::new(
        persona,
        Box::new(InMemoryPersonaLoader::new(vec![])),
    ));
    let memory = Arc::new(ConversationMemory::new(50, 10));
    let condition_builder = Arc::new(ConditionBuilder::new());
    let stats = Arc::new(Stats::new());
    let (dash_tx, mut dash_rx) = mpsc::channel::<DashboardUpdate>(64);

    let (input_queue, input_producer): (FrameQueue<AudioFrame>, _) = FrameQueue::new(16);
    let (mut output_queue, output_producer): (FrameQueue<OutputFrame>, _) = FrameQueue::new(16);

    // One frame of near-silence is enough to observe the greeting; the
    // stub engine speaks on every step, so more frames would just repeat it.
    input_producer.try_push(silence_frame(0)).unwrap();
    drop(input_producer);

    let cancel = CancellationToken::new();
    let memory_for_run = Arc::clone(&memory);
    let handle = tokio::spawn(run(ProcessingContext {
        engine: Box::new(StubEngine::new()),
        input_queue,
        output_producer,
        persona_runtime,
        condition_builder,
        memory: memory_for_run,
        stats,
        dashboard_updates: dash_tx,
        cancel: cancel.clone(),
    }));

    let frame = output_queue.pop().await.expect("engine should emit one output frame");
    assert!(rms(&frame.samples) > 0.0, "greeting output must not be silent");

    cancel.cancel();
    let _ = handle.await;

    let mut saw_chat_line = false;
    while let Ok(update) = dash_rx.try_recv() {
        if let DashboardUpdate::ChatLine(text) = update {
            assert!(text.contains("Greet the user once."));
            saw_chat_line = true;
        }
    }
    assert!(saw_chat_line, "expected at least one assistant chat entry");
    assert_eq!(memory.recent(10).len(), 1);
}
