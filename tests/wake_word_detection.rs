//! Scenario 3 (spec §8): a configured wake word fires once per utterance.

use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use xswarm_voice::audio::frame_queue::FrameQueue;
use xswarm_voice::audio::{AudioFrame, OutputFrame};
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
async fn configured_wake_word_is_detected_from_the_engines_transcript() {
    let mut persona = Persona::fallback();
    persona.wake_words = HashSet::from(["computer".to_owned(), "assistant".to_owned()]);
    // The stub engine echoes the condition text back as its transcript, so
    // the wake word needs to appear in the persona's own prompt here.
    persona.system_prompt = "Hey computer, how can I help today?".to_owned();

    let persona_runtime = Arc::new(PersonaRuntime::new(
        persona,
        Box::new(InMemoryPersonaLoader::new(vec![])),
    ));
    let memory = Arc::new(ConversationMemory::new(50, 10));
    let condition_builder = Arc::new(ConditionBuilder::new());
    let stats = Arc::new(Stats::new());
    let (dash_tx, mut dash_rx) = mpsc::channel::<DashboardUpdate>(64);

    let (input_queue, input_producer): (FrameQueue<AudioFrame>, _) = FrameQueue::new(16);
    let (output_queue, output_producer): (FrameQueue<OutputFrame>, _) = FrameQueue::new(16);

    input_producer.try_push(silence_frame(0)).unwrap();
    drop(input_producer);

    let cancel = CancellationToken::new();
    let handle = tokio::spawn(run(ProcessingContext {
        engine: Box::new(StubEngine::new()),
        input_queue,
        output_producer,
        persona_runtime,
        condition_builder,
        memory,
        stats,
        dashboard_updates: dash_tx,
        cancel: cancel.clone(),
    }));

    let mut detections = Vec::new();
    let deadline = std::time::Instant::now() + std::time::Duration::from_secs(1);
    while std::time::Instant::now() < deadline {
        match dash_rx.recv().await {
            Some(DashboardUpdate::WakeWordDetected(word)) => {
                detections.push(word);
                break;
            }
            Some(_) => continue,
            None => break,
        }
    }

    cancel.cancel();
    let _ = handle.await;
    drop(output_queue);

    assert_eq!(detections, vec!["computer".to_owned()]);
}
