//! Scenario 4 (spec §8): persona swap while the engine is mid-stream.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
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

fn persona(name: &str, wake_word: &str) -> Persona {
    let mut p = Persona::fallback();
    p.name = name.to_owned();
    p.system_prompt = format!("{name} is speaking, say the word {wake_word}");
    p.wake_words = HashSet::from([wake_word.to_owned()]);
    p
}

#[tokio::test]
async fn swap_under_load_is_observed_within_a_few_frames_with_no_step_failure() {
    let p1 = persona("p1", "onewake");
    let p2 = persona("p2", "twowake");

    let persona_runtime = Arc::new(PersonaRuntime::new(
        p1,
        Box::new(InMemoryPersonaLoader::new(vec![])),
    ));
    let memory = Arc::new(ConversationMemory::new(50, 10));
    let condition_builder = Arc::new(ConditionBuilder::new());
    let stats = Arc::new(Stats::new());
    let (dash_tx, mut dash_rx) = mpsc::channel::<DashboardUpdate>(256);

    let (input_queue, input_producer): (FrameQueue<AudioFrame>, _) = FrameQueue::new(8);
    let (output_queue, output_producer): (FrameQueue<OutputFrame>, _) = FrameQueue::new(8);

    let cancel = CancellationToken::new();
    let handle = tokio::spawn(run(ProcessingContext {
        engine: Box::new(StubEngine::new()),
        input_queue,
        output_producer,
        persona_runtime: Arc::clone(&persona_runtime),
        condition_builder,
        memory,
        stats,
        dashboard_updates: dash_tx,
        cancel: cancel.clone(),
    }));

    input_producer.try_push(silence_frame(0)).unwrap();

    let mut saw_p1_chat = false;
    while let Some(update) = dash_rx.recv().await {
        if let DashboardUpdate::ChatLine(text) = update {
            assert!(text.contains("p1 is speaking"));
            saw_p1_chat = true;
            break;
        }
    }
    assert!(saw_p1_chat, "expected the first chat line to reflect p1");

    persona_runtime.swap(p2);

    for seq in 1..4 {
        input_producer.try_push(silence_frame(seq)).unwrap();
    }
    drop(input_producer);

    let mut saw_persona_changed = false;
    let mut saw_p2_chat = false;
    let mut saw_p2_wake_word = false;
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while tokio::time::Instant::now() < deadline {
        match dash_rx.recv().await {
            Some(DashboardUpdate::PersonaChanged(name)) if name == "p2" => saw_persona_changed = true,
            Some(DashboardUpdate::ChatLine(text)) if text.contains("p2 is speaking") => saw_p2_chat = true,
            Some(DashboardUpdate::WakeWordDetected(word)) if word == "twowake" => saw_p2_wake_word = true,
            Some(_) => {}
            None => break,
        }
        if saw_persona_changed && saw_p2_chat && saw_p2_wake_word {
            break;
        }
    }

    assert!(saw_persona_changed, "expected a PersonaChanged update for p2");
    assert!(saw_p2_chat, "expected a subsequent chat line to reflect p2 within a few frames");
    assert!(saw_p2_wake_word, "expected p2's wake word set to be active immediately after the swap");

    cancel.cancel();
    let _ = handle.await;
    drop(output_queue);
}
