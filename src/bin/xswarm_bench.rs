//! Engine step-latency baseline harness, run offline against the stub or
//! a loaded model with no audio device or dashboard involved.

use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use xswarm_voice::condition::ConditionBuilder;
use xswarm_voice::neural::stub::StubEngine;
use xswarm_voice::neural::{SpeechEngine, FRAME_PERIOD};
use xswarm_voice::persona::Persona;
use xswarm_voice::test_utils::sine_frames;

struct BenchConfig {
    frames: u64,
    tone_hz: f32,
}

#[derive(Serialize)]
struct BenchReport {
    frames: u64,
    over_budget_steps: u64,
    over_budget_fraction: f64,
    mean_step_micros: f64,
    max_step_micros: u128,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("xswarm-bench failed: {e}");
        std::process::exit(1);
    }
}

fn run() -> xswarm_voice::Result<()> {
    let config = BenchConfig {
        frames: 1_000,
        tone_hz: 440.0,
    };
    let report = generate_baseline_report(&config)?;

    let output_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("xswarm")
        .join("diagnostics");
    std::fs::create_dir_all(&output_dir)?;
    let output_path = output_dir.join("engine-latency-baseline.json");
    std::fs::write(&output_path, serde_json::to_vec_pretty(&report).unwrap())?;

    let json = serde_json::to_string_pretty(&report)
        .map_err(|e| xswarm_voice::VoiceError::Pipeline(format!("failed to encode baseline report: {e}")))?;
    println!("{json}");
    println!("saved baseline report: {}", output_path.display());
    Ok(())
}

fn generate_baseline_report(config: &BenchConfig) -> xswarm_voice::Result<BenchReport> {
    let mut engine = StubEngine::new();
    let condition_builder = ConditionBuilder::new();
    let persona = Persona::fallback();
    let condition = condition_builder.build(&persona, None);
    let session = engine.begin_session(&condition)?;

    let frames = sine_frames(config.frames, config.tone_hz);
    let mut over_budget = 0u64;
    let mut total_micros: u128 = 0;
    let mut max_micros: u128 = 0;

    for frame in &frames {
        let started = Instant::now();
        engine.step_frame(session, frame, None)?;
        let elapsed = started.elapsed();
        let micros = elapsed.as_micros();
        total_micros += micros;
        max_micros = max_micros.max(micros);
        if elapsed > FRAME_PERIOD {
            over_budget += 1;
        }
    }

    Ok(BenchReport {
        frames: config.frames,
        over_budget_steps: over_budget,
        over_budget_fraction: over_budget as f64 / config.frames as f64,
        mean_step_micros: total_micros as f64 / config.frames as f64,
        max_step_micros: max_micros,
    })
}
