//! Runtime counters shared between the pipeline tasks and the dashboard's
//! status widget (spec §2 SUPPLEMENT: `stats.over_budget_steps`,
//! `drops.input_full`, `drops.output_underflow` are named inline in the
//! distilled spec without a home; this gives them one).
//!
//! Grounded on `fae::diagnostics`-style plain-atomics-behind-`Arc`
//! counters: every field is independently updatable from whichever task
//! observes the event, with no lock contention between the audio
//! real-time callbacks and the processing/UI tasks.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Process-wide counters. Cheap to clone via `Arc<Stats>`; every task
/// holding a reference can update its own counters without coordination.
#[derive(Debug, Default)]
pub struct Stats {
    over_budget_steps: AtomicU64,
    total_steps: AtomicU64,
    input_full_drops: AtomicU64,
    output_underflow_drops: AtomicU64,
    device_lost: AtomicBool,
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one `step_frame` call, noting whether it exceeded the
    /// frame period budget (spec §4.4: "violations are counted ... but do
    /// not abort").
    pub fn record_step(&self, over_budget: bool) {
        self.total_steps.fetch_add(1, Ordering::Relaxed);
        if over_budget {
            self.over_budget_steps.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_input_full_drop(&self) {
        self.input_full_drops.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_output_underflow(&self) {
        self.output_underflow_drops.fetch_add(1, Ordering::Relaxed);
    }

    pub fn over_budget_steps(&self) -> u64 {
        self.over_budget_steps.load(Ordering::Relaxed)
    }

    pub fn total_steps(&self) -> u64 {
        self.total_steps.load(Ordering::Relaxed)
    }

    pub fn input_full_drops(&self) -> u64 {
        self.input_full_drops.load(Ordering::Relaxed)
    }

    pub fn output_underflow_drops(&self) -> u64 {
        self.output_underflow_drops.load(Ordering::Relaxed)
    }

    /// Raised from a `cpal` error callback when a stream errors out
    /// (device unplugged, format changed). Cleared by whoever reacts to it
    /// via [`Self::take_device_lost`], so it fires once per loss event.
    pub fn record_device_lost(&self) {
        self.device_lost.store(true, Ordering::Relaxed);
    }

    /// Reads and clears the device-lost flag in one step.
    pub fn take_device_lost(&self) -> bool {
        self.device_lost.swap(false, Ordering::Relaxed)
    }

    /// `"N/M steps over budget"` summary line for the status widget.
    pub fn budget_summary(&self) -> String {
        format!(
            "{}/{} steps over budget",
            self.over_budget_steps(),
            self.total_steps()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_step_tracks_total_and_over_budget_separately() {
        let stats = Stats::new();
        stats.record_step(false);
        stats.record_step(true);
        stats.record_step(true);
        assert_eq!(stats.total_steps(), 3);
        assert_eq!(stats.over_budget_steps(), 2);
    }

    #[test]
    fn drop_counters_are_independent() {
        let stats = Stats::new();
        stats.record_input_full_drop();
        stats.record_input_full_drop();
        stats.record_output_underflow();
        assert_eq!(stats.input_full_drops(), 2);
        assert_eq!(stats.output_underflow_drops(), 1);
    }

    #[test]
    fn device_lost_flag_clears_on_take() {
        let stats = Stats::new();
        assert!(!stats.take_device_lost());
        stats.record_device_lost();
        assert!(stats.take_device_lost());
        assert!(!stats.take_device_lost());
    }
}
