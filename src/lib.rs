//! A local, voice-first personal assistant built around a real-time,
//! full-duplex streaming speech-to-speech engine (spec §1 OVERVIEW).
//!
//! The binary crates (`xswarm`, `xswarm-bench`) are thin shells over this
//! library: [`supervisor::Supervisor`] owns the running pipeline,
//! [`dashboard::Dashboard`] owns the terminal UI, and the rest of the
//! modules are the building blocks each wires together.

pub mod audio;
pub mod condition;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod memory;
pub mod neural;
pub mod persona;
pub mod stats;
pub mod supervisor;
pub mod test_utils;
pub mod wakeword;

pub use error::{Result, VoiceError};
