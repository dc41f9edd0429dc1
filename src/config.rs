//! Configuration types for the voice runtime.
//!
//! File/env discovery and merging (spec §6.3: `$XSWARM_PROJECT_DIR/config.*`
//! → `~/.config/xswarm/config.*` → built-in defaults) is an external
//! collaborator's job; this module owns only the shape of the merged
//! result and its defaults, grounded on `fae::config::SpeechConfig`'s
//! one-struct-per-concern layout.

use serde::{Deserialize, Serialize};

/// Engine device preference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DevicePreference {
    #[default]
    Auto,
    Cpu,
    Accelerator,
}

/// Engine weight quality/quantization tag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    #[default]
    Auto,
    Bf16,
    Q8,
    Q4,
}

/// Audio I/O configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Engine-native sample rate in Hz. Fixed contract value; present in
    /// the config for visibility, not meant to be changed.
    pub sample_rate: u32,
    /// Engine-native frame size in samples (80 ms at `sample_rate`).
    pub frame_size: usize,
    pub input_queue_capacity: usize,
    pub output_queue_capacity: usize,
    pub input_device: Option<String>,
    pub output_device: Option<String>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: crate::audio::ENGINE_SAMPLE_RATE,
            frame_size: crate::audio::FRAME_SIZE,
            input_queue_capacity: 16,
            output_queue_capacity: 16,
            input_device: None,
            output_device: None,
        }
    }
}

/// Neural engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub device: DevicePreference,
    pub quality: Quality,
    /// Resolved path to model weights. `None` selects the stub engine,
    /// which is the default so the crate runs out of the box without a
    /// downloaded model.
    pub model_path: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            device: DevicePreference::default(),
            quality: Quality::default(),
            model_path: None,
        }
    }
}

/// Wake word detection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WakeWordConfig {
    /// Sensitivity in `[0, 1]`; higher means more false positives.
    pub sensitivity: f32,
    /// Words merged with the active persona's wake words.
    pub common: Vec<String>,
}

impl Default for WakeWordConfig {
    fn default() -> Self {
        Self {
            sensitivity: 0.5,
            common: vec!["computer".to_owned(), "assistant".to_owned()],
        }
    }
}

/// Conversation memory configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    pub max_recent_messages: usize,
    pub max_archived_sessions: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            max_recent_messages: 50,
            max_archived_sessions: 10,
        }
    }
}

/// Dashboard layout mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayoutMode {
    #[default]
    Grid,
    MasterStack,
    Hsplit,
    Vsplit,
    Focus,
}

/// Responsive panel grid configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub enabled_panels: Vec<String>,
    pub layout_mode: LayoutMode,
    /// Column-width breakpoints below which panels progressively hide.
    pub breakpoints: Vec<u16>,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            enabled_panels: vec![
                "chat".to_owned(),
                "status".to_owned(),
                "activity_feed".to_owned(),
                "visualizer".to_owned(),
            ],
            layout_mode: LayoutMode::default(),
            breakpoints: vec![40, 60, 80, 120],
        }
    }
}

/// Theme configuration (the dashboard derives a 5-shade palette from this).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    pub base_color: String,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            base_color: "cyan".to_owned(),
        }
    }
}

/// Top-level merged configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceConfig {
    pub audio: AudioConfig,
    pub engine: EngineConfig,
    pub wake_word: WakeWordConfig,
    pub memory: MemoryConfig,
    pub layout: LayoutConfig,
    pub theme_base_color: ThemeConfig,
}

impl VoiceConfig {
    /// Parse a merged config from TOML text.
    ///
    /// File discovery/merging itself (the `$XSWARM_PROJECT_DIR` → `~/.config`
    /// → defaults chain) lives outside this crate; this is the narrow
    /// deserialization seam that layer calls into.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::VoiceError::Config`] if `text` is not valid
    /// TOML for this shape.
    pub fn from_toml(text: &str) -> crate::error::Result<Self> {
        toml::from_str(text).map_err(|e| crate::error::VoiceError::Config(e.to_string()))
    }
}
