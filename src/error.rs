//! Error taxonomy for the voice runtime.
//!
//! One variant per error kind in the spec's error handling design: the UI
//! never sees raw platform codes, only a category plus remediation text
//! (see [`VoiceError::user_message`]); full detail goes to `tracing`.

/// Top-level error type for the voice runtime.
#[derive(Debug, thiserror::Error)]
pub enum VoiceError {
    /// No matching audio device could be found.
    #[error("no audio device available: {0}")]
    NoDevice(String),

    /// The OS denied microphone/speaker access.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// The device doesn't support the requested format.
    #[error("unsupported audio format: {0}")]
    UnsupportedFormat(String),

    /// A previously open device was lost (unplugged, format changed).
    #[error("audio device lost: {0}")]
    DeviceLost(String),

    /// Generic audio I/O error not covered by a more specific variant.
    #[error("audio error: {0}")]
    Audio(String),

    /// Resampling failed.
    #[error("resampler error: {0}")]
    Resample(String),

    /// Neural engine model load failed.
    #[error("engine load failed: {0}")]
    EngineLoad(String),

    /// Neural engine step failed (accelerator error, OOM, device reset).
    #[error("engine step failed: {0}")]
    EngineStep(String),

    /// Persona not found / invalid.
    #[error("persona error: {0}")]
    Persona(String),

    /// Conversation memory error.
    #[error("memory error: {0}")]
    Memory(String),

    /// Invalid or missing configuration.
    #[error("config error: {0}")]
    Config(String),

    /// Pipeline / supervisor coordination error.
    #[error("pipeline error: {0}")]
    Pipeline(String),

    /// A bounded channel between tasks was closed or full in a context
    /// where that's an error rather than a handled backpressure signal.
    #[error("channel error: {0}")]
    Channel(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, VoiceError>;

impl VoiceError {
    /// A `(category, remediation)` pair suitable for a dashboard banner.
    ///
    /// The dashboard must never print raw platform error text (spec §7);
    /// this is the seam that enforces it. Full detail is still available
    /// via `Display`/`tracing::error!` in the caller.
    pub fn user_message(&self) -> (&'static str, &'static str) {
        match self {
            Self::NoDevice(_) => (
                "No audio device",
                "Connect a microphone/speaker and press V to retry.",
            ),
            Self::PermissionDenied(_) => (
                "Microphone permission required",
                "Grant microphone access in system settings, then press V.",
            ),
            Self::UnsupportedFormat(_) => (
                "Unsupported audio format",
                "Try a different input/output device in settings.",
            ),
            Self::DeviceLost(_) => (
                "Audio device disconnected",
                "Reconnect the device; xswarm will retry automatically.",
            ),
            Self::Audio(_) => ("Audio error", "Press V to restart the voice runtime."),
            Self::Resample(_) => ("Audio processing error", "Press V to restart."),
            Self::EngineLoad(_) => (
                "Model load failed",
                "Try a different quality setting in config, then restart.",
            ),
            Self::EngineStep(_) => (
                "Voice engine error",
                "Press V to restart the voice runtime.",
            ),
            Self::Persona(_) => (
                "Persona unavailable",
                "Press S to choose a different persona.",
            ),
            Self::Memory(_) => ("Memory error", "Conversation context may be incomplete."),
            Self::Config(_) => ("Configuration error", "Check your config file and restart."),
            Self::Pipeline(_) => ("Pipeline error", "Press V to restart the voice runtime."),
            Self::Channel(_) => ("Internal communication error", "Press V to restart."),
            Self::Io(_) => ("I/O error", "Check disk/file permissions and retry."),
        }
    }

    /// Whether this error should take the dashboard into `Error` mode.
    pub fn is_fatal_for_runtime(&self) -> bool {
        !matches!(self, Self::Memory(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_message_never_echoes_raw_detail() {
        let err = VoiceError::Audio("ALSA snd_pcm_open(-19) EIO raw code 0xdeadbeef".to_owned());
        let (category, remediation) = err.user_message();
        assert!(!category.contains("0xdeadbeef"));
        assert!(!remediation.contains("0xdeadbeef"));
    }

    #[test]
    fn memory_error_is_not_fatal() {
        assert!(!VoiceError::Memory("disk full".into()).is_fatal_for_runtime());
        assert!(VoiceError::DeviceLost("usb unplugged".into()).is_fatal_for_runtime());
    }
}
