//! Persona definition, atomic hot-swap runtime, and the loader seam.

pub mod loader;
pub mod runtime;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// The seven numeric personality axes, each in `[0, 1]` (spec §3).
///
/// A closed record rather than a dynamic map — personas are a finite,
/// known set of fields (spec §9 REDESIGN FLAGS: "runtime-typed persona
/// dictionaries → sum types").
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TraitVector {
    pub formality: f32,
    pub enthusiasm: f32,
    pub extraversion: f32,
    pub agreeableness: f32,
    pub conscientiousness: f32,
    pub neuroticism: f32,
    pub openness: f32,
}

impl Default for TraitVector {
    fn default() -> Self {
        Self {
            formality: 0.5,
            enthusiasm: 0.5,
            extraversion: 0.5,
            agreeableness: 0.5,
            conscientiousness: 0.5,
            neuroticism: 0.5,
            openness: 0.5,
        }
    }
}

impl TraitVector {
    /// Clamp every axis into `[0, 1]`.
    pub fn clamped(mut self) -> Self {
        self.formality = self.formality.clamp(0.0, 1.0);
        self.enthusiasm = self.enthusiasm.clamp(0.0, 1.0);
        self.extraversion = self.extraversion.clamp(0.0, 1.0);
        self.agreeableness = self.agreeableness.clamp(0.0, 1.0);
        self.conscientiousness = self.conscientiousness.clamp(0.0, 1.0);
        self.neuroticism = self.neuroticism.clamp(0.0, 1.0);
        self.openness = self.openness.clamp(0.0, 1.0);
        self
    }

    /// A compact human-readable rendering used by [`crate::condition::ConditionBuilder`]
    /// when assembling the system-prompt text fed into conditioning.
    pub fn describe(&self) -> String {
        format!(
            "formality={:.2} enthusiasm={:.2} extraversion={:.2} agreeableness={:.2} \
             conscientiousness={:.2} neuroticism={:.2} openness={:.2}",
            self.formality,
            self.enthusiasm,
            self.extraversion,
            self.agreeableness,
            self.conscientiousness,
            self.neuroticism,
            self.openness,
        )
    }
}

/// Voice shaping parameters (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoiceParams {
    pub pitch: f32,
    pub speed: f32,
    pub tone_tag: ToneTag,
    pub quality: f32,
}

impl Default for VoiceParams {
    fn default() -> Self {
        Self {
            pitch: 0.0,
            speed: 1.0,
            tone_tag: ToneTag::Neutral,
            quality: 1.0,
        }
    }
}

/// Closed set of voice tone tags (avoids a free-text "tone" field being
/// read inconsistently downstream).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToneTag {
    Neutral,
    Warm,
    Crisp,
    Playful,
    Calm,
}

/// A named bundle of personality, voice, and wake-word settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Persona {
    pub name: String,
    pub version: String,
    pub description: String,
    pub wake_words: HashSet<String>,
    pub system_prompt: String,
    pub traits: TraitVector,
    pub voice: VoiceParams,
}

impl Persona {
    /// A minimal persona usable before any real persona has loaded, and by
    /// `--no-voice`/test startup paths.
    pub fn fallback() -> Self {
        Self {
            name: "default".to_owned(),
            version: "0.0.0".to_owned(),
            description: "Fallback persona used when none is configured.".to_owned(),
            wake_words: HashSet::new(),
            system_prompt: "You are a helpful voice assistant.".to_owned(),
            traits: TraitVector::default(),
            voice: VoiceParams::default(),
        }
    }
}

/// Lightweight projection of a [`Persona`] for `personas list` and the
/// settings view radio group (spec §3 SUPPLEMENT).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonaDescriptor {
    pub name: String,
    pub version: String,
    pub description: String,
}

impl From<&Persona> for PersonaDescriptor {
    fn from(p: &Persona) -> Self {
        Self {
            name: p.name.clone(),
            version: p.version.clone(),
            description: p.description.clone(),
        }
    }
}
