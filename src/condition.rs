//! Turns `(Persona, Option<MemorySnippet>)` into engine conditioning
//! (spec §4.5). No teacher equivalent — the teacher's system-prompt
//! assembly lives inside its out-of-scope `fae_llm` agent plumbing; this
//! is re-derived generically, grounded on the same "format a prompt
//! string, cache by a hash of its inputs" shape that module uses.

use crate::memory::semantic::MemorySnippet;
use crate::neural::Condition;
use crate::persona::Persona;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Mutex;

fn persona_id(persona: &Persona) -> String {
    format!("{}@{}", persona.name, persona.version)
}

fn snippet_hash(snippet: Option<&MemorySnippet>) -> u64 {
    let mut hasher = DefaultHasher::new();
    snippet.map(|s| &s.text).hash(&mut hasher);
    hasher.finish()
}

/// Pure function of its inputs; caches a [`Condition`] per
/// `(persona_id, memory_snippet_hash)` (spec §4.5).
pub struct ConditionBuilder {
    cache: Mutex<HashMap<(String, u64), Condition>>,
}

impl Default for ConditionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConditionBuilder {
    pub fn new() -> Self {
        Self {
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Build (or return the cached) condition for this persona and
    /// optional memory snippet.
    ///
    /// Two mechanisms exist and must not be conflated (spec §9): this is
    /// always additive conditioning, never forced-text generation (that's
    /// reserved for the fixed greeting path in [`crate::neural::SpeechEngine`]).
    pub fn build(&self, persona: &Persona, snippet: Option<&MemorySnippet>) -> Condition {
        let key = (persona_id(persona), snippet_hash(snippet));

        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(cached) = cache.get(&key) {
            return cached.clone();
        }

        let mut text = format!(
            "{}\n[traits: {}]",
            persona.system_prompt,
            persona.traits.describe()
        );
        if let Some(snippet) = snippet {
            text.push_str(&format!("\n[memory: {}]", snippet.text));
        }

        let condition = Condition::from_text(text);
        cache.insert(key, condition.clone());
        condition
    }

    /// Drop all cached conditions (e.g. after a persona directory reload).
    pub fn clear_cache(&self) {
        self.cache.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn persona() -> Persona {
        Persona::fallback()
    }

    #[test]
    fn same_inputs_hit_the_cache() {
        let builder = ConditionBuilder::new();
        let p = persona();
        let c1 = builder.build(&p, None);
        let c2 = builder.build(&p, None);
        assert_eq!(c1, c2);
    }

    #[test]
    fn memory_snippet_changes_the_condition_but_not_verbatim_into_system_prompt() {
        let builder = ConditionBuilder::new();
        let p = persona();
        let snippet = MemorySnippet::new("likes jazz");
        let with_snippet = builder.build(&p, Some(&snippet));
        let without = builder.build(&p, None);
        assert_ne!(with_snippet, without);
        assert!(with_snippet.as_text().contains("likes jazz"));
        // It's additive conditioning text, not a forced-text token sequence.
        assert!(with_snippet.as_text().contains(&p.system_prompt));
    }

    #[test]
    fn different_personas_never_produce_the_same_condition() {
        let builder = ConditionBuilder::new();
        let mut p1 = persona();
        p1.name = "p1".into();
        let mut p2 = persona();
        p2.name = "p2".into();
        assert_ne!(builder.build(&p1, None), builder.build(&p2, None));
    }
}
