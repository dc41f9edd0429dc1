//! The `SemanticMemory` interface (spec §1, §4.6).
//!
//! Long-term semantic memory backed by an embedding index is explicitly
//! out of scope: "an optional `SemanticMemory` interface is declared but
//! the implementation is not specified." This module declares only the
//! trait and the snippet type [`ConditionBuilder`](crate::condition::ConditionBuilder)
//! consumes; there is no default implementation. When absent,
//! `ConditionBuilder` receives `None` and conditions on persona alone.

/// A short passage retrieved from semantic memory, fed into conditioning
/// as an additive nudge — never spoken verbatim (spec §4.5).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemorySnippet {
    pub text: String,
}

impl MemorySnippet {
    /// Truncate to the 512-character contract limit (spec §4.5).
    pub fn new(text: impl Into<String>) -> Self {
        let mut text = text.into();
        if text.len() > 512 {
            text.truncate(512);
        }
        Self { text }
    }
}

/// Query interface for a semantic memory backend (embedding index, vector
/// search). No implementation ships with this crate.
pub trait SemanticMemory: Send + Sync {
    fn query(&self, text: &str, k: usize) -> Vec<MemorySnippet>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snippet_truncates_to_512_chars() {
        let long = "a".repeat(1000);
        let snippet = MemorySnippet::new(long);
        assert_eq!(snippet.text.len(), 512);
    }
}
