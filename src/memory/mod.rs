//! Short-horizon recency memory used for context injection (spec §4.6).
//!
//! The teacher's `fae::memory` is a full persistent profile/fact store
//! (SQLite + JSONL, audit log, semantic search over embeddings) — this
//! core explicitly scopes that down to recency-only memory (spec §1
//! Non-goals: "the core uses only short-horizon recency memory"). The
//! shape is grounded on `fae::memory::types` (typed records, `RwLock`
//! guarded store, bounded eviction) but reduced to the ring-buffer
//! contract in spec §4.6; the persistence/audit/embedding-search pieces of
//! the teacher are intentionally not carried over.

pub mod semantic;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Who said an utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Speaker {
    User,
    Assistant,
}

/// A single utterance (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub id: Uuid,
    pub timestamp: u64,
    pub speaker: Speaker,
    pub text: String,
    pub importance: f32,
}

/// A grouping of messages bounded by session start/end (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSession {
    pub session_id: Uuid,
    pub start_time: u64,
    pub end_time: Option<u64>,
    pub messages: VecDeque<ConversationMessage>,
}

impl ConversationSession {
    fn new(now: u64) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            start_time: now,
            end_time: None,
            messages: VecDeque::new(),
        }
    }
}

fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

struct State {
    current: ConversationSession,
    archived: VecDeque<ConversationSession>,
}

/// Thread-safe bounded ring of recent messages with session boundaries.
///
/// Thread safety is via a single `parking_lot::RwLock` (spec §4.6: "a
/// reader-writer primitive"; `parking_lot` is enrichment grounded on
/// `SinergaOptima-Dictum`'s workspace dependency of the same name, used
/// there for exactly this kind of shared, mostly-read state).
pub struct ConversationMemory {
    state: RwLock<State>,
    max_recent_messages: usize,
    max_archived_sessions: usize,
}

impl ConversationMemory {
    pub fn new(max_recent_messages: usize, max_archived_sessions: usize) -> Self {
        Self {
            state: RwLock::new(State {
                current: ConversationSession::new(now_unix()),
                archived: VecDeque::new(),
            }),
            max_recent_messages,
            max_archived_sessions,
        }
    }

    fn add_message(&self, speaker: Speaker, text: impl Into<String>) -> Uuid {
        let message = ConversationMessage {
            id: Uuid::new_v4(),
            timestamp: now_unix(),
            speaker,
            text: text.into(),
            importance: 0.5,
        };
        let id = message.id;

        let mut state = self.state.write();
        state.current.messages.push_back(message);
        while state.current.messages.len() > self.max_recent_messages {
            state.current.messages.pop_front();
        }
        id
    }

    pub fn add_user_message(&self, text: impl Into<String>) -> Uuid {
        self.add_message(Speaker::User, text)
    }

    pub fn add_assistant_message(&self, text: impl Into<String>) -> Uuid {
        self.add_message(Speaker::Assistant, text)
    }

    /// The most recent `n` messages, chronological (oldest of the window
    /// first). `O(n)`; never observes a half-written message because the
    /// read lock is held for the duration of the copy.
    pub fn recent(&self, n: usize) -> Vec<ConversationMessage> {
        let state = self.state.read();
        let len = state.current.messages.len();
        let skip = len.saturating_sub(n);
        state.current.messages.iter().skip(skip).cloned().collect()
    }

    /// A compact `"User: ... / Assistant: ..."` block for prompt context.
    pub fn context_for_prompt(&self, n: usize) -> String {
        self.recent(n)
            .iter()
            .map(|m| {
                let who = match m.speaker {
                    Speaker::User => "User",
                    Speaker::Assistant => "Assistant",
                };
                format!("{who}: {}", m.text)
            })
            .collect::<Vec<_>>()
            .join(" / ")
    }

    /// Archive the current session and open a new one.
    pub fn start_new_session(&self) -> Uuid {
        let mut state = self.state.write();
        let now = now_unix();
        let mut closed = std::mem::replace(&mut state.current, ConversationSession::new(now));
        closed.end_time = Some(now);
        let new_id = state.current.session_id;

        state.archived.push_back(closed);
        while state.archived.len() > self.max_archived_sessions {
            state.archived.pop_front();
        }
        new_id
    }

    /// `"session X, D minutes, N messages"`.
    pub fn snapshot_summary(&self) -> String {
        let state = self.state.read();
        let minutes = now_unix().saturating_sub(state.current.start_time) / 60;
        format!(
            "session {}, {} minutes, {} messages",
            short_id(state.current.session_id),
            minutes,
            state.current.messages.len()
        )
    }

    /// Clear the current session's messages (does not touch the archive).
    pub fn clear(&self) {
        self.state.write().current.messages.clear();
    }

    pub fn max_recent_messages(&self) -> usize {
        self.max_recent_messages
    }

    pub fn max_archived_sessions(&self) -> usize {
        self.max_archived_sessions
    }

    pub fn archived_session_count(&self) -> usize {
        self.state.read().archived.len()
    }
}

fn short_id(id: Uuid) -> String {
    id.to_string()[..8].to_owned()
}
