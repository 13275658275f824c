//! The conversation session — an ordered, append-only store of turns.
//!
//! Each session exclusively owns its turn sequence and its running token
//! counter; there is no module-level state, so any number of independent
//! sessions can run side by side. Turns are destroyed on [`Session::clear`],
//! never mutated in place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::Usage;
use crate::turn::{Role, Turn};

/// Unique identifier for a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A conversation session: the memory the resolver and engine read.
///
/// Growth is unbounded within a session; no eviction. The session-scoped
/// token counter is purely observational and never affects routing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Unique session ID
    pub id: SessionId,

    /// Ordered user/assistant turns
    turns: Vec<Turn>,

    /// When this session was created
    pub created_at: DateTime<Utc>,

    /// Running total of tokens spent across all engine calls this session
    session_tokens: u64,
}

impl Session {
    /// Create a new empty session.
    pub fn new() -> Self {
        Self {
            id: SessionId::new(),
            turns: Vec::new(),
            created_at: Utc::now(),
            session_tokens: 0,
        }
    }

    /// Append a user turn.
    pub fn push_user(&mut self, content: impl Into<String>) {
        self.turns.push(Turn::user(content));
    }

    /// Append an assistant turn.
    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.turns.push(Turn::assistant(content));
    }

    /// The ordered turn sequence.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Number of turns stored.
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Drop all turns and reset the token counter.
    pub fn clear(&mut self) {
        self.turns.clear();
        self.session_tokens = 0;
    }

    /// Add an engine call's token usage to the session total.
    pub fn add_usage(&mut self, usage: &Usage) {
        self.session_tokens += u64::from(usage.total_tokens);
    }

    /// Total tokens spent across all engine calls this session.
    pub fn session_token_total(&self) -> u64 {
        self.session_tokens
    }

    /// Remove a trailing user turn left dangling by a failed engine call.
    ///
    /// Keeps the store retry-safe: a retry of the same utterance will not
    /// duplicate it. Returns whether a turn was removed.
    pub fn rollback_dangling_user(&mut self) -> bool {
        if self.turns.last().is_some_and(|t| t.role == Role::User) {
            self.turns.pop();
            true
        } else {
            false
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turns_append_in_order() {
        let mut session = Session::new();
        session.push_user("hello");
        session.push_assistant("hi there");
        assert_eq!(session.len(), 2);
        assert_eq!(session.turns()[0].role, Role::User);
        assert_eq!(session.turns()[1].role, Role::Assistant);
    }

    #[test]
    fn rollback_removes_only_trailing_user_turn() {
        let mut session = Session::new();
        session.push_user("first");
        session.push_assistant("answer");
        assert!(!session.rollback_dangling_user());
        assert_eq!(session.len(), 2);

        session.push_user("second");
        assert!(session.rollback_dangling_user());
        assert_eq!(session.len(), 2);
    }

    #[test]
    fn usage_accumulates_across_calls() {
        let mut session = Session::new();
        session.add_usage(&Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        });
        session.add_usage(&Usage {
            prompt_tokens: 20,
            completion_tokens: 7,
            total_tokens: 27,
        });
        assert_eq!(session.session_token_total(), 42);
    }

    #[test]
    fn clear_resets_turns_and_tokens() {
        let mut session = Session::new();
        session.push_user("hello");
        session.add_usage(&Usage {
            prompt_tokens: 1,
            completion_tokens: 1,
            total_tokens: 2,
        });
        session.clear();
        assert!(session.is_empty());
        assert_eq!(session.session_token_total(), 0);
    }
}
