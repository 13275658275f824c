//! Topic resolution against conversation memory.
//!
//! Turns "tell me more about its origin" into a concrete search topic by
//! showing the engine a bounded window of recent turns. With no history
//! there is nothing to resolve against, so the normalized utterance is
//! returned without an engine call.

use std::sync::Arc;

use groundwire_core::engine::{AnswerEngine, EngineRequest, Usage};
use groundwire_core::error::EngineError;
use groundwire_core::turn::{Role, Turn};
use tracing::debug;

use crate::normalize::normalize;
use crate::prompts;

/// How many trailing turns the resolver is shown.
const WINDOW_TURNS: usize = 6;

/// Per-turn character cap inside the window.
const WINDOW_TURN_CHARS: usize = 300;

/// A context-resolved search topic.
#[derive(Debug, Clone)]
pub struct ResolvedTopic {
    /// The concrete topic to hand to the retriever
    pub topic: String,
    /// Usage of the resolver's engine call, if one was made
    pub usage: Option<Usage>,
}

/// Resolves ambiguous follow-up references using conversation history.
pub struct TopicResolver {
    engine: Arc<dyn AnswerEngine>,
    model: String,
}

impl TopicResolver {
    pub fn new(engine: Arc<dyn AnswerEngine>, model: impl Into<String>) -> Self {
        Self {
            engine,
            model: model.into(),
        }
    }

    /// Resolve the utterance into a concrete search topic.
    ///
    /// Engine errors propagate to the caller; the router treats them as
    /// retrieval failure rather than silently falling back to the raw
    /// utterance.
    pub async fn resolve(
        &self,
        utterance: &str,
        history: &[Turn],
    ) -> Result<ResolvedTopic, EngineError> {
        if history.is_empty() {
            return Ok(ResolvedTopic {
                topic: normalize(utterance),
                usage: None,
            });
        }

        let window = Self::history_window(history);
        let prompt = prompts::resolver_prompt(&window, utterance);

        let response = self
            .engine
            .complete(EngineRequest {
                model: self.model.clone(),
                messages: vec![Turn::user(prompt)],
                temperature: 0.0,
                max_tokens: Some(64),
            })
            .await?;

        // The model sometimes wraps the query in quotes
        let resolved = response
            .text
            .trim()
            .trim_matches(|c| c == '"' || c == '\'')
            .trim()
            .to_string();

        let topic = if resolved.is_empty() {
            normalize(utterance)
        } else {
            resolved
        };

        debug!(utterance, topic, "Resolved search topic");

        Ok(ResolvedTopic {
            topic,
            usage: response.usage,
        })
    }

    /// Last [`WINDOW_TURNS`] turns, each capped at [`WINDOW_TURN_CHARS`]
    /// characters, rendered one per line.
    fn history_window(history: &[Turn]) -> String {
        let start = history.len().saturating_sub(WINDOW_TURNS);
        history[start..]
            .iter()
            .map(|turn| {
                let label = match turn.role {
                    Role::User => "User",
                    Role::Assistant => "Assistant",
                    Role::System => "System",
                };
                format!("{label}: {}", truncate_chars(&turn.content, WINDOW_TURN_CHARS))
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Truncate to at most `max` characters, respecting char boundaries.
fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
