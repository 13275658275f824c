//! Routing result types and the low-confidence sentinel.

use serde::{Deserialize, Serialize};

use crate::engine::Usage;

/// The reserved marker the engine's direct-answer prompt instructs the
/// model to emit verbatim, and nothing else, when it lacks confidence.
///
/// This is a soft contract enforced only by prompt text: nothing stops a
/// model from emitting the sentinel inside a legitimate longer answer.
/// Routing therefore treats only an *exact* trimmed match as low
/// confidence, and the streaming path withholds partial output until the
/// buffer exceeds [`SENTINEL_HOLD_CHARS`] so a UI never flashes the
/// sentinel before it can be disambiguated from a real answer.
pub const SENTINEL: &str = "NEED_WIKI";

/// Buffering threshold for streamed output; must exceed `SENTINEL.len()`.
pub const SENTINEL_HOLD_CHARS: usize = 10;

/// Where an answer came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Answered from the model's own knowledge
    ModelOnly,
    /// Answered using retrieved encyclopedia text
    Grounded,
    /// Neither the model nor retrieval could answer
    Unavailable,
}

impl std::fmt::Display for Provenance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::ModelOnly => "model",
            Self::Grounded => "retrieval",
            Self::Unavailable => "none",
        };
        write!(f, "{name}")
    }
}

/// The outcome of routing one user turn. Produced once, never mutated;
/// its text becomes the content of the appended assistant turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingResult {
    /// The answer text
    pub text: String,

    /// Where the answer came from
    pub provenance: Provenance,

    /// Title of the grounding page, for `Grounded` answers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grounding_title: Option<String>,

    /// Usage of the final engine call that produced the text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}
