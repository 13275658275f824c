//! AnswerEngine trait — the abstraction over the LLM endpoint.
//!
//! An engine knows how to send an ordered turn sequence to a model and get
//! a response back, either as a complete text or as a stream of deltas
//! with a trailing usage summary.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::turn::Turn;

/// Configuration for an engine request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineRequest {
    /// The model to use (e.g., "big-pickle", "gpt-4o")
    pub model: String,

    /// Ordered message sequence (system turns included)
    pub messages: Vec<Turn>,

    /// Temperature (0.0 = deterministic, 1.0 = creative)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

fn default_temperature() -> f32 {
    0.3
}

/// Token usage information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Advisory rate-limit numbers reported by the endpoint.
///
/// Surfaced to the caller only — never used for flow control in the core.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RateLimit {
    /// Tokens remaining in the current window, if reported
    pub remaining: Option<u64>,

    /// Total token budget of the window, if reported
    pub limit: Option<u64>,
}

/// A complete (non-streaming) response from an engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineResponse {
    /// The generated text
    pub text: String,

    /// Token usage statistics
    pub usage: Option<Usage>,

    /// Advisory rate-limit metadata from response headers
    #[serde(default)]
    pub rate_limit: RateLimit,

    /// Which model actually responded (may differ from requested)
    pub model: String,
}

/// A single chunk in a streaming response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamChunk {
    /// Partial content delta
    #[serde(default)]
    pub content: Option<String>,

    /// Whether this is the final chunk
    #[serde(default)]
    pub done: bool,

    /// Usage info — may arrive on any chunk, typically the last, or never
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

/// A streaming response: ordered deltas plus side-channel metadata.
///
/// Usage travels on the final chunk rather than being stashed in shared
/// mutable state, so concurrent invocations cannot clobber each other.
pub struct EngineStream {
    /// Advisory rate-limit metadata, known as soon as headers arrive
    pub rate_limit: RateLimit,

    /// Ordered chunks; the channel closes after the `done` chunk
    pub chunks: tokio::sync::mpsc::Receiver<std::result::Result<StreamChunk, EngineError>>,
}

/// The core AnswerEngine trait.
///
/// The turn router calls `complete()` or `stream()` without knowing which
/// backend is wired in — pure polymorphism, and trivially stubbed in tests.
#[async_trait]
pub trait AnswerEngine: Send + Sync {
    /// A human-readable name for this engine (e.g., "opencode", "ollama").
    fn name(&self) -> &str;

    /// Send a request and get a complete response.
    async fn complete(&self, request: EngineRequest) -> std::result::Result<EngineResponse, EngineError>;

    /// Send a request and get a stream of response chunks.
    ///
    /// Default implementation calls `complete()` and wraps the result as a
    /// single done chunk.
    async fn stream(&self, request: EngineRequest) -> std::result::Result<EngineStream, EngineError> {
        let response = self.complete(request).await?;
        let (tx, rx) = tokio::sync::mpsc::channel(1);
        let _ = tx
            .send(Ok(StreamChunk {
                content: Some(response.text),
                done: true,
                usage: response.usage,
            }))
            .await;
        Ok(EngineStream {
            rate_limit: response.rate_limit,
            chunks: rx,
        })
    }
}
