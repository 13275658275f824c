//! Error types for the Groundwire domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.
//!
//! The two collaborator errors have deliberately different recovery
//! policies: a [`RetrievalFailure`] is recovered locally by the turn
//! router into a fixed apology answer (provenance `Unavailable`), while
//! an [`EngineError`] is a turn-level failure that propagates to the
//! caller after the pending user turn has been rolled back.

use thiserror::Error;

/// The top-level error type for all Groundwire operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Answer engine errors ---
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Failures from the answer engine (LLM endpoint).
///
/// Never recovered locally: the router rolls back the dangling user turn
/// and surfaces the error, so a retry of the same utterance does not
/// duplicate history.
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by endpoint, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Failures from the grounding retriever (encyclopedia lookup).
///
/// Always recovered locally into an `Unavailable` answer; never escapes
/// the turn router.
#[derive(Debug, Clone, Error)]
pub enum RetrievalFailure {
    #[error("No results found for the query")]
    NoResults,

    #[error("Topic is ambiguous. Options include: {}", .0.join(", "))]
    Ambiguous(Vec<String>),

    #[error("No page found for '{0}'")]
    NotFound(String),

    #[error("Retrieval backend error: {0}")]
    Backend(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_error_displays_correctly() {
        let err = Error::Engine(EngineError::ApiError {
            status_code: 429,
            message: "Too many requests".into(),
        });
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Too many requests"));
    }

    #[test]
    fn ambiguous_failure_lists_candidates() {
        let err = RetrievalFailure::Ambiguous(vec!["Mercury (planet)".into(), "Mercury (element)".into()]);
        let text = err.to_string();
        assert!(text.contains("Mercury (planet)"));
        assert!(text.contains("Mercury (element)"));
    }

    #[test]
    fn not_found_names_topic() {
        let err = RetrievalFailure::NotFound("Xyzzyology".into());
        assert!(err.to_string().contains("Xyzzyology"));
    }
}
