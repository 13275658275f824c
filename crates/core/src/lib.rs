//! # Groundwire Core
//!
//! Domain types, traits, and error definitions for the Groundwire
//! answer-routing engine. This crate has **zero framework dependencies** —
//! it defines the domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! The two remote collaborators — the answer engine (an LLM endpoint) and
//! the grounding retriever (an encyclopedia lookup) — are defined as traits
//! here. Implementations live in their respective crates. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with scripted stub collaborators
//! - Clean dependency graph (all crates depend inward on core)

pub mod engine;
pub mod error;
pub mod retrieval;
pub mod routing;
pub mod session;
pub mod turn;

// Re-export key types at crate root for ergonomics
pub use engine::{AnswerEngine, EngineRequest, EngineResponse, EngineStream, RateLimit, StreamChunk, Usage};
pub use error::{EngineError, Error, Result, RetrievalFailure};
pub use retrieval::{GroundingDoc, GroundingRetriever};
pub use routing::{Provenance, RoutingResult, SENTINEL, SENTINEL_HOLD_CHARS};
pub use session::{Session, SessionId};
pub use turn::{Role, Turn};
