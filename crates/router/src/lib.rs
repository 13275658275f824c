//! # Groundwire Router
//!
//! The orchestration core: decide, per user turn, whether to trust the
//! model's direct answer or to resolve the topic against conversation
//! memory, retrieve grounding text, and re-ask the model with that text
//! injected.
//!
//! # Flow
//!
//! 1. Append the utterance to the session
//! 2. Ask the engine directly (sentinel contract in the system prompt)
//! 3. Exact sentinel → resolve topic → retrieve → grounded re-ask
//! 4. Append the answer with its provenance tag
//!
//! Retrieval failures collapse into a fixed apology (`Unavailable`);
//! engine failures roll back the pending user turn and propagate.

pub mod accumulator;
pub mod event;
pub mod normalize;
mod prompts;
pub mod resolver;
pub mod router;

pub use accumulator::{AccumulatedReply, StreamAccumulator};
pub use event::RouteEvent;
pub use normalize::normalize;
pub use resolver::{ResolvedTopic, TopicResolver};
pub use router::{TurnRouter, APOLOGY};
