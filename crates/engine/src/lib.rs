//! # Groundwire Engine
//!
//! Answer engine implementations. Currently one: the OpenAI-compatible
//! chat-completions client, which covers the vast majority of hosted and
//! local LLM endpoints.

mod openai_compat;

pub use openai_compat::OpenAiCompatEngine;
