//! # Groundwire Retrieval
//!
//! Grounding retriever implementations. Currently one: the MediaWiki
//! action-API client used to fetch encyclopedia intro text.

mod wikipedia;

pub use wikipedia::WikipediaRetriever;
