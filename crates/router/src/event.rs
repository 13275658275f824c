//! Router-level streaming events.
//!
//! `RouteEvent` wraps engine stream chunks into higher-level events a
//! presentation layer can forward over SSE, WebSocket, or a terminal.

use groundwire_core::engine::Usage;
use groundwire_core::routing::Provenance;
use serde::{Deserialize, Serialize};

/// Events emitted by the router while servicing one user turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RouteEvent {
    /// Visible partial text (post sentinel-hold).
    Delta { content: String },

    /// Retrieval succeeded; a grounded re-ask is starting.
    Grounding { title: String },

    /// The turn is complete — final metadata.
    Done {
        provenance: Provenance,
        grounding_title: Option<String>,
        usage: Option<Usage>,
        session_tokens: u64,
    },

    /// An error occurred mid-turn.
    Error { message: String },
}

impl RouteEvent {
    /// SSE event name for this event type.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Delta { .. } => "delta",
            Self::Grounding { .. } => "grounding",
            Self::Done { .. } => "done",
            Self::Error { .. } => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_serialization_delta() {
        let event = RouteEvent::Delta {
            content: "Hello".into(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"delta""#));
        assert!(json.contains(r#""content":"Hello""#));
    }

    #[test]
    fn event_serialization_done() {
        let event = RouteEvent::Done {
            provenance: Provenance::Grounded,
            grounding_title: Some("Atom".into()),
            usage: Some(Usage {
                prompt_tokens: 10,
                completion_tokens: 20,
                total_tokens: 30,
            }),
            session_tokens: 30,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"done""#));
        assert!(json.contains(r#""provenance":"grounded""#));
        assert!(json.contains(r#""session_tokens":30"#));
    }

    #[test]
    fn event_type_names() {
        assert_eq!(
            RouteEvent::Delta { content: "x".into() }.event_type(),
            "delta"
        );
        assert_eq!(
            RouteEvent::Grounding { title: "x".into() }.event_type(),
            "grounding"
        );
        assert_eq!(
            RouteEvent::Error { message: "x".into() }.event_type(),
            "error"
        );
    }

    #[test]
    fn event_deserialization() {
        let json = r#"{"type":"grounding","title":"Atom"}"#;
        let event: RouteEvent = serde_json::from_str(json).unwrap();
        match event {
            RouteEvent::Grounding { title } => assert_eq!(title, "Atom"),
            _ => panic!("Wrong variant"),
        }
    }
}
