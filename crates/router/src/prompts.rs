//! Prompt text for the three engine calls the router makes.
//!
//! The sentinel contract lives in the direct prompt only; the grounded
//! prompt forbids fabrication beyond the supplied context and never
//! mentions the sentinel.

use groundwire_core::retrieval::GroundingDoc;
use groundwire_core::routing::SENTINEL;

/// System instruction for the direct (ungrounded) call.
pub(crate) fn direct_system_prompt() -> String {
    format!(
        "You are a knowledgeable assistant with memory of the full conversation. \
         Answer the user's latest question clearly and concisely using your own knowledge. \
         You have access to everything said earlier in the conversation — use it. \
         However, if you are NOT confident in your answer or the topic is too specific, \
         niche, or recent for you to answer accurately, respond with ONLY the word: {SENTINEL} \
         (nothing else, no explanation). Do NOT use {SENTINEL} if you genuinely know the answer."
    )
}

/// System instruction for the grounded re-ask.
pub(crate) const GROUNDED_SYSTEM_PROMPT: &str =
    "You are a knowledgeable assistant with memory of the full conversation. \
     You are given an encyclopedia article as extra context. \
     Use the conversation history AND the article context to answer the user's latest question \
     with a clear, concise summary. Do not fabricate information beyond what is provided.";

/// The grounding note injected as a system turn before the history.
pub(crate) fn grounding_note(doc: &GroundingDoc) -> String {
    format!(
        "[Encyclopedia article fetched for this query: '{}']\n\
         --- CONTEXT START ---\n{}\n--- CONTEXT END ---",
        doc.title, doc.body
    )
}

/// Single-message instruction for the topic resolver.
pub(crate) fn resolver_prompt(history_window: &str, utterance: &str) -> String {
    format!(
        "You are a search query resolver. \
         Given a conversation history and the user's latest message, \
         output ONLY a short, clear encyclopedia search query that captures what the user is asking about. \
         Resolve pronouns like 'it', 'that', 'the element', 'tell me more' to the actual topic. \
         Do NOT explain. Output ONLY the search query — nothing else.\n\n\
         Conversation so far:\n{history_window}\n\n\
         User's latest message: {utterance}\n\n\
         Search query:"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direct_prompt_embeds_sentinel() {
        let prompt = direct_system_prompt();
        assert!(prompt.contains(SENTINEL));
    }

    #[test]
    fn grounded_prompt_never_mentions_sentinel() {
        assert!(!GROUNDED_SYSTEM_PROMPT.contains(SENTINEL));
    }

    #[test]
    fn grounding_note_fences_body() {
        let note = grounding_note(&GroundingDoc {
            title: "Atom".into(),
            body: "An atom is the basic unit of matter.".into(),
        });
        assert!(note.contains("'Atom'"));
        assert!(note.contains("--- CONTEXT START ---"));
        assert!(note.contains("--- CONTEXT END ---"));
        assert!(note.contains("basic unit of matter"));
    }
}
