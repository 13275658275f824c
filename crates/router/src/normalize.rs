//! Query normalization — strip conversational filler so the retriever
//! gets a clean topic.

/// Leading phrases stripped from an utterance, applied in order. A later
/// rule may further strip what an earlier rule exposed.
const STRIP_PREFIXES: &[&str] = &[
    "tell me about",
    "what is",
    "what are",
    "who is",
    "who was",
    "explain",
    "describe",
    "give me information on",
    "give me information about",
    "i want to know about",
    "can you tell me about",
    "do you know about",
    "search for",
    "look up",
];

/// Strip conversational filler prefixes from a raw utterance.
///
/// Pure and idempotent; rules are re-applied until a fixpoint so nested
/// filler ("can you tell me about what is X") fully unwraps. Never
/// returns an empty topic for non-empty input — if stripping consumes
/// everything, the trimmed original is returned unchanged.
pub fn normalize(utterance: &str) -> String {
    let original = utterance.trim();
    let mut cleaned = original.to_string();

    loop {
        let mut next = cleaned.clone();
        for prefix in STRIP_PREFIXES {
            next = strip_leading_phrase(&next, prefix);
        }
        if next == cleaned {
            break;
        }
        cleaned = next;
    }

    if cleaned.is_empty() {
        original.to_string()
    } else {
        cleaned
    }
}

/// Remove one case-insensitive leading phrase, requiring a word boundary
/// after it.
fn strip_leading_phrase(text: &str, phrase: &str) -> String {
    let matches = text
        .get(..phrase.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(phrase));
    if !matches {
        return text.to_string();
    }

    let rest = &text[phrase.len()..];
    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
        rest.trim_start().to_string()
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_single_prefix() {
        assert_eq!(normalize("Tell me about the Antikythera mechanism"), "the Antikythera mechanism");
        assert_eq!(normalize("what is rust"), "rust");
        assert_eq!(normalize("Search for  black holes"), "black holes");
    }

    #[test]
    fn strips_stacked_prefixes() {
        assert_eq!(normalize("can you tell me about what is an atom"), "an atom");
        assert_eq!(normalize("what is what is rust"), "rust");
    }

    #[test]
    fn requires_word_boundary() {
        // "describe" must not eat into "describes"
        assert_eq!(normalize("describes a process"), "describes a process");
        assert_eq!(normalize("whatever happened"), "whatever happened");
    }

    #[test]
    fn clean_input_unchanged() {
        assert_eq!(normalize("Antikythera mechanism"), "Antikythera mechanism");
    }

    #[test]
    fn idempotent() {
        for input in [
            "tell me about black holes",
            "can you tell me about what is an atom",
            "what is",
            "Paris",
            "  spaced out  ",
        ] {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn never_empty_for_nonempty_input() {
        // Everything strips away → fall back to the trimmed original
        assert_eq!(normalize("what is"), "what is");
        assert_eq!(normalize("  look up  "), "look up");
    }

    #[test]
    fn non_ascii_input_is_safe() {
        assert_eq!(normalize("什么是黑洞"), "什么是黑洞");
        assert_eq!(normalize("tell me about Ōsaka"), "Ōsaka");
    }
}
