//! Caption text normalization.

use regex::Regex;

/// Clean raw caption text for downstream processing.
///
/// Strips bracketed non-speech annotations ([Music], (inaudible)), decodes
/// HTML entity escapes, and collapses runs of whitespace to single spaces.
/// Idempotent; unrecognized patterns pass through unchanged.
pub fn normalize(raw: &str) -> String {
    let mut text = raw.to_string();

    // Annotations and entity escapes can hide behind each other
    // ("&#91;Music&#93;"), so run both passes to a fixpoint.
    loop {
        let cleaned = decode_entities(&strip_annotations(&text));
        if cleaned == text {
            break;
        }
        text = cleaned;
    }

    collapse_whitespace(&text)
}

/// Remove [bracketed] and (parenthetical) non-speech markers.
fn strip_annotations(text: &str) -> String {
    let bracketed = Regex::new(r"\[[^\]]*\]").expect("Invalid regex");
    let parenthetical = Regex::new(r"\([^)]*\)").expect("Invalid regex");

    let text = bracketed.replace_all(text, " ");
    parenthetical.replace_all(&text, " ").into_owned()
}

/// Decode the entity escapes that show up in caption payloads.
pub(crate) fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#34;", "\"")
        .replace("&#39;", "'")
        .replace("&#91;", "[")
        .replace("&#93;", "]")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

fn collapse_whitespace(text: &str) -> String {
    let whitespace = Regex::new(r"\s+").expect("Invalid regex");
    whitespace.replace_all(text, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_non_speech_annotations() {
        assert_eq!(
            normalize("[Music] hello there (inaudible) world [Applause]"),
            "hello there world"
        );
    }

    #[test]
    fn test_decodes_entities() {
        assert_eq!(
            normalize("Tom &amp; Jerry said &quot;hi&quot; &#39;today&#39;"),
            "Tom & Jerry said \"hi\" 'today'"
        );
    }

    #[test]
    fn test_decodes_entity_hidden_annotation() {
        // A bracket arriving as a numeric escape still counts as an annotation
        assert_eq!(normalize("&#91;Music&#93; hello"), "hello");
    }

    #[test]
    fn test_collapses_whitespace() {
        assert_eq!(normalize("one\n\ntwo   three\tfour"), "one two three four");
    }

    #[test]
    fn test_idempotent() {
        let inputs = [
            "[Music] hello &amp; welcome\n\nto the   show",
            "plain text with no markup",
            "&amp;amp; double encoded",
            "unbalanced [bracket and (paren",
            "",
        ];

        for input in inputs {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "not idempotent for {:?}", input);
        }
    }

    #[test]
    fn test_unrecognized_patterns_pass_through() {
        assert_eq!(normalize("a <b> c"), "a <b> c");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   \n  "), "");
    }
}
