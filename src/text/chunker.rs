//! Transcript chunking under a token budget.
//!
//! Splits normalized text on sentence boundaries, packing sentences into
//! chunks until the running token estimate would exceed the budget.

use serde::{Deserialize, Serialize};

/// Default token budget per chunk.
pub const DEFAULT_TOKEN_BUDGET: usize = 2000;

/// Rough approximation: 1 token ~= 4 characters.
const CHARS_PER_TOKEN: usize = 4;

/// A bounded, order-preserving slice of normalized transcript text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Position of this chunk in the transcript; authoritative ordering.
    pub index: usize,
    /// Text content.
    pub text: String,
    /// Estimated token count of `text`.
    pub token_estimate: usize,
}

impl Chunk {
    fn new(index: usize, text: String) -> Self {
        let token_estimate = estimate_tokens(&text);
        Self {
            index,
            text,
            token_estimate,
        }
    }
}

/// Cheap, deterministic token estimate (character count / 4, rounded up).
///
/// Exactness doesn't matter, only consistency across calls for the same
/// input.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(CHARS_PER_TOKEN)
}

/// Split text into ordered chunks whose token estimate stays within `budget`.
///
/// Sentences are never split unless a single sentence alone exceeds the
/// budget, in which case it is hard-split on word boundaries and each piece
/// becomes its own chunk. Concatenating the chunk texts in index order
/// reproduces the input's non-whitespace content exactly.
pub fn chunk_text(text: &str, budget: usize) -> Vec<Chunk> {
    let trimmed = text.trim();
    if trimmed.is_empty() || budget == 0 {
        return Vec::new();
    }

    // Short input: exactly one chunk, text untouched.
    if estimate_tokens(trimmed) <= budget {
        return vec![Chunk::new(0, trimmed.to_string())];
    }

    let mut chunks: Vec<Chunk> = Vec::new();
    let mut current = String::new();

    for sentence in split_sentences(trimmed) {
        if estimate_tokens(&sentence) > budget {
            // Over-long sentence: flush what we have, then hard-split it
            // into pieces that each stand alone as a chunk.
            flush(&mut chunks, &mut current);
            for piece in hard_split(&sentence, budget) {
                let index = chunks.len();
                chunks.push(Chunk::new(index, piece));
            }
            continue;
        }

        if current.is_empty() {
            current = sentence;
        } else if estimate_tokens(&current) + estimate_tokens(&sentence) > budget {
            flush(&mut chunks, &mut current);
            current = sentence;
        } else {
            let candidate = format!("{} {}", current, sentence);
            if estimate_tokens(&candidate) > budget {
                flush(&mut chunks, &mut current);
                current = sentence;
            } else {
                current = candidate;
            }
        }
    }

    flush(&mut chunks, &mut current);
    chunks
}

fn flush(chunks: &mut Vec<Chunk>, current: &mut String) {
    if !current.is_empty() {
        let index = chunks.len();
        chunks.push(Chunk::new(index, std::mem::take(current)));
    }
}

/// Split text into sentences, keeping terminators with their sentence.
///
/// A boundary is a run of `.`/`!`/`?` followed by whitespace or end of
/// input, so decimals and mid-token dots don't split.
fn split_sentences(text: &str) -> Vec<String> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < chars.len() {
        if matches!(chars[i].1, '.' | '!' | '?') {
            let mut j = i + 1;
            while j < chars.len() && matches!(chars[j].1, '.' | '!' | '?') {
                j += 1;
            }
            if j >= chars.len() || chars[j].1.is_whitespace() {
                let end = if j < chars.len() { chars[j].0 } else { text.len() };
                let sentence = text[start..end].trim();
                if !sentence.is_empty() {
                    sentences.push(sentence.to_string());
                }
                start = end;
                i = j;
                continue;
            }
        }
        i += 1;
    }

    let tail = text[start..].trim();
    if !tail.is_empty() {
        sentences.push(tail.to_string());
    }

    sentences
}

/// Break an over-long sentence into word-boundary pieces within the budget.
///
/// A single word longer than the whole budget stays intact as its own piece.
fn hard_split(sentence: &str, budget: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();

    for word in sentence.split_whitespace() {
        if current.is_empty() {
            current = word.to_string();
        } else {
            let candidate = format!("{} {}", current, word);
            if estimate_tokens(&candidate) > budget {
                pieces.push(std::mem::take(&mut current));
                current = word.to_string();
            } else {
                current = candidate;
            }
        }
    }

    if !current.is_empty() {
        pieces.push(current);
    }

    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strip_whitespace(s: &str) -> String {
        s.chars().filter(|c| !c.is_whitespace()).collect()
    }

    /// A sentence of exactly 399 characters so that n sentences joined by
    /// single spaces estimate to exactly 100n tokens.
    fn sentence(fill: char) -> String {
        let mut s: String = std::iter::repeat(fill).take(398).collect();
        s.push('.');
        s
    }

    #[test]
    fn test_short_input_single_chunk() {
        let text = "Just one short sentence. And another one.";
        let chunks = chunk_text(text, 2000);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].index, 0);
        assert_eq!(chunks[0].text, text);
    }

    #[test]
    fn test_empty_input_no_chunks() {
        assert!(chunk_text("", 2000).is_empty());
        assert!(chunk_text("   ", 2000).is_empty());
    }

    #[test]
    fn test_six_thousand_tokens_yields_three_chunks() {
        // 60 sentences x 100 estimated tokens, budget 2000 -> 3 chunks
        let text = (0..60).map(|_| sentence('a')).collect::<Vec<_>>().join(" ");
        assert_eq!(estimate_tokens(&text), 6000);

        let chunks = chunk_text(&text, 2000);
        assert_eq!(chunks.len(), 3);
        for chunk in &chunks {
            assert!(chunk.token_estimate <= 2000);
        }
    }

    #[test]
    fn test_concatenation_preserves_non_whitespace_content() {
        let text = "First sentence here. Second one follows! Third asks a question? \
                    Then a run-on with numbers like 3.14 inside it. Done.";
        for budget in [5, 10, 20, 2000] {
            let chunks = chunk_text(text, budget);
            let rejoined: String = chunks.iter().map(|c| c.text.as_str()).collect();
            assert_eq!(
                strip_whitespace(&rejoined),
                strip_whitespace(text),
                "content lost at budget {}",
                budget
            );
        }
    }

    #[test]
    fn test_chunks_respect_budget() {
        let text = (0..20).map(|_| sentence('b')).collect::<Vec<_>>().join(" ");
        let chunks = chunk_text(&text, 250);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(
                chunk.token_estimate <= 250,
                "chunk {} over budget: {}",
                chunk.index,
                chunk.token_estimate
            );
        }
    }

    #[test]
    fn test_overlong_sentence_is_hard_split_on_words() {
        // One sentence of ~500 tokens with plenty of word boundaries
        let long_sentence = format!("{}.", vec!["word"; 400].join(" "));
        let text = format!("Short lead-in. {} Short tail.", long_sentence);

        let chunks = chunk_text(&text, 100);
        for chunk in &chunks {
            assert!(chunk.token_estimate <= 100);
        }
        let rejoined: String = chunks.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(strip_whitespace(&rejoined), strip_whitespace(&text));
    }

    #[test]
    fn test_unsplittable_word_stands_alone() {
        // A single 800-char "word" cannot fit a 100-token budget; it must be
        // the sole content of its chunk.
        let giant: String = std::iter::repeat('x').take(800).collect();
        let text = format!("Small sentence. {} Another small one.", giant);

        let chunks = chunk_text(&text, 100);
        let over: Vec<&Chunk> = chunks.iter().filter(|c| c.token_estimate > 100).collect();
        assert_eq!(over.len(), 1);
        assert_eq!(over[0].text, giant);
    }

    #[test]
    fn test_indices_are_sequential() {
        let text = (0..30).map(|_| sentence('c')).collect::<Vec<_>>().join(" ");
        let chunks = chunk_text(&text, 500);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.index, i);
        }
    }

    #[test]
    fn test_estimate_is_deterministic() {
        let text = "some text to estimate";
        assert_eq!(estimate_tokens(text), estimate_tokens(text));
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
    }
}
