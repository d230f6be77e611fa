//! Boundary-aware text segmentation.
//!
//! Long inputs are split into model-sized chunks along natural boundaries,
//! preferring paragraph breaks over sentence endings over word boundaries.
//! A single token longer than the chunk ceiling is hard-cut at character
//! level so segmentation terminates on any input.

/// A contiguous piece of the input text, synthesized independently.
///
/// Indices are 0-based and contiguous; concatenating chunk contents in index
/// order recovers the trimmed input up to whitespace normalization at the
/// split points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    pub index: usize,
    pub content: String,
}

/// Split `text` into ordered chunks of at most `max_chars_per_chunk`
/// characters (Unicode scalar values).
///
/// With chunking disabled, or when the trimmed text already fits, the whole
/// text comes back as a single chunk. Whitespace-only input yields no chunks;
/// callers reject it before segmentation.
pub fn segment(text: &str, max_chars_per_chunk: usize, chunking_enabled: bool) -> Vec<TextChunk> {
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }

    if !chunking_enabled || char_len(text) <= max_chars_per_chunk {
        return vec![TextChunk {
            index: 0,
            content: text.to_string(),
        }];
    }

    tracing::debug!(
        chars = char_len(text),
        max_chars_per_chunk,
        "chunking oversized input"
    );

    // Paragraphs that fit stay whole; oversized ones are broken down at
    // sentence and word level first, then everything is greedily repacked.
    let mut units: Vec<String> = Vec::new();
    for paragraph in split_paragraphs(text) {
        if char_len(&paragraph) <= max_chars_per_chunk {
            units.push(paragraph);
        } else {
            units.extend(split_paragraph(&paragraph, max_chars_per_chunk));
        }
    }

    pack_units(&units, max_chars_per_chunk, "\n\n")
        .into_iter()
        .enumerate()
        .map(|(index, content)| TextChunk { index, content })
        .collect()
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Split on blank-line runs, trimming each paragraph.
fn split_paragraphs(text: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current = String::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.trim().is_empty() {
                paragraphs.push(current.trim().to_string());
            }
            current.clear();
        } else {
            if !current.is_empty() {
                current.push('\n');
            }
            current.push_str(line);
        }
    }
    if !current.trim().is_empty() {
        paragraphs.push(current.trim().to_string());
    }
    paragraphs
}

/// Break an oversized paragraph into sentence-packed chunks, falling back to
/// word boundaries for sentences that still exceed the ceiling.
fn split_paragraph(paragraph: &str, max_chars: usize) -> Vec<String> {
    let sentences = split_sentences(paragraph);
    let mut chunks = Vec::new();
    for chunk in pack_units(&sentences, max_chars, " ") {
        if char_len(&chunk) <= max_chars {
            chunks.push(chunk);
        } else {
            chunks.extend(split_by_words(&chunk, max_chars));
        }
    }
    chunks
}

/// Split a paragraph at sentence endings: a run of `.`, `!` or `?` followed
/// by whitespace. The punctuation stays with its sentence.
fn split_sentences(paragraph: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = paragraph.chars().peekable();

    while let Some(c) = chars.next() {
        current.push(c);
        if matches!(c, '.' | '!' | '?') {
            while let Some(&next) = chars.peek() {
                if matches!(next, '.' | '!' | '?') {
                    current.push(next);
                    chars.next();
                } else {
                    break;
                }
            }
            // Only a boundary when trailed by whitespace; "3.14" stays whole.
            if chars.peek().map_or(true, |next| next.is_whitespace()) {
                while chars.peek().is_some_and(|next| next.is_whitespace()) {
                    chars.next();
                }
                let sentence = current.trim();
                if !sentence.is_empty() {
                    sentences.push(sentence.to_string());
                }
                current.clear();
            }
        }
    }

    let tail = current.trim();
    if !tail.is_empty() {
        sentences.push(tail.to_string());
    }
    sentences
}

/// Split at word boundaries; tokens longer than the ceiling are hard-cut at
/// character level.
fn split_by_words(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in text.split_whitespace() {
        let word_len = char_len(word);

        if word_len > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            chunks.extend(hard_cut(word, max_chars));
            continue;
        }

        if !current.is_empty() && current_len + 1 + word_len > max_chars {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if current.is_empty() {
            current.push_str(word);
            current_len = word_len;
        } else {
            current.push(' ');
            current.push_str(word);
            current_len += 1 + word_len;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Last resort for a single token with no split points.
fn hard_cut(token: &str, max_chars: usize) -> Vec<String> {
    token
        .chars()
        .collect::<Vec<char>>()
        .chunks(max_chars)
        .map(|piece| piece.iter().collect())
        .collect()
}

/// Greedily accumulate units into chunks, joining with `sep`, closing the
/// current chunk when the next unit would push it past `max_chars`. A unit
/// that alone exceeds the ceiling becomes its own chunk and is handled by
/// the caller's next split level.
fn pack_units(units: &[String], max_chars: usize, sep: &str) -> Vec<String> {
    let sep_len = char_len(sep);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for unit in units {
        let unit_len = char_len(unit);
        if !current.is_empty() && current_len + sep_len + unit_len > max_chars {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if current.is_empty() {
            current.push_str(unit);
            current_len = unit_len;
        } else {
            current.push_str(sep);
            current.push_str(unit);
            current_len += sep_len + unit_len;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalized(s: &str) -> String {
        s.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    fn reassemble(chunks: &[TextChunk]) -> String {
        normalized(
            &chunks
                .iter()
                .map(|c| c.content.as_str())
                .collect::<Vec<_>>()
                .join(" "),
        )
    }

    #[test]
    fn short_input_is_a_single_trimmed_chunk() {
        let chunks = segment("  Hello world.  ", 1200, true);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].index, 0);
        assert_eq!(chunks[0].content, "Hello world.");
    }

    #[test]
    fn chunking_disabled_returns_everything_in_one_chunk() {
        let text = "word ".repeat(500);
        let chunks = segment(&text, 100, false);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, text.trim());
    }

    #[test]
    fn whitespace_only_input_yields_no_chunks() {
        assert!(segment("   \n\t  ", 1200, true).is_empty());
    }

    #[test]
    fn plain_prose_packs_to_the_expected_chunk_count() {
        // ~3000 chars of short sentences against a 1200-char ceiling.
        let text = "The quick brown fox jumps over the lazy dog. ".repeat(66);
        assert!(text.trim().len() >= 2900);

        let chunks = segment(&text, 1200, true);
        assert_eq!(chunks.len(), 3);
        for chunk in &chunks {
            assert!(chunk.content.chars().count() <= 1200);
            assert!(!chunk.content.is_empty());
        }
        assert_eq!(reassemble(&chunks), normalized(&text));
    }

    #[test]
    fn indices_are_contiguous_from_zero() {
        let text = "One sentence here. ".repeat(50);
        let chunks = segment(&text, 100, true);
        assert!(chunks.len() > 1);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.index, i);
        }
    }

    #[test]
    fn paragraph_breaks_are_preferred_split_points() {
        let text = format!("{}\n\n{}", "alpha beta gamma.", "delta epsilon zeta.");
        let chunks = segment(&text, 20, true);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].content, "alpha beta gamma.");
        assert_eq!(chunks[1].content, "delta epsilon zeta.");
    }

    #[test]
    fn sentences_split_on_terminal_punctuation_runs() {
        let sentences = split_sentences("Really?! Yes. Quite sure");
        assert_eq!(sentences, vec!["Really?!", "Yes.", "Quite sure"]);
    }

    #[test]
    fn decimal_points_do_not_end_sentences() {
        let sentences = split_sentences("Pi is 3.14159 roughly. Indeed.");
        assert_eq!(sentences, vec!["Pi is 3.14159 roughly.", "Indeed."]);
    }

    #[test]
    fn oversized_token_is_hard_cut_and_terminates() {
        let token = "x".repeat(2500);
        let chunks = segment(&token, 1000, true);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].content.len(), 1000);
        assert_eq!(chunks[1].content.len(), 1000);
        assert_eq!(chunks[2].content.len(), 500);
    }

    #[test]
    fn oversized_token_between_words_keeps_order() {
        let long = "y".repeat(150);
        let text = format!("start {long} end");
        let chunks = segment(&text, 100, true);
        assert_eq!(chunks[0].content, "start");
        assert_eq!(chunks[1].content, "y".repeat(100));
        assert_eq!(chunks[2].content, "y".repeat(50));
        assert_eq!(chunks[3].content, "end");
    }

    #[test]
    fn round_trip_preserves_every_word() {
        let text = "First paragraph with several sentences. Another one follows here.\n\n\
                    Second paragraph continues the story with more words. It keeps going. \
                    And going further still until the text is long enough to split."
            .repeat(4);
        let chunks = segment(&text, 120, true);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.content.chars().count() <= 120);
        }
        assert_eq!(reassemble(&chunks), normalized(&text));
    }

    #[test]
    fn multibyte_text_is_cut_on_char_boundaries() {
        let text = "ü".repeat(250);
        let chunks = segment(&text, 100, true);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].content.chars().count(), 100);
        assert_eq!(chunks[2].content.chars().count(), 50);
    }
}
