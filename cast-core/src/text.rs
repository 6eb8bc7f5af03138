//! Low-level text helpers shared by extraction and inference.
//!
//! Every offset in this module is a byte offset into the string it was
//! computed from, always on a char boundary.

use std::ops::Range;

/// Abbreviated titles whose trailing dot does not end a sentence.
pub(crate) const TITLE_ABBREVIATIONS: &[&str] = &["Mr", "Mrs", "Ms", "Dr", "St", "Prof", "Sr", "Jr"];

/// Truncate to at most `max_chars` characters without splitting a char.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn is_terminator(c: char) -> bool {
    matches!(c, '.' | '!' | '?' | '…')
}

fn is_closing_mark(c: char) -> bool {
    matches!(c, '"' | '”' | '’' | '\'' | ')')
}

fn is_quote_mark(c: char) -> bool {
    matches!(c, '"' | '“' | '”')
}

/// Whether the word ending right before `dot` is a title abbreviation.
fn ends_with_title(text: &str, dot: usize) -> bool {
    let before = &text[..dot];
    let word_start = before
        .rfind(|c: char| !c.is_alphabetic())
        .map(|i| i + before[i..].chars().next().map_or(1, char::len_utf8))
        .unwrap_or(0);
    TITLE_ABBREVIATIONS.contains(&&before[word_start..])
}

/// Find where the sentence that contains `from` ends.
///
/// Returns the byte offset just past the terminator (and any closing quotes
/// that follow it), or `text.len()` when the text runs out first.
pub fn sentence_end(text: &str, from: usize) -> usize {
    let mut chars = text[from..].char_indices().peekable();
    while let Some((rel, c)) = chars.next() {
        let idx = from + rel;
        if c == '\n' {
            return idx;
        }
        if !is_terminator(c) || (c == '.' && ends_with_title(text, idx)) {
            continue;
        }

        let mut end = idx + c.len_utf8();
        while let Some(&(rel, next)) = chars.peek() {
            if is_terminator(next) || is_closing_mark(next) {
                end = from + rel + next.len_utf8();
                chars.next();
            } else {
                break;
            }
        }

        // `"Stop!" he shouted.` is one sentence.
        let rest = text[end..].trim_start();
        let continues_lowercase = rest.chars().next().is_some_and(char::is_lowercase);
        let at_break = end == text.len() || text[end..].starts_with(char::is_whitespace);
        if at_break && !continues_lowercase {
            return end;
        }
    }
    text.len()
}

/// Byte ranges of trimmed, non-empty sentences.
pub fn sentence_spans(text: &str) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    let mut start = 0;
    while start < text.len() {
        let end = sentence_end(text, start);
        let raw = &text[start..end];
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            let lead = raw.len() - raw.trim_start().len();
            spans.push(start + lead..start + lead + trimmed.len());
        }
        // A bare newline terminator is skipped so the loop always advances.
        start = if end == start { end + 1 } else { end };
        while start < text.len() && !text.is_char_boundary(start) {
            start += 1;
        }
    }
    spans
}

/// Split text into trimmed, non-empty sentences.
pub fn split_sentences(text: &str) -> Vec<&str> {
    sentence_spans(text)
        .into_iter()
        .map(|span| &text[span])
        .collect()
}

/// Byte spans `(open, close)` of balanced quotations, marks included.
///
/// An opening mark with no matching close is ignored rather than swallowing
/// the rest of the text.
pub fn quote_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut open: Option<usize> = None;
    for (idx, c) in text.char_indices() {
        match (open, c) {
            (None, '"' | '“') => open = Some(idx),
            (Some(start), '"' | '”') => {
                spans.push((start, idx + c.len_utf8()));
                open = None;
            }
            _ => {}
        }
    }
    spans
}

/// Replace the contents of quotations with spaces, keeping byte offsets.
///
/// Quote marks themselves are kept so clause boundaries survive masking.
pub fn mask_quotes(text: &str) -> String {
    let spans = quote_spans(text);
    if spans.is_empty() {
        return text.to_string();
    }

    let mut masked = String::with_capacity(text.len());
    for (idx, c) in text.char_indices() {
        let inside = spans
            .iter()
            .any(|&(open, close)| idx > open && idx + c.len_utf8() < close);
        if inside {
            masked.extend(std::iter::repeat(' ').take(c.len_utf8()));
        } else {
            masked.push(c);
        }
    }
    masked
}

/// Start of the clause containing `offset`.
///
/// Clauses end at sentence punctuation, semicolons and quote marks. Commas
/// do not end a clause.
pub fn clause_start(text: &str, offset: usize) -> usize {
    text[..offset]
        .char_indices()
        .rev()
        .find(|&(_, c)| is_terminator(c) || c == ';' || is_quote_mark(c))
        .map(|(idx, c)| idx + c.len_utf8())
        .unwrap_or(0)
}

/// All byte offsets where `word` occurs in `text` at word boundaries.
///
/// A word boundary is the start/end of string or a non-alphanumeric
/// character, so "Mary" matches in "Mary's" but not in "Maryanne".
/// Matching is case-sensitive.
pub fn word_offsets(text: &str, word: &str) -> Vec<usize> {
    if word.is_empty() || word.len() > text.len() {
        return Vec::new();
    }

    text.match_indices(word)
        .filter(|&(idx, _)| {
            let left_ok = text[..idx]
                .chars()
                .next_back()
                .map_or(true, |c| !c.is_alphanumeric());
            let right_ok = text[idx + word.len()..]
                .chars()
                .next()
                .map_or(true, |c| !c.is_alphanumeric());
            left_ok && right_ok
        })
        .map(|(idx, _)| idx)
        .collect()
}

/// Check if `text` contains `word` at word boundaries.
pub fn contains_word(text: &str, word: &str) -> bool {
    !word_offsets(text, word).is_empty()
}

/// 64-bit FNV-1a hash of the text.
///
/// Fast and deterministic across runs, but not collision resistant.
pub fn content_hash(text: &str) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    text.bytes().fold(OFFSET_BASIS, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(PRIME)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("", 3), "");
    }

    #[test]
    fn test_split_sentences_basic() {
        let sentences = split_sentences("Mary ran. John walked! Did Bob stay?");
        assert_eq!(sentences, vec!["Mary ran.", "John walked!", "Did Bob stay?"]);
    }

    #[test]
    fn test_split_sentences_keeps_dialogue_attribution() {
        let sentences = split_sentences("\"I'm fine,\" Mary said. Her brother John laughed.");
        assert_eq!(
            sentences,
            vec!["\"I'm fine,\" Mary said.", "Her brother John laughed."]
        );

        let sentences = split_sentences("\"Stop!\" he shouted. Mary froze.");
        assert_eq!(sentences, vec!["\"Stop!\" he shouted.", "Mary froze."]);
    }

    #[test]
    fn test_split_sentences_titles_and_newlines() {
        let sentences = split_sentences("Dr. Watson arrived.\nMrs. Hudson smiled");
        assert_eq!(sentences, vec!["Dr. Watson arrived.", "Mrs. Hudson smiled"]);
    }

    #[test]
    fn test_mask_quotes_keeps_offsets() {
        let text = "\"He left,\" Mary said.";
        let masked = mask_quotes(text);
        assert_eq!(masked.len(), text.len());
        assert!(!masked.contains("He"));
        assert!(masked.contains("Mary said."));
        assert!(masked.starts_with('"'));
    }

    #[test]
    fn test_mask_quotes_ignores_unbalanced() {
        let text = "\"He left, Mary said.";
        assert_eq!(mask_quotes(text), text);
    }

    #[test]
    fn test_clause_start() {
        let text = "Alice left. Bob said, he sighed";
        let he = text.find("he sighed").unwrap();
        assert_eq!(&text[clause_start(text, he)..he], " Bob said, ");
        assert_eq!(clause_start(text, 3), 0);
    }

    #[test]
    fn test_word_offsets() {
        assert_eq!(word_offsets("Mary met Mary's sister", "Mary"), vec![0, 9]);
        assert!(word_offsets("Maryanne", "Mary").is_empty());
        assert!(word_offsets("hello", "").is_empty());
        assert!(contains_word("Thor, the god", "Thor"));
        assert!(!contains_word("Thorin", "Thor"));
    }

    #[test]
    fn test_content_hash_stable() {
        assert_eq!(content_hash(""), 0xcbf2_9ce4_8422_2325);
        assert_eq!(content_hash("chapter"), content_hash("chapter"));
        assert_ne!(content_hash("chapter one"), content_hash("chapter two"));
    }
}
