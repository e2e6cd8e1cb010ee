//! Keyword occurrence counting and context extraction
//!
//! Matching is a left-to-right, non-overlapping substring scan. The
//! case-insensitive variant lowercases the text while remembering, for every
//! lowered byte, which original character produced it, so match ranges are
//! exact byte ranges of the original text even when lowercasing changes
//! lengths.
//!
//! Contexts are windows of whitespace tokens around the token that holds
//! the match, located through explicit token spans.

use std::ops::Range;

use crate::config::MatchCase;
use crate::loader::Document;

/// Tokens kept before the matched token
pub const CONTEXT_BEFORE: usize = 5;
/// Tokens kept after the matched token
pub const CONTEXT_AFTER: usize = 10;

/// Lowercased text with a map back to original character spans
struct FoldedText {
    folded: String,
    /// For each byte of `folded`, the original character's byte range
    origin: Vec<(usize, usize)>,
}

impl FoldedText {
    fn new(text: &str) -> Self {
        let mut folded = String::with_capacity(text.len());
        let mut origin = Vec::with_capacity(text.len());

        for (start, ch) in text.char_indices() {
            let end = start + ch.len_utf8();
            for lower in ch.to_lowercase() {
                folded.push(lower);
                origin.resize(folded.len(), (start, end));
            }
        }

        Self { folded, origin }
    }

    fn original_range(&self, range: Range<usize>) -> Range<usize> {
        let start = self.origin[range.start].0;
        let end = self.origin[range.end - 1].1;
        start..end
    }
}

/// Byte ranges of all non-overlapping keyword matches in `text`
pub fn find_matches(text: &str, keyword: &str, case: MatchCase) -> Vec<Range<usize>> {
    if keyword.is_empty() {
        return Vec::new();
    }

    match case {
        MatchCase::Sensitive => text
            .match_indices(keyword)
            .map(|(start, m)| start..start + m.len())
            .collect(),
        MatchCase::Insensitive => {
            let haystack = FoldedText::new(text);
            let needle = keyword.to_lowercase();

            let mut ranges: Vec<Range<usize>> = Vec::new();
            for (start, m) in haystack.folded.match_indices(&needle) {
                let range = haystack.original_range(start..start + m.len());
                // Two matches inside one expanded character collapse into one
                if ranges.last().map_or(true, |last| range.start >= last.end) {
                    ranges.push(range);
                }
            }
            ranges
        }
    }
}

/// Byte spans of whitespace-delimited tokens
pub fn token_spans(text: &str) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    let mut start = None;

    for (i, ch) in text.char_indices() {
        match (ch.is_whitespace(), start) {
            (true, Some(s)) => {
                spans.push(s..i);
                start = None;
            }
            (false, None) => start = Some(i),
            _ => {}
        }
    }
    if let Some(s) = start {
        spans.push(s..text.len());
    }

    spans
}

/// Context window for a match starting at byte `offset`
pub fn context_at(text: &str, tokens: &[Range<usize>], offset: usize) -> String {
    let word_index = tokens.partition_point(|t| t.end <= offset);
    let end = (word_index + CONTEXT_AFTER + 1).min(tokens.len());
    let start = word_index.saturating_sub(CONTEXT_BEFORE).min(end);

    tokens[start..end]
        .iter()
        .map(|t| &text[t.clone()])
        .collect::<Vec<_>>()
        .join(" ")
}

/// Matches of one keyword in one document
#[derive(Debug, Clone)]
pub struct DocumentMatches<'a> {
    pub document: &'a Document,
    pub count: usize,
    pub contexts: Vec<String>,
}

/// Count case-insensitive occurrences of `keyword` in every document.
///
/// Documents without a match are omitted; the rest keep their input order.
pub fn count_occurrences<'a>(documents: &'a [Document], keyword: &str) -> Vec<DocumentMatches<'a>> {
    documents
        .iter()
        .filter_map(|document| {
            let text = document.content.as_str();
            let ranges = find_matches(text, keyword, MatchCase::Insensitive);
            if ranges.is_empty() {
                return None;
            }

            let tokens = token_spans(text);
            let contexts = ranges
                .iter()
                .map(|r| context_at(text, &tokens, r.start))
                .collect();

            Some(DocumentMatches {
                document,
                count: ranges.len(),
                contexts,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::DocumentFormat;
    use proptest::prelude::*;
    use std::path::PathBuf;

    fn doc(name: &str, content: &str) -> Document {
        Document {
            filename: name.to_string(),
            filepath: PathBuf::from(name),
            format: DocumentFormat::Pdf,
            content: content.to_string(),
        }
    }

    #[test]
    fn test_case_insensitive_count() {
        let docs = vec![doc("a.pdf", "Rust rust RUST rUsT trust")];
        let matches = count_occurrences(&docs, "rust");

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].count, 5);
        assert_eq!(matches[0].contexts.len(), 5);
    }

    #[test]
    fn test_non_overlapping() {
        let docs = vec![doc("a.pdf", "aaaa aaa")];
        let matches = count_occurrences(&docs, "aa");
        assert_eq!(matches[0].count, 3);
        assert_eq!(
            find_matches("aaaa aaa", "aa", MatchCase::Insensitive),
            vec![0..2, 2..4, 5..7]
        );
    }

    #[test]
    fn test_zero_matches_are_omitted() {
        let docs = vec![doc("a.pdf", "nothing here"), doc("b.pdf", "keyword")];
        let matches = count_occurrences(&docs, "keyword");

        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].document.filename, "b.pdf");
    }

    #[test]
    fn test_context_window_sizes() {
        let words: Vec<String> = (0..40).map(|i| format!("w{i}")).collect();
        let mut text = words.join(" ");
        text = text.replace("w20 ", "KEY ");
        let docs = vec![doc("a.pdf", &text)];

        let matches = count_occurrences(&docs, "key");
        let context = &matches[0].contexts[0];
        let tokens: Vec<&str> = context.split(' ').collect();

        assert_eq!(tokens.len(), 16);
        assert_eq!(tokens[0], "w15");
        assert_eq!(tokens[5], "KEY");
        assert_eq!(tokens[15], "w30");
    }

    #[test]
    fn test_context_clamped_at_start_and_end() {
        let docs = vec![doc("a.pdf", "key one two three")];
        let matches = count_occurrences(&docs, "KEY");
        assert_eq!(matches[0].contexts[0], "key one two three");

        let docs = vec![doc("a.pdf", "one two three key")];
        let matches = count_occurrences(&docs, "key");
        assert_eq!(matches[0].contexts[0], "one two three key");
    }

    #[test]
    fn test_context_ignores_repeated_whitespace() {
        // Counting raw spaces would place the match two words too far right
        let docs = vec![doc("a.pdf", "a   b c d e f g h i j k l m n o p key q")];
        let matches = count_occurrences(&docs, "key");
        assert!(matches[0].contexts[0].starts_with("l m n o p key"));
    }

    #[test]
    fn test_match_inside_word_uses_that_word() {
        let tokens = token_spans("alpha (rusty) beta");
        assert_eq!(context_at("alpha (rusty) beta", &tokens, 7), "alpha (rusty) beta");
        assert_eq!(tokens, vec![0..5, 6..13, 14..18]);
    }

    #[test]
    fn test_unicode_lowercase_keeps_original_ranges() {
        // 'İ' lowercases to two characters
        let text = "İstanbul and ISTANBUL";
        let ranges = find_matches(text, "istanbul", MatchCase::Insensitive);
        assert_eq!(ranges.len(), 1);
        assert_eq!(&text[ranges[0].clone()], "ISTANBUL");

        let ranges = find_matches("Straße STRASSE", "straße", MatchCase::Insensitive);
        assert_eq!(ranges, vec![0..7]);
    }

    #[test]
    fn test_case_sensitive_policy() {
        assert_eq!(find_matches("Rust rust", "rust", MatchCase::Sensitive), vec![5..9]);
        assert_eq!(find_matches("Rust rust", "rust", MatchCase::Insensitive).len(), 2);
    }

    #[test]
    fn test_empty_keyword_finds_nothing() {
        assert!(find_matches("abc", "", MatchCase::Insensitive).is_empty());
    }

    proptest! {
        #[test]
        fn prop_count_equals_planted_occurrences(
            filler in proptest::collection::vec("[b-z ]{0,12}", 1..8),
            upper in proptest::collection::vec(any::<bool>(), 8),
        ) {
            // Filler never contains 'a', so only the planted keywords match
            let mut text = String::new();
            let mut planted = 0;
            for (i, chunk) in filler.iter().enumerate() {
                text.push_str(chunk);
                if i + 1 < filler.len() {
                    text.push_str(if upper[i] { "ALFA" } else { "alfa" });
                    planted += 1;
                }
            }

            let docs = vec![doc("p.pdf", &text)];
            let matches = count_occurrences(&docs, "aLfA");
            let count = matches.first().map_or(0, |m| m.count);

            prop_assert_eq!(count, planted);
            if let Some(m) = matches.first() {
                prop_assert_eq!(m.contexts.len(), m.count);
                for context in &m.contexts {
                    prop_assert!(context.to_lowercase().contains("alfa"));
                    prop_assert!(text.split_whitespace().collect::<Vec<_>>().join(" ").contains(context.as_str()));
                }
            }
        }
    }
}
