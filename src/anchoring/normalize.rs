//! Whitespace-insensitive matching
//!
//! Text extracted by different viewers (or different versions of one viewer)
//! often disagrees about spaces between words and even between characters.
//! Quotes are therefore compared with ASCII spaces, tabs and newlines removed,
//! while an offset table maps matches back to the original page text.

use super::matcher::{Match, MatchContext, QuoteMatcher};
use crate::selectors::TextQuoteSelector;

fn is_stripped(ch: char) -> bool {
    matches!(ch, ' ' | '\t' | '\n')
}

/// Remove the whitespace the matcher ignores
pub fn strip_spaces(text: &str) -> String {
    text.chars().filter(|&c| !is_stripped(c)).collect()
}

/// Text with whitespace removed, plus the original offset of every kept character
///
/// `offsets` is strictly increasing and has one entry per character of `text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrippedText {
    text: String,
    chars: Vec<char>,
    offsets: Vec<usize>,
}

impl StrippedText {
    pub fn new(original: &str) -> Self {
        let mut chars = Vec::new();
        let mut offsets = Vec::new();
        for (index, ch) in original.chars().enumerate() {
            if is_stripped(ch) {
                continue;
            }
            chars.push(ch);
            offsets.push(index);
        }
        Self {
            text: chars.iter().collect(),
            chars,
            offsets,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Length in characters
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    /// Stripped offset corresponding to an offset in the original text
    ///
    /// This is the index of the first kept character at or after `offset`.
    pub fn stripped_offset(&self, offset: usize) -> usize {
        self.offsets.partition_point(|&original| original < offset)
    }

    /// Map a non-empty match in stripped coordinates to original coordinates
    pub fn to_original(&self, m: &Match) -> Match {
        Match {
            start: self.offsets[m.start],
            end: self.offsets[m.end - 1] + 1,
            score: m.score,
        }
    }

    /// Whether the characters at `[start, start + expected.len())` equal `expected`
    fn matches_at(&self, start: usize, expected: &[char]) -> bool {
        self.chars
            .get(start..start + expected.len())
            .is_some_and(|slice| slice == expected)
    }
}

/// Stripped form of a quote selector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrippedQuote {
    pub exact: Vec<char>,
    pub prefix: Option<Vec<char>>,
    pub suffix: Option<Vec<char>>,
    exact_str: String,
    prefix_str: Option<String>,
    suffix_str: Option<String>,
}

impl StrippedQuote {
    pub fn new(quote: &TextQuoteSelector) -> Self {
        let exact_str = strip_spaces(&quote.exact);
        let prefix_str = quote.prefix.as_deref().map(strip_spaces);
        let suffix_str = quote.suffix.as_deref().map(strip_spaces);
        Self {
            exact: exact_str.chars().collect(),
            prefix: prefix_str.as_ref().map(|p| p.chars().collect()),
            suffix: suffix_str.as_ref().map(|s| s.chars().collect()),
            exact_str,
            prefix_str,
            suffix_str,
        }
    }
}

/// A match on one page, in original page coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageMatch {
    pub start: usize,
    pub end: usize,
    pub score: f64,
    /// The matched text equals the stripped quote verbatim
    pub exact_quote: bool,
    /// The text before the match equals the stripped prefix verbatim
    pub exact_prefix: bool,
    /// The text after the match equals the stripped suffix verbatim
    pub exact_suffix: bool,
}

/// Adapter that runs a [`QuoteMatcher`] on whitespace-stripped text
pub struct NormalizedMatcher<'a> {
    matcher: &'a dyn QuoteMatcher,
    quote: StrippedQuote,
}

impl<'a> NormalizedMatcher<'a> {
    pub fn new(matcher: &'a dyn QuoteMatcher, quote: &TextQuoteSelector) -> Self {
        Self {
            matcher,
            quote: StrippedQuote::new(quote),
        }
    }

    pub fn quote(&self) -> &StrippedQuote {
        &self.quote
    }

    /// Match the quote against one page's text
    ///
    /// `hint` is the expected start offset in original page coordinates.
    pub fn match_page(&self, page_text: &str, hint: Option<usize>) -> Option<PageMatch> {
        let stripped = StrippedText::new(page_text);
        let context = MatchContext {
            prefix: self.quote.prefix_str.as_deref(),
            suffix: self.quote.suffix_str.as_deref(),
            hint: hint.map(|offset| stripped.stripped_offset(offset)),
        };

        let m = self
            .matcher
            .match_quote(stripped.as_str(), &self.quote.exact_str, &context)?;
        if m.end <= m.start || m.end > stripped.len() {
            tracing::warn!(start = m.start, end = m.end, "Matcher returned an invalid match");
            return None;
        }

        let exact_quote = m.end - m.start == self.quote.exact.len()
            && stripped.matches_at(m.start, &self.quote.exact);
        let exact_prefix = self.quote.prefix.as_ref().is_some_and(|prefix| {
            m.start >= prefix.len() && stripped.matches_at(m.start - prefix.len(), prefix)
        });
        let exact_suffix = self
            .quote
            .suffix
            .as_ref()
            .is_some_and(|suffix| stripped.matches_at(m.end, suffix));

        let original = stripped.to_original(&m);
        Some(PageMatch {
            start: original.start,
            end: original.end,
            score: original.score,
            exact_quote,
            exact_prefix,
            exact_suffix,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_strip_spaces() {
        assert_eq!(strip_spaces("Netherfield  Park\tis\n"), "NetherfieldParkis");
        assert_eq!(strip_spaces(""), "");
    }

    #[test]
    fn test_stripped_offsets() {
        let stripped = StrippedText::new("a b  c");
        assert_eq!(stripped.as_str(), "abc");
        assert_eq!(stripped.offsets(), &[0, 2, 5]);
        assert_eq!(stripped.len(), stripped.offsets().len());
        assert!(stripped.offsets().windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_stripped_offset_conversion() {
        let stripped = StrippedText::new("a b  c");
        assert_eq!(stripped.stripped_offset(0), 0);
        assert_eq!(stripped.stripped_offset(1), 1);
        assert_eq!(stripped.stripped_offset(2), 1);
        assert_eq!(stripped.stripped_offset(3), 2);
        assert_eq!(stripped.stripped_offset(100), 3);
    }

    #[test]
    fn test_to_original() {
        let stripped = StrippedText::new("xx Netherfield Park is");
        let park = Match {
            start: 2,
            end: 17,
            score: 1.0,
        };
        let original = stripped.to_original(&park);
        assert_eq!((original.start, original.end), (3, 19));

        let park_is = Match { end: 19, ..park };
        let original = stripped.to_original(&park_is);
        assert_eq!((original.start, original.end), (3, 22));
    }

    #[test]
    fn test_non_breaking_space_is_kept() {
        let stripped = StrippedText::new("a\u{a0}b");
        assert_eq!(stripped.len(), 3);
    }

    /// Records the arguments the adapter passes through
    #[derive(Default)]
    struct Recording {
        calls: Mutex<Vec<(String, String, Option<String>, Option<String>, Option<usize>)>>,
    }

    impl QuoteMatcher for Recording {
        fn match_quote(&self, text: &str, quote: &str, context: &MatchContext<'_>) -> Option<Match> {
            self.calls.lock().unwrap().push((
                text.to_string(),
                quote.to_string(),
                context.prefix.map(str::to_string),
                context.suffix.map(str::to_string),
                context.hint,
            ));
            let start = text.find(quote)?;
            Some(Match {
                start,
                end: start + quote.len(),
                score: 1.0,
            })
        }
    }

    #[test]
    fn test_adapter_strips_inputs() {
        let recording = Recording::default();
        let quote = TextQuoteSelector::new("Mr.  Bennet")
            .with_prefix("My dear ")
            .with_suffix(",\" said his lady");
        let adapter = NormalizedMatcher::new(&recording, &quote);

        let page = "\"My dear Mr. Bennet,\" said his lady";
        let m = adapter.match_page(page, Some(9)).unwrap();

        let calls = recording.calls.lock().unwrap();
        let (text, exact, prefix, suffix, hint) = &calls[0];
        assert_eq!(text, "\"MydearMr.Bennet,\"saidhislady");
        assert_eq!(exact, "Mr.Bennet");
        assert_eq!(prefix.as_deref(), Some("Mydear"));
        assert_eq!(suffix.as_deref(), Some(",\"saidhislady"));
        assert_eq!(*hint, Some(7));

        assert_eq!(&page[m.start..m.end], "Mr. Bennet");
        assert!(m.exact_quote);
        assert!(m.exact_prefix);
        assert!(m.exact_suffix);
    }

    #[test]
    fn test_context_flags() {
        let recording = Recording::default();
        let quote = TextQuoteSelector::new("Park")
            .with_prefix("DOES NOT MATCH")
            .with_suffix(" is");
        let adapter = NormalizedMatcher::new(&recording, &quote);

        let m = adapter.match_page("Netherfield Park is occupied", None).unwrap();
        assert!(m.exact_quote);
        assert!(!m.exact_prefix);
        assert!(m.exact_suffix);
    }

    #[test]
    fn test_prefix_at_page_start_is_not_exact() {
        let recording = Recording::default();
        let quote = TextQuoteSelector::new("Park").with_prefix("Netherfield");
        let adapter = NormalizedMatcher::new(&recording, &quote);

        let m = adapter.match_page("Park is occupied", None).unwrap();
        assert!(!m.exact_prefix);
        assert!(!m.exact_suffix);
    }
}
