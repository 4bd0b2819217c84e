//! Approximate quote matching
//!
//! The engine consumes matching through [`QuoteMatcher`]; [`ApproxMatcher`]
//! is the default implementation.

mod approx;

pub use approx::ApproxMatcher;

/// A match of a quote within a text
///
/// Offsets are character offsets into the searched text, `end` exclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Match {
    pub start: usize,
    pub end: usize,
    /// Normalized score in `[0, 1]`, higher is better
    pub score: f64,
}

/// Optional hints that influence match scoring
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchContext<'a> {
    /// Expected text immediately before the quote
    pub prefix: Option<&'a str>,
    /// Expected text immediately after the quote
    pub suffix: Option<&'a str>,
    /// Expected start offset of the quote
    pub hint: Option<usize>,
}

/// Finds the best-scoring occurrence of a quote in a text
pub trait QuoteMatcher: Send + Sync {
    /// Return the best match, or `None` if there is no acceptable match.
    ///
    /// Returned matches are never empty.
    fn match_quote(&self, text: &str, quote: &str, context: &MatchContext<'_>) -> Option<Match>;
}
