//! Anchoring strategies
//!
//! `anchor()` is a cascade of strategies tried from cheapest to most
//! expensive. Each attempt reports an explicit outcome; the orchestrator
//! stops at the first success and only surfaces the failure of the last,
//! terminal strategy.

use serde::Serialize;

use super::error::AnchorError;

/// A way of resolving selectors to a range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Strategy {
    /// Position selector, validated against the quote verbatim
    Position,
    /// Earlier quote search result for the same quote and position
    CachedQuote,
    /// Full multi-page quote search
    QuoteSearch,
}

/// Strategies in the order `anchor()` attempts them
pub const ANCHOR_STRATEGIES: [Strategy; 3] = [
    Strategy::Position,
    Strategy::CachedQuote,
    Strategy::QuoteSearch,
];

impl Strategy {
    /// Whether a failure of this strategy ends anchoring
    pub fn is_terminal(self) -> bool {
        matches!(self, Strategy::QuoteSearch)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::Position => "position",
            Strategy::CachedQuote => "cachedQuote",
            Strategy::QuoteSearch => "quoteSearch",
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one strategy
#[derive(Debug)]
pub enum Attempt<R> {
    /// The strategy produced a range
    Anchored(R),
    /// The strategy did not apply to these selectors
    Skipped(&'static str),
    /// The strategy applied but failed
    Failed(AnchorError),
}

impl<R> Attempt<R> {
    /// Convert a fallible result, treating `Ok(None)` as skipped
    pub fn from_result(result: Result<Option<R>, AnchorError>, skip_reason: &'static str) -> Self {
        match result {
            Ok(Some(value)) => Attempt::Anchored(value),
            Ok(None) => Attempt::Skipped(skip_reason),
            Err(err) => Attempt::Failed(err),
        }
    }
}
