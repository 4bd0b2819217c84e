//! Multi-page quote search
//!
//! Scans pages for the best-scoring occurrence of a quote. With a position
//! hint, pages are visited in order of distance from the page the hint points
//! at, and each page is given its own hint for the matcher. The search stops
//! early once it finds a verbatim occurrence confirmed by its context.

use super::error::{AnchorError, Result};
use super::matcher::QuoteMatcher;
use super::normalize::{NormalizedMatcher, PageMatch};
use super::offsets::DocumentOffsets;
use super::quote_cache::{CachedQuoteAnchor, QuotePositionCache};
use super::source::PageSource;
use super::text_cache::PageTextCache;
use crate::selectors::TextQuoteSelector;

/// Best occurrence of a quote, in page-local original coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuoteLocation {
    pub page_index: usize,
    pub start: usize,
    pub end: usize,
    pub score: f64,
}

/// Where a position hint places the quote
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ExpectedPosition {
    page_index: usize,
    offset_in_page: usize,
}

/// Order in which pages are searched
///
/// Pages are sorted by distance from `expected_page`; equidistant pages keep
/// ascending order. Every page stays eligible.
pub fn search_order(page_count: usize, expected_page: Option<usize>) -> Vec<usize> {
    let mut pages: Vec<usize> = (0..page_count).collect();
    if let Some(expected) = expected_page {
        pages.sort_by_key(|&page| page.abs_diff(expected));
    }
    pages
}

/// Matcher hint for a page, in original page coordinates
///
/// Pages before the expected page prefer matches near their end, pages after
/// it prefer matches near their start.
fn page_hint(page_index: usize, page_len: usize, expected: ExpectedPosition) -> usize {
    if page_index < expected.page_index {
        page_len
    } else if page_index == expected.page_index {
        expected.offset_in_page
    } else {
        0
    }
}

/// Early-exit policy
///
/// A verbatim match of the quote ends the search when no context was supplied
/// or when the prefix or the suffix also matches verbatim. Inexact matches keep
/// the search going in case another page holds a better one.
fn is_conclusive(m: &PageMatch, has_context: bool) -> bool {
    m.exact_quote && (!has_context || m.exact_prefix || m.exact_suffix)
}

pub struct QuoteSearch<'a, S: ?Sized> {
    source: &'a S,
    text_cache: &'a PageTextCache,
    quote_cache: &'a QuotePositionCache,
    matcher: &'a dyn QuoteMatcher,
}

impl<'a, S> QuoteSearch<'a, S>
where
    S: PageSource + ?Sized,
{
    pub fn new(
        source: &'a S,
        text_cache: &'a PageTextCache,
        quote_cache: &'a QuotePositionCache,
        matcher: &'a dyn QuoteMatcher,
    ) -> Self {
        Self {
            source,
            text_cache,
            quote_cache,
            matcher,
        }
    }

    /// Find the best occurrence of `quote` in the document
    ///
    /// `position_hint` is the expected logical start offset of the quote. A
    /// successful search with a hint is recorded in the quote-position cache.
    pub async fn find(
        &self,
        quote: &TextQuoteSelector,
        position_hint: Option<usize>,
    ) -> Result<QuoteLocation> {
        if self.source.page_count() == 0 {
            return Err(AnchorError::QuoteNotFound);
        }

        let expected = match position_hint {
            Some(hint) => {
                let page = DocumentOffsets::new(self.source, self.text_cache)
                    .find_page_by_offset(hint)
                    .await?;
                Some(ExpectedPosition {
                    page_index: page.index,
                    offset_in_page: hint - page.offset,
                })
            }
            None => None,
        };

        let order = search_order(
            self.source.page_count(),
            expected.map(|e| e.page_index),
        );
        let adapter = NormalizedMatcher::new(self.matcher, quote);
        let has_context = quote.has_context();

        let mut best: Option<QuoteLocation> = None;
        for page_index in order {
            let text = self.text_cache.get(self.source, page_index).await?;
            let hint = expected.map(|e| page_hint(page_index, text.len(), e));

            let Some(m) = adapter.match_page(text.as_str(), hint) else {
                continue;
            };

            if best.map_or(true, |b| m.score > b.score) {
                best = Some(QuoteLocation {
                    page_index,
                    start: m.start,
                    end: m.end,
                    score: m.score,
                });

                if is_conclusive(&m, has_context) {
                    tracing::debug!(page_index, "Conclusive quote match, stopping search");
                    break;
                }
            }
        }

        let location = best.ok_or(AnchorError::QuoteNotFound)?;

        if let Some(hint) = position_hint {
            self.quote_cache.insert(
                &quote.exact,
                hint,
                CachedQuoteAnchor {
                    page_index: location.page_index,
                    start: location.start,
                    end: location.end,
                },
            );
        }

        Ok(location)
    }
}
