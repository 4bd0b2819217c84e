//! Anchoring engine
//!
//! Owns the per-document caches and runs the anchoring strategies in order:
//! the position selector first (checked against the quote), then an earlier
//! quote search result, and finally a full quote search.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use tracing::{debug, instrument};

use super::describe::{describe_range, RangeSelectors};
use super::error::{AnchorError, Result};
use super::matcher::{ApproxMatcher, QuoteMatcher};
use super::offsets::DocumentOffsets;
use super::quote_cache::{QuotePositionCache, DEFAULT_CAPACITY};
use super::resolver::{PositionResolver, ResolvedRange};
use super::search::QuoteSearch;
use super::source::{PageSource, RangeDescriber};
use super::strategy::{Attempt, Strategy, ANCHOR_STRATEGIES};
use super::text_cache::{PageText, PageTextCache};
use crate::selectors::{find_position, find_quote, Selector, TextPositionSelector, TextQuoteSelector};

/// Engine tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Maximum entries in the quote-position cache
    pub quote_cache_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            quote_cache_capacity: DEFAULT_CAPACITY,
        }
    }
}

/// Result of a successful `anchor_detailed()` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchored<R> {
    /// Strategy that produced the range
    pub strategy: Strategy,
    pub resolved: ResolvedRange<R>,
}

/// Anchoring engine for one open document
pub struct AnchoringEngine<S: PageSource> {
    source: Arc<S>,
    text_cache: PageTextCache,
    quote_cache: QuotePositionCache,
    matcher: Arc<dyn QuoteMatcher>,
    /// Set once the text layer mismatch warning has been logged
    mismatch_warned: AtomicBool,
}

impl<S: PageSource> AnchoringEngine<S> {
    pub fn new(source: Arc<S>) -> Self {
        Self::with_config(source, EngineConfig::default())
    }

    pub fn with_config(source: Arc<S>, config: EngineConfig) -> Self {
        Self {
            source,
            text_cache: PageTextCache::new(),
            quote_cache: QuotePositionCache::new(config.quote_cache_capacity),
            matcher: Arc::new(ApproxMatcher::new()),
            mismatch_warned: AtomicBool::new(false),
        }
    }

    /// Replace the fuzzy matcher
    pub fn with_matcher(mut self, matcher: Arc<dyn QuoteMatcher>) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn source(&self) -> &Arc<S> {
        &self.source
    }

    pub fn text_cache(&self) -> &PageTextCache {
        &self.text_cache
    }

    pub fn quote_cache(&self) -> &QuotePositionCache {
        &self.quote_cache
    }

    /// Extracted text of a page
    pub async fn page_text(&self, page_index: usize) -> Result<Arc<PageText>> {
        self.text_cache.get(self.source.as_ref(), page_index).await
    }

    /// Anchor selectors to a live range
    pub async fn anchor(&self, selectors: &[Selector]) -> Result<S::Range> {
        self.anchor_detailed(selectors)
            .await
            .map(|anchored| anchored.resolved.range)
    }

    /// Anchor selectors, reporting which strategy succeeded and where
    #[instrument(skip_all, fields(selectors = selectors.len()))]
    pub async fn anchor_detailed(&self, selectors: &[Selector]) -> Result<Anchored<S::Range>> {
        let quote = find_quote(selectors).ok_or(AnchorError::NoQuoteSelector)?;
        let position = find_position(selectors);

        for strategy in ANCHOR_STRATEGIES {
            match self.attempt(strategy, quote, position).await {
                Attempt::Anchored(resolved) => {
                    debug!(%strategy, page_index = resolved.page_index, "Anchored");
                    return Ok(Anchored { strategy, resolved });
                }
                Attempt::Skipped(reason) => {
                    debug!(%strategy, reason, "Strategy skipped");
                }
                Attempt::Failed(err) if strategy.is_terminal() => return Err(err),
                Attempt::Failed(err) => {
                    debug!(%strategy, error = %err, "Strategy failed, trying next");
                }
            }
        }

        Err(AnchorError::QuoteNotFound)
    }

    async fn attempt(
        &self,
        strategy: Strategy,
        quote: &TextQuoteSelector,
        position: Option<&TextPositionSelector>,
    ) -> Attempt<ResolvedRange<S::Range>> {
        match strategy {
            Strategy::Position => match position {
                Some(position) => {
                    Attempt::from_result(self.anchor_by_position(quote, position).await, "quote mismatch")
                }
                None => Attempt::Skipped("no position selector"),
            },
            Strategy::CachedQuote => match position {
                Some(position) => {
                    Attempt::from_result(self.anchor_from_cache(quote, position).await, "cache miss")
                }
                None => Attempt::Skipped("no position selector"),
            },
            Strategy::QuoteSearch => {
                match self.anchor_by_search(quote, position.map(|p| p.start)).await {
                    Ok(resolved) => Attempt::Anchored(resolved),
                    Err(err) => Attempt::Failed(err),
                }
            }
        }
    }

    /// Use the position selector if the text there is exactly the quote
    async fn anchor_by_position(
        &self,
        quote: &TextQuoteSelector,
        position: &TextPositionSelector,
    ) -> Result<Option<ResolvedRange<S::Range>>> {
        if position.is_empty() {
            return Ok(None);
        }
        let page = self.offsets().find_page_by_offset(position.start).await?;
        let start = position.start.saturating_sub(page.offset);
        let end = position.end.saturating_sub(page.offset);

        if page.text.slice(start, end) != quote.exact {
            return Ok(None);
        }
        self.resolver().resolve(page.index, start, end).await.map(Some)
    }

    async fn anchor_from_cache(
        &self,
        quote: &TextQuoteSelector,
        position: &TextPositionSelector,
    ) -> Result<Option<ResolvedRange<S::Range>>> {
        let Some(cached) = self.quote_cache.get(&quote.exact, position.start) else {
            return Ok(None);
        };
        self.resolver()
            .resolve(cached.page_index, cached.start, cached.end)
            .await
            .map(Some)
    }

    async fn anchor_by_search(
        &self,
        quote: &TextQuoteSelector,
        hint: Option<usize>,
    ) -> Result<ResolvedRange<S::Range>> {
        let location = QuoteSearch::new(
            self.source.as_ref(),
            &self.text_cache,
            &self.quote_cache,
            self.matcher.as_ref(),
        )
        .find(quote, hint)
        .await?;

        self.resolver()
            .resolve(location.page_index, location.start, location.end)
            .await
    }

    /// Whether any page contains non-whitespace text
    ///
    /// Extracts pages in order and stops at the first one with text.
    pub async fn document_has_text(&self) -> Result<bool> {
        for page_index in 0..self.source.page_count() {
            if self.page_text(page_index).await?.has_text() {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Drop all cached page text and quote positions
    pub fn purge_cache(&self) {
        self.text_cache.clear();
        self.quote_cache.clear();
        debug!("Purged anchoring caches");
    }

    fn offsets(&self) -> DocumentOffsets<'_, S> {
        DocumentOffsets::new(self.source.as_ref(), &self.text_cache)
    }

    fn resolver(&self) -> PositionResolver<'_, S> {
        PositionResolver::new(self.source.as_ref(), &self.text_cache, &self.mismatch_warned)
    }
}

impl<S: RangeDescriber> AnchoringEngine<S> {
    /// Convert a live range into position and quote selectors
    pub async fn describe(&self, root: &S::Root, range: &S::Range) -> Result<RangeSelectors> {
        describe_range(self.source.as_ref(), &self.text_cache, root, range).await
    }
}
