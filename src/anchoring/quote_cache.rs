//! Quote-position cache
//!
//! Remembers where a `(quote, position hint)` pair was found by a full quote
//! search, so re-anchoring the same annotation later in the session skips
//! the search. Entries are only valid for the current extraction of the
//! document and must be cleared on reload.

use std::num::NonZeroUsize;

use lru::LruCache;
use parking_lot::Mutex;

/// Default number of cached quote locations
pub const DEFAULT_CAPACITY: usize = 1000;

/// Page-local location of a previously found quote
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachedQuoteAnchor {
    pub page_index: usize,
    /// Start offset within the page's text
    pub start: usize,
    /// End offset within the page's text
    pub end: usize,
}

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
struct QuoteKey {
    exact: String,
    position: usize,
}

/// Bounded cache of quote search results
pub struct QuotePositionCache {
    entries: Mutex<LruCache<QuoteKey, CachedQuoteAnchor>>,
}

impl Default for QuotePositionCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl QuotePositionCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Look up the location found for a quote and position hint
    pub fn get(&self, exact: &str, position: usize) -> Option<CachedQuoteAnchor> {
        let key = QuoteKey {
            exact: exact.to_string(),
            position,
        };
        self.entries.lock().get(&key).copied()
    }

    /// Record the location found for a quote and position hint
    pub fn insert(&self, exact: &str, position: usize, anchor: CachedQuoteAnchor) {
        let key = QuoteKey {
            exact: exact.to_string(),
            position,
        };
        self.entries.lock().put(key, anchor);
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.entries.lock().cap().get()
    }
}
