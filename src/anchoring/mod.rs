//! Annotation anchoring for paginated documents
//!
//! Anchoring resolves stored selectors (a text quote and, optionally, a text
//! position) to a live range in a viewer, and describing converts a live
//! selection back into selectors. Page text may only be partially rendered
//! at any time and can differ slightly between extraction passes, so quote
//! matching is whitespace-insensitive and tolerant of small errors.
//!
//! # Architecture
//!
//! ```text
//!   selectors ──► AnchoringEngine ──► strategies (position, cached quote, search)
//!                      │                         │
//!                      ▼                         ▼
//!             PageTextCache / offsets    NormalizedMatcher ──► QuoteMatcher
//!                      │
//!                      ▼
//!                 PageSource (viewer) ──► PositionResolver ──► live range
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use amnesia_anchoring::anchoring::AnchoringEngine;
//!
//! let engine = AnchoringEngine::new(Arc::new(viewer));
//! let range = engine.anchor(&annotation.selectors).await?;
//! let selectors = engine.describe(&root, &selection).await?;
//! ```

mod describe;
mod engine;
mod error;
mod normalize;
mod offsets;
mod quote_cache;
mod resolver;
mod search;
mod source;
mod strategy;
mod text_cache;

pub mod matcher;

pub use describe::RangeSelectors;
pub use engine::{Anchored, AnchoringEngine, EngineConfig};
pub use error::{AnchorError, Result};
pub use matcher::{ApproxMatcher, Match, MatchContext, QuoteMatcher};
pub use normalize::{strip_spaces, NormalizedMatcher, PageMatch, StrippedText};
pub use offsets::{DocumentOffsets, PageOffset};
pub use quote_cache::{CachedQuoteAnchor, QuotePositionCache, DEFAULT_CAPACITY};
pub use resolver::{PositionResolver, ResolvedRange};
pub use search::{search_order, QuoteLocation, QuoteSearch};
pub use source::{
    wait_for_page_view, PageSource, PageView, RangeDescriber, RangeEdge, RenderingState,
    TextContent, TextItem, TextLayerPoint,
};
pub use strategy::{Attempt, Strategy, ANCHOR_STRATEGIES};
pub use text_cache::{PageText, PageTextCache};
