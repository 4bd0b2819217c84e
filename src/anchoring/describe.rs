//! Describe: live range to selectors
//!
//! The inverse of anchoring. A selection inside one page's text layer is
//! converted to a position selector (logical document offsets) and a quote
//! selector (exact text plus context).

use super::error::{AnchorError, Result};
use super::offsets::DocumentOffsets;
use super::source::{RangeDescriber, RangeEdge};
use super::text_cache::PageTextCache;
use crate::selectors::{Selector, TextPositionSelector, TextQuoteSelector};

/// Selectors describing a range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeSelectors {
    pub position: TextPositionSelector,
    pub quote: TextQuoteSelector,
}

impl RangeSelectors {
    /// `[position, quote]`, the order stored with annotations
    pub fn into_selectors(self) -> Vec<Selector> {
        vec![self.position.into(), self.quote.into()]
    }
}

pub(crate) async fn describe_range<S>(
    source: &S,
    text_cache: &PageTextCache,
    root: &S::Root,
    range: &S::Range,
) -> Result<RangeSelectors>
where
    S: RangeDescriber + ?Sized,
{
    let range = source
        .normalize_range(range)
        .ok_or(AnchorError::EmptySelection)?;

    let start = source.text_layer_point(&range, RangeEdge::Start);
    let end = source.text_layer_point(&range, RangeEdge::End);
    let (Some(start), Some(end)) = (start, end) else {
        return Err(AnchorError::OutsideText);
    };

    if start.page_index != end.page_index {
        return Err(AnchorError::CrossPageSelection);
    }
    // Collapsed or reversed
    if end.offset <= start.offset {
        return Err(AnchorError::EmptySelection);
    }

    let page_offset = DocumentOffsets::new(source, text_cache)
        .page_offset(start.page_index)
        .await?;

    let position = TextPositionSelector {
        start: page_offset + start.offset,
        end: page_offset + end.offset,
    };
    let quote = source.quote_selector(root, &range)?;

    Ok(RangeSelectors { position, quote })
}
