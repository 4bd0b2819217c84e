//! Position resolver
//!
//! Turns a (page, start, end) triple into a live range. Rendered pages get a
//! range over their text layer; pages that have not been rendered yet get a
//! range around a placeholder element, which the annotation layer replaces
//! once the page renders.

use std::sync::atomic::{AtomicBool, Ordering};

use super::error::Result;
use super::source::{wait_for_page_view, PageSource};
use super::text_cache::PageTextCache;

/// A live range together with the page-local offsets it was built from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRange<R> {
    pub range: R,
    pub page_index: usize,
    pub start: usize,
    pub end: usize,
    /// The range wraps a placeholder rather than page text
    pub placeholder: bool,
}

pub struct PositionResolver<'a, S: ?Sized> {
    source: &'a S,
    cache: &'a PageTextCache,
    mismatch_warned: &'a AtomicBool,
}

impl<'a, S> PositionResolver<'a, S>
where
    S: PageSource + ?Sized,
{
    pub fn new(source: &'a S, cache: &'a PageTextCache, mismatch_warned: &'a AtomicBool) -> Self {
        Self {
            source,
            cache,
            mismatch_warned,
        }
    }

    /// Resolve page-local character offsets to a live range
    pub async fn resolve(
        &self,
        page_index: usize,
        start: usize,
        end: usize,
    ) -> Result<ResolvedRange<S::Range>> {
        let (view, page_text) = futures::try_join!(
            wait_for_page_view(self.source, page_index),
            self.cache.get(self.source, page_index),
        )?;

        if view.is_rendered() {
            if let Some(layer_text) = self.source.text_layer_content(page_index) {
                if layer_text != page_text.as_str()
                    && !self.mismatch_warned.swap(true, Ordering::Relaxed)
                {
                    tracing::warn!(
                        page_index,
                        "Text layer content does not match page text. This will cause anchoring misalignment."
                    );
                }

                let range = self.source.text_layer_range(page_index, start, end)?;
                return Ok(ResolvedRange {
                    range,
                    page_index,
                    start,
                    end,
                    placeholder: false,
                });
            }
        }

        tracing::debug!(page_index, "Page not rendered, anchoring to placeholder");
        let range = self.source.insert_placeholder(page_index)?;
        Ok(ResolvedRange {
            range,
            page_index,
            start,
            end,
            placeholder: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{ExtractedDocument, PLACEHOLDER_TEXT};

    #[tokio::test]
    async fn test_rendered_page_resolves_to_text() {
        let doc = ExtractedDocument::from_pages(&["zero", "Netherfield Park is occupied"]);
        let cache = PageTextCache::new();
        let warned = AtomicBool::new(false);
        let resolver = PositionResolver::new(&doc, &cache, &warned);

        let resolved = resolver.resolve(1, 12, 16).await.unwrap();
        assert!(!resolved.placeholder);
        assert_eq!(doc.range_text(&resolved.range), "Park");
        assert!(!warned.load(Ordering::Relaxed));
    }

    #[tokio::test]
    async fn test_unrendered_page_resolves_to_placeholder() {
        let doc = ExtractedDocument::from_pages(&["zero", "one"]);
        doc.set_rendered_pages([0]);
        let cache = PageTextCache::new();
        let warned = AtomicBool::new(false);
        let resolver = PositionResolver::new(&doc, &cache, &warned);

        let resolved = resolver.resolve(1, 0, 3).await.unwrap();
        assert!(resolved.placeholder);
        assert_eq!(doc.range_text(&resolved.range), PLACEHOLDER_TEXT);
        assert_eq!(doc.placeholder_count(1), 1);
    }

    #[tokio::test]
    async fn test_text_layer_mismatch_is_not_fatal() {
        let doc = ExtractedDocument::from_pages(&["Netherfield Park"]);
        doc.set_text_layer_override(0, "Netherfield  Park");
        let cache = PageTextCache::new();
        let warned = AtomicBool::new(false);
        let resolver = PositionResolver::new(&doc, &cache, &warned);

        let resolved = resolver.resolve(0, 0, 11).await.unwrap();
        assert!(!resolved.placeholder);
        assert!(warned.load(Ordering::Relaxed));
    }

    #[tokio::test]
    async fn test_waits_for_pages_loaded() {
        let doc = std::sync::Arc::new(ExtractedDocument::from_pages(&["alpha beta"]).loading());
        let task = {
            let doc = std::sync::Arc::clone(&doc);
            tokio::spawn(async move {
                let cache = PageTextCache::new();
                let warned = AtomicBool::new(false);
                let resolver = PositionResolver::new(doc.as_ref(), &cache, &warned);
                let resolved = resolver.resolve(0, 6, 10).await?;
                Ok::<_, crate::anchoring::AnchorError>(doc.range_text(&resolved.range))
            })
        };

        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        assert!(!task.is_finished());

        doc.mark_pages_loaded();
        assert_eq!(task.await.unwrap().unwrap(), "beta");
    }
}
