//! Page text cache
//!
//! Memoized access to the extracted text of each page. Each page gets a
//! `OnceCell`, so concurrent callers asking for a page whose extraction is
//! already in flight wait on the same initialization instead of extracting
//! the page twice.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::OnceCell;

use super::error::Result;
use super::source::{wait_for_page_view, PageSource};

/// Extracted text of one page
///
/// Lengths and offsets are in characters, matching the offsets the text
/// layer exposes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    text: String,
    len: usize,
}

impl PageText {
    pub fn new(text: String) -> Self {
        let len = text.chars().count();
        Self { text, len }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Length in characters
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether the page has any non-whitespace text
    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }

    /// Characters in `[start, end)`, clamped to the page
    pub fn slice(&self, start: usize, end: usize) -> String {
        self.text
            .chars()
            .skip(start)
            .take(end.saturating_sub(start))
            .collect()
    }
}

/// Cache of page texts for one open document
#[derive(Default)]
pub struct PageTextCache {
    entries: Mutex<HashMap<usize, Arc<OnceCell<Arc<PageText>>>>>,
}

impl PageTextCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the text of a page, extracting it on first access
    ///
    /// The returned text matches the content of the page's text layer once
    /// rendered, so offsets into it can be reused as text layer offsets.
    pub async fn get<S>(&self, source: &S, page_index: usize) -> Result<Arc<PageText>>
    where
        S: PageSource + ?Sized,
    {
        let cell = {
            let mut entries = self.entries.lock();
            Arc::clone(entries.entry(page_index).or_default())
        };

        let text = cell
            .get_or_try_init(|| async {
                wait_for_page_view(source, page_index).await?;
                let content = source.extract_text(page_index).await?;
                tracing::trace!(page_index, items = content.items.len(), "Extracted page text");
                Ok(Arc::new(PageText::new(content.page_text())))
            })
            .await?;

        Ok(Arc::clone(text))
    }

    /// Drop every entry. Extractions already in flight finish but are not kept.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Number of pages whose text has been extracted
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .values()
            .filter(|cell| cell.initialized())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::ExtractedDocument;

    #[test]
    fn test_page_text_slice() {
        let text = PageText::new("Café au lait".to_string());
        assert_eq!(text.len(), 12);
        assert_eq!(text.slice(0, 4), "Café");
        assert_eq!(text.slice(5, 7), "au");
        assert_eq!(text.slice(10, 50), "it");
        assert_eq!(text.slice(7, 3), "");
        assert_eq!(text.slice(40, 50), "");
    }

    #[test]
    fn test_has_text() {
        assert!(!PageText::new("   \n\t".to_string()).has_text());
        assert!(!PageText::new(String::new()).has_text());
        assert!(PageText::new("  a ".to_string()).has_text());
    }

    #[tokio::test]
    async fn test_text_is_cached() {
        let doc = ExtractedDocument::from_pages(&["first page", "second\npage"]);
        let cache = PageTextCache::new();

        let first = cache.get(&doc, 1).await.unwrap();
        let second = cache.get(&doc, 1).await.unwrap();

        assert_eq!(first.as_str(), "secondpage");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(doc.extraction_count(1), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_requests_share_extraction() {
        let doc = Arc::new(ExtractedDocument::from_pages(&["alpha", "beta"]).loading());
        let cache = Arc::new(PageTextCache::new());

        let tasks: Vec<_> = (0..4)
            .map(|_| {
                let doc = Arc::clone(&doc);
                let cache = Arc::clone(&cache);
                tokio::spawn(async move { cache.get(doc.as_ref(), 0).await })
            })
            .collect();

        tokio::task::yield_now().await;
        doc.mark_pages_loaded();

        for task in tasks {
            assert_eq!(task.await.unwrap().unwrap().as_str(), "alpha");
        }
        assert_eq!(doc.extraction_count(0), 1);
    }

    #[tokio::test]
    async fn test_clear_forces_re_extraction() {
        let doc = ExtractedDocument::from_pages(&["alpha"]);
        let cache = PageTextCache::new();

        cache.get(&doc, 0).await.unwrap();
        cache.clear();
        assert!(cache.is_empty());

        cache.get(&doc, 0).await.unwrap();
        assert_eq!(doc.extraction_count(0), 2);
    }
}
