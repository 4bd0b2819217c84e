//! Document offset index
//!
//! Converts between a logical offset into the concatenated text of all
//! pages and a (page, offset within page) pair.

use std::sync::Arc;

use super::error::{AnchorError, Result};
use super::source::PageSource;
use super::text_cache::{PageText, PageTextCache};

/// Location of a page's text within the document text
#[derive(Debug, Clone)]
pub struct PageOffset {
    /// Page index
    pub index: usize,
    /// Logical offset at which the page's text begins
    pub offset: usize,
    /// Text of the page
    pub text: Arc<PageText>,
}

/// Offset lookups over a source, backed by the page text cache
pub struct DocumentOffsets<'a, S: ?Sized> {
    source: &'a S,
    cache: &'a PageTextCache,
}

impl<'a, S> DocumentOffsets<'a, S>
where
    S: PageSource + ?Sized,
{
    pub fn new(source: &'a S, cache: &'a PageTextCache) -> Self {
        Self { source, cache }
    }

    /// Logical offset at which a page's text begins
    pub async fn page_offset(&self, page_index: usize) -> Result<usize> {
        let page_count = self.source.page_count();
        if page_index >= page_count {
            return Err(AnchorError::InvalidPageIndex {
                index: page_index,
                page_count,
            });
        }

        let mut offset = 0;
        for index in 0..page_index {
            offset += self.cache.get(self.source, index).await?.len();
        }
        Ok(offset)
    }

    /// Find the page containing a logical offset
    ///
    /// An offset at a page boundary belongs to the earlier page. Offsets past
    /// the end of the document resolve to the last page instead of failing,
    /// so that stale position selectors still land near their target.
    pub async fn find_page_by_offset(&self, offset: usize) -> Result<PageOffset> {
        let page_count = self.source.page_count();
        let mut found = None;
        let mut page_end = 0;

        for index in 0..page_count {
            let text = self.cache.get(self.source, index).await?;
            let page_start = page_end;
            page_end += text.len();

            let is_match = page_end >= offset;
            found = Some(PageOffset {
                index,
                offset: page_start,
                text,
            });
            if is_match {
                break;
            }
        }

        found.ok_or(AnchorError::InvalidPageIndex {
            index: 0,
            page_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::ExtractedDocument;

    fn document() -> ExtractedDocument {
        // Page lengths: 5, 7, 3
        ExtractedDocument::from_pages(&["abcde", "fghijkl", "mno"])
    }

    #[tokio::test]
    async fn test_page_offset() {
        let doc = document();
        let cache = PageTextCache::new();
        let offsets = DocumentOffsets::new(&doc, &cache);

        assert_eq!(offsets.page_offset(0).await.unwrap(), 0);
        assert_eq!(offsets.page_offset(1).await.unwrap(), 5);
        assert_eq!(offsets.page_offset(2).await.unwrap(), 12);
    }

    #[tokio::test]
    async fn test_page_offset_rejects_invalid_page() {
        let doc = document();
        let cache = PageTextCache::new();
        let offsets = DocumentOffsets::new(&doc, &cache);

        let err = offsets.page_offset(3).await.unwrap_err();
        assert_eq!(
            err,
            AnchorError::InvalidPageIndex {
                index: 3,
                page_count: 3
            }
        );
    }

    #[tokio::test]
    async fn test_find_page_by_offset() {
        let doc = document();
        let cache = PageTextCache::new();
        let offsets = DocumentOffsets::new(&doc, &cache);

        let page = offsets.find_page_by_offset(0).await.unwrap();
        assert_eq!((page.index, page.offset), (0, 0));

        let page = offsets.find_page_by_offset(7).await.unwrap();
        assert_eq!((page.index, page.offset), (1, 5));
        assert_eq!(page.text.as_str(), "fghijkl");

        let page = offsets.find_page_by_offset(13).await.unwrap();
        assert_eq!((page.index, page.offset), (2, 12));
    }

    #[tokio::test]
    async fn test_boundary_offset_belongs_to_earlier_page() {
        let doc = document();
        let cache = PageTextCache::new();
        let offsets = DocumentOffsets::new(&doc, &cache);

        let page = offsets.find_page_by_offset(5).await.unwrap();
        assert_eq!(page.index, 0);
    }

    #[tokio::test]
    async fn test_offset_beyond_document_clamps_to_last_page() {
        let doc = document();
        let cache = PageTextCache::new();
        let offsets = DocumentOffsets::new(&doc, &cache);

        let page = offsets.find_page_by_offset(100_000).await.unwrap();
        assert_eq!(page.index, 2);
        assert_eq!(page.offset, 12);
        assert_eq!(page.text.as_str(), "mno");
    }

    #[tokio::test]
    async fn test_empty_document() {
        let doc = ExtractedDocument::from_pages::<&str>(&[]);
        let cache = PageTextCache::new();
        let offsets = DocumentOffsets::new(&doc, &cache);

        assert!(offsets.find_page_by_offset(0).await.is_err());
    }
}
