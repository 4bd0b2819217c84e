//! Rendering subsystem capabilities
//!
//! The anchoring engine never touches a viewer directly. Everything it needs
//! from the paginated viewer is expressed by [`PageSource`], and the extra
//! range utilities needed to turn a live selection back into selectors by
//! [`RangeDescriber`]. Compatibility shims for different viewer versions
//! belong in the implementations of these traits.

use async_trait::async_trait;
use tokio::sync::watch;

use super::error::{AnchorError, Result};
use crate::selectors::TextQuoteSelector;

/// Rendering state of a page view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderingState {
    #[default]
    Initial,
    Running,
    Paused,
    Finished,
}

/// Snapshot of a page view's state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PageView {
    /// Canvas rendering state
    pub rendering_state: RenderingState,
    /// The underlying page object is attached and its text can be extracted
    pub page_ready: bool,
    /// The text layer exists and has finished rendering
    pub text_layer_ready: bool,
}

impl PageView {
    /// Whether offsets can be resolved against the live text layer
    pub fn is_rendered(&self) -> bool {
        self.rendering_state == RenderingState::Finished && self.text_layer_ready
    }
}

/// One run of text returned by the viewer's extraction call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextItem {
    pub text: String,
    /// End-of-line marker. Older viewers do not report it at all.
    pub has_eol: Option<bool>,
}

impl TextItem {
    pub fn new(text: &str, has_eol: Option<bool>) -> Self {
        Self {
            text: text.to_string(),
            has_eol,
        }
    }
}

/// Raw text extracted from a page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextContent {
    pub items: Vec<TextItem>,
}

impl TextContent {
    /// Join the items into the text the viewer's text layer will show
    ///
    /// Viewers that do not report `has_eol` also do not create text layer
    /// elements for whitespace-only items, so those items are dropped.
    pub fn page_text(&self) -> String {
        let exclude_blank = self
            .items
            .first()
            .is_some_and(|item| item.has_eol.is_none());

        self.items
            .iter()
            .filter(|item| !exclude_blank || item.text.chars().any(|c| !c.is_whitespace()))
            .map(|item| item.text.as_str())
            .collect()
    }
}

/// Paginated viewer as seen by the anchoring engine
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Live range handle owned by the viewer
    type Range: Send;

    /// Number of pages in the document
    fn page_count(&self) -> usize;

    /// Page view for a page, or `None` while the document is still loading
    fn page_view(&self, page_index: usize) -> Option<PageView>;

    /// Subscription to the "all pages loaded" signal
    fn pages_loaded(&self) -> watch::Receiver<bool>;

    /// Extract the raw text items of a page
    async fn extract_text(&self, page_index: usize) -> Result<TextContent>;

    /// Text content of the page's rendered text layer, if any
    fn text_layer_content(&self, page_index: usize) -> Option<String>;

    /// Build a range from character offsets within the page's text layer
    fn text_layer_range(&self, page_index: usize, start: usize, end: usize) -> Result<Self::Range>;

    /// Insert a placeholder into the page container and return a range around it
    fn insert_placeholder(&self, page_index: usize) -> Result<Self::Range>;
}

/// Which end of a range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeEdge {
    Start,
    End,
}

/// A range boundary expressed relative to a page's text layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextLayerPoint {
    pub page_index: usize,
    /// Character offset within the page's text layer
    pub offset: usize,
}

/// Range utilities needed to describe a live selection
pub trait RangeDescriber: PageSource {
    /// Root element that quote context is computed against
    type Root: ?Sized + Sync;

    /// Shrink a range so both boundaries sit inside text.
    ///
    /// Returns `None` if the range does not contain any text.
    fn normalize_range(&self, range: &Self::Range) -> Option<Self::Range>;

    /// Locate a boundary within a page's text layer.
    ///
    /// Returns `None` if the boundary is not inside any text layer.
    fn text_layer_point(&self, range: &Self::Range, edge: RangeEdge) -> Option<TextLayerPoint>;

    /// Derive the quote (exact text plus context) for a range
    fn quote_selector(&self, root: &Self::Root, range: &Self::Range) -> Result<TextQuoteSelector>;
}

/// Get a page view, waiting for the "pages loaded" signal if needed
///
/// Loading happens in stages: at first the view does not exist, then it
/// exists without its page attached, and only once every page has loaded is
/// it usable. This is the only point where the engine blocks on the viewer.
/// There is no timeout; callers needing one wrap the whole operation.
pub async fn wait_for_page_view<S>(source: &S, page_index: usize) -> Result<PageView>
where
    S: PageSource + ?Sized,
{
    if let Some(view) = source.page_view(page_index).filter(|v| v.page_ready) {
        return Ok(view);
    }

    tracing::debug!(page_index, "Page view not ready, waiting for pages to load");

    let mut loaded = source.pages_loaded();
    loaded
        .wait_for(|loaded| *loaded)
        .await
        .map_err(|_| AnchorError::PageNotLoaded(page_index))?;

    source
        .page_view(page_index)
        .filter(|v| v.page_ready)
        .ok_or(AnchorError::PageNotLoaded(page_index))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_text_joins_items() {
        let content = TextContent {
            items: vec![
                TextItem::new("Pride And Prejudice", Some(true)),
                TextItem::new("       ", Some(true)),
                TextItem::new("By Jane Austen", Some(false)),
            ],
        };
        assert_eq!(content.page_text(), "Pride And Prejudice       By Jane Austen");
    }

    #[test]
    fn test_page_text_drops_blank_items_for_old_viewers() {
        let content = TextContent {
            items: vec![
                TextItem::new("Pride And Prejudice", None),
                TextItem::new("       ", None),
                TextItem::new("By Jane Austen", None),
            ],
        };
        assert_eq!(content.page_text(), "Pride And PrejudiceBy Jane Austen");
    }

    #[test]
    fn test_empty_content() {
        assert_eq!(TextContent::default().page_text(), "");
    }

    #[test]
    fn test_page_view_rendered() {
        let view = PageView {
            rendering_state: RenderingState::Finished,
            page_ready: true,
            text_layer_ready: true,
        };
        assert!(view.is_rendered());

        let running = PageView {
            rendering_state: RenderingState::Running,
            ..view
        };
        assert!(!running.is_rendered());

        let no_layer = PageView {
            text_layer_ready: false,
            ..view
        };
        assert!(!no_layer.is_rendered());
    }
}
