//! In-memory paginated document
//!
//! [`ExtractedDocument`] holds pre-extracted page text and simulates the
//! viewer state the anchoring engine depends on: staged loading, per-page
//! rendering with a text layer, and placeholders for pages that have not
//! rendered yet. The HTTP server registers one per uploaded document.

use std::collections::HashSet;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::sync::watch;

use crate::anchoring::{
    AnchorError, PageSource, PageView, RangeDescriber, RangeEdge, RenderingState, Result,
    TextContent, TextItem, TextLayerPoint,
};
use crate::selectors::TextQuoteSelector;

/// Text of the element inserted into pages that have not rendered yet
pub const PLACEHOLDER_TEXT: &str = "Loading annotations...";

/// Characters of context captured on each side of a quote
pub const DEFAULT_CONTEXT_CHARS: usize = 32;

/// A node a range boundary can sit in
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Text inside a page's text layer; offsets are relative to the layer
    TextLayer { page_index: usize },
    /// The page container element itself
    Container { page_index: usize },
    /// Placeholder element inside a page container
    Placeholder { page_index: usize },
    /// Text outside of any page
    Detached { text: String },
}

/// One boundary of a [`LiveRange`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangePoint {
    pub node: Node,
    pub offset: usize,
}

/// Range over the simulated viewer content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveRange {
    pub start: RangePoint,
    pub end: RangePoint,
}

impl LiveRange {
    /// Range within a single node
    pub fn within(node: Node, start: usize, end: usize) -> Self {
        Self {
            start: RangePoint {
                node: node.clone(),
                offset: start,
            },
            end: RangePoint { node, offset: end },
        }
    }
}

/// Loading stage of the simulated viewer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoadStage {
    /// Page views do not exist yet
    Loading,
    /// Page views exist but their pages are not attached
    Initialized,
    Loaded,
}

#[derive(Debug, Default)]
struct MemoryPage {
    items: Vec<TextItem>,
    rendered: bool,
    layer_override: Option<String>,
    has_placeholder: bool,
    extractions: usize,
}

impl MemoryPage {
    fn content(&self) -> TextContent {
        TextContent {
            items: self.items.clone(),
        }
    }

    /// Text shown by the text layer when rendered
    fn layer_text(&self) -> String {
        match &self.layer_override {
            Some(text) => text.clone(),
            None => self.content().page_text(),
        }
    }
}

struct State {
    pages: Vec<MemoryPage>,
    stage: LoadStage,
}

/// A document whose pages have already been extracted
pub struct ExtractedDocument {
    state: RwLock<State>,
    loaded: watch::Sender<bool>,
    context_chars: usize,
}

impl ExtractedDocument {
    /// Create a fully loaded document with every page rendered
    pub fn new(pages: Vec<Vec<TextItem>>) -> Self {
        let pages = pages
            .into_iter()
            .map(|items| MemoryPage {
                items,
                rendered: true,
                ..Default::default()
            })
            .collect();
        let (loaded, _) = watch::channel(true);

        Self {
            state: RwLock::new(State {
                pages,
                stage: LoadStage::Loaded,
            }),
            loaded,
            context_chars: DEFAULT_CONTEXT_CHARS,
        }
    }

    /// Create a document from page strings
    ///
    /// Each line becomes one text item flagged with an end-of-line marker;
    /// the newlines themselves are not part of the page text.
    pub fn from_pages<T: AsRef<str>>(pages: &[T]) -> Self {
        let pages = pages
            .iter()
            .map(|page| {
                let lines: Vec<&str> = page.as_ref().split('\n').collect();
                let last = lines.len() - 1;
                lines
                    .iter()
                    .enumerate()
                    .map(|(i, line)| TextItem::new(line, Some(i != last)))
                    .collect()
            })
            .collect();
        Self::new(pages)
    }

    /// Drop end-of-line markers, like viewers that predate them
    pub fn legacy_text_rendering(self) -> Self {
        {
            let mut state = self.state.write();
            for item in state.pages.iter_mut().flat_map(|p| p.items.iter_mut()) {
                item.has_eol = None;
            }
        }
        self
    }

    /// Start in the loading stage, before page views exist
    pub fn loading(self) -> Self {
        self.state.write().stage = LoadStage::Loading;
        self.loaded.send_replace(false);
        self
    }

    pub fn with_context_chars(mut self, context_chars: usize) -> Self {
        self.context_chars = context_chars;
        self
    }

    /// Page views exist but pages are not attached yet
    pub fn mark_pages_initialized(&self) {
        let mut state = self.state.write();
        if state.stage == LoadStage::Loading {
            state.stage = LoadStage::Initialized;
        }
    }

    /// Finish loading and notify waiters
    pub fn mark_pages_loaded(&self) {
        self.state.write().stage = LoadStage::Loaded;
        self.loaded.send_replace(true);
    }

    /// Render exactly the given pages; all others lose their text layer
    pub fn set_rendered_pages(&self, pages: impl IntoIterator<Item = usize>) {
        let rendered: HashSet<usize> = pages.into_iter().collect();
        let mut state = self.state.write();
        for (index, page) in state.pages.iter_mut().enumerate() {
            page.rendered = rendered.contains(&index);
            if page.rendered {
                page.has_placeholder = false;
            }
        }
    }

    /// Replace what the text layer of a page shows
    pub fn set_text_layer_override(&self, page_index: usize, text: &str) {
        if let Some(page) = self.state.write().pages.get_mut(page_index) {
            page.layer_override = Some(text.to_string());
        }
    }

    /// Number of text extraction calls made for a page
    pub fn extraction_count(&self, page_index: usize) -> usize {
        self.state
            .read()
            .pages
            .get(page_index)
            .map_or(0, |p| p.extractions)
    }

    /// Number of placeholder elements in a page container
    pub fn placeholder_count(&self, page_index: usize) -> usize {
        self.state
            .read()
            .pages
            .get(page_index)
            .map_or(0, |p| usize::from(p.has_placeholder))
    }

    /// Range over the first occurrence of `needle` in a rendered text layer
    pub fn find_text(&self, needle: &str) -> Option<LiveRange> {
        let state = self.state.read();
        state
            .pages
            .iter()
            .enumerate()
            .filter(|(_, page)| page.rendered)
            .find_map(|(page_index, page)| {
                let layer = page.layer_text();
                let byte_start = layer.find(needle)?;
                let start = layer[..byte_start].chars().count();
                let end = start + needle.chars().count();
                Some(LiveRange::within(Node::TextLayer { page_index }, start, end))
            })
    }

    /// Range over `[start, end)` of a page's text layer
    pub fn text_range(&self, page_index: usize, start: usize, end: usize) -> LiveRange {
        LiveRange::within(Node::TextLayer { page_index }, start, end)
    }

    /// Text covered by a range
    pub fn range_text(&self, range: &LiveRange) -> String {
        let state = self.state.read();
        match (&range.start.node, &range.end.node) {
            (Node::Placeholder { .. }, _) => PLACEHOLDER_TEXT.to_string(),
            (Node::Detached { text }, Node::Detached { .. }) => {
                slice_chars(text, range.start.offset, range.end.offset)
            }
            (Node::TextLayer { page_index: first }, Node::TextLayer { page_index: last }) => {
                let mut text = String::new();
                for index in *first..=*last {
                    let Some(page) = state.pages.get(index).filter(|p| p.rendered) else {
                        continue;
                    };
                    let layer = page.layer_text();
                    let from = if index == *first { range.start.offset } else { 0 };
                    let to = if index == *last {
                        range.end.offset
                    } else {
                        usize::MAX
                    };
                    text.push_str(&slice_chars(&layer, from, to));
                }
                text
            }
            _ => String::new(),
        }
    }

    fn layer_len(&self, page_index: usize) -> Option<usize> {
        let state = self.state.read();
        let page = state.pages.get(page_index).filter(|p| p.rendered)?;
        Some(page.layer_text().chars().count())
    }
}

fn slice_chars(text: &str, start: usize, end: usize) -> String {
    text.chars()
        .skip(start)
        .take(end.saturating_sub(start))
        .collect()
}

#[async_trait]
impl PageSource for ExtractedDocument {
    type Range = LiveRange;

    fn page_count(&self) -> usize {
        self.state.read().pages.len()
    }

    fn page_view(&self, page_index: usize) -> Option<PageView> {
        let state = self.state.read();
        let page = state.pages.get(page_index)?;
        match state.stage {
            LoadStage::Loading => None,
            LoadStage::Initialized => Some(PageView::default()),
            LoadStage::Loaded => Some(PageView {
                rendering_state: if page.rendered {
                    RenderingState::Finished
                } else {
                    RenderingState::Initial
                },
                page_ready: true,
                text_layer_ready: page.rendered,
            }),
        }
    }

    fn pages_loaded(&self) -> watch::Receiver<bool> {
        self.loaded.subscribe()
    }

    async fn extract_text(&self, page_index: usize) -> Result<TextContent> {
        let mut state = self.state.write();
        let page_count = state.pages.len();
        let page = state
            .pages
            .get_mut(page_index)
            .ok_or(AnchorError::InvalidPageIndex {
                index: page_index,
                page_count,
            })?;
        page.extractions += 1;
        Ok(page.content())
    }

    fn text_layer_content(&self, page_index: usize) -> Option<String> {
        let state = self.state.read();
        state
            .pages
            .get(page_index)
            .filter(|p| p.rendered)
            .map(MemoryPage::layer_text)
    }

    fn text_layer_range(&self, page_index: usize, start: usize, end: usize) -> Result<LiveRange> {
        let len = self
            .layer_len(page_index)
            .ok_or_else(|| AnchorError::Range(format!("page {page_index} has no text layer")))?;
        if start > end || end > len {
            return Err(AnchorError::Range(format!(
                "offsets {start}..{end} outside text layer of length {len}"
            )));
        }
        Ok(self.text_range(page_index, start, end))
    }

    fn insert_placeholder(&self, page_index: usize) -> Result<LiveRange> {
        let mut state = self.state.write();
        let page_count = state.pages.len();
        let page = state
            .pages
            .get_mut(page_index)
            .ok_or(AnchorError::InvalidPageIndex {
                index: page_index,
                page_count,
            })?;

        // Reuse an existing placeholder
        page.has_placeholder = true;
        Ok(LiveRange::within(
            Node::Placeholder { page_index },
            0,
            PLACEHOLDER_TEXT.chars().count(),
        ))
    }
}

impl RangeDescriber for ExtractedDocument {
    type Root = ExtractedDocument;

    fn normalize_range(&self, range: &LiveRange) -> Option<LiveRange> {
        let start = self.normalize_point(&range.start, RangeEdge::Start)?;
        let end = self.normalize_point(&range.end, RangeEdge::End)?;
        Some(LiveRange { start, end })
    }

    fn text_layer_point(&self, range: &LiveRange, edge: RangeEdge) -> Option<TextLayerPoint> {
        let point = match edge {
            RangeEdge::Start => &range.start,
            RangeEdge::End => &range.end,
        };
        match point.node {
            Node::TextLayer { page_index } => Some(TextLayerPoint {
                page_index,
                offset: point.offset,
            }),
            _ => None,
        }
    }

    /// Exact text plus up to `context_chars` of context from the rendered
    /// text layers of `root`
    fn quote_selector(&self, root: &ExtractedDocument, range: &LiveRange) -> Result<TextQuoteSelector> {
        let (Some(start), Some(end)) = (
            self.text_layer_point(range, RangeEdge::Start),
            self.text_layer_point(range, RangeEdge::End),
        ) else {
            return Err(AnchorError::OutsideText);
        };

        let state = root.state.read();
        let mut root_text: Vec<char> = Vec::new();
        let mut start_in_root = None;
        let mut end_in_root = None;
        for (index, page) in state.pages.iter().enumerate() {
            if !page.rendered {
                continue;
            }
            if index == start.page_index {
                start_in_root = Some(root_text.len() + start.offset);
            }
            if index == end.page_index {
                end_in_root = Some(root_text.len() + end.offset);
            }
            root_text.extend(page.layer_text().chars());
        }

        let (Some(start), Some(end)) = (start_in_root, end_in_root) else {
            return Err(AnchorError::Range(format!(
                "page {} has no text layer",
                start.page_index
            )));
        };
        let end = end.min(root_text.len());
        let start = start.min(end);

        let prefix_from = start.saturating_sub(root.context_chars);
        let suffix_to = (end + root.context_chars).min(root_text.len());

        Ok(TextQuoteSelector {
            exact: root_text[start..end].iter().collect(),
            prefix: Some(root_text[prefix_from..start].iter().collect()),
            suffix: Some(root_text[end..suffix_to].iter().collect()),
        })
    }
}

impl ExtractedDocument {
    /// Move a boundary into text, or `None` if it cannot hold text
    fn normalize_point(&self, point: &RangePoint, edge: RangeEdge) -> Option<RangePoint> {
        match &point.node {
            Node::TextLayer { page_index } => {
                let len = self.layer_len(*page_index)?;
                Some(RangePoint {
                    node: point.node.clone(),
                    offset: point.offset.min(len),
                })
            }
            Node::Container { page_index } => {
                let len = self.layer_len(*page_index).filter(|len| *len > 0)?;
                let offset = match edge {
                    RangeEdge::Start => 0,
                    RangeEdge::End => len,
                };
                Some(RangePoint {
                    node: Node::TextLayer {
                        page_index: *page_index,
                    },
                    offset,
                })
            }
            Node::Placeholder { .. } => Some(point.clone()),
            Node::Detached { text } if !text.is_empty() => Some(point.clone()),
            Node::Detached { .. } => None,
        }
    }
}
