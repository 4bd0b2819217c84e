//! Anchoring error types

use thiserror::Error;

/// Errors produced while anchoring or describing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnchorError {
    /// `anchor()` was given no text quote selector
    #[error("No quote selector found")]
    NoQuoteSelector,

    /// No page produced an acceptable match for the quote
    #[error("Quote not found")]
    QuoteNotFound,

    /// The selection does not contain any text
    #[error("Selection does not contain text")]
    EmptySelection,

    /// The selection is not inside a page's text layer
    #[error("Selection is outside page text")]
    OutsideText,

    /// The selection starts and ends on different pages
    #[error("Selecting across page breaks is not supported")]
    CrossPageSelection,

    /// Page index outside `[0, page_count)`
    #[error("Invalid page index {index} (document has {page_count} pages)")]
    InvalidPageIndex { index: usize, page_count: usize },

    /// The page view was still missing after the document finished loading
    #[error("Page {0} is not loaded")]
    PageNotLoaded(usize),

    /// The rendering subsystem failed to extract a page's text
    #[error("Text extraction failed for page {page_index}: {message}")]
    Extraction { page_index: usize, message: String },

    /// The rendering subsystem could not build a live range
    #[error("Range error: {0}")]
    Range(String),
}

impl AnchorError {
    /// Whether the error describes an invalid `describe()` input
    pub fn is_selection_error(&self) -> bool {
        matches!(
            self,
            AnchorError::EmptySelection | AnchorError::OutsideText | AnchorError::CrossPageSelection
        )
    }
}

/// Result type alias for anchoring operations
pub type Result<T> = std::result::Result<T, AnchorError>;
