//! Selector types following the W3C Web Annotation data model
//!
//! Selectors are the durable half of an annotation target: they are
//! persisted with the annotation and later resolved against the live
//! document by the anchoring engine.
//!
//! Reference: <https://www.w3.org/TR/annotation-model/#selectors>

use serde::{Deserialize, Serialize};

/// Identifies a passage by its content and surrounding context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextQuoteSelector {
    /// The exact text that was selected
    pub exact: String,
    /// Text before the selection (for context)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    /// Text after the selection (for context)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
}

impl TextQuoteSelector {
    /// Create a quote selector without context
    pub fn new(exact: &str) -> Self {
        Self {
            exact: exact.to_string(),
            prefix: None,
            suffix: None,
        }
    }

    /// Set the text preceding the quote
    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.prefix = Some(prefix.to_string());
        self
    }

    /// Set the text following the quote
    pub fn with_suffix(mut self, suffix: &str) -> Self {
        self.suffix = Some(suffix.to_string());
        self
    }

    /// Whether a prefix or suffix was supplied
    pub fn has_context(&self) -> bool {
        self.prefix.is_some() || self.suffix.is_some()
    }
}

/// Character range within the document's logical text
///
/// Offsets count characters of the concatenated page texts. They are only
/// meaningful for one extraction pass and may drift across reloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextPositionSelector {
    /// Start character offset
    pub start: usize,
    /// End character offset (exclusive)
    pub end: usize,
}

impl TextPositionSelector {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Number of characters covered
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Any selector that may appear in an annotation target
///
/// Selector types the engine does not understand deserialize to
/// [`Selector::Other`] so that a stored target never fails to load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Selector {
    /// Text quote with context
    #[serde(rename = "TextQuoteSelector")]
    TextQuote(TextQuoteSelector),
    /// Character position within document
    #[serde(rename = "TextPositionSelector")]
    TextPosition(TextPositionSelector),
    /// Fragment identifier (e.g. `page=3`)
    #[serde(rename = "FragmentSelector")]
    Fragment {
        value: String,
        #[serde(
            rename = "conformsTo",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        conforms_to: Option<String>,
    },
    /// Unrecognised selector type
    #[serde(other)]
    Other,
}

impl From<TextQuoteSelector> for Selector {
    fn from(quote: TextQuoteSelector) -> Self {
        Selector::TextQuote(quote)
    }
}

impl From<TextPositionSelector> for Selector {
    fn from(position: TextPositionSelector) -> Self {
        Selector::TextPosition(position)
    }
}

/// Get the first text quote selector in a list
pub fn find_quote(selectors: &[Selector]) -> Option<&TextQuoteSelector> {
    selectors.iter().find_map(|s| match s {
        Selector::TextQuote(quote) => Some(quote),
        _ => None,
    })
}

/// Get the first text position selector in a list
pub fn find_position(selectors: &[Selector]) -> Option<&TextPositionSelector> {
    selectors.iter().find_map(|s| match s {
        Selector::TextPosition(position) => Some(position),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_builder() {
        let quote = TextQuoteSelector::new("Mr. Bennet")
            .with_prefix("My dear ")
            .with_suffix(",\" said");

        assert_eq!(quote.exact, "Mr. Bennet");
        assert_eq!(quote.prefix.as_deref(), Some("My dear "));
        assert!(quote.has_context());
        assert!(!TextQuoteSelector::new("x").has_context());
    }

    #[test]
    fn test_selector_serialization() {
        let selectors: Vec<Selector> = vec![
            TextPositionSelector::new(10, 26).into(),
            TextQuoteSelector::new("Netherfield Park").with_prefix("that ").into(),
        ];

        let json = serde_json::to_string(&selectors).unwrap();
        assert!(json.contains("\"type\":\"TextPositionSelector\""));
        assert!(json.contains("\"type\":\"TextQuoteSelector\""));
        assert!(!json.contains("suffix"));

        let parsed: Vec<Selector> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, selectors);
    }

    #[test]
    fn test_unknown_selector_is_tolerated() {
        let json = r#"[
            {"type": "RangeSelector", "startContainer": "/div[1]"},
            {"type": "FragmentSelector", "value": "page=3"},
            {"type": "TextQuoteSelector", "exact": "zombie"}
        ]"#;
        let parsed: Vec<Selector> = serde_json::from_str(json).unwrap();

        assert_eq!(parsed[0], Selector::Other);
        assert!(matches!(&parsed[1], Selector::Fragment { value, .. } if value == "page=3"));
        assert_eq!(find_quote(&parsed).unwrap().exact, "zombie");
        assert!(find_position(&parsed).is_none());
    }

    #[test]
    fn test_position_len() {
        let position = TextPositionSelector::new(5, 12);
        assert_eq!(position.len(), 7);
        assert!(!position.is_empty());
        assert!(TextPositionSelector::new(9, 3).is_empty());
    }
}
