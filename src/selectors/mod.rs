//! Annotation selectors
//!
//! Serializable descriptions of a document passage, used as the input of
//! anchoring and the output of describing.

mod types;

pub use types::{find_position, find_quote, Selector, TextPositionSelector, TextQuoteSelector};
