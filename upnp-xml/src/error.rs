//! Error types for XML reading

use thiserror::Error;

/// Errors raised while walking an XML document
#[derive(Error, Debug)]
pub enum XmlError {
    /// The tokenizer rejected the input (bad markup, unknown entity, ...)
    #[error("XML syntax error at byte {position}: {source}")]
    Syntax {
        position: usize,
        #[source]
        source: quick_xml::Error,
    },

    /// The document ended while elements were still open
    #[error("Unexpected end of document, <{0}> is not closed")]
    UnexpectedEof(String),

    /// An end tag does not close the innermost open element
    #[error("Mismatched end tag: expected </{expected}>, found </{found}>")]
    MismatchedEnd { expected: String, found: String },

    /// Markup found where only text was expected
    #[error("Element <{element}> found inside text-only element <{parent}>")]
    UnexpectedElement { parent: String, element: String },

    /// Text or a second root element after the document element
    #[error("Content outside of the document element: {0}")]
    OutsideRoot(String),

    /// `read_text` or `skip_element` called while not positioned on a start tag
    #[error("Cursor is not positioned on a start tag")]
    NotOnStartTag,

    /// A required element is absent
    #[error("Missing required element: {0}")]
    MissingElement(String),
}

/// Result type alias for XML operations
pub type Result<T> = std::result::Result<T, XmlError>;
