//! Error types for the codecs

use thiserror::Error;
use upnp_model::{ActionError, ModelError};
use upnp_xml::XmlError;

/// Errors that can occur while encoding or decoding message bodies
#[derive(Debug, Error)]
pub enum CodecError {
    /// The body is not usable: not parseable, a required element is missing,
    /// or the number of arguments does not match the declaration.
    ///
    /// Carries the offending body for diagnostics.
    #[error("Can't transform message payload: {message}")]
    UnsupportedData { message: String, body: String },

    /// A matched argument's text could not be converted to its datatype
    #[error("Invalid argument value: {0}")]
    ArgumentConversion(ActionError),

    /// The invocation or event could not be written
    #[error("Can't write message body: {0}")]
    Encoding(String),

    /// Invalid codec configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CodecError {
    pub fn unsupported(message: impl Into<String>, body: &str) -> Self {
        CodecError::UnsupportedData {
            message: message.into(),
            body: body.to_string(),
        }
    }

    pub(crate) fn from_xml(error: XmlError, body: &str) -> Self {
        Self::unsupported(error.to_string(), body)
    }

    /// Body that failed to decode, for `UnsupportedData` errors
    pub fn body(&self) -> Option<&str> {
        match self {
            CodecError::UnsupportedData { body, .. } => Some(body),
            _ => None,
        }
    }

    pub fn is_unsupported_data(&self) -> bool {
        matches!(self, CodecError::UnsupportedData { .. })
    }
}

impl From<ModelError> for CodecError {
    fn from(error: ModelError) -> Self {
        CodecError::Encoding(error.to_string())
    }
}

/// Type alias for results that can return a CodecError
pub type Result<T> = std::result::Result<T, CodecError>;
