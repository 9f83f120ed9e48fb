//! Error types for the UPnP data model

use thiserror::Error;

use crate::datatype::Datatype;

/// A wire string that could not be converted to its declared datatype.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Invalid value '{text}' for datatype '{datatype}': {reason}")]
pub struct InvalidValue {
    /// The datatype the text was converted to
    pub datatype: Datatype,
    /// The offending wire text
    pub text: String,
    /// Why the conversion failed
    pub reason: String,
}

impl InvalidValue {
    pub fn new(datatype: Datatype, text: &str, reason: impl Into<String>) -> Self {
        Self {
            datatype,
            text: text.to_string(),
            reason: reason.into(),
        }
    }
}

/// Errors raised when a model invariant would be violated
#[derive(Debug, Error)]
pub enum ModelError {
    /// The argument name (or alias) is not declared by the action
    #[error("Action '{action}' has no {direction} argument named '{argument}'")]
    UnknownArgument {
        action: String,
        direction: &'static str,
        argument: String,
    },

    /// A complete argument list does not match the declaration by name and order
    #[error("Arguments of action '{action}' do not match the declaration: {reason}")]
    ArgumentMismatch { action: String, reason: String },

    /// A typed value does not belong to the declared datatype
    #[error("Value {value} is not a valid '{datatype}'")]
    TypeMismatch { datatype: Datatype, value: String },

    /// Output and failure are mutually exclusive on one invocation
    #[error("Invocation of '{0}' already completed with a failure")]
    AlreadyFailed(String),

    /// Name of a datatype that is not a UPnP built-in
    #[error("Unknown UPnP datatype: {0}")]
    UnknownDatatype(String),

    #[error(transparent)]
    InvalidValue(#[from] InvalidValue),
}

/// Type alias for results that can return a ModelError
pub type Result<T> = std::result::Result<T, ModelError>;
