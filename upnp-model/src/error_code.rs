//! UPnP control error codes and action failures
//!
//! A failed action is reported on the wire as a numeric error code plus a
//! description. Codes defined by the UPnP Device Architecture map to
//! [`ErrorCode`]; anything else a device sends is kept as
//! [`FaultCode::Custom`] so no information is lost.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error codes defined by the UPnP Device Architecture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    InvalidAction,
    InvalidArgs,
    InvalidSequenceNumber,
    InvalidControlUrl,
    ActionFailed,
    ArgumentValueInvalid,
    ArgumentValueOutOfRange,
    OptionalAction,
    OutOfMemory,
    HumanInterventionRequired,
    ArgumentTooLong,
    ActionNotAuthorized,
    SignatureFailure,
    SignatureMissing,
    NotEncrypted,
    InvalidSequence,
    InvalidControlUrlSession,
    NoSuchSession,
}

impl ErrorCode {
    /// Lookup table of every standard code
    pub const ALL: [ErrorCode; 18] = [
        ErrorCode::InvalidAction,
        ErrorCode::InvalidArgs,
        ErrorCode::InvalidSequenceNumber,
        ErrorCode::InvalidControlUrl,
        ErrorCode::ActionFailed,
        ErrorCode::ArgumentValueInvalid,
        ErrorCode::ArgumentValueOutOfRange,
        ErrorCode::OptionalAction,
        ErrorCode::OutOfMemory,
        ErrorCode::HumanInterventionRequired,
        ErrorCode::ArgumentTooLong,
        ErrorCode::ActionNotAuthorized,
        ErrorCode::SignatureFailure,
        ErrorCode::SignatureMissing,
        ErrorCode::NotEncrypted,
        ErrorCode::InvalidSequence,
        ErrorCode::InvalidControlUrlSession,
        ErrorCode::NoSuchSession,
    ];

    /// Numeric value carried in `<errorCode>`
    pub const fn code(self) -> u32 {
        match self {
            ErrorCode::InvalidAction => 401,
            ErrorCode::InvalidArgs => 402,
            ErrorCode::InvalidSequenceNumber => 403,
            ErrorCode::InvalidControlUrl => 404,
            ErrorCode::ActionFailed => 501,
            ErrorCode::ArgumentValueInvalid => 600,
            ErrorCode::ArgumentValueOutOfRange => 601,
            ErrorCode::OptionalAction => 602,
            ErrorCode::OutOfMemory => 603,
            ErrorCode::HumanInterventionRequired => 604,
            ErrorCode::ArgumentTooLong => 605,
            ErrorCode::ActionNotAuthorized => 606,
            ErrorCode::SignatureFailure => 607,
            ErrorCode::SignatureMissing => 608,
            ErrorCode::NotEncrypted => 609,
            ErrorCode::InvalidSequence => 610,
            ErrorCode::InvalidControlUrlSession => 611,
            ErrorCode::NoSuchSession => 612,
        }
    }

    /// Description from the UPnP Device Architecture
    pub const fn description(self) -> &'static str {
        match self {
            ErrorCode::InvalidAction => "No action by that name at this service",
            ErrorCode::InvalidArgs => "Not enough IN arguments, too many IN arguments, no IN argument by that name, one or more IN arguments are of the wrong data type",
            ErrorCode::InvalidSequenceNumber => "The sequence number is invalid",
            ErrorCode::InvalidControlUrl => "The control URL is invalid",
            ErrorCode::ActionFailed => "Current state of service prevents invoking that action",
            ErrorCode::ArgumentValueInvalid => "The argument value is invalid",
            ErrorCode::ArgumentValueOutOfRange => "An argument value is less than the minimum or more than the maximum value of the allowed value range, or is not in the allowed value list",
            ErrorCode::OptionalAction => "The requested action is optional and is not implemented by the device",
            ErrorCode::OutOfMemory => "The device does not have sufficient memory available to complete the action",
            ErrorCode::HumanInterventionRequired => "The device has encountered an error condition which it cannot resolve itself and required human intervention such as a reset or power cycle",
            ErrorCode::ArgumentTooLong => "A string argument is too long for the device to handle properly",
            ErrorCode::ActionNotAuthorized => "The action requested requires authorization and the sender was not authorized",
            ErrorCode::SignatureFailure => "The sender's signature failed to verify",
            ErrorCode::SignatureMissing => "The action requested requires a digital signature and there was none provided",
            ErrorCode::NotEncrypted => "This action requires confidentiality but the action was not delivered encrypted",
            ErrorCode::InvalidSequence => "The sequence provided was not valid",
            ErrorCode::InvalidControlUrlSession => "The controlURL within the freshness element does not match the controlURL of the action actually invoked",
            ErrorCode::NoSuchSession => "The session key reference is to a non-existent session",
        }
    }

    /// Find the standard code for a numeric value
    pub fn from_code(code: u32) -> Option<ErrorCode> {
        ErrorCode::ALL.iter().copied().find(|c| c.code() == code)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Numeric fault code as received from or sent to a device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FaultCode {
    Standard(ErrorCode),
    Custom(u32),
}

impl FaultCode {
    /// Classify a numeric code, keeping unknown values as custom codes
    pub fn from_code(code: u32) -> Self {
        ErrorCode::from_code(code)
            .map(FaultCode::Standard)
            .unwrap_or(FaultCode::Custom(code))
    }

    pub fn code(&self) -> u32 {
        match self {
            FaultCode::Standard(c) => c.code(),
            FaultCode::Custom(n) => *n,
        }
    }

    pub fn error_code(&self) -> Option<ErrorCode> {
        match self {
            FaultCode::Standard(c) => Some(*c),
            FaultCode::Custom(_) => None,
        }
    }
}

impl From<ErrorCode> for FaultCode {
    fn from(code: ErrorCode) -> Self {
        FaultCode::Standard(code)
    }
}

impl fmt::Display for FaultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Failure outcome of an action invocation
///
/// This is what a remote `UPnPError` fault decodes to, and what a local
/// service sets on an invocation it could not complete.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{description} (UPnP error {code})")]
pub struct ActionError {
    code: FaultCode,
    description: String,
    cause: Option<String>,
}

impl ActionError {
    pub fn new(code: impl Into<FaultCode>, description: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            description: description.into(),
            cause: None,
        }
    }

    /// Failure carrying the standard description of the code
    pub fn standard(code: ErrorCode) -> Self {
        Self::new(code, code.description())
    }

    /// Attach the underlying cause, e.g. a value conversion error
    pub fn with_cause(mut self, cause: impl fmt::Display) -> Self {
        self.cause = Some(cause.to_string());
        self
    }

    pub fn code(&self) -> FaultCode {
        self.code
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn cause(&self) -> Option<&str> {
        self.cause.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(401, ErrorCode::InvalidAction)]
    #[case(402, ErrorCode::InvalidArgs)]
    #[case(501, ErrorCode::ActionFailed)]
    #[case(600, ErrorCode::ArgumentValueInvalid)]
    #[case(612, ErrorCode::NoSuchSession)]
    fn test_standard_codes(#[case] code: u32, #[case] expected: ErrorCode) {
        assert_eq!(ErrorCode::from_code(code), Some(expected));
        assert_eq!(FaultCode::from_code(code), FaultCode::Standard(expected));
        assert_eq!(expected.code(), code);
    }

    #[test]
    fn test_table_has_unique_codes() {
        for (i, a) in ErrorCode::ALL.iter().enumerate() {
            for b in &ErrorCode::ALL[i + 1..] {
                assert_ne!(a.code(), b.code(), "{:?} and {:?} share a code", a, b);
            }
        }
    }

    #[test]
    fn test_custom_code_is_preserved() {
        let code = FaultCode::from_code(718);
        assert_eq!(code, FaultCode::Custom(718));
        assert_eq!(code.code(), 718);
        assert_eq!(code.error_code(), None);
    }

    #[test]
    fn test_action_error_display() {
        let err = ActionError::standard(ErrorCode::InvalidAction);
        assert_eq!(
            err.to_string(),
            "No action by that name at this service (UPnP error 401)"
        );

        let err = ActionError::new(FaultCode::Custom(714), "No such resource")
            .with_cause("missing");
        assert_eq!(err.code().code(), 714);
        assert_eq!(err.cause(), Some("missing"));
    }
}
