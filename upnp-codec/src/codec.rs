//! Codec traits
//!
//! Codecs are stateless: every call works on the body and the invocation or
//! event passed in, so one codec value can be shared between threads.

use upnp_model::{ActionDescriptor, ActionInvocation, ArgumentValue, IncomingEventRequest, OutgoingEventRequest};

use crate::error::Result;

/// Reads and writes the bodies of action requests and responses
pub trait ActionCodec: Send + Sync {
    /// Write the input arguments of an invocation as a request body
    fn encode_request(&self, invocation: &ActionInvocation) -> Result<String>;

    /// Write the outcome of an invocation (output or failure) as a response body
    fn encode_response(&self, invocation: &ActionInvocation) -> Result<String>;

    /// Read the input arguments of a received request, in declaration order
    fn decode_request(&self, body: &str, action: &ActionDescriptor) -> Result<Vec<ArgumentValue>>;

    /// Read a received response into the invocation's output or failure.
    ///
    /// A decoded remote fault is not an error: it is stored as the
    /// invocation's failure and `Ok(())` is returned.
    fn decode_response(&self, body: &str, invocation: &mut ActionInvocation) -> Result<()>;
}

/// Reads and writes GENA event bodies
pub trait EventCodec: Send + Sync {
    fn encode(&self, request: &OutgoingEventRequest) -> Result<String>;

    /// Read the state variable values of a received event into `request`.
    ///
    /// Values are appended as they are read, so a failed decode may leave
    /// a partial list behind.
    fn decode(&self, body: &str, request: &mut IncomingEventRequest) -> Result<()>;
}
