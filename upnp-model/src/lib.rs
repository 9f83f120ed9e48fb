//! Data model for UPnP action invocation and GENA eventing
//!
//! This crate holds the types that the wire codecs read from and write into:
//! action and argument descriptors, typed argument values, invocations with
//! their outcome, state variables and event requests. It performs no I/O.
//!
//! ```rust
//! use std::sync::Arc;
//! use upnp_model::{ActionDescriptor, ActionInvocation, ArgumentSpec, Datatype};
//!
//! let action = ActionDescriptor::new("urn:schemas-upnp-org:service:RenderingControl:1", "SetMute")
//!     .with_input(ArgumentSpec::input("InstanceID", Datatype::Ui4))
//!     .with_input(ArgumentSpec::input("Channel", Datatype::String))
//!     .with_input(ArgumentSpec::input("DesiredMute", Datatype::Boolean));
//!
//! let mut invocation = ActionInvocation::new(Arc::new(action));
//! invocation.set_input("InstanceID", 0u32).unwrap();
//! invocation.set_input("Channel", "Master").unwrap();
//! invocation.set_input("DesiredMute", true).unwrap();
//! assert_eq!(invocation.input_value("DesiredMute").unwrap().to_wire_string(), "1");
//! ```

pub mod action;
pub mod datatype;
pub mod error;
pub mod error_code;
pub mod event;
pub mod invocation;
pub mod service;

pub use action::{ActionDescriptor, ArgumentSpec, Direction};
pub use datatype::{Datatype, Value, NULL_OUTPUT_VALUE};
pub use error::{InvalidValue, ModelError, Result};
pub use error_code::{ActionError, ErrorCode, FaultCode};
pub use event::{EventSequence, IncomingEventRequest, OutgoingEventRequest, StateVariableValue};
pub use invocation::{ActionInvocation, ArgumentValue};
pub use service::{ServiceDescriptor, StateVariable};
