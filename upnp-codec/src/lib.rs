//! Wire codecs for UPnP action invocation and eventing
//!
//! This crate turns [`ActionInvocation`](upnp_model::ActionInvocation)s and
//! event requests into message bodies and back:
//!
//! - [`SoapActionCodec`]: SOAP envelopes for action requests, responses and faults
//! - [`GenaEventCodec`]: GENA `propertyset` event bodies
//! - [`FormActionCodec`]: `key=value` bodies used by the HTTP gateway
//! - [`Recovering`]: wraps a codec with repair-and-retry for malformed bodies
//!
//! [`UpnpCodecs`] bundles the three codecs configured from a [`CodecConfig`].
//! No I/O happens here: bodies arrive already read by the transport.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use upnp_codec::{ActionCodec, UpnpCodecs};
//! use upnp_model::{ActionDescriptor, ActionInvocation, ArgumentSpec, Datatype};
//!
//! let action = Arc::new(
//!     ActionDescriptor::new("urn:schemas-upnp-org:service:RenderingControl:1", "GetVolume")
//!         .with_input(ArgumentSpec::input("InstanceID", Datatype::Ui4))
//!         .with_input(ArgumentSpec::input("Channel", Datatype::String))
//!         .with_output(ArgumentSpec::output("CurrentVolume", Datatype::Ui2)),
//! );
//!
//! let codecs = UpnpCodecs::default();
//! let mut invocation = ActionInvocation::new(action.clone());
//! invocation.set_input("InstanceID", 0u32).unwrap();
//! invocation.set_input("Channel", "Master").unwrap();
//! let request = codecs.soap().encode_request(&invocation).unwrap();
//! assert!(request.contains("<Channel>Master</Channel>"));
//!
//! let response = r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"><s:Body>
//!     <u:GetVolumeResponse xmlns:u="urn:schemas-upnp-org:service:RenderingControl:1">
//!     <CurrentVolume>25</CurrentVolume></u:GetVolumeResponse></s:Body></s:Envelope>"#;
//! codecs.soap().decode_response(response, &mut invocation).unwrap();
//! assert_eq!(invocation.output_value("CurrentVolume").unwrap().as_u64(), Some(25));
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod form;
pub mod gena;
pub mod logging;
pub mod recovery;
pub mod soap;

pub use codec::{ActionCodec, EventCodec};
pub use config::{CodecConfig, PartialEventPolicy};
pub use error::{CodecError, Result};
pub use form::{decode_failure, no_response_failure, FormActionCodec, FormData};
pub use gena::GenaEventCodec;
pub use recovery::{InvalidBodyHook, Recovering, RepairPlan};
pub use soap::SoapActionCodec;

use std::sync::Arc;

/// The codecs used by one UPnP stack, configured together
#[derive(Debug, Clone)]
pub struct UpnpCodecs {
    config: CodecConfig,
    soap: Recovering<SoapActionCodec>,
    gena: Recovering<GenaEventCodec>,
    form: FormActionCodec,
}

impl UpnpCodecs {
    /// Build the codecs after validating `config`
    pub fn new(config: CodecConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            soap: Recovering::new(SoapActionCodec::new(), config.clone()),
            gena: Recovering::new(GenaEventCodec::new(), config.clone()),
            form: FormActionCodec::new(),
            config,
        })
    }

    /// Observe SOAP and GENA bodies that stay broken after every repair
    pub fn with_invalid_body_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&str, &CodecError) + Send + Sync + 'static,
    {
        let hook: InvalidBodyHook = Arc::new(hook);
        self.soap.set_invalid_body_hook(Some(hook.clone()));
        self.gena.set_invalid_body_hook(Some(hook));
        self
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// SOAP action codec, with recovery as configured
    pub fn soap(&self) -> &Recovering<SoapActionCodec> {
        &self.soap
    }

    /// GENA event codec, with recovery as configured
    pub fn gena(&self) -> &Recovering<GenaEventCodec> {
        &self.gena
    }

    pub fn form(&self) -> &FormActionCodec {
        &self.form
    }
}

impl Default for UpnpCodecs {
    fn default() -> Self {
        let config = CodecConfig::default();
        Self {
            soap: Recovering::new(SoapActionCodec::new(), config.clone()),
            gena: Recovering::new(GenaEventCodec::new(), config.clone()),
            form: FormActionCodec::new(),
            config,
        }
    }
}
