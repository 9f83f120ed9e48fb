//! Form-encoded action bodies for the HTTP gateway
//!
//! The gateway proxies action invocations as `key=value&key=value` bodies
//! instead of SOAP envelopes. Values are percent-encoded, keys are written
//! as-is. Empty output values travel as [`NULL_OUTPUT_VALUE`] and failures as
//! `error-code` / `error-description` pairs.

use std::borrow::Cow;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use tracing::debug;
use upnp_model::{
    ActionDescriptor, ActionError, ActionInvocation, ArgumentSpec, ArgumentValue, ErrorCode,
    FaultCode, NULL_OUTPUT_VALUE,
};

use crate::codec::ActionCodec;
use crate::error::{CodecError, Result};

pub const ERROR_CODE_KEY: &str = "error-code";
pub const ERROR_DESCRIPTION_KEY: &str = "error-description";

/// Characters left alone by the value encoder (RFC 3986 unreserved)
const VALUE_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Ordered form fields; duplicate keys are kept but only the first is read
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    fields: Vec<(String, String)>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a form body, percent-decoding the values.
    ///
    /// A parameter without `=` is a key with an empty value.
    pub fn parse(body: &str) -> Self {
        let fields = body
            .trim()
            .split('&')
            .filter(|param| !param.is_empty())
            .map(|param| match param.split_once('=') {
                Some((key, value)) => (key.to_string(), decode_value(value)),
                None => (param.to_string(), String::new()),
            })
            .collect();
        Self { fields }
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.push((key.into(), value.into()));
    }

    /// Value of the first field named `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Value of the first field named after the argument or one of its aliases
    pub fn argument(&self, spec: &ArgumentSpec) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| spec.is_name_or_alias(k))
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Render as a form body
    pub fn to_form_string(&self) -> String {
        self.fields
            .iter()
            .map(|(key, value)| format!("{}={}", key, encode_value(value)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

fn encode_value(value: &str) -> Cow<'_, str> {
    utf8_percent_encode(value, VALUE_ENCODE_SET).into()
}

fn decode_value(value: &str) -> String {
    let value = value.replace('+', " ");
    percent_decode_str(&value).decode_utf8_lossy().into_owned()
}

/// Read a failure from form fields.
///
/// A missing or empty `error-code` yields `ACTION_FAILED` with
/// "No error description received".
pub fn decode_failure(form: &FormData) -> ActionError {
    let code = form.get(ERROR_CODE_KEY).map(str::trim).unwrap_or_default();
    if code.is_empty() {
        return ActionError::new(ErrorCode::ActionFailed, "No error description received");
    }

    let description = form.get(ERROR_DESCRIPTION_KEY).unwrap_or_default();
    match code.parse::<u32>() {
        Ok(numeric) => ActionError::new(FaultCode::from_code(numeric), description),
        Err(_) => ActionError::new(
            ErrorCode::ActionFailed,
            format!("Invalid error code '{}': {}", code, description),
        ),
    }
}

/// Failure recorded when the gateway got no usable response at all
pub fn no_response_failure() -> ActionError {
    ActionError::new(
        ErrorCode::ActionFailed,
        "No response received or internal proxy error",
    )
}

/// Reads and writes form-encoded action bodies
#[derive(Debug, Clone, Copy, Default)]
pub struct FormActionCodec;

impl FormActionCodec {
    pub fn new() -> Self {
        Self
    }
}

impl ActionCodec for FormActionCodec {
    fn encode_request(&self, invocation: &ActionInvocation) -> Result<String> {
        let mut form = FormData::new();
        for spec in invocation.action().inputs() {
            let value = invocation
                .input()
                .iter()
                .find(|v| v.name() == spec.name())
                .map(ArgumentValue::to_wire_string)
                .unwrap_or_default();
            form.push(spec.name(), value);
        }
        Ok(form.to_form_string())
    }

    fn encode_response(&self, invocation: &ActionInvocation) -> Result<String> {
        let mut form = FormData::new();

        if let Some(failure) = invocation.failure() {
            form.push(ERROR_CODE_KEY, failure.code().code().to_string());
            form.push(ERROR_DESCRIPTION_KEY, failure.description());
            return Ok(form.to_form_string());
        }

        for value in invocation.output() {
            let text = value.to_wire_string();
            if text.is_empty() {
                form.push(value.name(), NULL_OUTPUT_VALUE);
            } else {
                form.push(value.name(), text);
            }
        }
        Ok(form.to_form_string())
    }

    fn decode_request(&self, body: &str, action: &ActionDescriptor) -> Result<Vec<ArgumentValue>> {
        let form = FormData::parse(body);

        action
            .inputs()
            .iter()
            .map(|spec| {
                let text = form.argument(spec).ok_or_else(|| {
                    CodecError::unsupported(format!("Missing input argument '{}'", spec.name()), body)
                })?;
                debug!("Reading form argument: {}", spec.name());
                ArgumentValue::from_wire(spec, text).map_err(|e| {
                    CodecError::ArgumentConversion(
                        ActionError::new(
                            ErrorCode::ArgumentValueInvalid,
                            format!("Wrong type or invalid value for '{}': {}", spec.name(), e),
                        )
                        .with_cause(e),
                    )
                })
            })
            .collect()
    }

    fn decode_response(&self, body: &str, invocation: &mut ActionInvocation) -> Result<()> {
        let form = FormData::parse(body);

        if form.contains_key(ERROR_CODE_KEY) || form.contains_key(ERROR_DESCRIPTION_KEY) {
            let failure = decode_failure(&form);
            debug!("Reading form failure: {}", failure);
            invocation.set_failure(failure);
            return Ok(());
        }

        let mut values = Vec::with_capacity(invocation.action().outputs().len());
        for spec in invocation.action().outputs() {
            let text = form.argument(spec).ok_or_else(|| {
                CodecError::unsupported(format!("Missing output argument '{}'", spec.name()), body)
            })?;
            let text = if text == NULL_OUTPUT_VALUE { "" } else { text };

            match ArgumentValue::from_wire(spec, text) {
                Ok(value) => values.push(value),
                Err(e) => {
                    let failure = ActionError::new(
                        ErrorCode::ActionFailed,
                        "Error transforming output values of proxied remoted invocation",
                    )
                    .with_cause(&e);
                    invocation.set_failure(failure.clone());
                    return Err(CodecError::ArgumentConversion(failure));
                }
            }
        }

        invocation.set_output(values)?;
        Ok(())
    }
}
