//! SOAP envelopes for action requests, responses and faults

use tracing::{debug, trace};
use upnp_model::{
    ActionDescriptor, ActionError, ActionInvocation, ArgumentSpec, ArgumentValue, ErrorCode,
    FaultCode,
};
use upnp_xml::{escape_xml, Node, XmlCursor};

use crate::codec::ActionCodec;
use crate::error::{CodecError, Result};

pub const SOAP_ENVELOPE_NAMESPACE: &str = "http://schemas.xmlsoap.org/soap/envelope/";
pub const SOAP_ENCODING_STYLE: &str = "http://schemas.xmlsoap.org/soap/encoding/";
pub const CONTROL_NAMESPACE: &str = "urn:schemas-upnp-org:control-1-0";

const BODY_ELEMENT: &str = "Body";
const FAULT_ELEMENT: &str = "Fault";
const UPNP_ERROR_ELEMENT: &str = "UPnPError";

/// Reads and writes SOAP 1.1 action bodies
///
/// Decoding walks the body with a forward-only cursor and only looks at the
/// elements it needs: the `Body`, the action (or `…Response` / `Fault`)
/// element, and the direct children of that element that match a declared
/// argument name or alias, compared ignoring ASCII case. Unknown children are
/// ignored. The rest of the document is still checked for well-formedness.
#[derive(Debug, Clone, Copy, Default)]
pub struct SoapActionCodec;

impl SoapActionCodec {
    pub fn new() -> Self {
        Self
    }
}

fn envelope(content: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<s:Envelope xmlns:s="{}" s:encodingStyle="{}"><s:Body>{}</s:Body></s:Envelope>"#,
        SOAP_ENVELOPE_NAMESPACE, SOAP_ENCODING_STYLE, content
    )
}

fn action_element<'a>(
    name: &str,
    service_type: &str,
    arguments: impl Iterator<Item = (&'a str, String)>,
) -> String {
    let mut xml = format!(r#"<u:{} xmlns:u="{}">"#, name, escape_xml(service_type));
    xml.push('\n');
    for (argument, value) in arguments {
        xml.push_str(&format!("<{0}>{1}</{0}>\n", argument, escape_xml(&value)));
    }
    xml.push_str(&format!("</u:{}>", name));
    xml
}

fn fault_element(failure: &ActionError) -> String {
    format!(
        concat!(
            "<s:Fault><faultcode>s:Client</faultcode><faultstring>UPnPError</faultstring>",
            r#"<detail><UPnPError xmlns="{}"><errorCode>{}</errorCode>"#,
            "<errorDescription>{}</errorDescription></UPnPError></detail></s:Fault>"
        ),
        CONTROL_NAMESPACE,
        failure.code().code(),
        escape_xml(failure.description())
    )
}

/// Collect the text of the direct children of the current element that match
/// `specs`, keyed by spec, first occurrence winning.
fn read_argument_texts<'s>(
    cursor: &mut XmlCursor<'_>,
    specs: &'s [ArgumentSpec],
    body: &str,
) -> Result<Vec<(&'s ArgumentSpec, String)>> {
    let enclosing = cursor.current_name().unwrap_or_default().to_string();
    let depth = cursor.depth();

    let mut matches: Vec<(&ArgumentSpec, String)> = Vec::with_capacity(specs.len());
    while let Some(child) = cursor
        .next_child(depth)
        .map_err(|e| CodecError::from_xml(e, body))?
    {
        let Some(spec) = specs.iter().find(|s| s.is_name_or_alias(child.name())) else {
            trace!("Ignoring unknown element <{}> in <{}>", child.name(), enclosing);
            continue;
        };
        let text = cursor
            .read_text()
            .map_err(|e| CodecError::from_xml(e, body))?;
        if matches.iter().any(|(matched, _)| matched.name() == spec.name()) {
            debug!("Ignoring duplicate argument element <{}>", child.name());
            continue;
        }
        matches.push((spec, text));
    }

    if matches.len() < specs.len() {
        return Err(CodecError::unsupported(
            format!(
                "Invalid number of input or output arguments in XML message, expected {} but found {}",
                specs.len(),
                matches.len()
            ),
            body,
        ));
    }
    Ok(matches)
}

/// Convert matched texts into argument values in declaration order
fn convert_arguments(
    specs: &[ArgumentSpec],
    texts: &[(&ArgumentSpec, String)],
) -> std::result::Result<Vec<ArgumentValue>, ActionError> {
    specs
        .iter()
        .map(|spec| {
            let text = texts
                .iter()
                .find(|(matched, _)| matched.name() == spec.name())
                .map(|(_, text)| text.as_str())
                .unwrap_or_default();
            debug!("Reading action argument: {}", spec.name());
            ArgumentValue::from_wire(spec, text).map_err(|e| {
                ActionError::new(
                    ErrorCode::ArgumentValueInvalid,
                    format!("Wrong type or invalid value for '{}': {}", spec.name(), e),
                )
                .with_cause(e)
            })
        })
        .collect()
}

struct FaultDetail {
    fault_string: Option<String>,
    upnp_error: bool,
    error_code: Option<String>,
    error_description: Option<String>,
}

/// Read the `Fault` element the cursor is positioned on
fn read_fault(cursor: &mut XmlCursor<'_>, body: &str) -> Result<ActionError> {
    let depth = cursor.depth();
    let mut detail = FaultDetail {
        fault_string: None,
        upnp_error: false,
        error_code: None,
        error_description: None,
    };

    loop {
        let node = cursor.next_node().map_err(|e| CodecError::from_xml(e, body))?;
        match node {
            Node::Start(tag) => {
                let name = tag.name();
                if name == "faultstring" {
                    detail.fault_string = Some(read_text(cursor, body)?);
                } else if name.eq_ignore_ascii_case(UPNP_ERROR_ELEMENT) {
                    // Some firmware spells it "UpnPError"
                    detail.upnp_error = true;
                } else if detail.upnp_error && name == "errorCode" {
                    detail.error_code = Some(read_text(cursor, body)?);
                } else if detail.upnp_error && name == "errorDescription" {
                    detail.error_description = Some(read_text(cursor, body)?);
                }
            }
            Node::End(_) if cursor.depth() < depth => break,
            Node::Eof => break,
            _ => {}
        }
    }

    if !detail.upnp_error {
        let message = detail
            .fault_string
            .unwrap_or_else(|| "SOAP fault without UPnPError detail".to_string());
        debug!("Reading fault element without UPnPError: {}", message);
        return Ok(ActionError::new(ErrorCode::ActionFailed, message));
    }

    let code_text = detail.error_code.ok_or_else(|| {
        CodecError::unsupported("Received fault element but no error code", body)
    })?;
    let numeric: u32 = code_text.trim().parse().map_err(|_| {
        CodecError::unsupported(
            format!("Error code was not a number: {}", code_text.trim()),
            body,
        )
    })?;

    let code = FaultCode::from_code(numeric);
    let description = detail.error_description.unwrap_or_else(|| {
        code.error_code()
            .map(|c| c.description().to_string())
            .unwrap_or_default()
    });
    debug!("Reading fault element: {} - {}", code, description);
    Ok(ActionError::new(code, description))
}

fn read_text(cursor: &mut XmlCursor<'_>, body: &str) -> Result<String> {
    cursor
        .read_text()
        .map_err(|e| CodecError::from_xml(e, body))
}

fn trimmed_body(body: &str) -> Result<&str> {
    let body = body.trim();
    if body.is_empty() {
        return Err(CodecError::unsupported("Message body is empty", body));
    }
    Ok(body)
}

impl ActionCodec for SoapActionCodec {
    fn encode_request(&self, invocation: &ActionInvocation) -> Result<String> {
        let action = invocation.action();
        let arguments = action.inputs().iter().map(|spec| {
            let value = invocation
                .input()
                .iter()
                .find(|v| v.name() == spec.name())
                .map(ArgumentValue::to_wire_string)
                .unwrap_or_default();
            (spec.name(), value)
        });

        Ok(envelope(&action_element(
            action.name(),
            action.service_type(),
            arguments,
        )))
    }

    fn encode_response(&self, invocation: &ActionInvocation) -> Result<String> {
        if let Some(failure) = invocation.failure() {
            return Ok(envelope(&fault_element(failure)));
        }

        let action = invocation.action();
        let arguments = invocation
            .output()
            .iter()
            .map(|value| (value.name(), value.to_wire_string()));

        Ok(envelope(&action_element(
            &action.response_name(),
            action.service_type(),
            arguments,
        )))
    }

    fn decode_request(&self, body: &str, action: &ActionDescriptor) -> Result<Vec<ArgumentValue>> {
        let body = trimmed_body(body)?;
        let mut cursor = XmlCursor::new(body);

        // The action element may be found without going through Body
        cursor
            .search_tag(action.name())
            .map_err(|e| CodecError::from_xml(e, body))?
            .ok_or_else(|| {
                CodecError::unsupported(format!("Missing action element <{}>", action.name()), body)
            })?;

        let texts = read_argument_texts(&mut cursor, action.inputs(), body)?;
        cursor.finish().map_err(|e| CodecError::from_xml(e, body))?;

        convert_arguments(action.inputs(), &texts).map_err(CodecError::ArgumentConversion)
    }

    fn decode_response(&self, body: &str, invocation: &mut ActionInvocation) -> Result<()> {
        let body = trimmed_body(body)?;
        let mut cursor = XmlCursor::new(body);

        cursor
            .search_tag(BODY_ELEMENT)
            .map_err(|e| CodecError::from_xml(e, body))?
            .ok_or_else(|| CodecError::unsupported("Missing SOAP Body", body))?;

        let response_name = invocation.action().response_name();
        let body_depth = cursor.depth();

        while let Some(child) = cursor
            .next_child(body_depth)
            .map_err(|e| CodecError::from_xml(e, body))?
        {
            if child.name() == FAULT_ELEMENT {
                let failure = read_fault(&mut cursor, body)?;
                cursor.finish().map_err(|e| CodecError::from_xml(e, body))?;
                invocation.set_failure(failure);
                return Ok(());
            }

            if child.name() == response_name {
                let outputs = invocation.action().outputs();
                let texts = read_argument_texts(&mut cursor, outputs, body)?;
                cursor.finish().map_err(|e| CodecError::from_xml(e, body))?;

                let values = match convert_arguments(outputs, &texts) {
                    Ok(values) => values,
                    Err(err) => {
                        invocation.set_failure(
                            ActionError::standard(ErrorCode::ActionFailed).with_cause(&err),
                        );
                        return Err(CodecError::ArgumentConversion(err));
                    }
                };
                invocation.set_output(values)?;
                return Ok(());
            }

            trace!("Ignoring <{}> in SOAP Body", child.name());
        }

        Err(CodecError::unsupported(
            format!("Missing <{}> or <Fault> element in SOAP Body", response_name),
            body,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use upnp_model::Datatype;

    const CONNECTION_MANAGER: &str = "urn:schemas-upnp-org:service:ConnectionManager:1";

    fn get_protocol_info() -> Arc<ActionDescriptor> {
        Arc::new(
            ActionDescriptor::new(CONNECTION_MANAGER, "GetProtocolInfo")
                .with_output(ArgumentSpec::output("Source", Datatype::String))
                .with_output(ArgumentSpec::output("Sink", Datatype::String)),
        )
    }

    #[test]
    fn test_encode_request_without_inputs() {
        let invocation = ActionInvocation::new(get_protocol_info());
        let body = SoapActionCodec.encode_request(&invocation).unwrap();
        assert!(body.contains(
            r#"<s:Body><u:GetProtocolInfo xmlns:u="urn:schemas-upnp-org:service:ConnectionManager:1">
</u:GetProtocolInfo></s:Body>"#
        ));
        assert!(body.contains(r#"s:encodingStyle="http://schemas.xmlsoap.org/soap/encoding/""#));
    }

    #[test]
    fn test_decode_protocol_info_response() {
        let body = r#"<?xml version="1.0"?>
<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/" s:encodingStyle="http://schemas.xmlsoap.org/soap/encoding/">
  <s:Body>
    <u:GetProtocolInfoResponse xmlns:u="urn:schemas-upnp-org:service:ConnectionManager:1">
      <Source>http</Source>
      <Sink></Sink>
    </u:GetProtocolInfoResponse>
  </s:Body>
</s:Envelope>"#;

        let mut invocation = ActionInvocation::new(get_protocol_info());
        SoapActionCodec.decode_response(body, &mut invocation).unwrap();

        assert!(invocation.failure().is_none());
        let output: Vec<String> = invocation.output().iter().map(|v| v.to_string()).collect();
        assert_eq!(output, vec!["Source=http", "Sink="]);
    }

    #[test]
    fn test_encode_fault() {
        let mut invocation = ActionInvocation::new(get_protocol_info());
        invocation.set_failure(ActionError::new(FaultCode::Custom(701), "Transition <not> available"));
        let body = SoapActionCodec.encode_response(&invocation).unwrap();
        assert!(body.contains(
            "<s:Fault><faultcode>s:Client</faultcode><faultstring>UPnPError</faultstring><detail>\
             <UPnPError xmlns=\"urn:schemas-upnp-org:control-1-0\"><errorCode>701</errorCode>\
             <errorDescription>Transition &lt;not&gt; available</errorDescription></UPnPError></detail></s:Fault>"
        ));
    }

    #[test]
    fn test_fault_without_upnp_error() {
        let body = r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"><s:Body><s:Fault><faultcode>s:Server</faultcode><faultstring>Internal Error</faultstring></s:Fault></s:Body></s:Envelope>"#;
        let mut invocation = ActionInvocation::new(get_protocol_info());
        SoapActionCodec.decode_response(body, &mut invocation).unwrap();

        let failure = invocation.failure().unwrap();
        assert_eq!(failure.code(), FaultCode::Standard(ErrorCode::ActionFailed));
        assert_eq!(failure.description(), "Internal Error");
    }

    #[test]
    fn test_fault_without_error_code_is_unsupported() {
        let body = r#"<s:Envelope><s:Body><s:Fault><detail><UPnPError><errorDescription>x</errorDescription></UPnPError></detail></s:Fault></s:Body></s:Envelope>"#;
        let mut invocation = ActionInvocation::new(get_protocol_info());
        let err = SoapActionCodec.decode_response(body, &mut invocation).unwrap_err();
        assert!(err.is_unsupported_data());
    }

    #[test]
    fn test_empty_body_is_unsupported() {
        let mut invocation = ActionInvocation::new(get_protocol_info());
        assert!(SoapActionCodec
            .decode_response("  \n", &mut invocation)
            .unwrap_err()
            .is_unsupported_data());
    }
}
