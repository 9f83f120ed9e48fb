//! GENA `propertyset` event bodies

use tracing::{debug, trace};
use upnp_model::{IncomingEventRequest, OutgoingEventRequest, StateVariableValue};
use upnp_xml::repair::EVENT_NAMESPACE;
use upnp_xml::{escape_xml, XmlCursor};

use crate::codec::EventCodec;
use crate::error::{CodecError, Result};

const PROPERTY_ELEMENT: &str = "property";

/// Reads and writes GENA event bodies
///
/// Every `property` element is searched for its first direct child named
/// after a state variable of the service (exact, case-sensitive match).
/// Children that name no declared variable are ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenaEventCodec;

impl GenaEventCodec {
    pub fn new() -> Self {
        Self
    }

    fn read_property(
        cursor: &mut XmlCursor<'_>,
        request: &mut IncomingEventRequest,
        body: &str,
    ) -> Result<()> {
        let depth = cursor.depth();
        let mut found = false;

        while let Some(child) = cursor
            .next_child(depth)
            .map_err(|e| CodecError::from_xml(e, body))?
        {
            if found {
                trace!("Ignoring <{}>, property already read", child.name());
                continue;
            }
            let Some(variable) = request
                .state_variables()
                .iter()
                .find(|v| v.name() == child.name())
                .cloned()
            else {
                trace!("Ignoring unknown state variable <{}>", child.name());
                continue;
            };

            debug!("Reading state variable value: {}", variable.name());
            let text = cursor
                .read_text()
                .map_err(|e| CodecError::from_xml(e, body))?;
            let value = StateVariableValue::from_wire(&variable, &text)
                .map_err(|e| CodecError::unsupported(e.to_string(), body))?;
            request.push_value(value);
            found = true;
        }

        Ok(())
    }
}

impl EventCodec for GenaEventCodec {
    fn encode(&self, request: &OutgoingEventRequest) -> Result<String> {
        let mut xml = format!(
            r#"<?xml version="1.0" encoding="utf-8"?><e:propertyset xmlns:e="{}">"#,
            EVENT_NAMESPACE
        );
        for value in request.values() {
            xml.push_str(&format!(
                "<e:property><{0}>{1}</{0}></e:property>",
                value.variable(),
                escape_xml(&value.to_wire_string())
            ));
        }
        xml.push_str("</e:propertyset>");
        Ok(xml)
    }

    fn decode(&self, body: &str, request: &mut IncomingEventRequest) -> Result<()> {
        let body = body.trim();
        if body.is_empty() {
            return Err(CodecError::unsupported("Message body is empty", body));
        }

        let mut cursor = XmlCursor::new(body);
        while cursor
            .search_tag(PROPERTY_ELEMENT)
            .map_err(|e| CodecError::from_xml(e, body))?
            .is_some()
        {
            Self::read_property(&mut cursor, request, body)?;
        }

        Ok(())
    }
}
