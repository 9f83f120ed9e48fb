//! `LastChange` payloads of AV services
//!
//! AVTransport and RenderingControl report their state through a single
//! evented `LastChange` variable whose value is itself an XML document:
//!
//! ```xml
//! <Event xmlns="urn:schemas-upnp-org:metadata-1-0/AVT/">
//!   <InstanceID val="0">
//!     <TransportState val="PLAYING"/>
//!     <Volume channel="Master" val="35"/>
//!   </InstanceID>
//! </Event>
//! ```

use tracing::{debug, warn};

use crate::cursor::XmlCursor;
use crate::error::{Result, XmlError};
use crate::repair::{escape_xml, fix_xml_entities};

/// Namespace of AVTransport `LastChange` documents
pub const AVT_EVENT_NAMESPACE: &str = "urn:schemas-upnp-org:metadata-1-0/AVT/";
/// Namespace of RenderingControl `LastChange` documents
pub const RCS_EVENT_NAMESPACE: &str = "urn:schemas-upnp-org:metadata-1-0/RCS/";

const INSTANCE_ELEMENT: &str = "InstanceID";
const VALUE_ATTRIBUTE: &str = "val";
const CHANNEL_ATTRIBUTE: &str = "channel";

/// One changed variable of an instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableChange {
    pub name: String,
    pub value: String,
    /// Audio channel for per-channel RenderingControl variables
    pub channel: Option<String>,
}

impl VariableChange {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            channel: None,
        }
    }

    pub fn with_channel(mut self, channel: impl Into<String>) -> Self {
        self.channel = Some(channel.into());
        self
    }
}

/// Changes reported for one service instance
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InstanceChanges {
    pub instance_id: u32,
    pub changes: Vec<VariableChange>,
}

impl InstanceChanges {
    pub fn new(instance_id: u32) -> Self {
        Self {
            instance_id,
            changes: Vec::new(),
        }
    }

    pub fn with_change(mut self, change: VariableChange) -> Self {
        self.changes.push(change);
        self
    }

    /// Value of the first change of `name`, whatever its channel
    pub fn value(&self, name: &str) -> Option<&str> {
        self.changes
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.value.as_str())
    }

    pub fn channel_value(&self, name: &str, channel: &str) -> Option<&str> {
        self.changes
            .iter()
            .find(|c| c.name == name && c.channel.as_deref() == Some(channel))
            .map(|c| c.value.as_str())
    }
}

/// A parsed `LastChange` document
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LastChange {
    pub namespace: Option<String>,
    pub instances: Vec<InstanceChanges>,
}

impl LastChange {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
            instances: Vec::new(),
        }
    }

    pub fn with_instance(mut self, instance: InstanceChanges) -> Self {
        self.instances.push(instance);
        self
    }

    pub fn instance(&self, instance_id: u32) -> Option<&InstanceChanges> {
        self.instances.iter().find(|i| i.instance_id == instance_id)
    }

    /// Parse an (already unescaped) `LastChange` value.
    ///
    /// Variables without a `val` attribute are skipped. An `InstanceID`
    /// without a numeric `val` is reported as instance 0.
    pub fn parse(xml: &str) -> Result<Self> {
        let mut cursor = XmlCursor::new(xml.trim());

        let root = match cursor.next_node()? {
            crate::cursor::Node::Start(tag) => tag,
            _ => return Err(XmlError::MissingElement("Event".to_string())),
        };
        let mut last_change = LastChange {
            namespace: root.attribute("xmlns").map(str::to_string),
            instances: Vec::new(),
        };

        let root_depth = cursor.depth();
        while let Some(child) = cursor.next_child(root_depth)? {
            if child.name() != INSTANCE_ELEMENT {
                debug!("Skipping <{}> in LastChange", child.name());
                continue;
            }

            let instance_id = match child.attribute(VALUE_ATTRIBUTE).map(str::parse::<u32>) {
                Some(Ok(id)) => id,
                _ => {
                    warn!("LastChange InstanceID without a valid value, using 0");
                    0
                }
            };
            let mut instance = InstanceChanges::new(instance_id);

            let instance_depth = cursor.depth();
            while let Some(variable) = cursor.next_child(instance_depth)? {
                let Some(value) = variable.attribute(VALUE_ATTRIBUTE) else {
                    warn!(
                        "Skipping LastChange variable {} for which there is no value",
                        variable.name()
                    );
                    continue;
                };
                instance.changes.push(VariableChange {
                    name: variable.name().to_string(),
                    value: value.to_string(),
                    channel: variable.attribute(CHANNEL_ATTRIBUTE).map(str::to_string),
                });
            }

            last_change.instances.push(instance);
        }

        cursor.finish()?;
        Ok(last_change)
    }

    /// Parse, retrying once with unescaped `&` characters repaired.
    ///
    /// The error of the first attempt is returned when the retry fails too.
    pub fn parse_with_recovery(xml: &str) -> Result<Self> {
        match Self::parse(xml) {
            Ok(parsed) => Ok(parsed),
            Err(err) => {
                let fixed = fix_xml_entities(xml);
                if fixed == xml {
                    return Err(err);
                }
                warn!("Error parsing LastChange, retrying with fixed entities: {}", err);
                Self::parse(&fixed).map_err(|_| err)
            }
        }
    }

    /// Render the document, ready to be used as the `LastChange` value.
    ///
    /// The result is plain XML; the GENA encoder escapes it once more when
    /// it is placed inside a property.
    pub fn to_xml(&self) -> String {
        let mut xml = String::from("<Event");
        if let Some(namespace) = &self.namespace {
            xml.push_str(&format!(r#" xmlns="{}""#, escape_xml(namespace)));
        }
        xml.push('>');

        for instance in &self.instances {
            xml.push_str(&format!(r#"<InstanceID val="{}">"#, instance.instance_id));
            for change in &instance.changes {
                xml.push_str(&format!("<{}", change.name));
                if let Some(channel) = &change.channel {
                    xml.push_str(&format!(r#" channel="{}""#, escape_xml(channel)));
                }
                xml.push_str(&format!(r#" val="{}"/>"#, escape_xml(&change.value)));
            }
            xml.push_str("</InstanceID>");
        }

        xml.push_str("</Event>");
        xml
    }
}
