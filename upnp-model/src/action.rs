//! Action and argument descriptors
//!
//! Descriptors are immutable once built and are normally owned by a
//! [`ServiceDescriptor`](crate::ServiceDescriptor) behind an `Arc`.

use crate::datatype::Datatype;

/// Whether an argument is sent to the action or returned by it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    In,
    Out,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::In => "input",
            Direction::Out => "output",
        }
    }
}

/// Declaration of one action argument
#[derive(Debug, Clone, PartialEq)]
pub struct ArgumentSpec {
    name: String,
    aliases: Vec<String>,
    direction: Direction,
    datatype: Datatype,
    related_state_variable: Option<String>,
}

impl ArgumentSpec {
    pub fn new(name: impl Into<String>, direction: Direction, datatype: Datatype) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            direction,
            datatype,
            related_state_variable: None,
        }
    }

    pub fn input(name: impl Into<String>, datatype: Datatype) -> Self {
        Self::new(name, Direction::In, datatype)
    }

    pub fn output(name: impl Into<String>, datatype: Datatype) -> Self {
        Self::new(name, Direction::Out, datatype)
    }

    /// Accept an alternate element or key name for this argument on the wire.
    ///
    /// Some devices send argument names that differ from the service
    /// description, for example `InstanceId` for `InstanceID`.
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    pub fn with_related_state_variable(mut self, variable: impl Into<String>) -> Self {
        self.related_state_variable = Some(variable.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn datatype(&self) -> Datatype {
        self.datatype
    }

    pub fn related_state_variable(&self) -> Option<&str> {
        self.related_state_variable.as_deref()
    }

    /// Match a wire name against the canonical name and all aliases.
    ///
    /// The comparison ignores ASCII case: devices in the field send both
    /// `CurrentURI` and `CurrentUri`, and output argument names are matched the
    /// same way as input argument names.
    pub fn is_name_or_alias(&self, wire_name: &str) -> bool {
        self.name.eq_ignore_ascii_case(wire_name)
            || self
                .aliases
                .iter()
                .any(|alias| alias.eq_ignore_ascii_case(wire_name))
    }
}

/// Declaration of a UPnP action
#[derive(Debug, Clone, PartialEq)]
pub struct ActionDescriptor {
    service_type: String,
    name: String,
    inputs: Vec<ArgumentSpec>,
    outputs: Vec<ArgumentSpec>,
}

impl ActionDescriptor {
    /// Create an action without arguments.
    ///
    /// # Arguments
    ///
    /// * `service_type` - Service type URN, used as the `u:` namespace in SOAP bodies
    /// * `name` - Action name, e.g. `GetProtocolInfo`
    pub fn new(service_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            service_type: service_type.into(),
            name: name.into(),
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// Append an input argument; the direction of `spec` is forced to `In`
    pub fn with_input(mut self, mut spec: ArgumentSpec) -> Self {
        spec.direction = Direction::In;
        self.inputs.push(spec);
        self
    }

    /// Append an output argument; the direction of `spec` is forced to `Out`
    pub fn with_output(mut self, mut spec: ArgumentSpec) -> Self {
        spec.direction = Direction::Out;
        self.outputs.push(spec);
        self
    }

    pub(crate) fn set_service_type(&mut self, service_type: &str) {
        self.service_type = service_type.to_string();
    }

    pub fn service_type(&self) -> &str {
        &self.service_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the element wrapping the output arguments in a SOAP response
    pub fn response_name(&self) -> String {
        format!("{}Response", self.name)
    }

    pub fn inputs(&self) -> &[ArgumentSpec] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[ArgumentSpec] {
        &self.outputs
    }

    pub fn arguments(&self, direction: Direction) -> &[ArgumentSpec] {
        match direction {
            Direction::In => &self.inputs,
            Direction::Out => &self.outputs,
        }
    }

    pub fn has_inputs(&self) -> bool {
        !self.inputs.is_empty()
    }

    pub fn has_outputs(&self) -> bool {
        !self.outputs.is_empty()
    }

    /// Find an input argument by name or alias
    pub fn input(&self, name: &str) -> Option<&ArgumentSpec> {
        self.inputs.iter().find(|a| a.is_name_or_alias(name))
    }

    /// Find an output argument by name or alias
    pub fn output(&self, name: &str) -> Option<&ArgumentSpec> {
        self.outputs.iter().find(|a| a.is_name_or_alias(name))
    }
}
