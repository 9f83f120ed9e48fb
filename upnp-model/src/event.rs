//! GENA event requests and state variable values

use std::fmt;
use std::sync::Arc;

use crate::datatype::{Datatype, Value};
use crate::error::InvalidValue;
use crate::service::{ServiceDescriptor, StateVariable};

/// The value of one state variable carried in an event
#[derive(Debug, Clone, PartialEq)]
pub struct StateVariableValue {
    variable: String,
    datatype: Datatype,
    value: Option<Value>,
}

impl StateVariableValue {
    pub fn new(variable: &StateVariable, value: Option<Value>) -> Self {
        Self {
            variable: variable.name().to_string(),
            datatype: variable.datatype(),
            value,
        }
    }

    /// Convert wire text using the variable's datatype
    pub fn from_wire(variable: &StateVariable, text: &str) -> Result<Self, InvalidValue> {
        Ok(Self::new(variable, variable.datatype().parse(text)?))
    }

    pub fn variable(&self) -> &str {
        &self.variable
    }

    pub fn datatype(&self) -> Datatype {
        self.datatype
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn to_wire_string(&self) -> String {
        self.value
            .as_ref()
            .map(Value::to_wire_string)
            .unwrap_or_default()
    }
}

impl fmt::Display for StateVariableValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} => {}", self.variable, self.to_wire_string())
    }
}

/// GENA event key (`SEQ` header)
///
/// The first event of a subscription carries 0; later events count up and wrap
/// from `u32::MAX` to 1, never back to 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct EventSequence(u32);

impl EventSequence {
    pub fn new(value: u32) -> Self {
        Self(value)
    }

    /// Sequence of the initial event sent right after subscribing
    pub fn initial() -> Self {
        Self(0)
    }

    pub fn value(&self) -> u32 {
        self.0
    }

    pub fn next(&self) -> Self {
        match self.0 {
            u32::MAX => Self(1),
            n => Self(n + 1),
        }
    }
}

impl fmt::Display for EventSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An event notification received from a remote service
#[derive(Debug, Clone)]
pub struct IncomingEventRequest {
    subscription_id: String,
    sequence: EventSequence,
    service: Arc<ServiceDescriptor>,
    values: Vec<StateVariableValue>,
}

impl IncomingEventRequest {
    pub fn new(
        subscription_id: impl Into<String>,
        sequence: EventSequence,
        service: Arc<ServiceDescriptor>,
    ) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            sequence,
            service,
            values: Vec::new(),
        }
    }

    pub fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    pub fn sequence(&self) -> EventSequence {
        self.sequence
    }

    pub fn service(&self) -> &ServiceDescriptor {
        &self.service
    }

    /// State variables declared by the service this event belongs to
    pub fn state_variables(&self) -> &[StateVariable] {
        self.service.state_variables()
    }

    pub fn values(&self) -> &[StateVariableValue] {
        &self.values
    }

    pub fn push_value(&mut self, value: StateVariableValue) {
        self.values.push(value);
    }

    /// Drop values collected by a previous decode attempt
    pub fn clear_values(&mut self) {
        self.values.clear();
    }

    pub fn value(&self, variable: &str) -> Option<&StateVariableValue> {
        self.values.iter().find(|v| v.variable() == variable)
    }
}

/// An event notification to be sent to a subscriber
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingEventRequest {
    subscription_id: String,
    sequence: EventSequence,
    values: Vec<StateVariableValue>,
}

impl OutgoingEventRequest {
    pub fn new(
        subscription_id: impl Into<String>,
        sequence: EventSequence,
        values: Vec<StateVariableValue>,
    ) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            sequence,
            values,
        }
    }

    pub fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    pub fn sequence(&self) -> EventSequence {
        self.sequence
    }

    pub fn values(&self) -> &[StateVariableValue] {
        &self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_wraps_to_one() {
        assert_eq!(EventSequence::initial().next().value(), 1);
        assert_eq!(EventSequence::new(41).next().value(), 42);
        assert_eq!(EventSequence::new(u32::MAX).next().value(), 1);
    }

    #[test]
    fn test_value_conversion() {
        let volume = StateVariable::new("Volume", Datatype::Ui2);
        let value = StateVariableValue::from_wire(&volume, "35").unwrap();
        assert_eq!(value.value(), Some(&Value::Unsigned(35)));
        assert_eq!(value.to_string(), "Volume => 35");
        assert!(StateVariableValue::from_wire(&volume, "loud").is_err());
    }

    #[test]
    fn test_incoming_values() {
        let service = Arc::new(
            ServiceDescriptor::new("urn:schemas-upnp-org:service:RenderingControl:1")
                .with_state_variable(StateVariable::new("Mute", Datatype::Boolean)),
        );
        let mut request = IncomingEventRequest::new("uuid:sub-1", EventSequence::initial(), service);
        let mute = request.state_variables()[0].clone();
        request.push_value(StateVariableValue::from_wire(&mute, "1").unwrap());

        assert_eq!(request.value("Mute").unwrap().value(), Some(&Value::Boolean(true)));
        request.clear_values();
        assert!(request.values().is_empty());
    }
}
