//! Service descriptors and their evented state variables
//!
//! Actions are shared behind `Arc`; [`ServiceDescriptor::action`] hands out
//! the same descriptor on every lookup.

use std::sync::Arc;

use crate::action::ActionDescriptor;
use crate::datatype::Datatype;

/// Declaration of a service state variable
#[derive(Debug, Clone, PartialEq)]
pub struct StateVariable {
    name: String,
    datatype: Datatype,
    send_events: bool,
}

impl StateVariable {
    /// Create an evented state variable
    pub fn new(name: impl Into<String>, datatype: Datatype) -> Self {
        Self {
            name: name.into(),
            datatype,
            send_events: true,
        }
    }

    /// Mark the variable as not evented (`sendEvents="no"`)
    pub fn without_events(mut self) -> Self {
        self.send_events = false;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn datatype(&self) -> Datatype {
        self.datatype
    }

    pub fn sends_events(&self) -> bool {
        self.send_events
    }
}

/// A UPnP service: its type URN, actions and state variables
///
/// Descriptors come from the device model layer (parsed service
/// descriptions or locally declared services); the codecs only read them.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceDescriptor {
    service_type: String,
    actions: Vec<Arc<ActionDescriptor>>,
    state_variables: Vec<StateVariable>,
}

impl ServiceDescriptor {
    pub fn new(service_type: impl Into<String>) -> Self {
        Self {
            service_type: service_type.into(),
            actions: Vec::new(),
            state_variables: Vec::new(),
        }
    }

    /// Add an action; its service type is aligned with this service
    pub fn with_action(mut self, mut action: ActionDescriptor) -> Self {
        action.set_service_type(&self.service_type);
        self.actions.push(Arc::new(action));
        self
    }

    pub fn with_state_variable(mut self, variable: StateVariable) -> Self {
        self.state_variables.push(variable);
        self
    }

    pub fn service_type(&self) -> &str {
        &self.service_type
    }

    pub fn actions(&self) -> &[Arc<ActionDescriptor>] {
        &self.actions
    }

    pub fn action(&self, name: &str) -> Option<Arc<ActionDescriptor>> {
        self.actions.iter().find(|a| a.name() == name).cloned()
    }

    pub fn state_variables(&self) -> &[StateVariable] {
        &self.state_variables
    }

    /// Look up a state variable by its exact (case-sensitive) name
    pub fn state_variable(&self, name: &str) -> Option<&StateVariable> {
        self.state_variables.iter().find(|v| v.name() == name)
    }
}
