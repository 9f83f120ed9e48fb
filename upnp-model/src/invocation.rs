//! Action invocations and their argument values

use std::fmt;
use std::sync::Arc;

use crate::action::{ActionDescriptor, ArgumentSpec, Direction};
use crate::datatype::{Datatype, Value};
use crate::error::{InvalidValue, ModelError, Result};
use crate::error_code::ActionError;

/// A typed value bound to a declared argument
#[derive(Debug, Clone, PartialEq)]
pub struct ArgumentValue {
    name: String,
    datatype: Datatype,
    value: Option<Value>,
}

impl ArgumentValue {
    /// Bind a typed value to an argument, coercing it to the argument's datatype.
    ///
    /// `None` is an absent value and is always accepted.
    pub fn new(spec: &ArgumentSpec, value: Option<Value>) -> Result<Self> {
        let value = value.map(|v| spec.datatype().coerce(v)).transpose()?;
        Ok(Self {
            name: spec.name().to_string(),
            datatype: spec.datatype(),
            value,
        })
    }

    /// Convert wire text using the argument's datatype
    pub fn from_wire(spec: &ArgumentSpec, text: &str) -> std::result::Result<Self, InvalidValue> {
        Ok(Self {
            name: spec.name().to_string(),
            datatype: spec.datatype(),
            value: spec.datatype().parse(text)?,
        })
    }

    /// Canonical argument name (never an alias)
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn datatype(&self) -> Datatype {
        self.datatype
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn into_value(self) -> Option<Value> {
        self.value
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_none()
    }

    /// Wire text of the value; an absent value is the empty string
    pub fn to_wire_string(&self) -> String {
        self.value
            .as_ref()
            .map(Value::to_wire_string)
            .unwrap_or_default()
    }
}

impl fmt::Display for ArgumentValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, self.to_wire_string())
    }
}

/// One attempt to invoke an action
///
/// Inputs are set before the call. When the call completes exactly one of
/// output or failure is set.
#[derive(Debug, Clone)]
pub struct ActionInvocation {
    action: Arc<ActionDescriptor>,
    input: Vec<ArgumentValue>,
    output: Vec<ArgumentValue>,
    failure: Option<ActionError>,
    user_agent: Option<String>,
}

impl ActionInvocation {
    pub fn new(action: Arc<ActionDescriptor>) -> Self {
        Self {
            action,
            input: Vec::new(),
            output: Vec::new(),
            failure: None,
            user_agent: None,
        }
    }

    /// Record the user agent of the control point that sent a received request
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn action(&self) -> &ActionDescriptor {
        &self.action
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.user_agent.as_deref()
    }

    fn input_spec(&self, name: &str) -> Result<&ArgumentSpec> {
        self.action
            .input(name)
            .ok_or_else(|| ModelError::UnknownArgument {
                action: self.action.name().to_string(),
                direction: Direction::In.as_str(),
                argument: name.to_string(),
            })
    }

    /// Set one input value, replacing any previous value of that argument.
    ///
    /// Inputs are kept in declaration order regardless of the order they are set in.
    pub fn set_input(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        let spec = self.input_spec(name)?;
        let argument = ArgumentValue::new(spec, Some(value.into()))?;
        self.insert_input(argument);
        Ok(())
    }

    /// Set one input value from its wire text
    pub fn set_input_text(&mut self, name: &str, text: &str) -> Result<()> {
        let spec = self.input_spec(name)?;
        let argument = ArgumentValue::from_wire(spec, text)?;
        self.insert_input(argument);
        Ok(())
    }

    fn insert_input(&mut self, argument: ArgumentValue) {
        self.input.retain(|a| a.name() != argument.name());
        self.input.push(argument);
        let order: Vec<&str> = self.action.inputs().iter().map(|a| a.name()).collect();
        self.input
            .sort_by_key(|a| order.iter().position(|n| *n == a.name()));
    }

    /// Replace all inputs with values decoded from a request
    pub fn set_inputs(&mut self, values: Vec<ArgumentValue>) -> Result<()> {
        for value in &values {
            self.input_spec(value.name())?;
        }
        self.input.clear();
        for value in values {
            self.insert_input(value);
        }
        Ok(())
    }

    pub fn input(&self) -> &[ArgumentValue] {
        &self.input
    }

    /// Look up an input by canonical name or alias
    pub fn input_value(&self, name: &str) -> Option<&Value> {
        let spec = self.action.input(name)?;
        self.input
            .iter()
            .find(|a| a.name() == spec.name())
            .and_then(ArgumentValue::value)
    }

    /// Complete the invocation successfully.
    ///
    /// # Errors
    ///
    /// Fails when a failure is already set, or when `values` does not list
    /// exactly the declared outputs in declaration order.
    pub fn set_output(&mut self, values: Vec<ArgumentValue>) -> Result<()> {
        if self.failure.is_some() {
            return Err(ModelError::AlreadyFailed(self.action.name().to_string()));
        }

        let declared = self.action.outputs();
        if declared.len() != values.len() {
            return Err(ModelError::ArgumentMismatch {
                action: self.action.name().to_string(),
                reason: format!(
                    "expected {} output arguments, got {}",
                    declared.len(),
                    values.len()
                ),
            });
        }
        if let Some((spec, value)) = declared
            .iter()
            .zip(&values)
            .find(|(spec, value)| spec.name() != value.name())
        {
            return Err(ModelError::ArgumentMismatch {
                action: self.action.name().to_string(),
                reason: format!(
                    "expected output '{}', got '{}'",
                    spec.name(),
                    value.name()
                ),
            });
        }

        self.output = values;
        Ok(())
    }

    pub fn output(&self) -> &[ArgumentValue] {
        &self.output
    }

    /// Look up an output by canonical name or alias
    pub fn output_value(&self, name: &str) -> Option<&Value> {
        let spec = self.action.output(name)?;
        self.output
            .iter()
            .find(|a| a.name() == spec.name())
            .and_then(ArgumentValue::value)
    }

    /// Complete the invocation with a failure; any output is discarded
    pub fn set_failure(&mut self, failure: ActionError) {
        self.output.clear();
        self.failure = Some(failure);
    }

    pub fn failure(&self) -> Option<&ActionError> {
        self.failure.as_ref()
    }

    /// Clear output and failure so the response can be decoded again
    pub fn reset_outcome(&mut self) {
        self.output.clear();
        self.failure = None;
    }

    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}
